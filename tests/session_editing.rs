use cradleworks::annotation::AnnotationSet;
use cradleworks::clipboard::Clipboard;
use cradleworks::command::CommandHistory;
use cradleworks::session::{EditSession, ToolProfile, Verb};
use cradleworks::shape::{ControlPoint, Shape, ShapeKind};
use cradleworks::view::ViewTransform;
use egui::{Modifiers, Pos2, Rect, Vec2};

const DOC: Rect = Rect::from_min_max(Pos2::ZERO, Pos2::new(1000.0, 1000.0));

fn view() -> ViewTransform {
    // Identity transform so view and source coordinates coincide.
    ViewTransform::new(1.0, Vec2::ZERO)
}

/// Builds the session under test; RUST_LOG=debug surfaces the edit log.
fn session(profile: ToolProfile) -> EditSession {
    let _ = env_logger::builder().is_test(true).try_init();
    EditSession::new(profile)
}

/// Full hover/press/move/release gesture at identity zoom.
fn gesture(
    session: &mut EditSession,
    set: &mut AnnotationSet,
    history: &mut CommandHistory,
    from: Pos2,
    to: Pos2,
    modifiers: Modifiers,
) {
    let view = view();
    session.pointer_hover(set, &view, DOC, from, modifiers);
    session.pointer_press(set, history, &view, DOC, from, modifiers);
    session.pointer_move(set, &view, DOC, to, modifiers);
    session.pointer_release(set, history, &view, DOC, to, modifiers);
}

fn mask_blob() -> Shape {
    let mut shape = Shape::new(ShapeKind::Mask);
    shape.set_points(vec![
        ControlPoint::with_tangents(
            Pos2::new(100.0, 100.0),
            Vec2::new(-20.0, 10.0),
            Vec2::new(20.0, -10.0),
        ),
        ControlPoint::with_tangents(
            Pos2::new(200.0, 110.0),
            Vec2::new(-15.0, -15.0),
            Vec2::new(15.0, 15.0),
        ),
        ControlPoint::with_tangents(
            Pos2::new(150.0, 200.0),
            Vec2::new(25.0, 0.0),
            Vec2::new(-25.0, 0.0),
        ),
    ]);
    shape
}

#[test]
fn test_draw_commits_rectangle() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(10.0, 10.0),
        Pos2::new(110.0, 60.0),
        Modifiers::NONE,
    );

    assert_eq!(set.len(), 1);
    let (id, shape) = set.iter().next().unwrap();
    assert_eq!(shape.kind(), ShapeKind::Input);
    assert_eq!(shape.points().len(), 4);
    assert_eq!(shape.points()[0].knot, Pos2::new(10.0, 10.0));
    assert_eq!(shape.points()[2].knot, Pos2::new(110.0, 60.0));
    assert!(set.selection(None).contains(&id));

    // Add and select are one undo step.
    assert!(history.undo(&mut set));
    assert_eq!(set.len(), 0);
}

#[test]
fn test_click_without_drag_commits_nothing() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());
    let view = view();
    let pos = Pos2::new(10.0, 10.0);

    session.pointer_hover(&mut set, &view, DOC, pos, Modifiers::NONE);
    session.pointer_press(&mut set, &mut history, &view, DOC, pos, Modifiers::NONE);
    session.pointer_release(&mut set, &mut history, &view, DOC, pos, Modifiers::NONE);

    assert_eq!(set.len(), 0);
    assert!(!history.can_undo());
}

#[test]
fn test_drag_undo_restores_exact_points() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);
    let original = set.shape(id).unwrap().points().to_vec();

    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(150.0, 150.0),
        Pos2::new(180.0, 190.0),
        Modifiers::NONE,
    );

    let moved = set.shape(id).unwrap().points().to_vec();
    assert_eq!(moved[0].knot, Pos2::new(130.0, 140.0));

    assert!(history.undo(&mut set));
    assert_eq!(set.shape(id).unwrap().points(), original.as_slice());
}

#[test]
fn test_edge_drag_leaves_far_knots_alone() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::ZERO, Pos2::new(100.0, 100.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);

    // Top edge runs between knots 0 and 1.
    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(50.0, 0.0),
        Pos2::new(50.0, -20.0),
        Modifiers::ALT,
    );

    let points = set.shape(id).unwrap().points();
    assert_eq!(points[0].knot, Pos2::new(0.0, -20.0));
    assert_eq!(points[1].knot, Pos2::new(100.0, -20.0));
    // The bottom knots never move during an edge drag.
    assert_eq!(points[2].knot, Pos2::new(100.0, 100.0));
    assert_eq!(points[3].knot, Pos2::new(0.0, 100.0));
}

#[test]
fn test_marquee_zero_area_selects_nothing() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);

    // Shift-click on empty space without moving: the zero-area marquee
    // replaces the selection with nothing.
    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(400.0, 400.0),
        Pos2::new(400.0, 400.0),
        Modifiers::SHIFT,
    );

    assert!(!set.has_selection(None));
    // One undo step brings the old selection back.
    assert!(history.undo(&mut set));
    assert!(set.shape(id).unwrap().is_selected());
}

#[test]
fn test_marquee_selects_intersecting_shapes() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let a = set.add_shape(Shape::from_rect(
        ShapeKind::Input,
        Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0)),
    ));
    let b = set.add_shape(Shape::from_rect(
        ShapeKind::Input,
        Rect::from_min_max(Pos2::new(500.0, 500.0), Pos2::new(600.0, 600.0)),
    ));

    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(50.0, 50.0),
        Pos2::new(250.0, 250.0),
        Modifiers::SHIFT,
    );

    assert!(set.shape(a).unwrap().is_selected());
    assert!(!set.shape(b).unwrap().is_selected());
}

#[test]
fn test_alt_click_inserts_point_and_undo_restores() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::mask_editor());

    let id = set.add_shape(mask_blob());
    set.set_selected(id, true);
    let original = set.shape(id).unwrap().points().to_vec();
    let on_curve = set.shape(id).unwrap().eval(0.5);

    gesture(
        &mut session,
        &mut set,
        &mut history,
        on_curve,
        on_curve + Vec2::new(5.0, 5.0),
        Modifiers::ALT,
    );

    assert_eq!(set.shape(id).unwrap().points().len(), 4);
    assert_eq!(history.undo_name(), Some("Insert Point"));

    assert!(history.undo(&mut set));
    assert_eq!(set.shape(id).unwrap().points(), original.as_slice());
}

#[test]
fn test_rotate_undo_restores_exact_points() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);
    let original = set.shape(id).unwrap().points().to_vec();

    // Alt-drag starting outside the shape rotates the selection.
    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(300.0, 150.0),
        Pos2::new(300.0, 300.0),
        Modifiers::ALT,
    );

    let rotated = set.shape(id).unwrap().points().to_vec();
    assert_ne!(rotated[0].knot, original[0].knot);

    assert!(history.undo(&mut set));
    assert_eq!(set.shape(id).unwrap().points(), original.as_slice());
}

#[test]
fn test_cancel_rolls_back_without_history() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());
    let view = view();

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);
    let original = set.shape(id).unwrap().points().to_vec();

    let from = Pos2::new(150.0, 150.0);
    session.pointer_hover(&mut set, &view, DOC, from, Modifiers::NONE);
    session.pointer_press(&mut set, &mut history, &view, DOC, from, Modifiers::NONE);
    session.pointer_move(&mut set, &view, DOC, Pos2::new(190.0, 190.0), Modifiers::NONE);
    session.cancel(&mut set);

    assert_eq!(set.shape(id).unwrap().points(), original.as_slice());
    assert!(!history.can_undo());
    assert!(session.is_idle());
}

#[test]
fn test_cut_and_paste_round_trip() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut clipboard = Clipboard::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);

    assert!(session.can_do(Verb::Cut, &set, &clipboard));
    session.do_verb(Verb::Cut, &mut set, &mut history, &mut clipboard);
    assert_eq!(set.len(), 0);
    assert!(!clipboard.is_empty());

    session.do_verb(Verb::Paste, &mut set, &mut history, &mut clipboard);
    assert_eq!(set.len(), 1);
    let (pasted_id, pasted) = set.iter().next().unwrap();
    assert_eq!(pasted.points()[0].knot, Pos2::new(200.0, 200.0));
    assert!(set.selection(None).contains(&pasted_id));

    // Paste is one macro.
    assert!(history.undo(&mut set));
    assert_eq!(set.len(), 0);
}

#[test]
fn test_invert_mask_toggles_flag() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut clipboard = Clipboard::new();
    let mut session = session(ToolProfile::mask_editor());

    let id = set.add_shape(mask_blob());
    set.set_selected(id, true);

    session.do_verb(Verb::InvertMask, &mut set, &mut history, &mut clipboard);
    assert!(set.shape(id).unwrap().flag("invert"));

    session.do_verb(Verb::InvertMask, &mut set, &mut history, &mut clipboard);
    assert!(!set.shape(id).unwrap().flag("invert"));

    assert!(history.undo(&mut set));
    assert!(set.shape(id).unwrap().flag("invert"));
}

#[test]
fn test_copy_levels_via_alt_click() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::output_grader());
    let view = view();

    let donor = set.add_shape(Shape::from_rect(
        ShapeKind::Output,
        Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 100.0)),
    ));
    let target = set.add_shape(Shape::from_rect(
        ShapeKind::Output,
        Rect::from_min_max(Pos2::new(300.0, 300.0), Pos2::new(400.0, 400.0)),
    ));
    set.set_value(donor, "black", 10.0.into());
    set.set_value(donor, "gamma", 5.0.into());
    set.set_value(donor, "white", 200.0.into());
    set.set_selected(donor, true);

    let pos = Pos2::new(350.0, 350.0);
    session.pointer_hover(&mut set, &view, DOC, pos, Modifiers::ALT);
    session.pointer_press(&mut set, &mut history, &view, DOC, pos, Modifiers::ALT);
    session.pointer_release(&mut set, &mut history, &view, DOC, pos, Modifiers::ALT);

    let shape = set.shape(target).unwrap();
    assert_eq!(shape.number("black"), 10.0);
    assert_eq!(shape.number("gamma"), 5.0);
    assert_eq!(shape.number("white"), 200.0);

    // All three attributes are one undo step.
    assert!(history.undo(&mut set));
    assert_eq!(set.shape(target).unwrap().number("black"), 0.0);
}

#[test]
fn test_nudge_is_one_undo_step() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut session = session(ToolProfile::input_editor());

    let rect = Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0));
    let id = set.add_shape(Shape::from_rect(ShapeKind::Input, rect));
    set.set_selected(id, true);

    session.nudge(&mut set, &mut history, Vec2::new(1.0, 0.0));
    assert_eq!(set.shape(id).unwrap().points()[0].knot, Pos2::new(101.0, 100.0));

    assert!(history.undo(&mut set));
    assert_eq!(set.shape(id).unwrap().points()[0].knot, Pos2::new(100.0, 100.0));
}

#[test]
fn test_draw_delete_undo_redo_cycle() {
    let mut set = AnnotationSet::new();
    let mut history = CommandHistory::new();
    let mut clipboard = Clipboard::new();
    let mut session = session(ToolProfile::input_editor());

    gesture(
        &mut session,
        &mut set,
        &mut history,
        Pos2::new(10.0, 10.0),
        Pos2::new(110.0, 60.0),
        Modifiers::NONE,
    );
    assert_eq!(set.len(), 1);
    let id = set.iter().next().unwrap().0;
    assert!(set.shape(id).unwrap().is_selected());

    session.do_verb(Verb::Delete, &mut set, &mut history, &mut clipboard);
    assert_eq!(set.len(), 0);

    // Undo brings the shape back, still selected.
    assert!(history.undo(&mut set));
    assert_eq!(set.len(), 1);
    assert!(set.shape(id).unwrap().is_selected());

    // Redo removes it again.
    assert!(history.redo(&mut set));
    assert_eq!(set.len(), 0);
}
