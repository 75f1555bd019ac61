mod edit;
mod verbs;

pub use edit::Edit;
pub use verbs::Verb;

use egui::{CursorIcon, Modifiers, Pos2, Rect, Vec2};
use log::debug;

use crate::annotation::{AnnotationSet, ShapeId};
use crate::command::{CommandHistory, EditCommand};
use crate::geometry::point_on_line;
use crate::shape::{AttrValue, ControlPoint, Handle, Shape, ShapeKind, Topology};
use crate::view::ViewTransform;

/// Movement below this manhattan distance (screen pixels) is a click, not a
/// drag.
pub const DRAG_THRESHOLD: f32 = 2.0;

/// Source-pixel offset applied to pasted shapes.
pub const PASTE_OFFSET: Vec2 = Vec2::new(100.0, 100.0);

/// Capability record selecting the session's behavior per active tool,
/// replacing a manipulator inheritance chain: which shape kind it operates
/// on and whether geometry may be edited (the Output tool is select-only).
#[derive(Clone, Copy, Debug)]
pub struct ToolProfile {
    pub kind: ShapeKind,
    pub can_edit: bool,
}

impl ToolProfile {
    pub fn input_editor() -> Self {
        Self {
            kind: ShapeKind::Input,
            can_edit: true,
        }
    }

    pub fn mask_editor() -> Self {
        Self {
            kind: ShapeKind::Mask,
            can_edit: true,
        }
    }

    pub fn output_grader() -> Self {
        Self {
            kind: ShapeKind::Output,
            can_edit: false,
        }
    }
}

/// What the pointer is currently over, resolved on every no-button move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverTarget {
    pub shape: ShapeId,
    pub index: Option<usize>,
    pub handle: Option<Handle>,
}

/// The interaction modes. All transitions start in `Idle` and return there
/// on release (commit) or cancel (rollback).
#[derive(Clone, Debug)]
pub enum Mode {
    Idle,
    Draw { draft: Shape },
    Drag,
    Insert,
    Rotate { anchor: Pos2, start_angle: f32 },
    MarqueeSelect { rect: Rect, saved: Vec<ShapeId> },
}

/// Per-interaction state machine: hover resolution, the six pointer modes,
/// and the edit verbs. Created per document view; all document access is
/// threaded through explicitly so the machine stays testable.
pub struct EditSession {
    profile: ToolProfile,
    mode: Mode,
    hover: Option<HoverTarget>,
    /// Curve parameter of the insert candidate under the cursor, negative
    /// when none.
    hover_t: f32,
    edits: Vec<Edit>,
    pointer_down: bool,
    down_view: Pos2,
    down_source: Pos2,
    pressed: Option<ShapeId>,
}

impl EditSession {
    pub fn new(profile: ToolProfile) -> Self {
        Self {
            profile,
            mode: Mode::Idle,
            hover: None,
            hover_t: -1.0,
            edits: Vec::new(),
            pointer_down: false,
            down_view: Pos2::ZERO,
            down_source: Pos2::ZERO,
            pressed: None,
        }
    }

    pub fn profile(&self) -> ToolProfile {
        self.profile
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }

    pub fn hover_target(&self) -> Option<HoverTarget> {
        self.hover
    }

    /// The in-progress Draw rectangle, for overlay painting.
    pub fn draft(&self) -> Option<&Shape> {
        match &self.mode {
            Mode::Draw { draft } => Some(draft),
            _ => None,
        }
    }

    /// The live marquee rectangle, for overlay painting.
    pub fn marquee(&self) -> Option<Rect> {
        match &self.mode {
            Mode::MarqueeSelect { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    // --- hover resolution -------------------------------------------------

    /// Resolve the hover target for a no-button pointer move and return the
    /// cursor to show. Priority: handle of a selected shape, edge (polygon,
    /// ALT), curve insert candidate (bezier, ALT), selected body, any
    /// non-selected body, then rotate-available.
    pub fn pointer_hover(
        &mut self,
        set: &AnnotationSet,
        view: &ViewTransform,
        doc: Rect,
        mouse: Pos2,
        modifiers: Modifiers,
    ) -> CursorIcon {
        let kind = self.profile.kind;
        let source_pos = view.view_to_source(mouse);
        let mut cursor = if self.profile.can_edit && !modifiers.shift {
            CursorIcon::Crosshair
        } else {
            CursorIcon::Default
        };
        let mut hover = None;
        self.hover_t = -1.0;

        if self.profile.can_edit {
            // 1. Handles of selected shapes.
            for (id, shape) in set.shapes_of_kind(kind) {
                if !shape.is_selected() {
                    continue;
                }
                if let Some((index, handle)) = find_handle(shape, view, mouse, modifiers) {
                    hover = Some(HoverTarget {
                        shape: id,
                        index: Some(index),
                        handle: Some(handle),
                    });
                    cursor = CursorIcon::Default;
                    break;
                }
            }

            // 2..4. Edges, insert candidates, then the body.
            if hover.is_none() {
                for (id, shape) in set.shapes_of_kind(kind) {
                    if !shape.is_selected() {
                        continue;
                    }
                    if shape.topology() == Topology::Polygon {
                        if let Some(index) = find_edge(shape, view, mouse, modifiers) {
                            cursor = if edge_is_horizontal(shape.points(), index) {
                                CursorIcon::ResizeVertical
                            } else {
                                CursorIcon::ResizeHorizontal
                            };
                            hover = Some(HoverTarget {
                                shape: id,
                                index: None,
                                handle: None,
                            });
                        }
                    } else if only_alt(modifiers) {
                        if let Some(t) =
                            shape.point_on_curve(source_pos, view.handle_radius_source() / 2.0)
                        {
                            self.hover_t = t;
                            cursor = CursorIcon::Copy;
                            hover = Some(HoverTarget {
                                shape: id,
                                index: None,
                                handle: None,
                            });
                        }
                    }
                    if hover.is_none() && shape.contains(source_pos, Some(doc)) {
                        cursor = CursorIcon::Move;
                        hover = Some(HoverTarget {
                            shape: id,
                            index: None,
                            handle: None,
                        });
                    }
                    if hover.is_some() {
                        break;
                    }
                }
            }
        } else {
            // Select-only profile: bodies of selected shapes.
            for (id, shape) in set.shapes_of_kind(kind) {
                if shape.is_selected() && shape.contains(source_pos, Some(doc)) {
                    cursor = CursorIcon::PointingHand;
                    hover = Some(HoverTarget {
                        shape: id,
                        index: None,
                        handle: None,
                    });
                }
            }
        }

        // 5. Non-selected bodies show a select cursor, but record no target.
        if hover.is_none() {
            for (_, shape) in set.shapes_of_kind(kind) {
                if !shape.is_selected() && shape.contains(source_pos, Some(doc)) {
                    cursor = CursorIcon::PointingHand;
                }
            }
            if self.profile.can_edit && only_alt(modifiers) {
                cursor = CursorIcon::Grab;
            }
        }

        self.hover = hover;
        cursor
    }

    // --- pointer gestures -------------------------------------------------

    pub fn pointer_press(
        &mut self,
        set: &mut AnnotationSet,
        history: &mut CommandHistory,
        view: &ViewTransform,
        doc: Rect,
        mouse: Pos2,
        modifiers: Modifiers,
    ) {
        self.pointer_down = true;
        self.down_view = mouse;
        self.down_source = view.view_to_source(mouse);
        self.pressed = self.hover.map(|h| h.shape);

        // Select-only Output tool: ALT-click copies grading levels onto the
        // clicked shape.
        if !self.profile.can_edit && only_alt(modifiers) {
            self.copy_levels(set, history, doc);
            return;
        }

        // Shortcut for creating a new shape over existing ones.
        if self.profile.can_edit && modifiers.alt && modifiers.shift {
            self.begin_draw();
            return;
        }

        let clicked = self
            .hover
            .map(|h| h.shape)
            .or_else(|| set.shape_at(self.down_source, self.profile.kind, Some(doc)));

        if let Some(id) = clicked {
            let selected = set.shape(id).is_some_and(|s| s.is_selected());
            if modifiers.command {
                // Toggle membership.
                let mut new = set.selection(None);
                if selected {
                    new.retain(|sid| *sid != id);
                } else {
                    new.push(id);
                }
                history.push(EditCommand::select(set, new), set);
            } else if !selected {
                history.push(EditCommand::select(set, vec![id]), set);
            }

            if self.hover_t >= 0.0 {
                // Insert a point on the hovered curve right away; the drag
                // then moves only the fresh knot.
                let backup = set.shape(id).map(|s| s.points().to_vec()).unwrap_or_default();
                let index = set.insert_point(id, self.hover_t);
                let inserted = set.shape(id).map(|s| s.point(index));
                self.edits.push(Edit {
                    id,
                    backup,
                    targets: vec![index],
                    handle: Some(Handle::Knot),
                    inserted,
                });
                self.mode = Mode::Insert;
                debug!("insert point at t={} -> index {index}", self.hover_t);
            }
        } else if modifiers.is_none() {
            // Deselect everything of this kind, then start drawing.
            let kind_selection = set.selection(Some(self.profile.kind));
            if !kind_selection.is_empty() {
                let mut new = set.selection(None);
                new.retain(|id| !kind_selection.contains(id));
                history.push(EditCommand::select(set, new), set);
            }
            self.begin_draw();
        } else if only_shift(modifiers) {
            self.mode = Mode::MarqueeSelect {
                rect: Rect::from_min_max(self.down_source, self.down_source),
                saved: set.selection(None),
            };
        }
        // ALT alone arms rotation; the mode starts once movement passes the
        // drag threshold.
    }

    pub fn pointer_move(
        &mut self,
        set: &mut AnnotationSet,
        view: &ViewTransform,
        doc: Rect,
        mouse: Pos2,
        modifiers: Modifiers,
    ) {
        if !self.pointer_down {
            return;
        }

        if matches!(self.mode, Mode::Idle) && self.profile.can_edit {
            let moved = (mouse - self.down_view).abs();
            if moved.x + moved.y > DRAG_THRESHOLD {
                self.begin_drag_or_rotate(set, view, doc, modifiers);
            }
        }

        let delta = view.view_to_source(mouse) - self.down_source;
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Draw { draft } => {
                let p0 = self.down_source;
                let p1 = view.view_to_source(mouse);
                draft.set_points(vec![
                    ControlPoint::new(p0),
                    ControlPoint::new(Pos2::new(p1.x, p0.y)),
                    ControlPoint::new(p1),
                    ControlPoint::new(Pos2::new(p0.x, p1.y)),
                ]);
            }
            Mode::Drag => {
                for edit in &self.edits {
                    set.set_points(edit.id, edit.moved(delta, modifiers));
                }
            }
            Mode::Insert => {
                assert_eq!(self.edits.len(), 1);
                let edit = &self.edits[0];
                let mut point = edit.inserted.expect("insert edit without a point");
                point.knot += delta;
                set.set_point(edit.id, edit.targets[0], point);
            }
            Mode::Rotate {
                anchor,
                start_angle,
            } => {
                let angle = calc_angle(view.view_to_source(mouse), *anchor, doc) - *start_angle;
                for edit in &self.edits {
                    set.set_points(edit.id, edit.rotated(*anchor, angle));
                }
            }
            Mode::MarqueeSelect { rect, .. } => {
                *rect = Rect::from_two_pos(self.down_source, view.view_to_source(mouse));
                // Live preview: not pushed through the command boundary.
                let marquee = *rect;
                let hits: Vec<ShapeId> = set
                    .iter()
                    .filter(|(_, s)| s.intersects(marquee, Some(doc)))
                    .map(|(id, _)| id)
                    .collect();
                set.select_only(&hits);
            }
        }
    }

    pub fn pointer_release(
        &mut self,
        set: &mut AnnotationSet,
        history: &mut CommandHistory,
        view: &ViewTransform,
        doc: Rect,
        mouse: Pos2,
        modifiers: Modifiers,
    ) {
        let mode = std::mem::replace(&mut self.mode, Mode::Idle);
        match mode {
            Mode::Idle => {}
            Mode::Draw { draft } => {
                // Only a dragged-out 4-corner rectangle commits; a bare
                // click leaves the single seed point and is discarded.
                if draft.points().len() == 4 {
                    history.begin_macro("Add Shape");
                    let id = set.allocate_id();
                    history.push(
                        EditCommand::AddShape {
                            index: set.len(),
                            id,
                            shape: draft,
                        },
                        set,
                    );
                    history.push(EditCommand::select(set, vec![id]), set);
                    history.end_macro();
                }
            }
            Mode::Drag => {
                history.begin_macro("Edit Shapes");
                let delta = view.view_to_source(mouse) - self.down_source;
                for edit in self.edits.drain(..) {
                    let points = edit.moved(delta, modifiers);
                    set.set_points(edit.id, edit.backup.clone());
                    history.push(EditCommand::set_points(set, edit.id, points), set);
                }
                history.end_macro();
            }
            Mode::Insert => {
                history.begin_macro("Insert Point");
                assert_eq!(self.edits.len(), 1);
                for edit in self.edits.drain(..) {
                    let points = set
                        .shape(edit.id)
                        .map(|s| s.points().to_vec())
                        .unwrap_or_default();
                    set.set_points(edit.id, edit.backup.clone());
                    history.push(EditCommand::set_points(set, edit.id, points), set);
                }
                history.end_macro();
            }
            Mode::Rotate {
                anchor,
                start_angle,
            } => {
                history.begin_macro("Rotate Shapes");
                let angle = calc_angle(view.view_to_source(mouse), anchor, doc) - start_angle;
                for edit in self.edits.drain(..) {
                    let points = edit.rotated(anchor, angle);
                    set.set_points(edit.id, edit.backup.clone());
                    history.push(EditCommand::set_points(set, edit.id, points), set);
                }
                history.end_macro();
            }
            Mode::MarqueeSelect { rect, saved } => {
                // Restore the pre-marquee selection, then make the final
                // membership, recomputed from the release rectangle, one
                // undoable replace. A zero-area rectangle intersects nothing.
                let hits: Vec<ShapeId> = set
                    .iter()
                    .filter(|(_, s)| s.intersects(rect, Some(doc)))
                    .map(|(id, _)| id)
                    .collect();
                set.select_only(&saved);
                history.push(EditCommand::select(set, hits), set);
            }
        }
        self.edits.clear();
        self.pointer_down = false;
        self.pressed = None;
    }

    /// Abort the active gesture: every edit target reverts to its backup,
    /// nothing reaches the undo stack.
    pub fn cancel(&mut self, set: &mut AnnotationSet) {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Idle | Mode::Draw { .. } => {}
            Mode::MarqueeSelect { saved, .. } => {
                set.select_only(&saved);
            }
            Mode::Drag | Mode::Insert | Mode::Rotate { .. } => {
                for edit in self.edits.drain(..) {
                    set.set_points(edit.id, edit.backup);
                }
            }
        }
        self.edits.clear();
        self.pointer_down = false;
        self.pressed = None;
    }

    /// Arrow-key movement: the hovered point alone, or every selected shape
    /// of the active kind, by `delta` source pixels (callers pass
    /// `direction / zoom`), as one undo macro.
    pub fn nudge(
        &mut self,
        set: &mut AnnotationSet,
        history: &mut CommandHistory,
        delta: Vec2,
    ) {
        if !self.profile.can_edit {
            return;
        }
        let selection = set.selection(Some(self.profile.kind));
        if selection.is_empty() {
            return;
        }
        history.begin_macro("Nudge");
        for id in selection {
            let Some(shape) = set.shape(id) else { continue };
            let mut points = shape.points().to_vec();
            let hovered_point = self
                .hover
                .filter(|h| h.shape == id)
                .and_then(|h| h.index);
            if let Some(index) = hovered_point {
                points[index].knot += delta;
            } else {
                for p in &mut points {
                    p.knot += delta;
                }
            }
            history.push(EditCommand::set_points(set, id, points), set);
        }
        history.end_macro();
    }

    // --- transition helpers -----------------------------------------------

    fn begin_draw(&mut self) {
        if !self.profile.can_edit {
            return;
        }
        let mut draft = Shape::new(self.profile.kind);
        draft.set_points(vec![ControlPoint::new(self.down_source)]);
        self.mode = Mode::Draw { draft };
    }

    fn begin_drag_or_rotate(
        &mut self,
        set: &AnnotationSet,
        view: &ViewTransform,
        doc: Rect,
        modifiers: Modifiers,
    ) {
        if let Some(id) = self.pressed {
            let Some(shape) = set.shape(id) else { return };
            if let Some(hover) = self.hover {
                if let (Some(index), Some(handle)) = (hover.index, hover.handle) {
                    self.edits.push(Edit {
                        id,
                        backup: shape.points().to_vec(),
                        targets: vec![index],
                        handle: Some(handle),
                        inserted: None,
                    });
                } else if let Some(index) = find_edge(shape, view, self.down_view, modifiers) {
                    // Edge drag moves exactly the two edge endpoints.
                    let next = if index == shape.points().len() - 1 {
                        0
                    } else {
                        index + 1
                    };
                    self.edits.push(Edit {
                        id,
                        backup: shape.points().to_vec(),
                        targets: vec![index, next],
                        handle: None,
                        inserted: None,
                    });
                }
            }
            if self.edits.is_empty() {
                // Whole-shape move of the entire selection.
                for sid in set.selection(Some(self.profile.kind)) {
                    if let Some(s) = set.shape(sid) {
                        self.edits.push(Edit::whole_shape(sid, s.points().to_vec()));
                    }
                }
            }
            if !self.edits.is_empty() {
                self.mode = Mode::Drag;
            }
        } else if only_alt(modifiers) {
            let selection = set.selection(Some(self.profile.kind));
            if selection.is_empty() {
                return;
            }
            for sid in &selection {
                if let Some(s) = set.shape(*sid) {
                    self.edits.push(Edit::whole_shape(*sid, s.points().to_vec()));
                }
            }
            let anchor = selection_anchor(set, &selection);
            self.mode = Mode::Rotate {
                anchor,
                start_angle: calc_angle(self.down_source, anchor, doc),
            };
        }
    }

    /// ALT-click with the Output tool: copy black/gamma/white from a
    /// uniformly-leveled selection onto the clicked, non-selected shape.
    fn copy_levels(&self, set: &mut AnnotationSet, history: &mut CommandHistory, doc: Rect) {
        let Some(target) = set.shape_at(self.down_source, self.profile.kind, Some(doc)) else {
            return;
        };
        if set.shape(target).is_some_and(|s| s.is_selected()) {
            return;
        }

        let mut levels: Option<(f64, f64, f64)> = None;
        for id in set.selection(Some(self.profile.kind)) {
            let Some(shape) = set.shape(id) else { continue };
            let these = (
                shape.number("black"),
                shape.number("gamma"),
                shape.number("white"),
            );
            match levels {
                None => levels = Some(these),
                Some(current) if current != these => return, // mixed levels
                Some(_) => {}
            }
        }
        let Some((black, gamma, white)) = levels else {
            return;
        };

        history.begin_macro("Copy Levels");
        history.push(
            EditCommand::set_attribute(set, target, "black", AttrValue::Number(black)),
            set,
        );
        history.push(
            EditCommand::set_attribute(set, target, "gamma", AttrValue::Number(gamma)),
            set,
        );
        history.push(
            EditCommand::set_attribute(set, target, "white", AttrValue::Number(white)),
            set,
        );
        history.end_macro();
    }
}

// --- free helpers ---------------------------------------------------------

fn only_alt(modifiers: Modifiers) -> bool {
    modifiers.alt && !modifiers.shift && !modifiers.command && !modifiers.ctrl
}

fn only_shift(modifiers: Modifiers) -> bool {
    modifiers.shift && !modifiers.alt && !modifiers.command && !modifiers.ctrl
}

/// Handle under the mouse, in point order. Polygon shapes expose knots
/// only; Bezier shapes also expose tangent handles, and ALT suppresses the
/// knot so the curve underneath stays reachable for insertion.
fn find_handle(
    shape: &Shape,
    view: &ViewTransform,
    mouse: Pos2,
    modifiers: Modifiers,
) -> Option<(usize, Handle)> {
    for (i, p) in shape.points().iter().enumerate() {
        if shape.topology() == Topology::Polygon {
            if view.hit_point(p.knot, mouse) {
                return Some((i, Handle::Knot));
            }
        } else {
            if view.hit_point(p.knot, mouse) && !modifiers.alt {
                return Some((i, Handle::Knot));
            }
            if view.hit_point(p.knot + p.tan_out, mouse) {
                return Some((i, Handle::TangentOut));
            }
            if view.hit_point(p.knot + p.tan_in, mouse) {
                return Some((i, Handle::TangentIn));
            }
        }
    }
    None
}

/// Edge under the mouse (ALT only), by leading point index.
fn find_edge(
    shape: &Shape,
    view: &ViewTransform,
    mouse: Pos2,
    modifiers: Modifiers,
) -> Option<usize> {
    if !modifiers.alt {
        return None;
    }
    let points = shape.points();
    for i in 0..points.len() {
        let next = if i == points.len() - 1 { 0 } else { i + 1 };
        let p0 = view.source_to_view(points[i].knot);
        let p1 = view.source_to_view(points[next].knot);
        if point_on_line(p0, p1, mouse, view.handle_size / 2.0).is_some() {
            return Some(i);
        }
    }
    None
}

fn edge_is_horizontal(points: &[ControlPoint], index: usize) -> bool {
    let next = if index == points.len() - 1 { 0 } else { index + 1 };
    let delta = points[next].knot - points[index].knot;
    delta.x.abs() > delta.y.abs()
}

/// Rotation anchor: mean of every knot of the given shapes.
fn selection_anchor(set: &AnnotationSet, ids: &[ShapeId]) -> Pos2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0;
    for id in ids {
        if let Some(shape) = set.shape(*id) {
            for p in shape.points() {
                sum += p.knot.to_vec2();
                count += 1;
            }
        }
    }
    if count == 0 {
        Pos2::ZERO
    } else {
        (sum / count as f32).to_pos2()
    }
}

/// Rotation angle of `pointer` around `anchor`, referenced against the
/// document center so only relative changes matter during a gesture.
fn calc_angle(pointer: Pos2, anchor: Pos2, doc: Rect) -> f32 {
    let p = pointer - anchor;
    let c = doc.center() - anchor;
    p.y.atan2(p.x) - c.y.atan2(c.x)
}
