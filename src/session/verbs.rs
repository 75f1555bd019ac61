use log::debug;

use crate::annotation::{AnnotationSet, ShapeId};
use crate::clipboard::Clipboard;
use crate::command::{CommandHistory, EditCommand};
use crate::shape::{AttrValue, Handle, ShapeKind, Topology};

use super::{EditSession, PASTE_OFFSET};

/// Edit-menu verbs routed through the session so availability can depend on
/// the active tool and hover state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Cut,
    Copy,
    Paste,
    Delete,
    SelectAll,
    InvertMask,
}

impl EditSession {
    pub fn can_do(&self, verb: Verb, set: &AnnotationSet, clipboard: &Clipboard) -> bool {
        if !self.is_idle() {
            return false;
        }
        let kind = self.profile().kind;
        match verb {
            Verb::Cut | Verb::Copy | Verb::Delete => {
                self.profile().can_edit && set.has_selection(Some(kind))
            }
            Verb::Paste => self.profile().can_edit && !clipboard.is_empty(),
            Verb::SelectAll => set.shapes_of_kind(kind).next().is_some(),
            Verb::InvertMask => kind == ShapeKind::Mask && set.has_selection(Some(kind)),
        }
    }

    pub fn do_verb(
        &mut self,
        verb: Verb,
        set: &mut AnnotationSet,
        history: &mut CommandHistory,
        clipboard: &mut Clipboard,
    ) {
        if !self.can_do(verb, set, clipboard) {
            return;
        }
        debug!("verb {verb:?}");
        match verb {
            Verb::Cut => {
                self.copy(set, clipboard);
                history.begin_macro("Cut");
                self.delete_selection(set, history);
                history.end_macro();
            }
            Verb::Copy => self.copy(set, clipboard),
            Verb::Paste => {
                history.begin_macro("Paste");
                history.push(EditCommand::select(set, Vec::new()), set);
                let mut new_ids = Vec::new();
                for shape in clipboard.shapes() {
                    let mut shape = shape.clone();
                    shape.translate(PASTE_OFFSET);
                    let id = set.allocate_id();
                    new_ids.push(id);
                    history.push(
                        EditCommand::AddShape {
                            index: set.len(),
                            id,
                            shape,
                        },
                        set,
                    );
                }
                history.push(EditCommand::select(set, new_ids), set);
                history.end_macro();
            }
            Verb::Delete => {
                // Hovering a removable curve knot deletes that point alone.
                if let Some((id, index)) = self.deletable_point(set) {
                    let backup = set
                        .shape(id)
                        .map(|s| s.points().to_vec())
                        .unwrap_or_default();
                    set.delete_point(id, index);
                    let points = set
                        .shape(id)
                        .map(|s| s.points().to_vec())
                        .unwrap_or_default();
                    set.set_points(id, backup);
                    history.begin_macro("Delete Point");
                    history.push(EditCommand::set_points(set, id, points), set);
                    history.end_macro();
                    self.clear_hover();
                } else {
                    history.begin_macro("Delete");
                    self.delete_selection(set, history);
                    history.end_macro();
                }
            }
            Verb::SelectAll => {
                let mut new = set.selection(None);
                for (id, shape) in set.shapes_of_kind(self.profile().kind) {
                    if !shape.is_selected() {
                        new.push(id);
                    }
                }
                history.push(EditCommand::select(set, new), set);
            }
            Verb::InvertMask => {
                history.begin_macro("Invert Mask");
                for id in set.selection(Some(ShapeKind::Mask)) {
                    let inverted = set.shape(id).is_some_and(|s| s.flag("invert"));
                    history.push(
                        EditCommand::set_attribute(set, id, "invert", AttrValue::Bool(!inverted)),
                        set,
                    );
                }
                history.end_macro();
            }
        }
    }

    fn copy(&self, set: &AnnotationSet, clipboard: &mut Clipboard) {
        let shapes = set
            .selection(Some(self.profile().kind))
            .into_iter()
            .filter_map(|id| set.shape(id).cloned())
            .collect();
        clipboard.set(shapes);
    }

    /// Remove every selected shape of the active kind. Callers own the
    /// enclosing macro so Cut can group this with the clipboard copy.
    fn delete_selection(&mut self, set: &mut AnnotationSet, history: &mut CommandHistory) {
        // Back to front keeps the captured z-indices valid on undo.
        let mut ids = set.selection(Some(self.profile().kind));
        ids.reverse();
        for id in ids {
            let Some(index) = set.index_of(id) else { continue };
            let Some(shape) = set.shape(id).cloned() else { continue };
            history.push(EditCommand::RemoveShape { index, id, shape }, set);
        }
        self.clear_hover();
    }

    /// The hovered knot, when it belongs to a bezier shape that would stay a
    /// valid contour (more than three points) after removal.
    fn deletable_point(&self, set: &AnnotationSet) -> Option<(ShapeId, usize)> {
        let hover = self.hover_target()?;
        let index = hover.index?;
        if hover.handle != Some(Handle::Knot) {
            return None;
        }
        let shape = set.shape(hover.shape)?;
        if shape.topology() == Topology::ClosedBezier && shape.points().len() > 3 {
            Some((hover.shape, index))
        } else {
            None
        }
    }

    pub(super) fn clear_hover(&mut self) {
        self.hover = None;
        self.hover_t = -1.0;
    }
}
