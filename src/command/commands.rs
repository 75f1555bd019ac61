use crate::annotation::{AnnotationSet, ShapeId};
use crate::shape::{AttrValue, ControlPoint, Shape};

/// Reversible edits against the annotation set.
///
/// Each variant carries full before/after payloads, so applying and
/// reverting never consult any state other than the target set. This is
/// what makes a transaction atomic: undo replays `revert` in reverse
/// order, redo replays `apply` in order.
#[derive(Clone, Debug)]
pub enum EditCommand {
    AddShape {
        index: usize,
        id: ShapeId,
        shape: Shape,
    },
    RemoveShape {
        index: usize,
        id: ShapeId,
        shape: Shape,
    },
    SetSelection {
        old: Vec<ShapeId>,
        new: Vec<ShapeId>,
    },
    SetPoints {
        id: ShapeId,
        old: Vec<ControlPoint>,
        new: Vec<ControlPoint>,
    },
    SetAttribute {
        id: ShapeId,
        key: String,
        old: Option<AttrValue>,
        new: AttrValue,
    },
}

impl EditCommand {
    /// Build a selection-replace command capturing the current selection as
    /// the before payload.
    pub fn select(set: &AnnotationSet, new: Vec<ShapeId>) -> Self {
        EditCommand::SetSelection {
            old: set.selection(None),
            new,
        }
    }

    /// Build a point-list replace capturing the shape's current points.
    pub fn set_points(set: &AnnotationSet, id: ShapeId, new: Vec<ControlPoint>) -> Self {
        let old = set
            .shape(id)
            .map(|s| s.points().to_vec())
            .unwrap_or_else(|| panic!("unknown shape id {id:?}"));
        EditCommand::SetPoints { id, old, new }
    }

    /// Build an attribute change capturing the current value.
    pub fn set_attribute(set: &AnnotationSet, id: ShapeId, key: &str, new: AttrValue) -> Self {
        let old = set
            .shape(id)
            .unwrap_or_else(|| panic!("unknown shape id {id:?}"))
            .value(key);
        EditCommand::SetAttribute {
            id,
            key: key.to_owned(),
            old,
            new,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::AddShape { .. } => "Add Shape",
            EditCommand::RemoveShape { .. } => "Remove Shape",
            EditCommand::SetSelection { .. } => "Select Shapes",
            EditCommand::SetPoints { .. } => "Edit Shape",
            EditCommand::SetAttribute { .. } => "Edit Shape",
        }
    }

    pub fn apply(&self, set: &mut AnnotationSet) {
        match self {
            EditCommand::AddShape { index, id, shape } => {
                set.insert_shape(*index, *id, shape.clone());
            }
            EditCommand::RemoveShape { id, .. } => {
                set.remove_shape(*id);
            }
            EditCommand::SetSelection { new, .. } => {
                set.select_only(new);
            }
            EditCommand::SetPoints { id, new, .. } => {
                set.set_points(*id, new.clone());
            }
            EditCommand::SetAttribute { id, key, new, .. } => {
                set.set_value(*id, key, *new);
            }
        }
    }

    pub fn revert(&self, set: &mut AnnotationSet) {
        match self {
            EditCommand::AddShape { id, .. } => {
                set.remove_shape(*id);
            }
            EditCommand::RemoveShape { index, id, shape } => {
                set.insert_shape(*index, *id, shape.clone());
            }
            EditCommand::SetSelection { old, .. } => {
                set.select_only(old);
            }
            EditCommand::SetPoints { id, old, .. } => {
                set.set_points(*id, old.clone());
            }
            EditCommand::SetAttribute { id, key, old, .. } => {
                // A previously unset attribute reverts to zero, matching the
                // attribute map's numeric default.
                set.set_value(*id, key, old.unwrap_or(AttrValue::Number(0.0)));
            }
        }
    }
}
