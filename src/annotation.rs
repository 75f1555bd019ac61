use egui::Rect;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::shape::{AttrValue, ControlPoint, Shape, ShapeKind};

/// Stable handle to a shape owned by an [`AnnotationSet`].
///
/// Ids are never reused within a set, so undo commands and the compositor
/// can hold them weakly without listener wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(u64);

/// Ordered, arena-owned collection of annotation shapes.
///
/// Order is draw/z-order and hit-test priority. Structural mutation (add,
/// remove, selection replace) goes through the command boundary so every
/// edit is undoable; the transient setters exist for live previews during
/// an active interaction and for command application.
///
/// Every observable change bumps `revision`, the lazy-invalidation signal
/// consumed by the preview compositor.
#[derive(Default)]
pub struct AnnotationSet {
    entries: Vec<(ShapeId, Shape)>,
    next_id: u64,
    revision: u64,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // --- structural mutation (command boundary only) ----------------------

    /// Reserve an id without adding a shape, so an add command can carry it
    /// before being applied.
    pub fn allocate_id(&mut self) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a shape, allocating its id.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        debug!("add shape {id:?} ({:?})", shape.kind());
        self.entries.push((id, shape));
        self.touch();
        id
    }

    /// Re-insert a previously removed shape at its old z-position, keeping
    /// its id (undo of a removal).
    pub fn insert_shape(&mut self, index: usize, id: ShapeId, shape: Shape) {
        assert!(index <= self.entries.len(), "insert index out of range");
        self.next_id = self.next_id.max(id.0 + 1);
        self.entries.insert(index, (id, shape));
        self.touch();
    }

    /// Remove a shape, returning its z-index and the shape for the undo
    /// payload.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<(usize, Shape)> {
        let index = self.index_of(id)?;
        let (_, shape) = self.entries.remove(index);
        debug!("remove shape {id:?}");
        self.touch();
        Some((index, shape))
    }

    // --- access -----------------------------------------------------------

    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.entries.iter().position(|(sid, _)| *sid == id)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.entries
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, s)| s)
    }

    /// Shape ids in z-order.
    pub fn ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.entries.iter().map(|(id, s)| (*id, s))
    }

    pub fn shapes_of_kind(&self, kind: ShapeKind) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.iter().filter(move |(_, s)| s.kind() == kind)
    }

    /// Selected shape ids, optionally filtered by kind, in z-order.
    pub fn selection(&self, kind: Option<ShapeKind>) -> Vec<ShapeId> {
        self.iter()
            .filter(|(_, s)| s.is_selected() && kind.is_none_or(|k| s.kind() == k))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_selection(&self, kind: Option<ShapeKind>) -> bool {
        self.iter()
            .any(|(_, s)| s.is_selected() && kind.is_none_or(|k| s.kind() == k))
    }

    // --- shape mutation ---------------------------------------------------

    pub fn set_points(&mut self, id: ShapeId, points: Vec<ControlPoint>) {
        self.shape_mut(id).set_points(points);
        self.touch();
    }

    pub fn set_point(&mut self, id: ShapeId, index: usize, point: ControlPoint) {
        self.shape_mut(id).set_point(index, point);
        self.touch();
    }

    pub fn insert_point(&mut self, id: ShapeId, t: f32) -> usize {
        let index = self.shape_mut(id).insert_point(t);
        self.touch();
        index
    }

    pub fn delete_point(&mut self, id: ShapeId, index: usize) {
        self.shape_mut(id).delete_point(index);
        self.touch();
    }

    /// No-op (and no revision bump) when the value is unchanged.
    pub fn set_value(&mut self, id: ShapeId, key: &str, value: AttrValue) {
        if self.shape_mut(id).set_value(key, value) {
            self.touch();
        }
    }

    /// Selection is the one mutation allowed to bypass the command boundary,
    /// for transient hover/marquee previews.
    pub fn set_selected(&mut self, id: ShapeId, state: bool) {
        if self.shape_mut(id).set_selected(state) {
            self.touch();
        }
    }

    /// Replace the selection wholesale (used when applying selection
    /// commands and marquee previews).
    pub fn select_only(&mut self, ids: &[ShapeId]) {
        let mut changed = false;
        for (id, shape) in &mut self.entries {
            changed |= shape.set_selected(ids.contains(id));
        }
        if changed {
            self.touch();
        }
    }

    fn shape_mut(&mut self, id: ShapeId) -> &mut Shape {
        self.entries
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, s)| s)
            .unwrap_or_else(|| panic!("unknown shape id {id:?}"))
    }

    // --- hit queries ------------------------------------------------------

    /// Topmost shape of `kind` whose region contains `pos`.
    pub fn shape_at(&self, pos: egui::Pos2, kind: ShapeKind, doc: Option<Rect>) -> Option<ShapeId> {
        let mut hit = None;
        for (id, shape) in self.shapes_of_kind(kind) {
            if shape.contains(pos, doc) {
                hit = Some(id);
            }
        }
        hit
    }
}
