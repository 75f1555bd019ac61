use crate::shape::Shape;

/// Holds cloned shapes between cut/copy and paste.
///
/// Clipboard contents are detached from any annotation set; paste clones
/// them again, so repeated pastes stay independent.
#[derive(Default)]
pub struct Clipboard {
    shapes: Vec<Shape>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}
