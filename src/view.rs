use egui::{Pos2, Vec2};

/// Default edge length, in screen pixels, of a point handle.
pub const HANDLE_SIZE: f32 = 8.0;

/// Maps between document ("source") coordinates and screen ("view")
/// coordinates, and owns the fixed screen-space handle radius.
///
/// Handle hit radii are constant on screen regardless of zoom: tests in view
/// space use `handle_size` directly, tests in source space divide it by the
/// current zoom first.
#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
    pub zoom: f32,
    /// View-space position of the document origin.
    pub pan: Vec2,
    pub handle_size: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            handle_size: HANDLE_SIZE,
        }
    }
}

impl ViewTransform {
    pub fn new(zoom: f32, pan: Vec2) -> Self {
        Self {
            zoom,
            pan,
            handle_size: HANDLE_SIZE,
        }
    }

    pub fn source_to_view(&self, p: Pos2) -> Pos2 {
        Pos2::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    pub fn view_to_source(&self, p: Pos2) -> Pos2 {
        Pos2::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
    }

    /// Handle radius expressed in source pixels at the current zoom.
    pub fn handle_radius_source(&self) -> f32 {
        self.handle_size / self.zoom
    }

    /// Screen-space handle test: `source_pos` is a document point, `mouse`
    /// a view position.
    pub fn hit_point(&self, source_pos: Pos2, mouse: Pos2) -> bool {
        self.source_to_view(source_pos).distance(mouse) <= self.handle_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let view = ViewTransform::new(2.5, Vec2::new(40.0, -12.0));
        let p = Pos2::new(17.0, 33.0);
        let q = view.view_to_source(view.source_to_view(p));
        assert!(p.distance(q) < 1e-4);
    }

    #[test]
    fn hit_radius_is_zoom_invariant() {
        let source_pt = Pos2::new(100.0, 100.0);
        for zoom in [1.0, 4.0] {
            let view = ViewTransform::new(zoom, Vec2::ZERO);
            // A mouse offset of half the handle size on screen always hits.
            let mouse = view.source_to_view(source_pt) + Vec2::new(HANDLE_SIZE / 2.0, 0.0);
            assert!(view.hit_point(source_pt, mouse));
            // An offset past the handle size never does.
            let mouse = view.source_to_view(source_pt) + Vec2::new(HANDLE_SIZE * 1.5, 0.0);
            assert!(!view.hit_point(source_pt, mouse));
        }
    }
}
