use egui::{Pos2, Rect, Vec2};

/// Test whether `mouse` lies within `tolerance` of the segment `p0..p1`.
///
/// Returns the normalized parameter along the segment on a hit. The bounding
/// box pre-check keeps this cheap when called per edge across every shape.
pub fn point_on_line(p0: Pos2, p1: Pos2, mouse: Pos2, tolerance: f32) -> Option<f32> {
    let bounds = Rect::from_two_pos(p0, p1).expand(tolerance);
    if !bounds.contains(mouse) {
        return None;
    }

    let line = p1 - p0;
    let to_mouse = mouse - p0;
    let len_sq = line.length_sq();
    if len_sq == 0.0 {
        // Degenerate edge: both endpoints coincide.
        return (to_mouse.length() <= tolerance).then_some(0.0);
    }

    let t = (to_mouse.dot(line) / len_sq).clamp(0.0, 1.0);
    let projection = p0 + line * t;
    (mouse.distance(projection) <= tolerance).then_some(t)
}

/// Rotate `p` around `anchor` by `angle` radians.
///
/// Equivalent to `Translate(anchor) * Rotate(angle) * Translate(-anchor)`.
pub fn rotate_about(p: Pos2, anchor: Pos2, angle: f32) -> Pos2 {
    let (sin, cos) = angle.sin_cos();
    let d: Vec2 = p - anchor;
    Pos2::new(
        anchor.x + d.x * cos - d.y * sin,
        anchor.y + d.x * sin + d.y * cos,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_on_line_hit_and_parameter() {
        let t = point_on_line(
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(5.0, 1.0),
            2.0,
        );
        assert!((t.unwrap() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn point_on_line_outside_tolerance() {
        let t = point_on_line(
            Pos2::new(0.0, 0.0),
            Pos2::new(10.0, 0.0),
            Pos2::new(5.0, 4.0),
            2.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn rotate_about_round_trip() {
        let anchor = Pos2::new(3.0, 4.0);
        let p = Pos2::new(10.0, -2.0);
        let q = rotate_about(rotate_about(p, anchor, 1.2), anchor, -1.2);
        assert!(p.distance(q) < 1e-4);
    }
}
