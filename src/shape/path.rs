//! Containment and intersection tests on flattened closed contours.

use egui::{Pos2, Rect};

/// Even-odd point-in-polygon test. The contour is implicitly closed.
pub fn point_in_contour(contour: &[Pos2], p: Pos2) -> bool {
    if contour.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = contour.len() - 1;
    for i in 0..contour.len() {
        let (pi, pj) = (contour[i], contour[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = pi.x + (p.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True when the closed contour overlaps a positive-area rectangle.
///
/// A zero-area rectangle intersects nothing; marquee selection relies on
/// that contract.
pub fn contour_intersects_rect(contour: &[Pos2], rect: Rect) -> bool {
    if rect.width() <= 0.0 || rect.height() <= 0.0 || contour.len() < 3 {
        return false;
    }

    if contour.iter().any(|p| rect.contains(*p)) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    if corners.iter().any(|c| point_in_contour(contour, *c)) {
        return true;
    }

    // Neither fully contains the other: check edge crossings.
    let mut j = contour.len() - 1;
    for i in 0..contour.len() {
        for k in 0..4 {
            if segments_intersect(contour[j], contour[i], corners[k], corners[(k + 1) % 4]) {
                return true;
            }
        }
        j = i;
    }
    false
}

fn orientation(a: Pos2, b: Pos2, c: Pos2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    (d1 * d2 < 0.0) && (d3 * d4 < 0.0)
}
