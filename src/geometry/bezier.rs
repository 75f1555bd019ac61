use egui::{Pos2, Rect, Vec2};

use super::point_on_line;

/// Number of chords a curve segment is sampled into for proximity tests.
///
/// Each chord is tested as a straight line and the matched chord's local
/// parameter is mapped linearly back onto the curve, so the error is bounded
/// by the chord length. Raising this tightens insert hit-testing at a linear
/// cost per segment.
pub const CURVE_STEPS: usize = 20;

fn lerp(p0: Pos2, p1: Pos2, t: f32) -> Pos2 {
    Pos2::new(p0.x + (p1.x - p0.x) * t, p0.y + (p1.y - p0.y) * t)
}

/// Evaluate a cubic Bezier at `t` using the power-basis form.
pub fn eval_cubic(t: f32, p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2) -> Pos2 {
    fn axis(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
        let c3 = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let c2 = 3.0 * p0 - 6.0 * p1 + 3.0 * p2;
        let c1 = -3.0 * p0 + 3.0 * p1;
        let c0 = p0;
        t * t * t * c3 + t * t * c2 + t * c1 + c0
    }
    Pos2::new(
        axis(t, p0.x, p1.x, p2.x, p3.x),
        axis(t, p0.y, p1.y, p2.y, p3.y),
    )
}

/// Result of splitting one cubic segment at a parameter.
///
/// Tangents are offsets relative to their own knot, matching the control
/// point representation. Applying `prev_tan_out`/`next_tan_in` to the
/// neighboring knots preserves the visual curve exactly.
#[derive(Clone, Copy, Debug)]
pub struct CubicSplit {
    pub point: Pos2,
    pub tan_in: Vec2,
    pub tan_out: Vec2,
    pub prev_tan_out: Vec2,
    pub next_tan_in: Vec2,
}

/// Split the segment `[c1, c2, c3, c4]` at `s` by three rounds of
/// De Casteljau blends. `c1`/`c4` are the knots, `c2`/`c3` the absolute
/// tangent control points.
pub fn split_cubic(s: f32, c1: Pos2, c2: Pos2, c3: Pos2, c4: Pos2) -> CubicSplit {
    let b10 = lerp(c1, c2, s);
    let b11 = lerp(c2, c3, s);
    let b12 = lerp(c3, c4, s);
    let b20 = lerp(b10, b11, s);
    let b21 = lerp(b11, b12, s);
    let b30 = lerp(b20, b21, s);

    CubicSplit {
        point: b30,
        tan_in: b20 - b30,
        tan_out: b21 - b30,
        prev_tan_out: b10 - c1,
        next_tan_in: b12 - c4,
    }
}

/// Sampled proximity test against one curve segment spanning the global
/// parameter range `[t0, t1]`.
///
/// `bounds` is the segment's control hull rectangle used as a quick reject;
/// `eval` maps a global parameter to a point on the curve. On a hit the
/// matched chord's local parameter is mapped back to a global one.
pub fn point_on_segment_sampled(
    mouse: Pos2,
    tolerance: f32,
    t0: f32,
    t1: f32,
    bounds: Rect,
    eval: impl Fn(f32) -> Pos2,
) -> Option<f32> {
    if !bounds.expand(tolerance).contains(mouse) {
        return None;
    }
    for i in 0..CURVE_STEPS {
        let f = i as f32 / CURVE_STEPS as f32;
        let ti0 = t0 + f * (t1 - t0);
        let ti1 = ti0 + (t1 - t0) / CURVE_STEPS as f32;

        let p0 = eval(ti0);
        let p1 = eval(ti1);
        if let Some(local) = point_on_line(p0, p1, mouse, tolerance) {
            return Some(ti0 + (ti1 - ti0) * local);
        }
    }
    None
}
