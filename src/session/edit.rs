use egui::{Modifiers, Pos2, Vec2};

use crate::annotation::ShapeId;
use crate::geometry::rotate_about;
use crate::shape::{ControlPoint, Handle};

fn angle(from: Pos2, to: Pos2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// One in-flight edit of a single shape during an active interaction.
///
/// Holds a full backup of the point list so the gesture can be previewed
/// destructively and rolled back on cancel, and so commit can record an
/// exact before/after pair.
#[derive(Clone, Debug)]
pub struct Edit {
    pub id: ShapeId,
    pub backup: Vec<ControlPoint>,
    /// Affected point indices; empty means the whole shape moves.
    pub targets: Vec<usize>,
    pub handle: Option<Handle>,
    /// The freshly inserted point for Insert mode (tangents frozen at
    /// insertion time).
    pub inserted: Option<ControlPoint>,
}

impl Edit {
    pub fn whole_shape(id: ShapeId, backup: Vec<ControlPoint>) -> Self {
        Self {
            id,
            backup,
            targets: Vec::new(),
            handle: None,
            inserted: None,
        }
    }

    /// Recompute the point list for a drag of `delta` source pixels from the
    /// backup state.
    ///
    /// A knot (or edge endpoint) target translates its knot. A tangent
    /// target rotates the opposite tangent by the same angle change,
    /// mirrored, preserving each tangent's own length; holding COMMAND also
    /// matches the opposite length to the dragged one.
    pub fn moved(&self, delta: Vec2, modifiers: Modifiers) -> Vec<ControlPoint> {
        let mut points = self.backup.clone();
        if self.targets.is_empty() {
            for p in &mut points {
                p.knot += delta;
            }
            return points;
        }

        for &i in &self.targets {
            let p = &mut points[i];
            match self.handle {
                None | Some(Handle::Knot) => p.knot += delta,
                Some(tangent @ (Handle::TangentIn | Handle::TangentOut)) => {
                    let dragging_in = tangent == Handle::TangentIn;
                    let this_tan = p.knot + if dragging_in { p.tan_in } else { p.tan_out };
                    let that_tan = p.knot + if dragging_in { p.tan_out } else { p.tan_in };
                    let this_dist = (this_tan - p.knot).length();
                    let mut that_dist = (that_tan - p.knot).length();
                    if this_dist <= 0.0 || that_dist <= 0.0 {
                        continue;
                    }

                    let this_angle = angle(p.knot, this_tan);
                    let that_angle = angle(p.knot, that_tan);
                    let new_tan = this_tan + delta;
                    if modifiers.command {
                        that_dist = (new_tan - p.knot).length();
                    }

                    let a = that_angle + (angle(p.knot, new_tan) - this_angle);
                    let that_new = p.knot + Vec2::new(that_dist * a.cos(), that_dist * a.sin());

                    if dragging_in {
                        p.tan_in = new_tan - p.knot;
                        p.tan_out = that_new - p.knot;
                    } else {
                        p.tan_out = new_tan - p.knot;
                        p.tan_in = that_new - p.knot;
                    }
                }
            }
        }
        points
    }

    /// Recompute the point list for a rotation around `anchor` from the
    /// backup state.
    pub fn rotated(&self, anchor: Pos2, angle: f32) -> Vec<ControlPoint> {
        self.backup
            .iter()
            .map(|p| {
                let knot = rotate_about(p.knot, anchor, angle);
                ControlPoint::with_tangents(
                    knot,
                    rotate_about(p.knot + p.tan_in, anchor, angle) - knot,
                    rotate_about(p.knot + p.tan_out, anchor, angle) - knot,
                )
            })
            .collect()
    }
}
