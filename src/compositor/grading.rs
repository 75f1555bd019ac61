use std::collections::BTreeMap;

use image::Rgba;
use log::debug;

use crate::annotation::AnnotationSet;
use crate::shape::{Shape, ShapeKind};

/// Tone levels of one graded region, in the 0..=255 range the Output shape
/// attributes use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneParams {
    pub black: f64,
    pub gamma: f64,
    pub white: f64,
    pub median: f64,
}

impl ToneParams {
    /// Levels that leave a pixel unchanged, used for pixels outside any
    /// Output shape's region.
    pub const PASS_THROUGH: Self = Self {
        black: 0.0,
        gamma: 0.0,
        white: 255.0,
        median: 0.0,
    };

    pub fn from_shape(shape: &Shape) -> Self {
        Self {
            black: shape.number("black"),
            gamma: shape.number("gamma"),
            white: shape.number("white"),
            median: shape.number("median"),
        }
    }

    /// Channel encoding of the per-pixel parameter image: red carries
    /// black, green carries gamma offset by 127, blue carries white, alpha
    /// carries median.
    pub fn encode(self) -> Rgba<u8> {
        Rgba([
            self.black.clamp(0.0, 255.0) as u8,
            (self.gamma + 127.0).clamp(0.0, 255.0) as u8,
            self.white.clamp(0.0, 255.0) as u8,
            self.median.clamp(0.0, 255.0) as u8,
        ])
    }
}

/// Region index to tone levels, rebuilt from the Output shapes whenever the
/// annotation set's revision moves.
#[derive(Default)]
pub struct GradingTable {
    params: BTreeMap<u16, ToneParams>,
    scanned_revision: Option<u64>,
}

impl GradingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan when the set changed since the last scan.
    pub fn sync(&mut self, set: &AnnotationSet) {
        if self.scanned_revision == Some(set.revision()) {
            return;
        }
        self.params.clear();
        for (_, shape) in set.shapes_of_kind(ShapeKind::Output) {
            let index = shape.number("index") as u16;
            if index > 0 {
                self.params.insert(index, ToneParams::from_shape(shape));
            }
        }
        self.scanned_revision = Some(set.revision());
        debug!("grading table: {} regions", self.params.len());
    }

    /// Levels for a region-index-mask value. Index 0 and unknown indices
    /// grade as pass-through.
    pub fn params_for(&self, index: u16) -> ToneParams {
        if index == 0 {
            return ToneParams::PASS_THROUGH;
        }
        self.params
            .get(&index)
            .copied()
            .unwrap_or(ToneParams::PASS_THROUGH)
    }
}

/// Blend one pixel: the source/result difference normalized by the region's
/// black and white points, then gamma-shaped.
///
/// The median channel is carried through the parameter image but forced to
/// zero here; see DESIGN.md.
pub fn grade(src: u8, res: u8, params: Rgba<u8>) -> u8 {
    let black = params[0] as f64 / 255.0;
    let gamma = (params[1] as f64 - 127.0) / 255.0 + 1.0;
    let white = params[2] as f64 / 255.0;
    let median = 0.0;

    let diff = (src as f64 - res as f64) / 255.0;
    let mut v = (diff - median).max(0.0);
    if white != black {
        v = (v - black) / (white - black);
    }
    v = (v + median).max(0.0);
    v = v.powf(gamma);
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
