//! Contracts for the external removal algorithms.
//!
//! Detection, cradle removal, and texture removal are long-running
//! collaborators outside this crate. They run synchronously and accept a
//! cooperative cancellation callback; returning `false` from it asks the
//! algorithm to stop early, leaving its partial output wherever it got to.

use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::compositor::{FloatImage, RegionIndexMask};
use crate::error::AlgorithmError;

/// Periodic progress report, `(done, total)`. Return `false` to cancel.
pub type ProgressFn<'a> = dyn FnMut(u64, u64) -> bool + 'a;

/// One detected cradle member, by its center row/column and thickness in
/// document pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub center: f32,
    pub thickness: f32,
}

/// Detection output: the horizontal and vertical cradle members.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BandRanges {
    pub horizontal: Vec<Band>,
    pub vertical: Vec<Band>,
}

/// Removal output: which piece of the cradle lattice each pixel belongs to
/// (0 = none), plus a representative center per piece. Kept so later
/// grading and texture removal can address pieces individually.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkedSegments {
    pub piece_count: u16,
    pub piece_index_mask: RegionIndexMask,
    pub piece_centers: Vec<Pos2>,
}

impl MarkedSegments {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            piece_count: 0,
            piece_index_mask: RegionIndexMask::new(width, height),
            piece_centers: Vec::new(),
        }
    }
}

// Persistence format, flat so the mask serializes as one array.
#[derive(Serialize, Deserialize)]
struct MarkedSegmentsRepr {
    piece_count: u16,
    width: u32,
    height: u32,
    mask: Vec<u16>,
    centers: Vec<(f32, f32)>,
}

impl Serialize for MarkedSegments {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MarkedSegmentsRepr {
            piece_count: self.piece_count,
            width: self.piece_index_mask.width(),
            height: self.piece_index_mask.height(),
            mask: self.piece_index_mask.data().to_vec(),
            centers: self.piece_centers.iter().map(|p| (p.x, p.y)).collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MarkedSegments {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MarkedSegmentsRepr::deserialize(deserializer)?;
        if repr.mask.len() != (repr.width * repr.height) as usize {
            return Err(serde::de::Error::custom("piece mask size mismatch"));
        }
        Ok(Self {
            piece_count: repr.piece_count,
            piece_index_mask: RegionIndexMask::from_raw(repr.width, repr.height, repr.mask),
            piece_centers: repr
                .centers
                .into_iter()
                .map(|(x, y)| Pos2::new(x, y))
                .collect(),
        })
    }
}

/// Cradle detection and removal.
pub trait CradleRemoval {
    /// Locate cradle members in the source. `fixed_member_counts` pins the
    /// expected `(horizontal, vertical)` counts when the user supplied
    /// them.
    fn detect(
        &self,
        source: &FloatImage,
        defect_mask: &FloatImage,
        fixed_member_counts: Option<(u32, u32)>,
        progress: &mut ProgressFn,
    ) -> Result<BandRanges, AlgorithmError>;

    fn remove_horizontal(
        &self,
        source: &FloatImage,
        defect_mask: &FloatImage,
        result: &mut FloatImage,
        bands: &[Band],
        progress: &mut ProgressFn,
    ) -> Result<MarkedSegments, AlgorithmError>;

    fn remove_vertical(
        &self,
        source: &FloatImage,
        defect_mask: &FloatImage,
        result: &mut FloatImage,
        bands: &[Band],
        progress: &mut ProgressFn,
    ) -> Result<MarkedSegments, AlgorithmError>;

    fn remove_cross_section(
        &self,
        source: &FloatImage,
        defect_mask: &FloatImage,
        result: &mut FloatImage,
        horizontal: &[Band],
        vertical: &[Band],
        progress: &mut ProgressFn,
    ) -> Result<MarkedSegments, AlgorithmError>;
}

/// Wood-texture removal over an already cradle-removed result.
pub trait TextureRemoval {
    fn remove(
        &self,
        result: &FloatImage,
        defect_mask: &FloatImage,
        segments: &MarkedSegments,
        progress: &mut ProgressFn,
    ) -> Result<FloatImage, AlgorithmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_segments_survive_persistence() {
        let mut mask = RegionIndexMask::new(2, 2);
        mask.set(1, 1, 3);
        let segments = MarkedSegments {
            piece_count: 3,
            piece_index_mask: mask,
            piece_centers: vec![Pos2::new(1.5, 0.5)],
        };
        let json = serde_json::to_string(&segments).unwrap();
        let back: MarkedSegments = serde_json::from_str(&json).unwrap();
        assert_eq!(back, segments);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let json = r#"{"piece_count":1,"width":2,"height":2,"mask":[0],"centers":[]}"#;
        assert!(serde_json::from_str::<MarkedSegments>(json).is_err());
    }
}
