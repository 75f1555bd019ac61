//! Preview compositor for the removal result.
//!
//! Tiles come out of three stages: raw source passthrough (`bypass`), the
//! accepted result (`is_final`), or the graded difference between source
//! and result using per-region tone levels.

mod grading;

pub use grading::{grade, GradingTable, ToneParams};

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};

use crate::source::{TileRect, TileSource};

/// Single-channel float buffer, the working format of the removal
/// algorithms.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FloatImage {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "FloatImage must be non-empty");
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
        }
    }

    pub fn from_gray(img: &GrayImage) -> Self {
        let mut out = Self::new(img.width(), img.height());
        for (x, y, p) in img.enumerate_pixels() {
            out.set(x, y, p[0] as f32);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// 8-bit conversion: magnitude clamped to the byte range.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.get(x, y).abs().clamp(0.0, 255.0).round() as u8])
        })
    }

    pub fn crop(&self, rect: TileRect) -> FloatImage {
        let x0 = rect.x.min(self.width.saturating_sub(1));
        let y0 = rect.y.min(self.height.saturating_sub(1));
        let w = rect.width.clamp(1, self.width - x0);
        let h = rect.height.clamp(1, self.height - y0);
        let mut out = Self::new(w, h);
        for y in 0..h {
            for x in 0..w {
                out.set(x, y, self.get(x0 + x, y0 + y));
            }
        }
        out
    }
}

/// Per-pixel region indices, 0 meaning no region. Written by the removal
/// algorithms (piece masks) and consumed by the grading stage.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionIndexMask {
    width: u32,
    height: u32,
    data: Vec<u16>,
}

impl RegionIndexMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, index: u16) {
        self.data[(y * self.width + x) as usize] = index;
    }

    pub(crate) fn data(&self) -> &[u16] {
        &self.data
    }

    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<u16>) -> Self {
        assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }
}

/// Render state of one removal session: the float result buffer, the
/// region indices, and the two stage flags.
pub struct RemovePreview {
    pub bypass: bool,
    pub is_final: bool,
    result: FloatImage,
    regions: RegionIndexMask,
}

impl RemovePreview {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bypass: false,
            is_final: false,
            result: FloatImage::new(width, height),
            regions: RegionIndexMask::new(width, height),
        }
    }

    pub fn result(&self) -> &FloatImage {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut FloatImage {
        &mut self.result
    }

    pub fn set_result(&mut self, result: FloatImage) {
        self.result = result;
    }

    pub fn regions(&self) -> &RegionIndexMask {
        &self.regions
    }

    pub fn set_regions(&mut self, regions: RegionIndexMask) {
        self.regions = regions;
    }

    /// Produce one display tile. `rect` is in document pixels, `target` the
    /// on-screen tile size.
    pub fn tile(
        &self,
        source: &dyn TileSource,
        table: &GradingTable,
        rect: TileRect,
        target: (u32, u32),
    ) -> GrayImage {
        if self.bypass {
            return source.tile(rect, target);
        }

        let result8 = self.result.crop(rect).to_gray();
        let result = imageops::resize(&result8, target.0, target.1, FilterType::Triangle);
        if self.is_final {
            return result;
        }

        // Tone parameters sampled at native resolution, then resized
        // nearest-neighbor. Interpolating levels across a region boundary
        // would grade boundary pixels with levels belonging to neither
        // region.
        let mut params = RgbaImage::new(rect.width, rect.height);
        for y in 0..rect.height {
            for x in 0..rect.width {
                let index = self.regions.get(rect.x + x, rect.y + y);
                params.put_pixel(x, y, table.params_for(index).encode());
            }
        }
        let params = imageops::resize(&params, target.0, target.1, FilterType::Nearest);

        let src = source.tile(rect, target);
        GrayImage::from_fn(target.0, target.1, |x, y| {
            image::Luma([grade(
                src.get_pixel(x, y)[0],
                result.get_pixel(x, y)[0],
                *params.get_pixel(x, y),
            )])
        })
    }
}
