//! Grayscale tile sources for the preview compositor.
//!
//! A loaded radiograph is kept as a size pyramid so zoomed-out tiles read
//! from an already-reduced level instead of filtering the full image on
//! every paint. Loading runs on a background thread; a superseding load
//! request discards the previous one via a generation counter.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use log::debug;
use parking_lot::Mutex;

use crate::error::LoadError;

/// Largest accepted source dimension.
pub const MAX_IMAGE_DIM: u32 = 32_768;

/// Pyramid levels stop halving once the larger side fits this.
pub const PYRAMID_FLOOR: u32 = 1024;

/// Axis-aligned pixel rectangle in document space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The same rectangle on a level `shift` halvings down, clamped so the
    /// crop stays inside `(width, height)`.
    fn at_level(self, shift: u32, width: u32, height: u32) -> Self {
        let x = (self.x >> shift).min(width.saturating_sub(1));
        let y = (self.y >> shift).min(height.saturating_sub(1));
        Self {
            x,
            y,
            width: (self.width >> shift).clamp(1, width - x),
            height: (self.height >> shift).clamp(1, height - y),
        }
    }
}

/// Anything that can serve resampled grayscale tiles of a document.
pub trait TileSource {
    /// Full-resolution document size.
    fn size(&self) -> (u32, u32);

    fn is_valid(&self) -> bool;

    /// Resample `rect` (document pixels) to `target` pixels.
    fn tile(&self, rect: TileRect, target: (u32, u32)) -> GrayImage;
}

/// Grayscale image with precomputed halved levels.
pub struct PyramidSource {
    /// `levels[0]` is full resolution, each following level halved.
    levels: Vec<GrayImage>,
}

impl PyramidSource {
    pub fn build(base: GrayImage) -> Self {
        let mut levels = vec![base];
        loop {
            let last = levels.last().unwrap();
            if last.width().max(last.height()) <= PYRAMID_FLOOR {
                break;
            }
            levels.push(half(last));
        }
        debug!(
            "pyramid: {}x{}, {} levels",
            levels[0].width(),
            levels[0].height(),
            levels.len()
        );
        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn full(&self) -> &GrayImage {
        &self.levels[0]
    }

    /// Level index for a document-to-target scale. Scales above one half
    /// read full resolution; below that, each quadrupling of the reduction
    /// steps one level down.
    fn level_for_scale(&self, scale: f32) -> usize {
        if scale > 0.5 {
            return 0;
        }
        let level = (1.0 / scale).sqrt() as usize + 1;
        level.min(self.levels.len()) - 1
    }
}

impl TileSource for PyramidSource {
    fn size(&self) -> (u32, u32) {
        (self.levels[0].width(), self.levels[0].height())
    }

    fn is_valid(&self) -> bool {
        self.levels[0].width() > 0 && self.levels[0].height() > 0
    }

    fn tile(&self, rect: TileRect, target: (u32, u32)) -> GrayImage {
        let scale = target.0 as f32 / rect.width.max(1) as f32;
        let index = self.level_for_scale(scale);
        let level = &self.levels[index];
        let r = rect.at_level(index as u32, level.width(), level.height());
        let crop = imageops::crop_imm(level, r.x, r.y, r.width, r.height).to_image();
        imageops::resize(&crop, target.0, target.1, FilterType::Triangle)
    }
}

/// 2x2 box average, floor-halved dimensions.
fn half(img: &GrayImage) -> GrayImage {
    let w = (img.width() / 2).max(1);
    let h = (img.height() / 2).max(1);
    let mut out = GrayImage::new(w, h);
    let px = |x: u32, y: u32| -> u16 {
        img.get_pixel(x.min(img.width() - 1), y.min(img.height() - 1))[0] as u16
    };
    for y in 0..h {
        for x in 0..w {
            let sum = px(2 * x, 2 * y) + px(2 * x + 1, 2 * y) + px(2 * x, 2 * y + 1)
                + px(2 * x + 1, 2 * y + 1);
            out.put_pixel(x, y, Luma([((sum + 2) / 4) as u8]));
        }
    }
    out
}

/// Decode an image file and build its pyramid, rejecting oversized inputs.
pub fn load_pyramid(path: &Path) -> Result<PyramidSource, LoadError> {
    let gray = image::open(path)?.to_luma8();
    if gray.width() > MAX_IMAGE_DIM || gray.height() > MAX_IMAGE_DIM {
        return Err(LoadError::TooLarge {
            width: gray.width(),
            height: gray.height(),
            max: MAX_IMAGE_DIM,
        });
    }
    Ok(PyramidSource::build(gray))
}

#[derive(Default)]
struct LoadSlot {
    generation: u64,
    ready: Option<Result<PyramidSource, LoadError>>,
}

/// One background load at a time. A new request supersedes the previous
/// one; a superseded thread's result is dropped when it finishes.
#[derive(Default)]
pub struct ImageLoader {
    slot: Arc<Mutex<LoadSlot>>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, path: PathBuf) {
        let generation = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.ready = None;
            slot.generation
        };
        let slot = Arc::clone(&self.slot);
        thread::spawn(move || {
            debug!("loading {path:?} (generation {generation})");
            let result = load_pyramid(&path);
            let mut slot = slot.lock();
            if slot.generation == generation {
                slot.ready = Some(result);
            } else {
                debug!("load of {path:?} superseded, discarding");
            }
        });
    }

    /// Completed result of the most recent request, if any. Consumes it.
    pub fn take(&self) -> Option<Result<PyramidSource, LoadError>> {
        self.slot.lock().ready.take()
    }
}
