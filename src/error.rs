use thiserror::Error;

/// Failures while loading a source image and building its pyramid.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image is {width}x{height}, larger than the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Failures surfaced by the external removal algorithms. Caught at the
/// boundary; the document is left as it was before the call.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    #[error("{0}")]
    Failed(String),

    /// User-driven early exit, not a fault. Partial results are whatever
    /// the algorithm had produced when the progress callback declined.
    #[error("operation cancelled")]
    Cancelled,
}
