//! Raster preprocessing for single-bit laser engraving.
//!
//! Provides resampling, alpha flattening, grayscale conversion with
//! brightness/contrast, threshold binarization and Floyd-Steinberg dithering.
//! Every stage reads an immutable [`PixelBuffer`] and returns a new one.

pub mod buffer;
pub mod compose;
pub mod dither;
pub mod grayscale;
pub mod options;
pub mod pipeline;
pub mod resize;
pub mod threshold;

// Re-exports for convenience
pub use buffer::{PixelBuffer, Resolution};
pub use compose::flatten_alpha;
pub use dither::floyd_steinberg_dither;
pub use grayscale::{ColorMatrix, GrayscaleFormula, grayscale};
pub use options::{BinarizeMode, ConvertOptions};
pub use pipeline::{convert, convert_with_stop};
pub use resize::{InterpolationQuality, resize, resize_with_stop};
pub use threshold::threshold;

use enough::StopReason;

/// Errors that can occur while converting a raster.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    #[error("Grayscale adjustment unavailable: {0}")]
    AdjustmentUnavailable(String),

    #[error("Unknown grayscale formula code {0}")]
    UnknownFormula(u8),

    #[error("Operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for RasterError {
    fn from(reason: StopReason) -> Self {
        RasterError::Cancelled(reason)
    }
}

/// Result type alias for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
