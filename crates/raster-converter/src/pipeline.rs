//! End-to-end raster conversion.
//!
//! resize -> grayscale -> dither | threshold. Each stage allocates its own
//! output; the caller's buffer is never modified.

use enough::{Stop, Unstoppable};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::compose::flatten_alpha;
use crate::dither::floyd_steinberg_dither;
use crate::grayscale::grayscale;
use crate::options::{BinarizeMode, ConvertOptions};
use crate::resize::resize_with_stop;
use crate::threshold::threshold;
use crate::{RasterError, Result};

/// Run the full conversion described by `options`.
pub fn convert(source: &PixelBuffer, options: &ConvertOptions) -> Result<PixelBuffer> {
    convert_with_stop(source, options, &Unstoppable)
}

/// [`convert`] with a stop token checked between resampled rows and between stages.
pub fn convert_with_stop(
    source: &PixelBuffer,
    options: &ConvertOptions,
    stop: &dyn Stop,
) -> Result<PixelBuffer> {
    let options = options.normalized();
    let (width, height) = source.dimensions();
    let target = options.target_size.unwrap_or((width, height));
    debug!(width, height, ?target, binarize = ?options.binarize, "Converting raster");

    let mut resized =
        resize_with_stop(source, target, options.flatten_alpha, options.quality, stop)?;
    if options.flatten_alpha && target == (width, height) {
        resized = flatten_alpha(&resized);
    }
    stop.check()?;

    let gray = grayscale(
        &resized,
        options.custom_weights,
        options.brightness,
        options.contrast,
        options.formula,
    )
    .ok_or_else(|| {
        RasterError::AdjustmentUnavailable(format!(
            "formula {:?}, weights {:?}, brightness {}, contrast {}",
            options.formula, options.custom_weights, options.brightness, options.contrast
        ))
    })?;
    stop.check()?;

    let output = match options.binarize {
        BinarizeMode::Dither => floyd_steinberg_dither(&gray),
        BinarizeMode::Threshold { cutoff, apply } => threshold(&gray, cutoff, apply),
    };

    debug_assert_eq!(output.dimensions(), target);
    debug!(
        width = output.width(),
        height = output.height(),
        "Raster conversion complete"
    );
    Ok(output)
}
