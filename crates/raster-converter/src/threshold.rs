//! Hard-threshold binarization.
//!
//! Threshold is the final transformation before engraving, so transparency is
//! always flattened onto white first.

use tracing::debug;

use crate::buffer::{BLACK, PixelBuffer, WHITE, luminance};
use crate::compose::flatten_alpha;

/// Cutoff used when the caller passes NaN.
pub const DEFAULT_CUTOFF: f32 = 0.5;

/// Flatten `source` onto white and, if `apply`, binarize it.
///
/// Pixels whose normalized luminance is below `cutoff` become black, all
/// others white. `cutoff` is clamped to `0.0..=1.0`. With `apply == false`
/// the flattened preview is returned unbinarized.
pub fn threshold(source: &PixelBuffer, cutoff: f32, apply: bool) -> PixelBuffer {
    let cutoff = if cutoff.is_nan() {
        DEFAULT_CUTOFF
    } else {
        cutoff.clamp(0.0, 1.0)
    };
    let (width, height) = source.dimensions();

    let flattened = flatten_alpha(source);
    if !apply {
        debug!(width, height, "Threshold preview, skipping binarization");
        return flattened;
    }

    debug!(width, height, cutoff, "Applying threshold conversion");
    let mut image = flattened.into_rgba();
    for p in image.pixels_mut() {
        let level = f32::from(luminance(*p)) / 255.0;
        *p = if level < cutoff { BLACK } else { WHITE };
    }

    PixelBuffer::from_parts(image, source.resolution())
}
