//! Alpha flattening: composite a buffer over opaque white.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::buffer::{PixelBuffer, WHITE};

/// Composite `source` over an opaque white background (SourceOver).
///
/// The result has no transparency. Opaque pixels are copied as-is and fully
/// transparent pixels become white, so flattening twice equals flattening once.
pub fn flatten_alpha(source: &PixelBuffer) -> PixelBuffer {
    let (width, height) = source.dimensions();
    debug!(width, height, "Flattening alpha onto white");

    let mut output = RgbaImage::from_pixel(width, height, WHITE);
    for (dst, src) in output.pixels_mut().zip(source.as_rgba().pixels()) {
        *dst = blend_over(&WHITE, src);
    }

    PixelBuffer::from_parts(output, source.resolution())
}

/// Blend `fg` over an opaque `bg`.
pub(crate) fn blend_over(bg: &Rgba<u8>, fg: &Rgba<u8>) -> Rgba<u8> {
    match fg[3] {
        255 => *fg,
        0 => Rgba([bg[0], bg[1], bg[2], 255]),
        a => {
            let alpha = f32::from(a) / 255.0;
            let inv = 1.0 - alpha;
            let mix = |f: u8, b: u8| (f32::from(f) * alpha + f32::from(b) * inv).round() as u8;
            Rgba([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2]), 255])
        }
    }
}
