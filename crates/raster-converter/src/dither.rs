//! Floyd-Steinberg error-diffusion dithering to pure black and white.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::buffer::{PixelBuffer, luminance};

/// Luminance at or above which a pixel quantizes to white.
const THRESHOLD: u8 = 128;

/// Floyd-Steinberg kernel as (dx, dy, weight / 16).
///
/// - Right:        7/16
/// - Bottom-left:  3/16
/// - Bottom:       5/16
/// - Bottom-right: 1/16
const FLOYD_STEINBERG: [(i64, i64, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

/// Apply Floyd-Steinberg dithering.
///
/// Pixels are visited row-major, left to right and top to bottom; changing the
/// order changes the output. Each pixel becomes pure black or white by its
/// luminance, alpha is kept, and the per-channel quantization error is pushed
/// into the not-yet-visited neighbors. The source is left untouched.
pub fn floyd_steinberg_dither(source: &PixelBuffer) -> PixelBuffer {
    let (width, height) = source.dimensions();
    debug!(width, height, "Applying Floyd-Steinberg dithering");

    let mut state = DitherState::new(source);
    for y in 0..height {
        for x in 0..width {
            let current = state.get(x, y);
            let quantized = quantize(current);
            state.set(x, y, quantized);

            let error = [0usize, 1, 2].map(|c| i32::from(current[c]) - i32::from(quantized[c]));
            state.diffuse(x, y, error);
        }
    }

    debug!("Floyd-Steinberg dithering complete");
    PixelBuffer::from_parts(state.finish(), source.resolution())
}

/// Threshold a single pixel by luminance, keeping its alpha.
fn quantize(pixel: Rgba<u8>) -> Rgba<u8> {
    let v = if luminance(pixel) < THRESHOLD { 0 } else { 255 };
    Rgba([v, v, v, pixel[3]])
}

/// Working copy mutated in place during one dithering pass.
struct DitherState {
    pixels: RgbaImage,
}

impl DitherState {
    fn new(source: &PixelBuffer) -> Self {
        Self {
            pixels: source.as_rgba().clone(),
        }
    }

    fn get(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    fn set(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        self.pixels.put_pixel(x, y, pixel);
    }

    /// Add weighted error to in-bounds neighbors, saturating each channel.
    fn diffuse(&mut self, x: u32, y: u32, error: [i32; 3]) {
        if error == [0; 3] {
            return;
        }
        let (width, height) = self.pixels.dimensions();

        for (dx, dy, weight) in FLOYD_STEINBERG {
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }

            let pixel = self.pixels.get_pixel_mut(nx as u32, ny as u32);
            for (channel, e) in pixel.0.iter_mut().zip(error) {
                let spread = (e * weight) >> 4;
                *channel = (i32::from(*channel) + spread).clamp(0, 255) as u8;
            }
        }
    }

    fn finish(self) -> RgbaImage {
        self.pixels
    }
}
