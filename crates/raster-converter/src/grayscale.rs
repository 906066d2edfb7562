//! Grayscale conversion with brightness and contrast.
//!
//! The whole adjustment is a single 5x5 color matrix applied once per pixel.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffer::PixelBuffer;
use crate::{RasterError, Result};

/// Formula used to weight the color channels into a gray value.
///
/// The numeric codes are stable so hosts can persist the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayscaleFormula {
    SimpleAverage = 0,
    WeightedAverage = 1,
    /// Perceptual luminance (0.299, 0.587, 0.114).
    #[default]
    OpticalCorrect = 2,
    /// 0.333 times caller-supplied per-channel multipliers.
    Custom = 3,
}

impl GrayscaleFormula {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::SimpleAverage),
            1 => Ok(Self::WeightedAverage),
            2 => Ok(Self::OpticalCorrect),
            3 => Ok(Self::Custom),
            other => Err(RasterError::UnknownFormula(other)),
        }
    }

    /// Per-channel (R, G, B) weights. `custom` only affects [`Self::Custom`].
    pub fn weights(self, custom: [f32; 3]) -> [f32; 3] {
        match self {
            Self::SimpleAverage => [0.333, 0.333, 0.333],
            Self::WeightedAverage => [0.333, 0.444, 0.222],
            Self::OpticalCorrect => [0.299, 0.587, 0.114],
            Self::Custom => custom.map(|w| 0.333 * w),
        }
    }
}

impl TryFrom<u8> for GrayscaleFormula {
    type Error = RasterError;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code)
    }
}

/// 5x5 color transform over normalized (R, G, B, A, 1) row vectors.
///
/// Row `i` holds the contribution of input component `i` to each output
/// component; row 4 is the translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([[f32; 5]; 5]);

impl ColorMatrix {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]);

    /// Matrix broadcasting `w·rgb + brightness` into R, G and B, alpha untouched.
    ///
    /// Returns `None` if any coefficient is not finite.
    pub fn grayscale(weights: [f32; 3], brightness: f32) -> Option<Self> {
        if !weights.iter().all(|w| w.is_finite()) || !brightness.is_finite() {
            return None;
        }
        let [r, g, b] = weights;
        Some(Self([
            [r, r, r, 0.0, 0.0],
            [g, g, g, 0.0, 0.0],
            [b, b, b, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0],
            [brightness, brightness, brightness, 0.0, 1.0],
        ]))
    }

    /// Transform one pixel, clamping every channel to 0..=255.
    pub fn apply(&self, pixel: Rgba<u8>) -> Rgba<u8> {
        let input = [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
            f32::from(pixel[3]) / 255.0,
            1.0,
        ];
        let mut out = [0u8; 4];
        for (j, channel) in out.iter_mut().enumerate() {
            let v: f32 = input.iter().zip(&self.0).map(|(x, row)| x * row[j]).sum();
            *channel = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        Rgba(out)
    }
}

/// Convert to gray using `formula`, then apply brightness and contrast.
///
/// Every output color channel is `contrast·(w·rgb) + brightness` in
/// normalized units; alpha passes through. Negative `contrast` is clamped
/// to 0. Returns `None` when the adjustment cannot be built (non-finite
/// weights, brightness or contrast); the source is never modified.
pub fn grayscale(
    source: &PixelBuffer,
    custom_weights: [f32; 3],
    brightness: f32,
    contrast: f32,
    formula: GrayscaleFormula,
) -> Option<PixelBuffer> {
    let (width, height) = source.dimensions();
    let contrast = if contrast < 0.0 { 0.0 } else { contrast };
    let weights = formula.weights(custom_weights).map(|w| w * contrast);

    let Some(matrix) = ColorMatrix::grayscale(weights, brightness) else {
        warn!(
            ?formula,
            ?custom_weights,
            brightness,
            contrast,
            "Grayscale adjustment unavailable"
        );
        return None;
    };
    debug!(width, height, ?formula, brightness, contrast, "Applying grayscale matrix");

    let mut output = RgbaImage::new(width, height);
    for (dst, src) in output.pixels_mut().zip(source.as_rgba().pixels()) {
        *dst = matrix.apply(*src);
    }

    Some(PixelBuffer::from_parts(output, source.resolution()))
}
