//! Resampling to the engraving resolution.
//!
//! Separable two-pass interpolation over premultiplied samples. Kernel taps
//! that fall outside the source are mirrored back inside (tile-flip), so the
//! edges never read undefined pixels.

use enough::{Stop, Unstoppable};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::buffer::{PixelBuffer, check_dimensions};
use crate::compose::flatten_alpha;

/// Interpolation kernel used when the size changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationQuality {
    NearestNeighbor,
    Bilinear,
    Bicubic,
    HighQualityBilinear,
    /// Catmull-Rom cubic with area-aware prefiltering when downscaling.
    #[default]
    HighQualityBicubic,
}

impl InterpolationQuality {
    /// Kernel half-width at unit scale.
    fn support(self) -> f32 {
        match self {
            Self::NearestNeighbor => 0.5,
            Self::Bilinear | Self::HighQualityBilinear => 1.0,
            Self::Bicubic | Self::HighQualityBicubic => 2.0,
        }
    }

    /// Whether the kernel is stretched by the downscale factor.
    fn prefilters(self) -> bool {
        matches!(self, Self::HighQualityBilinear | Self::HighQualityBicubic)
    }

    fn weight(self, x: f32) -> f32 {
        let x = x.abs();
        match self {
            Self::NearestNeighbor => {
                if x < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Bilinear | Self::HighQualityBilinear => (1.0 - x).max(0.0),
            Self::Bicubic | Self::HighQualityBicubic => catmull_rom(x),
        }
    }
}

/// Catmull-Rom spline (B=0, C=0.5), support [-2, 2].
fn catmull_rom(x: f32) -> f32 {
    if x >= 2.0 {
        0.0
    } else if x >= 1.0 {
        -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
    } else {
        1.5 * x * x * x - 2.5 * x * x + 1.0
    }
}

/// Resample `source` to `target` (width, height).
///
/// Returns a deep copy when the size is unchanged, whatever `flatten` says.
/// Otherwise, with `flatten` the resampled result is composited over opaque
/// white; without it alpha is preserved.
/// Resolution metadata is copied unchanged.
pub fn resize(
    source: &PixelBuffer,
    target: (u32, u32),
    flatten: bool,
    quality: InterpolationQuality,
) -> Result<PixelBuffer> {
    resize_with_stop(source, target, flatten, quality, &Unstoppable)
}

/// [`resize`] with a stop token checked between rows.
///
/// A fired token yields [`RasterError::Cancelled`](crate::RasterError::Cancelled);
/// no partial buffer is returned.
pub fn resize_with_stop(
    source: &PixelBuffer,
    target: (u32, u32),
    flatten: bool,
    quality: InterpolationQuality,
    stop: &dyn Stop,
) -> Result<PixelBuffer> {
    let (width, height) = target;
    check_dimensions(width, height)?;
    let (src_w, src_h) = source.dimensions();

    if (src_w, src_h) == target {
        debug!(width, height, "Image already at target size, copying");
        return Ok(source.clone());
    }

    debug!(
        src_w,
        src_h,
        new_width = width,
        new_height = height,
        ?quality,
        "Resampling image"
    );
    let h_taps = compute_taps(src_w, width, quality);
    let v_taps = compute_taps(src_h, height, quality);

    let premultiplied = premultiply(source.as_rgba());
    let horizontal = horizontal_pass(&premultiplied, src_w as usize, &h_taps, stop)?;
    let vertical = vertical_pass(&horizontal, width as usize, &v_taps, stop)?;
    let resampled = unpremultiply(&vertical, width, height);
    let resized = PixelBuffer::from_parts(resampled, source.resolution());

    if flatten {
        Ok(flatten_alpha(&resized))
    } else {
        Ok(resized)
    }
}

/// Source indices and normalized weights contributing to one output sample.
#[derive(Debug, Clone)]
struct Taps {
    indices: Vec<usize>,
    weights: Vec<f32>,
}

/// Precompute 1D taps for every output position along one axis.
fn compute_taps(src_len: u32, dst_len: u32, quality: InterpolationQuality) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let filter_scale = if quality.prefilters() {
        scale.max(1.0)
    } else {
        1.0
    };
    let support = quality.support() * filter_scale;

    (0..dst_len)
        .map(|dst| {
            // Pixel centers are aligned, not pixel corners.
            let center = (dst as f32 + 0.5) * scale - 0.5;
            let nearest = Taps {
                indices: vec![mirror((center + 0.5).floor() as i64, src_len)],
                weights: vec![1.0],
            };
            if quality == InterpolationQuality::NearestNeighbor {
                return nearest;
            }

            let first = (center - support).ceil() as i64;
            let last = (center + support).floor() as i64;
            let mut indices = Vec::new();
            let mut weights = Vec::new();
            for i in first..=last {
                let w = quality.weight((center - i as f32) / filter_scale);
                if w != 0.0 {
                    indices.push(mirror(i, src_len));
                    weights.push(w);
                }
            }

            let sum: f32 = weights.iter().sum();
            if sum.abs() <= f32::EPSILON {
                return nearest;
            }
            for w in &mut weights {
                *w /= sum;
            }
            Taps { indices, weights }
        })
        .collect()
}

/// Reflect an out-of-range index back into `0..len` (edge sample repeated).
fn mirror(index: i64, len: u32) -> usize {
    let len = i64::from(len);
    let period = 2 * len;
    let m = index.rem_euclid(period);
    (if m < len { m } else { period - 1 - m }) as usize
}

type Sample = [f32; 4];

fn premultiply(image: &RgbaImage) -> Vec<Sample> {
    image
        .pixels()
        .map(|p| {
            let a = f32::from(p[3]);
            let k = a / 255.0;
            [
                f32::from(p[0]) * k,
                f32::from(p[1]) * k,
                f32::from(p[2]) * k,
                a,
            ]
        })
        .collect()
}

fn unpremultiply(samples: &[Sample], width: u32, height: u32) -> RgbaImage {
    debug_assert_eq!(samples.len(), width as usize * height as usize);
    let mut output = RgbaImage::new(width, height);
    for (dst, s) in output.pixels_mut().zip(samples) {
        let a = s[3].clamp(0.0, 255.0);
        *dst = if a < 0.5 {
            Rgba([0, 0, 0, 0])
        } else {
            let k = 255.0 / a;
            let c = |v: f32| (v * k).round().clamp(0.0, 255.0) as u8;
            Rgba([c(s[0]), c(s[1]), c(s[2]), a.round() as u8])
        };
    }
    output
}

fn accumulate(acc: &mut Sample, s: &Sample, w: f32) {
    for (a, v) in acc.iter_mut().zip(s) {
        *a += v * w;
    }
}

/// Resample every source row to the target width.
fn horizontal_pass(
    src: &[Sample],
    src_w: usize,
    taps: &[Taps],
    stop: &dyn Stop,
) -> Result<Vec<Sample>> {
    let dst_w = taps.len();
    let mut out = Vec::with_capacity(dst_w * (src.len() / src_w));

    for row in src.chunks_exact(src_w) {
        stop.check()?;
        for t in taps {
            let mut acc = [0.0; 4];
            for (&i, &w) in t.indices.iter().zip(&t.weights) {
                accumulate(&mut acc, &row[i], w);
            }
            out.push(acc);
        }
    }

    Ok(out)
}

/// Resample every column of the horizontally resized grid to the target height.
fn vertical_pass(
    src: &[Sample],
    width: usize,
    taps: &[Taps],
    stop: &dyn Stop,
) -> Result<Vec<Sample>> {
    let mut out = Vec::with_capacity(width * taps.len());

    for t in taps {
        stop.check()?;
        for x in 0..width {
            let mut acc = [0.0; 4];
            for (&i, &w) in t.indices.iter().zip(&t.weights) {
                accumulate(&mut acc, &src[i * width + x], w);
            }
            out.push(acc);
        }
    }

    Ok(out)
}
