//! Conversion configuration.
//!
//! Every knob the host exposes as a slider or selector lives here as a plain
//! value. Out-of-range values are clamped by [`ConvertOptions::normalized`]
//! rather than rejected.

use serde::{Deserialize, Serialize};

use crate::grayscale::GrayscaleFormula;
use crate::resize::InterpolationQuality;

/// Final reduction to two levels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BinarizeMode {
    /// Floyd-Steinberg error diffusion.
    #[default]
    Dither,
    /// Hard luminance cutoff in `0.0..=1.0`. With `apply == false` only the
    /// alpha flattening runs (preview).
    Threshold { cutoff: f32, apply: bool },
}

/// Configuration options for one raster conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Output size in pixels; `None` keeps the source size.
    pub target_size: Option<(u32, u32)>,

    pub quality: InterpolationQuality,

    /// Composite onto opaque white while resizing.
    pub flatten_alpha: bool,

    pub formula: GrayscaleFormula,

    /// Per-channel multipliers, only used by [`GrayscaleFormula::Custom`].
    pub custom_weights: [f32; 3],

    /// Offset added to the gray value, normalized (`-1.0..=1.0`).
    pub brightness: f32,

    /// Gain applied to the formula weights (`>= 0.0`, 1.0 is neutral).
    pub contrast: f32,

    pub binarize: BinarizeMode,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target_size: None,
            quality: InterpolationQuality::default(),
            flatten_alpha: true,
            formula: GrayscaleFormula::default(),
            custom_weights: [1.0, 1.0, 1.0],
            brightness: 0.0,
            contrast: 1.0,
            binarize: BinarizeMode::default(),
        }
    }
}

impl ConvertOptions {
    /// Create options with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: resize to `width` x `height`.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = Some((width, height));
        self
    }

    /// Builder: set interpolation quality.
    pub fn with_quality(mut self, quality: InterpolationQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Builder: set alpha flattening during resize.
    pub fn with_flatten_alpha(mut self, val: bool) -> Self {
        self.flatten_alpha = val;
        self
    }

    /// Builder: set grayscale formula.
    pub fn with_formula(mut self, formula: GrayscaleFormula) -> Self {
        self.formula = formula;
        self
    }

    /// Builder: set custom channel multipliers.
    pub fn with_custom_weights(mut self, r: f32, g: f32, b: f32) -> Self {
        self.custom_weights = [r, g, b];
        self
    }

    /// Builder: set brightness offset.
    pub fn with_brightness(mut self, val: f32) -> Self {
        self.brightness = val;
        self
    }

    /// Builder: set contrast gain.
    pub fn with_contrast(mut self, val: f32) -> Self {
        self.contrast = val;
        self
    }

    /// Builder: finish with error-diffusion dithering.
    pub fn with_dither(mut self) -> Self {
        self.binarize = BinarizeMode::Dither;
        self
    }

    /// Builder: finish with a hard threshold.
    pub fn with_threshold(mut self, cutoff: f32, apply: bool) -> Self {
        self.binarize = BinarizeMode::Threshold { cutoff, apply };
        self
    }

    /// Copy with every slider clamped to its documented range.
    ///
    /// NaN values are kept so the grayscale stage can report them as unavailable.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.contrast < 0.0 {
            out.contrast = 0.0;
        }
        out.brightness = out.brightness.clamp(-1.0, 1.0);
        if let BinarizeMode::Threshold { cutoff, .. } = &mut out.binarize {
            *cutoff = cutoff.clamp(0.0, 1.0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.target_size, None);
        assert_eq!(opts.quality, InterpolationQuality::HighQualityBicubic);
        assert!(opts.flatten_alpha);
        assert_eq!(opts.formula, GrayscaleFormula::OpticalCorrect);
        assert_eq!(opts.custom_weights, [1.0, 1.0, 1.0]);
        assert!(opts.brightness.abs() < f32::EPSILON);
        assert!((opts.contrast - 1.0).abs() < f32::EPSILON);
        assert_eq!(opts.binarize, BinarizeMode::Dither);
    }

    #[test]
    fn test_builder_chain() {
        let opts = ConvertOptions::new()
            .with_target_size(640, 480)
            .with_quality(InterpolationQuality::Bilinear)
            .with_flatten_alpha(false)
            .with_formula(GrayscaleFormula::Custom)
            .with_custom_weights(1.0, 2.0, 0.5)
            .with_brightness(0.1)
            .with_contrast(1.3)
            .with_threshold(0.4, true);

        assert_eq!(opts.target_size, Some((640, 480)));
        assert_eq!(opts.quality, InterpolationQuality::Bilinear);
        assert!(!opts.flatten_alpha);
        assert_eq!(opts.formula, GrayscaleFormula::Custom);
        assert_eq!(opts.custom_weights, [1.0, 2.0, 0.5]);
        assert!((opts.brightness - 0.1).abs() < f32::EPSILON);
        assert!((opts.contrast - 1.3).abs() < f32::EPSILON);
        assert_eq!(
            opts.binarize,
            BinarizeMode::Threshold {
                cutoff: 0.4,
                apply: true
            }
        );
        assert_eq!(opts.with_dither().binarize, BinarizeMode::Dither);
    }

    #[test]
    fn test_normalized_clamps_sliders() {
        let opts = ConvertOptions::new()
            .with_brightness(3.0)
            .with_contrast(-0.5)
            .with_threshold(1.7, true)
            .normalized();

        assert!((opts.brightness - 1.0).abs() < f32::EPSILON);
        assert!(opts.contrast.abs() < f32::EPSILON);
        assert_eq!(
            opts.binarize,
            BinarizeMode::Threshold {
                cutoff: 1.0,
                apply: true
            }
        );
    }

    #[test]
    fn test_normalized_keeps_nan() {
        let opts = ConvertOptions::new().with_contrast(f32::NAN).normalized();
        assert!(opts.contrast.is_nan());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let opts: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ConvertOptions::default());
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let json = r#"{
            "target_size": [300, 200],
            "quality": "nearest_neighbor",
            "formula": "weighted_average",
            "contrast": 1.5,
            "binarize": { "mode": "threshold", "cutoff": 0.25, "apply": false }
        }"#;
        let opts: ConvertOptions = serde_json::from_str(json).unwrap();

        assert_eq!(opts.target_size, Some((300, 200)));
        assert_eq!(opts.quality, InterpolationQuality::NearestNeighbor);
        assert_eq!(opts.formula, GrayscaleFormula::WeightedAverage);
        assert!((opts.contrast - 1.5).abs() < f32::EPSILON);
        assert!(opts.flatten_alpha);
        assert_eq!(
            opts.binarize,
            BinarizeMode::Threshold {
                cutoff: 0.25,
                apply: false
            }
        );
    }

    #[test]
    fn test_serialize_dither_mode_tag() {
        let value = serde_json::to_value(ConvertOptions::default()).unwrap();
        assert_eq!(value["binarize"]["mode"], "dither");
        assert_eq!(value["formula"], "optical_correct");
    }
}
