//! Pixel buffer shared by every conversion stage.
//!
//! A [`PixelBuffer`] is a non-empty, row-major grid of 8-bit RGBA samples plus
//! the resolution metadata the host uses for device scaling.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::{RasterError, Result};

/// Opaque white, the background every flattening step composites onto.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Default resolution assigned to buffers without explicit metadata.
pub const DEFAULT_DPI: f32 = 96.0;

/// Horizontal and vertical resolution in dots per inch.
///
/// Carried through every stage unchanged; it never affects pixel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            horizontal: DEFAULT_DPI,
            vertical: DEFAULT_DPI,
        }
    }
}

impl Resolution {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Owned width x height grid of RGBA samples.
///
/// Indexing is `row * width + col`. Width and height are always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
    resolution: Resolution,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::from_pixel(width, height, Rgba([0, 0, 0, 0]))
    }

    /// Create a buffer filled with a single color.
    pub fn from_pixel(width: u32, height: u32, pixel: Rgba<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self::from_parts(
            RgbaImage::from_pixel(width, height, pixel),
            Resolution::default(),
        ))
    }

    /// Wrap an existing RGBA image.
    pub fn from_rgba(image: RgbaImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self::from_parts(image, Resolution::default()))
    }

    /// Convert a decoded image of any color type.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        Self::from_rgba(image.to_rgba8())
    }

    /// Builder: set resolution metadata.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub(crate) fn from_parts(image: RgbaImage, resolution: Resolution) -> Self {
        debug_assert!(image.width() > 0 && image.height() > 0);
        Self { image, resolution }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Sample at `(col, row)`.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    pub fn pixel(&self, col: u32, row: u32) -> Rgba<u8> {
        *self.image.get_pixel(col, row)
    }

    /// Raw samples, four bytes (R, G, B, A) per pixel in row-major order.
    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Hand the buffer to an encoder.
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.image.clone())
    }

    /// True when no sample has any transparency.
    pub fn is_opaque(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 255)
    }

    /// True when every color channel of every sample is 0 or 255.
    pub fn is_binary(&self) -> bool {
        self.image
            .pixels()
            .all(|p| p.0[..3].iter().all(|&c| c == 0 || c == 255))
    }
}

/// Reject zero-sized dimensions.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimension { width, height });
    }
    Ok(())
}

/// Perceptual luminance (0.299 R + 0.587 G + 0.114 B), truncated to 8 bits.
///
/// Integer weights keep mid-gray inputs from landing one step low through
/// floating-point error.
pub fn luminance(pixel: Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    let sum = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    (sum / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            PixelBuffer::new(0, 4),
            Err(RasterError::InvalidDimension {
                width: 0,
                height: 4
            })
        ));
        assert!(PixelBuffer::new(4, 0).is_err());
        assert!(PixelBuffer::from_rgba(RgbaImage::new(0, 0)).is_err());
    }

    #[test]
    fn test_row_major_samples() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 1, Rgba([10, 20, 30, 40]));
        let buf = PixelBuffer::from_rgba(img).unwrap();

        assert_eq!(buf.samples().len(), 3 * 2 * 4);
        // row 1, col 2
        let index = (3 + 2) * 4;
        assert_eq!(&buf.samples()[index..index + 4], &[10, 20, 30, 40]);
        assert_eq!(buf.pixel(2, 1), Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_default_resolution() {
        let buf = PixelBuffer::new(1, 1).unwrap();
        assert_eq!(buf.resolution(), Resolution::new(96.0, 96.0));

        let buf = buf.with_resolution(Resolution::new(254.0, 127.0));
        assert_eq!(buf.resolution().horizontal, 254.0);
        assert_eq!(buf.resolution().vertical, 127.0);
    }

    #[test]
    fn test_from_dynamic_converts_gray() {
        let gray = image::GrayImage::from_pixel(2, 2, image::Luma([77]));
        let buf = PixelBuffer::from_dynamic(&DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(buf.pixel(1, 1), Rgba([77, 77, 77, 255]));
        assert!(buf.is_opaque());
    }

    #[test]
    fn test_dynamic_round_trip() {
        let mut img = RgbaImage::new(2, 3);
        img.put_pixel(1, 2, Rgba([10, 20, 30, 40]));
        let buf = PixelBuffer::from_rgba(img).unwrap();

        let dynamic = buf.to_dynamic();
        assert_eq!(dynamic.width(), 2);
        assert_eq!(dynamic.height(), 3);
        assert_eq!(PixelBuffer::from_dynamic(&dynamic).unwrap(), buf);
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(WHITE), 255);
        assert_eq!(luminance(BLACK), 0);
        assert_eq!(luminance(Rgba([255, 0, 0, 255])), 76);
        assert_eq!(luminance(Rgba([0, 255, 0, 255])), 149);
        assert_eq!(luminance(Rgba([0, 0, 255, 255])), 29);
        assert_eq!(luminance(Rgba([128, 128, 128, 0])), 128);
    }

    #[test]
    fn test_is_binary() {
        let buf = PixelBuffer::from_pixel(2, 2, WHITE).unwrap();
        assert!(buf.is_binary());
        let buf = PixelBuffer::from_pixel(2, 2, Rgba([255, 1, 255, 255])).unwrap();
        assert!(!buf.is_binary());
    }
}
