//! Raster Image Module
//!
//! `RasterImage` is the decoded pixel buffer every analyzer reads. It is
//! validated once at construction and never mutated afterwards, so it can be
//! shared by reference across the analyzer fan-out.

use crate::errors::{ForensicError, Result};
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat};
use serde::{Deserialize, Serialize};

/// Rec.601 luma weights.
pub const LUMA_R: f64 = 0.299;
pub const LUMA_G: f64 = 0.587;
pub const LUMA_B: f64 = 0.114;

/// Container format the pixels were decoded from. Only gates the
/// block-boundary scan of the artifact detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Tiff,
    Bmp,
    #[default]
    Unknown,
}

impl SourceFormat {
    /// JPEG-family formats built from 8x8 DCT blocks.
    pub fn is_block_based(&self) -> bool {
        matches!(self, SourceFormat::Jpeg)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Png => "png",
            SourceFormat::WebP => "webp",
            SourceFormat::Gif => "gif",
            SourceFormat::Tiff => "tiff",
            SourceFormat::Bmp => "bmp",
            SourceFormat::Unknown => "unknown",
        }
    }
}

impl From<ImageFormat> for SourceFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => SourceFormat::Jpeg,
            ImageFormat::Png => SourceFormat::Png,
            ImageFormat::WebP => SourceFormat::WebP,
            ImageFormat::Gif => SourceFormat::Gif,
            ImageFormat::Tiff => SourceFormat::Tiff,
            ImageFormat::Bmp => SourceFormat::Bmp,
            _ => SourceFormat::Unknown,
        }
    }
}

/// Row-major, interleaved 8-bit pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Validate dimensions against the buffer. Extra trailing bytes are
    /// tolerated and ignored; a short buffer is not.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ForensicError::MalformedImage(format!(
                "zero dimension: {}x{}",
                width, height
            )));
        }
        if channels == 0 || channels > 4 {
            return Err(ForensicError::MalformedImage(format!(
                "unsupported channel count: {}",
                channels
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels as usize))
            .ok_or_else(|| {
                ForensicError::MalformedImage(format!(
                    "dimensions overflow: {}x{}x{}",
                    width, height, channels
                ))
            })?;

        if pixels.len() < expected {
            return Err(ForensicError::MalformedImage(format!(
                "buffer too short: expected {} bytes for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Keep 8-bit layouts as they are; deeper or float images are reduced to
    /// 8-bit RGB(A).
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let (channels, pixels) = match img {
            DynamicImage::ImageLuma8(buf) => (1, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (4, buf.as_raw().clone()),
            other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
            other => (3, other.to_rgb8().into_raw()),
        };
        Self::new(width, height, channels, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The meaningful part of the buffer (`width * height * channels` bytes).
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels[..self.pixel_count() * self.channels as usize]
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn has_color(&self) -> bool {
        self.channels >= 3
    }

    /// Channel bytes of one pixel.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        &self.pixels[idx..idx + c]
    }

    /// `0.299R + 0.587G + 0.114B`; alpha and extra channels are ignored,
    /// grayscale layouts return the gray value.
    #[inline]
    pub fn luma(&self, x: u32, y: u32) -> f64 {
        let p = self.pixel(x, y);
        if p.len() >= 3 {
            LUMA_R * p[0] as f64 + LUMA_G * p[1] as f64 + LUMA_B * p[2] as f64
        } else {
            p[0] as f64
        }
    }

    /// Build an `image` buffer for codec round trips and resampling.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let raw = self.pixels().to_vec();
        let (w, h) = (self.width, self.height);
        let malformed = || ForensicError::MalformedImage("buffer does not match layout".into());
        let img = match self.channels {
            1 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, raw).ok_or_else(malformed)?),
            2 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, raw).ok_or_else(malformed)?),
            3 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, raw).ok_or_else(malformed)?),
            _ => DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, raw).ok_or_else(malformed)?),
        };
        Ok(img)
    }
}
