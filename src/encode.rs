//! JPEG + base64 encoding of sample images.
//!
//! Every recorded sample is reduced to an [`EncodedImage`]: the base64 text of
//! a JPEG, ready to be inlined into the report as a data URI. The raw pixel
//! array is not kept.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{Error, Result};
use crate::sample::{PixelLayout, SampleImage};

/// Default JPEG quality. Matches the usual libjpeg default.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Base64 text of a JPEG-compressed sample image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap raw JPEG bytes.
    #[must_use]
    pub fn from_jpeg(jpeg: &[u8]) -> Self {
        Self(STANDARD.encode(jpeg))
    }

    /// Wrap text that is already base64.
    #[must_use]
    pub fn from_base64(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The base64 text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `data:image/jpeg;base64,...` reference for inline embedding.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }

    /// Decode back to JPEG bytes.
    pub fn decode_jpeg(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.0)
            .map_err(|e| Error::Encode(format!("invalid base64: {e}")))
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes sample images as JPEG at a fixed quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegEncoder {
    quality: u8,
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl JpegEncoder {
    /// Create an encoder. Quality is clamped to 1..=100.
    #[must_use]
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// The JPEG quality in use.
    #[must_use]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compress a sample to JPEG and base64 it.
    pub fn encode(&self, image: &SampleImage) -> Result<EncodedImage> {
        let pixels = image.to_pixels()?;
        let width = u32::try_from(pixels.width)
            .map_err(|_| Error::InvalidImage(format!("width {} too large", pixels.width)))?;
        let height = u32::try_from(pixels.height)
            .map_err(|_| Error::InvalidImage(format!("height {} too large", pixels.height)))?;
        let color = match pixels.layout {
            PixelLayout::Gray => ExtendedColorType::L8,
            PixelLayout::Rgb => ExtendedColorType::Rgb8,
        };

        let mut jpeg =
            Vec::with_capacity(pixels.width * pixels.height * pixels.layout.channels() / 4);
        ImageJpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .write_image(&pixels.data, width, height, color)
            .map_err(|e| Error::Encode(e.to_string()))?;

        Ok(EncodedImage::from_jpeg(&jpeg))
    }
}
