//! Sample images as handed over by the host evaluation loop.
//!
//! The host passes materialised pixel arrays, either as `imgref` images or as
//! flat channels-last arrays with an explicit shape. Everything is reduced to
//! 8-bit grayscale or RGB before encoding.

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};

use crate::error::{Error, Result};

/// A single evaluated image.
#[derive(Clone, Debug)]
pub enum SampleImage {
    /// 8-bit grayscale image using imgref.
    Gray8(ImgVec<u8>),

    /// RGB8 image using imgref.
    Rgb8(ImgVec<RGB8>),

    /// RGBA8 image using imgref. Alpha is dropped on encode.
    Rgba8(ImgVec<RGBA8>),

    /// Raw 8-bit array, channels last. Values are used as-is.
    Bytes {
        /// Pixel data in row-major order.
        data: Vec<u8>,
        /// `[h, w]` or `[h, w, c]` with `c` in 1, 3, 4.
        shape: Vec<usize>,
    },

    /// Raw float array, channels last. Byte-scaled from its own min/max.
    Array {
        /// Pixel data in row-major order.
        data: Vec<f32>,
        /// `[h, w]` or `[h, w, c]` with `c` in 1, 3, 4.
        shape: Vec<usize>,
    },
}

/// Colour layout of [`Pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// One byte per pixel.
    Gray,
    /// Three bytes per pixel.
    Rgb,
}

impl PixelLayout {
    /// Bytes per pixel.
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

/// Packed 8-bit pixels ready for the JPEG encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels {
    /// Row-major packed pixel bytes.
    pub data: Vec<u8>,
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// Colour layout of `data`.
    pub layout: PixelLayout,
}

impl SampleImage {
    /// Get image width. Returns 0 for arrays with an unusable shape.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Gray8(img) => img.width(),
            Self::Rgb8(img) => img.width(),
            Self::Rgba8(img) => img.width(),
            Self::Bytes { shape, .. } | Self::Array { shape, .. } => {
                shape.get(1).copied().unwrap_or(0)
            }
        }
    }

    /// Get image height. Returns 0 for arrays with an unusable shape.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Gray8(img) => img.height(),
            Self::Rgb8(img) => img.height(),
            Self::Rgba8(img) => img.height(),
            Self::Bytes { shape, .. } | Self::Array { shape, .. } => {
                shape.first().copied().unwrap_or(0)
            }
        }
    }

    /// Convert to packed 8-bit pixels.
    ///
    /// Fails on empty images, unsupported shapes and buffers whose length
    /// doesn't match their shape.
    pub fn to_pixels(&self) -> Result<Pixels> {
        let pixels = match self {
            Self::Gray8(img) => Pixels {
                data: img.pixels().collect(),
                width: img.width(),
                height: img.height(),
                layout: PixelLayout::Gray,
            },
            Self::Rgb8(img) => Pixels {
                data: img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
                width: img.width(),
                height: img.height(),
                layout: PixelLayout::Rgb,
            },
            Self::Rgba8(img) => Pixels {
                data: img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
                width: img.width(),
                height: img.height(),
                layout: PixelLayout::Rgb,
            },
            Self::Bytes { data, shape } => {
                let dims = ArrayDims::parse(shape, data.len())?;
                dims.pack(data)
            }
            Self::Array { data, shape } => {
                let dims = ArrayDims::parse(shape, data.len())?;
                dims.pack(&bytescale(data))
            }
        };

        if pixels.width == 0 || pixels.height == 0 {
            return Err(Error::InvalidImage(format!(
                "empty image ({}x{})",
                pixels.width, pixels.height
            )));
        }
        Ok(pixels)
    }
}

/// Validated `[h, w, c]` dimensions of a flat array.
struct ArrayDims {
    height: usize,
    width: usize,
    channels: usize,
}

impl ArrayDims {
    fn parse(shape: &[usize], len: usize) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidShape {
            shape: shape.to_vec(),
            reason: reason.to_string(),
        };

        let (height, width, channels) = match *shape {
            [h, w] => (h, w, 1),
            [h, w, c] => (h, w, c),
            _ => return Err(invalid("expected [h, w] or [h, w, c]")),
        };
        if !matches!(channels, 1 | 3 | 4) {
            return Err(invalid("channel count must be 1, 3 or 4"));
        }
        if height == 0 || width == 0 {
            return Err(invalid("zero-sized dimension"));
        }

        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| invalid("shape overflows"))?;
        if expected != len {
            return Err(invalid(&format!(
                "shape needs {expected} values, buffer has {len}"
            )));
        }

        Ok(Self {
            height,
            width,
            channels,
        })
    }

    fn pack(&self, data: &[u8]) -> Pixels {
        let (data, layout) = match self.channels {
            1 => (data.to_vec(), PixelLayout::Gray),
            3 => (data.to_vec(), PixelLayout::Rgb),
            _ => {
                let mut rgb = Vec::with_capacity(self.width * self.height * 3);
                for chunk in data.chunks_exact(4) {
                    rgb.extend_from_slice(&chunk[..3]);
                }
                (rgb, PixelLayout::Rgb)
            }
        };
        Pixels {
            data,
            width: self.width,
            height: self.height,
            layout,
        }
    }
}

/// Linearly rescale float data so its min maps to 0 and its max to 255.
///
/// A constant array has a span of 0, which is treated as 1. NaN ends up as 0.
fn bytescale(data: &[f32]) -> Vec<u8> {
    let finite = data.iter().copied().filter(|v| v.is_finite());
    let cmin = finite.clone().fold(f32::INFINITY, f32::min);
    let cmax = finite.fold(f32::NEG_INFINITY, f32::max);
    if !cmin.is_finite() {
        return vec![0; data.len()];
    }

    let span = if cmax - cmin == 0.0 { 1.0 } else { cmax - cmin };
    let scale = 255.0 / span;
    data.iter()
        .map(|&v| (((v - cmin) * scale).clamp(0.0, 255.0) + 0.5) as u8)
        .collect()
}
