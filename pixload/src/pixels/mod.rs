//! Pixel decoding with channel, flip and float normalization

mod decode;
mod transform;

pub use transform::srgb_to_linear;

use serde::Serialize;

use crate::color::{Channels, ColorSpace};
use crate::error::{Error, Result};
use crate::format::DecoderPath;
use crate::options::DecodeOptions;

/// Sample types a decoded image can hold.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Fully opaque alpha.
    const OPAQUE: Self;

    fn luma(r: Self, g: Self, b: Self) -> Self;
}

impl Sample for u8 {
    const OPAQUE: Self = u8::MAX;

    #[inline(always)]
    fn luma(r: Self, g: Self, b: Self) -> Self {
        ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
    }
}

impl Sample for f32 {
    const OPAQUE: Self = 1.0;

    #[inline(always)]
    fn luma(r: Self, g: Self, b: Self) -> Self {
        r * 0.299 + g * 0.587 + b * 0.114
    }
}

/// Shape and provenance of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// Channels in the decoded buffer.
    pub channels: Channels,
    /// Channels of the encoded image.
    pub source_channels: Channels,
    pub decoder: DecoderPath,
    pub color_space: Option<ColorSpace>,
}

impl Layout {
    /// Samples per row; rows are never padded.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels.count()
    }

    /// Total samples in the buffer.
    pub fn len(&self) -> usize {
        self.row_len() * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An owned, fully decoded image. The pixel buffer is released when the
/// image is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage<T> {
    layout: Layout,
    pixels: Vec<T>,
}

impl<T: Sample> PixelImage<T> {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn channels(&self) -> Channels {
        self.layout.channels
    }

    pub fn source_channels(&self) -> Channels {
        self.layout.source_channels
    }

    /// Which decoder produced this image.
    pub fn decoder(&self) -> DecoderPath {
        self.layout.decoder
    }

    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    pub fn row(&self, y: u32) -> Option<&[T]> {
        let row_len = self.layout.row_len();
        let start = y as usize * row_len;
        self.pixels.get(start..start + row_len)
    }

    pub fn into_pixels(self) -> Vec<T> {
        self.pixels
    }

    fn flipped(self, flip: bool) -> Self {
        if !flip {
            return self;
        }
        let pixels = transform::flip_vertical(&self.pixels, self.layout.row_len());
        PixelImage {
            layout: self.layout,
            pixels,
        }
    }

    fn copy_into(&self, dst: &mut [T], flip: bool) -> Result<Layout> {
        if dst.len() < self.pixels.len() {
            return Err(Error::DestinationTooSmall {
                needed: self.pixels.len(),
                actual: dst.len(),
            });
        }
        transform::copy_rows(&self.pixels, dst, self.layout.row_len(), flip);
        Ok(self.layout)
    }
}

/// Decode to 8-bit samples.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<PixelImage<u8>> {
    decode::decode_u8(data, options.channels).map(|img| img.flipped(options.flip_vertically))
}

/// Decode to float samples in [0, 1] (HDR containers may exceed 1).
pub fn decode_float(data: &[u8], options: &DecodeOptions) -> Result<PixelImage<f32>> {
    decode::decode_f32(data, options.channels).map(|img| img.flipped(options.flip_vertically))
}

/// Decode to 8-bit samples into a caller-owned buffer. Only the first
/// [`Layout::len`] samples of `dst` are written.
pub fn decode_into(data: &[u8], options: &DecodeOptions, dst: &mut [u8]) -> Result<Layout> {
    decode::decode_u8(data, options.channels)?.copy_into(dst, options.flip_vertically)
}

/// Float counterpart of [`decode_into`].
pub fn decode_float_into(data: &[u8], options: &DecodeOptions, dst: &mut [f32]) -> Result<Layout> {
    decode::decode_f32(data, options.channels)?.copy_into(dst, options.flip_vertically)
}
