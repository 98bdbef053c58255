//! Decode dispatch for in-memory images.
//!
//! Buffers that start with the QOI magic have their header parsed and
//! validated here and their pixels decoded by the `qoi` crate. Everything else
//! goes to the `image` crate, which does its own format detection. Both paths
//! end in the same layouts: 8-bit or 32-bit float samples, row-major,
//! interleaved, alpha last.
//!
//! ```no_run
//! use pixload::{Channels, DecodeOptions};
//!
//! # fn main() -> pixload::Result<()> {
//! let data = std::fs::read("photo.png").expect("read");
//! let info = pixload::info(&data)?;
//! let options = DecodeOptions::new().with_channels(Channels::Rgba);
//! let img = pixload::decode(&data, &options)?;
//! assert_eq!(img.pixels().len(), info.required_len(Some(Channels::Rgba)));
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod compat;
pub mod error;
pub mod ffi;
pub mod format;
mod info;
pub mod options;
pub mod pixels;

// Re-export commonly used types
pub use color::{Channels, ColorSpace};
pub use error::{Error, ErrorKind, HeaderDefect, Result};
pub use format::{container, is_hdr, sniff, Container, DecoderPath};
pub use info::{info, ImageInfo, QoiHeader, QOI_HEADER_SIZE, QOI_PADDING, QOI_PIXELS_MAX};
pub use options::DecodeOptions;
pub use pixels::{decode, decode_float, decode_float_into, decode_into, Layout, PixelImage};
