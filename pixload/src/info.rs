//! Header inspection without decoding pixel data

use std::io::Cursor;

use ::image::{ImageDecoder, ImageReader};
use serde::Serialize;

use crate::color::{Channels, ColorSpace};
use crate::error::{Error, HeaderDefect, Result};
use crate::format::{self, Container, DecoderPath, QOI_MAGIC};

pub const QOI_HEADER_SIZE: usize = 14;
/// End-of-stream marker that terminates every QOI file.
pub const QOI_PADDING: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];
/// Bound on `width * height` that keeps every later size computation in range.
pub const QOI_PIXELS_MAX: u32 = 400_000_000;

/// Parsed QOI header: magic, width and height (big-endian u32), channel
/// count and color space byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QoiHeader {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub color_space: ColorSpace,
}

impl QoiHeader {
    /// Parse and validate the header. The buffer must also be long enough to
    /// hold the padding trailer, even though the trailer itself is not read.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let needed = QOI_HEADER_SIZE + QOI_PADDING.len();
        if data.len() < needed {
            return Err(Error::Truncated {
                needed,
                actual: data.len(),
            });
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != QOI_MAGIC {
            return Err(HeaderDefect::BadMagic(magic).into());
        }

        let width = be_u32(data, 4);
        let height = be_u32(data, 8);
        if width == 0 || height == 0 {
            return Err(HeaderDefect::ZeroDimension { width, height }.into());
        }

        let channels = match data[12] {
            c @ 3..=4 => Channels::try_from(c).map_err(|_| HeaderDefect::ChannelCount(c))?,
            c => return Err(HeaderDefect::ChannelCount(c).into()),
        };
        let color_space =
            ColorSpace::try_from(data[13]).map_err(|_| HeaderDefect::ColorSpace(data[13]))?;

        if height >= QOI_PIXELS_MAX / width {
            return Err(HeaderDefect::TooManyPixels { width, height }.into());
        }

        Ok(QoiHeader {
            width,
            height,
            channels,
            color_space,
        })
    }
}

#[inline]
fn be_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Image metadata available from the header alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Native channel count of the encoded image.
    pub channels: Channels,
    pub decoder: DecoderPath,
    pub container: Container,
    /// Only QOI carries a color space tag.
    pub color_space: Option<ColorSpace>,
    pub hdr: bool,
}

impl ImageInfo {
    /// Samples needed to hold the decoded image with the given channel request.
    pub fn required_len(&self, desired: Option<Channels>) -> usize {
        let channels = desired.unwrap_or(self.channels);
        self.width as usize * self.height as usize * channels.count()
    }
}

impl From<QoiHeader> for ImageInfo {
    fn from(header: QoiHeader) -> Self {
        ImageInfo {
            width: header.width,
            height: header.height,
            channels: header.channels,
            decoder: DecoderPath::Qoi,
            container: Container::Qoi,
            color_space: Some(header.color_space),
            hdr: false,
        }
    }
}

/// Read width, height and channel count without decoding pixels.
pub fn info(data: &[u8]) -> Result<ImageInfo> {
    match format::sniff(data) {
        DecoderPath::Qoi => QoiHeader::parse(data).map(Into::into),
        DecoderPath::Generic => generic_info(data),
    }
}

fn generic_info(data: &[u8]) -> Result<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::Decoder {
            path: DecoderPath::Generic,
            message: e.to_string(),
        })?;
    let container = reader
        .format()
        .map(Container::from)
        .ok_or_else(|| Error::unsupported("unrecognized image container"))?;

    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    if width == 0 || height == 0 {
        return Err(HeaderDefect::ZeroDimension { width, height }.into());
    }
    let color = decoder.color_type();
    let channels = Channels::try_from(color.channel_count())
        .map_err(|_| Error::unsupported(format!("color type {color:?}")))?;

    log::trace!("generic header: {container} {width}x{height} {channels}");

    Ok(ImageInfo {
        width,
        height,
        channels,
        decoder: DecoderPath::Generic,
        container,
        color_space: None,
        hdr: container.is_hdr(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qoi_header(width: u32, height: u32, channels: u8, color_space: u8) -> Vec<u8> {
        let mut data = QOI_MAGIC.to_vec();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.push(channels);
        data.push(color_space);
        data.extend_from_slice(&QOI_PADDING);
        data
    }

    #[test]
    fn parses_valid_header() {
        let header = QoiHeader::parse(&qoi_header(640, 480, 4, 1)).unwrap();
        assert_eq!(
            header,
            QoiHeader {
                width: 640,
                height: 480,
                channels: Channels::Rgba,
                color_space: ColorSpace::Linear,
            }
        );
    }

    #[test]
    fn info_reports_qoi_metadata() {
        let info = info(&qoi_header(3, 2, 3, 0)).unwrap();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.channels, Channels::Rgb);
        assert_eq!(info.decoder, DecoderPath::Qoi);
        assert_eq!(info.color_space, Some(ColorSpace::Srgb));
        assert!(!info.hdr);
        assert_eq!(info.required_len(None), 18);
        assert_eq!(info.required_len(Some(Channels::Rgba)), 24);
    }

    #[test]
    fn short_buffers_are_truncated() {
        let data = qoi_header(1, 1, 3, 0);
        let err = QoiHeader::parse(&data[..QOI_HEADER_SIZE + 7]).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 22,
                actual: 21
            }
        ));
    }

    #[test]
    fn rejects_bad_fields() {
        let cases = [
            (qoi_header(0, 1, 3, 0), HeaderDefect::ZeroDimension { width: 0, height: 1 }),
            (qoi_header(1, 0, 3, 0), HeaderDefect::ZeroDimension { width: 1, height: 0 }),
            (qoi_header(1, 1, 2, 0), HeaderDefect::ChannelCount(2)),
            (qoi_header(1, 1, 5, 0), HeaderDefect::ChannelCount(5)),
            (qoi_header(1, 1, 3, 2), HeaderDefect::ColorSpace(2)),
        ];
        for (data, expected) in cases {
            match QoiHeader::parse(&data) {
                Err(Error::MalformedHeader(defect)) => assert_eq!(defect, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = qoi_header(1, 1, 3, 0);
        data[3] = b'g';
        assert!(matches!(
            QoiHeader::parse(&data),
            Err(Error::MalformedHeader(HeaderDefect::BadMagic(_)))
        ));
    }

    #[test]
    fn pixel_limit_is_exclusive() {
        // 20_000 * 20_000 is exactly the limit and must already be rejected
        let data = qoi_header(20_000, 20_000, 4, 0);
        assert!(matches!(
            info(&data),
            Err(Error::MalformedHeader(HeaderDefect::TooManyPixels { .. }))
        ));

        let data = qoi_header(20_000, 19_999, 4, 0);
        assert!(info(&data).is_ok());
    }

    #[test]
    fn unknown_generic_data_is_unsupported() {
        let err = info(b"definitely not an image").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unsupported);
        assert!(err.to_string().contains("unrecognized"), "{err}");
    }
}
