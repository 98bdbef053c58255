//! Error types shared by every decode path

use crate::format::DecoderPath;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a QOI header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderDefect {
    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("channel count {0} outside 3..=4")]
    ChannelCount(u8),

    #[error("color space byte {0} outside 0..=1")]
    ColorSpace(u8),

    #[error("{width}x{height} exceeds the pixel limit")]
    TooManyPixels { width: u32, height: u32 },
}

/// Coarse classification of an [`Error`], stable across messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    MalformedHeader,
    Truncated,
    Unsupported,
    Decoder,
    InvalidArgument,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed header: {0}")]
    MalformedHeader(HeaderDefect),

    #[error("truncated buffer: need at least {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    /// Container or feature the decoders cannot handle. Messages from the
    /// generic decoder are kept verbatim.
    #[error("unsupported image: {message}")]
    Unsupported { message: String },

    /// Failure reported by the underlying decoder, message kept verbatim.
    #[error("{path} decoder: {message}")]
    Decoder { path: DecoderPath, message: String },

    #[error("desired channel count {0} outside 0..=4")]
    InvalidChannels(i64),

    #[error("destination holds {actual} samples, decoded image needs {needed}")]
    DestinationTooSmall { needed: usize, actual: usize },

    #[error("{width}x{height} does not fit a C int")]
    DimensionOverflow { width: u32, height: u32 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedHeader(_) => ErrorKind::MalformedHeader,
            Error::Truncated { .. } => ErrorKind::Truncated,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Decoder { .. } => ErrorKind::Decoder,
            Error::InvalidChannels(_)
            | Error::DestinationTooSmall { .. }
            | Error::DimensionOverflow { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl Error {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
        }
    }
}

impl From<HeaderDefect> for Error {
    fn from(defect: HeaderDefect) -> Self {
        Error::MalformedHeader(defect)
    }
}

impl From<::image::ImageError> for Error {
    fn from(err: ::image::ImageError) -> Self {
        match err {
            ::image::ImageError::Unsupported(err) => Error::unsupported(err.to_string()),
            other => Error::Decoder {
                path: DecoderPath::Generic,
                message: other.to_string(),
            },
        }
    }
}

impl From<qoi::Error> for Error {
    fn from(err: qoi::Error) -> Self {
        Error::Decoder {
            path: DecoderPath::Qoi,
            message: err.to_string(),
        }
    }
}
