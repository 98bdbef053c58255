//! Format sniffing: QOI by magic, everything else through the generic decoder

use ::image::ImageFormat;

/// Magic bytes that open every QOI stream.
pub const QOI_MAGIC: [u8; 4] = *b"qoif";

/// Which decoder handled (or would handle) a buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecoderPath {
    Qoi,
    Generic,
}

/// Concrete container recognized by magic bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Qoi,
    Png,
    Jpeg,
    Gif,
    Bmp,
    Hdr,
    OpenExr,
    WebP,
    Tiff,
    Tga,
    Pnm,
    Ico,
    /// Recognized by the generic decoder but not listed above.
    Other,
    Unknown,
}

impl Container {
    pub fn is_hdr(self) -> bool {
        matches!(self, Container::Hdr | Container::OpenExr)
    }
}

impl From<ImageFormat> for Container {
    fn from(format: ImageFormat) -> Self {
        match format {
            // the generic decoder also reads QOI, but it never gets to see one
            ImageFormat::Qoi => Container::Qoi,
            ImageFormat::Png => Container::Png,
            ImageFormat::Jpeg => Container::Jpeg,
            ImageFormat::Gif => Container::Gif,
            ImageFormat::Bmp => Container::Bmp,
            ImageFormat::Hdr => Container::Hdr,
            ImageFormat::OpenExr => Container::OpenExr,
            ImageFormat::WebP => Container::WebP,
            ImageFormat::Tiff => Container::Tiff,
            ImageFormat::Tga => Container::Tga,
            ImageFormat::Pnm => Container::Pnm,
            ImageFormat::Ico => Container::Ico,
            _ => Container::Other,
        }
    }
}

/// Route a buffer by its first four bytes. Never fails; a wrong guess shows
/// up later as a decode error.
pub fn sniff(data: &[u8]) -> DecoderPath {
    if data.starts_with(&QOI_MAGIC) {
        DecoderPath::Qoi
    } else {
        DecoderPath::Generic
    }
}

pub fn container(data: &[u8]) -> Container {
    match sniff(data) {
        DecoderPath::Qoi => Container::Qoi,
        DecoderPath::Generic => ::image::guess_format(data)
            .map(Container::from)
            .unwrap_or(Container::Unknown),
    }
}

/// True only for floating point containers. QOI is always 8-bit on disk,
/// whatever its color space byte says.
pub fn is_hdr(data: &[u8]) -> bool {
    let hdr = container(data).is_hdr();
    log::trace!("is_hdr: {hdr}");
    hdr
}
