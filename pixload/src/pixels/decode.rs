//! Decoder backends: QOI through the `qoi` crate, everything else through `image`

use ::image::{load_from_memory, DynamicImage};

use crate::color::{Channels, ColorSpace};
use crate::error::{Error, HeaderDefect, Result};
use crate::format::{self, DecoderPath};
use crate::info::QoiHeader;

use super::{transform, Layout, PixelImage};

/// Decode to 8-bit samples, converted to `desired` channels (or native).
pub(super) fn decode_u8(data: &[u8], desired: Option<Channels>) -> Result<PixelImage<u8>> {
    match format::sniff(data) {
        DecoderPath::Qoi => decode_qoi(data, desired),
        DecoderPath::Generic => decode_generic(data, desired),
    }
}

/// Decode to float samples. HDR containers keep their values; everything
/// else is decoded to 8-bit and promoted.
pub(super) fn decode_f32(data: &[u8], desired: Option<Channels>) -> Result<PixelImage<f32>> {
    if format::is_hdr(data) {
        return decode_generic_hdr(data, desired);
    }

    let PixelImage { layout, pixels } = decode_u8(data, desired)?;
    // untagged containers are assumed to be sRGB
    let color_space = layout.color_space.unwrap_or(ColorSpace::Srgb);
    let pixels = transform::promote(&pixels, layout.channels, color_space);
    Ok(PixelImage { layout, pixels })
}

fn decode_qoi(data: &[u8], desired: Option<Channels>) -> Result<PixelImage<u8>> {
    let header = QoiHeader::parse(data)?;
    let (_, pixels) = qoi::decode_to_vec(data)?;

    let expected = header.width as usize * header.height as usize * header.channels.count();
    if pixels.len() != expected {
        return Err(Error::Decoder {
            path: DecoderPath::Qoi,
            message: format!("decoded {} samples, header implies {expected}", pixels.len()),
        });
    }

    let channels = desired.unwrap_or(header.channels);
    log::debug!(
        "qoi: {}x{} {} -> {channels} ({})",
        header.width,
        header.height,
        header.channels,
        header.color_space
    );

    Ok(PixelImage {
        layout: Layout {
            width: header.width,
            height: header.height,
            channels,
            source_channels: header.channels,
            decoder: DecoderPath::Qoi,
            color_space: Some(header.color_space),
        },
        pixels: transform::convert_channels(pixels, header.channels, channels),
    })
}

fn load_generic(data: &[u8]) -> Result<(DynamicImage, Channels)> {
    let img = load_from_memory(data)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(HeaderDefect::ZeroDimension {
            width: img.width(),
            height: img.height(),
        }
        .into());
    }
    let color = img.color();
    let native = Channels::try_from(color.channel_count())
        .map_err(|_| Error::unsupported(format!("color type {color:?}")))?;
    Ok((img, native))
}

fn generic_layout(img: &DynamicImage, channels: Channels, native: Channels) -> Layout {
    Layout {
        width: img.width(),
        height: img.height(),
        channels,
        source_channels: native,
        decoder: DecoderPath::Generic,
        color_space: None,
    }
}

fn decode_generic(data: &[u8], desired: Option<Channels>) -> Result<PixelImage<u8>> {
    let (img, native) = load_generic(data)?;
    let channels = desired.unwrap_or(native);
    log::debug!(
        "generic: {}x{} {:?} -> {channels}",
        img.width(),
        img.height(),
        img.color()
    );

    let layout = generic_layout(&img, channels, native);
    // wider sample types are narrowed while keeping the native layout
    let pixels = match native {
        Channels::Gray => img.into_luma8().into_raw(),
        Channels::GrayAlpha => img.into_luma_alpha8().into_raw(),
        Channels::Rgb => img.into_rgb8().into_raw(),
        Channels::Rgba => img.into_rgba8().into_raw(),
    };

    Ok(PixelImage {
        layout,
        pixels: transform::convert_channels(pixels, native, channels),
    })
}

fn decode_generic_hdr(data: &[u8], desired: Option<Channels>) -> Result<PixelImage<f32>> {
    let (img, native) = load_generic(data)?;
    let channels = desired.unwrap_or(native);
    log::debug!(
        "generic hdr: {}x{} {:?} -> {channels}",
        img.width(),
        img.height(),
        img.color()
    );

    let layout = generic_layout(&img, channels, native);
    let (decoded, pixels) = if native.has_alpha() {
        (Channels::Rgba, img.into_rgba32f().into_raw())
    } else {
        (Channels::Rgb, img.into_rgb32f().into_raw())
    };

    Ok(PixelImage {
        layout,
        pixels: transform::convert_channels(pixels, decoded, channels),
    })
}
