//! In-memory fixtures shared by the integration tests.
#![allow(dead_code)]

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

pub fn png(width: u32, height: u32, color: ExtendedColorType, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(pixels, width, height, color)
        .expect("encode png fixture");
    out
}

pub fn qoi(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    qoi::encode_to_vec(pixels, width, height).expect("encode qoi fixture")
}

/// QOI fixture with the color space byte set to linear.
pub fn qoi_linear(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let mut data = qoi(width, height, pixels);
    data[13] = 1;
    data
}

/// Flat (non run-length) Radiance HDR file; each pixel is RGBE.
pub fn radiance(width: u32, height: u32, rgbe: &[[u8; 4]]) -> Vec<u8> {
    assert!(width < 8, "flat scanlines only");
    let mut out = format!(
        "#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {height} +X {width}\n"
    )
    .into_bytes();
    for px in rgbe {
        out.extend_from_slice(px);
    }
    out
}

pub fn rows<T: Copy>(pixels: &[T], row_len: usize) -> Vec<Vec<T>> {
    pixels.chunks_exact(row_len).map(<[T]>::to_vec).collect()
}
