//! Pixel normalization: channel conversion, vertical flip, 8-bit to float promotion

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};

use crate::color::{Channels, ColorSpace};

use super::Sample;

// Samples per rayon task during promotion
const PROMOTE_CHUNK_PIXELS: usize = 16 * 1024;

/// sRGB decode lookup table, one entry per 8-bit code value.
static SRGB_LUT: std::sync::OnceLock<[f32; 256]> = std::sync::OnceLock::new();
/// Plain `v / 255` table for linear data and alpha.
static LINEAR_LUT: std::sync::OnceLock<[f32; 256]> = std::sync::OnceLock::new();

/// sRGB transfer function, encoded value in [0, 1] to linear light.
#[inline]
pub fn srgb_to_linear(s: f32) -> f32 {
    if s <= 0.04045 {
        s / 12.92
    } else {
        ((s + 0.055) / 1.055).powf(2.4)
    }
}

fn srgb_lut() -> &'static [f32; 256] {
    SRGB_LUT.get_or_init(|| {
        let mut lut = [0f32; 256];
        for (i, value) in lut.iter_mut().enumerate() {
            *value = srgb_to_linear(i as f32 / 255.0);
        }
        lut
    })
}

fn linear_lut() -> &'static [f32; 256] {
    LINEAR_LUT.get_or_init(|| {
        let mut lut = [0f32; 256];
        for (i, value) in lut.iter_mut().enumerate() {
            *value = i as f32 / 255.0;
        }
        lut
    })
}

/// Promote 8-bit samples to float in [0, 1]. Color channels go through the
/// sRGB curve unless the data is tagged linear; alpha is always divided only.
pub(super) fn promote(src: &[u8], channels: Channels, color_space: ColorSpace) -> Vec<f32> {
    let color_lut = match color_space {
        ColorSpace::Srgb => srgb_lut(),
        ColorSpace::Linear => linear_lut(),
    };
    let alpha_lut = linear_lut();

    let n = channels.count();
    let alpha = channels.has_alpha().then(|| n - 1);
    let chunk = PROMOTE_CHUNK_PIXELS * n;

    let mut out = vec![0f32; src.len()];
    out.par_chunks_mut(chunk)
        .zip(src.par_chunks(chunk))
        .for_each(|(dst, src)| {
            // chunks start on a pixel boundary, so the channel index is local
            for (i, (d, &s)) in dst.iter_mut().zip(src).enumerate() {
                let lut = if Some(i % n) == alpha {
                    alpha_lut
                } else {
                    color_lut
                };
                *d = lut[s as usize];
            }
        });
    out
}

fn remap<T: Sample, const N: usize>(
    src: &[T],
    from: Channels,
    f: impl Fn(&[T]) -> [T; N],
) -> Vec<T> {
    let mut out = Vec::with_capacity(src.len() / from.count() * N);
    for px in src.chunks_exact(from.count()) {
        out.extend_from_slice(&f(px));
    }
    out
}

/// Convert interleaved pixels between channel layouts. Added alpha is fully
/// opaque, gray from color is luminance, gray to color replicates.
pub(super) fn convert_channels<T: Sample>(src: Vec<T>, from: Channels, to: Channels) -> Vec<T> {
    use Channels::*;

    if from == to {
        return src;
    }

    let op = T::OPAQUE;
    match (from, to) {
        (Gray, GrayAlpha) => remap(&src, from, |p| [p[0], op]),
        (Gray, Rgb) => remap(&src, from, |p| [p[0], p[0], p[0]]),
        (Gray, Rgba) => remap(&src, from, |p| [p[0], p[0], p[0], op]),

        (GrayAlpha, Gray) => remap(&src, from, |p| [p[0]]),
        (GrayAlpha, Rgb) => remap(&src, from, |p| [p[0], p[0], p[0]]),
        (GrayAlpha, Rgba) => remap(&src, from, |p| [p[0], p[0], p[0], p[1]]),

        (Rgb, Gray) => remap(&src, from, |p| [T::luma(p[0], p[1], p[2])]),
        (Rgb, GrayAlpha) => remap(&src, from, |p| [T::luma(p[0], p[1], p[2]), op]),
        (Rgb, Rgba) => remap(&src, from, |p| [p[0], p[1], p[2], op]),

        (Rgba, Gray) => remap(&src, from, |p| [T::luma(p[0], p[1], p[2])]),
        (Rgba, GrayAlpha) => remap(&src, from, |p| [T::luma(p[0], p[1], p[2]), p[3]]),
        (Rgba, Rgb) => remap(&src, from, |p| [p[0], p[1], p[2]]),

        _ => src,
    }
}

/// Copy rows into `dst`, reversing their order when `flip` is set.
/// `dst` must hold at least `src.len()` samples; only that prefix is written.
pub(super) fn copy_rows<T: Copy>(src: &[T], dst: &mut [T], row_len: usize, flip: bool) {
    let dst = &mut dst[..src.len()];
    if !flip {
        dst.copy_from_slice(src);
        return;
    }

    for (dst_row, src_row) in dst
        .chunks_exact_mut(row_len)
        .zip(src.chunks_exact(row_len).rev())
    {
        dst_row.copy_from_slice(src_row);
    }
}

/// Mirror an image vertically into a freshly allocated buffer.
pub(super) fn flip_vertical<T: Copy>(src: &[T], row_len: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(src.len());
    for row in src.chunks_exact(row_len).rev() {
        out.extend_from_slice(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_curve_endpoints_and_midpoint() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(128.0 / 255.0) - 0.2158).abs() < 1e-3);
        // linear segment
        assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-7);
    }

    #[test]
    fn promote_leaves_alpha_linear() {
        let out = promote(&[128, 128, 128, 128], Channels::Rgba, ColorSpace::Srgb);
        assert!((out[0] - 0.2158).abs() < 1e-3);
        assert!((out[2] - 0.2158).abs() < 1e-3);
        assert!((out[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn promote_linear_tag_divides_only() {
        let out = promote(&[0, 51, 255], Channels::Rgb, ColorSpace::Linear);
        assert_eq!(out, vec![0.0, 0.2, 1.0]);
    }

    #[test]
    fn promote_spans_several_chunks() {
        let n = Channels::GrayAlpha.count();
        let src: Vec<u8> = (0..PROMOTE_CHUNK_PIXELS * n * 2 + n)
            .map(|i| (i % 256) as u8)
            .collect();
        let out = promote(&src, Channels::GrayAlpha, ColorSpace::Srgb);
        for (i, (&s, &d)) in src.iter().zip(&out).enumerate() {
            let expected = if i % n == 1 {
                s as f32 / 255.0
            } else {
                srgb_to_linear(s as f32 / 255.0)
            };
            assert!((d - expected).abs() < 1e-6, "sample {i}");
        }
    }

    #[test]
    fn adds_opaque_alpha() {
        let out = convert_channels(vec![1u8, 2, 3, 4, 5, 6], Channels::Rgb, Channels::Rgba);
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);

        let out = convert_channels(vec![0.25f32], Channels::Gray, Channels::GrayAlpha);
        assert_eq!(out, vec![0.25, 1.0]);
    }

    #[test]
    fn drops_and_keeps_alpha() {
        let rgba = vec![10u8, 20, 30, 40];
        assert_eq!(
            convert_channels(rgba.clone(), Channels::Rgba, Channels::Rgb),
            vec![10, 20, 30]
        );
        let ga = convert_channels(rgba, Channels::Rgba, Channels::GrayAlpha);
        assert_eq!(ga[1], 40);
        assert_eq!(
            convert_channels(vec![7u8, 9], Channels::GrayAlpha, Channels::Rgba),
            vec![7, 7, 7, 9]
        );
    }

    #[test]
    fn luminance_of_white_and_gray() {
        assert_eq!(
            convert_channels(vec![255u8, 255, 255], Channels::Rgb, Channels::Gray),
            vec![255]
        );
        assert_eq!(
            convert_channels(vec![100u8, 100, 100], Channels::Rgb, Channels::Gray),
            vec![100]
        );
        let gray = convert_channels(vec![0.5f32, 0.5, 0.5], Channels::Rgb, Channels::Gray);
        assert!((gray[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn flips_rows() {
        let src = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(flip_vertical(&src, 2), vec![5, 6, 3, 4, 1, 2]);

        let mut dst = [0u8; 8];
        copy_rows(&src, &mut dst, 2, true);
        assert_eq!(dst, [5, 6, 3, 4, 1, 2, 0, 0]);

        copy_rows(&src, &mut dst, 2, false);
        assert_eq!(&dst[..6], &src);
    }
}
