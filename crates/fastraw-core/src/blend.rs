use std::borrow::Cow;

use image::{RgbImage, RgbaImage};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, ViewerError};
use crate::frame::{DecodedImage, Pixels};

/// Linear cross-fade: `from * (1 - alpha) + to * alpha`, per channel.
///
/// Both operands must have identical dimensions. If either carries an alpha
/// channel both are blended as RGBA (opaque where the source had none).
pub fn blend(from: &DecodedImage, to: &DecodedImage, alpha: f32) -> Result<DecodedImage> {
    if from.dimensions() != to.dimensions() {
        return Err(ViewerError::BlendDimensionMismatch {
            left: from.dimensions(),
            right: to.dimensions(),
        });
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let (w, h) = from.dimensions();

    if from.has_alpha() || to.has_alpha() {
        let out = lerp_samples(&rgba_samples(from), &rgba_samples(to), alpha, w as usize * 4, h as usize);
        let img = RgbaImage::from_raw(w, h, out)
            .ok_or(ViewerError::InvalidDimensions { width: w, height: h })?;
        Ok(DecodedImage::from_rgba8(img))
    } else {
        let out = lerp_samples(from.as_raw(), to.as_raw(), alpha, w as usize * 3, h as usize);
        let img = RgbImage::from_raw(w, h, out)
            .ok_or(ViewerError::InvalidDimensions { width: w, height: h })?;
        Ok(DecodedImage::from_rgb8(img))
    }
}

fn rgba_samples(image: &DecodedImage) -> Cow<'_, [u8]> {
    match image.pixels() {
        Pixels::Rgba8(img) => Cow::Borrowed(img.as_raw().as_slice()),
        Pixels::Rgb8(img) => Cow::Owned(
            img.pixels()
                .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
                .collect(),
        ),
    }
}

fn lerp_samples(from: &[u8], to: &[u8], alpha: f32, row_len: usize, rows: usize) -> Vec<u8> {
    let mut out = vec![0u8; from.len()];
    if row_len == 0 {
        return out;
    }

    let lerp_row = |(dst, (a, b)): (&mut [u8], (&[u8], &[u8]))| {
        for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
            let v = x as f32 + (y as f32 - x as f32) * alpha;
            *d = v.round().clamp(0.0, 255.0) as u8;
        }
    };

    if row_len * rows >= PARALLEL_PIXEL_THRESHOLD {
        out.par_chunks_mut(row_len)
            .zip(from.par_chunks(row_len).zip(to.par_chunks(row_len)))
            .for_each(lerp_row);
    } else {
        out.chunks_mut(row_len)
            .zip(from.chunks(row_len).zip(to.chunks(row_len)))
            .for_each(lerp_row);
    }
    out
}
