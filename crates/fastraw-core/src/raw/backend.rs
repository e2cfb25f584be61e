use std::fs;
use std::path::Path;
use std::time::Instant;

use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::Array2;
use tracing::{debug, info};

use crate::consts::{BT709_EXPONENT, BT709_TOE_END, BT709_TOE_SLOPE};
use crate::error::{Result, ViewerError};
use crate::raw::debayer::{debayer, superpixel, Cfa, DebayerMethod, RgbPlanes, GREEN};
use crate::raw::decoder::{
    BitDepth, FastDecodeOptions, FullDecodeOptions, RawBitmap, RawDecoder, Rgb16Image, Thumbnail,
    WhiteBalance,
};
use crate::raw::thumbnail::largest_embedded_jpeg;

/// CFA tile sampled from the decoder; 6x6 covers both Bayer and X-Trans.
const CFA_TILE: usize = 6;

/// `RawDecoder` backed by the pure-Rust `rawloader` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawloaderDecoder;

impl RawloaderDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RawDecoder for RawloaderDecoder {
    fn extract_thumbnail(&self, path: &Path) -> Result<Option<Thumbnail>> {
        ensure_exists(path)?;
        let bytes = fs::read(path)?;
        let jpeg = largest_embedded_jpeg(&bytes).map(|j| Thumbnail::Jpeg(j.to_vec()));
        if let Some(Thumbnail::Jpeg(ref data)) = jpeg {
            debug!(bytes = data.len(), "Found embedded JPEG");
        }
        Ok(jpeg)
    }

    fn decode_fast(&self, path: &Path, options: &FastDecodeOptions) -> Result<RawBitmap> {
        let start = Instant::now();
        let mut planes = match load_sensor(path, options.white_balance)? {
            Sensor::Mosaic { data, cfa } if options.half_size => superpixel(&data, &cfa),
            Sensor::Mosaic { data, cfa } => debayer(&data, &cfa, DebayerMethod::Bilinear),
            Sensor::Rgb(planes) => planes,
        };
        planes.map_inplace(bt709_oetf);
        let image = planes_to_rgb8(&planes);
        debug!(
            width = image.width(),
            height = image.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fast decode complete"
        );
        Ok(RawBitmap::Rgb8(image))
    }

    fn decode_full(&self, path: &Path, options: &FullDecodeOptions) -> Result<RawBitmap> {
        let start = Instant::now();
        let mut planes = match load_sensor(path, options.white_balance)? {
            Sensor::Mosaic { data, cfa } => debayer(&data, &cfa, options.demosaic),
            Sensor::Rgb(planes) => planes,
        };
        planes.map_inplace(bt709_oetf);
        let bitmap = match options.bit_depth {
            BitDepth::Eight => RawBitmap::Rgb8(planes_to_rgb8(&planes)),
            BitDepth::Sixteen => RawBitmap::Rgb16(planes_to_rgb16(&planes)),
        };
        let (w, h) = bitmap.dimensions();
        info!(
            width = w,
            height = h,
            demosaic = %options.demosaic,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Full decode complete"
        );
        Ok(bitmap)
    }
}

/// Normalised, white-balanced sensor data.
enum Sensor {
    /// One sample per site, to be demosaiced.
    Mosaic { data: Array2<f32>, cfa: Cfa },
    /// Already three samples per site (linear DNG and similar).
    Rgb(RgbPlanes),
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ViewerError::FileNotFound(path.to_path_buf()))
    }
}

fn load_sensor(path: &Path, white_balance: WhiteBalance) -> Result<Sensor> {
    ensure_exists(path)?;

    let loader = rawloader::RawLoader::new();
    let raw = loader
        .decode_file(path)
        .map_err(|e| ViewerError::Decode(format!("Failed to decode RAW: {e:?}")))?;

    let (w, h, cpp) = (raw.width, raw.height, raw.cpp);
    if w == 0 || h == 0 {
        return Err(ViewerError::InvalidDimensions {
            width: w as u32,
            height: h as u32,
        });
    }

    let wb = match white_balance {
        WhiteBalance::Camera => camera_multipliers(&raw.wb_coeffs),
        WhiteBalance::Neutral => [1.0; 3],
    };

    // Integer samples are scaled by the per-colour black and white levels;
    // float samples arrive already normalised.
    let levels = |color: usize| {
        let black = raw.blacklevels[color] as f32;
        let white = (raw.whitelevels[color] as f32).max(black + 1.0);
        (black, white - black)
    };
    let sample = |index: usize, color: usize| -> f32 {
        let v = match &raw.data {
            rawloader::RawImageData::Integer(values) => {
                let (black, range) = levels(color);
                (values[index] as f32 - black) / range
            }
            rawloader::RawImageData::Float(values) => values[index],
        };
        (v.clamp(0.0, 1.0) * wb[color]).clamp(0.0, 1.0)
    };

    let expected = w * h * cpp;
    let available = match &raw.data {
        rawloader::RawImageData::Integer(values) => values.len(),
        rawloader::RawImageData::Float(values) => values.len(),
    };
    if available < expected {
        return Err(ViewerError::Decode(format!(
            "Sensor data truncated: {available} of {expected} samples"
        )));
    }

    match cpp {
        1 => {
            let cfa = Cfa::from_fn(CFA_TILE, CFA_TILE, |r, c| raw.cfa.color_at(r, c));
            let data = Array2::from_shape_fn((h, w), |(row, col)| {
                sample(row * w + col, cfa.color_at(row, col) as usize)
            });
            info!(width = w, height = h, bayer = cfa.is_bayer(), "Loaded sensor mosaic");
            Ok(Sensor::Mosaic { data, cfa })
        }
        3 => {
            let plane = |channel: usize| {
                Array2::from_shape_fn((h, w), |(row, col)| sample((row * w + col) * 3 + channel, channel))
            };
            info!(width = w, height = h, "Loaded linear RGB sensor data");
            Ok(Sensor::Rgb(RgbPlanes {
                red: plane(0),
                green: plane(1),
                blue: plane(2),
            }))
        }
        other => Err(ViewerError::UnsupportedFormat(format!(
            "{other} samples per pixel"
        ))),
    }
}

/// As-shot multipliers normalised so green is 1.0. Missing or invalid
/// coefficients fall back to neutral.
fn camera_multipliers(coeffs: &[f32]) -> [f32; 3] {
    let valid = |v: &&f32| v.is_finite() && **v > 0.0;
    let channel = |i: usize| coeffs.get(i).filter(valid).copied();
    match (channel(0), channel(GREEN as usize), channel(2)) {
        (Some(red), Some(green), Some(blue)) => [red / green, 1.0, blue / green],
        _ => {
            debug!("No usable white balance coefficients, using neutral");
            [1.0; 3]
        }
    }
}

/// ITU-R BT.709 opto-electronic transfer function.
pub fn bt709_oetf(v: f32) -> f32 {
    if v < BT709_TOE_END {
        v * BT709_TOE_SLOPE
    } else {
        1.099 * v.powf(BT709_EXPONENT) - 0.099
    }
}

fn planes_to_rgb8(planes: &RgbPlanes) -> RgbImage {
    let (h, w) = planes.dim();
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (r, c) = (y as usize, x as usize);
        Rgb([
            q(planes.red[[r, c]]),
            q(planes.green[[r, c]]),
            q(planes.blue[[r, c]]),
        ])
    })
}

fn planes_to_rgb16(planes: &RgbPlanes) -> Rgb16Image {
    let (h, w) = planes.dim();
    let q = |v: f32| (v.clamp(0.0, 1.0) * 65535.0).round() as u16;
    ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let (r, c) = (y as usize, x as usize);
        Rgb([
            q(planes.red[[r, c]]),
            q(planes.green[[r, c]]),
            q(planes.blue[[r, c]]),
        ])
    })
}
