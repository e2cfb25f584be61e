use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{Result, ViewerError};
use crate::frame::DecodedImage;
use crate::raw::debayer::DebayerMethod;

/// 16-bit-per-channel RGB bitmap.
pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// White balance applied while rendering sensor data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhiteBalance {
    /// As-shot multipliers recorded by the camera.
    #[default]
    Camera,
    /// Unit multipliers.
    Neutral,
}

/// Sample depth requested from a full decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    #[default]
    Sixteen,
}

/// Options for the cheap preview rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastDecodeOptions {
    /// Bin each 2x2 sensor block into one pixel instead of demosaicing.
    pub half_size: bool,
    pub white_balance: WhiteBalance,
}

impl Default for FastDecodeOptions {
    fn default() -> Self {
        Self {
            half_size: true,
            white_balance: WhiteBalance::Camera,
        }
    }
}

/// Options for the full-resolution rendering. Brightness is never
/// auto-adjusted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FullDecodeOptions {
    pub demosaic: DebayerMethod,
    pub bit_depth: BitDepth,
    pub white_balance: WhiteBalance,
}

/// Encoding of an embedded thumbnail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Jpeg,
    Bitmap,
}

/// A camera-rendered preview stored inside the RAW container.
#[derive(Clone, Debug)]
pub enum Thumbnail {
    /// A complete JPEG stream.
    Jpeg(Vec<u8>),
    /// Uncompressed RGB samples.
    Bitmap(RgbImage),
}

impl Thumbnail {
    pub fn format(&self) -> ThumbnailFormat {
        match self {
            Self::Jpeg(_) => ThumbnailFormat::Jpeg,
            Self::Bitmap(_) => ThumbnailFormat::Bitmap,
        }
    }
}

/// Decoder output before conversion to a displayable bitmap.
#[derive(Clone, Debug)]
pub enum RawBitmap {
    Rgb8(RgbImage),
    Rgb16(Rgb16Image),
}

impl RawBitmap {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgb8(img) => img.dimensions(),
            Self::Rgb16(img) => img.dimensions(),
        }
    }

    /// Convert to an 8-bit displayable image. 16-bit samples are divided by
    /// 256 and truncated; there is no rounding and no histogram stretch.
    pub fn into_display(self) -> Result<DecodedImage> {
        match self {
            Self::Rgb8(img) => Ok(DecodedImage::from_rgb8(img)),
            Self::Rgb16(img) => truncate_to_8bit(&img).map(DecodedImage::from_rgb8),
        }
    }
}

/// Linear 16-to-8-bit sample depth reduction (`v / 256`, truncating).
pub fn truncate_to_8bit(image: &Rgb16Image) -> Result<RgbImage> {
    let (w, h) = image.dimensions();
    let samples: Vec<u8> = image.as_raw().iter().map(|&v| (v / 256) as u8).collect();
    RgbImage::from_raw(w, h, samples).ok_or(ViewerError::InvalidDimensions { width: w, height: h })
}

/// The RAW decoding library, as seen by the viewer.
///
/// Implementations are called from background threads. Every failure is
/// reported as a `ViewerError` whose message is shown to the user verbatim.
pub trait RawDecoder: Send + Sync {
    /// The embedded camera preview, or `None` if the file has none.
    fn extract_thumbnail(&self, path: &Path) -> Result<Option<Thumbnail>>;

    /// A quick, low-quality rendering of the sensor data.
    fn decode_fast(&self, path: &Path, options: &FastDecodeOptions) -> Result<RawBitmap>;

    /// A full-resolution, high-quality rendering of the sensor data.
    fn decode_full(&self, path: &Path, options: &FullDecodeOptions) -> Result<RawBitmap>;
}
