use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use fastraw_core::error::{Result, ViewerError};
use fastraw_core::frame::DecodedImage;
use fastraw_core::pipeline::{PipelineEvent, PipelineSink};
use fastraw_core::raw::{
    FastDecodeOptions, FullDecodeOptions, RawBitmap, RawDecoder, Rgb16Image, Thumbnail,
};

// ---------------------------------------------------------------------------
// Synthetic images
// ---------------------------------------------------------------------------

/// RGB image with a horizontal/vertical ramp, so resampling is observable.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DecodedImage {
    DecodedImage::from_rgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> DecodedImage {
    DecodedImage::from_rgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}

pub fn solid_rgb16(width: u32, height: u32, value: u16) -> Rgb16Image {
    ImageBuffer::from_pixel(width, height, Rgb([value; 3]))
}

/// Encode a solid-colour JPEG.
pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg)
        .expect("encode test JPEG");
    out.into_inner()
}

/// An empty file on disk, so `open_file` finds something to open.
pub fn touch_file(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, b"not really a raw file").expect("write temp file");
    (dir, path)
}

// ---------------------------------------------------------------------------
// Scripted decoder
// ---------------------------------------------------------------------------

/// What `extract_thumbnail` should produce.
#[derive(Clone)]
pub enum ThumbnailScript {
    Missing,
    Jpeg(Vec<u8>),
    Bitmap(RgbImage),
    Fail,
}

/// A `RawDecoder` that returns canned results and records which calls were
/// made.
pub struct MockDecoder {
    pub thumbnail: ThumbnailScript,
    pub fast: Option<RgbImage>,
    pub full: Option<Rgb16Image>,
    pub panic_on_full: bool,
    pub fast_options: Mutex<Vec<FastDecodeOptions>>,
    pub full_options: Mutex<Vec<FullDecodeOptions>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockDecoder {
    pub fn new(thumbnail: ThumbnailScript) -> Self {
        Self {
            thumbnail,
            fast: Some(gradient_rgb(300, 200)),
            full: Some(solid_rgb16(1200, 800, 0x8080)),
            panic_on_full: false,
            fast_options: Mutex::new(Vec::new()),
            full_options: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl RawDecoder for MockDecoder {
    fn extract_thumbnail(&self, _path: &Path) -> Result<Option<Thumbnail>> {
        self.record("extract_thumbnail");
        match &self.thumbnail {
            ThumbnailScript::Missing => Ok(None),
            ThumbnailScript::Jpeg(bytes) => Ok(Some(Thumbnail::Jpeg(bytes.clone()))),
            ThumbnailScript::Bitmap(img) => Ok(Some(Thumbnail::Bitmap(img.clone()))),
            ThumbnailScript::Fail => Err(ViewerError::Decode("no thumbnail table".into())),
        }
    }

    fn decode_fast(&self, _path: &Path, options: &FastDecodeOptions) -> Result<RawBitmap> {
        self.record("decode_fast");
        self.fast_options.lock().expect("options lock").push(*options);
        self.fast
            .clone()
            .map(RawBitmap::Rgb8)
            .ok_or_else(|| ViewerError::Decode("Unsupported file format or not RAW file".into()))
    }

    fn decode_full(&self, _path: &Path, options: &FullDecodeOptions) -> Result<RawBitmap> {
        self.record("decode_full");
        self.full_options.lock().expect("options lock").push(*options);
        if self.panic_on_full {
            panic!("sensor buffer overrun");
        }
        self.full
            .clone()
            .map(RawBitmap::Rgb16)
            .ok_or_else(|| ViewerError::Decode("Data error or unsupported file format".into()))
    }
}

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl PipelineSink for RecordingSink {
    fn deliver(&self, event: PipelineEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}
