use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::{DynamicImage, RgbImage, RgbaImage};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a decoded bitmap. Fitted copies are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 8-bit pixel storage for a displayable image.
#[derive(Debug)]
pub enum Pixels {
    Rgb8(RgbImage),
    Rgba8(RgbaImage),
}

/// An immutable displayable bitmap.
///
/// Cloning is cheap: the pixel buffer is shared. A new `DecodedImage` (with a
/// new id) is produced for every transformation; nothing is mutated in place.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    id: ImageId,
    pixels: Arc<Pixels>,
}

impl DecodedImage {
    pub fn from_rgb8(image: RgbImage) -> Self {
        Self::from_pixels(Pixels::Rgb8(image))
    }

    pub fn from_rgba8(image: RgbaImage) -> Self {
        Self::from_pixels(Pixels::Rgba8(image))
    }

    /// Wrap any `image` bitmap, keeping an alpha channel if it has one.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb8(rgb),
            DynamicImage::ImageRgba8(rgba) => Self::from_rgba8(rgba),
            other if other.color().has_alpha() => Self::from_rgba8(other.to_rgba8()),
            other => Self::from_rgb8(other.to_rgb8()),
        }
    }

    fn from_pixels(pixels: Pixels) -> Self {
        Self {
            id: ImageId::next(),
            pixels: Arc::new(pixels),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self.pixels.as_ref() {
            Pixels::Rgb8(img) => img.dimensions(),
            Pixels::Rgba8(img) => img.dimensions(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self.pixels.as_ref(), Pixels::Rgba8(_))
    }

    /// Raw interleaved samples (3 or 4 bytes per pixel).
    pub fn as_raw(&self) -> &[u8] {
        match self.pixels.as_ref() {
            Pixels::Rgb8(img) => img.as_raw(),
            Pixels::Rgba8(img) => img.as_raw(),
        }
    }

    /// Pixel-for-pixel equality, ignoring identity.
    pub fn same_pixels(&self, other: &DecodedImage) -> bool {
        self.has_alpha() == other.has_alpha()
            && self.dimensions() == other.dimensions()
            && self.as_raw() == other.as_raw()
    }
}

/// Size of the display surface in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A surface too small to fit anything into (the toolkit reports 0 or 1
    /// before the first layout pass).
    pub fn is_degenerate(&self) -> bool {
        self.width <= 1 || self.height <= 1
    }
}

impl From<(u32, u32)> for ViewportSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
