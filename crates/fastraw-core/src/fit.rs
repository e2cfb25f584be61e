use std::collections::VecDeque;

use image::imageops::{self, FilterType};

use crate::consts::FIT_CACHE_CAPACITY;
use crate::frame::{DecodedImage, ImageId, Pixels, ViewportSize};

/// Output size of fitting a `width`x`height` image into a box, preserving
/// aspect ratio. Each side is clamped to `[1, box side]`.
pub fn fitted_size(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || box_width == 0 || box_height == 0 {
        return (width, height);
    }
    let scale = (box_width as f64 / width as f64).min(box_height as f64 / height as f64);
    let new_w = (width as f64 * scale).round() as u32;
    let new_h = (height as f64 * scale).round() as u32;
    (new_w.clamp(1, box_width), new_h.clamp(1, box_height))
}

/// Scale `image` to fit inside `box_width`x`box_height` with Lanczos3 resampling.
///
/// A degenerate box returns the input unchanged, as does an image that
/// already has the fitted size.
pub fn fit(image: &DecodedImage, box_width: u32, box_height: u32) -> DecodedImage {
    if box_width == 0 || box_height == 0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let (new_w, new_h) = fitted_size(w, h, box_width, box_height);
    resize_exact(image, new_w, new_h)
}

/// Resample `image` to exactly `width`x`height`, ignoring aspect ratio.
pub fn resize_exact(image: &DecodedImage, width: u32, height: u32) -> DecodedImage {
    if image.dimensions() == (width, height) || width == 0 || height == 0 {
        return image.clone();
    }
    match image.pixels() {
        Pixels::Rgb8(img) => {
            DecodedImage::from_rgb8(imageops::resize(img, width, height, FilterType::Lanczos3))
        }
        Pixels::Rgba8(img) => {
            DecodedImage::from_rgba8(imageops::resize(img, width, height, FilterType::Lanczos3))
        }
    }
}

/// A source bitmap rescaled into a particular box.
#[derive(Clone, Debug)]
pub struct FittedImage {
    source: ImageId,
    bounds: ViewportSize,
    image: DecodedImage,
}

impl FittedImage {
    pub fn new(source: &DecodedImage, bounds: ViewportSize) -> Self {
        Self {
            source: source.id(),
            bounds,
            image: fit(source, bounds.width, bounds.height),
        }
    }

    /// Wrap an already-sized bitmap that stands in for `source`.
    pub(crate) fn conformed(source: ImageId, bounds: ViewportSize, image: DecodedImage) -> Self {
        Self {
            source,
            bounds,
            image,
        }
    }

    pub fn source(&self) -> ImageId {
        self.source
    }

    pub fn bounds(&self) -> ViewportSize {
        self.bounds
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Small most-recently-used cache of fitted bitmaps, keyed by
/// (source id, box size). Lives for one session.
pub struct FitCache {
    entries: VecDeque<FittedImage>,
    capacity: usize,
}

impl Default for FitCache {
    fn default() -> Self {
        Self::with_capacity(FIT_CACHE_CAPACITY)
    }
}

impl FitCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Fetch the fitted version of `source` for `bounds`, resampling on a miss.
    pub fn fit(&mut self, source: &DecodedImage, bounds: ViewportSize) -> FittedImage {
        let hit = self
            .entries
            .iter()
            .position(|e| e.source == source.id() && e.bounds == bounds);
        if let Some(pos) = hit {
            if let Some(entry) = self.entries.remove(pos) {
                self.entries.push_front(entry.clone());
                return entry;
            }
        }

        let fitted = FittedImage::new(source, bounds);
        self.entries.push_front(fitted.clone());
        self.entries.truncate(self.capacity);
        fitted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
