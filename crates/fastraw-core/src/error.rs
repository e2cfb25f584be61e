use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("File not found - {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Decode(String),

    #[error("Unsupported RAW variant: {0}")]
    UnsupportedFormat(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Blend operands differ in size: {left:?} vs {right:?}")]
    BlendDimensionMismatch { left: (u32, u32), right: (u32, u32) },
}

pub type Result<T> = std::result::Result<T, ViewerError>;
