pub mod debayer;
pub mod decoder;
pub mod thumbnail;
mod backend;

pub use backend::{bt709_oetf, RawloaderDecoder};
pub use debayer::DebayerMethod;
pub use decoder::{
    truncate_to_8bit, BitDepth, FastDecodeOptions, FullDecodeOptions, RawBitmap, RawDecoder,
    Rgb16Image, Thumbnail, ThumbnailFormat, WhiteBalance,
};
