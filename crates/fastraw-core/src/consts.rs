use std::time::Duration;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Period of the cross-fade tick (~25 steps per second).
pub const TICK_INTERVAL: Duration = Duration::from_millis(40);

/// Delay before the first tick after a transition starts.
pub const FIRST_TICK_DELAY: Duration = Duration::from_millis(10);

/// Alpha added per tick. 100 ticks at 40 ms gives a 4 second fade.
pub const ALPHA_STEP: f32 = 0.01;

/// Quiet period after the last resize event before re-fitting.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Number of fitted bitmaps kept per session.
pub const FIT_CACHE_CAPACITY: usize = 6;

/// Size of the "Open Image" affordance, in physical pixels.
pub const AFFORDANCE_WIDTH: u32 = 180;
pub const AFFORDANCE_HEIGHT: u32 = 50;

/// Extensions offered by the open dialog. Advisory only; any file is
/// handed to the decoder.
pub const RAW_EXTENSIONS: &[&str] = &[
    "raw", "arw", "cr2", "cr3", "nef", "dng", "raf", "orf", "pef", "rw2", "srw", "x3f",
];

/// ITU-R BT.709 transfer curve: slope of the linear toe.
pub const BT709_TOE_SLOPE: f32 = 4.5;

/// ITU-R BT.709 transfer curve: end of the linear toe.
pub const BT709_TOE_END: f32 = 0.018;

/// ITU-R BT.709 transfer curve: power-law exponent.
pub const BT709_EXPONENT: f32 = 0.45;
