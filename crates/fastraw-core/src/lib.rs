pub mod blend;
pub mod consts;
pub mod error;
pub mod fit;
pub mod frame;
pub mod pipeline;
pub mod raw;
pub mod session;
pub mod status;
pub mod timer;
pub mod transition;
pub mod viewport;
