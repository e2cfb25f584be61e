use std::fmt;
use std::path::{Path, PathBuf};

/// The single line of feedback shown under the canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ready,
    /// A load was requested.
    Loading { name: String },
    /// The preview is on screen.
    Preview { name: String },
    /// The full decode is running.
    Processing { name: String },
    /// The cross-fade is starting.
    Blending,
    /// Cross-fade progress, 0 to 99.
    BlendProgress { percent: u32 },
    /// The full image is on screen.
    Loaded { name: String },
    FileNotFound { path: PathBuf },
    Error { message: String },
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FileNotFound { .. } | Self::Error { .. })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Loading { name } => write!(f, "Loading: {name}"),
            Self::Preview { name } => write!(f, "Preview: {name}"),
            Self::Processing { name } => write!(f, "Processing RAW image: {name}"),
            Self::Blending => write!(f, "Loading..."),
            Self::BlendProgress { percent } => write!(f, "Loading... {percent}%"),
            Self::Loaded { name } => write!(f, "Loaded: {name}"),
            Self::FileNotFound { path } => write!(f, "Error: File not found - {}", path.display()),
            Self::Error { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Final path component, as shown in the status line.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
