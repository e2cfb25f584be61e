use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::frame::DecodedImage;
use crate::session::Generation;

/// Decode stage, used to label failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Preview,
    Full,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preview => write!(f, "Preview decode"),
            Self::Full => write!(f, "Full decode"),
        }
    }
}

/// Where the preview bitmap came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewSource {
    /// The camera's embedded JPEG.
    EmbeddedThumbnail,
    /// A half-size rendering of the sensor data.
    FastDecode,
}

/// Results sent from a decode thread back to the UI thread.
///
/// Every event carries the generation of the load that produced it; the
/// receiver drops events whose generation is no longer live.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    /// Stage 1 complete: something to show right away.
    Preview {
        generation: Generation,
        image: DecodedImage,
        source: PreviewSource,
    },

    /// Stage 2 has begun.
    FullStarted { generation: Generation },

    /// Stage 2 complete: the full-resolution bitmap.
    Full {
        generation: Generation,
        image: DecodedImage,
        elapsed: Duration,
    },

    /// A stage failed. No further events follow for this generation.
    Failed {
        generation: Generation,
        stage: PipelineStage,
        message: String,
    },
}

impl PipelineEvent {
    pub fn generation(&self) -> Generation {
        match self {
            Self::Preview { generation, .. }
            | Self::FullStarted { generation }
            | Self::Full { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// Destination for pipeline events. Called from the decode thread.
pub trait PipelineSink: Send + Sync {
    fn deliver(&self, event: PipelineEvent);
}

impl PipelineSink for mpsc::Sender<PipelineEvent> {
    fn deliver(&self, event: PipelineEvent) {
        // A closed receiver means the UI is gone; nothing left to notify.
        let _ = self.send(event);
    }
}

/// Callback that nudges the UI loop awake after an event is queued.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sink that queues events on an mpsc channel and wakes the UI loop.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PipelineEvent>,
    waker: Option<Waker>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx, waker: None }
    }

    pub fn with_waker(tx: mpsc::Sender<PipelineEvent>, waker: Waker) -> Self {
        Self {
            tx,
            waker: Some(waker),
        }
    }
}

impl PipelineSink for ChannelSink {
    fn deliver(&self, event: PipelineEvent) {
        self.tx.deliver(event);
        if let Some(wake) = &self.waker {
            wake();
        }
    }
}
