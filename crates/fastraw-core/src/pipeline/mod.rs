mod orchestrator;
mod types;

pub use orchestrator::{run_stages, DecodePipeline};
pub use types::{ChannelSink, PipelineEvent, PipelineSink, PipelineStage, PreviewSource, Waker};
