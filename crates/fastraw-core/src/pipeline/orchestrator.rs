use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use image::ImageFormat;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::frame::DecodedImage;
use crate::raw::{FastDecodeOptions, FullDecodeOptions, RawBitmap, RawDecoder, Thumbnail};
use crate::session::Generation;

use super::types::{PipelineEvent, PipelineSink, PipelineStage, PreviewSource};

/// Two-stage background decoder: a quick preview, then the full image.
#[derive(Clone)]
pub struct DecodePipeline {
    decoder: Arc<dyn RawDecoder>,
}

impl DecodePipeline {
    pub fn new(decoder: Arc<dyn RawDecoder>) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &Arc<dyn RawDecoder> {
        &self.decoder
    }

    /// Run both stages for `path` on a fresh background thread.
    ///
    /// In-flight work is never interrupted. A superseded run finishes and
    /// its events are dropped by the receiver's generation check.
    pub fn start(
        &self,
        path: PathBuf,
        generation: Generation,
        sink: Arc<dyn PipelineSink>,
    ) -> Result<JoinHandle<()>> {
        let decoder = Arc::clone(&self.decoder);
        let handle = thread::Builder::new()
            .name(format!("fastraw-decode-{generation}"))
            .spawn(move || run_stages(decoder.as_ref(), &path, generation, sink.as_ref()))?;
        Ok(handle)
    }
}

/// Run the preview and full stages synchronously, reporting to `sink`.
///
/// Stage 2 only runs if stage 1 produced an image. Decoder panics are
/// reported as `Failed` like any other error.
pub fn run_stages(
    decoder: &dyn RawDecoder,
    path: &Path,
    generation: Generation,
    sink: &dyn PipelineSink,
) {
    let started = Instant::now();
    let (image, source) = match guarded(|| decode_preview(decoder, path)) {
        Ok(preview) => preview,
        Err(message) => {
            warn!(%generation, path = %path.display(), %message, "Preview decode failed");
            sink.deliver(PipelineEvent::Failed {
                generation,
                stage: PipelineStage::Preview,
                message,
            });
            return;
        }
    };
    info!(
        %generation,
        width = image.width(),
        height = image.height(),
        source = ?source,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Preview ready"
    );
    sink.deliver(PipelineEvent::Preview {
        generation,
        image,
        source,
    });

    sink.deliver(PipelineEvent::FullStarted { generation });
    let started = Instant::now();
    let full = guarded(|| {
        decoder
            .decode_full(path, &FullDecodeOptions::default())
            .and_then(RawBitmap::into_display)
    });
    match full {
        Ok(image) => {
            let elapsed = started.elapsed();
            info!(
                %generation,
                width = image.width(),
                height = image.height(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Full image ready"
            );
            sink.deliver(PipelineEvent::Full {
                generation,
                image,
                elapsed,
            });
        }
        Err(message) => {
            warn!(%generation, path = %path.display(), %message, "Full decode failed");
            sink.deliver(PipelineEvent::Failed {
                generation,
                stage: PipelineStage::Full,
                message,
            });
        }
    }
}

/// Embedded JPEG if there is a usable one, otherwise a half-size decode.
fn decode_preview(decoder: &dyn RawDecoder, path: &Path) -> Result<(DecodedImage, PreviewSource)> {
    match decoder.extract_thumbnail(path) {
        Ok(Some(Thumbnail::Jpeg(bytes))) => {
            match image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg) {
                Ok(img) => {
                    return Ok((
                        DecodedImage::from_dynamic(img),
                        PreviewSource::EmbeddedThumbnail,
                    ))
                }
                Err(e) => debug!(error = %e, "Embedded JPEG unreadable, falling back"),
            }
        }
        Ok(Some(other)) => {
            debug!(format = ?other.format(), "Thumbnail not directly displayable, falling back")
        }
        Ok(None) => debug!("No embedded thumbnail, falling back"),
        Err(e) => debug!(error = %e, "Thumbnail extraction failed, falling back"),
    }

    let bitmap = decoder.decode_fast(path, &FastDecodeOptions::default())?;
    Ok((bitmap.into_display()?, PreviewSource::FastDecode))
}

/// Run a decoder call, turning both errors and panics into a message.
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> std::result::Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Decoder crashed: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Decoder crashed: {s}")
    } else {
        "Decoder crashed".to_string()
    }
}
