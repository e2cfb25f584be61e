use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{Result, ViewerError};
use crate::frame::ViewportSize;
use crate::pipeline::{ChannelSink, DecodePipeline, PipelineEvent, PipelineSink, Waker};
use crate::raw::RawDecoder;
use crate::status::{display_name, Status};
use crate::timer::earliest;
use crate::transition::{DisplayFrame, TickOutcome, TransitionEngine};
use crate::viewport::{AffordanceAnchor, ViewportAction, ViewportController};

/// Identity of one `open_file` request. Strictly increasing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The file currently being shown or loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub path: PathBuf,
    pub generation: Generation,
}

/// Top-level orchestrator, owned by the UI thread.
///
/// Decode threads report through an mpsc channel that [`pump`] drains, so
/// every state change happens here, on the caller's thread. Events and
/// timer ticks carrying a superseded generation are dropped.
///
/// [`pump`]: SessionController::pump
pub struct SessionController {
    pipeline: DecodePipeline,
    generation: Generation,
    session: Option<Session>,
    loading: bool,
    engine: TransitionEngine,
    viewport: ViewportController,
    status: Status,
    tx: mpsc::Sender<PipelineEvent>,
    rx: mpsc::Receiver<PipelineEvent>,
    waker: Option<Waker>,
}

impl SessionController {
    pub fn new(decoder: Arc<dyn RawDecoder>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pipeline: DecodePipeline::new(decoder),
            generation: Generation::default(),
            session: None,
            loading: false,
            engine: TransitionEngine::new(),
            viewport: ViewportController::new(ViewportSize::default()),
            status: Status::Ready,
            tx,
            rx,
            waker: None,
        }
    }

    /// Call `waker` from the decode thread after each queued event, e.g. to
    /// request a repaint.
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Supersede any in-flight load and start decoding `path`.
    ///
    /// The previous session's threads keep running; their events are
    /// dropped on arrival.
    pub fn open_file(&mut self, path: impl Into<PathBuf>) -> Result<Generation> {
        let path = path.into();
        self.generation = self.generation.next();
        let generation = self.generation;
        self.engine.reset(generation);
        self.session = None;
        self.loading = false;

        if !path.is_file() {
            warn!(path = %path.display(), "File not found");
            self.status = Status::FileNotFound { path: path.clone() };
            self.recenter_affordance();
            return Err(ViewerError::FileNotFound(path));
        }

        info!(%generation, path = %path.display(), "Opening file");
        self.status = Status::Loading {
            name: display_name(&path),
        };
        self.session = Some(Session {
            path: path.clone(),
            generation,
        });
        self.loading = true;

        let sink: Arc<dyn PipelineSink> = match &self.waker {
            Some(waker) => Arc::new(ChannelSink::with_waker(self.tx.clone(), Arc::clone(waker))),
            None => Arc::new(ChannelSink::new(self.tx.clone())),
        };
        if let Err(e) = self.pipeline.start(path, generation, sink) {
            self.fail(e.to_string());
            return Err(e);
        }
        Ok(generation)
    }

    /// Apply every queued pipeline event. Returns how many were live.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.handle_event(event, now) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one pipeline event if it belongs to the live session.
    pub fn handle_event(&mut self, event: PipelineEvent, now: Instant) -> bool {
        if event.generation() != self.generation {
            debug!(
                stale = %event.generation(),
                live = %self.generation,
                "Dropping stale pipeline event"
            );
            return false;
        }
        let name = self.current_name();

        match event {
            PipelineEvent::Preview { image, .. } => {
                self.engine.show_initial(image, self.viewport.live());
                self.status = Status::Preview { name };
            }
            PipelineEvent::FullStarted { .. } => {
                self.status = Status::Processing { name };
            }
            PipelineEvent::Full { image, .. } => {
                self.engine.begin_transition(image, self.viewport.live(), now);
                if self.engine.is_active() {
                    self.status = Status::Blending;
                } else {
                    self.finish(name);
                }
            }
            PipelineEvent::Failed { stage, message, .. } => {
                debug!(%stage, "Load failed");
                self.fail(message);
            }
        }
        true
    }

    /// Record a raw resize of the display surface.
    pub fn on_resize(&mut self, size: ViewportSize, now: Instant) -> bool {
        self.viewport.on_resize(size, now)
    }

    /// Fire the fade tick and the resize debounce if they are due.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(tagged) = self.engine.take_due_tick(now) {
            if tagged == self.generation {
                self.on_tick(now);
            } else {
                debug!(stale = %tagged, live = %self.generation, "Dropping stale tick");
            }
        }

        if let Some(ViewportAction::RefitTransition(size)) =
            self.viewport.poll(now, &mut self.engine)
        {
            debug!(%size, alpha = self.engine.alpha(), "Re-fitted running transition");
        }
    }

    /// Delay until the next timer needs polling.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        earliest(self.engine.next_tick(now), self.viewport.next_wakeup(now))
    }

    pub fn frame(&self) -> Option<&DisplayFrame> {
        self.engine.frame()
    }

    /// Changes whenever [`frame`](Self::frame) does.
    pub fn frame_version(&self) -> u64 {
        self.engine.version()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Where to draw the "Open Image" button, if it should be visible: only
    /// when nothing is displayed and nothing is loading.
    pub fn affordance(&self) -> Option<AffordanceAnchor> {
        if self.engine.has_image() || self.loading {
            None
        } else {
            Some(self.viewport.affordance())
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn live_viewport(&self) -> ViewportSize {
        self.viewport.live()
    }

    fn on_tick(&mut self, now: Instant) {
        match self.engine.tick(now) {
            TickOutcome::Advanced { .. } => {
                if let Some(percent) = self.engine.progress_percent() {
                    self.status = Status::BlendProgress { percent };
                }
            }
            TickOutcome::Completed | TickOutcome::Aborted => {
                let name = self.current_name();
                self.finish(name);
            }
            TickOutcome::Idle => {}
        }
    }

    fn finish(&mut self, name: String) {
        info!(generation = %self.generation, "Loaded");
        self.status = Status::Loaded { name };
        self.loading = false;
    }

    /// End the load with an error. The last good image stays on screen;
    /// with none, the affordance comes back.
    fn fail(&mut self, message: String) {
        self.status = Status::Error { message };
        self.loading = false;
        if !self.engine.has_image() {
            self.recenter_affordance();
        }
    }

    fn recenter_affordance(&mut self) {
        let live = self.viewport.live();
        self.viewport.apply(live, &mut self.engine);
    }

    fn current_name(&self) -> String {
        self.current_path().map(display_name).unwrap_or_default()
    }
}
