use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::blend::blend;
use crate::consts::{ALPHA_STEP, FIRST_TICK_DELAY, TICK_INTERVAL};
use crate::fit::{fitted_size, resize_exact, FitCache, FittedImage};
use crate::frame::{DecodedImage, ViewportSize};
use crate::session::Generation;
use crate::timer::Timer;

/// Externally visible state of the fade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    ShowingPreview,
    Transitioning,
    ShowingFull,
}

/// What the displayed frame was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Preview,
    Blend,
    Full,
}

/// The bitmap currently on screen.
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    pub image: DecodedImage,
    pub kind: FrameKind,
    /// Weight of the full image in `image`: 0 for the preview, 1 for the full.
    pub alpha: f32,
}

/// Result of one tick of the fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// No transition was running.
    Idle,
    /// A blended frame was displayed.
    Advanced { alpha: f32 },
    /// Alpha reached 1 and the full image is displayed.
    Completed,
    /// Blending failed; the full image is displayed instead.
    Aborted,
}

/// Snapshot of the fade: `active` implies both operands are present with
/// identical dimensions.
#[derive(Clone, Debug)]
pub struct TransitionState {
    pub alpha: f32,
    pub active: bool,
    pub preview_fitted: Option<FittedImage>,
    pub full_fitted: Option<FittedImage>,
    pub viewport: ViewportSize,
}

/// An in-progress cross-fade. Keeps the full-resolution sources so every
/// re-fit resamples from them, never from already-shrunk operands.
struct Blend {
    preview: DecodedImage,
    full: DecodedImage,
    preview_fitted: FittedImage,
    full_fitted: FittedImage,
    step: u32,
}

impl Blend {
    fn alpha(&self) -> f32 {
        (self.step as f32 / total_steps() as f32).min(1.0)
    }
}

enum State {
    Idle,
    Preview { source: DecodedImage },
    Blend(Blend),
    Full { source: DecodedImage },
}

/// Ticks from alpha 0 to alpha 1. Counting whole steps makes the last
/// frame land on exactly 1.0.
fn total_steps() -> u32 {
    (1.0 / ALPHA_STEP).round().max(1.0) as u32
}

/// The fade state machine: `Idle -> ShowingPreview -> Transitioning ->
/// ShowingFull`, with re-fitting allowed from any non-idle state.
///
/// Lives on the UI thread. The tick is a `Timer` tagged with the session
/// generation; the owner polls it and calls [`TransitionEngine::tick`].
pub struct TransitionEngine {
    generation: Generation,
    state: State,
    frame: Option<DisplayFrame>,
    version: u64,
    tick: Timer<Generation>,
    cache: FitCache,
    viewport: ViewportSize,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self {
            generation: Generation::default(),
            state: State::Idle,
            frame: None,
            version: 0,
            tick: Timer::default(),
            cache: FitCache::default(),
            viewport: ViewportSize::default(),
        }
    }

    /// Drop all images, cancel the tick and start tagging ticks with
    /// `generation`.
    pub fn reset(&mut self, generation: Generation) {
        self.generation = generation;
        self.state = State::Idle;
        self.tick.cancel();
        self.cache.clear();
        if self.frame.take().is_some() {
            self.version += 1;
        }
    }

    /// Fit and display the preview.
    pub fn show_initial(&mut self, preview: DecodedImage, viewport: ViewportSize) {
        self.tick.cancel();
        self.viewport = viewport;
        let fitted = self.fit_to(&preview, viewport);
        debug!(
            source = ?preview.dimensions(),
            fitted = ?fitted.dimensions(),
            %viewport,
            "Showing preview"
        );
        self.display(fitted.image().clone(), FrameKind::Preview, 0.0);
        self.state = State::Preview { source: preview };
    }

    /// Start cross-fading from the displayed preview to `full`.
    ///
    /// Without a preview on screen the full image is displayed at once.
    /// Otherwise the full image is fitted into the preview's displayed box
    /// and the first tick is scheduled.
    pub fn begin_transition(&mut self, full: DecodedImage, viewport: ViewportSize, now: Instant) {
        self.viewport = viewport;
        let preview = match mem::replace(&mut self.state, State::Idle) {
            State::Preview { source } => Some(source),
            State::Blend(blend) => Some(blend.preview),
            State::Idle | State::Full { .. } => None,
        };
        let shown = self.frame.as_ref().map(|f| f.image.dimensions());

        let (preview, (w, h)) = match (preview, shown) {
            (Some(preview), Some(dims)) if !viewport.is_degenerate() => (preview, dims),
            _ => {
                info!("No preview on screen, showing full image");
                self.show_full(full);
                return;
            }
        };

        let (preview_fitted, full_fitted) =
            conform_operands(&mut self.cache, &preview, &full, ViewportSize::new(w, h));
        debug!(
            operands = ?full_fitted.dimensions(),
            full = ?full.dimensions(),
            "Transition started"
        );
        self.display(preview_fitted.image().clone(), FrameKind::Blend, 0.0);
        self.state = State::Blend(Blend {
            preview,
            full,
            preview_fitted,
            full_fitted,
            step: 0,
        });
        self.tick.schedule(now, FIRST_TICK_DELAY, self.generation);
    }

    /// Disarm and return the tick token once its deadline has passed.
    pub fn take_due_tick(&mut self, now: Instant) -> Option<Generation> {
        self.tick.take_due(now)
    }

    /// Time until the next tick, if one is scheduled.
    pub fn next_tick(&self, now: Instant) -> Option<Duration> {
        self.tick.remaining(now)
    }

    /// Advance the fade by one step. A no-op outside `Transitioning`.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut blend_state = match mem::replace(&mut self.state, State::Idle) {
            State::Blend(b) => b,
            other => {
                self.state = other;
                return TickOutcome::Idle;
            }
        };

        blend_state.step += 1;
        if blend_state.step >= total_steps() {
            info!("Transition complete");
            self.show_full(blend_state.full);
            return TickOutcome::Completed;
        }

        let alpha = blend_state.alpha();
        match blend(
            blend_state.preview_fitted.image(),
            blend_state.full_fitted.image(),
            alpha,
        ) {
            Ok(image) => {
                self.display(image, FrameKind::Blend, alpha);
                self.state = State::Blend(blend_state);
                self.tick.schedule(now, TICK_INTERVAL, self.generation);
                TickOutcome::Advanced { alpha }
            }
            Err(e) => {
                warn!(error = %e, "Blend failed, showing full image");
                self.show_full(blend_state.full);
                TickOutcome::Aborted
            }
        }
    }

    /// Re-derive the displayed bitmap for a new viewport.
    ///
    /// During a transition both operands are re-fitted from their
    /// full-resolution sources and alpha is kept. Returns `false` when
    /// there was nothing to re-fit.
    pub fn refit(&mut self, viewport: ViewportSize) -> bool {
        if viewport.is_degenerate() {
            return false;
        }
        self.viewport = viewport;
        match mem::replace(&mut self.state, State::Idle) {
            State::Idle => false,
            State::Preview { source } => {
                let fitted = self.fit_to(&source, viewport);
                self.display(fitted.image().clone(), FrameKind::Preview, 0.0);
                self.state = State::Preview { source };
                true
            }
            State::Full { source } => {
                let fitted = self.fit_to(&source, viewport);
                self.display(fitted.image().clone(), FrameKind::Full, 1.0);
                self.state = State::Full { source };
                true
            }
            State::Blend(mut b) => {
                let (preview_fitted, full_fitted) =
                    conform_operands(&mut self.cache, &b.preview, &b.full, viewport);
                b.preview_fitted = preview_fitted;
                b.full_fitted = full_fitted;
                let alpha = b.alpha();
                debug!(%viewport, alpha, "Re-fitted transition operands");
                match blend(b.preview_fitted.image(), b.full_fitted.image(), alpha) {
                    Ok(image) => {
                        self.display(image, FrameKind::Blend, alpha);
                        self.state = State::Blend(b);
                    }
                    Err(e) => {
                        warn!(error = %e, "Blend failed after resize, showing full image");
                        self.show_full(b.full);
                    }
                }
                true
            }
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        match self.state {
            State::Idle => TransitionPhase::Idle,
            State::Preview { .. } => TransitionPhase::ShowingPreview,
            State::Blend(_) => TransitionPhase::Transitioning,
            State::Full { .. } => TransitionPhase::ShowingFull,
        }
    }

    pub fn alpha(&self) -> f32 {
        match &self.state {
            State::Idle | State::Preview { .. } => 0.0,
            State::Blend(b) => b.alpha(),
            State::Full { .. } => 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Blend(_))
    }

    pub fn has_image(&self) -> bool {
        self.frame.is_some()
    }

    pub fn frame(&self) -> Option<&DisplayFrame> {
        self.frame.as_ref()
    }

    /// Incremented whenever the displayed frame changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Last viewport the engine fitted to.
    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Whole-percent progress of a running fade.
    pub fn progress_percent(&self) -> Option<u32> {
        match &self.state {
            State::Blend(b) => Some(b.step * 100 / total_steps()),
            _ => None,
        }
    }

    pub fn transition_state(&self) -> TransitionState {
        match &self.state {
            State::Blend(b) => TransitionState {
                alpha: b.alpha(),
                active: true,
                preview_fitted: Some(b.preview_fitted.clone()),
                full_fitted: Some(b.full_fitted.clone()),
                viewport: self.viewport,
            },
            _ => TransitionState {
                alpha: self.alpha(),
                active: false,
                preview_fitted: None,
                full_fitted: None,
                viewport: self.viewport,
            },
        }
    }

    fn show_full(&mut self, full: DecodedImage) {
        self.tick.cancel();
        let fitted = self.fit_to(&full, self.viewport);
        self.display(fitted.image().clone(), FrameKind::Full, 1.0);
        self.state = State::Full { source: full };
    }

    /// Fit `source` into `viewport`, or keep it unscaled while the surface
    /// has no usable size yet.
    fn fit_to(&mut self, source: &DecodedImage, viewport: ViewportSize) -> FittedImage {
        if viewport.is_degenerate() {
            FittedImage::conformed(source.id(), viewport, source.clone())
        } else {
            self.cache.fit(source, viewport)
        }
    }

    fn display(&mut self, image: DecodedImage, kind: FrameKind, alpha: f32) {
        self.frame = Some(DisplayFrame { image, kind, alpha });
        self.version += 1;
    }
}

/// Fit both sources into `bounds` and make the preview operand match the
/// full operand's dimensions exactly.
fn conform_operands(
    cache: &mut FitCache,
    preview: &DecodedImage,
    full: &DecodedImage,
    bounds: ViewportSize,
) -> (FittedImage, FittedImage) {
    let full_fitted = cache.fit(full, bounds);
    let (w, h) = full_fitted.dimensions();
    let (pw, ph) = preview.dimensions();
    if fitted_size(pw, ph, bounds.width, bounds.height) == (w, h) {
        return (cache.fit(preview, bounds), full_fitted);
    }
    let conformed = resize_exact(preview, w, h);
    (
        FittedImage::conformed(preview.id(), bounds, conformed),
        full_fitted,
    )
}
