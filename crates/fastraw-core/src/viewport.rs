use std::time::{Duration, Instant};

use tracing::debug;

use crate::consts::{AFFORDANCE_HEIGHT, AFFORDANCE_WIDTH, RESIZE_DEBOUNCE};
use crate::frame::ViewportSize;
use crate::timer::Timer;
use crate::transition::{TransitionEngine, TransitionPhase};

/// Top-left placement of the "Open Image" button, in viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AffordanceAnchor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AffordanceAnchor {
    /// Center the button in `viewport`, pinned to the top-left corner when
    /// the viewport is smaller than the button.
    pub fn centered_in(viewport: ViewportSize) -> Self {
        Self {
            x: viewport.width.saturating_sub(AFFORDANCE_WIDTH) / 2,
            y: viewport.height.saturating_sub(AFFORDANCE_HEIGHT) / 2,
            width: AFFORDANCE_WIDTH,
            height: AFFORDANCE_HEIGHT,
        }
    }

    /// Center of the button in viewport pixels.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// What a settled resize did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportAction {
    /// Both fade operands were re-fitted; alpha is unchanged.
    RefitTransition(ViewportSize),
    /// The single displayed image was re-fitted.
    RefitImage(ViewportSize),
    /// Nothing is loaded; the affordance moved.
    RecenterAffordance(AffordanceAnchor),
}

/// Debounces resize notifications before re-fitting.
///
/// The live size is tracked immediately; the expensive work waits until no
/// resize has arrived for `RESIZE_DEBOUNCE`.
#[derive(Debug)]
pub struct ViewportController {
    live: ViewportSize,
    debounce: Timer<ViewportSize>,
    affordance: AffordanceAnchor,
}

impl ViewportController {
    pub fn new(initial: ViewportSize) -> Self {
        Self {
            live: initial,
            debounce: Timer::default(),
            affordance: AffordanceAnchor::centered_in(initial),
        }
    }

    pub fn live(&self) -> ViewportSize {
        self.live
    }

    pub fn affordance(&self) -> AffordanceAnchor {
        self.affordance
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_armed()
    }

    /// Record a raw resize event, restarting the debounce delay. Reports of
    /// an unchanged size are ignored.
    pub fn on_resize(&mut self, size: ViewportSize, now: Instant) -> bool {
        if size == self.live {
            return false;
        }
        self.live = size;
        self.debounce.schedule(now, RESIZE_DEBOUNCE, size);
        true
    }

    /// The settled size, once the debounce delay has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<ViewportSize> {
        self.debounce.take_due(now)
    }

    /// Re-fit whatever `engine` is showing to `size`.
    pub fn apply(&mut self, size: ViewportSize, engine: &mut TransitionEngine) -> ViewportAction {
        match engine.phase() {
            TransitionPhase::Idle => {
                self.affordance = AffordanceAnchor::centered_in(size);
                debug!(%size, "Re-centered open affordance");
                ViewportAction::RecenterAffordance(self.affordance)
            }
            TransitionPhase::Transitioning => {
                engine.refit(size);
                ViewportAction::RefitTransition(size)
            }
            TransitionPhase::ShowingPreview | TransitionPhase::ShowingFull => {
                engine.refit(size);
                debug!(%size, "Re-fitted displayed image");
                ViewportAction::RefitImage(size)
            }
        }
    }

    /// Fire the debounce if it is due.
    pub fn poll(&mut self, now: Instant, engine: &mut TransitionEngine) -> Option<ViewportAction> {
        let size = self.take_due(now)?;
        Some(self.apply(size, engine))
    }

    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.debounce.remaining(now)
    }
}
