use std::time::{Duration, Instant};

/// A cancelable one-shot deadline, polled by the UI loop.
///
/// Stands in for the toolkit's "run this after a delay" facility. The token
/// captured at scheduling time is handed back when the timer fires, so the
/// caller can tell which request it belongs to.
#[derive(Debug)]
pub struct Timer<T> {
    armed: Option<(Instant, T)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<T> Timer<T> {
    /// Arm the timer, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant, delay: Duration, token: T) {
        self.armed = Some((now + delay, token));
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(at, _)| *at)
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline().map(|at| at.saturating_duration_since(now))
    }

    /// Disarm and return the token if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.armed {
            Some((at, _)) if at <= now => self.armed.take().map(|(_, token)| token),
            _ => None,
        }
    }
}

/// Earliest of two optional wake-up delays.
pub fn earliest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_deadline() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.schedule(start, Duration::from_millis(100), 7u32);

        assert_eq!(timer.take_due(start + Duration::from_millis(99)), None);
        assert_eq!(timer.take_due(start + Duration::from_millis(100)), Some(7));
        assert_eq!(timer.take_due(start + Duration::from_millis(200)), None);
        assert!(!timer.is_armed());
    }

    #[test]
    fn reschedule_pushes_deadline_back() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.schedule(start, Duration::from_millis(100), "a");
        timer.schedule(start + Duration::from_millis(80), Duration::from_millis(100), "b");

        assert_eq!(timer.take_due(start + Duration::from_millis(120)), None);
        assert_eq!(timer.take_due(start + Duration::from_millis(180)), Some("b"));
    }

    #[test]
    fn earliest_picks_smaller() {
        let a = Some(Duration::from_millis(5));
        let b = Some(Duration::from_millis(3));
        assert_eq!(earliest(a, b), b);
        assert_eq!(earliest(a, None), a);
        assert_eq!(earliest(None, None), None);
    }
}
