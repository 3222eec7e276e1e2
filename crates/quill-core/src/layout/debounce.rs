// Coalesces bursts of window-resize events.
//
// Every event restarts the quiet period; the latest size is released once
// no event has arrived for the full delay.

use std::time::Duration;

use tokio::time::Instant;

use crate::geometry::Size;

pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug)]
pub struct ResizeDebounce {
    delay: Duration,
    pending: Option<(Size, Instant)>,
}

impl Default for ResizeDebounce {
    fn default() -> Self {
        ResizeDebounce::new(RESIZE_DEBOUNCE)
    }
}

impl ResizeDebounce {
    pub fn new(delay: Duration) -> Self {
        ResizeDebounce {
            delay,
            pending: None,
        }
    }

    /// Record a resize and restart the quiet period.
    pub fn bump(&mut self, size: Size, now: Instant) {
        self.pending = Some((size, now + self.delay));
    }

    /// When the pending size becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending size if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<Size> {
        match self.pending {
            Some((size, deadline)) if now >= deadline => {
                self.pending = None;
                Some(size)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn releases_after_quiet_period() {
        let mut debounce = ResizeDebounce::default();
        debounce.bump(Size::new(80, 24), Instant::now());
        assert!(debounce.take_due(Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(149)).await;
        assert!(debounce.take_due(Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(debounce.take_due(Instant::now()), Some(Size::new(80, 24)));
        assert!(!debounce.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn each_event_restarts_the_timer_and_latest_size_wins() {
        let mut debounce = ResizeDebounce::default();
        for width in [80, 90, 100, 110] {
            debounce.bump(Size::new(width, 30), Instant::now());
            tokio::time::advance(Duration::from_millis(100)).await;
            assert!(debounce.take_due(Instant::now()).is_none());
        }
        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(debounce.take_due(Instant::now()), Some(Size::new(110, 30)));
    }

    #[test]
    fn nothing_pending_has_no_deadline() {
        let debounce = ResizeDebounce::default();
        assert!(debounce.deadline().is_none());
    }
}
