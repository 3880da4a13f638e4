//! Periodic tick driver
//!
//! The director runs on a single logical timeline. [`Ticker`] only decides
//! *when* the next tick is due; whoever owns the director polls it with the
//! current time (a timer loop, a game loop, or a test stepping time by hand).

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Ticker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start firing every `interval`, the first time after `initial_delay`
    pub fn start(&mut self, now: Instant, interval: Duration, initial_delay: Duration) {
        self.interval = interval;
        self.next_due = Some(now + initial_delay);
    }

    /// Stop firing. Safe to call when not running.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next tick fires, if running
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Consume one due tick, if any
    ///
    /// Each call fires at most once; a caller that fell behind catches up
    /// one interval per call rather than skipping ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(due + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_delay_then_interval() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.start(t0, Duration::from_secs(1), Duration::from_secs(10));

        assert!(!ticker.poll(t0));
        assert!(!ticker.poll(t0 + Duration::from_secs(9)));
        assert!(ticker.poll(t0 + Duration::from_secs(10)));
        assert!(!ticker.poll(t0 + Duration::from_millis(10_500)));
        assert!(ticker.poll(t0 + Duration::from_secs(11)));
    }

    #[test]
    fn test_catch_up_one_per_poll() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.start(t0, Duration::from_secs(1), Duration::ZERO);

        let late = t0 + Duration::from_millis(2_500);
        assert!(ticker.poll(late));
        assert!(ticker.poll(late));
        assert!(ticker.poll(late));
        assert!(!ticker.poll(late));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.cancel();
        ticker.start(t0, Duration::from_secs(1), Duration::ZERO);
        assert!(ticker.is_running());
        ticker.cancel();
        ticker.cancel();
        assert!(!ticker.is_running());
        assert!(!ticker.poll(t0 + Duration::from_secs(5)));
    }
}
