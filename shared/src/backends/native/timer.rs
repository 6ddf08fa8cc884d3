use std::time::{Duration, Instant};

/// A simple repeating deadline: rings once `duration` has elapsed since the
/// last reset.
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last: Instant::now(),
        }
    }

    /// Returns whether the deadline has passed
    pub fn ringing(&self) -> bool {
        self.last.elapsed() >= self.duration
    }

    /// Pushes the deadline out by the full duration again
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
