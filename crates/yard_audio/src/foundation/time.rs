//! Time management utilities

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Simulated clock shared between a frame loop and the things it drives
///
/// Cloning yields another view of the same clock. The owner advances it once
/// per frame; readers (e.g. simulated playback sources) only observe it.
#[derive(Debug, Clone, Default)]
pub struct SharedClock {
    elapsed: Rc<Cell<Duration>>,
}

impl SharedClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta`
    pub fn advance(&self, delta: Duration) {
        self.elapsed.set(self.elapsed.get() + delta);
    }

    /// Time elapsed since the clock was created
    pub fn now(&self) -> Duration {
        self.elapsed.get()
    }
}

/// Fixed-step frame timing for a simulated loop
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: Duration,
    frame_count: u64,
}

impl FixedStep {
    /// Create a fixed step running at `frames_per_second`
    pub fn from_rate(frames_per_second: u32) -> Self {
        let fps = frames_per_second.max(1);
        Self {
            step: Duration::from_secs(1) / fps,
            frame_count: 0,
        }
    }

    /// Duration of a single frame
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Advance one frame on `clock`
    pub fn advance(&mut self, clock: &SharedClock) {
        clock.advance(self.step);
        self.frame_count += 1;
    }

    /// Frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = SharedClock::new();
        let view = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(view.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_fixed_step() {
        let clock = SharedClock::new();
        let mut step = FixedStep::from_rate(50);
        assert_eq!(step.step(), Duration::from_millis(20));

        for _ in 0..5 {
            step.advance(&clock);
        }
        assert_eq!(step.frame_count(), 5);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_rate_clamped() {
        let step = FixedStep::from_rate(0);
        assert_eq!(step.step(), Duration::from_secs(1));
    }
}
