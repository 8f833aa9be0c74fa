//! Frame timing
//!
//! [`Timer::tick`] reads the wall clock; [`Timer::advance`] takes an explicit
//! step so scene updates can be driven deterministically.

use std::time::{Duration, Instant};

/// Longest step a single frame may report
///
/// One full frame-rate window, so a slow renderer still reports its true rate.
pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(500);

/// Per-frame step source for the scene
///
/// Steps are clamped so a long stall (window drag, debugger break) does not
/// fling the camera or the orbiting drawables across the scene.
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    max_step: Duration,
    step: f32,
    total: f32,
    frames: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Start timing now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            max_step: DEFAULT_MAX_STEP,
            step: 0.0,
            total: 0.0,
            frames: 0,
        }
    }

    /// Replace the step clamp
    pub fn with_max_step(mut self, max_step: Duration) -> Self {
        self.max_step = max_step;
        self
    }

    /// Measure the wall-clock time since the previous tick and advance by it
    ///
    /// Returns the clamped step in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed)
    }

    /// Advance by an explicit step, clamped like [`Self::tick`]
    pub fn advance(&mut self, elapsed: Duration) -> f32 {
        self.step = elapsed.min(self.max_step).as_secs_f32();
        self.total += self.step;
        self.frames += 1;
        self.step
    }

    /// Step of the latest frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.step
    }

    /// Sum of all steps in seconds
    pub fn total_time(&self) -> f32 {
        self.total
    }

    /// Frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the whole run
    pub fn average_fps(&self) -> f32 {
        if self.total > 0.0 {
            self.frames as f32 / self.total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_advance_accumulates() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(100));
        timer.advance(Duration::from_millis(150));

        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.delta_time(), 0.15, epsilon = 1e-6);
        assert_relative_eq!(timer.total_time(), 0.25, epsilon = 1e-6);
        assert_relative_eq!(timer.average_fps(), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let mut timer = Timer::new().with_max_step(Duration::from_millis(50));
        let step = timer.advance(Duration::from_secs(3));
        assert_relative_eq!(step, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_slow_frames_keep_their_length() {
        let mut timer = Timer::new();
        for _ in 0..3 {
            let step = timer.advance(Duration::from_millis(400));
            assert_relative_eq!(step, 0.4, epsilon = 1e-6);
        }
        assert_relative_eq!(timer.total_time(), 1.2, epsilon = 1e-5);
        assert_relative_eq!(timer.average_fps(), 2.5, epsilon = 1e-4);
    }

    #[test]
    fn test_tick_counts_frames() {
        let mut timer = Timer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() <= DEFAULT_MAX_STEP.as_secs_f32());
    }
}
