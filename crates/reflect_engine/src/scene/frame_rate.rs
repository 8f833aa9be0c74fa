//! Frame rate sampled over half-second windows

/// Window length in seconds
pub const WINDOW: f32 = 0.5;

/// Counts drawn frames and reports the rate once per [`WINDOW`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRateCounter {
    elapsed: f32,
    frames: u32,
    rate: u32,
}

impl FrameRateCounter {
    /// Counter with no samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Add frame time; when a window completes the rate is updated and the
    /// count restarts
    pub fn update(&mut self, elapsed: f32) {
        self.elapsed += elapsed;
        if self.elapsed >= WINDOW {
            self.rate = self.frames * 2;
            self.elapsed = 0.0;
            self.frames = 0;
        }
    }

    /// Count one drawn frame
    pub fn frame_drawn(&mut self) {
        self.frames += 1;
    }

    /// Frames per second from the last complete window
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Frames counted in the current window
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_twice_the_window_count() {
        let mut counter = FrameRateCounter::new();
        for _ in 0..30 {
            counter.frame_drawn();
        }
        counter.update(0.5);
        assert_eq!(counter.rate(), 60);
        assert_eq!(counter.frames(), 0);
    }

    #[test]
    fn test_partial_window_keeps_previous_rate() {
        let mut counter = FrameRateCounter::new();
        counter.frame_drawn();
        counter.update(0.25);
        assert_eq!(counter.rate(), 0);
        assert_eq!(counter.frames(), 1);

        counter.frame_drawn();
        counter.update(0.25);
        assert_eq!(counter.rate(), 4);
    }
}
