use web_time::{Duration, Instant};

use super::FrameTick;

/// Produces [`FrameTick`]s from wall-clock time and tracks a smoothed FPS.
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    /// Exponential moving average of the instantaneous frame rate.
    smoothed_fps: f32,
    /// Weight of the newest sample (lower = smoother).
    smoothing: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Start the clock now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Advance to the current instant.
    pub fn tick(&mut self) -> FrameTick {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTick {
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        let frame_time = elapsed.as_secs_f32();
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }

        FrameTick {
            timestamp_ms: millis(now.duration_since(self.start)),
            time_diff_ms: millis(elapsed),
        }
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_report_elapsed_and_delta() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        let first = clock.tick_at(start + Duration::from_millis(20));
        let second = clock.tick_at(start + Duration::from_millis(50));
        assert!((first.timestamp_ms - 20.0).abs() < 1e-6);
        assert!((first.time_diff_ms - 20.0).abs() < 1e-6);
        assert!((second.timestamp_ms - 50.0).abs() < 1e-6);
        assert!((second.time_diff_ms - 30.0).abs() < 1e-6);
    }

    #[test]
    fn fps_moves_toward_frame_rate() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        for i in 1..=200 {
            let _ = clock.tick_at(start + Duration::from_millis(i * 10));
        }
        assert!((clock.fps() - 100.0).abs() < 1.0, "{}", clock.fps());
    }
}
