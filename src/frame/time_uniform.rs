use super::{time_uniform_value, FrameCallback, FrameTick};
use crate::scene::Scene;
use crate::shader::ShaderHandle;

/// Writes the frame timestamp into a patched program's time uniform.
#[derive(Debug)]
pub struct TimeUniformWriter {
    handle: ShaderHandle,
    divisor_ms: f64,
    reported_pending: bool,
}

impl TimeUniformWriter {
    /// Writer for `handle`, dividing timestamps by `divisor_ms`.
    #[must_use]
    pub fn new(handle: ShaderHandle, divisor_ms: f64) -> Self {
        Self {
            handle,
            divisor_ms,
            reported_pending: false,
        }
    }
}

impl FrameCallback for TimeUniformWriter {
    fn on_frame(&mut self, _scene: &mut Scene, tick: FrameTick) {
        let time = time_uniform_value(tick.timestamp_ms, self.divisor_ms);
        if !self.handle.set_time(time) && !self.reported_pending {
            log::debug!("time uniform skipped: program not compiled yet");
            self.reported_pending = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(timestamp_ms: f64) -> FrameTick {
        FrameTick {
            timestamp_ms,
            time_diff_ms: 16.0,
        }
    }

    #[test]
    fn skips_until_compiled_then_tracks_timestamp() {
        let mut scene = Scene::new();
        let handle = ShaderHandle::new();
        let mut writer = TimeUniformWriter::new(handle.clone(), 10_000.0);

        writer.on_frame(&mut scene, tick(5_000.0));
        assert_eq!(handle.time(), None);

        assert!(handle.mark_compiled());
        assert_eq!(handle.time(), Some(0.0));
        writer.on_frame(&mut scene, tick(25_000.0));
        assert_eq!(handle.time(), Some(2.5));
    }
}
