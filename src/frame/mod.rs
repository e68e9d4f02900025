//! Per-frame callbacks.
//!
//! The host owns a [`FrameCallbacks`] registry and runs it once per frame
//! with a [`FrameTick`]. Callbacks stay registered until cancelled through
//! the [`CallbackId`] returned at registration.

mod clock;
mod rotation;
mod time_uniform;

pub use clock::FrameClock;
pub use rotation::RotationStep;
pub use time_uniform::TimeUniformWriter;

use crate::scene::Scene;

/// Timing information handed to every frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTick {
    /// Milliseconds since the clock started.
    pub timestamp_ms: f64,
    /// Milliseconds since the previous tick.
    pub time_diff_ms: f64,
}

/// A recurring per-frame update.
pub trait FrameCallback {
    /// Run one frame's worth of work.
    fn on_frame(&mut self, scene: &mut Scene, tick: FrameTick);
}

/// Handle for cancelling a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Ordered list of live frame callbacks.
#[derive(Default)]
pub struct FrameCallbacks {
    next_id: u64,
    entries: Vec<(CallbackId, Box<dyn FrameCallback>)>,
}

impl FrameCallbacks {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback; it runs after every callback registered before it.
    pub fn register(&mut self, callback: Box<dyn FrameCallback>) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn cancel(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Number of live callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every live callback in registration order.
    pub fn run(&mut self, scene: &mut Scene, tick: FrameTick) {
        for (_, callback) in &mut self.entries {
            callback.on_frame(scene, tick);
        }
    }
}

/// Value written to the time uniform for a given frame timestamp.
#[must_use]
pub fn time_uniform_value(timestamp_ms: f64, divisor_ms: f64) -> f32 {
    (timestamp_ms / divisor_ms) as f32
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counter(Rc<Cell<u32>>);

    impl FrameCallback for Counter {
        fn on_frame(&mut self, _scene: &mut Scene, _tick: FrameTick) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn time_uniform_scales_by_ten_seconds() {
        assert_eq!(time_uniform_value(0.0, 10_000.0), 0.0);
        assert_eq!(time_uniform_value(10_000.0, 10_000.0), 1.0);
        assert_eq!(time_uniform_value(25_000.0, 10_000.0), 2.5);
    }

    #[test]
    fn cancelled_callbacks_stop_running() {
        let mut scene = Scene::new();
        let count = Rc::new(Cell::new(0));
        let mut callbacks = FrameCallbacks::new();
        let id = callbacks.register(Box::new(Counter(count.clone())));

        callbacks.run(&mut scene, FrameTick::default());
        callbacks.run(&mut scene, FrameTick::default());
        assert_eq!(count.get(), 2);

        assert!(callbacks.cancel(id));
        assert!(!callbacks.cancel(id));
        callbacks.run(&mut scene, FrameTick::default());
        assert_eq!(count.get(), 2);
        assert!(callbacks.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut callbacks = FrameCallbacks::new();
        let count = Rc::new(Cell::new(0));
        let a = callbacks.register(Box::new(Counter(count.clone())));
        let _ = callbacks.cancel(a);
        let b = callbacks.register(Box::new(Counter(count)));
        assert_ne!(a, b);
        assert_eq!(callbacks.len(), 1);
    }
}
