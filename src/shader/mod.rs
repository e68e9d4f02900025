//! Material shader patching.
//!
//! - [`augment`]: typed anchor injection with all-or-nothing stage semantics
//! - [`patch`]: the glass displacement patch and the compile hook that
//!   applies it
//! - [`templates`]: the WGSL each material kind is compiled from
//!
//! The compiled program is reached through a [`ShaderHandle`] returned when
//! the hook is registered, not through a field stashed on the material.

pub mod augment;
pub mod patch;
pub mod templates;

use std::cell::{Cell, OnceCell};
use std::rc::Rc;

pub use augment::{
    inject, ShaderAugmentation, ShaderPatchError, ShaderSources, ShaderStage,
};
pub use patch::{CompileHook, CompileHooks, ShaderPatch};

/// Uniforms added to a patched program.
#[derive(Debug, Default)]
pub struct ProgramUniforms {
    time: Cell<f32>,
}

impl ProgramUniforms {
    /// Current time uniform value.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time.get()
    }
}

/// Shared reference to a material program that may not be compiled yet.
///
/// Starts uncompiled; the backend calls [`mark_compiled`](Self::mark_compiled)
/// the first time it builds the program, after which it stays compiled for
/// the lifetime of the handle. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ShaderHandle {
    program: Rc<OnceCell<ProgramUniforms>>,
}

impl ShaderHandle {
    /// A handle to a program that has not been compiled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the backend has compiled the program.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.program.get().is_some()
    }

    /// Flip to compiled with a zeroed time uniform. Returns `false` if the
    /// program was already compiled, in which case uniforms are kept.
    pub fn mark_compiled(&self) -> bool {
        self.program.set(ProgramUniforms::default()).is_ok()
    }

    /// Write the time uniform. Returns `false` (and writes nothing) while
    /// the program is uncompiled.
    pub fn set_time(&self, time: f32) -> bool {
        self.program.get().is_some_and(|program| {
            program.time.set(time);
            true
        })
    }

    /// Time uniform value, once compiled.
    #[must_use]
    pub fn time(&self) -> Option<f32> {
        self.program.get().map(ProgramUniforms::time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_before_compile_is_refused() {
        let handle = ShaderHandle::new();
        assert!(!handle.is_compiled());
        assert!(!handle.set_time(1.0));
        assert_eq!(handle.time(), None);
    }

    #[test]
    fn compile_starts_time_at_zero_and_never_reverts() {
        let handle = ShaderHandle::new();
        let observer = handle.clone();
        assert!(handle.mark_compiled());
        assert_eq!(observer.time(), Some(0.0));

        assert!(observer.set_time(2.5));
        // A forced recompile keeps the existing uniforms
        assert!(!handle.mark_compiled());
        assert!(handle.is_compiled());
        assert_eq!(handle.time(), Some(2.5));
    }
}
