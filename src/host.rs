//! The contract between scene code and whatever renders it.
//!
//! [`RenderHost`] is implemented by the wgpu [`SceneRenderer`] and by a
//! recording test double, so the scene assembler never touches the GPU
//! directly.
//!
//! [`SceneRenderer`]: crate::renderer::SceneRenderer

use crate::camera::Camera;
use crate::frame::{CallbackId, FrameCallback};
use crate::scene::{MaterialId, Scene};
use crate::shader::{ShaderHandle, ShaderPatch, ShaderPatchError};

/// Drawable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ViewportSize {
    /// Width over height; 1.0 for a degenerate viewport.
    #[must_use]
    pub fn aspect(self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Parameters of the bloom post effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Resolution the effect was configured for (width, height).
    pub resolution: (u32, u32),
    /// Overall bloom intensity.
    pub strength: f32,
    /// Blend between tight and wide glow, 0..1.
    pub radius: f32,
    /// Luminance above which pixels bloom.
    pub threshold: f32,
}

/// A full-screen effect applied after the scene is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostEffect {
    /// Multi-level Gaussian glow of bright pixels.
    Bloom(BloomSettings),
}

/// Owns the scene, camera, post effects, compile hooks and per-frame
/// callbacks.
pub trait RenderHost {
    /// The scene graph.
    fn scene_mut(&mut self) -> &mut Scene;

    /// The active camera.
    fn camera_mut(&mut self) -> &mut Camera;

    /// Current drawable size.
    fn viewport_size(&self) -> ViewportSize;

    /// Append a post effect to the chain.
    fn register_post_effect(&mut self, effect: PostEffect);

    /// Attach a shader patch to `material`. The patch runs each time the
    /// backend compiles the material; the returned handle flips to compiled
    /// the first time it does.
    ///
    /// # Errors
    ///
    /// Fails if the material does not exist or the patch's anchors are
    /// missing from the material's template.
    fn register_compile_hook(
        &mut self,
        material: MaterialId,
        patch: ShaderPatch,
    ) -> Result<ShaderHandle, ShaderPatchError>;

    /// Run `callback` every frame until cancelled.
    fn on_tick(&mut self, callback: Box<dyn FrameCallback>) -> CallbackId;

    /// Stop a frame callback. Returns `false` if it was not registered.
    fn cancel(&mut self, id: CallbackId) -> bool;
}

#[cfg(test)]
pub(crate) mod stub {
    //! Recording host that never touches a GPU.

    use super::{PostEffect, RenderHost, ViewportSize};
    use crate::camera::Camera;
    use crate::frame::{CallbackId, FrameCallback, FrameCallbacks, FrameTick};
    use crate::options::CameraOptions;
    use crate::scene::{MaterialId, Scene};
    use crate::shader::{
        templates, CompileHooks, ShaderHandle, ShaderPatch, ShaderPatchError,
    };

    pub struct StubHost {
        pub scene: Scene,
        pub camera: Camera,
        pub size: ViewportSize,
        pub effects: Vec<PostEffect>,
        pub hooks: CompileHooks,
        pub callbacks: FrameCallbacks,
        pub compiled: Vec<MaterialId>,
    }

    impl StubHost {
        pub fn new(width: u32, height: u32) -> Self {
            let size = ViewportSize { width, height };
            Self {
                scene: Scene::new(),
                camera: Camera::from_options(
                    &CameraOptions::default(),
                    size.aspect(),
                ),
                size,
                effects: Vec::new(),
                hooks: CompileHooks::default(),
                callbacks: FrameCallbacks::new(),
                compiled: Vec::new(),
            }
        }

        /// "Compile" every material not compiled yet, firing hooks.
        pub fn compile_all(&mut self) -> Result<(), ShaderPatchError> {
            let pending: Vec<_> = self
                .scene
                .materials()
                .filter(|(id, _)| !self.compiled.contains(id))
                .map(|(id, material)| (id, templates::for_material(material)))
                .collect();
            for (id, template) in pending {
                if let Some(hook) = self.hooks.get(id) {
                    let _ = hook.run(&template)?;
                }
                self.compiled.push(id);
            }
            Ok(())
        }

        pub fn tick(&mut self, tick: FrameTick) {
            self.callbacks.run(&mut self.scene, tick);
        }
    }

    impl RenderHost for StubHost {
        fn scene_mut(&mut self) -> &mut Scene {
            &mut self.scene
        }

        fn camera_mut(&mut self) -> &mut Camera {
            &mut self.camera
        }

        fn viewport_size(&self) -> ViewportSize {
            self.size
        }

        fn register_post_effect(&mut self, effect: PostEffect) {
            self.effects.push(effect);
        }

        fn register_compile_hook(
            &mut self,
            material: MaterialId,
            patch: ShaderPatch,
        ) -> Result<ShaderHandle, ShaderPatchError> {
            self.hooks.register(&self.scene, material, patch)
        }

        fn on_tick(&mut self, callback: Box<dyn FrameCallback>) -> CallbackId {
            self.callbacks.register(callback)
        }

        fn cancel(&mut self, id: CallbackId) -> bool {
            self.callbacks.cancel(id)
        }
    }
}
