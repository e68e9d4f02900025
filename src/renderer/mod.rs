//! The wgpu render host.
//!
//! [`SceneRenderer`] owns the GPU context, the scene, the camera and the
//! registries the assembler fills in through [`RenderHost`]. Each frame it
//! runs the frame callbacks, syncs GPU resources (compiling materials on
//! first use), draws the meshes into an HDR target, runs bloom when it was
//! registered, and composites onto the surface.

pub mod bloom;
pub mod composite;
pub mod lighting;
pub mod mesh_pass;

use self::bloom::BloomPass;
use self::composite::CompositePass;
use self::mesh_pass::{MeshPass, DEPTH_FORMAT, HDR_FORMAT};
use crate::camera::Camera;
use crate::error::EarthGlassError;
use crate::frame::{CallbackId, FrameCallback, FrameCallbacks, FrameTick};
use crate::gpu::pipeline_helpers::create_render_texture;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::host::{PostEffect, RenderHost, ViewportSize};
use crate::options::CameraOptions;
use crate::scene::{MaterialId, Scene, TextureId};
use crate::shader::{CompileHooks, ShaderHandle, ShaderPatch, ShaderPatchError};
use crate::texture::TextureLoadError;

/// HDR color and depth targets at surface size.
struct SceneTargets {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl SceneTargets {
    fn new(device: &wgpu::Device, (width, height): (u32, u32)) -> Self {
        let (color, color_view) =
            create_render_texture(device, "Scene HDR", width, height, HDR_FORMAT);
        let (depth, depth_view) =
            create_render_texture(device, "Scene Depth", width, height, DEPTH_FORMAT);
        Self {
            _color: color,
            color_view,
            _depth: depth,
            depth_view,
        }
    }
}

/// Renders a [`Scene`] to a window surface.
pub struct SceneRenderer {
    context: RenderContext,
    composer: ShaderComposer,
    scene: Scene,
    camera: Camera,
    hooks: CompileHooks,
    callbacks: FrameCallbacks,
    effects: Vec<PostEffect>,
    effects_changed: bool,

    targets: SceneTargets,
    meshes: MeshPass,
    bloom: Option<BloomPass>,
    composite: CompositePass,
}

impl SceneRenderer {
    /// Create the GPU context and the fixed passes.
    ///
    /// # Errors
    ///
    /// Fails if no adapter or device is available, or a built-in shader
    /// does not compose.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        camera: &CameraOptions,
    ) -> Result<Self, EarthGlassError> {
        let context = RenderContext::new(window, size).await?;
        let mut composer = ShaderComposer::new()?;
        let size = context.size();
        let targets = SceneTargets::new(&context.device, size);
        let meshes = MeshPass::new(&context.device, &context.queue);
        let composite = CompositePass::new(
            &context.device,
            &mut composer,
            context.format(),
            &targets.color_view,
        )?;
        let viewport = ViewportSize {
            width: size.0,
            height: size.1,
        };

        Ok(Self {
            camera: Camera::from_options(camera, viewport.aspect()),
            context,
            composer,
            scene: Scene::new(),
            hooks: CompileHooks::default(),
            callbacks: FrameCallbacks::new(),
            effects: Vec::new(),
            effects_changed: false,
            targets,
            meshes,
            bloom: None,
            composite,
        })
    }

    /// The scene being rendered.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Registered post effects.
    #[must_use]
    pub fn effects(&self) -> &[PostEffect] {
        &self.effects
    }

    /// Feed a finished texture load into the scene.
    pub fn resolve_texture(
        &mut self,
        id: TextureId,
        result: Result<image::RgbaImage, TextureLoadError>,
    ) {
        self.scene.resolve_texture(id, result);
    }

    /// Follow a window resize. Zero-sized windows are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.context.resize(width, height) {
            return;
        }
        self.camera.set_viewport(width, height);
        follow_resolution(&mut self.effects, (width, height));
        self.targets = SceneTargets::new(&self.context.device, (width, height));
        if let Some(bloom) = &mut self.bloom {
            bloom.resize(
                &self.context.device,
                &self.targets.color_view,
                width,
                height,
            );
        }
        self.rebind_composite();
        log::debug!("resized to {width}x{height}");
    }

    /// Reconfigure the surface after it was lost or became outdated.
    pub fn reconfigure(&self) {
        self.context.reconfigure();
    }

    /// Run every frame callback once.
    pub fn tick(&mut self, tick: FrameTick) {
        self.callbacks.run(&mut self.scene, tick);
    }

    /// Get GPU state ready for the next frame: create or update post
    /// effects, upload new resources, compile new materials and write the
    /// per-frame uniforms.
    ///
    /// # Errors
    ///
    /// Fails when a material does not compile, including when its compile
    /// hook cannot patch the template.
    pub fn prepare(&mut self) -> Result<(), EarthGlassError> {
        if self.effects_changed {
            self.apply_effects()?;
            self.effects_changed = false;
        }
        if self.scene.is_dirty() {
            self.meshes.sync_resources(
                &self.context.device,
                &self.context.queue,
                &mut self.composer,
                &self.scene,
                &self.hooks,
            )?;
            self.scene.mark_rendered();
        }
        self.meshes
            .update_frame(&self.context.queue, &self.scene, &self.camera);
        Ok(())
    }

    fn apply_effects(&mut self) -> Result<(), EarthGlassError> {
        let bloom_settings = self.effects.iter().rev().find_map(|effect| match effect {
            PostEffect::Bloom(settings) => Some(*settings),
        });
        match bloom_settings {
            Some(settings) => {
                if let Some(bloom) = &mut self.bloom {
                    bloom.update_settings(&self.context.queue, settings);
                } else {
                    self.bloom = Some(BloomPass::new(
                        &self.context.device,
                        &mut self.composer,
                        &self.targets.color_view,
                        self.context.size(),
                        settings,
                    )?);
                }
            }
            None => self.bloom = None,
        }
        self.rebind_composite();
        Ok(())
    }

    fn rebind_composite(&mut self) {
        self.composite.rebind(
            &self.context.device,
            &self.context.queue,
            &self.targets.color_view,
            self.bloom.as_ref().map(BloomPass::output_view),
        );
    }

    /// Draw one frame to the surface.
    ///
    /// # Errors
    ///
    /// Returns the surface error when no frame could be acquired; `Lost`
    /// and `Outdated` are recovered by [`reconfigure`](Self::reconfigure).
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder();

        self.meshes.render(
            &mut encoder,
            &self.scene,
            &self.targets.color_view,
            &self.targets.depth_view,
        );
        if let Some(bloom) = &self.bloom {
            bloom.render(&mut encoder);
        }
        self.composite.render(&mut encoder, &view);

        self.context.submit(encoder);
        frame.present();
        Ok(())
    }
}

/// Point every registered effect at the new surface size.
fn follow_resolution(effects: &mut [PostEffect], size: (u32, u32)) {
    for effect in effects {
        match effect {
            PostEffect::Bloom(settings) => settings.resolution = size,
        }
    }
}

impl RenderHost for SceneRenderer {
    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn viewport_size(&self) -> ViewportSize {
        let (width, height) = self.context.size();
        ViewportSize { width, height }
    }

    fn register_post_effect(&mut self, effect: PostEffect) {
        log::info!("post effect registered: {effect:?}");
        self.effects.push(effect);
        self.effects_changed = true;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BloomSettings;

    #[test]
    fn registered_bloom_follows_resize() {
        let mut effects = vec![PostEffect::Bloom(BloomSettings {
            resolution: (800, 600),
            strength: 0.7,
            radius: 0.4,
            threshold: 0.4,
        })];
        follow_resolution(&mut effects, (1920, 1080));
        assert_eq!(
            effects,
            vec![PostEffect::Bloom(BloomSettings {
                resolution: (1920, 1080),
                strength: 0.7,
                radius: 0.4,
                threshold: 0.4,
            })]
        );
    }
}
