//! One-shot construction of the Earth-in-glass scene on a [`RenderHost`].

use glam::Vec3;

use super::{
    BasicMaterial, Blending, Color, Geometry, Group, GroupId, Light, LightId,
    Material, MaterialId, Mesh, MeshId, PhysicalMaterial, Scene,
    StandardMaterial, TextureId, Transform,
};
use crate::camera::Camera;
use crate::error::EarthGlassError;
use crate::frame::{CallbackId, RotationStep, TimeUniformWriter};
use crate::host::{BloomSettings, PostEffect, RenderHost};
use crate::options::Options;
use crate::shader::{templates, ShaderHandle, ShaderPatch};
use crate::texture::{TextureLoader, TextureSource};

/// Radius shared by the Earth and the glass body.
const SPHERE_RADIUS: f32 = 1.0;

/// Ids and handles created by [`SceneAssembler::assemble`].
#[derive(Debug)]
pub struct SceneRuntime {
    /// Attached lights, in light-table order.
    pub lights: Vec<LightId>,
    /// Tilted parent of the Earth meshes.
    pub earth_group: GroupId,
    /// Day-textured Earth surface.
    pub earth_surface: MeshId,
    /// Additive night-lights layer, when enabled.
    pub earth_night: Option<MeshId>,
    /// The displaced glass icosahedron.
    pub glass: MeshId,
    /// Physical material of the glass.
    pub glass_material: MaterialId,
    /// Program of the glass material; compiled lazily by the backend.
    pub shader: ShaderHandle,
    rotation: CallbackId,
    time_uniform: CallbackId,
}

impl SceneRuntime {
    /// Cancel both frame callbacks. The scene contents stay in place.
    pub fn dispose<H: RenderHost + ?Sized>(self, host: &mut H) {
        for id in [self.rotation, self.time_uniform] {
            if !host.cancel(id) {
                log::warn!("frame callback {id:?} was already cancelled");
            }
        }
        log::debug!("scene runtime disposed");
    }
}

/// Builds the scene described by [`Options`].
#[derive(Debug, Clone, Default)]
pub struct SceneAssembler {
    options: Options,
}

impl SceneAssembler {
    /// Assembler for `options`.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// The options being assembled.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Populate `host` and register the shader patch, post effect and frame
    /// callbacks. Texture loads are only started; the scene is usable (with
    /// placeholder textures) before they finish.
    ///
    /// # Errors
    ///
    /// Returns [`EarthGlassError::ShaderPatch`] if the glass patch does not
    /// fit the physical material template. That is checked before `host`
    /// is touched. If the host itself rejects the hook, the meshes and
    /// lights already added stay in its scene, but no texture load, post
    /// effect or frame callback has been started.
    pub fn assemble<H: RenderHost + ?Sized>(
        &self,
        host: &mut H,
        loader: &mut dyn TextureLoader,
    ) -> Result<SceneRuntime, EarthGlassError> {
        let opts = &self.options;
        let patch = ShaderPatch::glass_displacement();
        let _ = patch.apply(&templates::physical())?;

        let viewport = host.viewport_size();
        *host.camera_mut() = Camera::from_options(&opts.camera, viewport.aspect());

        let scene = host.scene_mut();
        scene.set_background(opts.scene.background);
        let lights = self.add_lights(scene);
        let earth = self.add_earth(scene);
        let (glass, glass_material) = self.add_glass(scene);

        let shader = host.register_compile_hook(glass_material, patch)?;
        for (id, source) in &earth.textures {
            loader.request(*id, source);
        }

        if opts.bloom.enabled {
            host.register_post_effect(PostEffect::Bloom(BloomSettings {
                resolution: (viewport.width, viewport.height),
                strength: opts.bloom.strength,
                radius: opts.bloom.radius,
                threshold: opts.bloom.threshold,
            }));
        }

        let mut spinning = vec![earth.surface];
        spinning.extend(earth.night);
        let rotation = host.on_tick(Box::new(RotationStep::new(
            spinning,
            opts.scene.rotation_step,
            opts.scene.rotation_mode,
        )));
        let time_uniform = host.on_tick(Box::new(TimeUniformWriter::new(
            shader.clone(),
            opts.scene.time_divisor_ms,
        )));

        log::info!(
            "scene assembled: {} lights, night lights {}, glass detail {}",
            lights.len(),
            if earth.night.is_some() { "on" } else { "off" },
            opts.scene.refractive_subdivision,
        );

        Ok(SceneRuntime {
            lights,
            earth_group: earth.group,
            earth_surface: earth.surface,
            earth_night: earth.night,
            glass,
            glass_material,
            shader,
            rotation,
            time_uniform,
        })
    }

    fn add_lights(&self, scene: &mut Scene) -> Vec<LightId> {
        self.options
            .resolved_lights()
            .into_iter()
            .filter(|(_, config)| config.enabled)
            .map(|(name, config)| {
                scene.add_light(Light {
                    name,
                    kind: config.kind,
                    color: config.color,
                    intensity: config.intensity,
                    position: Vec3::from(config.position),
                })
            })
            .collect()
    }

    fn add_earth(&self, scene: &mut Scene) -> EarthMeshes {
        let opts = &self.options;
        let group = scene.add_group(Group {
            name: "earth".into(),
            transform: Transform::rotated_z(opts.scene.axial_tilt_deg.to_radians()),
        });
        let geometry = scene.add_geometry(Geometry::icosahedron(
            SPHERE_RADIUS,
            opts.scene.earth_subdivision,
        ));

        let day_map = scene.add_texture(opts.textures.day_map.clone());
        let mut textures = vec![(day_map, opts.textures.day_map.clone())];
        let surface_material = scene.add_material(Material::Standard(
            StandardMaterial::earth(&opts.earth_material, day_map),
        ));
        let surface = scene.add_mesh(Mesh {
            name: "earth_surface".into(),
            geometry,
            material: surface_material,
            parent: Some(group),
            transform: Transform::default(),
        });

        let night = opts.scene.use_night_lights.then(|| {
            let night_map = scene.add_texture(opts.textures.night_map.clone());
            textures.push((night_map, opts.textures.night_map.clone()));
            let material = scene.add_material(Material::Basic(BasicMaterial {
                color: Color::WHITE,
                map: Some(night_map),
                blending: Blending::Additive,
            }));
            scene.add_mesh(Mesh {
                name: "earth_night_lights".into(),
                geometry,
                material,
                parent: Some(group),
                transform: Transform::default(),
            })
        });

        EarthMeshes {
            group,
            surface,
            night,
            textures,
        }
    }

    fn add_glass(&self, scene: &mut Scene) -> (MeshId, MaterialId) {
        let opts = &self.options;
        let geometry = Geometry::icosahedron(
            SPHERE_RADIUS,
            opts.scene.refractive_subdivision,
        );
        log::debug!(
            "glass geometry: {} vertices, {} triangles",
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        let geometry = scene.add_geometry(geometry);
        let material = scene.add_material(Material::Physical(
            PhysicalMaterial::from(&opts.material),
        ));
        let mesh = scene.add_mesh(Mesh {
            name: "glass".into(),
            geometry,
            material,
            parent: None,
            transform: Transform::default(),
        });
        (mesh, material)
    }
}

struct EarthMeshes {
    group: GroupId,
    surface: MeshId,
    night: Option<MeshId>,
    /// Maps to load once the scene is committed.
    textures: Vec<(TextureId, TextureSource)>,
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::frame::FrameTick;
    use crate::host::stub::StubHost;
    use crate::options::RotationMode;
    use crate::frame::{CallbackId, FrameCallback};
    use crate::host::ViewportSize;
    use crate::scene::LightKind;
    use crate::shader::ShaderPatchError;
    use crate::texture::{TextureResult, TextureStatus};

    /// Resolves every request immediately with a 2x1 image.
    #[derive(Default)]
    struct SyncLoader {
        requested: Vec<TextureSource>,
        ready: Vec<TextureId>,
    }

    impl TextureLoader for SyncLoader {
        fn request(&mut self, id: TextureId, source: &TextureSource) {
            self.requested.push(source.clone());
            self.ready.push(id);
        }

        fn poll(&mut self) -> Vec<TextureResult> {
            self.ready
                .drain(..)
                .map(|id| (id, Ok(RgbaImage::new(2, 1))))
                .collect()
        }
    }

    /// Small geometry keeps the tests fast; semantics are unchanged.
    fn options(preset: &str) -> Options {
        let mut options = Options::preset(preset).unwrap();
        options.scene.refractive_subdivision = 4;
        options
    }

    fn assemble(options: Options) -> (StubHost, SyncLoader, SceneRuntime) {
        let mut host = StubHost::new(800, 600);
        let mut loader = SyncLoader::default();
        let runtime = SceneAssembler::new(options)
            .assemble(&mut host, &mut loader)
            .unwrap();
        (host, loader, runtime)
    }

    /// Host that refuses every compile hook.
    struct RejectingHost(StubHost);

    impl RenderHost for RejectingHost {
        fn scene_mut(&mut self) -> &mut Scene {
            self.0.scene_mut()
        }

        fn camera_mut(&mut self) -> &mut Camera {
            self.0.camera_mut()
        }

        fn viewport_size(&self) -> ViewportSize {
            self.0.viewport_size()
        }

        fn register_post_effect(&mut self, effect: PostEffect) {
            self.0.register_post_effect(effect);
        }

        fn register_compile_hook(
            &mut self,
            material: MaterialId,
            _patch: ShaderPatch,
        ) -> Result<ShaderHandle, ShaderPatchError> {
            Err(ShaderPatchError::UnknownMaterial(material))
        }

        fn on_tick(&mut self, callback: Box<dyn FrameCallback>) -> CallbackId {
            self.0.on_tick(callback)
        }

        fn cancel(&mut self, id: CallbackId) -> bool {
            self.0.cancel(id)
        }
    }

    fn tick(timestamp_ms: f64) -> FrameTick {
        FrameTick {
            timestamp_ms,
            time_diff_ms: 16.0,
        }
    }

    #[test]
    fn night_lights_preset_builds_three_meshes_and_spotlights() {
        let (host, loader, runtime) = assemble(options("night_lights"));
        assert_eq!(host.scene.meshes().count(), 3);
        assert!(runtime.earth_night.is_some());
        assert_eq!(loader.requested.len(), 2);

        let lights = host.scene.lights();
        assert_eq!(lights.len(), 4);
        assert!(lights.iter().all(|l| l.kind == LightKind::Spot));
        assert_eq!(runtime.lights.len(), 4);
    }

    #[test]
    fn lite_preset_skips_night_layer_and_uses_directional_light() {
        let (host, loader, runtime) = assemble(options("lite"));
        assert_eq!(host.scene.meshes().count(), 2);
        assert!(runtime.earth_night.is_none());
        assert_eq!(loader.requested.len(), 1);

        let mut kinds: Vec<_> =
            host.scene.lights().iter().map(|l| l.kind).collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        assert_eq!(kinds, vec![LightKind::Ambient, LightKind::Directional]);
    }

    #[test]
    fn attached_lights_are_exactly_the_enabled_entries() {
        let opts = options("night_lights");
        let enabled: Vec<String> = opts
            .resolved_lights()
            .into_iter()
            .filter(|(_, c)| c.enabled)
            .map(|(name, _)| name)
            .collect();
        let (host, _, _) = assemble(opts);
        let attached: Vec<String> =
            host.scene.lights().iter().map(|l| l.name.clone()).collect();
        assert_eq!(attached, enabled);
    }

    #[test]
    fn earth_meshes_share_geometry_under_tilted_group() {
        let (host, _, runtime) = assemble(options("night_lights"));
        let surface = host.scene.mesh(runtime.earth_surface).unwrap();
        let night = host.scene.mesh(runtime.earth_night.unwrap()).unwrap();
        assert_eq!(surface.geometry, night.geometry);
        assert_eq!(surface.parent, Some(runtime.earth_group));

        let group = host.scene.group(runtime.earth_group).unwrap();
        let tilt = (-23.4_f32).to_radians();
        assert!((group.transform.rotation.z - tilt).abs() < 1e-6);

        let night_material = host.scene.material(night.material).unwrap();
        assert_eq!(night_material.blending(), Blending::Additive);
        assert_eq!(host.scene.background(), Color::BLACK);
    }

    #[test]
    fn bloom_is_registered_once_with_viewport_resolution() {
        let (host, _, _) = assemble(options("night_lights"));
        assert_eq!(
            host.effects,
            vec![PostEffect::Bloom(BloomSettings {
                resolution: (800, 600),
                strength: 0.7,
                radius: 0.4,
                threshold: 0.4,
            })]
        );
    }

    #[test]
    fn disabled_bloom_registers_no_effect() {
        let mut opts = options("lite");
        opts.bloom.enabled = false;
        let (host, _, _) = assemble(opts);
        assert!(host.effects.is_empty());
    }

    #[test]
    fn time_uniform_waits_for_first_compile() {
        let (mut host, _, runtime) = assemble(options("night_lights"));
        host.tick(tick(10_000.0));
        assert!(!runtime.shader.is_compiled());
        assert_eq!(runtime.shader.time(), None);

        host.compile_all().unwrap();
        assert_eq!(runtime.shader.time(), Some(0.0));
        host.tick(tick(25_000.0));
        assert_eq!(runtime.shader.time(), Some(2.5));
    }

    #[test]
    fn earth_spins_while_glass_stays_put() {
        let (mut host, _, runtime) = assemble(options("night_lights"));
        for i in 0..10 {
            host.tick(tick(f64::from(i) * 16.0));
        }
        let spin = |id| host.scene.mesh(id).unwrap().transform.rotation.y;
        assert!((spin(runtime.earth_surface) - 0.02).abs() < 1e-5);
        assert!((spin(runtime.earth_night.unwrap()) - 0.02).abs() < 1e-5);
        assert_eq!(spin(runtime.glass), 0.0);
    }

    #[test]
    fn per_second_rotation_is_configurable() {
        let mut opts = options("lite");
        opts.scene.rotation_mode = RotationMode::PerSecond;
        let (mut host, _, runtime) = assemble(opts);
        host.tick(FrameTick {
            timestamp_ms: 0.0,
            time_diff_ms: 1000.0 / 30.0,
        });
        let spin = host.scene.mesh(runtime.earth_surface).unwrap().transform.rotation.y;
        assert!((spin - 0.004).abs() < 1e-6);
    }

    #[test]
    fn dispose_cancels_both_callbacks() {
        let (mut host, _, runtime) = assemble(options("night_lights"));
        assert_eq!(host.callbacks.len(), 2);
        let surface = runtime.earth_surface;
        runtime.dispose(&mut host);
        assert!(host.callbacks.is_empty());
        host.tick(tick(0.0));
        assert_eq!(host.scene.mesh(surface).unwrap().transform.rotation.y, 0.0);
    }

    #[test]
    fn textures_stay_pending_until_polled() {
        let (mut host, mut loader, runtime) = assemble(options("lite"));
        let surface = host.scene.mesh(runtime.earth_surface).unwrap();
        let map = host.scene.material(surface.material).unwrap().map().unwrap();
        assert!(matches!(
            host.scene.texture(map).unwrap().status,
            TextureStatus::Pending
        ));
        for (id, result) in loader.poll() {
            host.scene.resolve_texture(id, result);
        }
        assert!(matches!(
            host.scene.texture(map).unwrap().status,
            TextureStatus::Ready(_)
        ));
    }

    #[test]
    fn rejected_hook_starts_no_loads_or_callbacks() {
        let mut host = RejectingHost(StubHost::new(800, 600));
        let mut loader = SyncLoader::default();
        let result = SceneAssembler::new(options("night_lights"))
            .assemble(&mut host, &mut loader);

        assert!(matches!(
            result,
            Err(EarthGlassError::ShaderPatch(
                ShaderPatchError::UnknownMaterial(_)
            ))
        ));
        assert!(loader.requested.is_empty());
        assert!(host.0.callbacks.is_empty());
        assert!(host.0.effects.is_empty());
    }
}
