use std::f32::consts::TAU;

use super::{FrameCallback, FrameTick};
use crate::options::RotationMode;
use crate::scene::{MeshId, Scene};

/// Frame interval the per-second mode normalizes against.
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Spins meshes about their local Y axis.
#[derive(Debug, Clone)]
pub struct RotationStep {
    meshes: Vec<MeshId>,
    step: f32,
    mode: RotationMode,
}

impl RotationStep {
    /// Rotate `meshes` by `step` radians per frame (or per 60 Hz frame in
    /// [`RotationMode::PerSecond`]).
    #[must_use]
    pub fn new(meshes: Vec<MeshId>, step: f32, mode: RotationMode) -> Self {
        Self { meshes, step, mode }
    }

    /// Angle to add for one tick.
    #[must_use]
    pub fn delta(&self, tick: FrameTick) -> f32 {
        match self.mode {
            RotationMode::PerFrame => self.step,
            RotationMode::PerSecond => {
                self.step * (tick.time_diff_ms / REFERENCE_FRAME_MS) as f32
            }
        }
    }
}

impl FrameCallback for RotationStep {
    fn on_frame(&mut self, scene: &mut Scene, tick: FrameTick) {
        let delta = self.delta(tick);
        for &id in &self.meshes {
            if let Some(mesh) = scene.mesh_mut(id) {
                let rotation = &mut mesh.transform.rotation.y;
                *rotation = (*rotation + delta).rem_euclid(TAU);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        BasicMaterial, Blending, Color, Geometry, Material, Mesh, Transform,
    };

    fn scene_with_mesh() -> (Scene, MeshId) {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::icosahedron(1.0, 0));
        let material = scene.add_material(Material::Basic(BasicMaterial {
            color: Color::WHITE,
            map: None,
            blending: Blending::Normal,
        }));
        let mesh = scene.add_mesh(Mesh {
            name: "earth".into(),
            geometry,
            material,
            parent: None,
            transform: Transform::default(),
        });
        (scene, mesh)
    }

    fn rotation_y(scene: &Scene, id: MeshId) -> f32 {
        scene.mesh(id).map_or(f32::NAN, |m| m.transform.rotation.y)
    }

    #[test]
    fn per_frame_steps_accumulate_exactly() {
        let (mut scene, mesh) = scene_with_mesh();
        let mut step = RotationStep::new(vec![mesh], 0.002, RotationMode::PerFrame);
        for _ in 0..100 {
            // Per-frame mode ignores frame duration
            step.on_frame(
                &mut scene,
                FrameTick {
                    timestamp_ms: 0.0,
                    time_diff_ms: 50.0,
                },
            );
        }
        assert!((rotation_y(&scene, mesh) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn rotation_wraps_at_full_turn() {
        let (mut scene, mesh) = scene_with_mesh();
        let mut step = RotationStep::new(vec![mesh], 1.0, RotationMode::PerFrame);
        for _ in 0..7 {
            step.on_frame(&mut scene, FrameTick::default());
        }
        let expected = 7.0_f32.rem_euclid(TAU);
        assert!((rotation_y(&scene, mesh) - expected).abs() < 1e-5);
    }

    #[test]
    fn per_second_mode_normalizes_to_sixty_hertz() {
        let step = RotationStep::new(Vec::new(), 0.002, RotationMode::PerSecond);
        let at_60 = step.delta(FrameTick {
            timestamp_ms: 0.0,
            time_diff_ms: REFERENCE_FRAME_MS,
        });
        let at_30 = step.delta(FrameTick {
            timestamp_ms: 0.0,
            time_diff_ms: REFERENCE_FRAME_MS * 2.0,
        });
        assert!((at_60 - 0.002).abs() < 1e-7);
        assert!((at_30 - 0.004).abs() < 1e-7);
    }
}
