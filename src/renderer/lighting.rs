//! Packing scene lights into the shared lights uniform.

use crate::scene::{Light, LightKind, SPOT_ANGLE};

/// Most punctual lights the shaders iterate over.
pub const MAX_LIGHTS: usize = 8;

const KIND_DIRECTIONAL: u32 = 0;
const KIND_SPOT: u32 = 1;
const KIND_POINT: u32 = 2;

/// One punctual light. Must match `GpuLight` in `lighting.wgsl` (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// World-space position.
    pub position: [f32; 3],
    /// 0 directional, 1 spot, 2 point.
    pub kind: u32,
    /// Linear color.
    pub color: [f32; 3],
    /// Intensity multiplier.
    pub intensity: f32,
    /// Direction of travel, unit length.
    pub direction: [f32; 3],
    /// Cosine of the spot half-angle.
    pub cos_cone: f32,
}

/// Must match `LightsUniform` in `lighting.wgsl` (400 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// Summed ambient color times intensity.
    pub ambient: [f32; 3],
    /// Number of valid entries in `lights`.
    pub count: u32,
    /// Punctual lights.
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// Number of punctual lights in `lights` that [`pack_lights`] drops.
#[must_use]
pub fn overflow_count(lights: &[Light]) -> usize {
    lights
        .iter()
        .filter(|light| light.kind != LightKind::Ambient)
        .count()
        .saturating_sub(MAX_LIGHTS)
}

/// Pack `lights` for the GPU. Ambient lights are folded into one term;
/// punctual lights past [`MAX_LIGHTS`] are dropped silently (see
/// [`overflow_count`]).
#[must_use]
pub fn pack_lights(lights: &[Light]) -> LightsUniform {
    let mut uniform = LightsUniform::default();

    for light in lights {
        let color = light.color.linear();
        let kind = match light.kind {
            LightKind::Ambient => {
                for (sum, c) in uniform.ambient.iter_mut().zip(color) {
                    *sum += c * light.intensity;
                }
                continue;
            }
            LightKind::Directional => KIND_DIRECTIONAL,
            LightKind::Spot => KIND_SPOT,
            LightKind::Point => KIND_POINT,
        };

        let slot = uniform.count as usize;
        if slot == MAX_LIGHTS {
            continue;
        }
        uniform.lights[slot] = GpuLight {
            position: light.position.to_array(),
            kind,
            color,
            intensity: light.intensity,
            // A light at the origin has no meaningful direction; it then
            // shines straight down.
            direction: light
                .direction()
                .map_or([0.0, -1.0, 0.0], |d| d.to_array()),
            cos_cone: SPOT_ANGLE.cos(),
        };
        uniform.count += 1;
    }

    uniform
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::Color;

    fn light(kind: LightKind, position: Vec3, intensity: f32) -> Light {
        Light {
            name: format!("{kind:?}"),
            kind,
            color: Color::WHITE,
            intensity,
            position,
        }
    }

    #[test]
    fn struct_sizes_match_wgsl() {
        assert_eq!(size_of::<GpuLight>(), 48);
        assert_eq!(size_of::<LightsUniform>(), 400);
    }

    #[test]
    fn ambient_lights_are_summed_not_slotted() {
        let packed = pack_lights(&[
            light(LightKind::Ambient, Vec3::ZERO, 0.2),
            light(LightKind::Ambient, Vec3::ZERO, 0.3),
        ]);
        assert_eq!(packed.count, 0);
        for c in packed.ambient {
            assert!((c - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn spot_points_from_position_to_origin() {
        let packed =
            pack_lights(&[light(LightKind::Spot, Vec3::new(2.0, 2.0, 2.0), 0.25)]);
        assert_eq!(packed.count, 1);
        let spot = packed.lights[0];
        assert_eq!(spot.kind, KIND_SPOT);
        let expected = -Vec3::ONE.normalize();
        assert!((Vec3::from(spot.direction) - expected).length() < 1e-6);
        assert!((spot.cos_cone - 0.5).abs() < 1e-6);
        assert_eq!(spot.intensity, 0.25);
    }

    #[test]
    fn excess_lights_are_dropped() {
        let many: Vec<_> = (0..10)
            .map(|i| light(LightKind::Point, Vec3::X * i as f32, 1.0))
            .collect();
        let packed = pack_lights(&many);
        assert_eq!(packed.count as usize, MAX_LIGHTS);
        assert_eq!(packed.lights[7].position, [7.0, 0.0, 0.0]);
        assert_eq!(overflow_count(&many), 2);
    }

    #[test]
    fn ambient_lights_never_overflow() {
        let mut lights: Vec<_> = (0..MAX_LIGHTS)
            .map(|_| light(LightKind::Spot, Vec3::ONE, 1.0))
            .collect();
        lights.push(light(LightKind::Ambient, Vec3::ZERO, 0.2));
        assert_eq!(overflow_count(&lights), 0);
        lights.push(light(LightKind::Directional, Vec3::Y, 1.0));
        assert_eq!(overflow_count(&lights), 1);
    }
}
