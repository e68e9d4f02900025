use glam::{Mat4, Vec3};

use crate::options::CameraOptions;

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix and eye position.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Padding for GPU alignment.
    pub(crate) _pad: f32,
}

impl Camera {
    /// Camera placed per `options`, looking at the origin.
    #[must_use]
    pub fn from_options(options: &CameraOptions, aspect: f32) -> Self {
        Self {
            eye: Vec3::from(options.eye),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// Re-apply projection and placement from `options`, keeping the aspect.
    pub fn apply_options(&mut self, options: &CameraOptions) {
        *self = Self::from_options(options, self.aspect);
    }

    /// Update the aspect ratio for a viewport. Zero-sized viewports are
    /// ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        let proj = Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        );
        proj * view
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            _pad: 0.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_matrix().to_cols_array_2d();
        self.position = camera.eye.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::from_options(&CameraOptions::default(), 1.5);
        let clip = camera.build_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut camera = Camera::from_options(&CameraOptions::default(), 2.0);
        camera.set_viewport(0, 600);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(300, 600);
        assert_eq!(camera.aspect, 0.5);
    }
}
