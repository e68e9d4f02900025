//! Final pass: HDR scene plus bloom, clamped and written to the surface.

use wgpu::util::DeviceExt;

use crate::error::EarthGlassError;
use crate::gpu::pipeline_helpers::{
    begin_screen_pass, create_render_texture, create_screen_space_pipeline, filtering_sampler,
    linear_sampler, texture_2d, uniform_buffer,
};
use crate::gpu::shader_composer::ShaderComposer;

/// Must match `CompositeParams` in `composite.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    /// Multiplier on the bloom image; 0 disables it.
    pub bloom_intensity: f32,
    /// Exponent applied to the clamped color.
    pub gamma: f32,
    /// Padding for GPU alignment.
    pub _pad: [f32; 2],
}

impl CompositeParams {
    /// Parameters for a surface of `format`. sRGB surfaces encode on
    /// write, so the shader output stays linear for them.
    #[must_use]
    pub fn for_format(format: wgpu::TextureFormat, bloom: bool) -> Self {
        Self {
            bloom_intensity: if bloom { 1.0 } else { 0.0 },
            gamma: if format.is_srgb() { 1.0 } else { 1.0 / 2.2 },
            _pad: [0.0; 2],
        }
    }
}

/// The composite pipeline and its inputs.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    params: CompositeParams,
    params_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    /// Bound in place of the bloom image while no bloom pass exists.
    _no_bloom: wgpu::Texture,
    no_bloom_view: wgpu::TextureView,
}

impl CompositePass {
    /// Build the pass writing to `surface_format`.
    ///
    /// # Errors
    ///
    /// Fails if `composite.wgsl` does not compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        surface_format: wgpu::TextureFormat,
        scene_view: &wgpu::TextureView,
    ) -> Result<Self, EarthGlassError> {
        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Composite Layout"),
                entries: &[
                    texture_2d(0),
                    texture_2d(1),
                    filtering_sampler(2),
                    uniform_buffer(3),
                ],
            });
        let shader = composer.compose(
            device,
            "Composite Shader",
            include_str!("../../assets/shaders/screen/composite.wgsl"),
            "composite.wgsl",
        )?;
        let pipeline = create_screen_space_pipeline(
            device,
            "Composite",
            &shader,
            surface_format,
            None,
            &[&layout],
        );

        let params = CompositeParams::for_format(surface_format, false);
        let params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Composite Params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let sampler = linear_sampler(device, "Composite Sampler");
        let (no_bloom, no_bloom_view) = create_render_texture(
            device,
            "Composite No Bloom",
            1,
            1,
            wgpu::TextureFormat::Rgba16Float,
        );

        let bind_group = Self::bind_group(
            device,
            &layout,
            scene_view,
            &no_bloom_view,
            &sampler,
            &params_buffer,
        );

        Ok(Self {
            pipeline,
            layout,
            bind_group,
            params,
            params_buffer,
            sampler,
            _no_bloom: no_bloom,
            no_bloom_view,
        })
    }

    fn bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        bloom_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    /// Current parameters.
    #[must_use]
    pub fn params(&self) -> CompositeParams {
        self.params
    }

    /// Rebind inputs after a resize or after bloom was switched on or off.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene_view: &wgpu::TextureView,
        bloom_view: Option<&wgpu::TextureView>,
    ) {
        let bloom = bloom_view.is_some();
        if (self.params.bloom_intensity > 0.0) != bloom {
            self.params.bloom_intensity = if bloom { 1.0 } else { 0.0 };
            queue.write_buffer(
                &self.params_buffer,
                0,
                bytemuck::bytes_of(&self.params),
            );
        }
        self.bind_group = Self::bind_group(
            device,
            &self.layout,
            scene_view,
            bloom_view.unwrap_or(&self.no_bloom_view),
            &self.sampler,
            &self.params_buffer,
        );
    }

    /// Draw into `target`, usually the swapchain view.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let mut pass = begin_screen_pass(encoder, "Composite", target);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_size_matches_wgsl() {
        assert_eq!(size_of::<CompositeParams>(), 16);
    }

    #[test]
    fn srgb_surface_skips_manual_gamma() {
        let p = CompositeParams::for_format(
            wgpu::TextureFormat::Bgra8UnormSrgb,
            true,
        );
        assert_eq!(p.gamma, 1.0);
        assert_eq!(p.bloom_intensity, 1.0);

        let p =
            CompositeParams::for_format(wgpu::TextureFormat::Bgra8Unorm, false);
        assert!((p.gamma - 1.0 / 2.2).abs() < 1e-6);
        assert_eq!(p.bloom_intensity, 0.0);
    }
}
