//! Multi-level bloom: extracts bright pixels and spreads them into a soft
//! glow.
//!
//! Pipeline: luminance threshold into a half-resolution target, then five
//! levels of separable Gaussian blur, each level half the size of the one
//! before and reading the previous level's result, then a weighted sum of
//! all levels into a half-resolution output. The final composite adds that
//! output onto the scene.

use wgpu::util::DeviceExt;

use crate::error::EarthGlassError;
use crate::gpu::pipeline_helpers::{
    begin_screen_pass, create_render_texture, create_screen_space_pipeline,
    filtering_sampler, linear_sampler, texture_2d, uniform_buffer,
};
use crate::gpu::shader_composer::ShaderComposer;
use crate::host::BloomSettings;

/// Number of blur levels.
pub const BLOOM_LEVELS: usize = 5;

/// Gaussian kernel radius per level; sigma equals the radius.
const KERNEL_RADII: [u32; BLOOM_LEVELS] = [3, 5, 7, 9, 11];

/// Base contribution of each level before the radius blend.
const LEVEL_FACTORS: [f32; BLOOM_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Width of the smoothstep above the threshold.
const THRESHOLD_SMOOTH_WIDTH: f32 = 0.01;

const BLOOM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Per-level weights for a bloom `radius` in 0..1: near 0 favors the tight
/// levels, near 1 shifts weight to the wide ones.
#[must_use]
pub fn bloom_factors(radius: f32) -> [f32; BLOOM_LEVELS] {
    LEVEL_FACTORS.map(|f| f + (1.2 - f - f) * radius)
}

/// Size of blur level `level` for a `width` x `height` scene.
#[must_use]
pub fn level_size(width: u32, height: u32, level: usize) -> (u32, u32) {
    let shift = level as u32 + 1;
    ((width >> shift).max(1), (height >> shift).max(1))
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ThresholdParams {
    threshold: f32,
    smooth_width: f32,
    _pad: [f32; 2],
}

/// Must match `BlurParams` in `bloom_blur.wgsl` (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurParams {
    texel_size: [f32; 2],
    direction: [f32; 2],
    kernel_radius: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeWeights {
    weights0: [f32; 4],
    weights1: [f32; 4],
}

impl CompositeWeights {
    fn new(strength: f32, radius: f32) -> Self {
        let f = bloom_factors(radius).map(|w| w * strength);
        Self {
            weights0: [f[0], f[1], f[2], f[3]],
            weights1: [f[4], 0.0, 0.0, 0.0],
        }
    }
}

/// Textures and bind groups of one blur level.
struct BlurLevel {
    horizontal_view: wgpu::TextureView,
    vertical_view: wgpu::TextureView,
    /// [horizontal, vertical]
    bind_groups: [wgpu::BindGroup; 2],
}

/// GPU state of the bloom effect.
pub struct BloomPass {
    settings: BloomSettings,
    width: u32,
    height: u32,

    threshold_pipeline: wgpu::RenderPipeline,
    threshold_layout: wgpu::BindGroupLayout,
    threshold_bind_group: wgpu::BindGroup,
    threshold_buffer: wgpu::Buffer,

    blur_pipeline: wgpu::RenderPipeline,
    blur_layout: wgpu::BindGroupLayout,

    composite_pipeline: wgpu::RenderPipeline,
    composite_layout: wgpu::BindGroupLayout,
    weights_buffer: wgpu::Buffer,

    targets: Targets,
    sampler: wgpu::Sampler,
}

impl BloomPass {
    /// Build the pass for a `width` x `height` scene read from `scene_view`.
    ///
    /// # Errors
    ///
    /// Fails if one of the bloom shaders does not compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        scene_view: &wgpu::TextureView,
        (width, height): (u32, u32),
        settings: BloomSettings,
    ) -> Result<Self, EarthGlassError> {
        let sampler = linear_sampler(device, "Bloom Sampler");
        let sampled_layout = |label: &str| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            })
        };

        // --- Threshold ---
        let threshold_layout = sampled_layout("Bloom Threshold Layout");
        let threshold_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Threshold Params"),
                contents: bytemuck::bytes_of(&ThresholdParams {
                    threshold: settings.threshold,
                    smooth_width: THRESHOLD_SMOOTH_WIDTH,
                    _pad: [0.0; 2],
                }),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let threshold_shader = composer.compose(
            device,
            "Bloom Threshold Shader",
            include_str!("../../assets/shaders/screen/bloom_threshold.wgsl"),
            "bloom_threshold.wgsl",
        )?;
        let threshold_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Threshold",
            &threshold_shader,
            BLOOM_FORMAT,
            None,
            &[&threshold_layout],
        );

        // --- Blur ---
        let blur_layout = sampled_layout("Bloom Blur Layout");
        let blur_shader = composer.compose(
            device,
            "Bloom Blur Shader",
            include_str!("../../assets/shaders/screen/bloom_blur.wgsl"),
            "bloom_blur.wgsl",
        )?;
        let blur_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Blur",
            &blur_shader,
            BLOOM_FORMAT,
            None,
            &[&blur_layout],
        );

        // --- Level composite ---
        let mut composite_entries: Vec<_> =
            (0..BLOOM_LEVELS as u32).map(texture_2d).collect();
        composite_entries.push(filtering_sampler(BLOOM_LEVELS as u32));
        composite_entries.push(uniform_buffer(BLOOM_LEVELS as u32 + 1));
        let composite_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Bloom Composite Layout"),
                entries: &composite_entries,
            });
        let weights_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Composite Weights"),
                contents: bytemuck::bytes_of(&CompositeWeights::new(
                    settings.strength,
                    settings.radius,
                )),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let composite_shader = composer.compose(
            device,
            "Bloom Composite Shader",
            include_str!("../../assets/shaders/screen/bloom_composite.wgsl"),
            "bloom_composite.wgsl",
        )?;
        let composite_pipeline = create_screen_space_pipeline(
            device,
            "Bloom Composite",
            &composite_shader,
            BLOOM_FORMAT,
            None,
            &[&composite_layout],
        );

        let targets = Targets::new(
            device,
            &blur_layout,
            &composite_layout,
            &sampler,
            &weights_buffer,
            width,
            height,
        );
        let threshold_bind_group = Self::threshold_bind_group(
            device,
            &threshold_layout,
            scene_view,
            &sampler,
            &threshold_buffer,
        );

        log::debug!(
            "bloom pass created at {width}x{height} (strength {}, radius {}, threshold {})",
            settings.strength,
            settings.radius,
            settings.threshold
        );

        Ok(Self {
            settings,
            width,
            height,
            threshold_pipeline,
            threshold_layout,
            threshold_bind_group,
            threshold_buffer,
            blur_pipeline,
            blur_layout,
            composite_pipeline,
            composite_layout,
            weights_buffer,
            targets,
            sampler,
        })
    }

    fn threshold_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Threshold Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    /// Current parameters.
    #[must_use]
    pub fn settings(&self) -> BloomSettings {
        self.settings
    }

    /// Half-resolution bloom image for the final composite.
    #[must_use]
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.targets.output_view
    }

    /// Upload new strength, radius and threshold.
    pub fn update_settings(&mut self, queue: &wgpu::Queue, settings: BloomSettings) {
        self.settings = settings;
        queue.write_buffer(
            &self.threshold_buffer,
            0,
            bytemuck::bytes_of(&ThresholdParams {
                threshold: settings.threshold,
                smooth_width: THRESHOLD_SMOOTH_WIDTH,
                _pad: [0.0; 2],
            }),
        );
        queue.write_buffer(
            &self.weights_buffer,
            0,
            bytemuck::bytes_of(&CompositeWeights::new(
                settings.strength,
                settings.radius,
            )),
        );
    }

    /// Recreate the size-dependent targets. `scene_view` is the (new) HDR
    /// scene color the threshold reads from.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        self.threshold_bind_group = Self::threshold_bind_group(
            device,
            &self.threshold_layout,
            scene_view,
            &self.sampler,
            &self.threshold_buffer,
        );
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.settings.resolution = (width, height);

        self.targets = Targets::new(
            device,
            &self.blur_layout,
            &self.composite_layout,
            &self.sampler,
            &self.weights_buffer,
            width,
            height,
        );
    }

    /// Encode threshold, blur chain and level composite.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        let targets = &self.targets;
        {
            let mut pass =
                begin_screen_pass(encoder, "Bloom Threshold", &targets.bright_view);
            pass.set_pipeline(&self.threshold_pipeline);
            pass.set_bind_group(0, &self.threshold_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        for level in &targets.levels {
            let [horizontal, vertical] = &level.bind_groups;
            {
                let mut pass = begin_screen_pass(
                    encoder,
                    "Bloom Blur H",
                    &level.horizontal_view,
                );
                pass.set_pipeline(&self.blur_pipeline);
                pass.set_bind_group(0, horizontal, &[]);
                pass.draw(0..3, 0..1);
            }
            {
                let mut pass = begin_screen_pass(
                    encoder,
                    "Bloom Blur V",
                    &level.vertical_view,
                );
                pass.set_pipeline(&self.blur_pipeline);
                pass.set_bind_group(0, vertical, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        let mut pass =
            begin_screen_pass(encoder, "Bloom Composite", &targets.output_view);
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &targets.composite_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Size-dependent textures and the bind groups that read them.
struct Targets {
    _textures: Vec<wgpu::Texture>,
    bright_view: wgpu::TextureView,
    levels: Vec<BlurLevel>,
    output_view: wgpu::TextureView,
    composite_bind_group: wgpu::BindGroup,
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        blur_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        weights: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) -> Self {
        let (half_w, half_h) = level_size(width, height, 0);
        let (bright, bright_view) = create_render_texture(
            device,
            "Bloom Bright",
            half_w,
            half_h,
            BLOOM_FORMAT,
        );
        let (output, output_view) = create_render_texture(
            device,
            "Bloom Output",
            half_w,
            half_h,
            BLOOM_FORMAT,
        );

        let blur_bind_group = |label: String,
                               input: &wgpu::TextureView,
                               params: BlurParams| {
            let buffer =
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} Params")),
                    contents: bytemuck::bytes_of(&params),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&label),
                layout: blur_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        let mut textures = vec![bright, output];
        let mut levels: Vec<BlurLevel> = Vec::with_capacity(BLOOM_LEVELS);
        for (i, radius) in KERNEL_RADII.into_iter().enumerate() {
            let (w, h) = level_size(width, height, i);
            let (horizontal, horizontal_view) = create_render_texture(
                device,
                &format!("Bloom Level {i} H"),
                w,
                h,
                BLOOM_FORMAT,
            );
            let (vertical, vertical_view) = create_render_texture(
                device,
                &format!("Bloom Level {i} V"),
                w,
                h,
                BLOOM_FORMAT,
            );
            let texel_size = [1.0 / w as f32, 1.0 / h as f32];
            let params = |direction| BlurParams {
                texel_size,
                direction,
                kernel_radius: radius,
                _pad0: 0,
                _pad1: 0,
                _pad2: 0,
            };
            let input = levels
                .last()
                .map_or(&bright_view, |prev| &prev.vertical_view);
            let h_group = blur_bind_group(
                format!("Bloom Blur H {i}"),
                input,
                params([1.0, 0.0]),
            );
            let v_group = blur_bind_group(
                format!("Bloom Blur V {i}"),
                &horizontal_view,
                params([0.0, 1.0]),
            );
            textures.push(horizontal);
            textures.push(vertical);
            levels.push(BlurLevel {
                horizontal_view,
                vertical_view,
                bind_groups: [h_group, v_group],
            });
        }

        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = levels
            .iter()
            .enumerate()
            .map(|(i, level)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(
                    &level.vertical_view,
                ),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: BLOOM_LEVELS as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: BLOOM_LEVELS as u32 + 1,
            resource: weights.as_entire_binding(),
        });
        let composite_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Bloom Composite Bind Group"),
                layout: composite_layout,
                entries: &entries,
            });

        Self {
            _textures: textures,
            bright_view,
            levels,
            output_view,
            composite_bind_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<ThresholdParams>(), 16);
        assert_eq!(size_of::<BlurParams>(), 32);
        assert_eq!(size_of::<CompositeWeights>(), 32);
    }

    #[test]
    fn zero_radius_keeps_base_factors() {
        assert_eq!(bloom_factors(0.0), LEVEL_FACTORS);
    }

    #[test]
    fn full_radius_mirrors_factors() {
        let f = bloom_factors(1.0);
        let expected = [0.2, 0.4, 0.6, 0.8, 1.0];
        for (a, b) in f.iter().zip(expected) {
            assert!((a - b).abs() < 1e-6, "{f:?}");
        }
    }

    #[test]
    fn default_radius_flattens_the_falloff() {
        let f = bloom_factors(0.4);
        assert!((f[0] - 0.68).abs() < 1e-6);
        assert!((f[4] - 0.52).abs() < 1e-6);
        assert!(f.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn weights_carry_strength_and_fifth_level() {
        let w = CompositeWeights::new(0.5, 0.0);
        assert_eq!(w.weights0, [0.5, 0.4, 0.3, 0.2]);
        assert_eq!(w.weights1, [0.1, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn levels_halve_from_half_resolution() {
        assert_eq!(level_size(800, 600, 0), (400, 300));
        assert_eq!(level_size(800, 600, 4), (25, 18));
        assert_eq!(level_size(8, 8, 4), (1, 1));
    }
}
