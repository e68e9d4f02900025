//! Scene meshes into the HDR target.
//!
//! Materials are compiled lazily: the first time a material is drawn its
//! template is run through any registered compile hook, composed with
//! naga_oil and turned into a pipeline. Draws happen in three phases:
//! opaque, additive, then alpha-blended transparent.

use glam::Mat4;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::lighting::{overflow_count, pack_lights, LightsUniform, MAX_LIGHTS};
use crate::camera::{Camera, CameraUniform};
use crate::error::EarthGlassError;
use crate::gpu::pipeline_helpers::{
    equirect_sampler, filtering_sampler, mesh_uniform_buffer, texture_2d,
};
use crate::gpu::shader_composer::ShaderComposer;
use crate::gpu::texture::{blank_image, missing_image, pending_image, GpuTexture};
use crate::scene::{
    Blending, Color, Geometry, GeometryId, Material, MaterialId, MeshId, Scene,
    TextureId,
};
use crate::shader::{templates, CompileHooks, ShaderHandle};
use crate::texture::TextureStatus;

/// HDR scene color format.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth buffer format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// When a mesh is drawn relative to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawPhase {
    /// Depth-tested and depth-written, no blending.
    Opaque,
    /// Added onto what is already drawn, no depth writes.
    Additive,
    /// Alpha-blended over everything else.
    Transparent,
}

impl DrawPhase {
    /// Phase a material draws in.
    #[must_use]
    pub fn of(material: &Material) -> Self {
        if material.blending() == Blending::Additive {
            Self::Additive
        } else if material.is_transparent() {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }
}

/// Meshes in draw order: grouped by phase, insertion order within a phase.
#[must_use]
pub fn draw_order(scene: &Scene) -> Vec<MeshId> {
    let mut order: Vec<(DrawPhase, MeshId)> = scene
        .meshes()
        .filter_map(|(id, mesh)| {
            let material = scene.material(mesh.material)?;
            Some((DrawPhase::of(material), id))
        })
        .collect();
    order.sort_by_key(|(phase, _)| *phase);
    order.into_iter().map(|(_, id)| id).collect()
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

fn interleave(geometry: &Geometry) -> Vec<MeshVertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.normals)
        .map(|(&position, &normal)| MeshVertex { position, normal })
        .collect()
}

/// Must match `ModelUniform` in `mesh_io.wgsl` (128 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    /// Object-to-world matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, for normals.
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    /// Uniform for an object-to-world matrix.
    #[must_use]
    pub fn new(world: Mat4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct StandardParams {
    color: [f32; 4],
    metalness: f32,
    roughness: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct BasicParams {
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct PhysicalParams {
    color: [f32; 4],
    metalness: f32,
    roughness: f32,
    clearcoat: f32,
    clearcoat_roughness: f32,
    reflectivity: f32,
    ior: f32,
    _pad: [f32; 2],
}

/// Group 3 of the patched physical program.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct AugmentUniforms {
    time: f32,
    _pad: [f32; 3],
}

/// Uniform bytes of a material.
fn material_params(material: &Material) -> Vec<u8> {
    let rgba = |color: Color, alpha: f32| {
        let [r, g, b] = color.linear();
        [r, g, b, alpha]
    };
    match material {
        Material::Standard(m) => bytemuck::bytes_of(&StandardParams {
            color: rgba(m.color, 1.0),
            metalness: m.metalness,
            roughness: m.roughness,
            _pad: [0.0; 2],
        })
        .to_vec(),
        Material::Basic(m) => bytemuck::bytes_of(&BasicParams {
            color: rgba(m.color, 1.0),
        })
        .to_vec(),
        Material::Physical(m) => bytemuck::bytes_of(&PhysicalParams {
            color: rgba(m.color, if m.transparent { m.opacity } else { 1.0 }),
            metalness: m.metalness,
            roughness: m.roughness,
            clearcoat: m.clearcoat,
            clearcoat_roughness: m.clearcoat_roughness,
            reflectivity: m.reflectivity,
            ior: m.ior,
            _pad: [0.0; 2],
        })
        .to_vec(),
    }
}

/// Shader file names used for naga_oil diagnostics.
fn shader_paths(material: &Material) -> (&'static str, &'static str) {
    match material {
        Material::Standard(_) => ("standard.wgsl", "standard.wgsl"),
        Material::Basic(_) => ("basic.wgsl", "basic.wgsl"),
        Material::Physical(_) => {
            ("physical_vertex.wgsl", "physical_fragment.wgsl")
        }
    }
}

/// Which placeholder or image a GPU texture currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextureState {
    Pending,
    Ready,
    Failed,
}

impl From<&TextureStatus> for TextureState {
    fn from(status: &TextureStatus) -> Self {
        match status {
            TextureStatus::Pending => Self::Pending,
            TextureStatus::Ready(_) => Self::Ready,
            TextureStatus::Failed(_) => Self::Failed,
        }
    }
}

struct UploadedTexture {
    state: TextureState,
    gpu: GpuTexture,
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct Augment {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    handle: ShaderHandle,
}

struct GpuMaterial {
    pipeline: wgpu::RenderPipeline,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    map: Option<TextureId>,
    augment: Option<Augment>,
}

struct ModelSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU resources for every mesh in the scene.
pub struct MeshPass {
    frame_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    textured_layout: wgpu::BindGroupLayout,
    physical_layout: wgpu::BindGroupLayout,
    augment_layout: wgpu::BindGroupLayout,

    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    blank: GpuTexture,

    geometries: FxHashMap<GeometryId, GpuGeometry>,
    textures: FxHashMap<TextureId, UploadedTexture>,
    materials: FxHashMap<MaterialId, GpuMaterial>,
    models: FxHashMap<MeshId, ModelSlot>,
    order: Vec<MeshId>,
}

impl MeshPass {
    /// Create layouts and frame-wide buffers.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = |label: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            })
        };
        let frame_layout = layout(
            "Frame Layout",
            &[mesh_uniform_buffer(0), mesh_uniform_buffer(1)],
        );
        let model_layout = layout("Model Layout", &[mesh_uniform_buffer(0)]);
        let textured_layout = layout(
            "Textured Material Layout",
            &[mesh_uniform_buffer(0), texture_2d(1), filtering_sampler(2)],
        );
        let physical_layout =
            layout("Physical Material Layout", &[mesh_uniform_buffer(0)]);
        let augment_layout = layout("Augment Layout", &[mesh_uniform_buffer(0)]);

        let camera_uniform = CameraUniform::new();
        let camera_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::bytes_of(&camera_uniform),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let lights_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lights Buffer"),
                contents: bytemuck::bytes_of(&LightsUniform::default()),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let frame_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Frame Bind Group"),
                layout: &frame_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: lights_buffer.as_entire_binding(),
                    },
                ],
            });

        Self {
            frame_layout,
            model_layout,
            textured_layout,
            physical_layout,
            augment_layout,
            camera_uniform,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            sampler: equirect_sampler(device, "Color Map Sampler"),
            blank: GpuTexture::from_image(
                device,
                queue,
                "Blank Map",
                &blank_image(),
            ),
            geometries: FxHashMap::default(),
            textures: FxHashMap::default(),
            materials: FxHashMap::default(),
            models: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Upload new geometry and textures, compile new materials and refresh
    /// the draw order.
    ///
    /// # Errors
    ///
    /// A compile hook that fails to patch its template, or a program that
    /// does not compose, fails the material's compile.
    pub fn sync_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        composer: &mut ShaderComposer,
        scene: &Scene,
        hooks: &CompileHooks,
    ) -> Result<(), EarthGlassError> {
        let dropped = overflow_count(scene.lights());
        if dropped > 0 {
            log::warn!(
                "{dropped} lights exceed the limit of {MAX_LIGHTS} and are ignored"
            );
        }

        for (_, mesh) in scene.meshes() {
            if self.geometries.contains_key(&mesh.geometry) {
                continue;
            }
            if let Some(geometry) = scene.geometry(mesh.geometry) {
                let _ = self
                    .geometries
                    .insert(mesh.geometry, upload_geometry(device, geometry));
            }
        }

        let changed = self.sync_textures(device, queue, scene);

        for (id, material) in scene.materials() {
            if let Some(gpu) = self.materials.get_mut(&id) {
                if gpu.map.is_some_and(|map| changed.contains(&map)) {
                    gpu.bind_group = material_bind_group(
                        device,
                        &self.textured_layout,
                        &gpu.params,
                        map_view(&self.textures, &self.blank, gpu.map),
                        &self.sampler,
                    );
                }
                continue;
            }
            let gpu = self.compile_material(device, composer, id, material, hooks)?;
            let _ = self.materials.insert(id, gpu);
        }

        for (id, _) in scene.meshes() {
            if self.models.contains_key(&id) {
                continue;
            }
            let buffer =
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Model Buffer {}", id.0)),
                    contents: bytemuck::bytes_of(&ModelUniform::new(
                        Mat4::IDENTITY,
                    )),
                    usage: wgpu::BufferUsages::UNIFORM
                        | wgpu::BufferUsages::COPY_DST,
                });
            let bind_group =
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Model Bind Group {}", id.0)),
                    layout: &self.model_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
            let _ = self.models.insert(id, ModelSlot { buffer, bind_group });
        }

        self.order = draw_order(scene);
        Ok(())
    }

    /// Bring each material map's GPU texture in line with its load status.
    /// Returns the ids whose GPU texture was replaced.
    fn sync_textures(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
    ) -> Vec<TextureId> {
        let mut changed = Vec::new();
        for (_, material) in scene.materials() {
            let Some(id) = material.map() else {
                continue;
            };
            let Some(texture) = scene.texture(id) else {
                log::warn!("material references unknown texture {}", id.0);
                continue;
            };
            let state = TextureState::from(&texture.status);
            if self.textures.get(&id).is_some_and(|t| t.state == state) {
                continue;
            }
            let label = format!("Texture {}", texture.source);
            let gpu = match &texture.status {
                TextureStatus::Pending => {
                    GpuTexture::from_image(device, queue, &label, &pending_image())
                }
                TextureStatus::Ready(image) => {
                    GpuTexture::from_image(device, queue, &label, image)
                }
                TextureStatus::Failed(_) => {
                    GpuTexture::from_image(device, queue, &label, &missing_image())
                }
            };
            let _ = self.textures.insert(id, UploadedTexture { state, gpu });
            changed.push(id);
        }
        changed
    }

    fn compile_material(
        &self,
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        id: MaterialId,
        material: &Material,
        hooks: &CompileHooks,
    ) -> Result<GpuMaterial, EarthGlassError> {
        let template = templates::for_material(material);
        let (sources, handle) = match hooks.get(id) {
            Some(hook) => (hook.run(&template)?, Some(hook.handle())),
            None => (template, None),
        };

        let label = format!("Material {}", id.0);
        let (vertex_path, fragment_path) = shader_paths(material);
        let vertex = composer.compose(
            device,
            &format!("{label} Vertex"),
            &sources.vertex,
            vertex_path,
        )?;
        let fragment = if vertex_path == fragment_path {
            None
        } else {
            Some(composer.compose(
                device,
                &format!("{label} Fragment"),
                &sources.fragment,
                fragment_path,
            )?)
        };

        let params =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Params")),
                contents: &material_params(material),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let phase = DrawPhase::of(material);
        let (pipeline, bind_group, augment) = match material {
            Material::Physical(_) => {
                let bind_group =
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("{label} Bind Group")),
                        layout: &self.physical_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: params.as_entire_binding(),
                        }],
                    });
                let augment = self.create_augment(
                    device,
                    &label,
                    handle.unwrap_or_default(),
                );
                let pipeline = create_mesh_pipeline(
                    device,
                    &label,
                    &vertex,
                    fragment.as_ref().unwrap_or(&vertex),
                    &[
                        &self.frame_layout,
                        &self.model_layout,
                        &self.physical_layout,
                        &self.augment_layout,
                    ],
                    MeshPipelineState::for_material(material),
                );
                (pipeline, bind_group, Some(augment))
            }
            Material::Standard(_) | Material::Basic(_) => {
                let bind_group = material_bind_group(
                    device,
                    &self.textured_layout,
                    &params,
                    map_view(&self.textures, &self.blank, material.map()),
                    &self.sampler,
                );
                let pipeline = create_mesh_pipeline(
                    device,
                    &label,
                    &vertex,
                    fragment.as_ref().unwrap_or(&vertex),
                    &[
                        &self.frame_layout,
                        &self.model_layout,
                        &self.textured_layout,
                    ],
                    MeshPipelineState::for_material(material),
                );
                (pipeline, bind_group, None)
            }
        };

        log::info!("compiled {label} ({phase:?})");
        Ok(GpuMaterial {
            pipeline,
            params,
            bind_group,
            map: material.map(),
            augment,
        })
    }

    fn create_augment(
        &self,
        device: &wgpu::Device,
        label: &str,
        handle: ShaderHandle,
    ) -> Augment {
        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Augment Buffer")),
                contents: bytemuck::bytes_of(&AugmentUniforms {
                    time: handle.time().unwrap_or(0.0),
                    _pad: [0.0; 3],
                }),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Augment Bind Group")),
            layout: &self.augment_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Augment {
            buffer,
            bind_group,
            handle,
        }
    }

    /// Write camera, lights, model matrices and program uniforms.
    pub fn update_frame(
        &mut self,
        queue: &wgpu::Queue,
        scene: &Scene,
        camera: &Camera,
    ) {
        self.camera_uniform.update_view_proj(camera);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&pack_lights(scene.lights())),
        );

        for (id, slot) in &self.models {
            if let Some(world) = scene.world_matrix(*id) {
                queue.write_buffer(
                    &slot.buffer,
                    0,
                    bytemuck::bytes_of(&ModelUniform::new(world)),
                );
            }
        }

        for augment in self.materials.values().filter_map(|m| m.augment.as_ref()) {
            if let Some(time) = augment.handle.time() {
                queue.write_buffer(
                    &augment.buffer,
                    0,
                    bytemuck::bytes_of(&AugmentUniforms {
                        time,
                        _pad: [0.0; 3],
                    }),
                );
            }
        }
    }

    /// Clear the targets and draw every mesh in phase order.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
    ) {
        let [r, g, b] = scene.background().linear();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(r),
                        g: f64::from(g),
                        b: f64::from(b),
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                },
            ),
            ..Default::default()
        });
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for id in &self.order {
            let Some(mesh) = scene.mesh(*id) else {
                continue;
            };
            let (Some(geometry), Some(material), Some(model)) = (
                self.geometries.get(&mesh.geometry),
                self.materials.get(&mesh.material),
                self.models.get(id),
            ) else {
                continue;
            };
            pass.set_pipeline(&material.pipeline);
            pass.set_bind_group(1, &model.bind_group, &[]);
            pass.set_bind_group(2, &material.bind_group, &[]);
            if let Some(augment) = &material.augment {
                pass.set_bind_group(3, &augment.bind_group, &[]);
            }
            pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            pass.set_index_buffer(
                geometry.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }
    }
}

fn upload_geometry(device: &wgpu::Device, geometry: &Geometry) -> GpuGeometry {
    let vertex_buffer =
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&interleave(geometry)),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let index_buffer =
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
    log::debug!(
        "uploaded geometry: {} vertices, {} triangles",
        geometry.vertex_count(),
        geometry.triangle_count()
    );
    GpuGeometry {
        vertex_buffer,
        index_buffer,
        index_count: geometry.indices.len() as u32,
    }
}

fn map_view<'a>(
    textures: &'a FxHashMap<TextureId, UploadedTexture>,
    blank: &'a GpuTexture,
    map: Option<TextureId>,
) -> &'a wgpu::TextureView {
    map.and_then(|id| textures.get(&id))
        .map_or(&blank.view, |t| &t.gpu.view)
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params: &wgpu::Buffer,
    map: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Textured Material Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(map),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Blend and depth state of a phase.
fn phase_state(phase: DrawPhase) -> (Option<wgpu::BlendState>, bool) {
    match phase {
        DrawPhase::Opaque => (None, true),
        DrawPhase::Additive => (
            Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Zero,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            false,
        ),
        DrawPhase::Transparent => (Some(wgpu::BlendState::ALPHA_BLENDING), true),
    }
}

/// Fixed-function state of a material's pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MeshPipelineState {
    blend: Option<wgpu::BlendState>,
    depth_write_enabled: bool,
    cull_mode: Option<wgpu::Face>,
}

impl MeshPipelineState {
    /// Every material kind is single-sided: only front faces are drawn, so
    /// one indexed draw of a closed transparent mesh blends each pixel once.
    fn for_material(material: &Material) -> Self {
        let (blend, depth_write_enabled) = phase_state(DrawPhase::of(material));
        Self {
            blend,
            depth_write_enabled,
            cull_mode: Some(wgpu::Face::Back),
        }
    }
}

/// Indexed-mesh pipeline writing the HDR color and depth targets.
fn create_mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    state: MeshPipelineState,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: state.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: state.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: state.depth_write_enabled,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RefractiveMaterialOptions;
    use crate::scene::{BasicMaterial, Mesh, PhysicalMaterial, Transform};

    fn add_mesh(scene: &mut Scene, material: Material) -> MeshId {
        let geometry = scene.add_geometry(Geometry::icosahedron(1.0, 0));
        let material = scene.add_material(material);
        scene.add_mesh(Mesh {
            name: "m".into(),
            geometry,
            material,
            parent: None,
            transform: Transform::default(),
        })
    }

    fn basic(blending: Blending) -> Material {
        Material::Basic(BasicMaterial {
            color: Color::WHITE,
            map: None,
            blending,
        })
    }

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<MeshVertex>(), 24);
        assert_eq!(size_of::<ModelUniform>(), 128);
        assert_eq!(size_of::<StandardParams>(), 32);
        assert_eq!(size_of::<BasicParams>(), 16);
        assert_eq!(size_of::<PhysicalParams>(), 48);
        assert_eq!(size_of::<AugmentUniforms>(), 16);
    }

    #[test]
    fn glass_draws_after_additive_after_opaque() {
        let mut scene = Scene::new();
        let glass = add_mesh(
            &mut scene,
            Material::Physical(PhysicalMaterial::from(
                &RefractiveMaterialOptions::default(),
            )),
        );
        let night = add_mesh(&mut scene, basic(Blending::Additive));
        let surface = add_mesh(&mut scene, basic(Blending::Normal));
        assert_eq!(draw_order(&scene), vec![surface, night, glass]);
    }

    #[test]
    fn opaque_physical_stays_in_opaque_phase() {
        let material = Material::Physical(PhysicalMaterial {
            transparent: false,
            ..PhysicalMaterial::from(&RefractiveMaterialOptions::default())
        });
        assert_eq!(DrawPhase::of(&material), DrawPhase::Opaque);
    }

    #[test]
    fn additive_phase_keeps_depth_read_only() {
        let (blend, depth_write) = phase_state(DrawPhase::Additive);
        assert!(!depth_write);
        let blend = blend.unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(phase_state(DrawPhase::Opaque), (None, true));
    }

    #[test]
    fn glass_pipeline_is_front_side_only() {
        let glass = Material::Physical(PhysicalMaterial::from(
            &RefractiveMaterialOptions::default(),
        ));
        let state = MeshPipelineState::for_material(&glass);
        assert_eq!(state.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(state.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert!(state.depth_write_enabled);

        let night = MeshPipelineState::for_material(&basic(Blending::Additive));
        assert_eq!(night.cull_mode, Some(wgpu::Face::Back));
        assert!(!night.depth_write_enabled);
    }

    #[test]
    fn transparent_glass_carries_opacity_in_alpha() {
        let options = RefractiveMaterialOptions::default();
        let bytes = material_params(&Material::Physical(PhysicalMaterial::from(
            &options,
        )));
        let params: PhysicalParams = bytemuck::pod_read_unaligned(&bytes);
        assert_eq!(params.color[3], options.opacity);
        assert_eq!(params.ior, options.ior);
    }

    #[test]
    fn refraction_ratio_is_not_uploaded() {
        let options = RefractiveMaterialOptions::default();
        let base = PhysicalMaterial::from(&options);
        let bent = PhysicalMaterial {
            refraction_ratio: 0.5,
            ..base.clone()
        };
        assert_eq!(
            material_params(&Material::Physical(base)),
            material_params(&Material::Physical(bent))
        );
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let world = Mat4::from_scale(glam::Vec3::new(2.0, 1.0, 1.0));
        let uniform = ModelUniform::new(world);
        let normal = Mat4::from_cols_array_2d(&uniform.normal);
        let n = normal.transform_vector3(glam::Vec3::X);
        assert!((n.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn interleave_pairs_positions_with_normals() {
        let geometry = Geometry::icosahedron(2.0, 0);
        let vertices = interleave(&geometry);
        assert_eq!(vertices.len(), geometry.vertex_count());
        let v = vertices[0];
        for i in 0..3 {
            assert!((v.position[i] - 2.0 * v.normal[i]).abs() < 1e-6);
        }
    }
}
