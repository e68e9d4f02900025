//! Scene graph: lights, transform groups, meshes and the resources they
//! reference.
//!
//! Storage is flat and append-only; every resource is addressed by a typed
//! index. Meshes may hang off a [`Group`], whose transform is applied on top
//! of the mesh's own.

pub mod assembler;
mod color;
mod geometry;
mod light;
mod material;

pub use color::{Color, ParseColorError};
pub use geometry::Geometry;
use glam::{EulerRot, Mat4, Quat, Vec3};
pub use light::{Light, LightKind, SPOT_ANGLE};
pub use material::{
    BasicMaterial, Blending, Material, PhysicalMaterial, StandardMaterial,
};

use crate::texture::{Texture, TextureLoadError, TextureSource, TextureStatus};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);
    };
}

id_type!(
    /// Index of a [`Light`] in the scene.
    LightId
);
id_type!(
    /// Index of a [`Group`] in the scene.
    GroupId
);
id_type!(
    /// Index of a [`Mesh`] in the scene.
    MeshId
);
id_type!(
    /// Index of a [`Geometry`] in the scene.
    GeometryId
);
id_type!(
    /// Index of a [`Material`] in the scene.
    MaterialId
);
id_type!(
    /// Index of a [`Texture`] in the scene.
    TextureId
);

/// Translation, Euler rotation (XYZ order, radians) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Euler angles applied in X, Y, Z order.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform rotated about Z.
    #[must_use]
    pub fn rotated_z(angle: f32) -> Self {
        Self {
            rotation: Vec3::new(0.0, 0.0, angle),
            ..Self::default()
        }
    }

    /// Local-to-parent matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(
            self.scale,
            rotation,
            self.position,
        )
    }
}

/// A parent transform for meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Debug name.
    pub name: String,
    /// Group transform.
    pub transform: Transform,
}

/// A drawable: one geometry, one material, an optional parent group.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Debug name.
    pub name: String,
    /// Shape.
    pub geometry: GeometryId,
    /// Surface.
    pub material: MaterialId,
    /// Parent transform, if any.
    pub parent: Option<GroupId>,
    /// Local transform.
    pub transform: Transform,
}

/// The scene graph.
#[derive(Debug)]
pub struct Scene {
    background: Color,
    lights: Vec<Light>,
    groups: Vec<Group>,
    meshes: Vec<Mesh>,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    /// Bumped whenever resources are added or a texture resolves.
    generation: u64,
    /// Generation that was last consumed by the renderer.
    rendered_generation: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene on a black background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            lights: Vec::new(),
            groups: Vec::new(),
            meshes: Vec::new(),
            geometries: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            generation: 0,
            rendered_generation: 0,
        }
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Whether resources changed since the last `mark_rendered()`.
    /// Transform edits do not count; they are re-read every frame.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.generation != self.rendered_generation
    }

    /// Mark the current generation as consumed by the renderer.
    pub fn mark_rendered(&mut self) {
        self.rendered_generation = self.generation;
    }

    /// Clear color.
    #[must_use]
    pub fn background(&self) -> Color {
        self.background
    }

    /// Set the clear color.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    // -- Lights --

    /// Attach a light.
    pub fn add_light(&mut self, light: Light) -> LightId {
        self.lights.push(light);
        self.invalidate();
        LightId(self.lights.len() - 1)
    }

    /// All attached lights, in insertion order.
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    // -- Groups --

    /// Add a transform group.
    pub fn add_group(&mut self, group: Group) -> GroupId {
        self.groups.push(group);
        self.invalidate();
        GroupId(self.groups.len() - 1)
    }

    /// Look up a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    // -- Resources --

    /// Store a geometry for meshes to share.
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        self.invalidate();
        GeometryId(self.geometries.len() - 1)
    }

    /// Look up a geometry.
    #[must_use]
    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    /// Store a material.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.invalidate();
        MaterialId(self.materials.len() - 1)
    }

    /// Look up a material.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// All materials with their ids.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    /// Register a texture source; it starts out pending.
    pub fn add_texture(&mut self, source: TextureSource) -> TextureId {
        self.textures.push(Texture::pending(source));
        self.invalidate();
        TextureId(self.textures.len() - 1)
    }

    /// Look up a texture.
    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    /// Record the outcome of a texture load. Failures are logged and keep
    /// the scene usable; the renderer shows a "missing" pattern instead.
    pub fn resolve_texture(
        &mut self,
        id: TextureId,
        result: Result<image::RgbaImage, TextureLoadError>,
    ) {
        let Some(texture) = self.textures.get_mut(id.0) else {
            log::warn!("texture result for unknown id {id:?}");
            return;
        };
        texture.status = match result {
            Ok(image) => {
                log::info!(
                    "texture {} ready ({}x{})",
                    texture.source,
                    image.width(),
                    image.height()
                );
                TextureStatus::Ready(image.into())
            }
            Err(e) => {
                log::warn!("texture {} failed: {e}", texture.source);
                TextureStatus::Failed(e.to_string())
            }
        };
        self.invalidate();
    }

    // -- Meshes --

    /// Attach a mesh.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        self.invalidate();
        MeshId(self.meshes.len() - 1)
    }

    /// Look up a mesh.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    /// Mutable access to a mesh, for per-frame transform updates.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    /// All meshes with their ids.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    /// Mesh-to-world matrix, including the parent group.
    #[must_use]
    pub fn world_matrix(&self, id: MeshId) -> Option<Mat4> {
        let mesh = self.mesh(id)?;
        let local = mesh.transform.matrix();
        let parent = mesh
            .parent
            .and_then(|g| self.group(g))
            .map_or(Mat4::IDENTITY, |g| g.transform.matrix());
        Some(parent * local)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn scene_with_child(group_rotation: f32) -> (Scene, MeshId) {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::icosahedron(1.0, 0));
        let material = scene.add_material(Material::Basic(BasicMaterial {
            color: Color::WHITE,
            map: None,
            blending: Blending::Normal,
        }));
        let group = scene.add_group(Group {
            name: "g".into(),
            transform: Transform::rotated_z(group_rotation),
        });
        let mesh = scene.add_mesh(Mesh {
            name: "m".into(),
            geometry,
            material,
            parent: Some(group),
            transform: Transform {
                position: Vec3::X,
                ..Transform::default()
            },
        });
        (scene, mesh)
    }

    #[test]
    fn world_matrix_applies_parent_group() {
        let (scene, mesh) = scene_with_child(FRAC_PI_2);
        let world = scene.world_matrix(mesh).unwrap();
        let p = world.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::Y).length() < 1e-6, "{p}");
    }

    #[test]
    fn adding_resources_marks_dirty() {
        let (mut scene, mesh) = scene_with_child(0.0);
        assert!(scene.is_dirty());
        scene.mark_rendered();
        assert!(!scene.is_dirty());

        // Transform edits are per-frame data, not resource changes
        scene.mesh_mut(mesh).unwrap().transform.rotation.y += 0.1;
        assert!(!scene.is_dirty());

        let _ = scene.add_texture(TextureSource::Path("a.png".into()));
        assert!(scene.is_dirty());
    }

    #[test]
    fn texture_failure_is_recorded_not_fatal() {
        let mut scene = Scene::new();
        let id = scene.add_texture(TextureSource::Path("missing.png".into()));
        scene.resolve_texture(
            id,
            Err(TextureLoadError::Unsupported("no http".into())),
        );
        assert!(matches!(
            scene.texture(id).unwrap().status,
            TextureStatus::Failed(_)
        ));
    }
}
