//! The glass displacement patch.
//!
//! Four WGSL snippets are spliced into the physical material templates:
//! noise + displacement helpers and the time uniform at module scope of the
//! vertex stage, the displacement itself inside `vs_main`, a
//! derivative-based normal perturbation helper at module scope of the
//! fragment stage, and its call inside `fs_main`. The "main" snippets call
//! symbols declared by the "pars" snippets, so pars must go in first.

use rustc_hash::FxHashMap;

use super::augment::{
    apply_augmentations, ShaderAugmentation, ShaderPatchError, ShaderSources,
    ShaderStage,
};
use super::{templates, ShaderHandle};
use crate::scene::{MaterialId, Scene};

/// Module-scope insertion point of the vertex template.
pub const VERTEX_PARS_ANCHOR: &str = "// #include <displacementmap_pars_vertex>";
/// Insertion point inside the vertex entry point, after `transformed` is set.
pub const VERTEX_MAIN_ANCHOR: &str = "// #include <displacementmap_vertex>";
/// Module-scope insertion point of the fragment template.
pub const FRAGMENT_PARS_ANCHOR: &str = "// #include <bumpmap_pars_fragment>";
/// Insertion point inside the fragment entry point, after `normal` is set.
pub const FRAGMENT_MAIN_ANCHOR: &str = "// #include <normal_fragment_maps>";

const VERTEX_PARS: &str =
    include_str!("../../assets/shaders/augment/vertex_pars.wgsl");
const VERTEX_MAIN: &str =
    include_str!("../../assets/shaders/augment/vertex_main.wgsl");
const FRAGMENT_PARS: &str =
    include_str!("../../assets/shaders/augment/fragment_pars.wgsl");
const FRAGMENT_MAIN: &str =
    include_str!("../../assets/shaders/augment/fragment_main.wgsl");

/// An ordered list of augmentations applied to a material program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPatch {
    augmentations: Vec<ShaderAugmentation>,
}

impl ShaderPatch {
    /// Patch from explicit augmentations, applied in the given order.
    #[must_use]
    pub fn new(augmentations: Vec<ShaderAugmentation>) -> Self {
        Self { augmentations }
    }

    /// Time-animated surface displacement of the glass body.
    #[must_use]
    pub fn glass_displacement() -> Self {
        Self::new(vec![
            ShaderAugmentation {
                stage: ShaderStage::Vertex,
                anchor: VERTEX_PARS_ANCHOR,
                injected_source: VERTEX_PARS,
            },
            ShaderAugmentation {
                stage: ShaderStage::Vertex,
                anchor: VERTEX_MAIN_ANCHOR,
                injected_source: VERTEX_MAIN,
            },
            ShaderAugmentation {
                stage: ShaderStage::Fragment,
                anchor: FRAGMENT_PARS_ANCHOR,
                injected_source: FRAGMENT_PARS,
            },
            ShaderAugmentation {
                stage: ShaderStage::Fragment,
                anchor: FRAGMENT_MAIN_ANCHOR,
                injected_source: FRAGMENT_MAIN,
            },
        ])
    }

    /// The augmentations, in application order.
    #[must_use]
    pub fn augmentations(&self) -> &[ShaderAugmentation] {
        &self.augmentations
    }

    /// Apply every augmentation or fail.
    pub fn apply(
        &self,
        sources: &ShaderSources,
    ) -> Result<ShaderSources, ShaderPatchError> {
        let (patched, status) =
            apply_augmentations(sources, &self.augmentations);
        status.map(|()| patched)
    }
}

/// A registered pre-compile hook: the patch plus the handle given back to
/// whoever registered it.
#[derive(Debug, Clone)]
pub struct CompileHook {
    patch: ShaderPatch,
    handle: ShaderHandle,
}

impl CompileHook {
    /// Pair a patch with a fresh, uncompiled handle.
    #[must_use]
    pub fn new(patch: ShaderPatch) -> Self {
        Self {
            patch,
            handle: ShaderHandle::new(),
        }
    }

    /// The handle shared with the registrant.
    #[must_use]
    pub fn handle(&self) -> ShaderHandle {
        self.handle.clone()
    }

    /// Dry-run the patch against a template so anchor drift fails at
    /// registration rather than on the first frame.
    pub fn check(
        &self,
        template: &ShaderSources,
    ) -> Result<(), ShaderPatchError> {
        self.patch.apply(template).map(|_| ())
    }

    /// Run the hook for a compile of `template`. Marks the handle compiled
    /// on success; the handle is untouched on failure.
    pub fn run(
        &self,
        template: &ShaderSources,
    ) -> Result<ShaderSources, ShaderPatchError> {
        let patched = self.patch.apply(template)?;
        if self.handle.mark_compiled() {
            log::debug!(
                "material program compiled with {} augmentations",
                self.patch.augmentations().len()
            );
        } else {
            log::debug!("material program recompiled; keeping uniforms");
        }
        Ok(patched)
    }
}

/// Compile hooks keyed by material.
#[derive(Debug, Default)]
pub struct CompileHooks {
    hooks: FxHashMap<MaterialId, CompileHook>,
}

impl CompileHooks {
    /// Register `patch` for `material`, dry-running it against the
    /// material's template first. Re-registering replaces the earlier hook.
    pub fn register(
        &mut self,
        scene: &Scene,
        material: MaterialId,
        patch: ShaderPatch,
    ) -> Result<ShaderHandle, ShaderPatchError> {
        let template = scene
            .material(material)
            .map(templates::for_material)
            .ok_or(ShaderPatchError::UnknownMaterial(material))?;
        let hook = CompileHook::new(patch);
        if let Err(e) = hook.check(&template) {
            log::error!("rejecting shader patch for material {}: {e}", material.0);
            return Err(e);
        }
        let handle = hook.handle();
        if self.hooks.insert(material, hook).is_some() {
            log::warn!("replaced compile hook of material {}", material.0);
        }
        Ok(handle)
    }

    /// Hook registered for `material`, if any.
    #[must_use]
    pub fn get(&self, material: MaterialId) -> Option<&CompileHook> {
        self.hooks.get(&material)
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RefractiveMaterialOptions;
    use crate::scene::{BasicMaterial, Blending, Color, Material};
    use crate::shader::templates::physical as physical_template;

    #[test]
    fn templates_contain_every_anchor_exactly_once() {
        let template = physical_template();
        for aug in ShaderPatch::glass_displacement().augmentations() {
            let source = template.stage(aug.stage);
            assert_eq!(
                source.matches(aug.anchor).count(),
                1,
                "{} anchor {}",
                aug.stage,
                aug.anchor
            );
        }
    }

    #[test]
    fn glass_patch_grows_each_stage_by_its_snippets() {
        let template = physical_template();
        let patched =
            ShaderPatch::glass_displacement().apply(&template).unwrap();
        assert_eq!(
            patched.vertex.len(),
            template.vertex.len() + VERTEX_PARS.len() + VERTEX_MAIN.len()
        );
        assert_eq!(
            patched.fragment.len(),
            template.fragment.len() + FRAGMENT_PARS.len() + FRAGMENT_MAIN.len()
        );
        for anchor in [VERTEX_PARS_ANCHOR, VERTEX_MAIN_ANCHOR] {
            assert!(patched.vertex.contains(anchor));
        }
        for anchor in [FRAGMENT_PARS_ANCHOR, FRAGMENT_MAIN_ANCHOR] {
            assert!(patched.fragment.contains(anchor));
        }
    }

    #[test]
    fn main_snippets_land_after_their_pars() {
        let patched = ShaderPatch::glass_displacement()
            .apply(&physical_template())
            .unwrap();
        let decl = patched.vertex.find("fn glass_displacement").unwrap();
        let call = patched.vertex.find("glass_displacement(object_normal)").unwrap();
        assert!(decl < call);
        let decl = patched.fragment.find("fn perturb_normal_arb").unwrap();
        let call = patched.fragment.find("perturb_normal_arb(in.").unwrap();
        assert!(decl < call);
    }

    #[test]
    fn hook_compiles_handle_once() {
        let hook = CompileHook::new(ShaderPatch::glass_displacement());
        let handle = hook.handle();
        let template = physical_template();
        hook.check(&template).unwrap();
        assert!(!handle.is_compiled());

        let _ = hook.run(&template).unwrap();
        assert!(handle.is_compiled());
        assert!(handle.set_time(1.0));
        let _ = hook.run(&template).unwrap();
        assert_eq!(handle.time(), Some(1.0));
    }

    #[test]
    fn renamed_chunk_fails_loudly_and_stays_uncompiled() {
        let hook = CompileHook::new(ShaderPatch::glass_displacement());
        let mut template = physical_template();
        template.fragment = template
            .fragment
            .replace(FRAGMENT_MAIN_ANCHOR, "// #include <normalmap_fragment>");
        let err = hook.run(&template).unwrap_err();
        assert_eq!(
            err,
            ShaderPatchError::AnchorNotFound {
                stage: ShaderStage::Fragment,
                anchor: FRAGMENT_MAIN_ANCHOR,
            }
        );
        assert!(!hook.handle().is_compiled());
    }

    #[test]
    fn registry_rejects_unpatchable_materials() {
        let mut scene = Scene::new();
        let glass = scene.add_material(Material::Physical(
            (&RefractiveMaterialOptions::default()).into(),
        ));
        let plain = scene.add_material(Material::Basic(BasicMaterial {
            color: Color::WHITE,
            map: None,
            blending: Blending::Additive,
        }));
        let mut hooks = CompileHooks::default();

        let handle = hooks
            .register(&scene, glass, ShaderPatch::glass_displacement())
            .unwrap();
        assert!(!handle.is_compiled());
        assert!(hooks.get(glass).is_some());

        // The unlit template has no displacement anchors
        assert!(matches!(
            hooks.register(&scene, plain, ShaderPatch::glass_displacement()),
            Err(ShaderPatchError::AnchorNotFound { .. })
        ));
        assert!(matches!(
            hooks.register(
                &scene,
                MaterialId(99),
                ShaderPatch::glass_displacement()
            ),
            Err(ShaderPatchError::UnknownMaterial(MaterialId(99)))
        ));
        assert_eq!(hooks.len(), 1);
    }
}
