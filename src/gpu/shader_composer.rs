use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, ComposerError, NagaModuleDescriptor,
    ShaderLanguage, ShaderType,
};

use crate::error::EarthGlassError;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Consuming shaders
/// use `#import earthglass::module_name::{..}` to pull in shared code. The
/// composer produces `naga::Module` IR directly, skipping WGSL re-parse at
/// runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition.
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

/// Shared modules in dependency order.
const MODULES: &[ModuleDef] = &[
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/fullscreen.wgsl"),
        file_path: "modules/fullscreen.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/camera.wgsl"),
        file_path: "modules/camera.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/lighting.wgsl"),
        file_path: "modules/lighting.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/mesh_io.wgsl"),
        file_path: "modules/mesh_io.wgsl",
    },
];

impl ShaderComposer {
    /// Composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// Returns [`EarthGlassError::ShaderCompose`] if a shared module fails
    /// to parse.
    pub fn new() -> Result<Self, EarthGlassError> {
        let mut composer = Composer::default();
        for m in MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| compose_error(m.file_path, &e))?;
        }
        Ok(Self { composer })
    }

    /// Compose a shader source string (which may contain `#import`
    /// directives) into a `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Errors
    ///
    /// Returns [`EarthGlassError::ShaderCompose`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
    ) -> Result<wgpu::ShaderModule, EarthGlassError> {
        let naga_module = self.compose_naga(source, file_path)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader source into a `naga::Module` without creating a wgpu
    /// shader module. Useful for testing shader composition without a GPU
    /// device.
    ///
    /// # Errors
    ///
    /// Returns [`EarthGlassError::ShaderCompose`] if composition fails.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, EarthGlassError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| compose_error(file_path, &e))
    }
}

fn compose_error(file_path: &str, e: &ComposerError) -> EarthGlassError {
    log::error!("failed to compose shader '{file_path}': {e}");
    EarthGlassError::ShaderCompose(format!("{file_path}: {e}"))
}
