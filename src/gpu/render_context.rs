//! Window surface, device and queue.

use std::fmt;

/// Why the GPU could not be brought up for a window.
#[derive(Debug)]
pub enum GpuInitError {
    /// The window handle could not back a surface.
    Surface(wgpu::CreateSurfaceError),
    /// No adapter can present to the surface.
    Adapter(wgpu::RequestAdapterError),
    /// The adapter refused the device request.
    Device(wgpu::RequestDeviceError),
    /// The adapter offers no configuration for this surface.
    SurfaceConfig,
}

impl fmt::Display for GpuInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(e) => write!(f, "cannot create window surface: {e}"),
            Self::Adapter(e) => write!(f, "no adapter for this surface: {e}"),
            Self::Device(e) => write!(f, "device request refused: {e}"),
            Self::SurfaceConfig => {
                f.write_str("adapter has no configuration for this surface")
            }
        }
    }
}

impl std::error::Error for GpuInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(e) => Some(e),
            Self::Adapter(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::SurfaceConfig => None,
        }
    }
}

/// Device, queue and the configured window surface.
pub struct RenderContext {
    /// Logical device.
    pub device: wgpu::Device,
    /// Command queue.
    pub queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl RenderContext {
    /// Bring up a device that can present to `window` at `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GpuInitError`] naming the step that failed.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(GpuInitError::Surface)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(GpuInitError::Adapter)?;
        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("earthglass device"),
                ..Default::default()
            })
            .await
            .map_err(GpuInitError::Device)?;

        let mut config = surface
            .get_default_config(&adapter, size.0.max(1), size.1.max(1))
            .ok_or(GpuInitError::SurfaceConfig)?;
        config.format = preferred_format(
            &surface.get_capabilities(&adapter).formats,
            config.format,
        );
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);
        log::debug!(
            "surface {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    /// Surface texture format.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Follow a window resize. Zero or unchanged sizes are ignored; returns
    /// whether the surface was reconfigured.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        true
    }

    /// Re-apply the current configuration, after the surface was lost or
    /// became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Next swapchain image.
    ///
    /// # Errors
    ///
    /// Passes through [`wgpu::SurfaceError`].
    pub fn get_next_frame(
        &self,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    /// Fresh command encoder.
    #[must_use]
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
    }

    /// Finish and submit `encoder`.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// First sRGB format the surface supports, else `fallback`.
fn preferred_format(
    supported: &[wgpu::TextureFormat],
    fallback: wgpu::TextureFormat,
) -> wgpu::TextureFormat {
    supported
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_srgb_surface_formats() {
        let supported = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(
            preferred_format(&supported, wgpu::TextureFormat::Bgra8Unorm),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
        assert_eq!(
            preferred_format(&supported[..1], wgpu::TextureFormat::Bgra8Unorm),
            wgpu::TextureFormat::Bgra8Unorm
        );
    }
}
