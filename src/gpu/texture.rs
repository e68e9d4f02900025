//! Sampled color textures and their placeholders.

use image::{imageops, Rgba, RgbaImage};

/// Side length, in cells, of the "missing texture" checkerboard.
const CHECKER_CELLS: u32 = 8;
/// Pixels per checker cell.
const CHECKER_CELL_SIZE: u32 = 8;
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Neutral map for materials without a color texture.
#[must_use]
pub fn blank_image() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, WHITE)
}

/// Image sampled while a texture is still loading.
#[must_use]
pub fn pending_image() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, BLACK)
}

/// Magenta/black checkerboard sampled when a texture failed to load.
#[must_use]
pub fn missing_image() -> RgbaImage {
    let side = CHECKER_CELLS * CHECKER_CELL_SIZE;
    RgbaImage::from_fn(side, side, |x, y| {
        if (x / CHECKER_CELL_SIZE + y / CHECKER_CELL_SIZE) % 2 == 0 {
            MAGENTA
        } else {
            BLACK
        }
    })
}

/// An sRGB color texture on the GPU.
pub struct GpuTexture {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Upload `image`, downscaling it first if it exceeds the device's 2D
    /// texture limit.
    #[must_use]
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &RgbaImage,
    ) -> Self {
        let max = device.limits().max_texture_dimension_2d;
        let scaled;
        let image = if image.width() > max || image.height() > max {
            let (w, h) = fit_within(image.width(), image.height(), max);
            log::warn!(
                "{label}: {}x{} exceeds the {max}px limit, scaling to {w}x{h}",
                image.width(),
                image.height()
            );
            scaled = imageops::resize(image, w, h, imageops::FilterType::Triangle);
            &scaled
        } else {
            image
        };

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Largest size with the same aspect ratio whose sides are at most `max`.
fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = max as f32 / width.max(height) as f32;
    let fit = |side: u32| ((side as f32 * scale).round() as u32).clamp(1, max);
    (fit(width), fit(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_placeholder_is_a_black_pixel() {
        let image = pending_image();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(*image.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn missing_placeholder_alternates_cells() {
        let image = missing_image();
        assert_eq!(*image.get_pixel(0, 0), MAGENTA);
        assert_eq!(*image.get_pixel(CHECKER_CELL_SIZE, 0), BLACK);
        assert_eq!(*image.get_pixel(CHECKER_CELL_SIZE, CHECKER_CELL_SIZE), MAGENTA);
    }

    #[test]
    fn oversized_images_keep_aspect() {
        assert_eq!(fit_within(16_384, 8_192, 8_192), (8_192, 4_096));
        assert_eq!(fit_within(100, 20_000, 8_192), (41, 8_192));
    }
}
