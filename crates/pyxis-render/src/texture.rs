use pyxis_core::geometry::Size;
use pyxis_test_utils::{GpuTexture, RenderContext};
use std::fmt;

/// Format used for textures created through [`Texture::new`].
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Opaque, process-unique, non-zero texture identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// A sampled 2D texture.
///
/// Cloning is cheap and clones compare equal: equality is by handle, so two
/// textures with identical pixels are still different batch states.
#[derive(Clone)]
pub struct Texture {
    handle: TextureHandle,
    gpu: GpuTexture,
}

impl Texture {
    /// Create an uninitialized RGBA texture.
    pub fn new(context: &dyn RenderContext, label: &str, width: u32, height: u32) -> Self {
        let gpu = context.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self::from_gpu(gpu)
    }

    /// Create a texture and upload tightly packed RGBA8 texels.
    ///
    /// # Panics
    /// Panics if `pixels` is not exactly `width * height * 4` bytes.
    pub fn from_rgba8(
        context: &dyn RenderContext,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "texture '{}' expects {}x{} RGBA8 texels",
            label,
            width,
            height
        );
        let texture = Self::new(context, label, width, height);
        context.write_texture(&texture.gpu, pixels);
        texture
    }

    /// Wrap an existing GPU texture.
    pub fn from_gpu(gpu: GpuTexture) -> Self {
        Self {
            handle: TextureHandle(gpu.id()),
            gpu,
        }
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    pub fn width(&self) -> u32 {
        self.gpu.width()
    }

    pub fn height(&self) -> u32 {
        self.gpu.height()
    }

    pub fn size(&self) -> Size<u32> {
        Size::new(self.width(), self.height())
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Texture {}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyxis_test_utils::{MockRenderContext, RenderCall};

    #[test]
    fn equality_is_by_handle() {
        let mock = MockRenderContext::new();
        let a = Texture::new(&mock, "a", 4, 4);
        let b = Texture::new(&mock, "b", 4, 4);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.handle().get(), 0);
    }

    #[test]
    fn from_rgba8_uploads_texels() {
        let mock = MockRenderContext::new();
        let texture = Texture::from_rgba8(&mock, "white", 2, 2, &[255; 16]);

        assert_eq!(texture.size(), Size::new(2, 2));
        assert!(mock.calls().contains(&RenderCall::WriteTexture {
            texture_id: texture.handle().get(),
            size: 16,
        }));
    }

    #[test]
    #[should_panic(expected = "expects 2x2 RGBA8 texels")]
    fn from_rgba8_rejects_wrong_length() {
        let mock = MockRenderContext::new();
        Texture::from_rgba8(&mock, "bad", 2, 2, &[0; 4]);
    }
}
