//! GPU resource wrappers that can be real or mock.
//!
//! Users hold owned handles; wgpu resources are reference counted internally
//! so cloning is cheap. Textures and shader modules carry a process-unique,
//! non-zero id so they can be compared and used as cache keys whether they
//! are real or mock.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique, non-zero resource id.
pub fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Wrapper around a GPU buffer that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock { id: usize, size: u64 },
}

impl GpuBuffer {
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            inner: GpuBufferInner::Real(buffer),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: u64) -> Self {
        Self {
            inner: GpuBufferInner::Mock { id, size },
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer.size(),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { size, .. } => *size,
        }
    }

    /// Get the underlying wgpu::Buffer.
    ///
    /// # Panics
    /// Panics if this is a mock buffer.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer,
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Buffer from mock buffer")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock { .. })
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuBufferInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Wrapper around a GPU texture that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    id: u64,
    inner: GpuTextureInner,
}

#[derive(Clone, Debug)]
enum GpuTextureInner {
    Real(wgpu::Texture),
    #[cfg(feature = "mock")]
    Mock {
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },
}

impl GpuTexture {
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        Self {
            id: next_resource_id(),
            inner: GpuTextureInner::Real(texture),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            id: next_resource_id(),
            inner: GpuTextureInner::Mock {
                width,
                height,
                format,
            },
        }
    }

    /// Process-unique, non-zero id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.width(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.height(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { height, .. } => *height,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.format(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { format, .. } => *format,
        }
    }

    /// Get the underlying wgpu::Texture.
    ///
    /// # Panics
    /// Panics if this is a mock texture.
    pub fn as_wgpu(&self) -> &wgpu::Texture {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture,
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Texture from mock texture")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuTextureInner::Mock { .. })
    }
}

/// Wrapper around a GPU shader module that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuShaderModule {
    id: u64,
    inner: GpuShaderModuleInner,
}

#[derive(Clone, Debug)]
enum GpuShaderModuleInner {
    Real(wgpu::ShaderModule),
    #[cfg(feature = "mock")]
    Mock,
}

impl GpuShaderModule {
    pub fn from_wgpu(module: wgpu::ShaderModule) -> Self {
        Self {
            id: next_resource_id(),
            inner: GpuShaderModuleInner::Real(module),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock() -> Self {
        Self {
            id: next_resource_id(),
            inner: GpuShaderModuleInner::Mock,
        }
    }

    /// Process-unique, non-zero id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the underlying wgpu::ShaderModule.
    ///
    /// # Panics
    /// Panics if this is a mock shader module.
    pub fn as_wgpu(&self) -> &wgpu::ShaderModule {
        match &self.inner {
            GpuShaderModuleInner::Real(module) => module,
            #[cfg(feature = "mock")]
            GpuShaderModuleInner::Mock => {
                panic!("Attempted to get wgpu::ShaderModule from mock")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuShaderModuleInner::Mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_ids_are_unique_and_non_zero() {
        let a = next_resource_id();
        let b = next_resource_id();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    #[cfg(feature = "mock")]
    fn mock_texture_reports_dimensions() {
        let texture = GpuTexture::mock(64, 32, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert!(texture.is_mock());
        assert_eq!((texture.width(), texture.height()), (64, 32));
        assert_ne!(texture.id(), 0);
    }
}
