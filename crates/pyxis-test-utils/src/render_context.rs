//! Trait abstracting GPU operations.
//!
//! Resource creation mirrors wgpu descriptors. Drawing follows a bind-then-draw
//! model: callers set raster state, bind a shader with its uniform buffer,
//! bind textures and vertex/index buffers, then issue a draw. Implementations
//! keep the bound state until it is replaced.

use crate::gpu_types::*;
use std::ops::Range;
use wgpu::{BufferDescriptor, ShaderModuleDescriptor, TextureDescriptor};

/// Number of texture units a shader can sample from.
pub const TEXTURE_SLOTS: u32 = 2;

/// Fixed-function state applied to subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterState {
    /// `None` writes source colors unblended.
    pub blend: Option<wgpu::BlendState>,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull_mode: Option<wgpu::Face>,
}

impl RasterState {
    /// Depth off, culling off, with the given blending.
    pub const fn overlay(blend: Option<wgpu::BlendState>) -> Self {
        Self {
            blend,
            depth_test: false,
            depth_write: false,
            cull_mode: None,
        }
    }

    /// Depth test and write on, back faces culled, no blending.
    pub const fn opaque_3d() -> Self {
        Self {
            blend: None,
            depth_test: true,
            depth_write: true,
            cull_mode: Some(wgpu::Face::Back),
        }
    }
}

/// Trait abstracting GPU resource creation and draw submission.
///
/// Methods take `&self` and return owned wrapper types, so a context can be
/// shared behind an `Arc<dyn RenderContext>` and mocks can record through
/// interior mutability.
///
/// # Example
///
/// ```rust,no_run
/// use pyxis_test_utils::RenderContext;
/// use wgpu::{BufferDescriptor, BufferUsages, IndexFormat, PrimitiveTopology};
///
/// fn draw_triangle(ctx: &dyn RenderContext, vertices: &[u8], indices: &[u8]) {
///     let vb = ctx.create_buffer(&BufferDescriptor {
///         label: None,
///         size: vertices.len() as u64,
///         usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     });
///     let ib = ctx.create_buffer(&BufferDescriptor {
///         label: None,
///         size: indices.len() as u64,
///         usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     });
///     ctx.write_buffer(&vb, 0, vertices);
///     ctx.write_buffer(&ib, 0, indices);
///     ctx.bind_vertex_buffer(&vb, 12, &[]);
///     ctx.bind_index_buffer(&ib, IndexFormat::Uint16);
///     ctx.draw_indexed(PrimitiveTopology::TriangleList, 0..3);
/// }
/// ```
pub trait RenderContext: Send + Sync {
    // Buffers

    /// Create a GPU buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Upload `data` into `buffer` starting at `offset`.
    ///
    /// `offset` and `data.len()` must be multiples of
    /// [`wgpu::COPY_BUFFER_ALIGNMENT`].
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Release the buffer's GPU memory. The handle must not be used afterwards.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    // Textures

    /// Create a GPU texture.
    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture;

    /// Replace the full contents of mip level 0 with tightly packed texels.
    fn write_texture(&self, texture: &GpuTexture, data: &[u8]);

    // Shaders

    /// Create a shader module from source code.
    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule;

    // Bound state

    /// Set blending, depth and culling for subsequent draws.
    fn set_raster_state(&self, state: &RasterState);

    /// Bind `texture` to unit `slot`, or unbind it with `None`.
    ///
    /// `slot` must be below [`TEXTURE_SLOTS`].
    fn bind_texture(&self, slot: u32, texture: Option<&GpuTexture>);

    /// Make `shader` current, reading its uniforms from `uniforms`.
    fn use_shader(&self, shader: &GpuShaderModule, uniforms: &GpuBuffer);

    /// Bind the vertex buffer together with its attribute layout.
    fn bind_vertex_buffer(
        &self,
        buffer: &GpuBuffer,
        stride: u64,
        attributes: &[wgpu::VertexAttribute],
    );

    /// Bind the index buffer used by [`RenderContext::draw_indexed`].
    fn bind_index_buffer(&self, buffer: &GpuBuffer, format: wgpu::IndexFormat);

    // Submission

    /// Draw `vertices` from the bound vertex buffer.
    fn draw(&self, topology: wgpu::PrimitiveTopology, vertices: Range<u32>);

    /// Draw `indices` from the bound index buffer.
    fn draw_indexed(&self, topology: wgpu::PrimitiveTopology, indices: Range<u32>);

    /// Clear the current render target to `color`.
    fn clear(&self, color: wgpu::Color);
}
