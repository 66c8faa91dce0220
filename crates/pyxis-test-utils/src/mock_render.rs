//! Mock implementation of RenderContext for testing.
//!
//! Records every call, mirrors buffer contents on the CPU and tracks the
//! currently bound state, so a test can inspect what each draw would have
//! rendered with.

use crate::{
    gpu_types::*,
    render_context::{RasterState, RenderContext, TEXTURE_SLOTS},
};
use parking_lot::Mutex;
use std::ops::Range;
use wgpu::*;

/// Records a GPU operation call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateBuffer {
        buffer_id: usize,
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        size: usize,
    },
    DestroyBuffer {
        buffer_id: usize,
    },
    CreateTexture {
        texture_id: u64,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    WriteTexture {
        texture_id: u64,
        size: usize,
    },
    CreateShaderModule {
        shader_id: u64,
        label: Option<String>,
    },
    SetRasterState(RasterState),
    BindTexture {
        slot: u32,
        texture_id: Option<u64>,
    },
    UseShader {
        shader_id: u64,
        uniform_buffer_id: usize,
    },
    BindVertexBuffer {
        buffer_id: usize,
        stride: u64,
        attributes: Vec<VertexAttribute>,
    },
    BindIndexBuffer {
        buffer_id: usize,
        format: IndexFormat,
    },
    Draw {
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    },
    DrawIndexed {
        topology: PrimitiveTopology,
        indices: Range<u32>,
    },
    Clear {
        color: Color,
    },
}

/// Snapshot of the bound state at the time of a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub topology: PrimitiveTopology,
    pub indexed: bool,
    /// Vertex count for plain draws, index count for indexed ones.
    pub count: u32,
    pub raster: RasterState,
    pub shader_id: Option<u64>,
    pub textures: [Option<u64>; TEXTURE_SLOTS as usize],
    pub vertex_buffer_id: Option<usize>,
    pub vertex_stride: u64,
    pub index_buffer_id: Option<usize>,
}

#[derive(Debug, Clone)]
struct MockBuffer {
    contents: Vec<u8>,
    usage: BufferUsages,
    destroyed: bool,
}

#[derive(Debug, Default)]
struct BoundState {
    raster: RasterState,
    shader_id: Option<u64>,
    textures: [Option<u64>; TEXTURE_SLOTS as usize],
    vertex_buffer: Option<(usize, u64)>,
    index_buffer: Option<usize>,
}

/// Mock implementation of RenderContext for testing.
///
/// # Example
///
/// ```rust
/// use pyxis_test_utils::{MockRenderContext, RenderContext};
/// use wgpu::*;
///
/// let mock = MockRenderContext::new();
/// let buffer = mock.create_buffer(&BufferDescriptor {
///     label: None,
///     size: 16,
///     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
///     mapped_at_creation: false,
/// });
/// mock.write_buffer(&buffer, 4, &[1, 2, 3, 4]);
///
/// assert!(buffer.is_mock());
/// assert_eq!(mock.buffer_contents(&buffer)[4..8], [1, 2, 3, 4]);
/// ```
pub struct MockRenderContext {
    calls: Mutex<Vec<RenderCall>>,
    buffers: Mutex<Vec<MockBuffer>>,
    bound: Mutex<BoundState>,
    draws: Mutex<Vec<RecordedDraw>>,
}

impl MockRenderContext {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
            bound: Mutex::new(BoundState::default()),
            draws: Mutex::new(Vec::new()),
        }
    }

    /// Copy of all recorded calls.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Draws in submission order, with the state bound at the time.
    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.draws.lock().clone()
    }

    pub fn count_draws(&self) -> usize {
        self.draws.lock().len()
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count_matching(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    pub fn count_buffer_writes(&self) -> usize {
        self.count_matching(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    pub fn count_buffer_destroys(&self) -> usize {
        self.count_matching(|call| matches!(call, RenderCall::DestroyBuffer { .. }))
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count_matching(|call| matches!(call, RenderCall::CreateTexture { .. }))
    }

    pub fn count_shader_creates(&self) -> usize {
        self.count_matching(|call| matches!(call, RenderCall::CreateShaderModule { .. }))
    }

    /// Writes that targeted `buffer`, as `(offset, size)` pairs.
    pub fn buffer_writes(&self, buffer: &GpuBuffer) -> Vec<(u64, usize)> {
        let Some(id) = buffer.mock_id() else {
            return Vec::new();
        };
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::WriteBuffer {
                    buffer_id,
                    offset,
                    size,
                } if *buffer_id == id => Some((*offset, *size)),
                _ => None,
            })
            .collect()
    }

    /// Current CPU-side mirror of a mock buffer's contents.
    pub fn buffer_contents(&self, buffer: &GpuBuffer) -> Vec<u8> {
        buffer
            .mock_id()
            .and_then(|id| self.buffers.lock().get(id).map(|b| b.contents.clone()))
            .unwrap_or_default()
    }

    /// Usage flags a mock buffer was created with.
    pub fn buffer_usage(&self, buffer: &GpuBuffer) -> Option<BufferUsages> {
        buffer
            .mock_id()
            .and_then(|id| self.buffers.lock().get(id).map(|b| b.usage))
    }

    /// Number of buffers created and not yet destroyed.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.lock().iter().filter(|b| !b.destroyed).count()
    }

    /// Clear recorded calls and draws. Buffers and bound state are kept.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
        self.draws.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count_matching(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().push(call);
    }

    fn record_draw(&self, topology: PrimitiveTopology, indexed: bool, count: u32) {
        let bound = self.bound.lock();
        self.draws.lock().push(RecordedDraw {
            topology,
            indexed,
            count,
            raster: bound.raster,
            shader_id: bound.shader_id,
            textures: bound.textures,
            vertex_buffer_id: bound.vertex_buffer.map(|(id, _)| id),
            vertex_stride: bound.vertex_buffer.map(|(_, stride)| stride).unwrap_or(0),
            index_buffer_id: bound.index_buffer,
        });
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut buffers = self.buffers.lock();
        let id = buffers.len();
        buffers.push(MockBuffer {
            contents: vec![0; desc.size as usize],
            usage: desc.usage,
            destroyed: false,
        });

        self.record(RenderCall::CreateBuffer {
            buffer_id: id,
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let Some(buffer_id) = buffer.mock_id() else {
            return;
        };

        {
            let mut buffers = self.buffers.lock();
            let Some(target) = buffers.get_mut(buffer_id) else {
                panic!("write to unknown mock buffer {buffer_id}");
            };
            assert!(!target.destroyed, "write to destroyed mock buffer {buffer_id}");
            let start = offset as usize;
            let end = start + data.len();
            assert!(
                end <= target.contents.len(),
                "write of {} bytes at offset {offset} overflows mock buffer {buffer_id} ({} bytes)",
                data.len(),
                target.contents.len()
            );
            target.contents[start..end].copy_from_slice(data);
        }

        self.record(RenderCall::WriteBuffer {
            buffer_id,
            offset,
            size: data.len(),
        });
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        let Some(buffer_id) = buffer.mock_id() else {
            return;
        };
        if let Some(target) = self.buffers.lock().get_mut(buffer_id) {
            target.destroyed = true;
        }
        self.record(RenderCall::DestroyBuffer { buffer_id });
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let texture = GpuTexture::mock(desc.size.width, desc.size.height, desc.format);
        self.record(RenderCall::CreateTexture {
            texture_id: texture.id(),
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        });
        texture
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8]) {
        self.record(RenderCall::WriteTexture {
            texture_id: texture.id(),
            size: data.len(),
        });
    }

    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule {
        let module = GpuShaderModule::mock();
        self.record(RenderCall::CreateShaderModule {
            shader_id: module.id(),
            label: desc.label.map(|s| s.to_string()),
        });
        module
    }

    fn set_raster_state(&self, state: &RasterState) {
        self.bound.lock().raster = *state;
        self.record(RenderCall::SetRasterState(*state));
    }

    fn bind_texture(&self, slot: u32, texture: Option<&GpuTexture>) {
        assert!(slot < TEXTURE_SLOTS, "texture slot {slot} out of range");
        let texture_id = texture.map(GpuTexture::id);
        self.bound.lock().textures[slot as usize] = texture_id;
        self.record(RenderCall::BindTexture { slot, texture_id });
    }

    fn use_shader(&self, shader: &GpuShaderModule, uniforms: &GpuBuffer) {
        self.bound.lock().shader_id = Some(shader.id());
        self.record(RenderCall::UseShader {
            shader_id: shader.id(),
            uniform_buffer_id: uniforms.mock_id().unwrap_or(usize::MAX),
        });
    }

    fn bind_vertex_buffer(&self, buffer: &GpuBuffer, stride: u64, attributes: &[VertexAttribute]) {
        let buffer_id = buffer.mock_id().unwrap_or(usize::MAX);
        self.bound.lock().vertex_buffer = Some((buffer_id, stride));
        self.record(RenderCall::BindVertexBuffer {
            buffer_id,
            stride,
            attributes: attributes.to_vec(),
        });
    }

    fn bind_index_buffer(&self, buffer: &GpuBuffer, format: IndexFormat) {
        let buffer_id = buffer.mock_id().unwrap_or(usize::MAX);
        self.bound.lock().index_buffer = Some(buffer_id);
        self.record(RenderCall::BindIndexBuffer { buffer_id, format });
    }

    fn draw(&self, topology: PrimitiveTopology, vertices: Range<u32>) {
        let count = vertices.end.saturating_sub(vertices.start);
        self.record(RenderCall::Draw { topology, vertices });
        self.record_draw(topology, false, count);
    }

    fn draw_indexed(&self, topology: PrimitiveTopology, indices: Range<u32>) {
        let count = indices.end.saturating_sub(indices.start);
        self.record(RenderCall::DrawIndexed { topology, indices });
        self.record_draw(topology, true, count);
    }

    fn clear(&self, color: Color) {
        self.record(RenderCall::Clear { color });
    }
}
