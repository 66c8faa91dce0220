use crate::{GraphicsError, GraphicsResult, TEXTURE_FORMAT};
use parking_lot::Mutex;
use pyxis_core::alloc::HashMap;
use pyxis_test_utils::{GpuBuffer, GpuShaderModule, GpuTexture, RasterState, TEXTURE_SLOTS};
use std::sync::Arc;

/// Depth format expected for [`RenderTarget::with_depth`] views.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A globally shared graphics context.
///
/// Besides the wgpu device it keeps the "currently bound" drawing state
/// (render target, raster state, textures, shader, vertex and index buffers)
/// that the [`RenderContext`](pyxis_test_utils::RenderContext) implementation
/// turns into render pipelines and passes.
///
/// ```rust,no_run
/// use pyxis_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync()?; // Arc<Self>
/// let ctx2 = ctx.clone();
/// # Ok::<(), pyxis_render::GraphicsError>(())
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub(crate) resources: SharedResources,
    pub(crate) state: Mutex<DrawState>,
    pub(crate) pipelines: Mutex<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl GraphicsContext {
    /// Creates a new graphics context with default settings.
    pub async fn new_owned() -> GraphicsResult<Arc<Self>> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Creates a new graphics context, blocking the current thread.
    pub fn new_owned_sync() -> GraphicsResult<Arc<Self>> {
        pollster::block_on(Self::new_owned())
    }

    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> GraphicsResult<Arc<Self>> {
        let context = Self::create_context_internal(descriptor).await?;
        Ok(Arc::new(context))
    }

    async fn create_context_internal(descriptor: GraphicsContextDescriptor) -> GraphicsResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|_| GraphicsError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_limits: descriptor.limits.clone(),
                label: descriptor.label,
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::DeviceCreation(e.to_string()))?;

        tracing::info!(adapter = %adapter.get_info().name, "created graphics context");

        let resources = SharedResources::new(&device, &queue);
        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            resources,
            state: Mutex::new(DrawState::default()),
            pipelines: Mutex::new(HashMap::default()),
        })
    }

    /// Get device info
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Get device limits
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Direct subsequent clears and draws at `target`.
    pub fn set_render_target(&self, target: RenderTarget) {
        self.state.lock().target = Some(target);
    }

    pub fn clear_render_target(&self) {
        self.state.lock().target = None;
    }

    /// Number of cached render pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().len()
    }
}

/// Descriptor for configuring graphics context creation.
pub struct GraphicsContextDescriptor {
    /// GPU backends to use
    pub backends: wgpu::Backends,
    /// Power preference for adapter selection
    pub power_preference: wgpu::PowerPreference,
    /// Whether to force fallback adapter
    pub force_fallback_adapter: bool,
    /// Required device limits
    pub limits: wgpu::Limits,
    /// Optional label for debugging
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            limits: wgpu::Limits::default(),
            label: None,
        }
    }
}

impl GraphicsContextDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    /// Use the software fallback adapter, for headless CI.
    pub fn force_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    pub fn limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Color (and optional depth) attachment that draws land in.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub color: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// A [`DEPTH_FORMAT`] view, required for depth-tested mesh draws.
    pub depth: Option<wgpu::TextureView>,
}

impl RenderTarget {
    pub fn new(color: wgpu::TextureView, format: wgpu::TextureFormat) -> Self {
        Self {
            color,
            format,
            depth: None,
        }
    }

    pub fn with_depth(mut self, depth: wgpu::TextureView) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// State set through the `RenderContext` binding calls.
#[derive(Default)]
pub(crate) struct DrawState {
    pub target: Option<RenderTarget>,
    pub raster: RasterState,
    pub textures: [Option<GpuTexture>; TEXTURE_SLOTS as usize],
    pub shader: Option<(GpuShaderModule, GpuBuffer)>,
    pub vertex: Option<VertexBinding>,
    pub index: Option<(GpuBuffer, wgpu::IndexFormat)>,
}

pub(crate) struct VertexBinding {
    pub buffer: GpuBuffer,
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

/// Everything a render pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub shader: u64,
    pub raster: RasterState,
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub topology: wgpu::PrimitiveTopology,
    pub color_format: wgpu::TextureFormat,
    pub has_depth: bool,
}

/// Layouts, sampler and fallback texture shared by every pipeline.
pub(crate) struct SharedResources {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
    pub sampler: wgpu::Sampler,
    /// 1x1 opaque white, bound to empty texture units.
    pub white: wgpu::TextureView,
}

impl SharedResources {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pyxis Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pyxis Texture Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pyxis Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Pyxis Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let white = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pyxis White Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &white,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        Self {
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            white: white.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}
