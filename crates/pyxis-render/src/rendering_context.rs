use crate::{
    BatchAccumulator, BatchShaders, BatchStats, GeometryStore, RendererConfig, Topology,
    VertexLayout, WorldTransform,
};
use glam::{Mat4, Vec2};
use pyxis_core::geometry::Size;
use pyxis_test_utils::RenderContext;
use std::sync::Arc;

/// Immediate-mode 2D drawing state.
///
/// Holds the batch accumulator with its built-in shaders, the active world
/// transform and the current viewport. The drawing operations themselves
/// (`draw_rectangle`, `draw_circle`, `draw_text`, ...) are implemented on this
/// type in the emitter module.
pub struct RenderingContext {
    pub(crate) context: Arc<dyn RenderContext>,
    pub(crate) batches: BatchAccumulator,
    pub(crate) world: WorldTransform,
    pub(crate) config: RendererConfig,
    viewport: Size<f32>,
}

impl RenderingContext {
    pub fn new(context: Arc<dyn RenderContext>) -> Self {
        Self::with_config(context, RendererConfig::default())
    }

    pub fn with_config(context: Arc<dyn RenderContext>, config: RendererConfig) -> Self {
        let store = GeometryStore::with_capacity(
            context.clone(),
            VertexLayout::POSITION2_COLOR,
            Topology::IndexedTriangles,
            config.initial_vertex_bytes,
            config.initial_index_capacity,
        );
        let shaders = BatchShaders::new(context.clone());
        let batches = BatchAccumulator::with_store(context.clone(), store, shaders);

        tracing::debug!(?config, "created rendering context");
        Self {
            context,
            batches,
            world: WorldTransform::IDENTITY,
            config,
            viewport: Size::new(0.0, 0.0),
        }
    }

    /// Start a frame: clear the target if configured and set the viewport.
    pub fn begin_frame(&mut self, viewport: Size<f32>) {
        if let Some(color) = self.config.clear_color {
            self.context.clear(color.to_wgpu());
        }
        self.set_viewport(viewport);
    }

    /// Set the viewport and the matching top-left-origin projection.
    ///
    /// Pending geometry is flushed first so it keeps the projection it was
    /// batched under.
    pub fn set_viewport(&mut self, viewport: Size<f32>) {
        self.flush();
        self.viewport = viewport;

        let projection =
            Mat4::orthographic_rh(0.0, viewport.width, viewport.height, 0.0, -1.0, 1.0);
        let shaders = self.batches.shaders_mut();
        shaders.colored.set_uniform("projection", projection);
        shaders.textured.set_uniform("projection", projection);
    }

    /// Flush pending geometry and return the frame's statistics.
    pub fn end_frame(&mut self) -> BatchStats {
        self.flush();
        let stats = self.batches.take_stats();
        tracing::trace!(
            draw_calls = stats.draw_calls,
            vertices = stats.vertices_submitted,
            "frame finished"
        );
        stats
    }

    pub fn flush(&mut self) {
        self.batches.flush();
    }

    pub fn viewport(&self) -> Size<f32> {
        self.viewport
    }

    pub fn world_transform(&self) -> WorldTransform {
        self.world
    }

    pub fn set_world_transform(&mut self, transform: WorldTransform) {
        self.world = transform;
    }

    pub fn reset_world_transform(&mut self) {
        self.world = WorldTransform::IDENTITY;
    }

    /// Run `f` with `transform` applied before the current world transform,
    /// restoring the previous transform afterwards.
    pub fn with_world_transform<R>(
        &mut self,
        transform: WorldTransform,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = self.world;
        self.world = transform.then(previous);
        let result = f(self);
        self.world = previous;
        result
    }

    #[inline]
    pub(crate) fn to_world(&self, point: Vec2) -> Vec2 {
        self.world.transform_point(point)
    }

    /// Statistics accumulated since the last `end_frame`.
    pub fn stats(&self) -> BatchStats {
        self.batches.stats()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn batches(&self) -> &BatchAccumulator {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut BatchAccumulator {
        &mut self.batches
    }

    pub fn render_context(&self) -> &Arc<dyn RenderContext> {
        &self.context
    }
}
