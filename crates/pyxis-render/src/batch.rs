//! State-keyed batching of 2D geometry.
//!
//! The accumulator owns a single [`GeometryStore`]. Callers ask for a batch
//! matching a full [`RenderState`]; while consecutive requests carry the same
//! state they keep appending into the same store. The first request with a
//! different state flushes the accumulated geometry as one draw call and
//! reconfigures the store for the new state.
//!
//! ```ignore
//! let batch = accumulator.get_batch(None, None, BlendMode::Alpha, ColorVertex::LAYOUT, Topology::IndexedTriangles);
//! batch.append_quad(corners);
//! accumulator.flush();
//! ```

use crate::{
    BlendMode, Shader, Texture,
    geometry_store::{GeometryStore, Topology},
    vertex::{Vertex, VertexLayout},
};
use pyxis_core::profiling::profile_function;
use pyxis_test_utils::{RasterState, RenderContext};
use std::sync::Arc;

/// Everything a batch's geometry depends on. Compared by exact equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    pub texture0: Option<Texture>,
    pub texture1: Option<Texture>,
    pub blend: BlendMode,
    pub layout: VertexLayout,
    pub topology: Topology,
}

impl RenderState {
    fn matches(
        &self,
        texture0: Option<&Texture>,
        texture1: Option<&Texture>,
        blend: BlendMode,
        layout: VertexLayout,
        topology: Topology,
    ) -> bool {
        self.texture0.as_ref() == texture0
            && self.texture1.as_ref() == texture1
            && self.blend == blend
            && self.layout == layout
            && self.topology == topology
    }
}

/// A geometry store paired with the render state its contents belong to.
#[derive(Debug)]
pub struct Batch {
    store: GeometryStore,
    state: RenderState,
}

impl Batch {
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    pub fn append_vertex<V: Vertex>(&mut self, vertex: V) -> u16 {
        self.store.append_vertex(vertex)
    }

    pub fn append_vertices<V: Vertex>(&mut self, vertices: &[V]) -> u16 {
        self.store.append_vertices(vertices)
    }

    pub fn append_index(&mut self, index: u16) {
        self.store.append_index(index)
    }

    pub fn append_indices(&mut self, indices: &[u16]) {
        self.store.append_indices(indices)
    }

    pub fn append_quad<V: Vertex>(&mut self, corners: [V; 4]) -> u16 {
        self.store.append_quad(corners)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// No batch is accepting geometry.
    Idle,
    /// The batch accepts geometry for its current state.
    Open,
}

/// Counters for submitted work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Draw calls issued.
    pub draw_calls: u32,
    /// Flushes forced by a render state change.
    pub flushes_by_state_change: u32,
    /// Vertices submitted across all draws.
    pub vertices_submitted: u64,
    /// Indices submitted across all indexed draws.
    pub indices_submitted: u64,
}

/// The two shaders a flush chooses between.
#[derive(Debug)]
pub struct BatchShaders {
    pub colored: Shader,
    pub textured: Shader,
}

impl BatchShaders {
    pub fn new(context: Arc<dyn RenderContext>) -> Self {
        Self {
            colored: Shader::colored(context.clone()),
            textured: Shader::textured(context),
        }
    }

    pub fn for_layout(&mut self, layout: VertexLayout) -> &mut Shader {
        if layout.contains(VertexLayout::TEXCOORD_A) {
            &mut self.textured
        } else {
            &mut self.colored
        }
    }
}

/// Accumulates same-state geometry and flushes it as one draw call.
pub struct BatchAccumulator {
    context: Arc<dyn RenderContext>,
    batch: Batch,
    phase: BatchPhase,
    shaders: BatchShaders,
    stats: BatchStats,
}

impl BatchAccumulator {
    pub fn new(context: Arc<dyn RenderContext>, shaders: BatchShaders) -> Self {
        let store = GeometryStore::new(
            context.clone(),
            VertexLayout::POSITION2_COLOR,
            Topology::IndexedTriangles,
        );
        Self::with_store(context, store, shaders)
    }

    /// Create an accumulator around a pre-sized store.
    pub fn with_store(
        context: Arc<dyn RenderContext>,
        store: GeometryStore,
        shaders: BatchShaders,
    ) -> Self {
        let state = RenderState {
            texture0: None,
            texture1: None,
            blend: BlendMode::default(),
            layout: store.layout(),
            topology: store.topology(),
        };
        Self {
            context,
            batch: Batch { store, state },
            phase: BatchPhase::Idle,
            shaders,
            stats: BatchStats::default(),
        }
    }

    /// Return the open batch if its state matches exactly, otherwise flush it
    /// and reopen it for the requested state.
    pub fn get_batch(
        &mut self,
        texture0: Option<&Texture>,
        texture1: Option<&Texture>,
        blend: BlendMode,
        layout: VertexLayout,
        topology: Topology,
    ) -> &mut Batch {
        if self.phase == BatchPhase::Open
            && self
                .batch
                .state
                .matches(texture0, texture1, blend, layout, topology)
        {
            return &mut self.batch;
        }

        if !self.batch.store.is_empty() {
            self.stats.flushes_by_state_change += 1;
        }
        self.flush();

        self.batch.store.setup(layout, topology);
        self.batch.state = RenderState {
            texture0: texture0.cloned(),
            texture1: texture1.cloned(),
            blend,
            layout,
            topology,
        };
        self.phase = BatchPhase::Open;
        &mut self.batch
    }

    /// Draw the accumulated geometry, if any, and empty the store.
    pub fn flush(&mut self) {
        profile_function!();

        if self.batch.store.is_empty() {
            return;
        }

        let state = &self.batch.state;
        self.context
            .set_raster_state(&RasterState::overlay(state.blend.to_blend_state()));
        self.context
            .bind_texture(0, state.texture0.as_ref().map(Texture::gpu));
        self.context
            .bind_texture(1, state.texture1.as_ref().map(Texture::gpu));
        self.shaders.for_layout(state.layout).apply();

        let store = &mut self.batch.store;
        store.bind();
        store.draw();

        self.stats.draw_calls += 1;
        self.stats.vertices_submitted += store.vertex_count() as u64;
        if store.topology().is_indexed() {
            self.stats.indices_submitted += store.index_count() as u64;
        }
        tracing::trace!(
            vertices = store.vertex_count(),
            indices = store.index_count(),
            topology = ?store.topology(),
            "flushed batch"
        );

        store.clear();
        self.phase = BatchPhase::Idle;
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn shaders(&self) -> &BatchShaders {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut BatchShaders {
        &mut self.shaders
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Return the counters and reset them.
    pub fn take_stats(&mut self) -> BatchStats {
        std::mem::take(&mut self.stats)
    }
}
