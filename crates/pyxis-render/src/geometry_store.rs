//! Growable vertex/index storage mirrored on the GPU.
//!
//! A [`GeometryStore`] keeps a CPU byte arena of vertices and an arena of
//! 16-bit indices, each with an explicit logical count, plus one GPU buffer
//! for each. Appends only touch the CPU side and mark the GPU mirror stale;
//! [`GeometryStore::bind`] uploads the valid prefix of both arenas once.
//!
//! ```ignore
//! let mut store = GeometryStore::new(context, ColorVertex::LAYOUT, Topology::IndexedTriangles);
//! store.append_quad([tl, tr, bl, br]);
//! store.bind();
//! store.draw(); // one indexed draw of 6 indices
//! ```

use crate::vertex::{Vertex, VertexLayout};
use pyxis_core::profiling::profile_function;
use pyxis_test_utils::{GpuBuffer, RenderContext};
use std::sync::Arc;

/// Highest vertex count reachable through vertex appends.
pub const MAX_VERTICES: usize = u16::MAX as usize;

/// Highest vertex count at which a quad may still be appended.
pub const MAX_QUAD_BASE: usize = MAX_VERTICES - 3;

/// Indices appended for each quad, relative to its first vertex.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

pub const DEFAULT_VERTEX_BYTES: usize = 64 * 1024;
pub const DEFAULT_INDEX_CAPACITY: usize = 16 * 1024;

/// How the vertices (or indices) of a store assemble into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    Triangles,
    IndexedLines,
    IndexedTriangles,
}

impl Topology {
    pub fn is_indexed(self) -> bool {
        matches!(self, Topology::IndexedLines | Topology::IndexedTriangles)
    }

    pub fn primitive_topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Lines | Topology::IndexedLines => wgpu::PrimitiveTopology::LineList,
            Topology::Triangles | Topology::IndexedTriangles => {
                wgpu::PrimitiveTopology::TriangleList
            }
        }
    }
}

/// Auto-growing vertex and index buffers with a GPU mirror.
pub struct GeometryStore {
    context: Arc<dyn RenderContext>,
    // len() is the capacity; `vertex_count * stride` bytes are valid
    vertices: Vec<u8>,
    // len() is the capacity; `index_count` entries are valid
    indices: Vec<u16>,
    vertex_count: usize,
    index_count: usize,
    layout: VertexLayout,
    topology: Topology,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    stale: bool,
}

impl GeometryStore {
    /// Create a store with the default capacities.
    pub fn new(context: Arc<dyn RenderContext>, layout: VertexLayout, topology: Topology) -> Self {
        Self::with_capacity(
            context,
            layout,
            topology,
            DEFAULT_VERTEX_BYTES,
            DEFAULT_INDEX_CAPACITY,
        )
    }

    /// Create a store with explicit initial capacities.
    ///
    /// Capacities are rounded up so every upload stays 4-byte aligned.
    pub fn with_capacity(
        context: Arc<dyn RenderContext>,
        layout: VertexLayout,
        topology: Topology,
        vertex_bytes: usize,
        index_capacity: usize,
    ) -> Self {
        let vertex_bytes = vertex_bytes.max(wgpu::COPY_BUFFER_ALIGNMENT as usize).next_multiple_of(4);
        let index_capacity = index_capacity.max(2).next_multiple_of(2);

        let vertex_buffer = create_vertex_buffer(context.as_ref(), vertex_bytes);
        let index_buffer = create_index_buffer(context.as_ref(), index_capacity);

        debug_assert!(layout.is_valid(), "invalid vertex layout {:?}", layout);

        Self {
            context,
            vertices: vec![0; vertex_bytes],
            indices: vec![0; index_capacity],
            vertex_count: 0,
            index_count: 0,
            layout,
            topology,
            vertex_buffer,
            index_buffer,
            stale: true,
        }
    }

    /// Reset the counts and switch to a new layout and topology.
    pub fn setup(&mut self, layout: VertexLayout, topology: Topology) {
        debug_assert!(layout.is_valid(), "invalid vertex layout {:?}", layout);
        self.layout = layout;
        self.topology = topology;
        self.vertex_count = 0;
        self.index_count = 0;
        self.stale = true;
    }

    /// Reset the counts, keeping layout and topology.
    pub fn clear(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
        self.stale = true;
    }

    /// Append one vertex and return its index.
    ///
    /// # Panics
    /// Panics if `V`'s layout differs from the store's or the store already
    /// holds [`MAX_VERTICES`] vertices.
    pub fn append_vertex<V: Vertex>(&mut self, vertex: V) -> u16 {
        self.assert_layout::<V>();
        assert!(
            self.vertex_count < MAX_VERTICES,
            "geometry store is full: vertex {} exceeds the 16-bit index range",
            self.vertex_count
        );

        let stride = self.layout.stride();
        self.reserve_vertex_bytes(stride);
        let start = self.vertex_count * stride;
        self.vertices[start..start + stride].copy_from_slice(bytemuck::bytes_of(&vertex));

        let index = self.vertex_count as u16;
        self.vertex_count += 1;
        self.stale = true;
        index
    }

    /// Append a run of vertices and return the index of the first one.
    ///
    /// # Panics
    /// Same conditions as [`GeometryStore::append_vertex`], checked for the
    /// whole run.
    pub fn append_vertices<V: Vertex>(&mut self, vertices: &[V]) -> u16 {
        self.assert_layout::<V>();
        self.append_vertex_bytes(bytemuck::cast_slice(vertices))
    }

    /// Append already-interleaved vertex bytes in the store's layout.
    ///
    /// Returns the index of the first appended vertex.
    ///
    /// # Panics
    /// Panics if `bytes` is not a whole number of vertices or the run would
    /// exceed [`MAX_VERTICES`].
    pub fn append_raw_vertices(&mut self, bytes: &[u8]) -> u16 {
        let stride = self.layout.stride();
        assert!(
            stride > 0 && bytes.len() % stride == 0,
            "{} bytes is not a whole number of {:?} vertices ({} bytes each)",
            bytes.len(),
            self.layout,
            stride
        );
        self.append_vertex_bytes(bytes)
    }

    fn append_vertex_bytes(&mut self, bytes: &[u8]) -> u16 {
        let stride = self.layout.stride();
        let count = bytes.len() / stride;
        assert!(
            self.vertex_count + count <= MAX_VERTICES,
            "geometry store is full: {} + {} vertices exceed the 16-bit index range",
            self.vertex_count,
            count
        );

        self.reserve_vertex_bytes(bytes.len());
        let start = self.vertex_count * stride;
        self.vertices[start..start + bytes.len()].copy_from_slice(bytes);

        let first = self.vertex_count as u16;
        self.vertex_count += count;
        self.stale = true;
        first
    }

    /// Append one index.
    pub fn append_index(&mut self, index: u16) {
        self.reserve_indices(1);
        self.indices[self.index_count] = index;
        self.index_count += 1;
        self.stale = true;
    }

    /// Append a run of indices.
    pub fn append_indices(&mut self, indices: &[u16]) {
        self.reserve_indices(indices.len());
        self.indices[self.index_count..self.index_count + indices.len()].copy_from_slice(indices);
        self.index_count += indices.len();
        self.stale = true;
    }

    /// Append a quad given its corners in top-left, top-right, bottom-left,
    /// bottom-right order, indexed as triangles `(0,1,2)` and `(2,1,3)`.
    ///
    /// Returns the index of the top-left vertex.
    ///
    /// # Panics
    /// Panics unless the topology is [`Topology::IndexedTriangles`], the layout
    /// matches `V`, and at most [`MAX_QUAD_BASE`] vertices are stored.
    pub fn append_quad<V: Vertex>(&mut self, corners: [V; 4]) -> u16 {
        assert_eq!(
            self.topology,
            Topology::IndexedTriangles,
            "quads require IndexedTriangles topology, store uses {:?}",
            self.topology
        );
        self.assert_layout::<V>();
        assert!(
            self.vertex_count <= MAX_QUAD_BASE,
            "geometry store is full: quad at vertex {} exceeds the 16-bit index range",
            self.vertex_count
        );

        let stride = self.layout.stride();
        self.reserve_vertex_bytes(4 * stride);
        self.reserve_indices(QUAD_INDICES.len());

        let start = self.vertex_count * stride;
        self.vertices[start..start + 4 * stride].copy_from_slice(bytemuck::cast_slice(&corners));

        let base = self.vertex_count as u16;
        for (slot, offset) in self.indices[self.index_count..self.index_count + 6]
            .iter_mut()
            .zip(QUAD_INDICES)
        {
            *slot = base + offset;
        }

        self.vertex_count += 4;
        self.index_count += 6;
        self.stale = true;
        base
    }

    /// Number of primitives a draw of the current contents produces.
    pub fn primitive_count(&self) -> u32 {
        let count = match self.topology {
            Topology::Points => self.vertex_count,
            Topology::Lines => self.vertex_count / 2,
            Topology::Triangles => self.vertex_count / 3,
            Topology::IndexedLines => self.index_count / 2,
            Topology::IndexedTriangles => self.index_count / 3,
        };
        count as u32
    }

    /// Bind the GPU buffers and vertex attributes, uploading the valid prefix
    /// of each arena first if the mirror is stale.
    pub fn bind(&mut self) {
        profile_function!();

        let stride = self.layout.stride();
        if self.stale {
            let vertex_bytes = self.vertex_count * stride;
            if vertex_bytes > 0 {
                self.context
                    .write_buffer(&self.vertex_buffer, 0, &self.vertices[..vertex_bytes]);
            }

            // Uploads must be 4-byte sized; capacity is even so the pad index exists.
            let index_len = self.index_count.next_multiple_of(2);
            if index_len > 0 {
                self.context.write_buffer(
                    &self.index_buffer,
                    0,
                    bytemuck::cast_slice(&self.indices[..index_len]),
                );
            }

            tracing::trace!(
                vertices = self.vertex_count,
                indices = self.index_count,
                "uploaded geometry"
            );
            self.stale = false;
        }

        self.context
            .bind_vertex_buffer(&self.vertex_buffer, stride as u64, &self.layout.attributes());
        self.context
            .bind_index_buffer(&self.index_buffer, wgpu::IndexFormat::Uint16);
    }

    /// Issue one draw call covering the current contents.
    pub fn draw(&self) {
        let topology = self.topology.primitive_topology();
        if self.topology.is_indexed() {
            self.context
                .draw_indexed(topology, 0..self.index_count as u32);
        } else {
            self.context.draw(topology, 0..self.vertex_count as u32);
        }
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// CPU vertex capacity in bytes.
    pub fn vertex_capacity_bytes(&self) -> usize {
        self.vertices.len()
    }

    /// CPU index capacity in indices.
    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    /// Whether the GPU mirror needs an upload.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Valid vertex bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertices[..self.vertex_count * self.layout.stride()]
    }

    /// Valid indices.
    pub fn indices(&self) -> &[u16] {
        &self.indices[..self.index_count]
    }

    /// Read back the vertex at `index`.
    pub fn vertex<V: Vertex>(&self, index: usize) -> V {
        self.assert_layout::<V>();
        assert!(index < self.vertex_count, "vertex {} out of range", index);
        let stride = self.layout.stride();
        bytemuck::pod_read_unaligned(&self.vertices[index * stride..(index + 1) * stride])
    }

    pub fn vertex_buffer(&self) -> &GpuBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &GpuBuffer {
        &self.index_buffer
    }

    fn assert_layout<V: Vertex>(&self) {
        assert_eq!(
            V::LAYOUT,
            self.layout,
            "vertex layout mismatch: appended {:?}, store holds {:?}",
            V::LAYOUT,
            self.layout
        );
    }

    fn reserve_vertex_bytes(&mut self, additional: usize) {
        let used = self.vertex_count * self.layout.stride();
        let required = used + additional;
        if required <= self.vertices.len() {
            return;
        }

        let mut capacity = self.vertices.len();
        while capacity < required {
            capacity *= 2;
        }
        tracing::debug!(
            from = self.vertices.len(),
            to = capacity,
            "growing vertex storage"
        );

        let mut grown = vec![0; capacity];
        grown[..used].copy_from_slice(&self.vertices[..used]);
        self.vertices = grown;

        self.context.destroy_buffer(&self.vertex_buffer);
        self.vertex_buffer = create_vertex_buffer(self.context.as_ref(), capacity);
        self.stale = true;
    }

    fn reserve_indices(&mut self, additional: usize) {
        let required = self.index_count + additional;
        if required <= self.indices.len() {
            return;
        }

        let mut capacity = self.indices.len();
        while capacity < required {
            capacity *= 2;
        }
        tracing::debug!(
            from = self.indices.len(),
            to = capacity,
            "growing index storage"
        );

        let mut grown = vec![0; capacity];
        grown[..self.index_count].copy_from_slice(&self.indices[..self.index_count]);
        self.indices = grown;

        self.context.destroy_buffer(&self.index_buffer);
        self.index_buffer = create_index_buffer(self.context.as_ref(), capacity);
        self.stale = true;
    }
}

impl Drop for GeometryStore {
    fn drop(&mut self) {
        self.context.destroy_buffer(&self.vertex_buffer);
        self.context.destroy_buffer(&self.index_buffer);
    }
}

impl std::fmt::Debug for GeometryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryStore")
            .field("layout", &self.layout)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("vertex_capacity_bytes", &self.vertices.len())
            .field("index_capacity", &self.indices.len())
            .field("stale", &self.stale)
            .finish()
    }
}

fn create_vertex_buffer(context: &dyn RenderContext, bytes: usize) -> GpuBuffer {
    context.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Geometry Vertex Buffer"),
        size: bytes as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(context: &dyn RenderContext, indices: usize) -> GpuBuffer {
    context.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Geometry Index Buffer"),
        size: (indices * size_of::<u16>()) as u64,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{ColorVertex, TexturedVertex};
    use pyxis_test_utils::{MockRenderContext, RenderCall};

    fn store(topology: Topology) -> (Arc<MockRenderContext>, GeometryStore) {
        let mock = Arc::new(MockRenderContext::new());
        let store = GeometryStore::with_capacity(
            mock.clone(),
            ColorVertex::LAYOUT,
            topology,
            48,
            6,
        );
        (mock, store)
    }

    fn v(x: f32) -> ColorVertex {
        ColorVertex::new([x, x + 0.5], [1, 2, 3, 4])
    }

    #[test]
    fn append_vertex_returns_sequential_indices() {
        let (_mock, mut store) = store(Topology::Points);
        assert_eq!(store.append_vertex(v(0.0)), 0);
        assert_eq!(store.append_vertex(v(1.0)), 1);
        assert_eq!(store.vertex_count(), 2);
        assert!(store.is_stale());
    }

    #[test]
    fn growth_preserves_contents_and_reallocates_gpu_buffers() {
        let (mock, mut store) = store(Topology::Points);
        let before = mock.count_buffer_creates();

        for i in 0..100 {
            store.append_vertex(v(i as f32));
        }

        assert!(store.vertex_capacity_bytes() >= 100 * 12);
        assert!(store.vertex_buffer().size() >= store.vertex_capacity_bytes() as u64);
        assert!(mock.count_buffer_creates() > before);
        for i in 0..100 {
            assert_eq!(store.vertex::<ColorVertex>(i), v(i as f32));
        }
    }

    #[test]
    fn index_growth_preserves_contents() {
        let (_mock, mut store) = store(Topology::IndexedLines);
        for i in 0..50u16 {
            store.append_index(i * 3);
        }
        assert!(store.index_capacity() >= 50);
        assert!(store.index_buffer().size() >= 100);
        assert!(store.indices().iter().copied().eq((0..50u16).map(|i| i * 3)));
    }

    #[test]
    fn quad_uses_fixed_winding() {
        let (_mock, mut store) = store(Topology::IndexedTriangles);
        store.append_vertex(v(9.0));
        let base = store.append_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);

        assert_eq!(base, 1);
        assert_eq!(store.indices(), &[1, 2, 3, 3, 2, 4]);
        assert_eq!(store.vertex::<ColorVertex>(4), v(3.0));
        assert_eq!(store.primitive_count(), 2);
    }

    #[test]
    #[should_panic(expected = "quads require IndexedTriangles")]
    fn quad_rejects_other_topologies() {
        let (_mock, mut store) = store(Topology::Triangles);
        store.append_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);
    }

    #[test]
    #[should_panic(expected = "vertex layout mismatch")]
    fn append_rejects_mismatched_layout() {
        let (_mock, mut store) = store(Topology::Points);
        store.append_vertex(TexturedVertex::new([0.0; 2], [0.0; 2], [0; 4]));
    }

    #[test]
    fn primitive_count_per_topology() {
        let cases = [
            (Topology::Points, 6, 0, 6),
            (Topology::Lines, 6, 0, 3),
            (Topology::Triangles, 6, 0, 2),
            (Topology::IndexedLines, 4, 8, 4),
            (Topology::IndexedTriangles, 4, 9, 3),
        ];
        for (topology, vertices, indices, expected) in cases {
            let (_mock, mut store) = store(topology);
            for i in 0..vertices {
                store.append_vertex(v(i as f32));
            }
            for i in 0..indices {
                store.append_index(i % 4);
            }
            assert_eq!(store.primitive_count(), expected, "{:?}", topology);
        }
    }

    #[test]
    fn bind_uploads_only_the_valid_prefix_once() {
        let (mock, mut store) = store(Topology::IndexedTriangles);
        store.append_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);
        store.append_vertex(v(4.0));
        store.append_index(4);
        mock.clear_calls();

        store.bind();
        assert_eq!(mock.buffer_writes(store.vertex_buffer()), vec![(0, 5 * 12)]);
        // 7 indices padded to 8 for alignment
        assert_eq!(mock.buffer_writes(store.index_buffer()), vec![(0, 16)]);
        assert!(!store.is_stale());

        let uploaded = mock.buffer_contents(store.vertex_buffer());
        assert_eq!(&uploaded[..60], store.vertex_bytes());

        mock.clear_calls();
        store.bind();
        assert_eq!(mock.count_buffer_writes(), 0);
    }

    #[test]
    fn draw_follows_topology() {
        let (mock, mut store) = store(Topology::Lines);
        store.append_vertices(&[v(0.0), v(1.0), v(2.0), v(3.0)]);
        store.bind();
        store.draw();

        store.setup(ColorVertex::LAYOUT, Topology::IndexedTriangles);
        store.append_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);
        store.bind();
        store.draw();

        let draws = mock.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].topology, wgpu::PrimitiveTopology::LineList);
        assert!(!draws[0].indexed);
        assert_eq!(draws[0].count, 4);
        assert_eq!(draws[1].topology, wgpu::PrimitiveTopology::TriangleList);
        assert!(draws[1].indexed);
        assert_eq!(draws[1].count, 6);
    }

    #[test]
    fn cleared_store_draws_zero_primitives() {
        let (mock, mut store) = store(Topology::IndexedTriangles);
        store.append_quad([v(0.0), v(1.0), v(2.0), v(3.0)]);
        store.clear();
        store.bind();
        store.draw();

        assert_eq!(store.primitive_count(), 0);
        assert_eq!(mock.draws()[0].count, 0);
        assert_eq!(store.layout(), ColorVertex::LAYOUT);
    }

    #[test]
    fn raw_vertices_append_in_store_layout() {
        let (_mock, mut store) = store(Topology::Triangles);
        let raw = [v(0.0), v(1.0), v(2.0)];
        assert_eq!(store.append_raw_vertices(bytemuck::cast_slice(&raw)), 0);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.vertex::<ColorVertex>(2), v(2.0));
    }

    #[test]
    #[should_panic(expected = "not a whole number")]
    fn raw_vertices_reject_partial_vertex() {
        let (_mock, mut store) = store(Topology::Triangles);
        store.append_raw_vertices(&[0u8; 13]);
    }

    fn filled_to(count: usize) -> GeometryStore {
        let (_mock, mut store) = store(Topology::IndexedTriangles);
        store.append_raw_vertices(&vec![0u8; count * ColorVertex::LAYOUT.stride()]);
        assert_eq!(store.vertex_count(), count);
        store
    }

    #[test]
    fn quad_fits_at_last_base_vertex() {
        let mut store = filled_to(MAX_QUAD_BASE);
        assert_eq!(store.append_quad([v(1.0); 4]), 65532);
        assert_eq!(store.vertex_count(), MAX_VERTICES);
        assert_eq!(store.indices(), &[65532, 65533, 65534, 65534, 65533, 65535]);
    }

    #[test]
    #[should_panic(expected = "quad at vertex 65533 exceeds")]
    fn quad_past_last_base_vertex_panics() {
        let mut store = filled_to(MAX_QUAD_BASE + 1);
        store.append_quad([v(1.0); 4]);
    }

    #[test]
    fn drop_releases_gpu_buffers() {
        let (mock, store) = store(Topology::Points);
        assert_eq!(mock.live_buffer_count(), 2);
        drop(store);
        assert_eq!(mock.live_buffer_count(), 0);
        assert!(mock
            .calls()
            .iter()
            .any(|call| matches!(call, RenderCall::DestroyBuffer { .. })));
    }
}
