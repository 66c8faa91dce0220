//! Static 3D meshes stored in a [`GeometryStore`].

use crate::{GeometryStore, MAX_VERTICES, MeshVertex, Shader, Texture, Topology, Vertex};
use glam::{Vec2, Vec3};
use pyxis_test_utils::{RasterState, RenderContext};
use std::sync::Arc;

/// Geometry uploaded once and drawn with depth testing and back-face culling.
pub struct Mesh {
    context: Arc<dyn RenderContext>,
    store: GeometryStore,
}

impl Mesh {
    /// Draw the mesh with `shader`, sampling `texture` on the first unit.
    ///
    /// The caller sets the shader's `view_projection` and `model` uniforms.
    pub fn draw(&mut self, shader: &mut Shader, texture: Option<&Texture>) {
        if self.store.is_empty() {
            return;
        }

        self.context.set_raster_state(&RasterState::opaque_3d());
        self.context.bind_texture(0, texture.map(Texture::gpu));
        self.context.bind_texture(1, None);
        shader.apply();
        self.store.bind();
        self.store.draw();
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    pub fn index_count(&self) -> usize {
        self.store.index_count()
    }

    pub fn topology(&self) -> Topology {
        self.store.topology()
    }

    // ===== Primitive Generators =====

    /// Cube with edge length `size`, centered at the origin.
    pub fn cube(context: Arc<dyn RenderContext>, size: f32) -> Self {
        let h = size / 2.0;

        // (normal, four corners counter-clockwise seen from outside)
        let faces = [
            (Vec3::Z, [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            (Vec3::NEG_Z, [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
            (Vec3::Y, [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
            (Vec3::NEG_Y, [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            (Vec3::X, [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
            (Vec3::NEG_X, [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];
        let face_uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        let mut builder = MeshBuilder::new();
        for (face, (normal, corners)) in faces.into_iter().enumerate() {
            let base = face as u16 * 4;
            builder.positions.extend(corners.map(Vec3::from_array));
            builder.normals_mut().extend([normal; 4]);
            builder.uvs_mut().extend(face_uvs);
            builder
                .indices_mut()
                .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        builder.build(context)
    }

    /// Plane in XZ facing +Y, centered at the origin.
    pub fn plane(context: Arc<dyn RenderContext>, width: f32, depth: f32) -> Self {
        let hw = width / 2.0;
        let hd = depth / 2.0;

        MeshBuilder::new()
            .with_positions(vec![
                Vec3::new(-hw, 0.0, hd),
                Vec3::new(hw, 0.0, hd),
                Vec3::new(hw, 0.0, -hd),
                Vec3::new(-hw, 0.0, -hd),
            ])
            .with_normals(vec![Vec3::Y; 4])
            .with_uvs(vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ])
            .with_indices(vec![0, 1, 2, 2, 3, 0])
            .build(context)
    }

    /// UV sphere. `(segments + 1) * (rings + 1)` must fit in 16-bit indices.
    pub fn sphere(context: Arc<dyn RenderContext>, radius: f32, segments: u16, rings: u16) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let vertex_count = (segments as usize + 1) * (rings as usize + 1);
        assert!(
            vertex_count <= MAX_VERTICES,
            "sphere with {} segments and {} rings needs {} vertices, exceeding the 16-bit index range",
            segments,
            rings,
            vertex_count
        );
        let mut builder = MeshBuilder::new();

        for ring in 0..=rings {
            let theta = ring as f32 * std::f32::consts::PI / rings as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();

            for segment in 0..=segments {
                let phi = segment as f32 * std::f32::consts::TAU / segments as f32;
                let (sin_phi, cos_phi) = phi.sin_cos();

                let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
                builder.positions.push(normal * radius);
                builder.normals_mut().push(normal);
                builder.uvs_mut().push(Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                ));
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let first = ring * (segments + 1) + segment;
                let second = first + segments + 1;
                builder.indices_mut().extend([
                    first,
                    first + 1,
                    second,
                    second,
                    first + 1,
                    second + 1,
                ]);
            }
        }

        builder.build(context)
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh").field("store", &self.store).finish()
    }
}

/// Builder for [`Mesh`]es.
///
/// Missing normals are computed per triangle; missing UVs default to zero.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    indices: Option<Vec<u16>>,
    topology: Topology,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            uvs: None,
            indices: None,
            topology: Topology::Triangles,
        }
    }

    pub fn with_positions(mut self, positions: Vec<Vec3>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u16>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Primitive kind. Indexed variants are chosen automatically when indices
    /// are present.
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    fn normals_mut(&mut self) -> &mut Vec<Vec3> {
        self.normals.get_or_insert_with(Vec::new)
    }

    fn uvs_mut(&mut self) -> &mut Vec<Vec2> {
        self.uvs.get_or_insert_with(Vec::new)
    }

    fn indices_mut(&mut self) -> &mut Vec<u16> {
        self.indices.get_or_insert_with(Vec::new)
    }

    fn resolved_topology(&self) -> Topology {
        match (self.topology, self.indices.is_some()) {
            (Topology::Triangles | Topology::IndexedTriangles, true) => Topology::IndexedTriangles,
            (Topology::Lines | Topology::IndexedLines, true) => Topology::IndexedLines,
            (Topology::IndexedTriangles, false) => Topology::Triangles,
            (Topology::IndexedLines, false) => Topology::Lines,
            (topology, _) => topology,
        }
    }

    /// Per-triangle normals for triangle meshes, +Z otherwise.
    fn flat_normals(&self, topology: Topology) -> Vec<Vec3> {
        let mut normals = vec![Vec3::Z; self.positions.len()];
        let sequential: Vec<u16>;
        let indices = match (&self.indices, topology) {
            (Some(indices), Topology::IndexedTriangles) => indices.as_slice(),
            (None, Topology::Triangles) => {
                sequential = (0..self.positions.len() as u16).collect();
                sequential.as_slice()
            }
            _ => return normals,
        };

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(usize::from);
            let edge1 = self.positions[i1] - self.positions[i0];
            let edge2 = self.positions[i2] - self.positions[i0];
            let normal = edge1.cross(edge2).normalize_or_zero();
            normals[i0] = normal;
            normals[i1] = normal;
            normals[i2] = normal;
        }
        normals
    }

    /// Interleave the attributes as [`MeshVertex`] bytes.
    ///
    /// # Panics
    /// Panics if normals or UVs are present with a different count than
    /// positions.
    pub fn interleave(&self) -> Vec<u8> {
        let topology = self.resolved_topology();
        let normals = match &self.normals {
            Some(normals) => normals.clone(),
            None => self.flat_normals(topology),
        };
        assert_eq!(
            normals.len(),
            self.positions.len(),
            "mesh has {} positions but {} normals",
            self.positions.len(),
            normals.len()
        );
        if let Some(uvs) = &self.uvs {
            assert_eq!(
                uvs.len(),
                self.positions.len(),
                "mesh has {} positions but {} uvs",
                self.positions.len(),
                uvs.len()
            );
        }

        let stride = MeshVertex::LAYOUT.stride();
        let mut bytes = Vec::with_capacity(self.positions.len() * stride);
        for (i, position) in self.positions.iter().enumerate() {
            let uv = self.uvs.as_ref().map_or(Vec2::ZERO, |uvs| uvs[i]);
            bytes.extend_from_slice(bytemuck::bytes_of(position));
            bytes.extend_from_slice(bytemuck::bytes_of(&normals[i]));
            bytes.extend_from_slice(bytemuck::bytes_of(&uv));
        }
        bytes
    }

    pub fn build(self, context: Arc<dyn RenderContext>) -> Mesh {
        let topology = self.resolved_topology();
        let bytes = self.interleave();
        let index_count = self.indices.as_ref().map_or(0, Vec::len);

        let mut store = GeometryStore::with_capacity(
            context.clone(),
            MeshVertex::LAYOUT,
            topology,
            bytes.len(),
            index_count,
        );
        store.append_raw_vertices(&bytes);
        if let Some(indices) = &self.indices {
            store.append_indices(indices);
        }

        tracing::debug!(
            vertices = store.vertex_count(),
            indices = store.index_count(),
            ?topology,
            "built mesh"
        );
        Mesh { context, store }
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyxis_test_utils::MockRenderContext;

    #[test]
    fn cube_has_four_vertices_per_face() {
        let mock = Arc::new(MockRenderContext::new());
        let cube = Mesh::cube(mock, 2.0);

        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.topology(), Topology::IndexedTriangles);

        let top = cube.store().vertex::<MeshVertex>(8);
        assert_eq!(top.normal, [0.0, 1.0, 0.0]);
        assert_eq!(top.position[1], 1.0);
    }

    #[test]
    fn cube_faces_wind_counter_clockwise_from_outside() {
        let mock = Arc::new(MockRenderContext::new());
        let cube = Mesh::cube(mock, 1.0);
        let store = cube.store();

        for triangle in store.indices().chunks_exact(3) {
            let v: Vec<MeshVertex> = triangle
                .iter()
                .map(|&i| store.vertex::<MeshVertex>(i as usize))
                .collect();
            let p = v.iter().map(|v| Vec3::from(v.position)).collect::<Vec<_>>();
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            assert!(face_normal.dot(Vec3::from(v[0].normal)) > 0.99);
        }
    }

    #[test]
    fn builder_computes_flat_normals_without_indices() {
        let mock = Arc::new(MockRenderContext::new());
        let mesh = MeshBuilder::new()
            .with_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .build(mock);

        assert_eq!(mesh.topology(), Topology::Triangles);
        assert_eq!(mesh.store().vertex::<MeshVertex>(1).normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.store().vertex::<MeshVertex>(2).uv, [0.0, 0.0]);
    }

    #[test]
    fn sphere_vertex_count() {
        let mock = Arc::new(MockRenderContext::new());
        let sphere = Mesh::sphere(mock, 1.0, 8, 4);
        assert_eq!(sphere.vertex_count(), 9 * 5);
        assert_eq!(sphere.index_count(), 8 * 4 * 6);
    }

    #[test]
    #[should_panic(expected = "sphere with 300 segments and 300 rings needs 90601 vertices")]
    fn oversized_sphere_panics_before_building() {
        let mock = Arc::new(MockRenderContext::new());
        Mesh::sphere(mock, 1.0, 300, 300);
    }

    #[test]
    fn sphere_at_the_vertex_limit_builds() {
        let mock = Arc::new(MockRenderContext::new());
        // 255 * 257 = 65535 vertices.
        let sphere = Mesh::sphere(mock, 1.0, 254, 256);
        assert_eq!(sphere.vertex_count(), MAX_VERTICES);
    }

    #[test]
    #[should_panic(expected = "positions but 1 uvs")]
    fn mismatched_uvs_panic() {
        MeshBuilder::new()
            .with_positions(vec![Vec3::ZERO, Vec3::X])
            .with_uvs(vec![Vec2::ZERO])
            .interleave();
    }
}
