//! Immediate-mode drawing operations.
//!
//! Every operation computes local positions, applies any local rotation and
//! translation, then the world transform, and appends the result to a batch
//! requested with the smallest state that describes it. Untextured shapes use
//! [`ColorVertex`]; images and text use [`TexturedVertex`].

use crate::{
    Batch, BitmapFont, BlendMode, Color, ColorVertex, MAX_VERTICES, RenderingContext, Texture,
    TexturedVertex, Topology, Vertex,
};
use glam::{Affine2, Vec2};
use pyxis_core::{
    geometry::{Circle, Rect, Size},
    profiling::profile_function,
};
use std::f32::consts::TAU;

/// Full-texture coordinates.
const FULL_UV: Rect<f32> = Rect::new(0.0, 0.0, 1.0, 1.0);

impl RenderingContext {
    fn color_batch(&mut self, blend: BlendMode, topology: Topology) -> &mut Batch {
        self.batches
            .get_batch(None, None, blend, ColorVertex::LAYOUT, topology)
    }

    fn color_vertex(&self, local: Vec2, color: [u8; 4]) -> ColorVertex {
        ColorVertex::new(self.to_world(local).to_array(), color)
    }

    fn color_vertices(&self, points: &[Vec2], color: Color) -> Vec<ColorVertex> {
        let rgba = color.to_rgba8();
        points.iter().map(|&p| self.color_vertex(p, rgba)).collect()
    }

    fn segments_or_default(&self, segments: u32) -> u32 {
        let segments = if segments == 0 {
            self.config.circle_segments
        } else {
            segments
        };
        segments.max(3)
    }

    pub fn draw_point(&mut self, position: Vec2, color: Color, blend: BlendMode) {
        let vertex = self.color_vertex(position, color.to_rgba8());
        self.color_batch(blend, Topology::Points)
            .append_vertex(vertex);
    }

    pub fn draw_line(&mut self, start: Vec2, end: Vec2, color: Color, blend: BlendMode) {
        let vertices = self.color_vertices(&[start, end], color);
        self.color_batch(blend, Topology::Lines)
            .append_vertices(&vertices);
    }

    /// Connected line segments through `points`. A closed polyline also joins
    /// the last point back to the first.
    pub fn draw_polyline(&mut self, points: &[Vec2], closed: bool, color: Color, blend: BlendMode) {
        if points.len() < 2 {
            return;
        }
        let vertices = self.color_vertices(points, color);
        let batch = self.color_batch(blend, Topology::IndexedLines);
        let base = batch.append_vertices(&vertices);

        let last = vertices.len() as u16 - 1;
        for i in 0..last {
            batch.append_indices(&[base + i, base + i + 1]);
        }
        if closed && vertices.len() > 2 {
            batch.append_indices(&[base + last, base]);
        }
    }

    pub fn draw_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color, blend: BlendMode) {
        let vertices = self.color_vertices(&[a, b, c], color);
        let batch = self.color_batch(blend, Topology::IndexedTriangles);
        let base = batch.append_vertices(&vertices);
        batch.append_indices(&[base, base + 1, base + 2]);
    }

    pub fn draw_triangle_outline(
        &mut self,
        a: Vec2,
        b: Vec2,
        c: Vec2,
        color: Color,
        blend: BlendMode,
    ) {
        self.draw_polyline(&[a, b, c], true, color, blend);
    }

    /// Filled quad from corners in top-left, top-right, bottom-left,
    /// bottom-right order.
    pub fn draw_quad(&mut self, corners: [Vec2; 4], color: Color, blend: BlendMode) {
        let rgba = color.to_rgba8();
        let quad = corners.map(|p| self.color_vertex(p, rgba));
        self.color_batch(blend, Topology::IndexedTriangles)
            .append_quad(quad);
    }

    pub fn draw_rectangle(&mut self, rect: Rect<f32>, color: Color, blend: BlendMode) {
        self.draw_quad(rect.corners(), color, blend);
    }

    /// Rectangle rotated by `rotation` radians about `origin`, given relative
    /// to the rectangle's top-left corner, and placed so `origin` lands on
    /// `rect.position()`.
    pub fn draw_rectangle_ex(
        &mut self,
        rect: Rect<f32>,
        origin: Vec2,
        rotation: f32,
        color: Color,
        blend: BlendMode,
    ) {
        self.draw_quad(rotated_corners(rect, origin, rotation), color, blend);
    }

    pub fn draw_rectangle_outline(&mut self, rect: Rect<f32>, color: Color, blend: BlendMode) {
        let [tl, tr, bl, br] = rect.corners();
        self.draw_polyline(&[tl, tr, br, bl], true, color, blend);
    }

    /// Filled circle as a triangle fan around the center.
    ///
    /// `segments == 0` uses the configured default; fewer than 3 is raised
    /// to 3.
    pub fn draw_circle(&mut self, circle: Circle, segments: u32, color: Color, blend: BlendMode) {
        let n = self.segments_or_default(segments);
        assert!(
            (n as usize) < MAX_VERTICES,
            "circle with {} segments exceeds the 16-bit index range",
            n
        );
        let rgba = color.to_rgba8();

        let mut vertices = Vec::with_capacity(n as usize + 1);
        vertices.push(self.color_vertex(circle.center, rgba));
        for i in 0..n {
            let angle = TAU * i as f32 / n as f32;
            vertices.push(self.color_vertex(circle.point_at(angle), rgba));
        }

        let batch = self.color_batch(blend, Topology::IndexedTriangles);
        let center = batch.append_vertices(&vertices);
        let n = n as u16;
        for i in 1..=n {
            let next = i % n + 1;
            batch.append_indices(&[center, center + i, center + next]);
        }
    }

    /// Circle perimeter as a closed line loop, without a center vertex.
    pub fn draw_circle_outline(
        &mut self,
        circle: Circle,
        segments: u32,
        color: Color,
        blend: BlendMode,
    ) {
        let n = self.segments_or_default(segments);
        assert!(
            n as usize <= MAX_VERTICES,
            "circle outline with {} segments exceeds the 16-bit index range",
            n
        );
        let points: Vec<Vec2> = (0..n)
            .map(|i| circle.point_at(TAU * i as f32 / n as f32))
            .collect();
        self.draw_polyline(&points, true, color, blend);
    }

    /// Filled convex polygon as a fan from the first point.
    pub fn draw_polygon(&mut self, points: &[Vec2], color: Color, blend: BlendMode) {
        if points.len() < 3 {
            return;
        }
        let vertices = self.color_vertices(points, color);
        let batch = self.color_batch(blend, Topology::IndexedTriangles);
        let base = batch.append_vertices(&vertices);
        for i in 1..vertices.len() as u16 - 1 {
            batch.append_indices(&[base, base + i, base + i + 1]);
        }
    }

    pub fn draw_polygon_outline(&mut self, points: &[Vec2], color: Color, blend: BlendMode) {
        self.draw_polyline(points, true, color, blend);
    }

    fn textured_quad(
        &mut self,
        texture: &Texture,
        mask: Option<&Texture>,
        corners: [Vec2; 4],
        uv: Rect<f32>,
        tint: Color,
        blend: BlendMode,
    ) {
        let rgba = tint.to_rgba8();
        let uvs = uv.corners();
        let mut quad = [TexturedVertex::new([0.0; 2], [0.0; 2], rgba); 4];
        for (vertex, (corner, uv)) in quad.iter_mut().zip(corners.into_iter().zip(uvs)) {
            vertex.position = self.to_world(corner).to_array();
            vertex.uv = uv.to_array();
        }

        self.batches
            .get_batch(
                Some(texture),
                mask,
                blend,
                TexturedVertex::LAYOUT,
                Topology::IndexedTriangles,
            )
            .append_quad(quad);
    }

    /// Draw the whole texture at its natural size with its top-left corner at
    /// `position`.
    pub fn draw_texture(&mut self, texture: &Texture, position: Vec2, tint: Color, blend: BlendMode) {
        let size = texture.size();
        let dest = Rect::from_pos_size(position, Size::new(size.width as f32, size.height as f32));
        self.draw_textured_rectangle(texture, dest, tint, blend);
    }

    /// Draw the whole texture stretched over `dest`.
    pub fn draw_textured_rectangle(
        &mut self,
        texture: &Texture,
        dest: Rect<f32>,
        tint: Color,
        blend: BlendMode,
    ) {
        self.textured_quad(texture, None, dest.corners(), FULL_UV, tint, blend);
    }

    /// Draw the `source` texel rectangle of `texture` over `dest`.
    pub fn draw_texture_region(
        &mut self,
        texture: &Texture,
        source: Rect<f32>,
        dest: Rect<f32>,
        tint: Color,
        blend: BlendMode,
    ) {
        let uv = texel_rect_to_uv(texture, source);
        self.textured_quad(texture, None, dest.corners(), uv, tint, blend);
    }

    /// Draw a texture region rotated about `origin`, as in
    /// [`draw_rectangle_ex`](Self::draw_rectangle_ex). `None` draws the whole
    /// texture.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_texture_ex(
        &mut self,
        texture: &Texture,
        source: Option<Rect<f32>>,
        dest: Rect<f32>,
        origin: Vec2,
        rotation: f32,
        tint: Color,
        blend: BlendMode,
    ) {
        let uv = source.map_or(FULL_UV, |source| texel_rect_to_uv(texture, source));
        let corners = rotated_corners(dest, origin, rotation);
        self.textured_quad(texture, None, corners, uv, tint, blend);
    }

    /// Draw `texture` over `dest`, multiplied by `mask` bound to the second
    /// texture unit with the same coordinates.
    pub fn draw_texture_masked(
        &mut self,
        texture: &Texture,
        mask: &Texture,
        dest: Rect<f32>,
        tint: Color,
        blend: BlendMode,
    ) {
        self.textured_quad(texture, Some(mask), dest.corners(), FULL_UV, tint, blend);
    }

    /// Lay out and draw `text` with its first line's top-left at `position`.
    ///
    /// Characters without a glyph are skipped with a warning and do not move
    /// the pen.
    pub fn draw_text(
        &mut self,
        font: &BitmapFont,
        text: &str,
        position: Vec2,
        scale: f32,
        tint: Color,
        blend: BlendMode,
    ) {
        profile_function!();

        let mut pen = position;
        for character in text.chars() {
            if character == '\n' {
                pen.x = position.x;
                pen.y += font.line_height() * scale;
                continue;
            }

            let Some(glyph) = font.glyph(character) else {
                tracing::warn!(
                    character = ?character,
                    font = font.name(),
                    "missing glyph, skipping"
                );
                continue;
            };

            if glyph.source.width > 0.0 && glyph.source.height > 0.0 {
                let dest = Rect::from_pos_size(
                    pen + glyph.offset * scale,
                    glyph.source.size() * scale,
                );
                let uv = font.glyph_uv(glyph);
                self.textured_quad(font.texture(), None, dest.corners(), uv, tint, blend);
            }
            pen.x += glyph.advance * scale;
        }
    }

    /// Size of the box `draw_text` would cover, ignoring missing glyphs.
    pub fn measure_text(&self, font: &BitmapFont, text: &str, scale: f32) -> Size<f32> {
        if text.is_empty() {
            return Size::new(0.0, 0.0);
        }

        let mut width: f32 = 0.0;
        let mut line: f32 = 0.0;
        let mut lines = 1;
        for character in text.chars() {
            if character == '\n' {
                width = width.max(line);
                line = 0.0;
                lines += 1;
            } else if let Some(glyph) = font.glyph(character) {
                line += glyph.advance * scale;
            }
        }
        width = width.max(line);
        Size::new(width, lines as f32 * font.line_height() * scale)
    }
}

fn texel_rect_to_uv(texture: &Texture, source: Rect<f32>) -> Rect<f32> {
    debug_assert!(
        texture.width() > 0 && texture.height() > 0,
        "cannot map texels of empty {}x{} texture",
        texture.width(),
        texture.height()
    );
    let (width, height) = (texture.width() as f32, texture.height() as f32);
    Rect::new(
        source.x / width,
        source.y / height,
        source.width / width,
        source.height / height,
    )
}

/// Corners of `rect` rotated about `origin` (relative to its top-left), with
/// `origin` placed at `rect.position()`.
fn rotated_corners(rect: Rect<f32>, origin: Vec2, rotation: f32) -> [Vec2; 4] {
    let local = Affine2::from_angle_translation(rotation, rect.position());
    Rect::from_pos_size(-origin, rect.size())
        .corners()
        .map(|corner| local.transform_point2(corner))
}
