//! Geometry produced by the drawing operations, text layout and meshes.

use glam::Vec2;
use pyxis_render::{
    BitmapFont, BlendMode, Color, Glyph, Mesh, RasterState, Rect, RenderingContext, Shader, Size,
    Texture, TexturedVertex, WorldTransform,
};
use pyxis_test_utils::MockRenderContext;
use std::sync::Arc;

fn rendering() -> (Arc<MockRenderContext>, RenderingContext) {
    let mock = Arc::new(MockRenderContext::new());
    let mut ctx = RenderingContext::new(mock.clone());
    ctx.begin_frame(Size::new(320.0, 240.0));
    mock.clear_calls();
    (mock, ctx)
}

fn font(mock: &MockRenderContext) -> BitmapFont {
    let atlas = Texture::new(mock, "font", 64, 64);
    BitmapFont::from_grid("mono8", atlas, Size::new(8, 16), 0, 'A', 26).unwrap()
}

fn textured_positions(ctx: &RenderingContext) -> Vec<Vec2> {
    let store = ctx.batches().batch().store();
    (0..store.vertex_count())
        .map(|i| Vec2::from(store.vertex::<TexturedVertex>(i).position))
        .collect()
}

#[test]
fn text_lays_out_lines() {
    let (mock, mut ctx) = rendering();
    let font = font(&mock);

    ctx.draw_text(&font, "AB\nC", Vec2::new(10.0, 20.0), 1.0, Color::WHITE, BlendMode::Alpha);

    let p = textured_positions(&ctx);
    assert_eq!(p.len(), 12);
    assert_eq!(p[0], Vec2::new(10.0, 20.0));
    assert_eq!(p[4], Vec2::new(18.0, 20.0));
    assert_eq!(p[8], Vec2::new(10.0, 36.0));
    assert_eq!(p[11], Vec2::new(18.0, 52.0));

    ctx.flush();
    assert_eq!(mock.draws()[0].textures[0], Some(font.texture().handle().get()));
}

#[test]
fn missing_glyph_is_skipped_without_advancing() {
    let (mock, mut ctx) = rendering();
    let font = font(&mock);

    ctx.draw_text(&font, "A?B", Vec2::ZERO, 2.0, Color::WHITE, BlendMode::Alpha);

    let p = textured_positions(&ctx);
    assert_eq!(p.len(), 8);
    assert_eq!(p[4], Vec2::new(16.0, 0.0));
    assert_eq!(p[7], Vec2::new(32.0, 32.0));
}

#[test]
fn glyph_offset_and_uv() {
    let (mock, mut ctx) = rendering();
    let mut font = BitmapFont::new("custom", Texture::new(mock.as_ref(), "font", 32, 32), 10.0);
    font.add_glyph(
        'x',
        Glyph::new(Rect::new(16.0, 0.0, 8.0, 8.0), Vec2::new(1.0, 2.0), 9.0),
    )
    .unwrap();

    ctx.draw_text(&font, "xx", Vec2::new(100.0, 100.0), 1.0, Color::WHITE, BlendMode::Alpha);

    let store = ctx.batches().batch().store();
    let first: TexturedVertex = store.vertex(0);
    let second: TexturedVertex = store.vertex(4);
    assert_eq!(first.position, [101.0, 102.0]);
    assert_eq!(first.uv, [0.5, 0.0]);
    assert_eq!(second.position, [110.0, 102.0]);
    assert_eq!(store.vertex::<TexturedVertex>(3).uv, [0.75, 0.25]);
}

#[test]
fn measure_text_spans_longest_line() {
    let (mock, ctx) = rendering();
    let font = font(&mock);

    assert_eq!(ctx.measure_text(&font, "ABC\nA", 1.0), Size::new(24.0, 32.0));
    assert_eq!(ctx.measure_text(&font, "A?A", 2.0), Size::new(32.0, 32.0));
    assert_eq!(ctx.measure_text(&font, "", 1.0), Size::new(0.0, 0.0));
}

#[test]
fn world_transform_moves_every_vertex() {
    let (mock, mut ctx) = rendering();
    let texture = Texture::new(mock.as_ref(), "sprite", 4, 4);

    ctx.with_world_transform(WorldTransform::from_translation(Vec2::new(50.0, 60.0)), |ctx| {
        ctx.draw_texture(&texture, Vec2::new(1.0, 1.0), Color::WHITE, BlendMode::Alpha);
    });
    ctx.draw_texture(&texture, Vec2::new(1.0, 1.0), Color::WHITE, BlendMode::Alpha);

    let p = textured_positions(&ctx);
    assert_eq!(p[0], Vec2::new(51.0, 61.0));
    assert_eq!(p[3], Vec2::new(55.0, 65.0));
    assert_eq!(p[4], Vec2::new(1.0, 1.0));
}

#[test]
fn texture_ex_rotates_uv_mapped_quad() {
    let (mock, mut ctx) = rendering();
    let texture = Texture::new(mock.as_ref(), "sheet", 32, 32);

    ctx.draw_texture_ex(
        &texture,
        Some(Rect::new(0.0, 0.0, 16.0, 16.0)),
        Rect::new(10.0, 10.0, 16.0, 16.0),
        Vec2::ZERO,
        std::f32::consts::PI,
        Color::WHITE,
        BlendMode::Alpha,
    );

    let store = ctx.batches().batch().store();
    let br: TexturedVertex = store.vertex(3);
    assert!((Vec2::from(br.position) - Vec2::new(-6.0, -6.0)).length() < 1e-4);
    assert_eq!(br.uv, [0.5, 0.5]);
}

#[test]
fn outlines_use_indexed_lines() {
    let (mock, mut ctx) = rendering();
    ctx.draw_rectangle_outline(Rect::new(0.0, 0.0, 4.0, 2.0), Color::WHITE, BlendMode::Alpha);
    ctx.draw_triangle_outline(Vec2::ZERO, Vec2::X, Vec2::Y, Color::WHITE, BlendMode::Alpha);
    ctx.draw_polygon_outline(&[Vec2::ZERO, Vec2::X], Color::WHITE, BlendMode::Alpha);
    ctx.end_frame();

    let draws = mock.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].topology, wgpu::PrimitiveTopology::LineList);
    // 4 + 3 closed edges and one open segment.
    assert_eq!(draws[0].count, (4 + 3 + 1) * 2);
}

#[test]
fn mesh_draw_enables_depth_and_culling() {
    let (mock, mut ctx) = rendering();
    let mut cube = Mesh::cube(mock.clone(), 1.0);
    let mut shader = Shader::mesh(mock.clone());

    ctx.draw_rectangle(Rect::new(0.0, 0.0, 1.0, 1.0), Color::RED, BlendMode::Alpha);
    ctx.flush();
    cube.draw(&mut shader, None);

    let draws = mock.draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].raster, RasterState::overlay(BlendMode::Alpha.to_blend_state()));

    let mesh = &draws[1];
    assert_eq!(mesh.raster, RasterState::opaque_3d());
    assert!(mesh.indexed);
    assert_eq!(mesh.count, 36);
    assert_eq!(mesh.vertex_stride, 32);
    assert_eq!(mesh.shader_id, Some(shader.module().id()));
    assert_eq!(mesh.textures, [None, None]);
}

#[test]
fn mesh_uploads_once() {
    let mock = Arc::new(MockRenderContext::new());
    let mut plane = Mesh::plane(mock.clone(), 2.0, 2.0);
    let mut shader = Shader::mesh(mock.clone());

    plane.draw(&mut shader, None);
    let writes = mock.buffer_writes(plane.store().vertex_buffer()).len();
    plane.draw(&mut shader, None);

    assert_eq!(writes, 1);
    assert_eq!(mock.buffer_writes(plane.store().vertex_buffer()).len(), 1);
    assert_eq!(mock.count_draws(), 2);
}
