//! Graphics context lifecycle and offscreen rendering tests.

use glam::Vec2;
use pyxis_render::{
    BlendMode, Circle, Color, GraphicsContext, GraphicsError, Rect, RenderTarget,
    RenderingContext, Size, Texture,
};
use std::sync::Arc;

fn offscreen_target(ctx: &GraphicsContext, width: u32, height: u32) -> RenderTarget {
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    RenderTarget::new(
        texture.create_view(&wgpu::TextureViewDescriptor::default()),
        format,
    )
}

#[test]
#[ignore] // Requires GPU - run with: cargo test --test context_tests -- --ignored
fn test_context_creation_sync() {
    match GraphicsContext::new_owned_sync() {
        Ok(ctx) => {
            assert_eq!(Arc::strong_count(&ctx), 1);
            assert!(ctx.limits().max_texture_dimension_2d > 0);
        }
        Err(e) => {
            // Allow test to pass if no GPU (CI environments)
            println!("GPU not available: {}", e);
        }
    }
}

#[test]
#[ignore] // Requires GPU
fn test_batched_frame_renders_offscreen() {
    let Ok(graphics) = GraphicsContext::new_owned_sync() else {
        return;
    };
    graphics.set_render_target(offscreen_target(&graphics, 128, 128));

    let mut ctx = RenderingContext::new(graphics.clone());
    ctx.begin_frame(Size::new(128.0, 128.0));
    ctx.draw_rectangle(Rect::new(8.0, 8.0, 32.0, 32.0), Color::RED, BlendMode::Alpha);
    ctx.draw_circle(
        Circle::new(Vec2::new(64.0, 64.0), 20.0),
        0,
        Color::GREEN,
        BlendMode::Alpha,
    );
    let stats = ctx.end_frame();

    assert_eq!(stats.draw_calls, 1);
    assert_eq!(graphics.pipeline_count(), 1);
}

#[test]
#[ignore] // Requires GPU
fn test_textured_and_untextured_pipelines_are_cached() {
    let Ok(graphics) = GraphicsContext::new_owned_sync() else {
        return;
    };
    graphics.set_render_target(offscreen_target(&graphics, 64, 64));
    let texture = Texture::from_rgba8(graphics.as_ref(), "checker", 2, 2, &[255; 16]);

    let mut ctx = RenderingContext::new(graphics.clone());
    for _ in 0..3 {
        ctx.begin_frame(Size::new(64.0, 64.0));
        ctx.draw_texture(&texture, Vec2::ZERO, Color::WHITE, BlendMode::Alpha);
        ctx.draw_rectangle(Rect::new(0.0, 0.0, 4.0, 4.0), Color::BLUE, BlendMode::Alpha);
        assert_eq!(ctx.end_frame().draw_calls, 2);
    }

    assert_eq!(graphics.pipeline_count(), 2);
}

#[test]
fn test_graphics_error_display() {
    assert_eq!(
        GraphicsError::NoAdapter.to_string(),
        "no suitable GPU adapter found"
    );
    assert_eq!(
        GraphicsError::DeviceCreation("lost".into()).to_string(),
        "failed to create GPU device: lost"
    );
}
