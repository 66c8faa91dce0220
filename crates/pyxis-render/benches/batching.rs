//! Benchmarks for sprite and shape batching against the mock context

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec2;
use pyxis_render::{BlendMode, Circle, Color, Rect, RenderingContext, Size, Texture};
use pyxis_test_utils::MockRenderContext;
use std::sync::Arc;

fn setup() -> (Arc<MockRenderContext>, RenderingContext) {
    let mock = Arc::new(MockRenderContext::new());
    let ctx = RenderingContext::new(mock.clone());
    (mock, ctx)
}

fn bench_same_texture_sprites(c: &mut Criterion) {
    let mut group = c.benchmark_group("same_texture_sprites");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mock, mut ctx) = setup();
            let texture = Texture::new(mock.as_ref(), "sprite", 16, 16);
            b.iter(|| {
                ctx.begin_frame(Size::new(1280.0, 720.0));
                for i in 0..count {
                    let position = Vec2::new((i % 80) as f32 * 16.0, (i / 80) as f32 * 16.0);
                    ctx.draw_texture(&texture, position, Color::WHITE, BlendMode::Alpha);
                }
                black_box(ctx.end_frame());
                mock.clear_calls();
            });
        });
    }

    group.finish();
}

fn bench_interleaved_textures(c: &mut Criterion) {
    let mut group = c.benchmark_group("interleaved_textures");

    group.bench_function("two_textures_1000", |b| {
        let (mock, mut ctx) = setup();
        let textures = [
            Texture::new(mock.as_ref(), "a", 16, 16),
            Texture::new(mock.as_ref(), "b", 16, 16),
        ];
        b.iter(|| {
            ctx.begin_frame(Size::new(1280.0, 720.0));
            for i in 0..1_000 {
                ctx.draw_texture(&textures[i % 2], Vec2::ZERO, Color::WHITE, BlendMode::Alpha);
            }
            black_box(ctx.end_frame());
            mock.clear_calls();
        });
    });

    group.finish();
}

fn bench_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("shapes");

    group.bench_function("rectangles_1000", |b| {
        let (mock, mut ctx) = setup();
        b.iter(|| {
            for i in 0..1_000 {
                let x = (i % 100) as f32 * 8.0;
                ctx.draw_rectangle(Rect::new(x, 0.0, 8.0, 8.0), Color::RED, BlendMode::Alpha);
            }
            black_box(ctx.end_frame());
            mock.clear_calls();
        });
    });

    group.bench_function("circles_100x36", |b| {
        let (mock, mut ctx) = setup();
        b.iter(|| {
            for i in 0..100 {
                let circle = Circle::new(Vec2::new(i as f32 * 10.0, 50.0), 5.0);
                ctx.draw_circle(circle, 36, Color::WHITE, BlendMode::Alpha);
            }
            black_box(ctx.end_frame());
            mock.clear_calls();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_same_texture_sprites,
    bench_interleaved_textures,
    bench_shapes
);
criterion_main!(benches);
