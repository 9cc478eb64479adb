//! Benchmarks for sprite batching

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sable_render::glam::Vec2;
use sable_render::{SpriteBatcher, SpriteDesc, SpriteEffect, SpriteSortMode, Texture2D};
use sable_test_utils::MockRenderContext;

struct Scene {
    mock: Arc<MockRenderContext>,
    batcher: SpriteBatcher,
    effect: SpriteEffect,
    textures: Vec<Arc<Texture2D>>,
}

fn setup(texture_count: usize) -> Scene {
    let mock = Arc::new(MockRenderContext::new());
    let effect = SpriteEffect::new(mock.as_ref(), wgpu::TextureFormat::Rgba8UnormSrgb).unwrap();
    let textures = (0..texture_count)
        .map(|_| Arc::new(Texture2D::new(mock.as_ref(), 32, 32, None).unwrap()))
        .collect();
    let batcher = SpriteBatcher::new(mock.clone());
    Scene {
        mock,
        batcher,
        effect,
        textures,
    }
}

fn run(scene: &mut Scene, mode: SpriteSortMode, count: usize) {
    scene.batcher.begin(mode);
    for i in 0..count {
        let texture = &scene.textures[i % scene.textures.len()];
        let desc = SpriteDesc::new(Vec2::new(i as f32, (i / 64) as f32), Vec2::splat(16.0))
            .with_rotation(i as f32 * 0.01)
            .with_layer_depth((i % 100) as f32 / 100.0);
        scene.batcher.draw(texture, &desc);
    }
    black_box(scene.batcher.end(&scene.effect));
    scene.mock.clear_calls();
}

fn bench_single_texture(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_texture");

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut scene = setup(1);
            b.iter(|| run(&mut scene, SpriteSortMode::Deferred, count));
        });
    }

    group.finish();
}

fn bench_sort_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_modes");
    let count = 5000;
    group.throughput(Throughput::Elements(count as u64));

    for (name, mode) in [
        ("deferred", SpriteSortMode::Deferred),
        ("texture", SpriteSortMode::Texture),
        ("back_to_front", SpriteSortMode::BackToFront),
        ("front_to_back", SpriteSortMode::FrontToBack),
    ] {
        group.bench_function(name, |b| {
            let mut scene = setup(8);
            b.iter(|| run(&mut scene, mode, count));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_texture, bench_sort_modes);
criterion_main!(benches);
