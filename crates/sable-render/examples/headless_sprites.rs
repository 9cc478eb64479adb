//! Headless sprite batching.
//!
//! Renders a grid of rotated sprites into an offscreen texture and logs the
//! batch statistics for each sort mode.
//!
//! Run with `RUST_LOG=sable_render=debug cargo run --example headless_sprites`.

use std::sync::Arc;

use sable_core::config::Config;
use sable_render::glam::Vec2;
use sable_render::{
    Color, GraphicsContext, RenderContext, SpriteBatcher, SpriteDesc, SpriteEffect,
    SpriteEffects, SpriteSortMode, Texture2D,
};

const WIDTH: u32 = 512;
const HEIGHT: u32 = 512;

fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / 4 + y / 4) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    sable_core::init(&Config::default());

    let ctx = GraphicsContext::new_owned_sync()?;
    tracing::info!("Using adapter: {:?}", ctx.info());

    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let (_target, view) = ctx.create_render_target(WIDTH, HEIGHT, format);
    ctx.set_render_target(Some(view));

    let render: Arc<dyn RenderContext> = ctx.clone();
    let mut effect = SpriteEffect::new(render.as_ref(), format)?;
    effect.set_viewport(WIDTH as f32, HEIGHT as f32);

    let textures = [
        Arc::new(Texture2D::from_rgba8(render.as_ref(), 16, 16, &checkerboard(16), Some("checker"))?),
        Arc::new(Texture2D::solid(render.as_ref(), [255, 255, 255, 255], Some("white"))?),
    ];

    let mut batcher = SpriteBatcher::new(render);

    for mode in [
        SpriteSortMode::Deferred,
        SpriteSortMode::Texture,
        SpriteSortMode::BackToFront,
    ] {
        ctx.clear(Color::CORNFLOWER_BLUE);
        batcher.begin(mode);

        for i in 0..1024u32 {
            let texture = &textures[(i % 2) as usize];
            let position = Vec2::new((i % 32) as f32 * 16.0, (i / 32) as f32 * 16.0);
            let effects = if i % 3 == 0 {
                SpriteEffects::FLIP_HORIZONTALLY
            } else {
                SpriteEffects::empty()
            };
            let desc = SpriteDesc::new(position, Vec2::splat(14.0))
                .with_origin(Vec2::splat(7.0))
                .with_rotation(i as f32 * 0.05)
                .with_color(Color::rgb(1.0, (i % 7) as f32 / 7.0, 0.5))
                .with_effects(effects)
                .with_layer_depth((i % 10) as f32 / 10.0);
            batcher.draw(texture, &desc);
        }

        let stats = batcher.end(&effect);
        tracing::info!(
            "{:?}: {} sprites in {} draws ({} texture switches)",
            mode,
            stats.item_count,
            stats.draw_calls,
            stats.texture_switches
        );
    }

    batcher.dispose();
    Ok(())
}
