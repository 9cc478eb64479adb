//! Sable sprite renderer.
//!
//! Queue textured quads with a [`SpriteBatcher`], then flush them through an
//! [`Effect`] on any [`RenderContext`]: the wgpu-backed [`GraphicsContext`]
//! or, in tests, `MockRenderContext`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sable_render::glam::Vec2;
//! use sable_render::{
//!     Color, GraphicsContext, RenderContext, SpriteBatcher, SpriteDesc, SpriteEffect,
//!     SpriteSortMode, Texture2D,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = GraphicsContext::new_owned_sync()?;
//! let (_target, view) = ctx.create_render_target(320, 240, wgpu::TextureFormat::Rgba8UnormSrgb);
//! ctx.set_render_target(Some(view));
//! ctx.clear(Color::CORNFLOWER_BLUE);
//!
//! let render: Arc<dyn RenderContext> = ctx.clone();
//! let mut effect = SpriteEffect::new(render.as_ref(), wgpu::TextureFormat::Rgba8UnormSrgb)?;
//! effect.set_viewport(320.0, 240.0);
//!
//! let texture = Arc::new(Texture2D::solid(render.as_ref(), [255, 0, 0, 255], None)?);
//! let mut batcher = SpriteBatcher::new(render);
//! batcher.begin(SpriteSortMode::Deferred);
//! batcher.draw(&texture, &SpriteDesc::new(Vec2::new(16.0, 16.0), Vec2::new(32.0, 32.0)));
//! batcher.end(&effect);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod color;
pub mod context;
mod context_impl;
pub mod effect;
pub mod shader;
pub mod sprite_batch;
pub mod texture;
pub mod vertex;

pub use glam;
pub use wgpu;

pub use buffer::DynamicBuffer;
pub use color::Color;
pub use context::{GraphicsContext, GraphicsContextDescriptor, GraphicsError};
pub use effect::{Effect, EffectError, EffectPass, EffectTechnique, SpriteEffect};
pub use shader::{SPRITE_SHADER_SOURCE, Shader, ShaderError};
pub use sprite_batch::{
    BatchItem, MAX_BATCH, SourceRectangle, SpriteBatchStats, SpriteBatcher, SpriteDesc,
    SpriteEffects, SpriteSortMode,
};
pub use texture::{Texture2D, TextureError, TextureId};
pub use vertex::VertexPositionColorTexture;

pub use sable_test_utils::{
    DrawIndexed, GpuBuffer, GpuRenderPipeline, GpuShaderModule, GpuTexture, PipelineDescriptor,
    RenderContext,
};
