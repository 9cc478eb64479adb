use std::sync::Arc;

use sable_core::profiling::profile_function;
use sable_test_utils::{DrawIndexed, GpuBuffer, RenderContext};

use super::MAX_BATCH;
use super::staging::StagingArena;
use crate::buffer::DynamicBuffer;
use crate::effect::Effect;
use crate::texture::Texture2D;
use crate::vertex::VertexPositionColorTexture;

const INDEX_STRIDE: usize = std::mem::size_of::<u16>();

/// Uploads staged runs and issues their draws.
///
/// Owns the two dynamic device buffers, sized for one full batch.
pub struct SpriteSubmitter {
    context: Arc<dyn RenderContext>,
    vertices: DynamicBuffer<VertexPositionColorTexture>,
    indices: DynamicBuffer<u16>,
}

impl SpriteSubmitter {
    pub fn new(context: Arc<dyn RenderContext>) -> Self {
        let vertices = DynamicBuffer::vertex(
            context.as_ref(),
            "sprite_batch_vertices",
            MAX_BATCH * StagingArena::VERTICES_PER_QUAD,
        );
        let indices = DynamicBuffer::index(
            context.as_ref(),
            "sprite_batch_indices",
            MAX_BATCH * StagingArena::INDICES_PER_QUAD,
        );

        Self {
            context,
            vertices,
            indices,
        }
    }

    pub fn context(&self) -> &Arc<dyn RenderContext> {
        &self.context
    }

    pub fn vertex_buffer(&self) -> &GpuBuffer {
        self.vertices.buffer()
    }

    pub fn index_buffer(&self) -> &GpuBuffer {
        self.indices.buffer()
    }

    /// Draws the `run_count` quads staged from `run_start` with `texture`,
    /// once per pass of `effect`. Returns the number of draws issued.
    pub fn flush(
        &mut self,
        effect: &dyn Effect,
        texture: &Texture2D,
        staging: &StagingArena,
        run_start: usize,
        run_count: usize,
    ) -> usize {
        if run_count == 0 {
            return 0;
        }
        profile_function!();

        let context: &dyn RenderContext = self.context.as_ref();
        let stride = VertexPositionColorTexture::STRIDE;

        let first_vertex = run_start * StagingArena::VERTICES_PER_QUAD;
        let vertex_count = run_count * StagingArena::VERTICES_PER_QUAD;
        self.vertices.set_data(
            context,
            (first_vertex * stride) as u64,
            staging.vertices(),
            first_vertex,
            vertex_count,
            stride,
        );

        let first_index = run_start * StagingArena::INDICES_PER_QUAD;
        let index_count = run_count * StagingArena::INDICES_PER_QUAD;
        self.indices.set_data(
            context,
            (first_index * INDEX_STRIDE) as u64,
            staging.indices(),
            first_index,
            index_count,
            INDEX_STRIDE,
        );

        context.set_vertex_buffer(Some(self.vertices.buffer()));
        context.set_index_buffer(Some(self.indices.buffer()), wgpu::IndexFormat::Uint16);
        context.set_texture(0, Some(texture.gpu()));

        let draw = DrawIndexed {
            base_vertex: 0,
            min_vertex_index: first_vertex as u32,
            vertex_count: vertex_count as u32,
            start_index: first_index as u32,
            primitive_count: (run_count * 2) as u32,
        };

        let passes = effect.pass_count();
        for pass in 0..passes {
            effect.apply_pass(pass, context);
            context.draw_indexed(draw);
        }

        context.set_index_buffer(None, wgpu::IndexFormat::Uint16);
        context.set_vertex_buffer(None);

        tracing::trace!(
            "Flushed {} sprites with texture {:?} in {} passes",
            run_count,
            texture.id(),
            passes
        );
        passes
    }

    /// Releases both device buffers.
    pub fn release(self) {
        let context = self.context.as_ref();
        self.vertices.destroy(context);
        self.indices.destroy(context);
        tracing::debug!("Released sprite batch buffers");
    }
}
