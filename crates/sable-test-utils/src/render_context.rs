//! Trait abstracting GPU operations for testing.
//!
//! The `RenderContext` trait covers resource creation and an immediate-mode
//! draw state: bind a vertex buffer, an index buffer, textures and a
//! pipeline, then issue indexed draws. Both the real device and
//! `MockRenderContext` implement it.

use crate::gpu_types::*;
use wgpu::{
    BlendState, BufferDescriptor, IndexFormat, TextureDescriptor, TextureFormat,
    VertexBufferLayout,
};

/// Describes a render pipeline built from one shader module.
///
/// The bind group layout is owned by the context: textures are bound on
/// group 0 and the uniform block on group 1.
#[derive(Clone, Debug)]
pub struct PipelineDescriptor<'a> {
    pub label: Option<&'a str>,
    pub module: &'a GpuShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub vertex_layout: VertexBufferLayout<'a>,
    pub target_format: TextureFormat,
    pub blend: Option<BlendState>,
}

/// Parameters of an indexed triangle-list draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawIndexed {
    /// Added to every index before fetching a vertex.
    pub base_vertex: i32,
    /// Lowest vertex index the draw touches.
    pub min_vertex_index: u32,
    /// Number of vertices the draw touches, starting at `min_vertex_index`.
    pub vertex_count: u32,
    /// First index read from the bound index buffer.
    pub start_index: u32,
    /// Number of triangles.
    pub primitive_count: u32,
}

impl DrawIndexed {
    /// Number of indices consumed by the draw.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.primitive_count * 3
    }

    /// Index range in the bound index buffer.
    #[inline]
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.start_index..self.start_index + self.index_count()
    }
}

/// Trait abstracting GPU resource creation and draw submission.
///
/// # Lifetime Considerations
///
/// This trait does NOT use lifetimes because:
/// 1. All returned types are owned (not borrowed from Device)
/// 2. GPU resources use reference counting internally
/// 3. Resources live until dropped
///
/// This makes the trait object-safe and easy to mock.
///
/// # Borrow Checking Pattern
///
/// Methods take `&self` (shared reference) and return owned wrapper types.
/// This allows:
/// - Multiple components to share the same context (via Arc)
/// - Implementations to use interior mutability (Mutex)
/// - No lifetime parameters propagating through the codebase
///
/// # Example
///
/// ```rust,no_run
/// use sable_test_utils::RenderContext;
/// use wgpu::{BufferDescriptor, BufferUsages};
///
/// fn upload(ctx: &dyn RenderContext) {
///     let desc = BufferDescriptor {
///         label: None,
///         size: 16,
///         usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     };
///     let data = vec![0u8; 16];
///     let buffer = ctx.create_buffer(&desc);
///     ctx.write_buffer(&buffer, 0, &data);
///     ctx.destroy_buffer(&buffer);
/// }
/// ```
pub trait RenderContext: Send + Sync {
    // Buffer operations

    /// Create a GPU buffer.
    ///
    /// Returns an owned `GpuBuffer` which can be either real or mock.
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Write data to a buffer at a byte offset.
    ///
    /// Offset and length must be multiples of `wgpu::COPY_BUFFER_ALIGNMENT`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Release a buffer's GPU memory. The buffer must not be used afterwards.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    // Texture operations

    /// Create a GPU texture.
    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture;

    /// Upload tightly packed texel data covering the whole first mip level.
    fn write_texture(&self, texture: &GpuTexture, data: &[u8]);

    // Shader operations

    /// Compile a WGSL shader module.
    ///
    /// On failure the error carries the compiler's diagnostic text.
    fn create_shader_module(&self, label: Option<&str>, source: &str)
    -> Result<GpuShaderModule, String>;

    // Pipeline operations

    /// Create a render pipeline.
    fn create_render_pipeline(&self, desc: &PipelineDescriptor) -> GpuRenderPipeline;

    // Draw state

    /// Bind (or unbind with `None`) the vertex buffer for slot 0.
    fn set_vertex_buffer(&self, buffer: Option<&GpuBuffer>);

    /// Bind (or unbind with `None`) the index buffer.
    fn set_index_buffer(&self, buffer: Option<&GpuBuffer>, format: IndexFormat);

    /// Bind (or unbind with `None`) a texture unit.
    fn set_texture(&self, unit: u32, texture: Option<&GpuTexture>);

    /// Select the pipeline used by subsequent draws.
    fn set_pipeline(&self, pipeline: &GpuRenderPipeline);

    /// Replace the contents of the uniform block.
    fn set_uniforms(&self, data: &[u8]);

    /// Issue an indexed triangle-list draw with the current draw state.
    fn draw_indexed(&self, draw: DrawIndexed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_indexed_ranges() {
        let draw = DrawIndexed {
            base_vertex: 0,
            min_vertex_index: 8,
            vertex_count: 12,
            start_index: 12,
            primitive_count: 6,
        };

        assert_eq!(draw.index_count(), 18);
        assert_eq!(draw.index_range(), 12..30);
    }
}
