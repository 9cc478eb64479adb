//! Mock implementation of RenderContext for testing.
//!
//! This module provides a mock GPU context that records operations
//! without actually interacting with the GPU. Draws record the state that
//! was bound when they were issued.

use crate::{
    gpu_types::*,
    render_context::{DrawIndexed, PipelineDescriptor, RenderContext},
};
use parking_lot::Mutex;
use wgpu::*;

/// Records a GPU operation call for verification in tests.
#[derive(Debug, Clone)]
pub enum RenderCall {
    CreateBuffer {
        id: usize,
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        data: Vec<u8>,
    },
    DestroyBuffer {
        buffer_id: usize,
    },
    CreateTexture {
        id: usize,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    WriteTexture {
        texture_id: usize,
        size: usize,
    },
    CreateShaderModule {
        label: Option<String>,
    },
    CreateRenderPipeline {
        label: Option<String>,
    },
    SetVertexBuffer {
        buffer_id: Option<usize>,
    },
    SetIndexBuffer {
        buffer_id: Option<usize>,
        format: IndexFormat,
    },
    SetTexture {
        unit: u32,
        texture_id: Option<usize>,
    },
    SetPipeline {
        pipeline_id: usize,
    },
    SetUniforms {
        data: Vec<u8>,
    },
    DrawIndexed(DrawRecord),
}

/// A draw call together with the state bound when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub draw: DrawIndexed,
    pub vertex_buffer: Option<usize>,
    pub index_buffer: Option<usize>,
    pub index_format: Option<IndexFormat>,
    pub texture: Option<usize>,
    pub pipeline: Option<usize>,
}

/// Mock buffers stored in the context.
#[derive(Debug, Clone)]
struct MockBuffer {
    size: u64,
    destroyed: bool,
}

/// Mock textures stored in the context.
#[derive(Debug, Clone)]
struct MockTexture {
    width: u32,
    height: u32,
    format: TextureFormat,
}

#[derive(Debug, Default)]
struct BoundState {
    vertex_buffer: Option<usize>,
    index_buffer: Option<(usize, IndexFormat)>,
    texture: Option<usize>,
    pipeline: Option<usize>,
}

/// Mock implementation of RenderContext for testing.
///
/// # Borrow Checking Pattern: Interior Mutability
///
/// Methods take `&self` but need to mutate internal state (record calls).
/// Solution: Use `Mutex<Vec<RenderCall>>` for interior mutability.
///
/// ## Why Mutex instead of RefCell?
/// - `Mutex` is `Send + Sync` (required for RenderContext trait)
/// - `RefCell` is `!Sync`, so can't be used in multi-threaded contexts
/// - `parking_lot::Mutex` has less overhead than `std::sync::Mutex`
///
/// Writes are checked the way wgpu validates them: a write past the end of
/// a buffer, a misaligned write, or any use of a destroyed buffer panics.
///
/// # Example
///
/// ```rust
/// use sable_test_utils::{MockRenderContext, RenderContext};
/// use wgpu::*;
///
/// let mock = MockRenderContext::new();
///
/// // Create a buffer (mock)
/// let buffer = mock.create_buffer(&BufferDescriptor {
///     label: None,
///     size: 1024,
///     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
///     mapped_at_creation: false,
/// });
///
/// // Verify it was mocked
/// assert!(buffer.is_mock());
///
/// // Check recorded calls
/// assert_eq!(mock.count_buffer_creates(), 1);
/// ```
pub struct MockRenderContext {
    /// Recorded calls for verification
    calls: Mutex<Vec<RenderCall>>,

    /// Mock buffers (we don't create real GPU buffers)
    buffers: Mutex<Vec<MockBuffer>>,

    /// Mock textures
    textures: Mutex<Vec<MockTexture>>,

    /// Currently bound draw state
    bound: Mutex<BoundState>,

    /// Diagnostic returned by the next shader compilations, if set
    shader_error: Mutex<Option<String>>,

    /// Counters for generating IDs
    next_shader_id: Mutex<usize>,
    next_pipeline_id: Mutex<usize>,
}

impl MockRenderContext {
    /// Create a new mock render context.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
            textures: Mutex::new(Vec::new()),
            bound: Mutex::new(BoundState::default()),
            shader_error: Mutex::new(None),
            next_shader_id: Mutex::new(0),
            next_pipeline_id: Mutex::new(0),
        }
    }

    /// Create a mock whose shader compilations fail with `diagnostic`.
    pub fn with_shader_error(diagnostic: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.fail_shader_compilation(Some(diagnostic.into()));
        mock
    }

    /// Make subsequent shader compilations fail with `diagnostic`, or succeed
    /// again with `None`.
    pub fn fail_shader_compilation(&self, diagnostic: Option<String>) {
        *self.shader_error.lock() = diagnostic;
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Count calls of a specific type.
    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    /// Count buffer write operations.
    pub fn count_buffer_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    /// Count buffer destroy operations.
    pub fn count_buffer_destroys(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::DestroyBuffer { .. }))
    }

    /// Count texture creates.
    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateTexture { .. }))
    }

    /// Count shader module creates, including failed ones.
    pub fn count_shader_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateShaderModule { .. }))
    }

    /// Count render pipeline creates.
    pub fn count_render_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateRenderPipeline { .. }))
    }

    /// Count indexed draws.
    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::DrawIndexed(_)))
    }

    /// All draws in the order they were issued.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::DrawIndexed(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// All `(offset, data)` writes made to `buffer`, in order.
    pub fn buffer_writes(&self, buffer: &GpuBuffer) -> Vec<(u64, Vec<u8>)> {
        let Some(id) = buffer.mock_id() else {
            return Vec::new();
        };
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::WriteBuffer {
                    buffer_id,
                    offset,
                    data,
                } if *buffer_id == id => Some((*offset, data.clone())),
                _ => None,
            })
            .collect()
    }

    /// Ids of destroyed buffers, in destruction order.
    pub fn destroyed_buffers(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::DestroyBuffer { buffer_id } => Some(*buffer_id),
                _ => None,
            })
            .collect()
    }

    /// Number of buffers created and not yet destroyed.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.lock().iter().filter(|b| !b.destroyed).count()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().push(call);
    }

    fn live_buffer_id(&self, buffer: &GpuBuffer) -> usize {
        let id = buffer
            .mock_id()
            .unwrap_or_else(|| panic!("real buffer passed to MockRenderContext"));
        let buffers = self.buffers.lock();
        let state = buffers
            .get(id)
            .unwrap_or_else(|| panic!("buffer {} was not created by this context", id));
        assert!(!state.destroyed, "buffer {} used after destroy", id);
        id
    }

    fn texture_id(&self, texture: &GpuTexture) -> usize {
        let id = texture
            .mock_id()
            .unwrap_or_else(|| panic!("real texture passed to MockRenderContext"));
        assert!(
            id < self.textures.lock().len(),
            "texture {} was not created by this context",
            id
        );
        id
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut buffers = self.buffers.lock();
        let id = buffers.len();

        buffers.push(MockBuffer {
            size: desc.size,
            destroyed: false,
        });

        self.record(RenderCall::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let buffer_id = self.live_buffer_id(buffer);
        let size = self.buffers.lock()[buffer_id].size;

        assert!(
            offset % COPY_BUFFER_ALIGNMENT == 0 && data.len() as u64 % COPY_BUFFER_ALIGNMENT == 0,
            "misaligned write of {} bytes at offset {}",
            data.len(),
            offset
        );
        assert!(
            offset + data.len() as u64 <= size,
            "write of {} bytes at offset {} overflows buffer of {} bytes",
            data.len(),
            offset,
            size
        );

        self.record(RenderCall::WriteBuffer {
            buffer_id,
            offset,
            data: data.to_vec(),
        });
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        let buffer_id = self.live_buffer_id(buffer);
        self.buffers.lock()[buffer_id].destroyed = true;

        let mut bound = self.bound.lock();
        if bound.vertex_buffer == Some(buffer_id) {
            bound.vertex_buffer = None;
        }
        if bound.index_buffer.is_some_and(|(id, _)| id == buffer_id) {
            bound.index_buffer = None;
        }
        drop(bound);

        self.record(RenderCall::DestroyBuffer { buffer_id });
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let mut textures = self.textures.lock();
        let id = textures.len();

        textures.push(MockTexture {
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        });

        self.record(RenderCall::CreateTexture {
            id,
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        });

        GpuTexture::mock(id, desc.size.width, desc.size.height, desc.format)
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8]) {
        let texture_id = self.texture_id(texture);
        let expected = {
            let textures = self.textures.lock();
            let t = &textures[texture_id];
            let block_size = t.format.block_copy_size(None).unwrap_or(4);
            (t.width * t.height * block_size) as usize
        };
        assert_eq!(
            data.len(),
            expected,
            "texture {} expects {} bytes",
            texture_id,
            expected
        );

        self.record(RenderCall::WriteTexture {
            texture_id,
            size: data.len(),
        });
    }

    fn create_shader_module(
        &self,
        label: Option<&str>,
        _source: &str,
    ) -> Result<GpuShaderModule, String> {
        self.record(RenderCall::CreateShaderModule {
            label: label.map(|s| s.to_string()),
        });

        if let Some(diagnostic) = self.shader_error.lock().clone() {
            return Err(diagnostic);
        }

        let mut id = self.next_shader_id.lock();
        let shader_id = *id;
        *id += 1;

        Ok(GpuShaderModule::mock(shader_id))
    }

    fn create_render_pipeline(&self, desc: &PipelineDescriptor) -> GpuRenderPipeline {
        assert!(desc.module.is_mock(), "real shader module passed to MockRenderContext");

        let mut id = self.next_pipeline_id.lock();
        let pipeline_id = *id;
        *id += 1;

        self.record(RenderCall::CreateRenderPipeline {
            label: desc.label.map(|s| s.to_string()),
        });

        GpuRenderPipeline::mock(pipeline_id)
    }

    fn set_vertex_buffer(&self, buffer: Option<&GpuBuffer>) {
        let buffer_id = buffer.map(|b| self.live_buffer_id(b));
        self.bound.lock().vertex_buffer = buffer_id;
        self.record(RenderCall::SetVertexBuffer { buffer_id });
    }

    fn set_index_buffer(&self, buffer: Option<&GpuBuffer>, format: IndexFormat) {
        let buffer_id = buffer.map(|b| self.live_buffer_id(b));
        self.bound.lock().index_buffer = buffer_id.map(|id| (id, format));
        self.record(RenderCall::SetIndexBuffer { buffer_id, format });
    }

    fn set_texture(&self, unit: u32, texture: Option<&GpuTexture>) {
        let texture_id = texture.map(|t| self.texture_id(t));
        // Only unit 0 is sampled by the sprite pipeline.
        if unit == 0 {
            self.bound.lock().texture = texture_id;
        }
        self.record(RenderCall::SetTexture { unit, texture_id });
    }

    fn set_pipeline(&self, pipeline: &GpuRenderPipeline) {
        let pipeline_id = pipeline
            .mock_id()
            .unwrap_or_else(|| panic!("real pipeline passed to MockRenderContext"));
        self.bound.lock().pipeline = Some(pipeline_id);
        self.record(RenderCall::SetPipeline { pipeline_id });
    }

    fn set_uniforms(&self, data: &[u8]) {
        self.record(RenderCall::SetUniforms {
            data: data.to_vec(),
        });
    }

    fn draw_indexed(&self, draw: DrawIndexed) {
        let record = {
            let bound = self.bound.lock();
            DrawRecord {
                draw,
                vertex_buffer: bound.vertex_buffer,
                index_buffer: bound.index_buffer.map(|(id, _)| id),
                index_format: bound.index_buffer.map(|(_, format)| format),
                texture: bound.texture,
                pipeline: bound.pipeline,
            }
        };
        self.record(RenderCall::DrawIndexed(record));
    }
}
