//! Implementation of RenderContext trait for GraphicsContext.
//!
//! This allows GraphicsContext to be used polymorphically with the
//! RenderContext trait, enabling testing with MockRenderContext.

use crate::context::{GraphicsContext, UNIFORM_BLOCK_SIZE};
use sable_core::profiling::profile_function;
use sable_test_utils::{
    DrawIndexed, GpuBuffer, GpuRenderPipeline, GpuShaderModule, GpuTexture, PipelineDescriptor,
    RenderContext,
};
use wgpu::{BufferDescriptor, IndexFormat, TextureDescriptor};

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let buffer = self.device.create_buffer(desc);
        GpuBuffer::from_wgpu(buffer)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let wgpu_buffer = buffer.as_wgpu();
        self.queue.write_buffer(wgpu_buffer, offset, data);
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        let wgpu_buffer = buffer.as_wgpu();
        {
            let mut state = self.state.lock();
            if state.vertex_buffer.as_ref() == Some(wgpu_buffer) {
                state.vertex_buffer = None;
            }
            if state
                .index_buffer
                .as_ref()
                .is_some_and(|(bound, _)| bound == wgpu_buffer)
            {
                state.index_buffer = None;
            }
        }
        wgpu_buffer.destroy();
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let texture = self.device.create_texture(desc);
        GpuTexture::from_wgpu(texture)
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8]) {
        let wgpu_texture = texture.as_wgpu();
        let bytes_per_texel = wgpu_texture.format().block_copy_size(None).unwrap_or(4);
        let width = wgpu_texture.width();
        let height = wgpu_texture.height();

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: wgpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_texel),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_shader_module(
        &self,
        label: Option<&str>,
        source: &str,
    ) -> Result<GpuShaderModule, String> {
        profile_function!();
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label,
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(GpuShaderModule::from_wgpu(module)),
        }
    }

    fn create_render_pipeline(&self, desc: &PipelineDescriptor) -> GpuRenderPipeline {
        profile_function!();
        let module = desc.module.as_wgpu();
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label,
                layout: Some(&self.resources.pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(desc.vertex_entry),
                    buffers: std::slice::from_ref(&desc.vertex_layout),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(desc.fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.target_format,
                        blend: desc.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });
        GpuRenderPipeline::from_wgpu(pipeline)
    }

    fn set_vertex_buffer(&self, buffer: Option<&GpuBuffer>) {
        self.state.lock().vertex_buffer = buffer.map(|b| b.as_wgpu().clone());
    }

    fn set_index_buffer(&self, buffer: Option<&GpuBuffer>, format: IndexFormat) {
        self.state.lock().index_buffer = buffer.map(|b| (b.as_wgpu().clone(), format));
    }

    fn set_texture(&self, unit: u32, texture: Option<&GpuTexture>) {
        if unit != 0 {
            tracing::warn!("Texture unit {} is not supported, only unit 0 is bound", unit);
            return;
        }
        self.state.lock().texture = texture.map(|t| t.view().clone());
    }

    fn set_pipeline(&self, pipeline: &GpuRenderPipeline) {
        self.state.lock().pipeline = Some(pipeline.as_wgpu().clone());
    }

    fn set_uniforms(&self, data: &[u8]) {
        debug_assert!(
            data.len() as u64 <= UNIFORM_BLOCK_SIZE,
            "uniform block is {} bytes, got {}",
            UNIFORM_BLOCK_SIZE,
            data.len()
        );
        self.queue
            .write_buffer(&self.resources.uniform_buffer, 0, data);
    }

    fn draw_indexed(&self, draw: DrawIndexed) {
        profile_function!();
        let state = self.state.lock();

        let Some(target) = state.target.as_ref() else {
            tracing::warn!("draw_indexed without a render target, skipping");
            return;
        };
        let Some(pipeline) = state.pipeline.as_ref() else {
            tracing::warn!("draw_indexed without a pipeline, skipping");
            return;
        };
        let (Some(vertex_buffer), Some((index_buffer, index_format))) =
            (state.vertex_buffer.as_ref(), state.index_buffer.as_ref())
        else {
            tracing::warn!("draw_indexed without vertex and index buffers, skipping");
            return;
        };

        let texture_view = state
            .texture
            .as_ref()
            .unwrap_or(&self.resources.fallback_view);
        let texture_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sable_texture_bind_group"),
            layout: &self.resources.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.resources.sampler),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sable_draw"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sable_draw_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &texture_bind_group, &[]);
            pass.set_bind_group(1, &self.resources.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), *index_format);
            pass.draw_indexed(draw.index_range(), draw.base_vertex, 0..1);
        }
        drop(state);

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "mock")]
    use sable_test_utils::MockRenderContext;

    #[test]
    #[cfg(feature = "mock")]
    fn test_render_context_trait_object() {
        // GraphicsContext and MockRenderContext are interchangeable behind the trait
        let mock_ctx = MockRenderContext::new();

        fn uses_render_context(ctx: &dyn RenderContext) {
            let buffer = ctx.create_buffer(&BufferDescriptor {
                label: Some("Test Buffer"),
                size: 256,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            ctx.set_vertex_buffer(Some(&buffer));
            ctx.destroy_buffer(&buffer);
        }

        uses_render_context(&mock_ctx);
        assert_eq!(mock_ctx.count_buffer_creates(), 1);
        assert_eq!(mock_ctx.count_buffer_destroys(), 1);
    }
}
