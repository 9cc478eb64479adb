//! Effects: ordered pass lists applied before each draw.

use std::fmt;

use glam::Mat4;
use sable_test_utils::{GpuRenderPipeline, PipelineDescriptor, RenderContext};

use crate::shader::{Shader, ShaderError};
use crate::vertex::VertexPositionColorTexture;

/// Anything the sprite batcher can draw through.
///
/// A flush issues one draw per pass, applying the pass right before it.
pub trait Effect {
    /// Number of passes in the active technique.
    fn pass_count(&self) -> usize;

    /// Binds the state of pass `index` on `context`.
    fn apply_pass(&self, index: usize, context: &dyn RenderContext);
}

/// Errors from configuring an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// No technique with this name exists
    UnknownTechnique(String),
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTechnique(name) => write!(f, "Unknown effect technique '{}'", name),
        }
    }
}

impl std::error::Error for EffectError {}

/// One pipeline state of a technique.
#[derive(Debug, Clone)]
pub struct EffectPass {
    name: String,
    pipeline: GpuRenderPipeline,
}

impl EffectPass {
    pub fn new(name: impl Into<String>, pipeline: GpuRenderPipeline) -> Self {
        Self {
            name: name.into(),
            pipeline,
        }
    }

    /// Builds a sprite pass from `shader` with the given blending.
    pub fn sprite(
        context: &dyn RenderContext,
        name: impl Into<String>,
        shader: &Shader,
        target_format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
    ) -> Self {
        let name = name.into();
        let label = format!("{}_{}", shader.label(), name);
        let pipeline = context.create_render_pipeline(&PipelineDescriptor {
            label: Some(&label),
            module: shader.module(),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            vertex_layout: VertexPositionColorTexture::layout(),
            target_format,
            blend,
        });
        Self::new(name, pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &GpuRenderPipeline {
        &self.pipeline
    }
}

/// A named, ordered list of passes.
#[derive(Debug, Clone)]
pub struct EffectTechnique {
    name: String,
    passes: Vec<EffectPass>,
}

impl EffectTechnique {
    pub fn new(name: impl Into<String>, passes: Vec<EffectPass>) -> Self {
        Self {
            name: name.into(),
            passes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passes(&self) -> &[EffectPass] {
        &self.passes
    }
}

/// The standard sprite effect.
///
/// Holds techniques of passes over the sprite shader and a projection
/// matrix that every pass uploads when applied.
///
/// Built-in techniques are [`SpriteEffect::ALPHA_BLEND`] (the default),
/// [`SpriteEffect::ADDITIVE`] and [`SpriteEffect::OPAQUE`].
#[derive(Debug, Clone)]
pub struct SpriteEffect {
    techniques: Vec<EffectTechnique>,
    current: usize,
    projection: Mat4,
}

impl SpriteEffect {
    pub const ALPHA_BLEND: &'static str = "AlphaBlend";
    pub const ADDITIVE: &'static str = "Additive";
    pub const OPAQUE: &'static str = "Opaque";

    /// Compiles the sprite shader and builds the built-in techniques.
    pub fn new(
        context: &dyn RenderContext,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let shader = Shader::sprite(context)?;
        Ok(Self::from_shader(context, &shader, target_format))
    }

    /// Builds the built-in techniques over an already compiled shader.
    pub fn from_shader(
        context: &dyn RenderContext,
        shader: &Shader,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let built_in = [
            (Self::ALPHA_BLEND, Some(wgpu::BlendState::ALPHA_BLENDING)),
            (Self::ADDITIVE, Some(additive_blend())),
            (Self::OPAQUE, None),
        ];

        let techniques = built_in
            .into_iter()
            .map(|(name, blend)| {
                let pass = EffectPass::sprite(context, "P0", shader, target_format, blend);
                EffectTechnique::new(name, vec![pass])
            })
            .collect();

        Self::with_techniques(techniques)
    }

    /// An effect over caller-built techniques. The first one is current.
    pub fn with_techniques(techniques: Vec<EffectTechnique>) -> Self {
        debug_assert!(!techniques.is_empty(), "an effect needs at least one technique");
        Self {
            techniques,
            current: 0,
            projection: Mat4::IDENTITY,
        }
    }

    pub fn techniques(&self) -> &[EffectTechnique] {
        &self.techniques
    }

    pub fn technique(&self, name: &str) -> Option<&EffectTechnique> {
        self.techniques.iter().find(|t| t.name == name)
    }

    pub fn current_technique(&self) -> &EffectTechnique {
        &self.techniques[self.current]
    }

    pub fn set_current_technique(&mut self, name: &str) -> Result<(), EffectError> {
        let index = self
            .techniques
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| EffectError::UnknownTechnique(name.to_string()))?;
        self.current = index;
        Ok(())
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Pixel-space projection with the origin at the top-left corner and
    /// layer depth mapped onto the `0..1` depth range.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.projection = Mat4::orthographic_lh(0.0, width, height, 0.0, 0.0, 1.0);
    }
}

impl Effect for SpriteEffect {
    fn pass_count(&self) -> usize {
        self.current_technique().passes.len()
    }

    fn apply_pass(&self, index: usize, context: &dyn RenderContext) {
        let pass = &self.current_technique().passes[index];
        context.set_pipeline(&pass.pipeline);
        context.set_uniforms(bytemuck::bytes_of(&self.projection));
    }
}

fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;
    use sable_test_utils::{MockRenderContext, RenderCall};

    fn effect(mock: &MockRenderContext) -> SpriteEffect {
        SpriteEffect::new(mock, wgpu::TextureFormat::Bgra8UnormSrgb).unwrap()
    }

    #[test]
    fn test_built_in_techniques() {
        let mock = MockRenderContext::new();
        let effect = effect(&mock);

        assert_eq!(effect.current_technique().name(), SpriteEffect::ALPHA_BLEND);
        assert_eq!(effect.pass_count(), 1);
        assert_eq!(effect.techniques().len(), 3);
        assert_eq!(mock.count_shader_creates(), 1);
        assert_eq!(mock.count_render_pipeline_creates(), 3);
    }

    #[test]
    fn test_switch_technique() {
        let mock = MockRenderContext::new();
        let mut effect = effect(&mock);

        effect.set_current_technique(SpriteEffect::OPAQUE).unwrap();
        assert_eq!(effect.current_technique().name(), SpriteEffect::OPAQUE);

        assert_eq!(
            effect.set_current_technique("Glow"),
            Err(EffectError::UnknownTechnique("Glow".to_string()))
        );
        // A failed switch keeps the previous technique.
        assert_eq!(effect.current_technique().name(), SpriteEffect::OPAQUE);
    }

    #[test]
    fn test_apply_pass_binds_pipeline_and_projection() {
        let mock = MockRenderContext::new();
        let mut effect = effect(&mock);
        effect.set_viewport(800.0, 600.0);
        mock.clear_calls();

        effect.apply_pass(0, &mock);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        let expected_pipeline = effect.current_technique().passes()[0].pipeline().mock_id();
        assert!(matches!(
            calls[0],
            RenderCall::SetPipeline { pipeline_id } if Some(pipeline_id) == expected_pipeline
        ));
        match &calls[1] {
            RenderCall::SetUniforms { data } => {
                assert_eq!(data.as_slice(), bytemuck::bytes_of(&effect.projection()))
            }
            other => panic!("expected uniforms, got {:?}", other),
        }
    }

    #[test]
    fn test_viewport_maps_pixels_to_clip_space() {
        let mut effect = SpriteEffect::with_techniques(vec![EffectTechnique::new("Empty", vec![])]);
        effect.set_viewport(800.0, 600.0);
        let projection = effect.projection();

        let top_left = projection * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = projection * Vec4::new(800.0, 600.0, 1.0, 1.0);

        assert_relative_eq!(top_left.x, -1.0);
        assert_relative_eq!(top_left.y, 1.0);
        assert_relative_eq!(top_left.z, 0.0);
        assert_relative_eq!(bottom_right.x, 1.0);
        assert_relative_eq!(bottom_right.y, -1.0);
        assert_relative_eq!(bottom_right.z, 1.0);
    }
}
