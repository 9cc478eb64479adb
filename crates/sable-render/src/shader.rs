//! WGSL shader compilation.

use std::fmt;
use std::sync::Arc;

use sable_core::dispatch::{DispatchError, DispatchHandle};
use sable_core::profiling::profile_function;
use sable_test_utils::{GpuShaderModule, RenderContext};

/// Source of the built-in sprite shader.
pub const SPRITE_SHADER_SOURCE: &str = include_str!("shaders/sprite.wgsl");

/// Errors from building a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The compiler rejected the source
    Compilation { label: String, diagnostic: String },
    /// The owner thread could not run the compilation
    Dispatch(DispatchError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compilation { label, diagnostic } => {
                write!(f, "Failed to compile shader '{}': {}", label, diagnostic)
            }
            Self::Dispatch(err) => write!(f, "Shader compilation was not run: {}", err),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dispatch(err) => Some(err),
            Self::Compilation { .. } => None,
        }
    }
}

impl From<DispatchError> for ShaderError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

/// A compiled shader module.
#[derive(Debug, Clone)]
pub struct Shader {
    label: String,
    module: GpuShaderModule,
}

impl Shader {
    /// Compiles WGSL `source` on the calling thread.
    pub fn compile(
        context: &dyn RenderContext,
        label: &str,
        source: &str,
    ) -> Result<Self, ShaderError> {
        profile_function!();
        let module = context
            .create_shader_module(Some(label), source)
            .map_err(|diagnostic| {
                tracing::warn!("Shader '{}' failed to compile: {}", label, diagnostic);
                ShaderError::Compilation {
                    label: label.to_string(),
                    diagnostic,
                }
            })?;

        tracing::debug!("Compiled shader '{}'", label);
        Ok(Self {
            label: label.to_string(),
            module,
        })
    }

    /// Compiles on the thread that owns `context`, blocking until done.
    ///
    /// Compile errors come back unchanged; a failure to reach the owner
    /// thread becomes [`ShaderError::Dispatch`].
    pub fn compile_on(
        dispatch: &DispatchHandle,
        context: Arc<dyn RenderContext>,
        label: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ShaderError> {
        let label = label.into();
        let source = source.into();
        dispatch.invoke(move || Self::compile(context.as_ref(), &label, &source))?
    }

    /// Compiles the built-in sprite shader.
    pub fn sprite(context: &dyn RenderContext) -> Result<Self, ShaderError> {
        Self::compile(context, "sprite_shader", SPRITE_SHADER_SOURCE)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn module(&self) -> &GpuShaderModule {
        &self.module
    }
}
