//! Owned GPU handles backed either by wgpu or by the mock context.
//!
//! Real handles wrap reference-counted wgpu objects, so cloning one is
//! cheap. Mock handles carry an id assigned by `MockRenderContext` and the
//! metadata needed to answer size queries. Asking a mock handle for its
//! wgpu object panics: only the real context may do that.

// Mock payloads are only constructed with the `mock` feature.
#![cfg_attr(not(feature = "mock"), allow(dead_code))]

#[derive(Clone, Debug)]
enum Backing<R, M> {
    Real(R),
    Mock(M),
}

impl<R, M> Backing<R, M> {
    fn real(&self, kind: &str) -> &R {
        match self {
            Self::Real(resource) => resource,
            Self::Mock(_) => panic!("{} is a mock and has no wgpu object", kind),
        }
    }

    fn mock(&self) -> Option<&M> {
        match self {
            Self::Real(_) => None,
            Self::Mock(info) => Some(info),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct MockBuffer {
    id: usize,
    size: u64,
}

#[derive(Clone, Copy, Debug)]
struct MockTexture {
    id: usize,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

/// A device buffer.
#[derive(Clone, Debug)]
pub struct GpuBuffer(Backing<wgpu::Buffer, MockBuffer>);

impl GpuBuffer {
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self(Backing::Real(buffer))
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: u64) -> Self {
        Self(Backing::Mock(MockBuffer { id, size }))
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        match &self.0 {
            Backing::Real(buffer) => buffer.size(),
            Backing::Mock(info) => info.size,
        }
    }

    /// # Panics
    /// Panics on a mock buffer.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        self.0.real("buffer")
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        self.0.mock().is_some()
    }

    /// Id assigned by the mock context, `None` for real buffers.
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        self.0.mock().map(|info| info.id)
    }
}

/// A sampled 2D texture.
///
/// Real textures keep their default view so draws can bind them without
/// creating a view each time.
#[derive(Clone, Debug)]
pub struct GpuTexture(Backing<(wgpu::Texture, wgpu::TextureView), MockTexture>);

impl GpuTexture {
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self(Backing::Real((texture, view)))
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self(Backing::Mock(MockTexture {
            id,
            width,
            height,
            format,
        }))
    }

    pub fn width(&self) -> u32 {
        match &self.0 {
            Backing::Real((texture, _)) => texture.width(),
            Backing::Mock(info) => info.width,
        }
    }

    pub fn height(&self) -> u32 {
        match &self.0 {
            Backing::Real((texture, _)) => texture.height(),
            Backing::Mock(info) => info.height,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.0 {
            Backing::Real((texture, _)) => texture.format(),
            Backing::Mock(info) => info.format,
        }
    }

    /// # Panics
    /// Panics on a mock texture.
    pub fn as_wgpu(&self) -> &wgpu::Texture {
        &self.0.real("texture").0
    }

    /// The default view over the whole texture.
    ///
    /// # Panics
    /// Panics on a mock texture.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.0.real("texture").1
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        self.0.mock().is_some()
    }

    /// Id assigned by the mock context, `None` for real textures.
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        self.0.mock().map(|info| info.id)
    }
}

/// Handles whose mock form is nothing but an id.
macro_rules! id_handle {
    ($(#[$meta:meta])* $name:ident, $wgpu:ty, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(Backing<$wgpu, usize>);

        impl $name {
            pub fn from_wgpu(resource: $wgpu) -> Self {
                Self(Backing::Real(resource))
            }

            #[cfg(feature = "mock")]
            pub fn mock(id: usize) -> Self {
                Self(Backing::Mock(id))
            }

            #[doc = concat!("# Panics\nPanics on a mock ", $kind, ".")]
            pub fn as_wgpu(&self) -> &$wgpu {
                self.0.real($kind)
            }

            #[cfg(feature = "mock")]
            pub fn is_mock(&self) -> bool {
                self.0.mock().is_some()
            }

            #[cfg(feature = "mock")]
            pub fn mock_id(&self) -> Option<usize> {
                self.0.mock().copied()
            }
        }
    };
}

id_handle!(
    /// A compiled shader module.
    GpuShaderModule,
    wgpu::ShaderModule,
    "shader module"
);

id_handle!(
    /// A render pipeline built against the context's bind group layout.
    GpuRenderPipeline,
    wgpu::RenderPipeline,
    "render pipeline"
);
