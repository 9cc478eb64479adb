//! Two-dimensional textures sampled by sprites.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sable_core::geometry::Size;
use sable_test_utils::{GpuTexture, RenderContext};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Texture2D`].
///
/// Sprite batching groups by this id. Two textures never share one, even if
/// they hold identical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Errors from creating a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Pixel data does not cover the texture exactly
    DataSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "Invalid texture dimensions {}x{}", width, height)
            }
            Self::DataSizeMismatch { expected, actual } => write!(
                f,
                "Texture data is {} bytes but {} were expected",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for TextureError {}

/// A sampled 2D texture.
///
/// Sprites share textures through `Arc<Texture2D>`; the batcher only reads
/// the id, the dimensions and the GPU handle.
#[derive(Debug)]
pub struct Texture2D {
    id: TextureId,
    size: Size<u32>,
    gpu: GpuTexture,
}

impl Texture2D {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates an uninitialized texture.
    pub fn new(
        context: &dyn RenderContext,
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }

        let gpu = context.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let texture = Self::from_gpu(gpu);
        tracing::debug!(
            "Created texture {:?} ({}x{}) {:?}",
            texture.id,
            width,
            height,
            label
        );
        Ok(texture)
    }

    /// Creates a texture and uploads tightly packed RGBA8 pixels.
    pub fn from_rgba8(
        context: &dyn RenderContext,
        width: u32,
        height: u32,
        pixels: &[u8],
        label: Option<&str>,
    ) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::DataSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let texture = Self::new(context, width, height, label)?;
        context.write_texture(&texture.gpu, pixels);
        Ok(texture)
    }

    /// A 1x1 texture of a single color, handy for untextured quads.
    pub fn solid(
        context: &dyn RenderContext,
        rgba: [u8; 4],
        label: Option<&str>,
    ) -> Result<Self, TextureError> {
        Self::from_rgba8(context, 1, 1, &rgba, label)
    }

    /// Wraps an existing GPU texture, assigning it a fresh id.
    pub fn from_gpu(gpu: GpuTexture) -> Self {
        Self {
            id: TextureId::next(),
            size: Size::new(gpu.width(), gpu.height()),
            gpu,
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    #[inline]
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    /// Sort key for texture-ordered batching.
    ///
    /// Exact for the first 2^24 textures of a process; later ids may round
    /// onto a neighbour's key.
    #[inline]
    pub fn identity_hash(&self) -> f32 {
        self.id.0 as f32
    }
}

impl PartialEq for Texture2D {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Texture2D {}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_test_utils::MockRenderContext;

    #[test]
    fn test_ids_are_unique() {
        let mock = MockRenderContext::new();
        let a = Texture2D::new(&mock, 4, 4, None).unwrap();
        let b = Texture2D::new(&mock, 4, 4, None).unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_ne!(a.identity_hash(), b.identity_hash());
    }

    #[test]
    fn test_from_rgba8_uploads() {
        let mock = MockRenderContext::new();
        let texture = Texture2D::from_rgba8(&mock, 2, 2, &[255; 16], Some("white")).unwrap();

        assert_eq!(texture.size(), Size::new(2, 2));
        assert_eq!(mock.count_texture_creates(), 1);
        assert!(
            mock.calls()
                .iter()
                .any(|c| matches!(c, sable_test_utils::RenderCall::WriteTexture { size: 16, .. }))
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let mock = MockRenderContext::new();

        assert_eq!(
            Texture2D::new(&mock, 0, 8, None).unwrap_err(),
            TextureError::InvalidDimensions {
                width: 0,
                height: 8
            }
        );
        assert_eq!(
            Texture2D::from_rgba8(&mock, 2, 2, &[0; 15], None).unwrap_err(),
            TextureError::DataSizeMismatch {
                expected: 16,
                actual: 15
            }
        );
        assert_eq!(mock.count_texture_creates(), 0);
    }
}
