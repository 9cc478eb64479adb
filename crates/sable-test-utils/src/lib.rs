//! The device seam of the Sable renderer.
//!
//! [`RenderContext`] is the only way the sprite batcher touches the GPU:
//! it creates buffers, textures, shaders and pipelines, and issues indexed
//! draws against a bound state. `sable-render` implements it over wgpu. With
//! the `mock` feature this crate adds `MockRenderContext`, which records
//! every call so tests can assert on uploads and draws without a device.
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use sable_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::{BufferDescriptor, BufferUsages};
//!
//! let mock = MockRenderContext::new();
//! let buffer = mock.create_buffer(&BufferDescriptor {
//!     label: Some("quads"),
//!     size: 1024,
//!     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//! mock.set_vertex_buffer(Some(&buffer));
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert!(buffer.is_mock());
//! # }
//! ```
//!
//! Handles are owned and cheap to clone, and every method takes `&self`,
//! so one context can be shared behind an `Arc<dyn RenderContext>`.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
