use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use static_assertions::const_assert_eq;

use crate::Color;

/// Sprite vertex: position, tint and texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColorTexture {
    pub position: [f32; 3],
    pub color: Color,
    pub tex_coord: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<VertexPositionColorTexture>(), 36);

impl VertexPositionColorTexture {
    /// Distance in bytes between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    #[inline]
    pub fn new(position: Vec3, color: Color, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color,
            tex_coord: tex_coord.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            0 => Float32x3,  // position
            1 => Float32x4,  // color
            2 => Float32x2,  // tex_coord
        ];
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}
