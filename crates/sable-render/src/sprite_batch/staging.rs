use bytemuck::Zeroable;
use glam::Vec2;

use super::MAX_BATCH;
use super::item::BatchItem;
use crate::vertex::VertexPositionColorTexture;

/// Fixed-size CPU staging for one batch of quads.
///
/// Slot `k` owns vertices `4k..4k + 4` and indices `6k..6k + 6`. The arena is
/// allocated once and reused by every flush.
pub struct StagingArena {
    vertices: Box<[VertexPositionColorTexture]>,
    indices: Box<[u16]>,
}

impl StagingArena {
    pub const VERTICES_PER_QUAD: usize = 4;
    pub const INDICES_PER_QUAD: usize = 6;

    pub fn new() -> Self {
        Self {
            vertices: vec![
                VertexPositionColorTexture::zeroed();
                MAX_BATCH * Self::VERTICES_PER_QUAD
            ]
            .into_boxed_slice(),
            indices: vec![0; MAX_BATCH * Self::INDICES_PER_QUAD].into_boxed_slice(),
        }
    }

    /// Writes the quad for `item` into `slot`.
    pub fn write(&mut self, slot: usize, item: &BatchItem) {
        debug_assert!(slot < MAX_BATCH, "staging slot {} out of range", slot);

        let [tl, tr, bl, br] = *item.positions();
        let uv_tl = item.uv_top_left();
        let uv_br = item.uv_bottom_right();
        let color = item.color();

        let v = slot * Self::VERTICES_PER_QUAD;
        self.vertices[v] = VertexPositionColorTexture::new(tl, color, uv_tl);
        self.vertices[v + 1] = VertexPositionColorTexture::new(tr, color, Vec2::new(uv_br.x, uv_tl.y));
        self.vertices[v + 2] = VertexPositionColorTexture::new(bl, color, Vec2::new(uv_tl.x, uv_br.y));
        self.vertices[v + 3] = VertexPositionColorTexture::new(br, color, uv_br);

        let i = slot * Self::INDICES_PER_QUAD;
        self.indices[i..i + Self::INDICES_PER_QUAD].copy_from_slice(&quad_indices(slot));
    }

    pub fn vertices(&self) -> &[VertexPositionColorTexture] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }
}

impl Default for StagingArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Indices of the two triangles of the quad in `slot`.
///
/// Winding is `(0, 1, 2)` and `(1, 3, 2)` over the slot's own vertices.
#[inline]
pub fn quad_indices(slot: usize) -> [u16; 6] {
    let base = (slot * StagingArena::VERTICES_PER_QUAD) as u16;
    [base, base + 1, base + 2, base + 1, base + 3, base + 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite_batch::item::{SpriteDesc, SpriteSortMode};
    use crate::texture::Texture2D;
    use crate::Color;
    use glam::Vec3;
    use sable_test_utils::MockRenderContext;
    use std::sync::Arc;

    #[test]
    fn test_quad_indices_winding() {
        for k in [0usize, 1, 7, MAX_BATCH - 1] {
            let b = (4 * k) as u16;
            assert_eq!(quad_indices(k), [b, b + 1, b + 2, b + 1, b + 3, b + 2]);
        }
    }

    #[test]
    fn test_indices_fit_u16() {
        let last = quad_indices(MAX_BATCH - 1);
        assert_eq!(last[4] as usize, MAX_BATCH * 4 - 1);
    }

    #[test]
    fn test_write_slot_vertices() {
        let mock = MockRenderContext::new();
        let texture = Arc::new(Texture2D::new(&mock, 16, 16, None).unwrap());
        let desc = SpriteDesc::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)).with_color(Color::RED);
        let item = BatchItem::new(texture, &desc, SpriteSortMode::Deferred);

        let mut arena = StagingArena::new();
        arena.write(2, &item);

        let quad = &arena.vertices()[8..12];
        assert_eq!(quad[0].position, [1.0, 2.0, 0.0]);
        assert_eq!(quad[1].position, [4.0, 2.0, 0.0]);
        assert_eq!(quad[2].position, [1.0, 6.0, 0.0]);
        assert_eq!(quad[3].position, [4.0, 6.0, 0.0]);

        assert_eq!(quad[0].tex_coord, [0.0, 0.0]);
        assert_eq!(quad[1].tex_coord, [1.0, 0.0]);
        assert_eq!(quad[2].tex_coord, [0.0, 1.0]);
        assert_eq!(quad[3].tex_coord, [1.0, 1.0]);
        assert!(quad.iter().all(|v| v.color == Color::RED));

        assert_eq!(&arena.indices()[12..18], &[8, 9, 10, 9, 11, 10]);
        assert_eq!(item.positions()[0], Vec3::new(1.0, 2.0, 0.0));
    }
}
