//! Sprite descriptions and the quads built from them.

use std::sync::Arc;

use bitflags::bitflags;
use glam::{Vec2, Vec3};
use sable_core::geometry::Rect;
use sable_core::math::{reduce_angle, rotate_xy};

use crate::Color;
use crate::texture::Texture2D;

/// Ordering applied to queued sprites when a batch ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpriteSortMode {
    /// Draw in submission order.
    #[default]
    Deferred,
    /// Draw in submission order. Kept distinct for callers that name it.
    Immediate,
    /// Group by texture identity.
    Texture,
    /// Sort by layer depth; see [`BatchItem::sorting_key`].
    BackToFront,
    /// Sort by layer depth; see [`BatchItem::sorting_key`].
    FrontToBack,
}

impl SpriteSortMode {
    /// Whether `end` sorts the queue in this mode.
    #[inline]
    pub fn sorts(self) -> bool {
        !matches!(self, Self::Deferred | Self::Immediate)
    }
}

bitflags! {
    /// Mirroring applied to a sprite's texture coordinates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpriteEffects: u8 {
        const FLIP_HORIZONTALLY = 1 << 0;
        const FLIP_VERTICALLY = 1 << 1;
    }
}

/// Region of a texture a sprite samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceRectangle {
    /// Texel coordinates, normalized against the texture size.
    Pixels(Rect<u32>),
    /// Already in `0..1` texture space. Only selects texels: the
    /// destination size is not scaled by the rectangle's extent.
    Normalized(Rect<f32>),
}

impl SourceRectangle {
    /// The rectangle in normalized texture space.
    pub fn normalize(&self, texture: &Texture2D) -> Rect<f32> {
        match self {
            Self::Pixels(rect) => rect.normalize(texture.size()),
            Self::Normalized(rect) => *rect,
        }
    }
}

impl From<Rect<u32>> for SourceRectangle {
    fn from(rect: Rect<u32>) -> Self {
        Self::Pixels(rect)
    }
}

impl From<Rect<f32>> for SourceRectangle {
    fn from(rect: Rect<f32>) -> Self {
        Self::Normalized(rect)
    }
}

/// Placement of one sprite.
///
/// ```
/// use sable_render::glam::Vec2;
/// use sable_render::{Color, SpriteDesc, SpriteEffects};
///
/// let desc = SpriteDesc::new(Vec2::new(100.0, 50.0), Vec2::new(32.0, 32.0))
///     .with_color(Color::RED)
///     .with_rotation(std::f32::consts::FRAC_PI_2)
///     .with_origin(Vec2::new(16.0, 16.0))
///     .with_effects(SpriteEffects::FLIP_HORIZONTALLY)
///     .with_layer_depth(0.5);
/// assert_eq!(desc.layer_depth, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDesc {
    /// Destination of the origin-relative top-left corner.
    pub position: Vec2,
    /// Sampled texture region. `None` samples the whole texture.
    pub source: Option<SourceRectangle>,
    pub color: Color,
    /// Rotation in radians about `origin`.
    pub rotation: f32,
    /// Pivot, relative to the top-left of the destination rectangle.
    pub origin: Vec2,
    /// Destination size in world units. Must not be negative.
    pub size: Vec2,
    pub effects: SpriteEffects,
    pub layer_depth: f32,
}

impl SpriteDesc {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            source: None,
            color: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            size,
            effects: SpriteEffects::empty(),
            layer_depth: 0.0,
        }
    }

    pub fn with_source(mut self, source: impl Into<SourceRectangle>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_effects(mut self, effects: SpriteEffects) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_layer_depth(mut self, layer_depth: f32) -> Self {
        self.layer_depth = layer_depth;
        self
    }
}

/// One fully built sprite quad waiting to be drawn.
///
/// Positions are ordered top-left, top-right, bottom-left, bottom-right of
/// the un-rotated rectangle. Items cannot change after construction.
#[derive(Debug, Clone)]
pub struct BatchItem {
    texture: Arc<Texture2D>,
    positions: [Vec3; 4],
    uv_top_left: Vec2,
    uv_bottom_right: Vec2,
    color: Color,
    sorting_key: f32,
}

impl BatchItem {
    pub fn new(texture: Arc<Texture2D>, desc: &SpriteDesc, sort_mode: SpriteSortMode) -> Self {
        debug_assert!(
            desc.size.x >= 0.0 && desc.size.y >= 0.0,
            "sprite size must not be negative: {:?}",
            desc.size
        );

        let source = desc
            .source
            .map_or(Rect::<f32>::UNIT, |source| source.normalize(&texture));
        let (uv_top_left, uv_bottom_right) = uv_corners(source, desc.effects);
        let positions = corner_positions(desc);

        let sorting_key = match sort_mode {
            SpriteSortMode::BackToFront => -desc.layer_depth,
            SpriteSortMode::FrontToBack => desc.layer_depth,
            SpriteSortMode::Texture => texture.identity_hash(),
            SpriteSortMode::Deferred | SpriteSortMode::Immediate => 0.0,
        };

        Self {
            texture,
            positions,
            uv_top_left,
            uv_bottom_right,
            color: desc.color,
            sorting_key,
        }
    }

    #[inline]
    pub fn texture(&self) -> &Arc<Texture2D> {
        &self.texture
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3; 4] {
        &self.positions
    }

    #[inline]
    pub fn uv_top_left(&self) -> Vec2 {
        self.uv_top_left
    }

    #[inline]
    pub fn uv_bottom_right(&self) -> Vec2 {
        self.uv_bottom_right
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Key the queue is sorted on, largest first.
    ///
    /// `BackToFront` stores `-layer_depth` and `FrontToBack` stores
    /// `layer_depth`. `Texture` stores the texture's identity hash. The
    /// unsorted modes store zero.
    #[inline]
    pub fn sorting_key(&self) -> f32 {
        self.sorting_key
    }
}

fn uv_corners(source: Rect<f32>, effects: SpriteEffects) -> (Vec2, Vec2) {
    let (left, right) = if effects.contains(SpriteEffects::FLIP_HORIZONTALLY) {
        (source.right(), source.x)
    } else {
        (source.x, source.right())
    };
    let (top, bottom) = if effects.contains(SpriteEffects::FLIP_VERTICALLY) {
        (source.bottom(), source.y)
    } else {
        (source.y, source.bottom())
    };
    (Vec2::new(left, top), Vec2::new(right, bottom))
}

fn corner_positions(desc: &SpriteDesc) -> [Vec3; 4] {
    let min = -desc.origin;
    let max = min + desc.size;
    let depth = desc.layer_depth;

    let mut corners = [
        Vec3::new(min.x, min.y, depth),
        Vec3::new(max.x, min.y, depth),
        Vec3::new(min.x, max.y, depth),
        Vec3::new(max.x, max.y, depth),
    ];

    let rotation = reduce_angle(desc.rotation);
    if rotation != 0.0 {
        let (sin, cos) = rotation.sin_cos();
        for corner in &mut corners {
            *corner = rotate_xy(*corner, sin, cos);
        }
    }

    let translation = (desc.origin + desc.position).extend(0.0);
    corners.map(|corner| corner + translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sable_test_utils::MockRenderContext;
    use std::f32::consts::{FRAC_PI_2, TAU};

    fn texture(width: u32, height: u32) -> Arc<Texture2D> {
        let mock = MockRenderContext::new();
        Arc::new(Texture2D::new(&mock, width, height, None).unwrap())
    }

    fn assert_vec2_eq(actual: Vec2, expected: Vec2) {
        assert_relative_eq!(actual.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(actual.y, expected.y, epsilon = 1e-6);
    }

    fn assert_vec3_eq(actual: Vec3, expected: Vec3) {
        assert_relative_eq!(actual.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(actual.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(actual.z, expected.z, epsilon = 1e-6);
    }

    fn item(desc: SpriteDesc) -> BatchItem {
        BatchItem::new(texture(64, 64), &desc, SpriteSortMode::Deferred)
    }

    #[test]
    fn test_default_source_covers_texture() {
        let item = item(SpriteDesc::new(Vec2::ZERO, Vec2::ONE));
        assert_eq!(item.uv_top_left(), Vec2::ZERO);
        assert_eq!(item.uv_bottom_right(), Vec2::ONE);
    }

    #[test]
    fn test_flip_swaps_uv_edges() {
        let source = Rect::<f32>::new(0.2, 0.3, 0.4, 0.5);
        let base = SpriteDesc::new(Vec2::ZERO, Vec2::ONE).with_source(source);

        let plain = item(base);
        assert_vec2_eq(plain.uv_top_left(), Vec2::new(0.2, 0.3));
        assert_vec2_eq(plain.uv_bottom_right(), Vec2::new(0.6, 0.8));

        let horizontal = item(base.with_effects(SpriteEffects::FLIP_HORIZONTALLY));
        assert_vec2_eq(horizontal.uv_top_left(), Vec2::new(0.6, 0.3));
        assert_vec2_eq(horizontal.uv_bottom_right(), Vec2::new(0.2, 0.8));

        let vertical = item(base.with_effects(SpriteEffects::FLIP_VERTICALLY));
        assert_vec2_eq(vertical.uv_top_left(), Vec2::new(0.2, 0.8));
        assert_vec2_eq(vertical.uv_bottom_right(), Vec2::new(0.6, 0.3));

        let both = item(base.with_effects(SpriteEffects::all()));
        assert_vec2_eq(both.uv_top_left(), Vec2::new(0.6, 0.8));
        assert_vec2_eq(both.uv_bottom_right(), Vec2::new(0.2, 0.3));
    }

    #[test]
    fn test_pixel_source_matches_normalized() {
        let texture = texture(200, 100);
        let base = SpriteDesc::new(Vec2::ZERO, Vec2::new(10.0, 10.0));

        let pixels = BatchItem::new(
            texture.clone(),
            &base.with_source(Rect::<u32>::new(40, 30, 80, 50)),
            SpriteSortMode::Deferred,
        );
        let normalized = BatchItem::new(
            texture,
            &base.with_source(Rect::<f32>::new(0.2, 0.3, 0.4, 0.5)),
            SpriteSortMode::Deferred,
        );

        assert_vec2_eq(pixels.uv_top_left(), normalized.uv_top_left());
        assert_vec2_eq(pixels.uv_bottom_right(), normalized.uv_bottom_right());
        assert_eq!(pixels.positions(), normalized.positions());
    }

    #[test]
    fn test_partial_source_does_not_scale_destination() {
        let desc = SpriteDesc::new(Vec2::ZERO, Vec2::new(10.0, 10.0))
            .with_source(Rect::<f32>::new(0.0, 0.0, 0.5, 0.5));
        let item = item(desc);

        assert_eq!(item.positions()[3], Vec3::new(10.0, 10.0, 0.0));
        assert_vec2_eq(item.uv_bottom_right(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_unrotated_corners() {
        let desc = SpriteDesc::new(Vec2::new(10.0, 20.0), Vec2::new(4.0, 2.0))
            .with_origin(Vec2::new(1.0, 1.0))
            .with_layer_depth(0.25);
        let item = item(desc);

        assert_eq!(
            item.positions(),
            &[
                Vec3::new(10.0, 20.0, 0.25),
                Vec3::new(14.0, 20.0, 0.25),
                Vec3::new(10.0, 22.0, 0.25),
                Vec3::new(14.0, 22.0, 0.25),
            ]
        );
    }

    #[test]
    fn test_full_turns_are_identity() {
        let desc = SpriteDesc::new(Vec2::new(5.0, 7.0), Vec2::new(3.0, 2.0))
            .with_origin(Vec2::new(1.5, 1.0));
        let unrotated = item(desc);

        for rotation in [0.0, TAU, 2.0 * TAU, -TAU] {
            let rotated = item(desc.with_rotation(rotation));
            assert_eq!(rotated.positions(), unrotated.positions());
        }
    }

    #[test]
    fn test_quarter_turn_about_origin() {
        let desc = SpriteDesc::new(Vec2::ZERO, Vec2::new(2.0, 2.0))
            .with_origin(Vec2::new(1.0, 1.0))
            .with_rotation(FRAC_PI_2);
        let item = item(desc);

        // Offsets (-1,-1), (1,-1), (-1,1), (1,1) rotate to (1,-1), (1,1),
        // (-1,-1), (-1,1), then shift by the origin.
        let expected = [
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        for (actual, expected) in item.positions().iter().zip(expected) {
            assert_vec3_eq(*actual, expected);
        }
    }

    #[test]
    fn test_sorting_keys() {
        let texture = texture(8, 8);
        let desc = SpriteDesc::new(Vec2::ZERO, Vec2::ONE).with_layer_depth(0.5);

        let key = |mode| BatchItem::new(texture.clone(), &desc, mode).sorting_key();

        assert_eq!(key(SpriteSortMode::BackToFront), -0.5);
        assert_eq!(key(SpriteSortMode::FrontToBack), 0.5);
        assert_eq!(key(SpriteSortMode::Texture), texture.identity_hash());
        assert_eq!(key(SpriteSortMode::Deferred), 0.0);
        assert_eq!(key(SpriteSortMode::Immediate), 0.0);
    }

    #[test]
    fn test_color_is_kept() {
        let item = item(SpriteDesc::new(Vec2::ZERO, Vec2::ONE).with_color(Color::BLUE));
        assert_eq!(item.color(), Color::BLUE);
    }
}
