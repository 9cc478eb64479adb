//! Math types for the renderer.
//!
//! Re-exports the SIMD-accelerated [`glam`] types used for all CPU-side
//! geometry, plus a couple of 2D helpers used when building sprite quads.
//!
//! ```
//! use sable_core::math::{Vec2, Vec3};
//!
//! let corner = Vec3::new(-8.0, -8.0, 0.5);
//! let offset = Vec2::new(16.0, 4.0);
//! assert_eq!(corner.truncate() + offset, Vec2::new(8.0, -4.0));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub mod fast {
    pub use glam::*;
}

pub use fast::*;

/// Reduces an angle in radians into the open interval `(-TAU, TAU)`.
///
/// The sign of the input is preserved, and any exact multiple of `TAU`
/// reduces to exactly `0.0`.
#[inline]
pub fn reduce_angle(radians: f32) -> f32 {
    radians % std::f32::consts::TAU
}

/// Rotates `point` about the origin given the precomputed sine and cosine of
/// the rotation angle. The `z` component is left untouched.
#[inline]
pub fn rotate_xy(point: Vec3, sin: f32, cos: f32) -> Vec3 {
    Vec3::new(
        point.x * cos - point.y * sin,
        point.y * cos + point.x * sin,
        point.z,
    )
}
