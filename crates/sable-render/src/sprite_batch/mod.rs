//! Deferred sprite batching.
//!
//! Sprites are queued between [`SpriteBatcher::begin`] and
//! [`SpriteBatcher::end`]. `end` orders the queue according to the
//! [`SpriteSortMode`], splits it into runs that share a texture and fit in
//! [`MAX_BATCH`] quads, and draws each run through an [`Effect`].
//!
//! [`Effect`]: crate::effect::Effect

mod batcher;
mod item;
mod staging;
mod submit;

pub use batcher::{SpriteBatchStats, SpriteBatcher};
pub use item::{BatchItem, SourceRectangle, SpriteDesc, SpriteEffects, SpriteSortMode};
pub use staging::{StagingArena, quad_indices};
pub use submit::SpriteSubmitter;

/// Quads per draw run. Index data is `u16`, so `4 * MAX_BATCH` must stay
/// below 65536.
pub const MAX_BATCH: usize = 256;

static_assertions::const_assert!(MAX_BATCH * 4 <= u16::MAX as usize + 1);
