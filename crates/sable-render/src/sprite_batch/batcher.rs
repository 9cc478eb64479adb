use std::sync::Arc;

use sable_core::profiling::{profile_function, profile_scope};
use sable_test_utils::RenderContext;

use super::MAX_BATCH;
use super::item::{BatchItem, SpriteDesc, SpriteSortMode};
use super::staging::StagingArena;
use super::submit::SpriteSubmitter;
use crate::effect::Effect;
use crate::texture::Texture2D;

/// Counters from one `begin`/`end` cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpriteBatchStats {
    /// Sprites drawn.
    pub item_count: usize,
    /// Runs uploaded.
    pub flush_count: usize,
    /// Draw calls issued, one per effect pass per run.
    pub draw_calls: usize,
    /// Runs that started because the texture changed.
    pub texture_switches: usize,
}

/// Queues sprites between `begin` and `end`, then draws them in as few
/// texture-homogeneous batches as the sort order allows.
///
/// ```
/// # use std::sync::Arc;
/// # use sable_render::glam::Vec2;
/// # use sable_render::{SpriteBatcher, SpriteDesc, SpriteEffect, SpriteSortMode, Texture2D};
/// # use sable_test_utils::MockRenderContext;
/// let context = Arc::new(MockRenderContext::new());
/// let effect = SpriteEffect::new(context.as_ref(), wgpu::TextureFormat::Bgra8UnormSrgb).unwrap();
/// let texture = Arc::new(Texture2D::new(context.as_ref(), 16, 16, None).unwrap());
///
/// let mut batcher = SpriteBatcher::new(context.clone());
/// batcher.begin(SpriteSortMode::BackToFront);
/// batcher.draw(&texture, &SpriteDesc::new(Vec2::ZERO, Vec2::splat(16.0)).with_layer_depth(0.5));
/// batcher.draw(&texture, &SpriteDesc::new(Vec2::ONE, Vec2::splat(16.0)).with_layer_depth(0.1));
/// let stats = batcher.end(&effect);
///
/// assert_eq!(stats.item_count, 2);
/// assert_eq!(stats.draw_calls, 1);
/// ```
pub struct SpriteBatcher {
    items: Vec<BatchItem>,
    staging: StagingArena,
    // Taken on release so buffers are destroyed exactly once.
    submitter: Option<SpriteSubmitter>,
    sort_mode: SpriteSortMode,
    active: bool,
    stats: SpriteBatchStats,
}

static_assertions::assert_impl_all!(SpriteBatcher: Send);

impl SpriteBatcher {
    pub fn new(context: Arc<dyn RenderContext>) -> Self {
        profile_function!();
        Self {
            items: Vec::with_capacity(MAX_BATCH),
            staging: StagingArena::new(),
            submitter: Some(SpriteSubmitter::new(context)),
            sort_mode: SpriteSortMode::default(),
            active: false,
            stats: SpriteBatchStats::default(),
        }
    }

    /// Starts a cycle. Sprites queued by an unfinished cycle are dropped.
    pub fn begin(&mut self, sort_mode: SpriteSortMode) {
        if self.active {
            tracing::warn!(
                "SpriteBatcher::begin while a batch is active, discarding {} sprites",
                self.items.len()
            );
        }

        self.items.clear();
        self.sort_mode = sort_mode;
        self.active = true;
    }

    /// Queues a prebuilt item.
    pub fn push(&mut self, item: BatchItem) {
        debug_assert!(self.active, "SpriteBatcher::push outside begin/end");
        self.items.push(item);
    }

    /// Builds an item for the active sort mode and queues it.
    pub fn draw(&mut self, texture: &Arc<Texture2D>, desc: &SpriteDesc) {
        let item = BatchItem::new(Arc::clone(texture), desc, self.sort_mode);
        self.push(item);
    }

    /// Sorts, groups and draws the queue, then clears it.
    ///
    /// Sorting is stable: items with equal keys keep their queue order.
    /// Keys compare with `f32::total_cmp`, so `-0.0` sorts after `0.0`.
    pub fn end(&mut self, effect: &dyn Effect) -> SpriteBatchStats {
        debug_assert!(self.active, "SpriteBatcher::end without begin");
        profile_function!();
        self.active = false;

        let Some(submitter) = self.submitter.as_mut() else {
            tracing::warn!("SpriteBatcher::end after release");
            self.items.clear();
            return SpriteBatchStats::default();
        };

        let mut items = std::mem::take(&mut self.items);
        let mut stats = SpriteBatchStats {
            item_count: items.len(),
            ..Default::default()
        };

        if items.is_empty() {
            self.items = items;
            self.stats = stats;
            return stats;
        }

        if self.sort_mode.sorts() {
            profile_scope!("sort_sprites");
            items.sort_by(|a, b| b.sorting_key().total_cmp(&a.sorting_key()));
        }

        // Each run is written from slot zero.
        let run_start = 0;
        let mut run_count = 0;
        let mut current: &Texture2D = items[0].texture();

        for item in &items {
            let texture: &Texture2D = item.texture();
            let switched = texture.id() != current.id();
            if switched || run_count == MAX_BATCH {
                stats.draw_calls +=
                    submitter.flush(effect, current, &self.staging, run_start, run_count);
                stats.flush_count += 1;
                if switched {
                    stats.texture_switches += 1;
                }
                current = texture;
                run_count = 0;
            }

            self.staging.write(run_start + run_count, item);
            run_count += 1;
        }

        if run_count > 0 {
            stats.draw_calls += submitter.flush(effect, current, &self.staging, run_start, run_count);
            stats.flush_count += 1;
        }

        tracing::debug!(
            "Sprite batch ({:?}): {} sprites, {} flushes, {} draws",
            self.sort_mode,
            stats.item_count,
            stats.flush_count,
            stats.draw_calls
        );

        items.clear();
        self.items = items;
        self.stats = stats;
        stats
    }

    /// Releases the device buffers. Dropping the batcher does the same.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(submitter) = self.submitter.take() {
            submitter.release();
        }
    }

    /// Stats of the last completed cycle.
    pub fn stats(&self) -> SpriteBatchStats {
        self.stats
    }

    pub fn sort_mode(&self) -> SpriteSortMode {
        self.sort_mode
    }

    /// Whether `begin` has been called without a matching `end`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sprites queued in the current cycle, in queue order.
    pub fn pending(&self) -> &[BatchItem] {
        &self.items
    }
}

impl Drop for SpriteBatcher {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SpriteEffect;
    use glam::Vec2;
    use sable_test_utils::MockRenderContext;

    fn setup() -> (Arc<MockRenderContext>, SpriteBatcher, SpriteEffect) {
        let mock = Arc::new(MockRenderContext::new());
        let effect = SpriteEffect::new(mock.as_ref(), wgpu::TextureFormat::Rgba8UnormSrgb).unwrap();
        let batcher = SpriteBatcher::new(mock.clone());
        (mock, batcher, effect)
    }

    fn sprite(depth: f32) -> SpriteDesc {
        SpriteDesc::new(Vec2::ZERO, Vec2::ONE).with_layer_depth(depth)
    }

    #[test]
    fn test_begin_twice_discards() {
        let (mock, mut batcher, effect) = setup();
        let texture = Arc::new(Texture2D::new(mock.as_ref(), 4, 4, None).unwrap());

        batcher.begin(SpriteSortMode::Deferred);
        batcher.draw(&texture, &sprite(0.0));
        batcher.draw(&texture, &sprite(0.0));
        batcher.begin(SpriteSortMode::Deferred);

        assert!(batcher.pending().is_empty());
        let stats = batcher.end(&effect);
        assert_eq!(stats, SpriteBatchStats::default());
        assert_eq!(mock.count_draws(), 0);
    }

    #[test]
    fn test_end_clears_and_keeps_capacity() {
        let (mock, mut batcher, effect) = setup();
        let texture = Arc::new(Texture2D::new(mock.as_ref(), 4, 4, None).unwrap());

        batcher.begin(SpriteSortMode::Texture);
        for _ in 0..10 {
            batcher.draw(&texture, &sprite(0.0));
        }
        let stats = batcher.end(&effect);

        assert_eq!(stats.item_count, 10);
        assert_eq!(batcher.stats(), stats);
        assert!(batcher.pending().is_empty());
        assert!(batcher.items.capacity() >= 10);
        assert!(!batcher.is_active());
    }

    #[test]
    fn test_draw_uses_active_sort_mode() {
        let (mock, mut batcher, _effect) = setup();
        let texture = Arc::new(Texture2D::new(mock.as_ref(), 4, 4, None).unwrap());

        batcher.begin(SpriteSortMode::FrontToBack);
        batcher.draw(&texture, &sprite(0.75));

        assert_eq!(batcher.sort_mode(), SpriteSortMode::FrontToBack);
        assert_eq!(batcher.pending()[0].sorting_key(), 0.75);
    }

    #[test]
    fn test_drop_releases_once() {
        let (mock, batcher, _effect) = setup();
        assert_eq!(mock.live_buffer_count(), 2);

        batcher.dispose();

        assert_eq!(mock.count_buffer_destroys(), 2);
        assert_eq!(mock.live_buffer_count(), 0);
    }
}
