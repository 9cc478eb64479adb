use std::time::{Duration, Instant};

use crate::profiling::profile_function;

/// A snapshot of frame timing handed to drawables.
///
/// ```
/// use std::time::Duration;
/// use sable_core::time::GameClock;
///
/// let mut clock = GameClock::new();
/// let time = clock.advance(Duration::from_millis(16));
/// assert_eq!(time.frame(), 1);
/// assert_eq!(time.total(), Duration::from_millis(16));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameTime {
    total: Duration,
    elapsed: Duration,
    frame: u64,
    running_slowly: bool,
}

impl GameTime {
    /// The time before the first frame.
    pub const fn new() -> Self {
        Self {
            total: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame: 0,
            running_slowly: false,
        }
    }

    pub const fn from_parts(total: Duration, elapsed: Duration, frame: u64) -> Self {
        Self {
            total,
            elapsed,
            frame,
            running_slowly: false,
        }
    }

    /// Scaled game time accumulated over all frames.
    #[inline]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Scaled game time since the previous frame.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    #[inline]
    pub fn total_seconds(&self) -> f32 {
        self.total.as_secs_f32()
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the last frame took longer than the clock's maximum step.
    #[inline]
    pub fn is_running_slowly(&self) -> bool {
        self.running_slowly
    }
}

/// Produces a [`GameTime`] per frame from the wall clock.
///
/// Steps longer than `max_step` are clamped so one hitch cannot make the
/// next frame simulate seconds at once. The time scale stretches every step.
#[derive(Debug, Clone)]
pub struct GameClock {
    current: GameTime,
    time_scale: f32,
    max_step: Duration,
    last_tick: Instant,
}

impl GameClock {
    pub const DEFAULT_MAX_STEP: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        Self {
            current: GameTime::new(),
            time_scale: 1.0,
            max_step: Self::DEFAULT_MAX_STEP,
            last_tick: Instant::now(),
        }
    }

    /// Reads the wall clock and advances by the time since the last tick.
    pub fn tick(&mut self) -> GameTime {
        profile_function!();
        let now = Instant::now();
        let step = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.advance(step)
    }

    /// Advances by `step` without reading the wall clock.
    pub fn advance(&mut self, step: Duration) -> GameTime {
        let running_slowly = step > self.max_step;
        let elapsed = step.min(self.max_step).mul_f32(self.time_scale);

        self.current = GameTime {
            total: self.current.total + elapsed,
            elapsed,
            frame: self.current.frame + 1,
            running_slowly,
        };
        self.current
    }

    /// The time produced by the latest tick.
    #[inline]
    pub fn time(&self) -> GameTime {
        self.current
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative scales are clamped to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn set_max_step(&mut self, max_step: Duration) {
        self.max_step = max_step;
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_long_steps_are_clamped() {
        let mut clock = GameClock::new();
        let time = clock.advance(Duration::from_secs(5));

        assert_eq!(time.elapsed(), GameClock::DEFAULT_MAX_STEP);
        assert!(time.is_running_slowly());
        assert_eq!(time.frame(), 1);

        let time = clock.advance(Duration::from_millis(10));
        assert!(!time.is_running_slowly());
        assert_eq!(time.total(), Duration::from_millis(110));
    }

    #[test]
    fn test_time_scale() {
        let mut clock = GameClock::new();
        clock.set_time_scale(0.5);
        let time = clock.advance(Duration::from_millis(20));
        assert_relative_eq!(time.elapsed_seconds(), 0.01, epsilon = 1e-6);
        assert_eq!(clock.time(), time);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
        assert_eq!(clock.advance(Duration::from_millis(20)).total(), time.total());
    }
}
