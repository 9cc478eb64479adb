//! Sable Core
//!
//! Shared building blocks for the Sable sprite renderer: logging, profiling,
//! configuration, math and geometry, frame timing, the drawable capability,
//! and owner-thread dispatch.

pub mod config;
pub mod dispatch;
pub mod drawable;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
pub mod time;

use config::Config;

/// Initializes logging and profiling from `config`.
pub fn init(config: &Config) {
    config.apply();
}
