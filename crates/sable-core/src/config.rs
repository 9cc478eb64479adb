use std::borrow::Cow;

use crate::logging;
use crate::profiling::{self, ProfilingBackend};

/// Process-wide configuration for the renderer's ambient services.
#[derive(Debug, Clone)]
pub struct Config {
    pub benchmark: BenchmarkMode,
    /// Default `tracing` filter, used when `RUST_LOG` is not set.
    pub log_filter: Cow<'static, str>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            benchmark: BenchmarkMode::Off,
            log_filter: Cow::Borrowed(logging::DEFAULT_FILTER),
        }
    }
}

impl Config {
    pub fn with_benchmark(mut self, benchmark: BenchmarkMode) -> Self {
        self.benchmark = benchmark;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<Cow<'static, str>>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// The profiling backend implied by [`Config::benchmark`], if any.
    pub fn profiling_backend(&self) -> Option<ProfilingBackend> {
        match self.benchmark {
            BenchmarkMode::Off => None,
            BenchmarkMode::On => Some(ProfilingBackend::InProcess),
            BenchmarkMode::WithWebServer => Some(ProfilingBackend::PuffinHttp),
        }
    }

    /// Initialize logging and, if requested, profiling.
    pub fn apply(&self) {
        logging::init_with_filter(&self.log_filter);

        if let Some(backend) = self.profiling_backend() {
            profiling::init_profiling(backend);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkMode {
    /// Benchmarking is disabled
    Off,
    /// Benchmarking is enabled, and can be viewed using an in-process viewer
    On,
    /// Benchmarking is enabled, and can be viewed either in-process or
    /// using external tools such as 'puffin_viewer'
    WithWebServer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_profiling() {
        let config = Config::default();
        assert_eq!(config.benchmark, BenchmarkMode::Off);
        assert!(config.profiling_backend().is_none());
        assert_eq!(config.log_filter, logging::DEFAULT_FILTER);
    }

    #[test]
    fn test_benchmark_mode_selects_backend() {
        let config = Config::default().with_benchmark(BenchmarkMode::WithWebServer);
        assert_eq!(config.profiling_backend(), Some(ProfilingBackend::PuffinHttp));

        let config = config.with_benchmark(BenchmarkMode::On).with_log_filter("trace");
        assert_eq!(config.profiling_backend(), Some(ProfilingBackend::InProcess));
        assert_eq!(config.log_filter, "trace");
    }
}
