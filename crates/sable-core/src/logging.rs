//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Default filter: everything from our crates, quieter GPU internals.
pub const DEFAULT_FILTER: &str = "debug,wgpu_core=info,wgpu_hal=info,naga=info";

/// Installs the global fmt subscriber using [`DEFAULT_FILTER`].
///
/// `RUST_LOG` takes precedence when it is set. Calling this more than once is
/// harmless; only the first subscriber is kept.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Installs the global fmt subscriber with a custom default filter.
pub fn init_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::trace!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_init_is_harmless() {
        init();
        init_with_filter("warn");
    }
}
