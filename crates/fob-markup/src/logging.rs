//! Logging setup for test binaries.
//!
//! fob-markup only emits tracing events. Test suites that want to see them
//! call [`init_test_logging`] once; `RUST_LOG` controls the filter.

use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call from every test; only the first call has an effect, and an
/// already-installed global subscriber is left alone.
///
/// # Example
///
/// ```rust,no_run
/// fob_markup::logging::init_test_logging();
/// ```
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).with_test_writer())
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!("logging initialized twice without panicking");
    }
}
