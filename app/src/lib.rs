//! lcdscan command line application.
//!
//! Thin shell around the discovery engine: it loads configuration, starts
//! the fetch backend, runs discovery, persists the catalog and renders the
//! catalogued policies to PDF. Core logic lives in the `crates/` directory.

pub mod download;
pub mod session;
pub mod store;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,lcdscan=debug";

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `level` (when given) or [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_FILTER)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
