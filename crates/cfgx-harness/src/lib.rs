#![forbid(unsafe_code)]

//! Test support for cfgx.
//!
//! - [`ConfigStore`] - in-memory [`Dispatcher`](cfgx_runtime::Dispatcher)
//!   with call journal and failure injection
//! - [`fixtures`] - ready-made gestures for zones, sensors and AP settings
//! - [`init_test_tracing`] - opt-in log output for test runs

pub mod fixtures;
pub mod store;

pub use store::ConfigStore;

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honoring `RUST_LOG` (default `cfgx=debug`).
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cfgx=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
