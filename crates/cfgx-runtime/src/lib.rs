#![forbid(unsafe_code)]

//! cfgx Runtime
//!
//! This crate provides the transactional edit log for device configuration:
//! undoable gestures recorded against a host-supplied dispatcher, kept
//! consistent while a remote gateway renames and deletes objects.
//!
//! # Key Components
//!
//! - [`GestureLog`] - Undo/redo stacks with depth limit and save watermark
//! - [`Dispatcher`] - Trait the host implements to apply actions to its state
//! - [`HistoryConfig`] - Limits and provisional-id prefix, loadable from TOML
//! - [`GestureObserver`] - Optional hook for tutorial/help overlays
//!
//! # Role in cfgx
//! `cfgx-runtime` sits between the UI (which builds gestures from user
//! edits), the gateway transport (which reports renames and deletions) and
//! the host state (behind [`Dispatcher`]). Data types live in `cfgx-core`.
//!
//! # Logging
//! Operations emit `tracing` events under the `cfgx.history`,
//! `cfgx.reconcile`, `cfgx.purge` and `cfgx.observer` targets. The crate
//! never installs a subscriber.

pub mod config;
pub mod undo;

pub use config::ConfigError;
pub use undo::{
    DispatchError, DispatchResult, Dispatcher, GestureLog, GestureObserver, HistoryConfig,
    HistoryError, PerformMode, Phase, PurgeReport, ReconcileReport,
};
