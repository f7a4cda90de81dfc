#![forbid(unsafe_code)]

//! Undo/Redo gesture history with server reconciliation.
//!
//! This module records configuration edits as [`Gesture`](cfgx_core::Gesture)s
//! and keeps them undoable while a gateway renames and deletes the objects
//! they touch. It provides:
//!
//! - **Atomicity**: a gesture's actions apply and undo as one unit
//! - **Bounded history**: oldest gestures are evicted past `max_depth`
//! - **Save watermark**: undo stops at the last saved state
//! - **Reconciliation**: provisional ids are rewritten in place on rename
//! - **Purge**: gestures that act on a deleted object are dropped
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           GestureLog                             │
//! │  ┌──────────────────┐          ┌──────────────────┐              │
//! │  │    Done Stack    │          │   Undone Stack   │              │
//! │  │  ┌────────────┐  │  undo()  │  ┌────────────┐  │              │
//! │  │  │ GestureN   │  │ ──────►  │  │ Gesture1   │  │              │
//! │  │  ├────────────┤  │          │  ├────────────┤  │              │
//! │  │  │ Gesture2   │  │  ◄────── │  │ GestureN   │  │              │
//! │  │  └────────────┘  │  redo()  │  └────────────┘  │              │
//! │  └──────────────────┘          └──────────────────┘              │
//! │         ▲  reconcile() / purge_object_references()  ▲            │
//! │         └─────────────── both stacks ───────────────┘            │
//! │                              │                                   │
//! │                    apply / apply_inverse / validate              │
//! │                              ▼                                   │
//! │                     Dispatcher (host state)                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use cfgx_core::{Action, Gesture, GestureKey, ObjectType};
//! use cfgx_runtime::undo::{GestureLog, PerformMode};
//! use serde_json::json;
//!
//! const SET_NAME: GestureKey = GestureKey::new("zone.set_name");
//!
//! let mut log = GestureLog::with_default_config(store);
//! log.perform(
//!     Gesture::single(
//!         SET_NAME,
//!         "Set zone name",
//!         Action::update(ObjectType::SensorZone, "clientSz7",
//!             json!({"name": "Lane 1"}), json!({"name": ""})),
//!     ),
//!     PerformMode::Fresh,
//! )?;
//!
//! // gateway assigned the permanent id
//! log.reconcile_identifier(&"clientSz7".into(), &"SZ42".into(), ObjectType::SensorZone)?;
//!
//! // undo now targets SZ42
//! log.undo()?;
//! ```
//!
//! # Module Structure
//!
//! - [`dispatch`]: the `Dispatcher` seam to host state
//! - [`history`]: `GestureLog` stacks, limits and save watermark
//! - [`reconcile`]: provisional id rewriting
//! - [`purge`]: removal of gestures that depend on deleted objects
//! - [`observer`]: one-shot notification for watched gestures
//!
//! # Threading
//!
//! Every mutating operation takes `&mut self`, so operations on one log run
//! one at a time to completion. Hosts that receive gateway events on another
//! thread wrap the log in a mutex held for the duration of one call.

pub mod dispatch;
pub mod history;
pub mod observer;
pub mod purge;
pub mod reconcile;

pub use dispatch::{DispatchError, DispatchResult, Dispatcher, Phase};
pub use history::{GestureLog, HistoryConfig, HistoryError, PerformMode};
pub use observer::{GestureObserver, GestureWatch};
pub use purge::PurgeReport;
pub use reconcile::ReconcileReport;
