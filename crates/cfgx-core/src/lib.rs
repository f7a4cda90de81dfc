#![forbid(unsafe_code)]

//! cfgx core data model.
//!
//! This crate holds the plain data the edit log records and the rules for
//! rewriting it:
//!
//! - [`Action`] - one field or object mutation plus its inverse data
//! - [`Gesture`] - an atomic, non-empty group of actions with a [`GestureKey`]
//! - [`ObjectType`] / [`ObjectId`] - what an action targets
//! - [`Rename`] - where a renamed object's id appears and how to substitute it
//!
//! # Role in cfgx
//! `cfgx-core` has no behavior of its own. `cfgx-runtime` owns the undo and
//! redo stacks built from these types, and hosts implement its `Dispatcher`
//! trait to apply actions to their configuration state.

pub mod action;
pub mod gesture;
pub mod object;
pub mod rename;

pub use action::{Action, ActionError, Payload, UpdateType};
pub use gesture::{Gesture, GestureBuilder, GestureError, GestureKey};
pub use object::{ObjectId, ObjectType, PROVISIONAL_PREFIX};
pub use rename::Rename;
