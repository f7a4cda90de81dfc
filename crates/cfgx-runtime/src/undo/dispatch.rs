#![forbid(unsafe_code)]

//! The seam between the gesture log and the host's configuration state.
//!
//! The log never touches configuration data itself. It hands each recorded
//! [`Action`] to a [`Dispatcher`], which owns the shared state and knows how
//! to apply an action forward, apply its inverse, and validate the result.
//!
//! # Invariants
//!
//! - `apply(a)` followed by `apply_inverse(a)` restores the prior state
//! - `apply` is all-or-nothing per action; partial effects of a failed call
//!   are the dispatcher's to avoid
//! - `validate` is called exactly once per gesture application
//!
//! # Failure Modes
//!
//! - **Stale reference**: action names an object that no longer exists
//!   - Mitigation: return [`DispatchError::NotFound`]; the gesture is not
//!     recorded (forward) or stays where it was (undo/redo)
//! - **Validation failure**: cross-field checks reject the new state
//!   - Mitigation: return [`DispatchError::Validation`] from `validate`

use std::fmt;

use cfgx_core::{Action, ActionError, ObjectId, ObjectType, Rename};
use thiserror::Error;

/// Result of one dispatcher call.
pub type DispatchResult = Result<(), DispatchError>;

/// When validation runs relative to a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// After the last action of a gesture was applied.
    Do,
    /// After the first inverse action (the gesture's last action) was applied.
    Undo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Do => f.write_str("do"),
            Self::Undo => f.write_str("undo"),
        }
    }
}

/// Failures reported by a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{object_type} '{object_id}' not found")]
    NotFound {
        object_type: ObjectType,
        object_id: ObjectId,
    },
    #[error("{object_type} '{object_id}' already exists")]
    AlreadyExists {
        object_type: ObjectType,
        object_id: ObjectId,
    },
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("{0}")]
    Rejected(String),
}

/// Applies actions to the host's shared configuration state.
pub trait Dispatcher {
    /// Apply an action's forward effect.
    fn apply(&mut self, action: &Action) -> DispatchResult;

    /// Apply an action's inverse effect, using its original data.
    fn apply_inverse(&mut self, action: &Action) -> DispatchResult;

    /// Cross-field validation for a whole gesture.
    ///
    /// Called once per application: after the last action for
    /// [`Phase::Do`], after the first inverse action for [`Phase::Undo`].
    fn validate(&mut self, _actions: &[Action], _phase: Phase) -> DispatchResult {
        Ok(())
    }

    /// Rename an object in live state.
    ///
    /// The default does nothing, for hosts whose state is keyed elsewhere.
    fn rename_object(&mut self, _rename: &Rename) -> DispatchResult {
        Ok(())
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for &mut D {
    fn apply(&mut self, action: &Action) -> DispatchResult {
        (**self).apply(action)
    }

    fn apply_inverse(&mut self, action: &Action) -> DispatchResult {
        (**self).apply_inverse(action)
    }

    fn validate(&mut self, actions: &[Action], phase: Phase) -> DispatchResult {
        (**self).validate(actions, phase)
    }

    fn rename_object(&mut self, rename: &Rename) -> DispatchResult {
        (**self).rename_object(rename)
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn apply(&mut self, action: &Action) -> DispatchResult {
        (**self).apply(action)
    }

    fn apply_inverse(&mut self, action: &Action) -> DispatchResult {
        (**self).apply_inverse(action)
    }

    fn validate(&mut self, actions: &[Action], phase: Phase) -> DispatchResult {
        (**self).validate(actions, phase)
    }

    fn rename_object(&mut self, rename: &Rename) -> DispatchResult {
        (**self).rename_object(rename)
    }
}
