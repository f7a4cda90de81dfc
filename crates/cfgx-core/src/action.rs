#![forbid(unsafe_code)]

//! The atomic unit of a recorded edit.
//!
//! An [`Action`] describes one field or object mutation together with the
//! data needed to reverse it. Actions carry no behavior beyond validity
//! checks and inversion; applying them is the dispatcher's job.
//!
//! # Invariants
//!
//! - `UpdateType::Delete` implies `new_data` is `None`
//! - `UpdateType::Add` implies `orig_data` is `None`
//! - A JSON `null` payload is stored as `None`
//!
//! Fields are private, so these hold for every `Action` value. Use
//! [`Action::new`] for untrusted input; the typed constructors cannot
//! produce an invalid combination.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::object::{ObjectId, ObjectType};

/// Data carried by an action: a whole entity, a partial field patch, or a
/// reference table.
pub type Payload = Value;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateType {
    Add,
    Update,
    Delete,
}

impl UpdateType {
    /// The mutation that reverses this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Add => Self::Delete,
            Self::Update => Self::Update,
            Self::Delete => Self::Add,
        }
    }
}

/// Errors raised while building or inverting an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("delete of {object_type} '{object_id}' carries new data")]
    DeleteWithData {
        object_type: ObjectType,
        object_id: ObjectId,
    },
    #[error("add of {object_type} '{object_id}' carries original data")]
    AddWithOriginal {
        object_type: ObjectType,
        object_id: ObjectId,
    },
    #[error("{object_type} '{object_id}' has no {missing} data to invert")]
    NotInvertible {
        object_type: ObjectType,
        object_id: ObjectId,
        missing: &'static str,
    },
}

/// One recorded mutation and its inverse data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct Action {
    object_type: ObjectType,
    object_id: ObjectId,
    update: UpdateType,
    new_data: Option<Payload>,
    orig_data: Option<Payload>,
}

fn non_null(data: Option<Payload>) -> Option<Payload> {
    data.filter(|v| !v.is_null())
}

impl Action {
    /// Build an action, rejecting combinations that break the invariants.
    pub fn new(
        object_type: ObjectType,
        object_id: impl Into<ObjectId>,
        update: UpdateType,
        new_data: Option<Payload>,
        orig_data: Option<Payload>,
    ) -> Result<Self, ActionError> {
        let object_id = object_id.into();
        let new_data = non_null(new_data);
        let orig_data = non_null(orig_data);
        match update {
            UpdateType::Delete if new_data.is_some() => Err(ActionError::DeleteWithData {
                object_type,
                object_id,
            }),
            UpdateType::Add if orig_data.is_some() => Err(ActionError::AddWithOriginal {
                object_type,
                object_id,
            }),
            _ => Ok(Self {
                object_type,
                object_id,
                update,
                new_data,
                orig_data,
            }),
        }
    }

    /// Create a new object.
    #[must_use]
    pub fn add(object_type: ObjectType, object_id: impl Into<ObjectId>, data: Payload) -> Self {
        Self {
            object_type,
            object_id: object_id.into(),
            update: UpdateType::Add,
            new_data: non_null(Some(data)),
            orig_data: None,
        }
    }

    /// Patch an existing object; `orig` holds the fields to restore on undo.
    #[must_use]
    pub fn update(
        object_type: ObjectType,
        object_id: impl Into<ObjectId>,
        new: Payload,
        orig: Payload,
    ) -> Self {
        Self {
            object_type,
            object_id: object_id.into(),
            update: UpdateType::Update,
            new_data: non_null(Some(new)),
            orig_data: non_null(Some(orig)),
        }
    }

    /// Remove an object; `orig` is the full entity to restore on undo.
    #[must_use]
    pub fn delete(object_type: ObjectType, object_id: impl Into<ObjectId>, orig: Payload) -> Self {
        Self {
            object_type,
            object_id: object_id.into(),
            update: UpdateType::Delete,
            new_data: None,
            orig_data: non_null(Some(orig)),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    #[must_use]
    pub fn update_type(&self) -> UpdateType {
        self.update
    }

    #[must_use]
    pub fn new_data(&self) -> Option<&Payload> {
        self.new_data.as_ref()
    }

    #[must_use]
    pub fn orig_data(&self) -> Option<&Payload> {
        self.orig_data.as_ref()
    }

    /// Whether this action targets `id` as its object.
    ///
    /// Only the action's own target counts; ids embedded in payloads
    /// (reference tables, selection fields) do not.
    #[must_use]
    pub fn references(&self, id: &ObjectId) -> bool {
        self.object_id == *id
    }

    /// The action that reverses this one.
    ///
    /// `Add` becomes `Delete` of the added entity, `Delete` becomes `Add` of
    /// the original entity, and `Update` swaps the two snapshots.
    pub fn inverse(&self) -> Result<Self, ActionError> {
        let original = || {
            self.orig_data
                .clone()
                .ok_or_else(|| ActionError::NotInvertible {
                    object_type: self.object_type,
                    object_id: self.object_id.clone(),
                    missing: "original",
                })
        };
        let (new_data, orig_data) = match self.update {
            UpdateType::Add => (None, self.new_data.clone()),
            UpdateType::Delete => (Some(original()?), None),
            UpdateType::Update => (Some(original()?), self.new_data.clone()),
        };
        Ok(Self {
            object_type: self.object_type,
            object_id: self.object_id.clone(),
            update: self.update.inverse(),
            new_data,
            orig_data,
        })
    }

    /// Copy of this action with different identity and payloads.
    ///
    /// Used by rename rewriting; the update type is kept so the invariants
    /// still hold when the inputs came from a valid action.
    pub(crate) fn rebuilt(
        &self,
        object_id: ObjectId,
        new_data: Option<Payload>,
        orig_data: Option<Payload>,
    ) -> Self {
        Self {
            object_type: self.object_type,
            object_id,
            update: self.update,
            new_data,
            orig_data,
        }
    }
}

/// Unchecked wire shape of an action.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    object_type: ObjectType,
    #[serde(default)]
    object_id: ObjectId,
    update_type: UpdateType,
    #[serde(default)]
    new_data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orig_data: Option<Payload>,
}

impl TryFrom<RawAction> for Action {
    type Error = ActionError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        Action::new(
            raw.object_type,
            raw.object_id,
            raw.update_type,
            raw.new_data,
            raw.orig_data,
        )
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        Self {
            object_type: action.object_type,
            object_id: action.object_id,
            update_type: action.update,
            new_data: action.new_data,
            orig_data: action.orig_data,
        }
    }
}
