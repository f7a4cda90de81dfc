#![forbid(unsafe_code)]

//! Gestures: the undoable unit of work.
//!
//! A [`Gesture`] groups the [`Action`]s produced by one user edit. The edit
//! log applies them together, in order, and undoes them together in reverse
//! order.
//!
//! Each gesture carries two names:
//!
//! - a [`GestureKey`], a stable identifier used for correlation (tutorial
//!   observation, tests, logs); and
//! - a free-text `label` shown in the UI ("Undo rename zone").
//!
//! Keeping them apart means relabelling a menu entry can never break code
//! waiting on the gesture.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::object::{ObjectId, ObjectType};

/// Stable correlation key for a kind of gesture.
///
/// Hosts usually declare these as constants:
///
/// ```
/// use cfgx_core::GestureKey;
///
/// pub const RENAME_ZONE: GestureKey = GestureKey::new("zone.rename");
/// assert_eq!(RENAME_ZONE.as_str(), "zone.rename");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureKey(Cow<'static, str>);

impl GestureKey {
    /// Key from a string literal, usable in `const` items.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    /// Key built at runtime (e.g. from a plugin manifest).
    #[must_use]
    pub fn owned(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GestureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GestureError {
    #[error("gesture '{0}' has no actions")]
    Empty(GestureKey),
}

/// An ordered, non-empty group of actions undone and redone as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGesture", into = "RawGesture")]
pub struct Gesture {
    key: GestureKey,
    label: String,
    actions: Vec<Action>,
}

impl Gesture {
    pub fn new(
        key: GestureKey,
        label: impl Into<String>,
        actions: Vec<Action>,
    ) -> Result<Self, GestureError> {
        if actions.is_empty() {
            return Err(GestureError::Empty(key));
        }
        Ok(Self {
            key,
            label: label.into(),
            actions,
        })
    }

    /// A gesture made of exactly one action.
    #[must_use]
    pub fn single(key: GestureKey, label: impl Into<String>, action: Action) -> Self {
        Self {
            key,
            label: label.into(),
            actions: vec![action],
        }
    }

    #[must_use]
    pub fn builder(key: GestureKey) -> GestureBuilder {
        GestureBuilder {
            label: key.as_str().to_string(),
            key,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &GestureKey {
        &self.key
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether any action in this gesture targets `id`, whatever its kind.
    ///
    /// Selection actions are skipped: a stale focus on a deleted object is
    /// harmless and does not invalidate the rest of the gesture. The
    /// singleton id names no deletable object and never matches.
    #[must_use]
    pub fn depends_on(&self, id: &ObjectId) -> bool {
        self.depends_where(id, |_| true)
    }

    /// Whether any action in this gesture targets the `kind` object `id`.
    #[must_use]
    pub fn depends_on_object(&self, kind: ObjectType, id: &ObjectId) -> bool {
        self.depends_where(id, |a| a.object_type() == kind)
    }

    fn depends_where(&self, id: &ObjectId, kind_matches: impl Fn(&Action) -> bool) -> bool {
        !id.is_singleton()
            && self.actions.iter().any(|a| {
                !a.object_type().is_selection() && a.references(id) && kind_matches(a)
            })
    }

    /// Same gesture with its actions replaced.
    pub(crate) fn with_actions(&self, actions: Vec<Action>) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            actions,
        }
    }
}

/// Incremental construction of a multi-action gesture.
#[derive(Debug, Clone)]
pub struct GestureBuilder {
    key: GestureKey,
    label: String,
    actions: Vec<Action>,
}

impl GestureBuilder {
    /// Set the UI label (defaults to the key).
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn build(self) -> Result<Gesture, GestureError> {
        Gesture::new(self.key, self.label, self.actions)
    }
}

#[derive(Serialize, Deserialize)]
struct RawGesture {
    key: GestureKey,
    #[serde(default)]
    label: String,
    actions: Vec<Action>,
}

impl TryFrom<RawGesture> for Gesture {
    type Error = GestureError;

    fn try_from(raw: RawGesture) -> Result<Self, Self::Error> {
        Gesture::new(raw.key, raw.label, raw.actions)
    }
}

impl From<Gesture> for RawGesture {
    fn from(g: Gesture) -> Self {
        Self {
            key: g.key,
            label: g.label,
            actions: g.actions,
        }
    }
}
