#![forbid(unsafe_code)]

//! Gesture log: the undo/redo stacks for configuration edits.
//!
//! This module provides the [`GestureLog`] which maintains dual stacks of
//! [`Gesture`]s with support for:
//!
//! - **Atomic gestures**: all actions of a gesture apply and undo together
//! - **Depth limits**: at most `max_depth` gestures stay undoable
//! - **Branch handling**: a fresh user gesture clears the redo stack
//! - **Save watermark**: undo stops at the state that was last saved
//!
//! # Invariants
//!
//! 1. `done.len() <= config.max_depth` (after any operation)
//! 2. `undone.len() <= config.max_redo_depth` (after any operation)
//! 3. `raw_len() == evicted + done.len()`
//! 4. Redo stack is cleared whenever a fresh user gesture is performed
//! 5. A gesture is on at most one stack
//!
//! # Eviction and the save watermark
//!
//! Evicting the oldest gesture does not shift positions. The log counts
//! evicted slots, so the raw length (`evicted + live`) only moves with
//! perform, undo and purge, and the save watermark can stay a plain position:
//!
//! ```text
//! max_depth = 3, mark_saved() after g3
//! ┌──────────────────────────────────────────────────────┐
//! │ evicted: 0   done: [g1, g2, g3]        watermark: 3  │
//! └──────────────────────────────────────────────────────┘
//!
//! perform(g4)  <-- g1 evicted
//! ┌──────────────────────────────────────────────────────┐
//! │ evicted: 1   done: [g2, g3, g4]        watermark: 3  │
//! │ raw: 4 > 3   => changed since save                   │
//! │ visible watermark: 3 - 1 = 2, live 3 > 2 => undo ok  │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

use cfgx_core::{Gesture, GestureKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dispatch::{DispatchError, Dispatcher, Phase};
use super::observer::{GestureObserver, GestureWatch};

/// Configuration for the gesture log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of gestures kept undoable.
    pub max_depth: usize,
    /// Maximum number of gestures kept redoable.
    pub max_redo_depth: usize,
    /// Prefix marking client-provisional object ids.
    pub provisional_prefix: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_redo_depth: 50,
            provisional_prefix: cfgx_core::PROVISIONAL_PREFIX.to_string(),
        }
    }
}

impl HistoryConfig {
    /// Create a configuration with a custom undo depth.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Set the redo stack bound.
    #[must_use]
    pub fn with_max_redo_depth(mut self, max_redo_depth: usize) -> Self {
        self.max_redo_depth = max_redo_depth;
        self
    }

    /// Set the prefix that marks client-invented identifiers.
    #[must_use]
    pub fn with_provisional_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.provisional_prefix = prefix.into();
        self
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_redo_depth: usize::MAX,
            ..Self::default()
        }
    }

    /// Copy with every invalid parameter replaced by a usable one.
    fn sanitized(mut self) -> Self {
        let errors = self.validate();
        if errors.is_empty() {
            return self;
        }
        tracing::warn!(
            target: "cfgx.history",
            errors = %errors.join("; "),
            "invalid history config repaired"
        );
        self.max_depth = self.max_depth.max(1);
        self.max_redo_depth = self.max_redo_depth.max(1);
        if self.provisional_prefix.is_empty() {
            self.provisional_prefix = cfgx_core::PROVISIONAL_PREFIX.to_string();
        }
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_depth == 0 {
            errors.push("max_depth must be > 0".into());
        }
        if self.max_redo_depth == 0 {
            errors.push("max_redo_depth must be > 0".into());
        }
        if self.provisional_prefix.is_empty() {
            errors.push("provisional_prefix must not be empty".into());
        }
        errors
    }
}

/// How a gesture is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformMode {
    /// A new user edit: clears redo history, recorded for undo.
    #[default]
    Fresh,
    /// Re-applying an undone gesture: recorded, redo history kept.
    Redo,
    /// A user action that cannot be undone: clears redo history, not recorded.
    NonUndoable,
    /// Configuration pushed by the gateway: not recorded, stacks untouched,
    /// and invisible to gesture observers.
    ServerPush,
}

impl PerformMode {
    /// Whether the gesture lands on the undo stack.
    #[must_use]
    pub const fn records(self) -> bool {
        matches!(self, Self::Fresh | Self::Redo)
    }

    /// Whether the redo stack is dropped before applying.
    #[must_use]
    pub const fn clears_redo(self) -> bool {
        matches!(self, Self::Fresh | Self::NonUndoable)
    }

    /// Whether the gesture comes from the user rather than the gateway.
    #[must_use]
    pub const fn is_user(self) -> bool {
        !matches!(self, Self::ServerPush)
    }
}

/// Errors from gesture log operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("undo refused at save level ({undoable} undoable, watermark {watermark})")]
    AtSaveLevel { undoable: usize, watermark: usize },
    #[error("gesture '{key}' action {index} failed: {source}")]
    Dispatch {
        key: GestureKey,
        index: usize,
        #[source]
        source: DispatchError,
    },
    #[error("gesture '{key}' failed {phase} validation: {source}")]
    Validation {
        key: GestureKey,
        phase: Phase,
        #[source]
        source: DispatchError,
    },
    #[error("rename of live state failed: {0}")]
    Rename(#[source] DispatchError),
}

/// Manager for undo/redo gesture history.
///
/// Owns its [`Dispatcher`]; hosts reach their state through
/// [`dispatcher`](Self::dispatcher) and [`dispatcher_mut`](Self::dispatcher_mut).
pub struct GestureLog<D> {
    pub(super) dispatcher: D,
    /// Gestures available for undo (newest at back).
    pub(super) done: VecDeque<Gesture>,
    /// Gestures available for redo (newest at back).
    pub(super) undone: VecDeque<Gesture>,
    /// Gestures dropped from the front of `done` since the last clear.
    pub(super) evicted: usize,
    /// Raw done length at the last save.
    pub(super) save_watermark: usize,
    pub(super) config: HistoryConfig,
    watch: GestureWatch,
}

impl<D> fmt::Debug for GestureLog<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureLog")
            .field("undo_depth", &self.done.len())
            .field("redo_depth", &self.undone.len())
            .field("evicted", &self.evicted)
            .field("save_watermark", &self.save_watermark)
            .field("config", &self.config)
            .field("watch", &self.watch)
            .finish()
    }
}

impl<D: Dispatcher> GestureLog<D> {
    /// Create a log over `dispatcher`.
    ///
    /// An invalid `config` is repaired rather than rejected: zero depths
    /// become 1 and an empty provisional prefix falls back to the default.
    #[must_use]
    pub fn new(dispatcher: D, config: HistoryConfig) -> Self {
        Self {
            dispatcher,
            done: VecDeque::new(),
            undone: VecDeque::new(),
            evicted: 0,
            save_watermark: 0,
            config: config.sanitized(),
            watch: GestureWatch::default(),
        }
    }

    /// Create a log with [`HistoryConfig::default`].
    #[must_use]
    pub fn with_default_config(dispatcher: D) -> Self {
        Self::new(dispatcher, HistoryConfig::default())
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Apply a gesture through the dispatcher and record it per `mode`.
    ///
    /// Fails without recording if any action or the final validation fails.
    /// Actions applied before the failure are not rolled back.
    pub fn perform(&mut self, gesture: Gesture, mode: PerformMode) -> Result<(), HistoryError> {
        if mode.clears_redo() {
            self.clear_undone_stack();
        }
        self.apply_forward(&gesture)?;
        self.complete(gesture, mode);
        Ok(())
    }

    /// Undo the newest gesture.
    ///
    /// Inverse actions run newest-first; on dispatcher failure the gesture
    /// stays on the undo stack. Returns the key of the undone gesture.
    pub fn undo(&mut self) -> Result<GestureKey, HistoryError> {
        if self.done.is_empty() {
            tracing::warn!(target: "cfgx.history", "undo requested with empty history");
            return Err(HistoryError::NothingToUndo);
        }
        if self.is_below_save_level() {
            tracing::warn!(
                target: "cfgx.history",
                undoable = self.done.len(),
                watermark = self.save_watermark,
                "undo refused below save level"
            );
            return Err(HistoryError::AtSaveLevel {
                undoable: self.done.len(),
                watermark: self.save_watermark,
            });
        }
        let Some(gesture) = self.done.pop_back() else {
            return Err(HistoryError::NothingToUndo);
        };

        if let Err(e) = self.apply_backward(&gesture) {
            self.done.push_back(gesture);
            return Err(e);
        }

        let key = gesture.key().clone();
        tracing::debug!(target: "cfgx.history", key = %key, "gesture undone");
        self.push_undone(gesture);
        Ok(key)
    }

    /// Re-apply the most recently undone gesture.
    ///
    /// On failure the gesture stays on the redo stack. Returns its key.
    pub fn redo(&mut self) -> Result<GestureKey, HistoryError> {
        let Some(gesture) = self.undone.pop_back() else {
            tracing::warn!(target: "cfgx.history", "redo requested with empty redo history");
            return Err(HistoryError::NothingToRedo);
        };

        if let Err(e) = self.apply_forward(&gesture) {
            self.undone.push_back(gesture);
            return Err(e);
        }

        let key = gesture.key().clone();
        self.complete(gesture, PerformMode::Redo);
        Ok(key)
    }

    fn apply_forward(&mut self, gesture: &Gesture) -> Result<(), HistoryError> {
        for (index, action) in gesture.actions().iter().enumerate() {
            self.dispatcher
                .apply(action)
                .map_err(|source| HistoryError::Dispatch {
                    key: gesture.key().clone(),
                    index,
                    source,
                })?;
        }
        self.dispatcher
            .validate(gesture.actions(), Phase::Do)
            .map_err(|source| HistoryError::Validation {
                key: gesture.key().clone(),
                phase: Phase::Do,
                source,
            })
    }

    fn apply_backward(&mut self, gesture: &Gesture) -> Result<(), HistoryError> {
        let actions = gesture.actions();
        for (index, action) in actions.iter().enumerate().rev() {
            self.dispatcher
                .apply_inverse(action)
                .map_err(|source| HistoryError::Dispatch {
                    key: gesture.key().clone(),
                    index,
                    source,
                })?;
            if index + 1 == actions.len() {
                // Undo restores a state that passed validation once; report only.
                if let Err(e) = self.dispatcher.validate(actions, Phase::Undo) {
                    tracing::warn!(
                        target: "cfgx.history",
                        key = %gesture.key(),
                        error = %e,
                        "undo validation reported errors"
                    );
                }
            }
        }
        Ok(())
    }

    fn complete(&mut self, gesture: Gesture, mode: PerformMode) {
        tracing::debug!(
            target: "cfgx.history",
            key = %gesture.key(),
            mode = ?mode,
            actions = gesture.len(),
            "gesture performed"
        );
        if mode.is_user() {
            self.watch.notify(&gesture);
        }
        if mode.records() {
            self.push_done(gesture);
        }
    }

    fn push_done(&mut self, gesture: Gesture) {
        self.done.push_back(gesture);
        while self.done.len() > self.config.max_depth {
            if let Some(old) = self.done.pop_front() {
                self.evicted += 1;
                tracing::debug!(
                    target: "cfgx.history",
                    key = %old.key(),
                    evicted = self.evicted,
                    "oldest gesture evicted"
                );
            }
        }
    }

    fn push_undone(&mut self, gesture: Gesture) {
        self.undone.push_back(gesture);
        while self.undone.len() > self.config.max_redo_depth {
            self.undone.pop_front();
        }
    }
}

impl<D> GestureLog<D> {
    // ========================================================================
    // Save Watermark
    // ========================================================================

    /// Whether there is at least one gesture left to undo.
    #[must_use]
    pub fn has_undoable_xacts(&self) -> bool {
        !self.done.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn has_redoable_xacts(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Whether undo would cross into the saved state.
    #[must_use]
    pub fn is_below_save_level(&self) -> bool {
        self.done.len() <= self.save_watermark.saturating_sub(self.evicted)
    }

    /// Whether gestures were recorded since the last save.
    ///
    /// Compares raw positions, so evicting old gestures never reads as
    /// "nothing changed".
    #[must_use]
    pub fn undo_stack_changed_since_last_save(&self) -> bool {
        self.raw_len() > self.save_watermark
    }

    /// Record that the current state was saved.
    pub fn mark_saved(&mut self) {
        self.save_watermark = self.raw_len();
        tracing::debug!(
            target: "cfgx.history",
            watermark = self.save_watermark,
            "save watermark set"
        );
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Number of undoable gestures.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    /// Number of redoable gestures.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Number of gestures evicted by the depth limit since the last clear.
    #[must_use]
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Evicted plus undoable gestures.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.evicted + self.done.len()
    }

    /// Raw done length at the last save.
    #[must_use]
    pub fn save_watermark(&self) -> usize {
        self.save_watermark
    }

    /// Undoable gestures, oldest first.
    pub fn done_gestures(&self) -> impl DoubleEndedIterator<Item = &Gesture> {
        self.done.iter()
    }

    /// Redoable gestures, oldest first.
    pub fn undone_gestures(&self) -> impl DoubleEndedIterator<Item = &Gesture> {
        self.undone.iter()
    }

    /// Labels of undoable gestures (most recent first).
    pub fn undo_labels(&self, limit: usize) -> Vec<&str> {
        self.done.iter().rev().take(limit).map(Gesture::label).collect()
    }

    /// Labels of redoable gestures (most recent first).
    pub fn redo_labels(&self, limit: usize) -> Vec<&str> {
        self.undone.iter().rev().take(limit).map(Gesture::label).collect()
    }

    /// Label of the gesture the next undo would revert.
    #[must_use]
    pub fn next_undo_label(&self) -> Option<&str> {
        self.done.back().map(Gesture::label)
    }

    /// Label of the gesture the next redo would re-apply.
    #[must_use]
    pub fn next_redo_label(&self) -> Option<&str> {
        self.undone.back().map(Gesture::label)
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// The host state behind the log.
    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Mutable access to the host state, for edits that bypass history.
    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    /// Drop the history and hand back the dispatcher.
    #[must_use]
    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Drop all undo history; resets eviction count and save watermark.
    pub fn clear_done_stack(&mut self) {
        self.done.clear();
        self.evicted = 0;
        self.save_watermark = 0;
    }

    /// Drop all redo history.
    pub fn clear_undone_stack(&mut self) {
        if !self.undone.is_empty() {
            tracing::debug!(
                target: "cfgx.history",
                dropped = self.undone.len(),
                "redo history cleared"
            );
        }
        self.undone.clear();
    }

    /// Clear all history (both undo and redo).
    pub fn clear(&mut self) {
        self.clear_done_stack();
        self.clear_undone_stack();
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Notify the observer the next time a gesture with `key` is performed.
    pub fn watch_for_gesture(&mut self, key: GestureKey) {
        self.watch.watch(key);
    }

    /// Stop watching every key.
    pub fn unwatch_all(&mut self) {
        self.watch.unwatch_all();
    }

    /// Check if `key` is currently watched.
    #[must_use]
    pub fn is_watching(&self, key: &GestureKey) -> bool {
        self.watch.is_watching(key)
    }

    /// Keys currently watched, in no particular order.
    pub fn watched_gestures(&self) -> impl Iterator<Item = &GestureKey> {
        self.watch.watched()
    }

    /// Install the observer told about watched gestures, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl GestureObserver + Send + 'static) {
        self.watch.set_observer(Box::new(observer));
    }

    /// Remove the observer; watched keys still clear when matched.
    pub fn clear_observer(&mut self) {
        self.watch.clear_observer();
    }
}

// ============================================================================
// Tests
// ============================================================================
