#![forbid(unsafe_code)]

//! Identifier reconciliation across the live state and both stacks.
//!
//! When the gateway replaces a provisional id with a permanent one, the host
//! calls [`GestureLog::reconcile_identifier`]. Live state is renamed first
//! through the dispatcher; then every recorded action that mentions the old
//! id is replaced by a rewritten copy (see [`Rename`] for the rules).
//!
//! Only field values change. Gesture order, keys, labels, stack lengths,
//! the eviction count and the save watermark are left exactly as they were.

use std::collections::VecDeque;

use cfgx_core::{Gesture, ObjectId, ObjectType, Rename};

use super::dispatch::Dispatcher;
use super::history::{GestureLog, HistoryError};

/// What a reconciliation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// False when the rename was ignored by the provisional-id guard.
    pub applied: bool,
    /// Gestures with at least one rewritten action.
    pub gestures: usize,
    /// Rewritten actions.
    pub actions: usize,
}

impl<D: Dispatcher> GestureLog<D> {
    /// Replace provisional id `old` with permanent id `new` everywhere.
    pub fn reconcile_identifier(
        &mut self,
        old: &ObjectId,
        new: &ObjectId,
        object_type: ObjectType,
    ) -> Result<ReconcileReport, HistoryError> {
        self.reconcile(&Rename::new(object_type, old.clone(), new.clone()))
    }

    /// Apply a rename to live state and to both stacks.
    ///
    /// Renames that do not turn a provisional id into a permanent one are
    /// logged and ignored. If the dispatcher cannot rename live state, the
    /// stacks are left untouched.
    pub fn reconcile(&mut self, rename: &Rename) -> Result<ReconcileReport, HistoryError> {
        if !rename.is_promotion(&self.config.provisional_prefix) {
            tracing::warn!(
                target: "cfgx.reconcile",
                object_type = %rename.object_type(),
                old = %rename.from(),
                new = %rename.to(),
                "ignoring rename of non-provisional identifier"
            );
            return Ok(ReconcileReport::default());
        }

        self.dispatcher
            .rename_object(rename)
            .map_err(HistoryError::Rename)?;

        let mut report = ReconcileReport {
            applied: true,
            ..ReconcileReport::default()
        };
        rewrite_stack(&mut self.done, rename, &mut report);
        rewrite_stack(&mut self.undone, rename, &mut report);

        tracing::debug!(
            target: "cfgx.reconcile",
            object_type = %rename.object_type(),
            old = %rename.from(),
            new = %rename.to(),
            gestures = report.gestures,
            actions = report.actions,
            "identifier reconciled"
        );
        Ok(report)
    }
}

fn rewrite_stack(stack: &mut VecDeque<Gesture>, rename: &Rename, report: &mut ReconcileReport) {
    for slot in stack.iter_mut() {
        if let Some((gesture, changed)) = rename.rewrite_gesture(slot) {
            *slot = gesture;
            report.gestures += 1;
            report.actions += changed;
        }
    }
}
