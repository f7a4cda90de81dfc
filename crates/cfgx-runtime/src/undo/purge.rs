#![forbid(unsafe_code)]

//! Dropping history that depends on a deleted object.
//!
//! Once the gateway reports an object gone, any gesture that acts on it can
//! no longer be undone or redone. Gestures are atomic, so the whole gesture
//! goes, never a single action out of it. Selection actions do not count as
//! a dependency (see [`Gesture::depends_on`]), and neither does the singleton
//! id shared by every singleton entity.

use cfgx_core::{Gesture, ObjectId, ObjectType};

use super::history::GestureLog;

/// Gestures removed by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub done_removed: usize,
    pub undone_removed: usize,
}

impl PurgeReport {
    /// Gestures removed from both stacks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.done_removed + self.undone_removed
    }
}

impl<D> GestureLog<D> {
    /// Remove every gesture on either stack that acts on `id`, whatever
    /// the object's kind.
    ///
    /// Unknown ids are a no-op. The singleton id names no deletable object;
    /// it is refused with a warning and nothing is removed.
    pub fn purge_object_references(&mut self, id: &ObjectId) -> PurgeReport {
        if refuse_singleton(None, id) {
            return PurgeReport::default();
        }
        self.purge_where(id, |g| g.depends_on(id))
    }

    /// Remove every gesture on either stack that acts on the `kind` object `id`.
    ///
    /// Objects of other kinds that share the id are left alone.
    pub fn purge_object(&mut self, kind: ObjectType, id: &ObjectId) -> PurgeReport {
        if refuse_singleton(Some(kind), id) {
            return PurgeReport::default();
        }
        self.purge_where(id, |g| g.depends_on_object(kind, id))
    }

    /// Remove undoable gestures that act on `id`.
    ///
    /// Gestures removed from below the save watermark lower it by the same
    /// count, so the saved region keeps covering the same surviving gestures.
    pub fn purge_done_stack(&mut self, id: &ObjectId) -> usize {
        self.retain_done(|g| !g.depends_on(id))
    }

    /// Remove redoable gestures that act on `id`.
    pub fn purge_undone_stack(&mut self, id: &ObjectId) -> usize {
        let before = self.undone.len();
        self.undone.retain(|g| !g.depends_on(id));
        before - self.undone.len()
    }

    fn purge_where(&mut self, id: &ObjectId, depends: impl Fn(&Gesture) -> bool) -> PurgeReport {
        let done_removed = self.retain_done(|g| !depends(g));
        let before = self.undone.len();
        self.undone.retain(|g| !depends(g));
        let report = PurgeReport {
            done_removed,
            undone_removed: before - self.undone.len(),
        };
        if report.total() > 0 {
            tracing::debug!(
                target: "cfgx.purge",
                object_id = %id,
                done_removed = report.done_removed,
                undone_removed = report.undone_removed,
                "history purged"
            );
        }
        report
    }

    fn retain_done(&mut self, keep: impl Fn(&Gesture) -> bool) -> usize {
        let watermark = self.save_watermark;
        let before = self.done.len();
        let mut position = self.evicted;
        let mut below_watermark = 0usize;

        self.done.retain(|gesture| {
            let kept = keep(gesture);
            if !kept && position < watermark {
                below_watermark += 1;
            }
            position += 1;
            kept
        });

        self.save_watermark -= below_watermark;
        before - self.done.len()
    }
}

fn refuse_singleton(kind: Option<ObjectType>, id: &ObjectId) -> bool {
    if !id.is_singleton() {
        return false;
    }
    tracing::warn!(
        target: "cfgx.purge",
        object_type = kind.map_or("any", ObjectType::as_str),
        "ignoring purge of the singleton identifier"
    );
    true
}
