#![forbid(unsafe_code)]

//! One-shot notification when a watched gesture completes.
//!
//! A tutorial or help overlay can ask the log to tell it when the user has
//! performed a specific gesture ("now rename the zone"). The overlay registers
//! the [`GestureKey`]s it is waiting for; the first performed gesture whose
//! key is watched clears the whole watch set and is handed to the observer.
//!
//! Nothing here affects undo or redo.

use std::collections::HashSet;
use std::fmt;

use cfgx_core::{Gesture, GestureKey};

/// Receiver for completed, watched gestures.
pub trait GestureObserver {
    /// Called once with the gesture that matched the watch set.
    fn gesture_observed(&mut self, gesture: &Gesture);
}

impl<F> GestureObserver for F
where
    F: FnMut(&Gesture),
{
    fn gesture_observed(&mut self, gesture: &Gesture) {
        self(gesture)
    }
}

/// Watch set plus the optional observer.
#[derive(Default)]
pub struct GestureWatch {
    keys: HashSet<GestureKey>,
    observer: Option<Box<dyn GestureObserver + Send>>,
}

impl fmt::Debug for GestureWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureWatch")
            .field("keys", &self.keys)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl GestureWatch {
    /// Add `key` to the watch set.
    pub fn watch(&mut self, key: GestureKey) {
        self.keys.insert(key);
    }

    /// Empty the watch set.
    pub fn unwatch_all(&mut self) {
        self.keys.clear();
    }

    /// Check if `key` is in the watch set.
    #[must_use]
    pub fn is_watching(&self, key: &GestureKey) -> bool {
        self.keys.contains(key)
    }

    /// Watched keys, in no particular order.
    pub fn watched(&self) -> impl Iterator<Item = &GestureKey> {
        self.keys.iter()
    }

    /// Install the observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn GestureObserver + Send>) {
        self.observer = Some(observer);
    }

    /// Remove the observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Check a just-performed gesture against the watch set.
    ///
    /// Returns true when the gesture matched (and the set was cleared).
    pub fn notify(&mut self, gesture: &Gesture) -> bool {
        if !self.keys.contains(gesture.key()) {
            return false;
        }
        self.keys.clear();
        tracing::debug!(
            target: "cfgx.observer",
            key = %gesture.key(),
            has_observer = self.observer.is_some(),
            "watched gesture performed"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.gesture_observed(gesture);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgx_core::{Action, ObjectType};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const RENAME: GestureKey = GestureKey::new("zone.rename");
    const MOVE: GestureKey = GestureKey::new("sensor.move");

    fn gesture(key: GestureKey) -> Gesture {
        Gesture::single(
            key,
            "test",
            Action::update(ObjectType::Sensor, "S1", json!({"x": 1}), json!({"x": 0})),
        )
    }

    #[test]
    fn match_clears_all_keys_and_notifies_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut watch = GestureWatch::default();
        watch.set_observer(Box::new(move |g: &Gesture| {
            sink.lock().unwrap().push(g.key().clone());
        }));
        watch.watch(RENAME);
        watch.watch(MOVE);

        assert!(watch.notify(&gesture(MOVE)));
        assert!(!watch.is_watching(&RENAME));
        assert!(!watch.notify(&gesture(RENAME)));
        assert_eq!(*seen.lock().unwrap(), vec![MOVE]);
    }

    #[test]
    fn unwatched_gesture_is_ignored() {
        let mut watch = GestureWatch::default();
        watch.watch(RENAME);
        assert!(!watch.notify(&gesture(MOVE)));
        assert!(watch.is_watching(&RENAME));
        assert_eq!(watch.watched().count(), 1);
    }

    #[test]
    fn matching_without_observer_still_clears() {
        let mut watch = GestureWatch::default();
        watch.watch(RENAME);
        assert!(watch.notify(&gesture(RENAME)));
        assert_eq!(watch.watched().count(), 0);
        assert!(format!("{watch:?}").contains("has_observer: false"));
    }
}
