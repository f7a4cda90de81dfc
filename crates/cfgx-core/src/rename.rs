#![forbid(unsafe_code)]

//! Identifier substitution rules.
//!
//! When the gateway replaces a provisional id with its permanent one, every
//! stored mention of the old id must follow. A [`Rename`] knows where such
//! mentions live for a given [`ObjectType`]:
//!
//! | Location                          | Rewritten when                                  |
//! |-----------------------------------|-------------------------------------------------|
//! | `Action::object_id`               | action targets the renamed kind and old id      |
//! | `"id"` field of an entity payload | payload belongs to the renamed kind             |
//! | entity reference fields           | field points at the renamed kind (`zone`, ...)  |
//! | reference table values            | table values point at the renamed kind          |
//! | reference table keys              | table keys are ids of the renamed kind          |
//! | selection focus field             | field names an object of the renamed kind       |
//!
//! All rewrites are copy-on-write: inputs are never mutated, and `None` is
//! returned when nothing mentions the old id so callers can keep the original
//! value.

use serde_json::{Map, Value};

use crate::action::{Action, Payload};
use crate::gesture::Gesture;
use crate::object::{ObjectId, ObjectType};

/// A permanent identifier replacing a provisional one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rename {
    object_type: ObjectType,
    from: ObjectId,
    to: ObjectId,
}

impl Rename {
    #[must_use]
    pub fn new(object_type: ObjectType, from: impl Into<ObjectId>, to: impl Into<ObjectId>) -> Self {
        Self {
            object_type,
            from: from.into(),
            to: to.into(),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub fn from(&self) -> &ObjectId {
        &self.from
    }

    #[must_use]
    pub fn to(&self) -> &ObjectId {
        &self.to
    }

    /// Whether this rename turns a provisional id into a permanent one.
    #[must_use]
    pub fn is_promotion(&self, provisional_prefix: &str) -> bool {
        self.from.has_prefix(provisional_prefix) && !self.to.has_prefix(provisional_prefix)
    }

    /// Rewrite one action, or `None` if it does not mention the old id.
    #[must_use]
    pub fn rewrite_action(&self, action: &Action) -> Option<Action> {
        let retarget = action.object_type() == self.object_type && *action.object_id() == self.from;
        let new_data = action
            .new_data()
            .map(|p| self.rewrite_payload(action.object_type(), p));
        let orig_data = action
            .orig_data()
            .map(|p| self.rewrite_payload(action.object_type(), p));

        let payload_changed = |p: &Option<Option<Payload>>| matches!(p, Some(Some(_)));
        if !retarget && !payload_changed(&new_data) && !payload_changed(&orig_data) {
            return None;
        }

        let object_id = if retarget {
            self.to.clone()
        } else {
            action.object_id().clone()
        };
        let pick = |rewritten: Option<Option<Payload>>, original: Option<&Payload>| {
            rewritten.and_then(|r| r.or_else(|| original.cloned()))
        };
        Some(action.rebuilt(
            object_id,
            pick(new_data, action.new_data()),
            pick(orig_data, action.orig_data()),
        ))
    }

    /// Rewrite every action of a gesture.
    ///
    /// Returns the new gesture and the number of actions that changed, or
    /// `None` when the gesture does not mention the old id at all.
    #[must_use]
    pub fn rewrite_gesture(&self, gesture: &Gesture) -> Option<(Gesture, usize)> {
        let mut changed = 0usize;
        let actions: Vec<Action> = gesture
            .actions()
            .iter()
            .map(|a| match self.rewrite_action(a) {
                Some(rewritten) => {
                    changed += 1;
                    rewritten
                }
                None => a.clone(),
            })
            .collect();
        (changed > 0).then(|| (gesture.with_actions(actions), changed))
    }

    /// Rewrite a payload stored under `kind`, or `None` if untouched.
    ///
    /// Hosts use this to keep live records in step with the edit log.
    #[must_use]
    pub fn rewrite_payload(&self, kind: ObjectType, payload: &Payload) -> Option<Payload> {
        let Value::Object(fields) = payload else {
            return None;
        };
        let mut out: Option<Map<String, Value>> = None;

        if kind == self.object_type {
            self.replace_field(fields, &mut out, "id");
        }
        for (field, target) in kind.reference_fields() {
            if *target == self.object_type {
                self.replace_field(fields, &mut out, field);
            }
        }
        if let Some(field) = kind
            .is_selection()
            .then(|| self.object_type.selection_field())
            .flatten()
        {
            self.replace_field(fields, &mut out, field);
        }
        if kind.table_value_kind() == Some(self.object_type) {
            for (key, value) in fields {
                if value.as_str() == Some(self.from.as_str()) {
                    out.get_or_insert_with(|| fields.clone())
                        .insert(key.clone(), Value::String(self.to.to_string()));
                }
            }
        }
        if kind.table_keys_hold(self.object_type) && fields.contains_key(self.from.as_str()) {
            let map = out.get_or_insert_with(|| fields.clone());
            if let Some(value) = map.remove(self.from.as_str()) {
                map.insert(self.to.to_string(), value);
            }
        }

        out.map(Value::Object)
    }

    fn replace_field(
        &self,
        fields: &Map<String, Value>,
        out: &mut Option<Map<String, Value>>,
        field: &str,
    ) {
        if fields.get(field).and_then(Value::as_str) == Some(self.from.as_str()) {
            out.get_or_insert_with(|| fields.clone())
                .insert(field.to_string(), Value::String(self.to.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureKey;
    use serde_json::json;

    fn zone_rename() -> Rename {
        Rename::new(ObjectType::SensorZone, "clientSz7", "SZ42")
    }

    #[test]
    fn promotion_guard() {
        assert!(zone_rename().is_promotion("client"));
        assert!(!Rename::new(ObjectType::Sensor, "S1", "S2").is_promotion("client"));
        assert!(!Rename::new(ObjectType::Sensor, "clientA", "clientB").is_promotion("client"));
    }

    #[test]
    fn entity_action_is_retargeted() {
        let action = Action::update(
            ObjectType::SensorZone,
            "clientSz7",
            json!({"name": "Lane 1"}),
            json!({"name": ""}),
        );
        let out = zone_rename().rewrite_action(&action).unwrap();
        assert_eq!(out.object_id(), &ObjectId::from("SZ42"));
        assert_eq!(out.new_data(), action.new_data());
        assert_eq!(out.orig_data(), action.orig_data());
        // input untouched
        assert_eq!(action.object_id(), &ObjectId::from("clientSz7"));
    }

    #[test]
    fn embedded_id_field_is_rewritten() {
        let action = Action::add(
            ObjectType::SensorZone,
            "clientSz7",
            json!({"id": "clientSz7", "name": "Lane 1"}),
        );
        let out = zone_rename().rewrite_action(&action).unwrap();
        assert_eq!(out.new_data(), Some(&json!({"id": "SZ42", "name": "Lane 1"})));
        assert_eq!(out.orig_data(), None);
    }

    #[test]
    fn other_kinds_with_same_id_are_left_alone() {
        let action = Action::update(
            ObjectType::Sensor,
            "clientSz7",
            json!({"id": "clientSz7"}),
            json!({"id": "clientSz7"}),
        );
        assert!(zone_rename().rewrite_action(&action).is_none());
    }

    #[test]
    fn entity_reference_fields_are_rewritten() {
        let action = Action::update(
            ObjectType::Sensor,
            "S1",
            json!({"zone": "clientSz7", "uplink": "clientSz7"}),
            json!({"zone": null}),
        );
        let out = zone_rename().rewrite_action(&action).unwrap();
        assert_eq!(out.object_id(), &ObjectId::from("S1"));
        assert_eq!(
            out.new_data(),
            Some(&json!({"zone": "SZ42", "uplink": "clientSz7"}))
        );
    }

    #[test]
    fn membership_values_are_rewritten_in_both_snapshots() {
        let action = Action::update(
            ObjectType::ZoneMembership,
            "",
            json!({"S1": "clientSz7", "S2": "clientSz7", "S3": "SZ1"}),
            json!({"S1": "clientSz7", "S2": "SZ1"}),
        );
        let out = zone_rename().rewrite_action(&action).unwrap();
        assert_eq!(
            out.new_data(),
            Some(&json!({"S1": "SZ42", "S2": "SZ42", "S3": "SZ1"}))
        );
        assert_eq!(out.orig_data(), Some(&json!({"S1": "SZ42", "S2": "SZ1"})));
        assert!(out.object_id().is_singleton());
    }

    #[test]
    fn table_keys_follow_member_renames() {
        let rename = Rename::new(ObjectType::Sensor, "clientS1", "S100");
        let action = Action::update(
            ObjectType::ZoneMembership,
            "",
            json!({"clientS1": "SZ1"}),
            json!({"clientS1": null}),
        );
        let out = rename.rewrite_action(&action).unwrap();
        assert_eq!(out.new_data(), Some(&json!({"S100": "SZ1"})));
        assert_eq!(out.orig_data(), Some(&json!({"S100": null})));
    }

    #[test]
    fn selection_focus_is_rewritten() {
        let action = Action::update(
            ObjectType::Selection,
            "",
            json!({"selected_zone": "clientSz7", "selected_device": "clientSz7"}),
            json!({"selected_zone": null}),
        );
        let out = zone_rename().rewrite_action(&action).unwrap();
        assert_eq!(
            out.new_data(),
            Some(&json!({"selected_zone": "SZ42", "selected_device": "clientSz7"}))
        );
        assert_eq!(out.orig_data(), action.orig_data());
    }

    #[test]
    fn gesture_rewrite_counts_changes() {
        let g = Gesture::builder(GestureKey::new("zone.create"))
            .action(Action::add(
                ObjectType::SensorZone,
                "clientSz7",
                json!({"id": "clientSz7"}),
            ))
            .action(Action::update(
                ObjectType::ApConfig,
                "",
                json!({"channel": 3}),
                json!({"channel": 1}),
            ))
            .build()
            .unwrap();
        let (out, changed) = zone_rename().rewrite_gesture(&g).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(out.key(), g.key());
        assert_eq!(out.label(), g.label());
        assert_eq!(out.actions()[1], g.actions()[1]);
        assert!(Rename::new(ObjectType::Radio, "clientR1", "R1")
            .rewrite_gesture(&g)
            .is_none());
    }

    #[test]
    fn non_object_payloads_are_untouched() {
        assert!(zone_rename()
            .rewrite_payload(ObjectType::SensorZone, &json!("clientSz7"))
            .is_none());
    }
}
