#![forbid(unsafe_code)]

//! In-memory configuration store implementing [`Dispatcher`].
//!
//! Records are JSON values keyed by `(ObjectType, ObjectId)`. Updates merge
//! object patches field by field; a `null` field in a patch removes that
//! field, which is how reference-table entries are dropped. Every call is
//! journaled so tests can inspect exactly what the log asked for.

use std::collections::BTreeMap;

use cfgx_core::{Action, ObjectId, ObjectType, Payload, Rename, UpdateType};
use cfgx_runtime::{DispatchError, DispatchResult, Dispatcher, Phase};
use serde_json::{Map, Value};

type Key = (ObjectType, ObjectId);

/// Deterministic dispatcher backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    records: BTreeMap<Key, Value>,
    applied: Vec<Action>,
    inverses: Vec<Action>,
    validations: Vec<(Phase, usize)>,
    renames: Vec<Rename>,
    fail_on: Option<ObjectId>,
    reject: Option<(Phase, Vec<String>)>,
}

impl ConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record.
    #[must_use]
    pub fn with_record(mut self, kind: ObjectType, id: impl Into<ObjectId>, value: Value) -> Self {
        self.records.insert((kind, id.into()), value);
        self
    }

    /// Make every `apply` or `apply_inverse` touching `id` fail.
    pub fn fail_on(&mut self, id: impl Into<ObjectId>) {
        self.fail_on = Some(id.into());
    }

    /// Make validation in `phase` fail with `messages`.
    pub fn reject_validation(&mut self, phase: Phase, messages: Vec<String>) {
        self.reject = Some((phase, messages));
    }

    /// Clear injected failures.
    pub fn heal(&mut self) {
        self.fail_on = None;
        self.reject = None;
    }

    #[must_use]
    pub fn get(&self, kind: ObjectType, id: &str) -> Option<&Value> {
        self.records.get(&(kind, ObjectId::from(id)))
    }

    #[must_use]
    pub fn contains(&self, kind: ObjectType, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    /// Copy of every record, for whole-state comparisons.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Key, Value> {
        self.records.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forward actions applied, in order.
    #[must_use]
    pub fn applied(&self) -> &[Action] {
        &self.applied
    }

    /// Inverse actions issued by undo, in order.
    #[must_use]
    pub fn inverses(&self) -> &[Action] {
        &self.inverses
    }

    /// Validation calls as `(phase, action count)`.
    #[must_use]
    pub fn validations(&self) -> &[(Phase, usize)] {
        &self.validations
    }

    #[must_use]
    pub fn renames(&self) -> &[Rename] {
        &self.renames
    }

    pub fn clear_journal(&mut self) {
        self.applied.clear();
        self.inverses.clear();
        self.validations.clear();
        self.renames.clear();
    }

    fn check_failure(&self, action: &Action) -> DispatchResult {
        if self.fail_on.as_ref() == Some(action.object_id()) {
            return Err(DispatchError::Rejected(format!(
                "injected failure on '{}'",
                action.object_id()
            )));
        }
        Ok(())
    }

    fn write(&mut self, action: &Action) -> DispatchResult {
        self.check_failure(action)?;
        let key = (action.object_type(), action.object_id().clone());
        let not_found = || DispatchError::NotFound {
            object_type: action.object_type(),
            object_id: action.object_id().clone(),
        };
        match action.update_type() {
            UpdateType::Add => {
                if self.records.contains_key(&key) {
                    return Err(DispatchError::AlreadyExists {
                        object_type: key.0,
                        object_id: key.1,
                    });
                }
                let value = action
                    .new_data()
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                self.records.insert(key, value);
            }
            UpdateType::Update => {
                let patch = action.new_data();
                if key.0.is_singleton() {
                    let current = self
                        .records
                        .entry(key)
                        .or_insert_with(|| Value::Object(Map::new()));
                    merge(current, patch);
                } else {
                    let current = self.records.get_mut(&key).ok_or_else(not_found)?;
                    merge(current, patch);
                }
            }
            UpdateType::Delete => {
                self.records.remove(&key).ok_or_else(not_found)?;
            }
        }
        tracing::trace!(
            target: "cfgx.harness",
            object_type = %action.object_type(),
            object_id = %action.object_id(),
            update = ?action.update_type(),
            "record written"
        );
        Ok(())
    }
}

fn merge(current: &mut Value, patch: Option<&Payload>) {
    match (current, patch) {
        (Value::Object(fields), Some(Value::Object(patch))) => {
            for (k, v) in patch {
                if v.is_null() {
                    fields.remove(k);
                } else {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        (current, Some(other)) => *current = other.clone(),
        (_, None) => {}
    }
}

impl Dispatcher for ConfigStore {
    fn apply(&mut self, action: &Action) -> DispatchResult {
        self.write(action)?;
        self.applied.push(action.clone());
        Ok(())
    }

    fn apply_inverse(&mut self, action: &Action) -> DispatchResult {
        let inverse = action.inverse()?;
        self.write(&inverse)?;
        self.inverses.push(inverse);
        Ok(())
    }

    fn validate(&mut self, actions: &[Action], phase: Phase) -> DispatchResult {
        self.validations.push((phase, actions.len()));
        match &self.reject {
            Some((p, messages)) if *p == phase => Err(DispatchError::Validation(messages.clone())),
            _ => Ok(()),
        }
    }

    fn rename_object(&mut self, rename: &Rename) -> DispatchResult {
        let from = (rename.object_type(), rename.from().clone());
        if let Some(value) = self.records.remove(&from) {
            self.records
                .insert((rename.object_type(), rename.to().clone()), value);
        }
        for ((kind, _), value) in self.records.iter_mut() {
            if let Some(rewritten) = rename.rewrite_payload(*kind, value) {
                *value = rewritten;
            }
        }
        self.renames.push(rename.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_merges_and_null_removes() {
        let mut store = ConfigStore::new().with_record(
            ObjectType::ZoneMembership,
            "",
            json!({"S1": "SZ1", "S2": "SZ1"}),
        );
        store
            .apply(&Action::update(
                ObjectType::ZoneMembership,
                "",
                json!({"S1": null, "S3": "SZ2"}),
                json!({"S1": "SZ1", "S3": null}),
            ))
            .unwrap();
        assert_eq!(
            store.get(ObjectType::ZoneMembership, ""),
            Some(&json!({"S2": "SZ1", "S3": "SZ2"}))
        );
    }

    #[test]
    fn update_of_missing_entity_fails() {
        let mut store = ConfigStore::new();
        let err = store
            .apply(&Action::update(ObjectType::Sensor, "S9", json!({}), json!({})))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[test]
    fn duplicate_add_fails() {
        let mut store = ConfigStore::new().with_record(ObjectType::Radio, "R1", json!({}));
        let err = store
            .apply(&Action::add(ObjectType::Radio, "R1", json!({"id": "R1"})))
            .unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyExists { .. }));
    }

    #[test]
    fn rename_moves_record_and_rewrites_references() {
        let mut store = ConfigStore::new()
            .with_record(
                ObjectType::SensorZone,
                "clientSz7",
                json!({"id": "clientSz7", "name": "Lane 1"}),
            )
            .with_record(ObjectType::ZoneMembership, "", json!({"S1": "clientSz7"}))
            .with_record(ObjectType::Selection, "", json!({"selected_zone": "clientSz7"}));
        store
            .rename_object(&Rename::new(ObjectType::SensorZone, "clientSz7", "SZ42"))
            .unwrap();
        assert!(!store.contains(ObjectType::SensorZone, "clientSz7"));
        assert_eq!(
            store.get(ObjectType::SensorZone, "SZ42"),
            Some(&json!({"id": "SZ42", "name": "Lane 1"}))
        );
        assert_eq!(
            store.get(ObjectType::ZoneMembership, ""),
            Some(&json!({"S1": "SZ42"}))
        );
        assert_eq!(
            store.get(ObjectType::Selection, ""),
            Some(&json!({"selected_zone": "SZ42"}))
        );
    }

    #[test]
    fn injected_failure_and_heal() {
        let mut store = ConfigStore::new();
        store.fail_on("S1");
        let add = Action::add(ObjectType::Sensor, "S1", json!({"id": "S1"}));
        assert!(store.apply(&add).is_err());
        assert!(store.applied().is_empty());
        store.heal();
        store.apply(&add).unwrap();
        assert_eq!(store.applied().len(), 1);
    }
}
