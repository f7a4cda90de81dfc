#![forbid(unsafe_code)]

//! End-to-end: gestures recorded against a live store while the gateway
//! renames and deletes objects.
//!
//! Run:
//!   cargo test -p cfgx-runtime --test e2e_reconcile_and_purge

use cfgx_core::{Action, Gesture, ObjectId, ObjectType, UpdateType};
use cfgx_harness::fixtures::{
    CREATE_ZONE, SET_ZONE_NAME, assign_sensor, create_zone, delete_sensor, set_channel,
    set_zone_name,
};
use cfgx_harness::{ConfigStore, init_test_tracing};
use cfgx_runtime::{Dispatcher, GestureLog, HistoryConfig, HistoryError, PerformMode, Phase};
use serde_json::json;

fn id(s: &str) -> ObjectId {
    ObjectId::from(s)
}

fn seeded_log() -> GestureLog<ConfigStore> {
    init_test_tracing();
    let store = ConfigStore::new()
        .with_record(ObjectType::Sensor, "S1", json!({"id": "S1"}))
        .with_record(ObjectType::Sensor, "S2", json!({"id": "S2"}))
        .with_record(ObjectType::ApConfig, "", json!({"channel": 1}));
    GestureLog::with_default_config(store)
}

#[test]
fn example_scenario_undo_targets_permanent_id() {
    let mut log = seeded_log();
    log.dispatcher_mut().apply(&Action::add(
        ObjectType::SensorZone,
        "clientSz7",
        json!({"id": "clientSz7", "name": ""}),
    ))
    .unwrap();

    log.perform(set_zone_name("clientSz7", "Lane 1", ""), PerformMode::Fresh)
        .unwrap();
    assert_eq!(log.undo_depth(), 1);

    log.reconcile_identifier(&id("clientSz7"), &id("SZ42"), ObjectType::SensorZone)
        .unwrap();
    assert_eq!(
        log.dispatcher().get(ObjectType::SensorZone, "SZ42"),
        Some(&json!({"id": "SZ42", "name": "Lane 1"}))
    );

    log.undo().unwrap();
    let inverse = log.dispatcher().inverses().last().unwrap();
    assert_eq!(inverse.object_id(), &id("SZ42"));
    assert_eq!(inverse.update_type(), UpdateType::Update);
    assert_eq!(
        log.dispatcher().get(ObjectType::SensorZone, "SZ42"),
        Some(&json!({"id": "SZ42", "name": ""}))
    );
}

#[test]
fn undo_then_redo_restores_exact_state() {
    let mut log = seeded_log();
    log.perform(create_zone("clientSz1", "Dock", None), PerformMode::Fresh)
        .unwrap();
    log.perform(assign_sensor("S1", "clientSz1", None), PerformMode::Fresh)
        .unwrap();
    log.perform(set_channel(6, 1), PerformMode::Fresh).unwrap();
    let after_perform = log.dispatcher().snapshot();

    for _ in 0..3 {
        log.undo().unwrap();
    }
    assert!(!log.dispatcher().contains(ObjectType::SensorZone, "clientSz1"));
    assert_eq!(
        log.dispatcher().get(ObjectType::ApConfig, ""),
        Some(&json!({"channel": 1}))
    );

    for _ in 0..3 {
        log.redo().unwrap();
    }
    assert_eq!(log.dispatcher().snapshot(), after_perform);
}

#[test]
fn reconcile_rewrites_tables_selection_and_redo_history() {
    let mut log = seeded_log();
    log.perform(create_zone("clientSz1", "Dock", None), PerformMode::Fresh)
        .unwrap();
    log.perform(assign_sensor("S1", "clientSz1", None), PerformMode::Fresh)
        .unwrap();
    log.perform(assign_sensor("S2", "clientSz1", None), PerformMode::Fresh)
        .unwrap();
    log.undo().unwrap();

    let report = log
        .reconcile_identifier(&id("clientSz1"), &id("SZ9"), ObjectType::SensorZone)
        .unwrap();
    assert!(report.applied);
    assert_eq!(report.gestures, 3);
    assert_eq!(log.undo_depth(), 2);
    assert_eq!(log.redo_depth(), 1);

    assert_eq!(
        log.dispatcher().get(ObjectType::ZoneMembership, ""),
        Some(&json!({"S1": "SZ9"}))
    );
    assert_eq!(
        log.dispatcher().get(ObjectType::Selection, ""),
        Some(&json!({"selected_zone": "SZ9"}))
    );
    assert_eq!(
        log.dispatcher().get(ObjectType::Sensor, "S1"),
        Some(&json!({"id": "S1", "zone": "SZ9"}))
    );

    // redo lands on the permanent id
    log.redo().unwrap();
    assert_eq!(
        log.dispatcher().get(ObjectType::ZoneMembership, ""),
        Some(&json!({"S1": "SZ9", "S2": "SZ9"}))
    );

    // undoing everything removes the zone under its permanent id
    for _ in 0..3 {
        log.undo().unwrap();
    }
    assert!(!log.dispatcher().contains(ObjectType::SensorZone, "SZ9"));
    assert!(!log.dispatcher().contains(ObjectType::SensorZone, "clientSz1"));
    assert_eq!(
        log.dispatcher().get(ObjectType::ZoneMembership, ""),
        Some(&json!({}))
    );
}

#[test]
fn reconcile_keeps_keys_and_labels() {
    let mut log = seeded_log();
    log.perform(create_zone("clientSz1", "Dock", None), PerformMode::Fresh)
        .unwrap();
    log.perform(set_zone_name("clientSz1", "Bay", "Dock"), PerformMode::Fresh)
        .unwrap();
    let before: Vec<(String, String)> = log
        .done_gestures()
        .map(|g| (g.key().to_string(), g.label().to_string()))
        .collect();

    log.reconcile_identifier(&id("clientSz1"), &id("SZ1"), ObjectType::SensorZone)
        .unwrap();

    let after: Vec<(String, String)> = log
        .done_gestures()
        .map(|g| (g.key().to_string(), g.label().to_string()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(log.done_gestures().next().unwrap().key(), &CREATE_ZONE);
    assert_eq!(log.done_gestures().last().unwrap().key(), &SET_ZONE_NAME);
}

#[test]
fn purge_drops_gestures_for_deleted_sensor() {
    let mut log = seeded_log();
    log.perform(create_zone("SZ1", "Dock", None), PerformMode::Fresh)
        .unwrap();
    log.perform(assign_sensor("S1", "SZ1", None), PerformMode::Fresh)
        .unwrap();
    log.perform(set_channel(6, 1), PerformMode::Fresh).unwrap();
    log.perform(assign_sensor("S2", "SZ1", None), PerformMode::Fresh)
        .unwrap();
    log.undo().unwrap();

    // gateway deleted S1 and S2 behind our back
    let report = log.purge_object_references(&id("S1"));
    assert_eq!(report.done_removed, 1);
    let report = log.purge_object_references(&id("S2"));
    assert_eq!(report.undone_removed, 1);

    let labels: Vec<&str> = log.done_gestures().map(Gesture::label).collect();
    assert_eq!(labels, ["Create zone Dock", "Set channel 6"]);
    assert!(!log.has_redoable_xacts());
}

#[test]
fn delete_gesture_round_trips_full_record() {
    let mut log = seeded_log();
    let record = log
        .dispatcher()
        .get(ObjectType::Sensor, "S2")
        .cloned()
        .unwrap();
    log.perform(delete_sensor("S2", record.clone()), PerformMode::Fresh)
        .unwrap();
    assert!(!log.dispatcher().contains(ObjectType::Sensor, "S2"));
    log.undo().unwrap();
    assert_eq!(log.dispatcher().get(ObjectType::Sensor, "S2"), Some(&record));
}

#[test]
fn validation_runs_once_per_application() {
    let mut log = seeded_log();
    log.perform(assign_sensor("S1", "SZ1", None), PerformMode::Fresh)
        .unwrap();
    log.undo().unwrap();
    log.redo().unwrap();
    assert_eq!(
        log.dispatcher().validations(),
        [(Phase::Do, 2), (Phase::Undo, 2), (Phase::Do, 2)]
    );
}

#[test]
fn rejected_validation_leaves_history_untouched() {
    let mut log = seeded_log();
    log.perform(set_channel(6, 1), PerformMode::Fresh).unwrap();
    log.dispatcher_mut()
        .reject_validation(Phase::Do, vec!["channel 14 not allowed".into()]);

    let err = log.perform(set_channel(14, 6), PerformMode::Fresh).unwrap_err();
    assert!(matches!(err, HistoryError::Validation { phase: Phase::Do, .. }));
    assert!(err.to_string().contains("channel 14 not allowed"));
    assert_eq!(log.undo_depth(), 1);
}

#[test]
fn stale_undo_fails_and_keeps_gesture() {
    let mut log = seeded_log();
    log.perform(set_zone_name("SZ1", "x", "y"), PerformMode::Fresh)
        .unwrap_err();
    assert!(!log.has_undoable_xacts());

    log.perform(create_zone("SZ1", "Dock", None), PerformMode::Fresh)
        .unwrap();
    log.dispatcher_mut().fail_on("SZ1");
    assert!(matches!(log.undo(), Err(HistoryError::Dispatch { .. })));
    assert_eq!(log.undo_depth(), 1);
    log.dispatcher_mut().heal();
    log.undo().unwrap();
}

#[test]
fn bounded_history_with_saves() {
    let config = HistoryConfig::new(5);
    let mut log = GestureLog::new(
        ConfigStore::new().with_record(ObjectType::ApConfig, "", json!({"channel": 0})),
        config,
    );
    for ch in 1..=8 {
        log.perform(set_channel(ch, ch - 1), PerformMode::Fresh)
            .unwrap();
    }
    assert_eq!(log.undo_depth(), 5);
    assert_eq!(log.evicted(), 3);
    log.mark_saved();
    assert!(log.is_below_save_level());
    assert!(!log.undo_stack_changed_since_last_save());

    log.perform(set_channel(9, 8), PerformMode::Fresh).unwrap();
    assert_eq!(log.undo_depth(), 5);
    log.undo().unwrap();
    assert_eq!(
        log.dispatcher().get(ObjectType::ApConfig, ""),
        Some(&json!({"channel": 8}))
    );
    assert!(matches!(log.undo(), Err(HistoryError::AtSaveLevel { .. })));
}
