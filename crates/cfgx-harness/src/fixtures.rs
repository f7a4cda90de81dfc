#![forbid(unsafe_code)]

//! Gestures a configuration editor typically records.

use cfgx_core::{Action, Gesture, GestureKey, ObjectType};
use serde_json::{Map, Value, json};

pub const CREATE_ZONE: GestureKey = GestureKey::new("zone.create");
pub const SET_ZONE_NAME: GestureKey = GestureKey::new("zone.set_name");
pub const ASSIGN_SENSOR: GestureKey = GestureKey::new("sensor.assign_zone");
pub const DELETE_SENSOR: GestureKey = GestureKey::new("sensor.delete");
pub const SET_CHANNEL: GestureKey = GestureKey::new("ap.set_channel");

/// Create a zone and focus it.
#[must_use]
pub fn create_zone(id: &str, name: &str, previous_focus: Option<&str>) -> Gesture {
    Gesture::builder(CREATE_ZONE)
        .label(format!("Create zone {name}"))
        .action(Action::add(
            ObjectType::SensorZone,
            id,
            json!({"id": id, "name": name}),
        ))
        .action(Action::update(
            ObjectType::Selection,
            "",
            json!({"selected_zone": id}),
            json!({"selected_zone": optional(previous_focus)}),
        ))
        .build()
        .expect("gesture has actions")
}

/// Rename a zone from `old` to `new` (display name, not id).
#[must_use]
pub fn set_zone_name(id: &str, new: &str, old: &str) -> Gesture {
    Gesture::single(
        SET_ZONE_NAME,
        "Set zone name",
        Action::update(
            ObjectType::SensorZone,
            id,
            json!({"name": new}),
            json!({"name": old}),
        ),
    )
}

/// Move a sensor into a zone; `previous` is its former zone, if any.
#[must_use]
pub fn assign_sensor(sensor: &str, zone: &str, previous: Option<&str>) -> Gesture {
    let prev = optional(previous);
    Gesture::builder(ASSIGN_SENSOR)
        .label("Assign sensor to zone")
        .action(Action::update(
            ObjectType::Sensor,
            sensor,
            json!({"zone": zone}),
            json!({"zone": prev.clone()}),
        ))
        .action(Action::update(
            ObjectType::ZoneMembership,
            "",
            table(sensor, Value::String(zone.to_string())),
            table(sensor, prev),
        ))
        .build()
        .expect("gesture has actions")
}

/// Delete a sensor, given its full record.
#[must_use]
pub fn delete_sensor(sensor: &str, record: Value) -> Gesture {
    Gesture::single(
        DELETE_SENSOR,
        "Delete sensor",
        Action::delete(ObjectType::Sensor, sensor, record),
    )
}

/// Change the access point channel.
#[must_use]
pub fn set_channel(new: u32, old: u32) -> Gesture {
    Gesture::single(
        SET_CHANNEL,
        format!("Set channel {new}"),
        Action::update(
            ObjectType::ApConfig,
            "",
            json!({"channel": new}),
            json!({"channel": old}),
        ),
    )
}

fn optional(id: Option<&str>) -> Value {
    id.map_or(Value::Null, |p| Value::String(p.to_string()))
}

fn table(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
