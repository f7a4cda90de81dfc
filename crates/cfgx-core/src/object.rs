#![forbid(unsafe_code)]

//! Object kinds and identifiers.
//!
//! Every recorded [`Action`](crate::Action) names the object it touches by an
//! [`ObjectType`] tag plus an [`ObjectId`]. Singleton entities (device config,
//! map settings, selection state, the reference tables) use the empty id.
//!
//! # Provisional identifiers
//!
//! Objects created locally before the gateway has assigned them a permanent
//! name carry an id starting with [`PROVISIONAL_PREFIX`]. When the gateway
//! answers with the permanent id, the edit log rewrites every stored reference
//! (see [`Rename`](crate::Rename)).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking an identifier invented on the client.
pub const PROVISIONAL_PREFIX: &str = "client";

/// Closed set of entity kinds an action can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    /// Access-point device configuration (singleton).
    ApConfig,
    /// A sensor device.
    Sensor,
    /// A repeater radio.
    Radio,
    /// A group of sensors reported as one detection zone.
    SensorZone,
    /// Map placement settings (singleton).
    MapSettings,
    /// Reference table: sensor id -> owning zone id.
    ZoneMembership,
    /// Reference table: device id -> radio id the device reports through.
    RadioUplink,
    /// Selection/focus state of the editor (singleton).
    Selection,
}

impl ObjectType {
    pub const ALL: [ObjectType; 8] = [
        ObjectType::ApConfig,
        ObjectType::Sensor,
        ObjectType::Radio,
        ObjectType::SensorZone,
        ObjectType::MapSettings,
        ObjectType::ZoneMembership,
        ObjectType::RadioUplink,
        ObjectType::Selection,
    ];

    /// Stable tag used in logs and serialized payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApConfig => "ap-config",
            Self::Sensor => "sensor",
            Self::Radio => "radio",
            Self::SensorZone => "sensor-zone",
            Self::MapSettings => "map-settings",
            Self::ZoneMembership => "zone-membership",
            Self::RadioUplink => "radio-uplink",
            Self::Selection => "selection",
        }
    }

    /// Whether this kind has exactly one instance (addressed by the empty id).
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        matches!(
            self,
            Self::ApConfig
                | Self::MapSettings
                | Self::ZoneMembership
                | Self::RadioUplink
                | Self::Selection
        )
    }

    #[must_use]
    pub const fn is_selection(self) -> bool {
        matches!(self, Self::Selection)
    }

    /// For a reference table, the kind its values point at.
    #[must_use]
    pub const fn table_value_kind(self) -> Option<ObjectType> {
        match self {
            Self::ZoneMembership => Some(Self::SensorZone),
            Self::RadioUplink => Some(Self::Radio),
            _ => None,
        }
    }

    /// For a reference table, whether keys may be ids of `kind`.
    #[must_use]
    pub const fn table_keys_hold(self, kind: ObjectType) -> bool {
        match self {
            Self::ZoneMembership => matches!(kind, Self::Sensor),
            Self::RadioUplink => matches!(kind, Self::Sensor | Self::Radio),
            _ => false,
        }
    }

    /// Entity fields holding the id of another object, with that object's kind.
    #[must_use]
    pub const fn reference_fields(self) -> &'static [(&'static str, ObjectType)] {
        match self {
            Self::Sensor => &[("zone", Self::SensorZone), ("uplink", Self::Radio)],
            Self::Radio => &[("uplink", Self::Radio)],
            _ => &[],
        }
    }

    /// Field of the selection record that names an object of this kind.
    #[must_use]
    pub const fn selection_field(self) -> Option<&'static str> {
        match self {
            Self::Sensor | Self::Radio => Some("selected_device"),
            Self::SensorZone => Some("selected_zone"),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one object instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id used by singleton entities.
    #[must_use]
    pub const fn singleton() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the id carries the default client-provisional marker.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.has_prefix(PROVISIONAL_PREFIX)
    }

    /// Whether the id carries the given provisional marker.
    ///
    /// The bare prefix alone is not a provisional id.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.len() > prefix.len() && self.0.starts_with(prefix)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ObjectId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ObjectId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
