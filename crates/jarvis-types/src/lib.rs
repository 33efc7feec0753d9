//! Shared types for the Jarvis backend.
//!
//! This crate provides the foundational types used across the Jarvis crates:
//! Home Assistant device domains, raw entity states as returned by the
//! Home Assistant REST API, classified cache records, and the
//! OpenAI-compatible chat wire types.
//!
//! Logic lives in the crates that own it; this crate only carries data so the
//! dependency graph stays acyclic.

pub mod chat;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// JSON object used for Home Assistant entity attributes.
pub type Attributes = Map<String, Value>;

/// Home Assistant domains relevant for control and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceDomain {
    AlarmControlPanel,
    BinarySensor,
    Camera,
    Climate,
    Cover,
    DeviceTracker,
    Fan,
    Humidifier,
    Light,
    Lock,
    MediaPlayer,
    Sensor,
    Switch,
    Vacuum,
    Unknown,
}

impl DeviceDomain {
    /// Returns the Home Assistant domain string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlarmControlPanel => "alarm_control_panel",
            Self::BinarySensor => "binary_sensor",
            Self::Camera => "camera",
            Self::Climate => "climate",
            Self::Cover => "cover",
            Self::DeviceTracker => "device_tracker",
            Self::Fan => "fan",
            Self::Humidifier => "humidifier",
            Self::Light => "light",
            Self::Lock => "lock",
            Self::MediaPlayer => "media_player",
            Self::Sensor => "sensor",
            Self::Switch => "switch",
            Self::Vacuum => "vacuum",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a domain string, mapping anything unrecognised to `Unknown`.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for DeviceDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceDomain {
    type Err = ParseDeviceDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alarm_control_panel" => Ok(Self::AlarmControlPanel),
            "binary_sensor" => Ok(Self::BinarySensor),
            "camera" => Ok(Self::Camera),
            "climate" => Ok(Self::Climate),
            "cover" => Ok(Self::Cover),
            "device_tracker" => Ok(Self::DeviceTracker),
            "fan" => Ok(Self::Fan),
            "humidifier" => Ok(Self::Humidifier),
            "light" => Ok(Self::Light),
            "lock" => Ok(Self::Lock),
            "media_player" => Ok(Self::MediaPlayer),
            "sensor" => Ok(Self::Sensor),
            "switch" => Ok(Self::Switch),
            "vacuum" => Ok(Self::Vacuum),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseDeviceDomainError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown device domain string.
#[derive(Debug, Clone)]
pub struct ParseDeviceDomainError(pub String);

impl std::fmt::Display for ParseDeviceDomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown device domain: {}", self.0)
    }
}

impl std::error::Error for ParseDeviceDomainError {}

/// A raw entity state as returned by `GET /api/states`.
///
/// Only the fields the backend relies on are kept. Missing or `null`
/// attributes deserialize to an empty object, and a missing state becomes
/// `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default = "unknown_state", deserialize_with = "state_string")]
    pub state: String,
    #[serde(default, deserialize_with = "attributes_or_empty")]
    pub attributes: Attributes,
}

impl EntityState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Attributes::new(),
        }
    }

    /// Adds an attribute, builder style.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The lower-cased domain prefix of the entity id (`light` for `light.kitchen`).
    pub fn domain_hint(&self) -> String {
        domain_prefix(&self.entity_id).to_lowercase()
    }

    /// The `friendly_name` attribute, if it is a non-empty string.
    pub fn friendly_name(&self) -> Option<&str> {
        friendly_name(&self.attributes)
    }
}

/// A classified entity held in the discovery cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    pub name: String,
    pub domain: String,
    pub state: String,
    pub attributes: Attributes,
}

impl EntityRecord {
    /// Text used for fuzzy matching: the display name followed by the entity
    /// id with underscores turned into spaces.
    pub fn search_text(&self) -> String {
        let alias = friendly_name(&self.attributes).unwrap_or(&self.name);
        format!("{} {}", alias, self.entity_id.replace('_', " "))
    }

    /// The friendly name, falling back to the record name.
    pub fn display_name(&self) -> &str {
        friendly_name(&self.attributes).unwrap_or(&self.name)
    }
}

impl From<&EntityRecord> for EntityState {
    fn from(record: &EntityRecord) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            state: record.state.clone(),
            attributes: record.attributes.clone(),
        }
    }
}

/// Returns the part of an entity id before the first `.`.
pub fn domain_prefix(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or_default()
}

fn friendly_name(attributes: &Attributes) -> Option<&str> {
    attributes
        .get("friendly_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

fn unknown_state() -> String {
    "unknown".to_string()
}

fn state_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => unknown_state(),
        other => other.to_string(),
    })
}

fn attributes_or_empty<'de, D>(deserializer: D) -> Result<Attributes, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Attributes>::deserialize(deserializer)?.unwrap_or_default())
}
