//! Device domain classification for Home Assistant entities.
//!
//! Home Assistant encodes the integration domain in the entity id
//! (`light.kitchen`), but many devices are exposed through generic domains
//! (`switch.lamp_plug`, `input_boolean.fan`). The classifier combines the
//! `device_class` attribute, the id prefix, and a table of German/English
//! aliases to infer the domain a user most likely means.

use jarvis_types::{domain_prefix, Attributes, DeviceDomain, EntityState};
use serde_json::Value;
use std::sync::LazyLock;

/// Alias table, scanned in order when nothing else matches.
const DEFAULT_ALIASES: &[(&str, DeviceDomain)] = &[
    ("lamp", DeviceDomain::Light),
    ("lampe", DeviceDomain::Light),
    ("licht", DeviceDomain::Light),
    ("light", DeviceDomain::Light),
    ("switch", DeviceDomain::Switch),
    ("plug", DeviceDomain::Switch),
    ("outlet", DeviceDomain::Switch),
    ("socket", DeviceDomain::Switch),
    ("cover", DeviceDomain::Cover),
    ("shade", DeviceDomain::Cover),
    ("blind", DeviceDomain::Cover),
    ("jalousie", DeviceDomain::Cover),
    ("roller", DeviceDomain::Cover),
    ("fan", DeviceDomain::Fan),
    ("ventilator", DeviceDomain::Fan),
    ("media", DeviceDomain::MediaPlayer),
    ("speaker", DeviceDomain::MediaPlayer),
    ("tv", DeviceDomain::MediaPlayer),
    ("thermostat", DeviceDomain::Climate),
    ("ac", DeviceDomain::Climate),
    ("vacuum", DeviceDomain::Vacuum),
];

/// Domains understood by [`classify_basic`].
const BASIC_DOMAINS: &[&str] = &[
    "light",
    "switch",
    "cover",
    "media_player",
    "fan",
    "climate",
    "sensor",
    "binary_sensor",
];

static DEFAULT_CLASSIFIER: LazyLock<DeviceClassifier> = LazyLock::new(DeviceClassifier::new);

/// Classifies entities into domains with alias and `device_class` support.
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    aliases: Vec<(String, DeviceDomain)>,
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClassifier {
    /// Creates a classifier with the built-in alias table.
    pub fn new() -> Self {
        Self::with_aliases(DEFAULT_ALIASES.iter().copied())
    }

    /// Creates a classifier with a custom alias table. Keys are lower-cased;
    /// the iteration order is the scan order for substring fallback.
    pub fn with_aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (S, DeviceDomain)>,
        S: AsRef<str>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(alias, domain)| (alias.as_ref().to_lowercase(), domain))
                .collect(),
        }
    }

    /// Infers an entity's domain from `device_class`, the id prefix, and aliases.
    ///
    /// Unknown but well-formed id prefixes are returned unchanged so new Home
    /// Assistant domains keep working; only an empty id yields `"unknown"`.
    pub fn classify(&self, entity_id: &str, attributes: &Attributes) -> String {
        let candidates = candidate_domains(entity_id, attributes);
        if let Some(domain) = candidates.iter().find_map(|c| self.normalize(c)) {
            return domain.as_str().to_string();
        }

        let lowered_id = entity_id.to_lowercase();
        if let Some((_, domain)) = self
            .aliases
            .iter()
            .find(|(alias, _)| lowered_id.contains(alias.as_str()))
        {
            return domain.as_str().to_string();
        }

        match candidates.last() {
            Some(hint) if !hint.is_empty() => hint.clone(),
            _ => DeviceDomain::Unknown.as_str().to_string(),
        }
    }

    pub fn classify_state(&self, entity: &EntityState) -> String {
        self.classify(&entity.entity_id, &entity.attributes)
    }

    pub fn is_light(&self, entity: &EntityState) -> bool {
        self.matches_domain(entity, DeviceDomain::Light)
    }

    pub fn is_switch(&self, entity: &EntityState) -> bool {
        self.matches_domain(entity, DeviceDomain::Switch)
    }

    /// Lamps are lights; kept as a separate name because users say "lamp".
    pub fn is_lamp(&self, entity: &EntityState) -> bool {
        self.is_light(entity)
    }

    pub fn is_cover(&self, entity: &EntityState) -> bool {
        self.matches_domain(entity, DeviceDomain::Cover)
    }

    pub fn is_media_player(&self, entity: &EntityState) -> bool {
        self.matches_domain(entity, DeviceDomain::MediaPlayer)
    }

    pub fn is_climate(&self, entity: &EntityState) -> bool {
        self.matches_domain(entity, DeviceDomain::Climate)
    }

    /// Whether entities of `domain` have a meaningful on/off state.
    pub fn domain_supports_on_off(&self, domain: &str) -> bool {
        matches!(
            DeviceDomain::parse_lossy(domain),
            DeviceDomain::Light
                | DeviceDomain::Switch
                | DeviceDomain::Fan
                | DeviceDomain::Humidifier
                | DeviceDomain::MediaPlayer
                | DeviceDomain::Cover
                | DeviceDomain::Vacuum
                | DeviceDomain::Lock
        )
    }

    /// Whether `state` counts as "on" for an entity of `domain`.
    pub fn is_on_state(&self, domain: &str, state: &str) -> bool {
        let state = state.to_lowercase();
        let state = state.as_str();
        match DeviceDomain::parse_lossy(domain) {
            DeviceDomain::Light
            | DeviceDomain::Switch
            | DeviceDomain::Fan
            | DeviceDomain::Humidifier => state == "on",
            DeviceDomain::MediaPlayer => matches!(state, "on" | "playing" | "idle" | "paused"),
            DeviceDomain::Cover => matches!(state, "open" | "opening"),
            DeviceDomain::Vacuum => matches!(state, "on" | "cleaning" | "returning"),
            DeviceDomain::Lock => matches!(state, "unlocked" | "open"),
            _ => false,
        }
    }

    fn normalize(&self, candidate: &str) -> Option<DeviceDomain> {
        if let Some((_, domain)) = self.aliases.iter().find(|(alias, _)| alias == candidate) {
            return Some(*domain);
        }
        match DeviceDomain::parse_lossy(candidate) {
            DeviceDomain::Unknown => None,
            domain => Some(domain),
        }
    }

    fn matches_domain(&self, entity: &EntityState, domain: DeviceDomain) -> bool {
        DeviceDomain::parse_lossy(&self.classify_state(entity)) == domain
    }
}

fn candidate_domains(entity_id: &str, attributes: &Attributes) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(Value::String(device_class)) = attributes.get("device_class") {
        let device_class = device_class.trim().to_lowercase();
        if !device_class.is_empty() {
            candidates.push(device_class);
        }
    }
    if !entity_id.is_empty() {
        candidates.push(domain_prefix(entity_id).to_lowercase());
    }
    candidates
}

/// The shared classifier with the built-in alias table.
pub fn default_classifier() -> &'static DeviceClassifier {
    &DEFAULT_CLASSIFIER
}

/// Classifies with the shared default classifier.
pub fn classify_entity(entity_id: &str, attributes: &Attributes) -> String {
    DEFAULT_CLASSIFIER.classify(entity_id, attributes)
}

/// Plain prefix mapping onto a small set of domains; everything else is
/// `"unknown"`. Attributes are not consulted.
pub fn classify_basic(entity_id: &str) -> &'static str {
    let prefix = domain_prefix(entity_id);
    BASIC_DOMAINS
        .iter()
        .copied()
        .find(|domain| *domain == prefix)
        .unwrap_or("unknown")
}
