//! Filters over entity states based on power state.

use crate::classifier::DeviceClassifier;
use jarvis_types::EntityState;

/// Domains inspected by [`devices_on`] when the caller does not narrow them.
pub const DEFAULT_POWER_DOMAINS: &[&str] = &["light", "switch"];

/// Returns the entities in `domains` that support on/off and are currently on.
pub fn devices_on<'a, I>(
    states: I,
    domains: &[&str],
    classifier: &DeviceClassifier,
) -> Vec<EntityState>
where
    I: IntoIterator<Item = &'a EntityState>,
{
    let allowed: Vec<String> = domains.iter().map(|d| d.to_lowercase()).collect();

    states
        .into_iter()
        .filter(|entity| {
            let domain = classifier.classify_state(entity);
            allowed.contains(&domain)
                && classifier.domain_supports_on_off(&domain)
                && classifier.is_on_state(&domain, &entity.state)
        })
        .cloned()
        .collect()
}

pub fn lights_on<'a, I>(states: I, classifier: &DeviceClassifier) -> Vec<EntityState>
where
    I: IntoIterator<Item = &'a EntityState>,
{
    devices_on(states, &["light"], classifier)
}

pub fn switches_on<'a, I>(states: I, classifier: &DeviceClassifier) -> Vec<EntityState>
where
    I: IntoIterator<Item = &'a EntityState>,
{
    devices_on(states, &["switch"], classifier)
}
