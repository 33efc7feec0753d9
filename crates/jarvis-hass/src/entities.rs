//! Name and state lookups over the discovery cache.

use crate::classifier::classify_basic;
use crate::discovery::DiscoveryService;
use jarvis_types::{Attributes, EntityRecord};
use serde::Serialize;
use std::sync::Arc;

const NAME_SEARCH_LIMIT: usize = 5;

/// Entity description returned by lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub entity_id: String,
    pub name: String,
    pub friendly_name: String,
    pub state: String,
    pub attributes: Attributes,
}

impl From<&EntityRecord> for EntitySummary {
    fn from(record: &EntityRecord) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            name: record.name.clone(),
            friendly_name: record.display_name().to_string(),
            state: record.state.clone(),
            attributes: record.attributes.clone(),
        }
    }
}

/// Simple entity lookups for the HTTP API.
///
/// Without a discovery cache every lookup is empty.
#[derive(Debug, Clone, Default)]
pub struct EntityService {
    discovery: Option<Arc<DiscoveryService>>,
}

impl EntityService {
    pub fn new(discovery: Option<Arc<DiscoveryService>>) -> Self {
        Self { discovery }
    }

    pub fn classify_entity(&self, entity_id: &str) -> &'static str {
        classify_basic(entity_id)
    }

    /// Up to five cached entities that fuzzily match `name`.
    pub fn find_entities_by_name(&self, name: &str) -> Vec<EntitySummary> {
        match &self.discovery {
            Some(discovery) if !name.is_empty() => discovery
                .search(name, NAME_SEARCH_LIMIT, None)
                .iter()
                .map(EntitySummary::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Cached entities whose state equals `state`, ignoring case.
    pub fn find_entities_by_state(&self, state: &str) -> Vec<EntitySummary> {
        match &self.discovery {
            Some(discovery) if !state.is_empty() => {
                let wanted = state.to_lowercase();
                discovery
                    .entities()
                    .iter()
                    .filter(|record| record.state.to_lowercase() == wanted)
                    .map(EntitySummary::from)
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}
