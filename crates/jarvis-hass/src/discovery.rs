//! Entity discovery cache and fuzzy search.

use crate::classifier::DeviceClassifier;
use crate::client::HomeAssistantClient;
use crate::error::HassError;
use crate::fuzzy;
use jarvis_types::{EntityRecord, EntityState};
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Domains that are never cached: read-only sensors and presence helpers.
pub const IGNORED_DOMAINS: &[&str] = &[
    "device_tracker",
    "binary_sensor",
    "sensor",
    "person",
    "zone",
    "sun",
];

/// Tunables for [`DiscoveryService`].
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    /// Maximum number of entities kept after filtering.
    pub cache_max_entities: usize,
    /// Minimum fuzzy score (0..=100) for a search hit.
    pub min_score: u8,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            cache_max_entities: 200,
            min_score: 65,
        }
    }
}

/// Simplified entity description handed to the LLM as context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntity {
    pub entity_id: String,
    pub domain: String,
    pub state: String,
    pub friendly_name: String,
}

#[derive(Debug, Default)]
struct Snapshot {
    entities: Arc<Vec<EntityRecord>>,
    refreshed_at: Option<Instant>,
}

/// In-memory cache of controllable Home Assistant entities.
///
/// The snapshot is swapped wholesale on refresh. Readers clone the inner
/// `Arc` and release the lock immediately, so the `std::sync::RwLock` is
/// never held across an `.await`.
#[derive(Debug)]
pub struct DiscoveryService {
    client: HomeAssistantClient,
    options: DiscoveryOptions,
    classifier: DeviceClassifier,
    snapshot: RwLock<Snapshot>,
}

impl DiscoveryService {
    pub fn new(client: HomeAssistantClient, options: DiscoveryOptions) -> Self {
        Self::with_classifier(client, options, DeviceClassifier::new())
    }

    pub fn with_classifier(
        client: HomeAssistantClient,
        options: DiscoveryOptions,
        classifier: DeviceClassifier,
    ) -> Self {
        Self {
            client,
            options,
            classifier,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Fetches the latest states from Home Assistant and replaces the cache.
    ///
    /// Returns the number of cached entities.
    pub async fn refresh(&self) -> Result<usize, HassError> {
        let states = self.client.fetch_states().await?;
        let total = states.len();
        let cached = self.ingest(states);
        tracing::debug!(total, cached, "discovery cache refreshed");
        Ok(cached)
    }

    /// Classifies and filters `states`, then replaces the cache with the result.
    pub fn ingest(&self, states: Vec<EntityState>) -> usize {
        let mut records = Vec::new();
        for state in states {
            if records.len() >= self.options.cache_max_entities {
                break;
            }
            if state.entity_id.is_empty() {
                continue;
            }
            let domain = self.classifier.classify_state(&state);
            if IGNORED_DOMAINS.contains(&domain.as_str()) {
                continue;
            }
            let name = state
                .friendly_name()
                .map(str::to_string)
                .unwrap_or_else(|| state.entity_id.clone());
            records.push(EntityRecord {
                entity_id: state.entity_id,
                name,
                domain,
                state: state.state,
                attributes: state.attributes,
            });
        }

        let count = records.len();
        let mut snapshot = self.write_snapshot();
        snapshot.entities = Arc::new(records);
        snapshot.refreshed_at = Some(Instant::now());
        count
    }

    /// Time since the last successful refresh, `None` before the first one.
    pub fn last_refresh_age(&self) -> Option<Duration> {
        self.read_snapshot().refreshed_at.map(|at| at.elapsed())
    }

    /// All cached records.
    pub fn entities(&self) -> Arc<Vec<EntityRecord>> {
        Arc::clone(&self.read_snapshot().entities)
    }

    pub fn len(&self) -> usize {
        self.read_snapshot().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns up to `limit` entities ordered by fuzzy similarity to `query`.
    ///
    /// `domains` narrows the candidates (case-insensitive). Matches scoring
    /// below the configured minimum are dropped after the limit is applied.
    pub fn search(&self, query: &str, limit: usize, domains: Option<&[&str]>) -> Vec<EntityRecord> {
        let entities = self.entities();
        if query.trim().is_empty() || entities.is_empty() {
            return Vec::new();
        }

        let allowed: Option<Vec<String>> =
            domains.map(|d| d.iter().map(|domain| domain.to_lowercase()).collect());

        let mut scored: Vec<(u8, &EntityRecord)> = entities
            .iter()
            .filter(|record| match &allowed {
                Some(allowed) => allowed.contains(&record.domain.to_lowercase()),
                None => true,
            })
            .map(|record| (fuzzy::score(query, &record.search_text()), record))
            .collect();

        // Stable sort keeps cache order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .filter(|(score, record)| {
                tracing::trace!(entity_id = %record.entity_id, score, "discovery candidate");
                *score >= self.options.min_score
            })
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Returns the first `limit` cached entities in simplified form.
    pub fn context_entities(&self, limit: usize, domains: Option<&[&str]>) -> Vec<ContextEntity> {
        self.entities()
            .iter()
            .filter(|record| domains.is_none_or(|d| d.contains(&record.domain.as_str())))
            .take(limit)
            .map(|record| ContextEntity {
                entity_id: record.entity_id.clone(),
                domain: record.domain.clone(),
                state: record.state.clone(),
                friendly_name: record.display_name().to_string(),
            })
            .collect()
    }

    fn read_snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|poisoned| {
            tracing::error!("discovery cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_snapshot(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|poisoned| {
            tracing::error!("discovery cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
