//! Home Assistant integration for the Jarvis backend.
//!
//! Wraps the Home Assistant REST API (service calls and state listing) and
//! keeps an in-memory discovery cache of controllable entities that
//! natural-language commands are fuzzily matched against.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | Async REST client (`/api/states`, `/api/services/...`) |
//! | [`classifier`] | Domain inference from entity ids, `device_class`, and aliases |
//! | [`filters`] | Power-state filters ("which lights are on") |
//! | [`fuzzy`] | Token based similarity scoring |
//! | [`discovery`] | Entity cache with refresh and fuzzy search |
//! | [`entities`] | Name/state lookups over the cache |

pub mod classifier;
pub mod client;
pub mod discovery;
pub mod entities;
pub mod error;
pub mod filters;
pub mod fuzzy;

pub use classifier::{classify_basic, classify_entity, default_classifier, DeviceClassifier};
pub use client::HomeAssistantClient;
pub use discovery::{ContextEntity, DiscoveryOptions, DiscoveryService};
pub use entities::{EntityService, EntitySummary};
pub use error::HassError;
pub use filters::{devices_on, lights_on, switches_on, DEFAULT_POWER_DOMAINS};
