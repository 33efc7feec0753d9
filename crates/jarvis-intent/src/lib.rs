//! Command understanding for the Jarvis backend.
//!
//! Everything between a sentence like "Mach die Rollos im Wohnzimmer runter"
//! and a sanitized Home Assistant service call lives here:
//!
//! - [`router`]: keyword based fast-path routing to an intent and domain
//! - [`extract`]: negation, brightness, and temperature extraction
//! - [`tools`]: the canonical tool registry mapping tools to HA services
//! - [`sanitize`]: argument filtering before anything reaches Home Assistant
//! - [`context`]: bounded history of recent commands for LLM prompts
//! - [`functions`]: OpenAI-style function definitions and calls
//! - [`adapter`]: rule-based OpenAI-compatible answers over caller-supplied entities

pub mod adapter;
pub mod context;
pub mod error;
pub mod extract;
pub mod functions;
pub mod router;
pub mod sanitize;
pub mod tools;

pub use adapter::generate_ha_response;
pub use context::{ContextEntry, ConversationContext};
pub use error::{SanitizationError, ToolError};
pub use functions::{function_definitions, HaFunction};
pub use router::{semantic_route, Intent, SemanticRoute};
pub use sanitize::sanitize_tool_arguments;
pub use tools::{
    describe_tools_for_prompt, prepare_service_payload, tool, tool_for_intent, ServicePayload,
    ToolDefinition, TOOL_DEFINITIONS,
};
