//! Turns a natural-language command into a Home Assistant service call.
//!
//! Commands first try the keyword fast path: route to an intent, fuzzily
//! pick the best cached entity of that domain, and call the service
//! directly. Anything the fast path cannot fully resolve goes to the LLM,
//! which picks a tool and its arguments from the registry.

use jarvis_hass::{classify_entity, DiscoveryService, HassError, HomeAssistantClient};
use jarvis_intent::extract::{
    contains_negation, extract_brightness_pct, extract_temperature, strip_keywords,
};
use jarvis_intent::tools::{CLIMATE_SET_TEMPERATURE, LIGHT_TURN_ON};
use jarvis_intent::{
    describe_tools_for_prompt, prepare_service_payload, semantic_route, tool_for_intent,
    ConversationContext, SemanticRoute, ToolError,
};
use jarvis_llm::{LlmError, OllamaClient, DEFAULT_TEMPERATURE};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Number of cached entities offered to the LLM as context.
const LLM_CONTEXT_ENTITIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessPath {
    Direct,
    Llm,
}

/// What a processed command did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub path: ProcessPath,
    /// `"{domain}.{service}"`.
    pub service: String,
    pub entity_id: Option<String>,
    /// Sanitized service data; only set on the LLM path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
    /// Home Assistant's response body.
    pub result: Value,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{0}")]
    InvalidCommand(String),

    #[error("LLM response missing tool_name")]
    MissingToolName,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    HomeAssistant(#[from] HassError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Debug)]
pub struct Processor {
    ha: HomeAssistantClient,
    discovery: Arc<DiscoveryService>,
    llm: OllamaClient,
    context: Mutex<ConversationContext>,
}

impl Processor {
    pub fn new(
        ha: HomeAssistantClient,
        discovery: Arc<DiscoveryService>,
        llm: OllamaClient,
    ) -> Self {
        Self {
            ha,
            discovery,
            llm,
            context: Mutex::new(ConversationContext::default()),
        }
    }

    pub async fn process(&self, text: &str) -> Result<ProcessOutcome, ProcessError> {
        let text = text.trim();
        if let Some(route) = semantic_route(text) {
            if let Some(outcome) = self.direct_path(text, &route).await? {
                return Ok(outcome);
            }
            tracing::debug!(intent = %route.intent, "fast path could not resolve command");
        }
        self.llm_path(text).await
    }

    /// Name of the Ollama model used on the LLM path.
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// The recent-command block that is appended to LLM prompts.
    pub fn context_block(&self) -> String {
        self.lock_context().as_prompt_block()
    }

    async fn direct_path(
        &self,
        text: &str,
        route: &SemanticRoute,
    ) -> Result<Option<ProcessOutcome>, ProcessError> {
        let tool = tool_for_intent(route.intent, contains_negation(text));

        let device_words = strip_keywords(text, route.keywords);
        let Some(entity) = self
            .discovery
            .search(&device_words, 1, Some(&[route.domain]))
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let mut args = Map::new();
        args.insert("entity_id".to_string(), Value::from(entity.entity_id.clone()));
        if tool.name == LIGHT_TURN_ON.name {
            if let Some(brightness) = extract_brightness_pct(text) {
                args.insert("brightness_pct".to_string(), Value::from(brightness));
            }
        }
        if tool.name == CLIMATE_SET_TEMPERATURE.name {
            match extract_temperature(text) {
                Some(temperature) => {
                    args.insert("temperature".to_string(), Value::from(temperature));
                }
                None => return Ok(None),
            }
        }
        if tool.required_args.iter().any(|key| !args.contains_key(*key)) {
            return Ok(None);
        }

        let payload = prepare_service_payload(tool.name, Some(&Value::Object(args)))
            .map_err(|e| ProcessError::InvalidCommand(format!("Invalid direct command arguments: {e}")))?;

        let result = self
            .ha
            .call_service(payload.domain, payload.service, &Value::Object(payload.data.clone()))
            .await?;

        let entity_domain = classify_entity(&entity.entity_id, &entity.attributes);
        self.remember(
            text,
            format!("{} ({}) -> {}", payload.service, entity_domain, entity.entity_id),
        );
        tracing::info!(
            path = "direct",
            intent = %route.intent,
            service = %payload.qualified_service(),
            entity_id = %entity.entity_id,
            "command executed"
        );

        Ok(Some(ProcessOutcome {
            path: ProcessPath::Direct,
            service: payload.qualified_service(),
            entity_id: Some(entity.entity_id),
            payload: None,
            result,
        }))
    }

    async fn llm_path(&self, text: &str) -> Result<ProcessOutcome, ProcessError> {
        let entities = self.discovery.context_entities(LLM_CONTEXT_ENTITIES, None);
        let known_entities = serde_json::to_string(&entities).unwrap_or_else(|_| "[]".to_string());
        let system_instruction = format!(
            "You convert German or English smart home requests into Home Assistant tool calls.\n\
             Always respond with JSON: {{\"tool_name\": string, \"arguments\": object}}.\n\
             Never explain yourself. Only return the JSON object.\n\
             Available tools:\n{}",
            describe_tools_for_prompt()
        );
        let prompt = format!(
            "User request: {text}\nKnown entities: {known_entities}\n{}",
            self.context_block()
        );

        let response = self
            .llm
            .ask(&prompt, &system_instruction, DEFAULT_TEMPERATURE)
            .await?;
        let tool_name = response
            .get("tool_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(ProcessError::MissingToolName)?;

        let payload = prepare_service_payload(tool_name, response.get("arguments"))?;
        let result = self
            .ha
            .call_service(payload.domain, payload.service, &Value::Object(payload.data.clone()))
            .await?;

        let entity_id = payload.entity_id().map(str::to_string);
        self.remember(
            text,
            format!(
                "{} -> {}",
                payload.service,
                entity_id.as_deref().unwrap_or("unknown")
            ),
        );
        tracing::info!(
            path = "llm",
            tool = tool_name,
            service = %payload.qualified_service(),
            entity_id = entity_id.as_deref().unwrap_or("unknown"),
            "command executed"
        );

        Ok(ProcessOutcome {
            path: ProcessPath::Llm,
            service: payload.qualified_service(),
            entity_id,
            payload: Some(payload.data),
            result,
        })
    }

    fn remember(&self, text: &str, summary: String) {
        self.lock_context().add_entry(text, summary);
    }

    fn lock_context(&self) -> MutexGuard<'_, ConversationContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
