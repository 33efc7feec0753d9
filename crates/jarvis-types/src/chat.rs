//! OpenAI-compatible chat completion wire types.
//!
//! Only the subset used by Home Assistant conversation agents is modelled:
//! plain text messages, legacy `function_call` responses, and the
//! non-standard `entities` list that carries the exposed entity states.

use crate::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            function_call: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}

/// An entity state as supplied by the caller of `/v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub entity_id: String,
    pub state: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub functions: Option<Vec<FunctionDefinition>>,
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

/// A function invocation requested from the caller.
///
/// `arguments` is a JSON document encoded as a string, as in the OpenAI API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletion {
    /// A completion whose single choice is a plain assistant reply.
    pub fn text(id: String, created: i64, model: String, content: impl Into<String>) -> Self {
        Self::single(
            id,
            created,
            model,
            AssistantMessage {
                role: "assistant".to_string(),
                content: Some(content.into()),
                function_call: None,
            },
            "stop",
        )
    }

    /// A completion whose single choice asks the caller to run a function.
    pub fn function_call(id: String, created: i64, model: String, call: FunctionCall) -> Self {
        Self::single(
            id,
            created,
            model,
            AssistantMessage {
                role: "assistant".to_string(),
                content: None,
                function_call: Some(call),
            },
            "function_call",
        )
    }

    fn single(
        id: String,
        created: i64,
        model: String,
        message: AssistantMessage,
        finish_reason: &str,
    ) -> Self {
        Self {
            id,
            object: "chat.completion".to_string(),
            created,
            model,
            choices: vec![ChatChoice {
                index: 0,
                message,
                finish_reason: finish_reason.to_string(),
            }],
        }
    }

    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}
