//! OpenAI-style function definitions for Home Assistant actions.

use jarvis_types::chat::{FunctionCall, FunctionDefinition};
use serde_json::{json, Value};

/// A function call the rule-based adapter can ask the caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum HaFunction {
    TurnOn { entity_id: String },
    TurnOff { entity_id: String },
    OpenCover { entity_id: String },
    CloseCover { entity_id: String },
    SetBrightness { entity_id: String, brightness: u8 },
    SetTemperature { entity_id: String, temperature: f64 },
    MediaPlayPause { entity_id: String },
    SetVolume { entity_id: String, volume: f64 },
    SetColor { entity_id: String, rgb_color: [u8; 3] },
}

impl HaFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TurnOn { .. } => "turn_on",
            Self::TurnOff { .. } => "turn_off",
            Self::OpenCover { .. } => "open_cover",
            Self::CloseCover { .. } => "close_cover",
            Self::SetBrightness { .. } => "set_brightness",
            Self::SetTemperature { .. } => "set_temperature",
            Self::MediaPlayPause { .. } => "media_play_pause",
            Self::SetVolume { .. } => "set_volume",
            Self::SetColor { .. } => "set_color",
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            Self::TurnOn { entity_id }
            | Self::TurnOff { entity_id }
            | Self::OpenCover { entity_id }
            | Self::CloseCover { entity_id }
            | Self::MediaPlayPause { entity_id } => json!({ "entity_id": entity_id }),
            Self::SetBrightness {
                entity_id,
                brightness,
            } => json!({ "entity_id": entity_id, "brightness": brightness }),
            Self::SetTemperature {
                entity_id,
                temperature,
            } => json!({ "entity_id": entity_id, "temperature": temperature }),
            Self::SetVolume { entity_id, volume } => {
                json!({ "entity_id": entity_id, "volume": volume })
            }
            Self::SetColor {
                entity_id,
                rgb_color,
            } => json!({ "entity_id": entity_id, "rgb_color": rgb_color }),
        }
    }

    /// Wire form with the arguments encoded as a JSON string.
    pub fn to_call(&self) -> FunctionCall {
        FunctionCall {
            name: self.name().to_string(),
            arguments: self.arguments().to_string(),
        }
    }
}

fn entity_only(name: &str) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"entity_id": {"type": "string"}},
            "required": ["entity_id"]
        }),
    }
}

fn with_extra(name: &str, key: &str, schema: Value, required: bool) -> FunctionDefinition {
    let required = if required {
        json!(["entity_id", key])
    } else {
        json!(["entity_id"])
    };
    FunctionDefinition {
        name: name.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"entity_id": {"type": "string"}, key: schema},
            "required": required
        }),
    }
}

/// Every function the adapter may emit, with JSON-schema parameters.
pub fn function_definitions() -> Vec<FunctionDefinition> {
    vec![
        entity_only("turn_on"),
        entity_only("turn_off"),
        entity_only("open_cover"),
        entity_only("close_cover"),
        with_extra("set_brightness", "brightness", json!({"type": "integer"}), false),
        with_extra("set_temperature", "temperature", json!({"type": "number"}), true),
        entity_only("media_play_pause"),
        with_extra("set_volume", "volume", json!({"type": "number"}), true),
        with_extra(
            "set_color",
            "rgb_color",
            json!({"type": "array", "items": {"type": "integer"}}),
            true,
        ),
    ]
}
