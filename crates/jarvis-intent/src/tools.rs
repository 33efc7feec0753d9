//! Canonical tool definitions and their Home Assistant service mapping.

use crate::error::{SanitizationError, ToolError};
use crate::router::Intent;
use crate::sanitize::sanitize_tool_arguments;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub domain: &'static str,
    pub service: &'static str,
    pub allowed_args: &'static [&'static str],
    pub required_args: &'static [&'static str],
}

const ENTITY_ONLY: &[&str] = &["entity_id"];

const fn entity_tool(
    name: &'static str,
    description: &'static str,
    domain: &'static str,
    service: &'static str,
) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        domain,
        service,
        allowed_args: ENTITY_ONLY,
        required_args: ENTITY_ONLY,
    }
}

pub const LIGHT_TURN_ON: ToolDefinition = ToolDefinition {
    name: "ha_light_turn_on",
    description: "Turn on or adjust a light entity.",
    domain: "light",
    service: "turn_on",
    allowed_args: &["entity_id", "brightness", "brightness_pct", "color_temp"],
    required_args: ENTITY_ONLY,
};
pub const LIGHT_TURN_OFF: ToolDefinition =
    entity_tool("ha_light_turn_off", "Turn off a light entity.", "light", "turn_off");
pub const SWITCH_TURN_ON: ToolDefinition = entity_tool(
    "ha_switch_turn_on",
    "Turn on a switch or smart plug.",
    "switch",
    "turn_on",
);
pub const SWITCH_TURN_OFF: ToolDefinition = entity_tool(
    "ha_switch_turn_off",
    "Turn off a switch or smart plug.",
    "switch",
    "turn_off",
);
pub const MEDIA_PLAY: ToolDefinition = entity_tool(
    "ha_media_play",
    "Resume or start media playback.",
    "media_player",
    "media_play",
);
pub const MEDIA_PAUSE: ToolDefinition = entity_tool(
    "ha_media_pause",
    "Pause or stop media playback.",
    "media_player",
    "media_pause",
);
pub const COVER_OPEN: ToolDefinition = entity_tool(
    "ha_cover_open",
    "Open a cover, blind, or shade.",
    "cover",
    "open_cover",
);
pub const COVER_CLOSE: ToolDefinition = entity_tool(
    "ha_cover_close",
    "Close a cover, blind, or shade.",
    "cover",
    "close_cover",
);
pub const CLIMATE_SET_TEMPERATURE: ToolDefinition = ToolDefinition {
    name: "ha_climate_set_temperature",
    description: "Set target temperature for a climate device.",
    domain: "climate",
    service: "set_temperature",
    allowed_args: &["entity_id", "temperature"],
    required_args: &["entity_id", "temperature"],
};

/// All tools in prompt order.
pub const TOOL_DEFINITIONS: &[ToolDefinition] = &[
    LIGHT_TURN_ON,
    LIGHT_TURN_OFF,
    SWITCH_TURN_ON,
    SWITCH_TURN_OFF,
    MEDIA_PLAY,
    MEDIA_PAUSE,
    COVER_OPEN,
    COVER_CLOSE,
    CLIMATE_SET_TEMPERATURE,
];

pub fn tool(name: &str) -> Option<&'static ToolDefinition> {
    TOOL_DEFINITIONS.iter().find(|definition| definition.name == name)
}

/// The tool that carries out `intent`; `turn_off` selects the negated variant.
pub fn tool_for_intent(intent: Intent, turn_off: bool) -> &'static ToolDefinition {
    let (on, off) = match intent {
        Intent::LightControl => (&LIGHT_TURN_ON, &LIGHT_TURN_OFF),
        Intent::SwitchControl => (&SWITCH_TURN_ON, &SWITCH_TURN_OFF),
        Intent::MediaControl => (&MEDIA_PLAY, &MEDIA_PAUSE),
        Intent::CoverControl => (&COVER_OPEN, &COVER_CLOSE),
        Intent::ClimateControl => (&CLIMATE_SET_TEMPERATURE, &CLIMATE_SET_TEMPERATURE),
    };
    if turn_off {
        off
    } else {
        on
    }
}

/// One Markdown bullet per tool, used to condition the LLM.
pub fn describe_tools_for_prompt() -> String {
    TOOL_DEFINITIONS
        .iter()
        .map(|definition| {
            format!(
                "- {}: {} (allowed args: {})",
                definition.name,
                definition.description,
                definition.allowed_args.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A validated Home Assistant service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicePayload {
    pub domain: &'static str,
    pub service: &'static str,
    pub data: Map<String, Value>,
}

impl ServicePayload {
    /// `"domain.service"`, as shown to API callers.
    pub fn qualified_service(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.data.get("entity_id").and_then(Value::as_str)
    }
}

/// Validates `args` for `tool_name` and maps the call onto a HA service.
///
/// `args` may be absent or `null`; any other non-object value is rejected.
pub fn prepare_service_payload(
    tool_name: &str,
    args: Option<&Value>,
) -> Result<ServicePayload, ToolError> {
    let definition = tool(tool_name).ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

    let args = match args {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => return Err(ToolError::ArgumentsNotObject),
    };
    let data = sanitize_tool_arguments(args, definition.allowed_args)?;

    if let Some(missing) = definition
        .required_args
        .iter()
        .find(|key| !data.contains_key(**key))
    {
        return Err(SanitizationError::MissingArgument {
            argument: (*missing).to_string(),
            tool: definition.name.to_string(),
        }
        .into());
    }

    Ok(ServicePayload {
        domain: definition.domain,
        service: definition.service,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_has_unique_names() {
        assert_eq!(TOOL_DEFINITIONS.len(), 9);
        for definition in TOOL_DEFINITIONS {
            assert_eq!(tool(definition.name), Some(definition));
        }
        assert!(tool("ha_lock_unlock").is_none());
    }

    #[test]
    fn intents_map_to_tools() {
        assert_eq!(tool_for_intent(Intent::LightControl, false).name, "ha_light_turn_on");
        assert_eq!(tool_for_intent(Intent::LightControl, true).name, "ha_light_turn_off");
        assert_eq!(tool_for_intent(Intent::CoverControl, true).service, "close_cover");
        assert_eq!(tool_for_intent(Intent::MediaControl, true).service, "media_pause");
        assert_eq!(
            tool_for_intent(Intent::ClimateControl, true).name,
            "ha_climate_set_temperature"
        );
    }

    #[test]
    fn prompt_description_lists_every_tool() {
        let description = describe_tools_for_prompt();
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(lines.len(), TOOL_DEFINITIONS.len());
        assert_eq!(
            lines[0],
            "- ha_light_turn_on: Turn on or adjust a light entity. \
             (allowed args: entity_id, brightness, brightness_pct, color_temp)"
        );
    }

    #[test]
    fn payload_is_sanitized_and_mapped() {
        let args = json!({"entity_id": " light.bad ", "brightness_pct": 40, "effect": "rainbow"});
        let payload = prepare_service_payload("ha_light_turn_on", Some(&args)).unwrap();
        assert_eq!(payload.qualified_service(), "light.turn_on");
        assert_eq!(
            Value::Object(payload.data.clone()),
            json!({"entity_id": "light.bad", "brightness_pct": 40})
        );
        assert_eq!(payload.entity_id(), Some("light.bad"));
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let args = json!({"entity_id": "climate.wohnzimmer"});
        let err = prepare_service_payload("ha_climate_set_temperature", Some(&args)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required argument 'temperature' for ha_climate_set_temperature"
        );
        assert!(prepare_service_payload("ha_cover_open", None).is_err());
    }

    #[test]
    fn unknown_tool_and_bad_arguments() {
        assert_eq!(
            prepare_service_payload("rm_rf", None).unwrap_err(),
            ToolError::UnknownTool("rm_rf".to_string())
        );
        assert_eq!(
            prepare_service_payload("ha_cover_open", Some(&json!(["cover.x"]))).unwrap_err(),
            ToolError::ArgumentsNotObject
        );
    }
}
