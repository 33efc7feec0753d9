//! Rule-based answers for OpenAI-compatible conversation agents.
//!
//! Home Assistant's OpenAI integrations send the exposed entities along with
//! the chat history. The rules below answer the common German questions and
//! commands over those entities without an LLM round trip.

use crate::functions::HaFunction;
use chrono::Utc;
use jarvis_hass::{classify_basic, default_classifier, lights_on};
use jarvis_types::chat::{ChatCompletion, ChatMessage, EntityDefinition, FunctionDefinition};
use jarvis_types::EntityState;

const COVER_STOP_WORDS: &[&str] = &["mach", "die", "den", "das", "bitte"];
const LIGHT_STOP_WORDS: &[&str] = &["schalte", "mach", "das", "die", "den", "bitte", "ein", "auf"];

const NO_MATCH_REPLY: &str =
    "Ich habe deine Anfrage erhalten, konnte aber keine passende Aktion ableiten.";

/// Answers the last user message in `messages` using `entities`.
pub fn generate_ha_response(
    messages: &[ChatMessage],
    functions: Option<&[FunctionDefinition]>,
    entities: &[EntityDefinition],
    model: &str,
) -> ChatCompletion {
    let content = messages
        .iter()
        .rev()
        .find(|message| message.role == "user")
        .and_then(|message| message.content.as_deref())
        .unwrap_or_default();
    let lowered = content.to_lowercase();

    tracing::debug!(
        entities = entities.len(),
        functions = functions.map_or(0, <[_]>::len),
        "answering chat completion from rules"
    );

    let reply = answer(&lowered, entities);
    let id = uuid::Uuid::new_v4().to_string();
    let created = Utc::now().timestamp();
    match reply {
        Reply::Text(text) => ChatCompletion::text(id, created, model.to_string(), text),
        Reply::Call(function) => {
            ChatCompletion::function_call(id, created, model.to_string(), function.to_call())
        }
    }
}

enum Reply {
    Text(String),
    Call(HaFunction),
}

fn answer(lowered: &str, entities: &[EntityDefinition]) -> Reply {
    let contains_any = |words: &[&str]| words.iter().any(|word| lowered.contains(word));

    if contains_any(&["welche", "was"]) && contains_any(&["lampen", "lichter", "licht"]) {
        return lights_on_reply(entities);
    }

    if contains_any(&["temperatur", "warm"]) {
        let keywords = keywords(lowered, &[]);
        if let Some(entity) = find_entity(entities, &keywords, None) {
            if matches!(classify_basic(&entity.entity_id), "climate" | "sensor") {
                return Reply::Text(format!(
                    "Die Temperatur von {} beträgt {}.",
                    display_name(entity),
                    entity.state
                ));
            }
        }
    }

    if contains_any(&["rollo", "rolladen", "rollos", "jalousie"]) {
        let keywords = keywords(lowered, COVER_STOP_WORDS);
        if let Some(entity) = find_entity(entities, &keywords, Some("cover")) {
            let entity_id = entity.entity_id.clone();
            return Reply::Call(if contains_any(&["runter", "schließ", "zu"]) {
                HaFunction::CloseCover { entity_id }
            } else {
                HaFunction::OpenCover { entity_id }
            });
        }
    }

    if contains_any(&["schalte", "mach", "dimme", "erhelle"]) {
        let keywords = keywords(lowered, LIGHT_STOP_WORDS);
        if let Some(entity) = find_entity(entities, &keywords, Some("light")) {
            let entity_id = entity.entity_id.clone();
            return Reply::Call(if lowered.contains("aus") {
                HaFunction::TurnOff { entity_id }
            } else if contains_any(&["heller", "dunkler", "dimme", "helligkeit"]) {
                HaFunction::SetBrightness {
                    entity_id,
                    brightness: 128,
                }
            } else {
                HaFunction::TurnOn { entity_id }
            });
        }
    }

    Reply::Text(NO_MATCH_REPLY.to_string())
}

fn lights_on_reply(entities: &[EntityDefinition]) -> Reply {
    let states: Vec<EntityState> = entities.iter().map(to_state).collect();
    let on = lights_on(&states, default_classifier());
    if on.is_empty() {
        return Reply::Text("Aktuell sind keine Lichter eingeschaltet.".to_string());
    }

    let names: Vec<&str> = on
        .iter()
        .filter_map(|state| {
            entities
                .iter()
                .find(|entity| entity.entity_id == state.entity_id)
        })
        .map(display_name)
        .collect();
    Reply::Text(format!(
        "Diese Lichter sind eingeschaltet: {}.",
        names.join(", ")
    ))
}

fn to_state(entity: &EntityDefinition) -> EntityState {
    EntityState {
        entity_id: entity.entity_id.clone(),
        state: entity.state.clone(),
        attributes: entity.attributes.clone().unwrap_or_default(),
    }
}

fn display_name(entity: &EntityDefinition) -> &str {
    if entity.name.is_empty() {
        &entity.entity_id
    } else {
        &entity.name
    }
}

/// Words longer than two characters, minus `stop_words`.
fn keywords(lowered: &str, stop_words: &[&str]) -> Vec<String> {
    lowered
        .replace('?', "")
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !stop_words.contains(word))
        .map(str::to_string)
        .collect()
}

fn find_entity<'a>(
    entities: &'a [EntityDefinition],
    keywords: &[String],
    domain: Option<&str>,
) -> Option<&'a EntityDefinition> {
    entities
        .iter()
        .filter(|entity| domain.is_none_or(|d| classify_basic(&entity.entity_id) == d))
        .find(|entity| matches_keywords(entity, keywords))
}

fn matches_keywords(entity: &EntityDefinition, keywords: &[String]) -> bool {
    let name = entity.name.to_lowercase();
    let entity_id = entity.entity_id.to_lowercase();
    let identifier = entity_id
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .replace('_', " ");

    keywords
        .iter()
        .any(|keyword| name.contains(keyword.as_str()) || identifier.contains(keyword.as_str()))
}
