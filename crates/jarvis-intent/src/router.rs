//! Keyword routing for commands that can skip the LLM.

use serde::Serialize;

/// Intents recognised by the fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LightControl,
    CoverControl,
    MediaControl,
    ClimateControl,
    SwitchControl,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LightControl => "light_control",
            Self::CoverControl => "cover_control",
            Self::MediaControl => "media_control",
            Self::ClimateControl => "climate_control",
            Self::SwitchControl => "switch_control",
        }
    }

    /// The Home Assistant domain the intent controls.
    pub fn domain(self) -> &'static str {
        match self {
            Self::LightControl => "light",
            Self::CoverControl => "cover",
            Self::MediaControl => "media_player",
            Self::ClimateControl => "climate",
            Self::SwitchControl => "switch",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked in order; the first intent with a matching keyword wins.
const DIRECT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::LightControl,
        &["light", "lights", "licht", "lampe", "lampen"],
    ),
    (
        Intent::CoverControl,
        &["rollo", "rolladen", "shade", "blinds", "jalousie"],
    ),
    (
        Intent::MediaControl,
        &["musik", "speaker", "tv", "fernseher", "media"],
    ),
    (
        Intent::ClimateControl,
        &["klima", "thermostat", "heizung", "heizer", "ac", "ventilator"],
    ),
    (
        Intent::SwitchControl,
        &["steckdose", "switch", "power", "schalte"],
    ),
];

/// Keywords shorter than this must match a whole word ("ac" vs "machen").
const MIN_SUBSTRING_KEYWORD_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticRoute {
    pub intent: Intent,
    pub domain: &'static str,
    pub requires_llm: bool,
    pub keywords: &'static [&'static str],
}

/// Returns a fast-path route for `text`, if any keyword matches.
pub fn semantic_route(text: &str) -> Option<SemanticRoute> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    DIRECT_PATTERNS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                if keyword.chars().count() >= MIN_SUBSTRING_KEYWORD_CHARS {
                    lowered.contains(keyword)
                } else {
                    words.contains(keyword)
                }
            })
        })
        .map(|(intent, keywords)| SemanticRoute {
            intent: *intent,
            domain: intent.domain(),
            requires_llm: false,
            keywords,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_of(text: &str) -> Option<Intent> {
        semantic_route(text).map(|route| route.intent)
    }

    #[test]
    fn routes_german_and_english_keywords() {
        assert_eq!(intent_of("Schalte das Licht im Bad an"), Some(Intent::LightControl));
        assert_eq!(intent_of("turn off the kitchen lights"), Some(Intent::LightControl));
        assert_eq!(intent_of("Rolladen runter"), Some(Intent::CoverControl));
        assert_eq!(intent_of("Fernseher aus"), Some(Intent::MediaControl));
        assert_eq!(intent_of("Heizung auf 21 Grad"), Some(Intent::ClimateControl));
        assert_eq!(intent_of("Steckdose Kaffee an"), Some(Intent::SwitchControl));
    }

    #[test]
    fn route_carries_domain() {
        let route = semantic_route("Musik pausieren").unwrap();
        assert_eq!(route.domain, "media_player");
        assert!(!route.requires_llm);
        assert!(route.keywords.contains(&"musik"));
    }

    #[test]
    fn short_keywords_need_whole_words() {
        // "mach" contains "ac" but must not route to climate.
        assert_eq!(intent_of("Mach die Steckdose an"), Some(Intent::SwitchControl));
        assert_eq!(intent_of("AC einschalten"), Some(Intent::ClimateControl));
        assert_eq!(intent_of("Wie spät ist es?"), None);
    }

    #[test]
    fn first_intent_in_order_wins() {
        // "schalte" alone would be a switch, but "licht" is checked first.
        assert_eq!(intent_of("schalte licht aus"), Some(Intent::LightControl));
    }
}
