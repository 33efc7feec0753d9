//! Small parsers over the raw command text.

use regex::Regex;
use std::sync::LazyLock;

/// Words that flip a command to its "off" variant.
pub const NEGATION_KEYWORDS: &[&str] = &[
    "aus",
    "abschalten",
    "ausschalten",
    "ausmachen",
    "stop",
    "stoppe",
    "pause",
    "off",
    "schließen",
    "schliesse",
    "close",
    "halt",
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\wäöüß]+").expect("valid regex"));
static BRIGHTNESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,3})\s*%").expect("valid regex"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:[.,][0-9]+)?").expect("valid regex"));

/// Whole-word match against [`NEGATION_KEYWORDS`].
pub fn contains_negation(text: &str) -> bool {
    contains_keyword(text, NEGATION_KEYWORDS)
}

pub fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    let normalized = NON_WORD.replace_all(&lowered, " ");
    normalized
        .split_whitespace()
        .any(|word| keywords.contains(&word))
}

/// Drops whole words found in `keywords`, leaving the words that name the device.
///
/// Used before fuzzy entity search so the routing keyword ("licht") does not
/// pull in every entity that happens to carry it in its name.
pub fn strip_keywords(text: &str, keywords: &[&str]) -> String {
    let lowered = text.to_lowercase();
    let normalized = NON_WORD.replace_all(&lowered, " ");
    normalized
        .split_whitespace()
        .filter(|word| !keywords.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `N %` in the text, clamped to 1..=100.
pub fn extract_brightness_pct(text: &str) -> Option<u8> {
    let digits = BRIGHTNESS.captures(text)?.get(1)?.as_str();
    let value: u16 = digits.parse().ok()?;
    Some(value.clamp(1, 100) as u8)
}

/// First number between 5 and 35 degrees; a decimal comma is accepted.
pub fn extract_temperature(text: &str) -> Option<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .find(|value| (5.0..=35.0).contains(value))
}
