//! Token based similarity scoring for matching spoken commands to entities.
//!
//! A command such as "schalte das Licht im Bad an" is much longer than the
//! entity text it should match ("Deckenlampe Bad light bad"), so whole-string
//! ratios are dominated by filler words. Instead every entity token is
//! matched against its closest command token; the best token dominates the
//! score and the average rewards entities whose name is covered broadly.

/// Query tokens shorter than this are ignored ("im", "an").
const MIN_QUERY_TOKEN_CHARS: usize = 3;

/// Minimum length for substring containment to count as a near match.
const MIN_CONTAINMENT_CHARS: usize = 4;

const CONTAINMENT_SIMILARITY: f64 = 0.9;
const BEST_WEIGHT: f64 = 0.8;
const MEAN_WEIGHT: f64 = 0.2;

/// Lower-cases `text` and splits it on every non-alphanumeric character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Similarity of two tokens in `0.0..=1.0`.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let shorter = a.chars().count().min(b.chars().count());
    if shorter >= MIN_CONTAINMENT_CHARS && (a.contains(b) || b.contains(a)) {
        return CONTAINMENT_SIMILARITY;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Scores how well `choice` matches `query`, from 0 to 100.
pub fn score(query: &str, choice: &str) -> u8 {
    let query_tokens: Vec<String> = tokenize(query)
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_QUERY_TOKEN_CHARS)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .collect();

    let mut choice_tokens = tokenize(choice);
    let mut seen = std::collections::HashSet::new();
    choice_tokens.retain(|t| seen.insert(t.clone()));

    if query_tokens.is_empty() || choice_tokens.is_empty() {
        return 0;
    }

    let per_token: Vec<f64> = choice_tokens
        .iter()
        .map(|c| {
            query_tokens
                .iter()
                .map(|q| token_similarity(q, c))
                .fold(0.0, f64::max)
        })
        .collect();

    let best = per_token.iter().copied().fold(0.0, f64::max);
    let mean = per_token.iter().sum::<f64>() / per_token.len() as f64;
    let combined = BEST_WEIGHT * best + MEAN_WEIGHT * mean;

    (combined * 100.0).round().clamp(0.0, 100.0) as u8
}
