//! Bounded in-memory history of recent commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub user_text: String,
    pub action_summary: String,
    pub recorded_at: DateTime<Utc>,
}

/// Oldest entries are evicted once `max_entries` is reached.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    history: VecDeque<ContextEntry>,
    max_entries: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl ConversationContext {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            history: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn add_entry(&mut self, user_text: impl Into<String>, action_summary: impl Into<String>) {
        if self.history.len() == self.max_entries {
            self.history.pop_front();
        }
        self.history.push_back(ContextEntry {
            user_text: user_text.into(),
            action_summary: action_summary.into(),
            recorded_at: Utc::now(),
        });
    }

    /// Renders the history for an LLM prompt; empty history renders as `""`.
    pub fn as_prompt_block(&self) -> String {
        if self.history.is_empty() {
            return String::new();
        }
        let mut lines = vec!["Recent context:".to_string()];
        for entry in &self.history {
            lines.push(format!("User: {}", entry.user_text));
            lines.push(format!("Action: {}", entry.action_summary));
        }
        lines.join("\n")
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
