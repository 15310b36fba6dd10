//! The in-memory shape shared by every memory backend.
//!
//! A document holds two lists: durable facts (utterances that state a
//! preference or ask to be remembered) and a short window of recent
//! requests. Both are rendered into the memory prompt section.

use chrono::Utc;
use homeclaw_core::memory::MemoryFact;
use serde::{Deserialize, Serialize};

/// Facts kept before the oldest is evicted.
pub const MAX_FACTS: usize = 50;

/// Recent interactions kept before the oldest is evicted.
pub const MAX_RECENT: usize = 10;

/// Recent interactions shown in the prompt.
const RECENT_IN_PROMPT: usize = 5;

/// Phrases that mark an utterance as a preference worth keeping.
const PREFERENCE_CUES: &[&str] = &[
    "remember",
    "i prefer",
    "i like",
    "i love",
    "i don't like",
    "i do not like",
    "i hate",
    "my name is",
    "call me",
    "always",
    "never",
    "every morning",
    "every evening",
];

/// What a persisted line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Fact,
    Interaction,
}

/// One persisted line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub kind: RecordKind,
    #[serde(flatten)]
    pub fact: MemoryFact,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    facts: Vec<MemoryFact>,
    recent: Vec<MemoryFact>,
}

/// Whether an utterance states a preference.
pub fn is_preference(text: &str) -> bool {
    let lower = text.to_lowercase();
    PREFERENCE_CUES.iter().any(|cue| lower.contains(cue))
}

impl MemoryDocument {
    pub fn from_records(records: impl IntoIterator<Item = MemoryRecord>) -> Self {
        let mut doc = Self::default();
        for record in records {
            match record.kind {
                RecordKind::Fact => doc.facts.push(record.fact),
                RecordKind::Interaction => doc.recent.push(record.fact),
            }
        }
        doc.trim();
        doc
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        let facts = self.facts.iter().map(|f| MemoryRecord {
            kind: RecordKind::Fact,
            fact: f.clone(),
        });
        let recent = self.recent.iter().map(|f| MemoryRecord {
            kind: RecordKind::Interaction,
            fact: f.clone(),
        });
        facts.chain(recent).collect()
    }

    pub fn facts(&self) -> &[MemoryFact] {
        &self.facts
    }

    pub fn recent(&self) -> &[MemoryFact] {
        &self.recent
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.recent.is_empty()
    }

    /// Record an utterance. Returns `false` when there was nothing to keep.
    pub fn record(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let now = Utc::now();
        if is_preference(text)
            && !self
                .facts
                .iter()
                .any(|f| f.content.eq_ignore_ascii_case(text))
        {
            self.facts.push(MemoryFact {
                content: text.to_string(),
                created_at: now,
            });
        }
        self.recent.push(MemoryFact {
            content: text.to_string(),
            created_at: now,
        });
        self.trim();
        true
    }

    pub fn clear(&mut self) {
        self.facts.clear();
        self.recent.clear();
    }

    /// Render the memory section body, or an empty string when empty.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if !self.facts.is_empty() {
            let lines: Vec<String> = self.facts.iter().map(|f| format!("- {}", f.content)).collect();
            sections.push(format!("User preferences:\n{}", lines.join("\n")));
        }

        if !self.recent.is_empty() {
            let skip = self.recent.len().saturating_sub(RECENT_IN_PROMPT);
            let lines: Vec<String> = self.recent[skip..]
                .iter()
                .map(|f| format!("- [{}] {}", f.created_at.format("%Y-%m-%d %H:%M"), f.content))
                .collect();
            sections.push(format!("Recent requests:\n{}", lines.join("\n")));
        }

        sections.join("\n\n")
    }

    fn trim(&mut self) {
        if self.facts.len() > MAX_FACTS {
            let excess = self.facts.len() - MAX_FACTS;
            self.facts.drain(..excess);
        }
        if self.recent.len() > MAX_RECENT {
            let excess = self.recent.len() - MAX_RECENT;
            self.recent.drain(..excess);
        }
    }
}
