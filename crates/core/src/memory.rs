//! Memory trait: the long-term memory collaborator.
//!
//! The agent records each user utterance and, when building the system
//! prompt, asks the store for a rendered summary of what it remembers.
//! Storage format and eviction are up to the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// A remembered preference or fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFact {
    /// The fact, in the user's words
    pub content: String,

    /// When it was recorded
    pub created_at: DateTime<Utc>,
}

/// The memory collaborator used by the conversation entity.
///
/// Every call is best-effort from the agent's point of view: failures are
/// logged and the turn continues without memory.
#[async_trait]
pub trait AssistantMemory: Send + Sync {
    /// Backend name, for diagnostics.
    fn name(&self) -> &str;

    /// Record a user utterance.
    async fn record_interaction(&self, text: &str) -> std::result::Result<(), MemoryError>;

    /// Refresh state from the backing store.
    async fn load(&self) -> std::result::Result<(), MemoryError>;

    /// Render the memory section body. Returns an empty string when there is nothing to say.
    async fn build_prompt(&self) -> std::result::Result<String, MemoryError>;
}
