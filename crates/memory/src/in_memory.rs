//! In-memory store, useful for testing and ephemeral sessions.

use crate::document::MemoryDocument;
use async_trait::async_trait;
use homeclaw_core::error::MemoryError;
use homeclaw_core::memory::AssistantMemory;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps the memory document in process; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryMemory {
    doc: Arc<RwLock<MemoryDocument>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recent utterances, oldest first.
    pub async fn recent(&self) -> Vec<String> {
        self.doc
            .read()
            .await
            .recent()
            .iter()
            .map(|f| f.content.clone())
            .collect()
    }
}

#[async_trait]
impl AssistantMemory for InMemoryMemory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn record_interaction(&self, text: &str) -> Result<(), MemoryError> {
        self.doc.write().await.record(text);
        Ok(())
    }

    async fn load(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn build_prompt(&self) -> Result<String, MemoryError> {
        Ok(self.doc.read().await.render())
    }
}
