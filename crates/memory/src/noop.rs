//! No-op memory: disables long-term memory entirely.

use async_trait::async_trait;
use homeclaw_core::error::MemoryError;
use homeclaw_core::memory::AssistantMemory;

/// A memory that records nothing and always renders empty.
pub struct NoopMemory;

#[async_trait]
impl AssistantMemory for NoopMemory {
    fn name(&self) -> &str { "none" }

    async fn record_interaction(&self, _text: &str) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn load(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn build_prompt(&self) -> Result<String, MemoryError> {
        Ok(String::new())
    }
}
