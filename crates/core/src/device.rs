//! Device context trait: the inventory the assistant can talk about.

use async_trait::async_trait;
use crate::error::ContextError;

/// Builds a human-readable inventory of controllable devices.
#[async_trait]
pub trait DeviceContext: Send + Sync {
    /// Render the inventory, optionally restricted to the given area ids.
    ///
    /// Returns an empty string when nothing is exposed.
    async fn build_context(&self, area_filter: Option<&[String]>) -> std::result::Result<String, ContextError>;
}
