//! The homeclaw conversation agent.
//!
//! A turn runs through three layers:
//!
//! 1. [`ConversationEntity`] seeds the log, records the utterance into
//!    memory and hands off to the loop
//! 2. [`ToolCallLoop`] builds the system prompt once, then alternates model
//!    invocations and tool dispatch until the model stops asking for tools
//!    or the iteration cap is hit
//! 3. [`context`] assembles the custom prompt and falls back through the
//!    enrichment tiers when a collaborator fails

pub mod context;
pub mod entity;
pub mod loop_runner;

#[cfg(test)]
mod test_helpers;

pub use context::{assemble, build_system_prompt, BuiltPrompt, PromptContext, PromptTier};
pub use entity::{ConversationEntity, TurnResult, TurnStatus, TurnSummary};
pub use loop_runner::{LoopOutcome, LoopReport, ToolCallLoop, FALLBACK_REPLY, MAX_TOOL_ITERATIONS};
