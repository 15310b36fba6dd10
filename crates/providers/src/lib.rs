//! LLM provider implementations for homeclaw.
//!
//! [`convert`] maps a chat log to wire messages; [`AnthropicProvider`]
//! implements `homeclaw_core::Provider` over the Messages API.

pub mod anthropic;
pub mod convert;

pub use anthropic::AnthropicProvider;
pub use convert::{to_wire_messages, to_wire_messages_or_floor, FLOOR_MESSAGE};
