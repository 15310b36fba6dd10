//! # homeclaw core
//!
//! Domain types, collaborator traits, and error definitions for the homeclaw
//! conversation agent. This crate has **no I/O of its own**. It defines the
//! model that every other crate implements against.
//!
//! ## Boundaries
//!
//! Everything the agent touches outside its own turn is a trait here:
//! - [`Provider`]: the model invocation boundary
//! - [`ToolExecutor`]: the tool execution boundary and schema source
//! - [`AssistantMemory`]: the long-term memory collaborator
//! - [`DeviceContext`]: the device inventory collaborator

pub mod error;
pub mod message;
pub mod wire;
pub mod provider;
pub mod tool;
pub mod memory;
pub mod device;
pub mod persona;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Attachment, ChatLog, ConversationEntry, ConversationId, EntryRole, ToolCall};
pub use wire::{ContentBlock, MediaSource, WireContent, WireMessage, WireRole};
pub use provider::{ModelResponse, Provider, ProviderRequest, SystemPrompt, ToolDefinition, Usage};
pub use tool::{Tool, ToolExecutor, ToolOutput, ToolRegistry};
pub use memory::{AssistantMemory, MemoryFact};
pub use device::DeviceContext;
pub use persona::{OutputLanguage, Personality};
pub use event::{DomainEvent, EventBus};
