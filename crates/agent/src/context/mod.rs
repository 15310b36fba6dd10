//! System prompt construction.
//!
//! [`assembler`] is the pure prompt assembler; [`tiers`] wraps it with the
//! enrichment collaborators and the fallback table.

pub mod assembler;
pub mod templates;
pub mod tiers;

pub use assembler::{assemble, PromptContext};
pub use tiers::{build_system_prompt, BuiltPrompt, Demotion, PromptSources, PromptTier};
pub use templates::{HOST_DEFAULT_PROMPT, HOST_TOOL_PROMPT};
