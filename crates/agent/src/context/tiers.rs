//! System prompt construction with tiered fallback.
//!
//! | Tier | Content | Entered when |
//! |------|---------|--------------|
//! | `Custom` | assembled prompt + host text | custom prompt enabled |
//! | `HostDefault` | host text only | custom prompt disabled, or `Custom` failed |
//! | `Empty` | nothing | `HostDefault` failed (no host text) |
//!
//! A device-context failure fails the `Custom` tier. A memory failure only
//! drops the memory section. Nothing here returns an error to the caller.

use crate::context::assembler::{assemble, PromptContext};
use homeclaw_config::AgentOptions;
use homeclaw_core::device::DeviceContext;
use homeclaw_core::error::ContextError;
use homeclaw_core::memory::AssistantMemory;
use homeclaw_core::provider::SystemPrompt;
use tracing::{debug, warn};

/// Which enrichment tier produced the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTier {
    Custom,
    HostDefault,
    Empty,
}

impl PromptTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::HostDefault => "host_default",
            Self::Empty => "empty",
        }
    }
}

/// A tier that was attempted and abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct Demotion {
    pub from: PromptTier,
    pub reason: String,
}

/// The outcome of system prompt construction.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub system: SystemPrompt,
    pub tier: PromptTier,
    pub demotions: Vec<Demotion>,
}

/// The collaborators a prompt may be enriched from.
pub struct PromptSources<'a> {
    pub options: &'a AgentOptions,
    pub host_text: Option<&'a str>,
    pub devices: Option<&'a dyn DeviceContext>,
    pub memory: Option<&'a dyn AssistantMemory>,
}

/// Build the system prompt, demoting through the tiers on failure.
pub async fn build_system_prompt(sources: &PromptSources<'_>) -> BuiltPrompt {
    let mut demotions = Vec::new();

    if sources.options.use_custom_prompt {
        match custom_tier(sources).await {
            Ok(system) => {
                return BuiltPrompt {
                    system,
                    tier: PromptTier::Custom,
                    demotions,
                };
            }
            Err(e) => {
                warn!(tier = "custom", error = %e, "Custom system prompt unavailable, falling back");
                demotions.push(Demotion {
                    from: PromptTier::Custom,
                    reason: e.to_string(),
                });
            }
        }
    }

    match host_tier(sources.host_text) {
        Ok(system) => BuiltPrompt {
            system,
            tier: PromptTier::HostDefault,
            demotions,
        },
        Err(e) => {
            warn!(tier = "host_default", error = %e, "No system prompt available, sending none");
            demotions.push(Demotion {
                from: PromptTier::HostDefault,
                reason: e.to_string(),
            });
            BuiltPrompt {
                system: SystemPrompt::default(),
                tier: PromptTier::Empty,
                demotions,
            }
        }
    }
}

async fn custom_tier(sources: &PromptSources<'_>) -> Result<SystemPrompt, ContextError> {
    let options = sources.options;

    let devices_context = match sources.devices {
        Some(devices) => devices.build_context(options.areas()).await?,
        None => String::new(),
    };

    let memory_context = match sources.memory {
        Some(memory) if options.memory_enabled => memory_context(memory).await,
        _ => String::new(),
    };

    let prompt = assemble(&PromptContext {
        personality: options.personality,
        devices_context,
        memory_context,
        extra_instructions: options.prompt.clone(),
        output_language: options.output_language,
    });
    if prompt.trim().is_empty() {
        return Err(ContextError::Assembly("assembled prompt is empty".into()));
    }

    Ok(SystemPrompt::new(vec![
        prompt,
        sources.host_text.unwrap_or_default().to_string(),
    ]))
}

/// Load and render memory; any failure yields an empty section.
async fn memory_context(memory: &dyn AssistantMemory) -> String {
    if let Err(e) = memory.load().await {
        debug!(memory = memory.name(), error = %e, "Failed to load memory");
        return String::new();
    }
    match memory.build_prompt().await {
        Ok(text) => text,
        Err(e) => {
            debug!(memory = memory.name(), error = %e, "Failed to build memory context");
            String::new()
        }
    }
}

fn host_tier(host_text: Option<&str>) -> Result<SystemPrompt, ContextError> {
    match host_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => Ok(SystemPrompt::new(vec![text.to_string()])),
        None => Err(ContextError::HostPromptMissing),
    }
}
