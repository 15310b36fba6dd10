//! The conversation entity: one user turn in, one final log out.
//!
//! Holds the per-entry options and injected collaborators, records the
//! utterance into memory, runs the [`ToolCallLoop`] and guarantees the
//! returned log ends with an Assistant entry unless the turn aborted.

use crate::context::{PromptTier, HOST_DEFAULT_PROMPT, HOST_TOOL_PROMPT};
use crate::loop_runner::{LoopOutcome, ToolCallLoop, FALLBACK_REPLY};
use chrono::Utc;
use homeclaw_config::AgentOptions;
use homeclaw_core::device::DeviceContext;
use homeclaw_core::event::{DomainEvent, EventBus};
use homeclaw_core::memory::AssistantMemory;
use homeclaw_core::message::{Attachment, ChatLog, ConversationEntry, EntryRole};
use homeclaw_core::provider::Provider;
use homeclaw_core::tool::ToolExecutor;
use homeclaw_core::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Terminal state of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Done,
    CapReached,
    Aborted,
}

/// What the caller shows the user.
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    pub conversation_id: String,
    pub status: TurnStatus,

    /// The final assistant text, or the error explanation when aborted
    pub response: String,

    pub iterations: u32,

    #[serde(skip)]
    pub prompt_tier: PromptTier,

    pub tokens_used: u32,
}

impl TurnSummary {
    pub fn is_error(&self) -> bool {
        self.status == TurnStatus::Aborted
    }
}

/// The result of [`ConversationEntity::handle_turn`].
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub log: ChatLog,
    pub summary: TurnSummary,
}

/// A configured assistant that handles user turns.
pub struct ConversationEntity {
    options: AgentOptions,
    runner: ToolCallLoop,
    memory: Option<Arc<dyn AssistantMemory>>,
    host_prompt: Option<String>,
    event_bus: Arc<EventBus>,
}

impl ConversationEntity {
    pub fn new(provider: Arc<dyn Provider>, options: AgentOptions) -> Self {
        let event_bus = Arc::new(EventBus::default());
        Self {
            options,
            runner: ToolCallLoop::new(provider).with_event_bus(event_bus.clone()),
            memory: None,
            host_prompt: None,
            event_bus,
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.runner = self.runner.with_tools(tools);
        self
    }

    pub fn with_devices(mut self, devices: Arc<dyn DeviceContext>) -> Self {
        self.runner = self.runner.with_devices(devices);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn AssistantMemory>) -> Self {
        self.runner = self.runner.with_memory(memory.clone());
        self.memory = Some(memory);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.runner = self.runner.with_event_bus(event_bus.clone());
        self.event_bus = event_bus;
        self
    }

    /// Replace the host system text seeded into fresh logs.
    pub fn with_host_prompt(mut self, text: impl Into<String>) -> Self {
        self.host_prompt = Some(text.into());
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.runner = self.runner.with_max_iterations(max);
        self
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The host system text for this entity.
    pub fn host_prompt(&self) -> String {
        match &self.host_prompt {
            Some(text) => text.clone(),
            None if self.options.tools_enabled => {
                format!("{HOST_DEFAULT_PROMPT}\n{HOST_TOOL_PROMPT}")
            }
            None => HOST_DEFAULT_PROMPT.to_string(),
        }
    }

    /// Handle one user utterance on top of `prior`.
    ///
    /// Provider failures do not error: they come back as an aborted
    /// summary carrying the user-facing explanation, with the log holding
    /// everything appended before the failure. Only cancellation errors.
    pub async fn handle_turn(
        &self,
        text: &str,
        attachments: Vec<Attachment>,
        prior: ChatLog,
        cancel: &CancellationToken,
    ) -> Result<TurnResult> {
        let mut log = self.seed(prior);
        let conversation_id = log.id.to_string();

        self.event_bus.publish(DomainEvent::TurnStarted {
            conversation_id: conversation_id.clone(),
            timestamp: Utc::now(),
        });
        info!(conversation_id = %conversation_id, attachments = attachments.len(), "Handling turn");

        self.record_interaction(text).await;

        log.push(if attachments.is_empty() {
            ConversationEntry::user(text)
        } else {
            ConversationEntry::user_with_attachments(text, attachments)
        });
        let turn_start = log.len();

        let report = self.runner.run(&mut log, &self.options, cancel).await?;

        let (status, response) = match &report.outcome {
            LoopOutcome::Aborted(e) => (TurnStatus::Aborted, e.user_message()),
            LoopOutcome::CapReached => {
                // Partial text from this turn beats the canned reply
                let partial = latest_reply(&log.entries()[turn_start..]).map(str::to_string);
                ensure_final_reply(&mut log);
                (
                    TurnStatus::CapReached,
                    partial.unwrap_or_else(|| FALLBACK_REPLY.to_string()),
                )
            }
            LoopOutcome::Done => {
                ensure_final_reply(&mut log);
                let reply = log.last_assistant_text().unwrap_or(FALLBACK_REPLY).to_string();
                (TurnStatus::Done, reply)
            }
        };

        self.event_bus.publish(DomainEvent::TurnCompleted {
            conversation_id: conversation_id.clone(),
            outcome: report.outcome.as_str().into(),
            iterations: report.iterations,
            timestamp: Utc::now(),
        });
        info!(
            conversation_id = %conversation_id,
            outcome = report.outcome.as_str(),
            iterations = report.iterations,
            tier = report.tier.as_str(),
            "Turn finished"
        );

        Ok(TurnResult {
            log,
            summary: TurnSummary {
                conversation_id,
                status,
                response,
                iterations: report.iterations,
                prompt_tier: report.tier,
                tokens_used: report.tokens_used,
            },
        })
    }

    /// Make sure the log opens with the host System entry.
    fn seed(&self, prior: ChatLog) -> ChatLog {
        if prior.entries().first().map(ConversationEntry::role) == Some(EntryRole::System) {
            return prior;
        }
        let id = prior.id.clone();
        let mut entries = vec![ConversationEntry::system(self.host_prompt())];
        entries.extend(prior.into_entries());
        ChatLog::with_history(id, entries)
    }

    /// Best effort: failures are logged and the turn continues.
    async fn record_interaction(&self, text: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        if !self.options.memory_enabled || text.trim().is_empty() {
            return;
        }
        if let Err(e) = memory.record_interaction(text).await {
            debug!(memory = memory.name(), error = %e, "Failed to record interaction");
        }
    }
}

/// Latest non-empty Assistant text among `entries`.
fn latest_reply(entries: &[ConversationEntry]) -> Option<&str> {
    entries
        .iter()
        .rev()
        .filter(|e| e.role() == EntryRole::Assistant)
        .filter_map(ConversationEntry::text)
        .map(str::trim)
        .find(|t| !t.is_empty())
}

/// Append the fallback reply unless the log already ends with an Assistant entry.
fn ensure_final_reply(log: &mut ChatLog) {
    if log.last().map(ConversationEntry::role) != Some(EntryRole::Assistant) {
        log.push(ConversationEntry::assistant(FALLBACK_REPLY));
    }
}
