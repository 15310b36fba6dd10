//! The tool-calling loop.
//!
//! States: `Assembling → Invoking → AwaitingToolResolution → (loop)
//! Invoking → Done | Aborted`. The system prompt is built once per turn;
//! the log is re-converted to wire messages before every invocation.

use crate::context::{build_system_prompt, PromptSources, PromptTier};
use futures::future::join_all;
use homeclaw_config::AgentOptions;
use homeclaw_core::device::DeviceContext;
use homeclaw_core::error::ProviderError;
use homeclaw_core::event::{DomainEvent, EventBus};
use homeclaw_core::memory::AssistantMemory;
use homeclaw_core::message::{ChatLog, ConversationEntry, ToolCall};
use homeclaw_core::provider::{ModelResponse, Provider, ProviderRequest, SystemPrompt};
use homeclaw_core::tool::{ToolExecutor, ToolOutput};
use homeclaw_core::{Error, Result};
use homeclaw_providers::to_wire_messages_or_floor;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum model round trips per turn.
pub const MAX_TOOL_ITERATIONS: u32 = 10;

/// Appended when the model returns neither text nor tool calls.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a response from the model.";

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Assembling,
    Invoking,
    AwaitingToolResolution,
    Done,
    Aborted,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    /// The model answered without requesting tools.
    Done,
    /// The iteration cap was hit; the log keeps whatever was produced.
    CapReached,
    /// The model invocation failed; the turn is over.
    Aborted(ProviderError),
}

impl LoopOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::CapReached => "cap_reached",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub outcome: LoopOutcome,
    pub iterations: u32,
    pub tier: PromptTier,
    pub tokens_used: u32,
}

/// Drives model invocations and tool dispatch for one turn at a time.
pub struct ToolCallLoop {
    /// The model invocation boundary
    provider: Arc<dyn Provider>,

    /// Tool execution boundary and schema source
    tools: Option<Arc<dyn ToolExecutor>>,

    /// Device inventory for prompt enrichment
    devices: Option<Arc<dyn DeviceContext>>,

    /// Long-term memory for prompt enrichment
    memory: Option<Arc<dyn AssistantMemory>>,

    max_iterations: u32,

    event_bus: Arc<EventBus>,
}

impl ToolCallLoop {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            tools: None,
            devices: None,
            memory: None,
            max_iterations: MAX_TOOL_ITERATIONS,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_devices(mut self, devices: Arc<dyn DeviceContext>) -> Self {
        self.devices = Some(devices);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn AssistantMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Override the round-trip cap. Mostly for tests.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Run the loop over `log`, appending replies and tool results.
    ///
    /// Provider failures end the run with [`LoopOutcome::Aborted`] rather
    /// than an error; the only error is [`Error::Cancelled`].
    pub async fn run(
        &self,
        log: &mut ChatLog,
        options: &AgentOptions,
        cancel: &CancellationToken,
    ) -> Result<LoopReport> {
        let conversation_id = log.id.to_string();
        let params = options.model_params();

        // ── Assembling ──
        let mut state = LoopState::Assembling;
        debug!(conversation_id = %conversation_id, state = ?state, "Building system prompt");
        let built = build_system_prompt(&PromptSources {
            options,
            host_text: log.system_text(),
            devices: self.devices.as_deref(),
            memory: self.memory.as_deref(),
        })
        .await;
        for demotion in &built.demotions {
            self.event_bus.publish(DomainEvent::PromptDegraded {
                conversation_id: conversation_id.clone(),
                tier: demotion.from.as_str().into(),
                reason: demotion.reason.clone(),
                timestamp: Utc::now(),
            });
        }
        let system: Option<SystemPrompt> = (!built.system.is_empty()).then_some(built.system);

        let tool_definitions = match (&self.tools, options.tools_enabled) {
            (Some(tools), true) => tools.definitions(),
            _ => Vec::new(),
        };

        let mut iterations = 0;
        let mut tokens_used = 0;

        let outcome = loop {
            if cancel.is_cancelled() {
                info!(conversation_id = %conversation_id, iterations, "Turn cancelled");
                return Err(Error::Cancelled);
            }

            if iterations >= self.max_iterations {
                warn!(
                    conversation_id = %conversation_id,
                    iterations,
                    "Max tool iterations reached, keeping partial content"
                );
                break LoopOutcome::CapReached;
            }
            iterations += 1;

            // ── Invoking ──
            state = LoopState::Invoking;
            debug!(conversation_id = %conversation_id, iteration = iterations, state = ?state, "Agent loop iteration");

            let request = ProviderRequest {
                model: params.model.clone(),
                messages: to_wire_messages_or_floor(log.entries(), true),
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                system: system.clone(),
                tools: tool_definitions.clone(),
            };

            let response = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(conversation_id = %conversation_id, iteration = iterations, "Turn cancelled during model invocation");
                    return Err(Error::Cancelled);
                }
                result = self.provider.complete(request) => result,
            };

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        conversation_id = %conversation_id,
                        iteration = iterations,
                        kind = ?e.kind(),
                        error = %e,
                        "Model invocation failed, aborting turn"
                    );
                    break LoopOutcome::Aborted(e);
                }
            };

            let tokens = response.usage.map(|u| u.total());
            tokens_used += tokens.unwrap_or(0);
            self.event_bus.publish(DomainEvent::ModelInvoked {
                conversation_id: conversation_id.clone(),
                iteration: iterations,
                model: response.model.clone(),
                tokens_used: tokens,
                timestamp: Utc::now(),
            });

            if !fold_response(log, response) {
                break LoopOutcome::Done;
            }

            // ── AwaitingToolResolution ──
            state = LoopState::AwaitingToolResolution;
            let pending: Vec<ToolCall> = log.pending_tool_calls().into_iter().cloned().collect();
            debug!(
                conversation_id = %conversation_id,
                tool_count = pending.len(),
                state = ?state,
                "Executing tool calls"
            );

            let outputs = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(conversation_id = %conversation_id, iteration = iterations, "Turn cancelled during tool dispatch");
                    return Err(Error::Cancelled);
                }
                outputs = self.dispatch(&pending) => outputs,
            };

            for (call, output) in pending.iter().zip(outputs) {
                log.push(ConversationEntry::tool_result(call, output.payload, output.is_error));
            }

            if !log.has_unresponded_tool_results() {
                break LoopOutcome::Done;
            }
        };

        let state = match outcome {
            LoopOutcome::Aborted(_) => LoopState::Aborted,
            _ => LoopState::Done,
        };
        debug!(conversation_id = %conversation_id, state = ?state, iterations, "Agent loop finished");

        Ok(LoopReport {
            outcome,
            iterations,
            tier: built.tier,
            tokens_used,
        })
    }

    /// Run every call concurrently; outputs come back in call order.
    async fn dispatch(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let futures = calls.iter().map(|call| async move {
            let start = std::time::Instant::now();
            let output = match &self.tools {
                Some(tools) => tools.execute(call).await,
                None => ToolOutput::failure(format!("Tool '{}' is not available", call.name)),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            debug!(tool = %call.name, success = !output.is_error, duration_ms, "Tool call resolved");
            self.event_bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.name.clone(),
                success: !output.is_error,
                duration_ms,
                timestamp: Utc::now(),
            });
            output
        });
        join_all(futures).await
    }
}

/// Append a model reply to the log. Returns `true` when it requested tools.
fn fold_response(log: &mut ChatLog, response: ModelResponse) -> bool {
    if response.text.is_empty() && response.tool_calls.is_empty() {
        debug!(stop_reason = ?response.stop_reason, "Empty model response, using fallback reply");
        log.push(ConversationEntry::assistant(FALLBACK_REPLY));
        return false;
    }

    let wants_tools = !response.tool_calls.is_empty();
    log.push(ConversationEntry::assistant_with_tools(
        response.text,
        response.tool_calls,
    ));
    wants_tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use homeclaw_core::message::EntryRole;
    use homeclaw_core::wire::{ContentBlock, WireRole};

    fn seeded_log(text: &str) -> ChatLog {
        let mut log = ChatLog::new();
        log.push(ConversationEntry::system("host rules"));
        log.push(ConversationEntry::user(text));
        log
    }

    #[tokio::test]
    async fn no_tool_response_ends_loop() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("Hello!"))]));
        let runner = ToolCallLoop::new(provider.clone());
        let mut log = seeded_log("Hi");

        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.outcome, LoopOutcome::Done));
        assert_eq!(report.iterations, 1);
        assert_eq!(report.tokens_used, 15);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last_assistant_text(), Some("Hello!"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn request_carries_model_params_and_system() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("ok"))]));
        let runner = ToolCallLoop::new(provider.clone())
            .with_tools(Arc::new(RecordingTools::default()));
        let mut log = seeded_log("Hi");

        let options = AgentOptions {
            recommended: false,
            chat_model: Some("glm-4-flash".into()),
            max_tokens: Some(512),
            ..Default::default()
        };
        runner
            .run(&mut log, &options, &CancellationToken::new())
            .await
            .unwrap();

        let req = provider.request(0);
        assert_eq!(req.model, "glm-4-flash");
        assert_eq!(req.max_tokens, 512);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        let system = req.system.unwrap();
        assert_eq!(system.parts.len(), 2);
        assert_eq!(system.parts[1], "host rules");
        assert_eq!(req.tools.len(), 1);
        // The leading System entry never reaches the wire
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, WireRole::User);
    }

    #[tokio::test]
    async fn tools_disabled_sends_no_schemas() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("ok"))]));
        let runner = ToolCallLoop::new(provider.clone())
            .with_tools(Arc::new(RecordingTools::default()));
        let mut log = seeded_log("Hi");
        let options = AgentOptions {
            tools_enabled: false,
            ..Default::default()
        };
        runner
            .run(&mut log, &options, &CancellationToken::new())
            .await
            .unwrap();
        assert!(provider.request(0).tools.is_empty());
    }

    #[tokio::test]
    async fn three_tool_results_merge_into_one_user_message() {
        let calls = vec![
            tool_call("t1", "HassTurnOn"),
            tool_call("t2", "HassTurnOn"),
            tool_call("t3", "HassTurnOff"),
        ];
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response("", calls)),
            Ok(text_response("All done.")),
        ]));
        let tools = Arc::new(RecordingTools::default());
        let runner = ToolCallLoop::new(provider.clone()).with_tools(tools.clone());
        let mut log = seeded_log("Everything on please");

        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.outcome, LoopOutcome::Done));
        assert_eq!(report.iterations, 2);
        assert_eq!(tools.executed(), vec!["t1", "t2", "t3"]);

        let second = provider.request(1);
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, WireRole::User);
        let ids: Vec<&str> = last
            .blocks()
            .unwrap()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn failed_tool_is_fed_back_with_error_flag() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response("Trying", vec![tool_call("t1", "HassTurnOn")])),
            Ok(text_response("That device is offline.")),
        ]));
        let tools = Arc::new(RecordingTools::failing());
        let runner = ToolCallLoop::new(provider.clone()).with_tools(tools);
        let mut log = seeded_log("Turn on the sauna");

        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(report.outcome, LoopOutcome::Done));

        let tool_result = log
            .entries()
            .iter()
            .find(|e| e.role() == EntryRole::ToolResult)
            .unwrap();
        assert!(matches!(tool_result, ConversationEntry::ToolResult { is_error: true, .. }));

        let second = provider.request(1);
        let blocks = second.messages.last().unwrap().blocks().unwrap();
        assert!(matches!(blocks[0], ContentBlock::ToolResult { is_error: true, .. }));
    }

    #[tokio::test]
    async fn missing_executor_yields_error_results() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response("", vec![tool_call("t1", "HassTurnOn")])),
            Ok(text_response("I can't do that.")),
        ]));
        let runner = ToolCallLoop::new(provider);
        let mut log = seeded_log("lights");
        runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(log
            .entries()
            .iter()
            .any(|e| matches!(e, ConversationEntry::ToolResult { is_error: true, .. })));
    }

    #[tokio::test]
    async fn iteration_cap_bounds_round_trips() {
        let responses = (0..20)
            .map(|i| Ok(tool_response("", vec![tool_call(&format!("t{i}"), "HassTurnOn")])))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(responses));
        let runner = ToolCallLoop::new(provider.clone())
            .with_tools(Arc::new(RecordingTools::default()));
        let mut log = seeded_log("loop forever");

        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.outcome, LoopOutcome::CapReached));
        assert_eq!(report.iterations, MAX_TOOL_ITERATIONS);
        assert_eq!(provider.call_count(), MAX_TOOL_ITERATIONS as usize);
    }

    #[tokio::test]
    async fn empty_response_appends_fallback() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response(""))]));
        let runner = ToolCallLoop::new(provider);
        let mut log = seeded_log("Hi");
        runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(log.last_assistant_text(), Some(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn provider_error_aborts_without_touching_log() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::Authentication("bad key".into()),
        )]));
        let runner = ToolCallLoop::new(provider);
        let mut log = seeded_log("Hi");
        let before = log.entries().to_vec();

        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(report.outcome, LoopOutcome::Aborted(ProviderError::Authentication(_))));
        assert_eq!(log.entries(), before.as_slice());
    }

    #[tokio::test]
    async fn empty_log_sends_floor_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("Hi there"))]));
        let runner = ToolCallLoop::new(provider.clone());
        let mut log = ChatLog::new();
        let report = runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        let req = provider.request(0);
        assert_eq!(req.messages, vec![homeclaw_core::WireMessage::user_text("Hello")]);
        // No host text: the custom prompt stands alone
        assert_eq!(report.tier, PromptTier::Custom);
        assert_eq!(req.system.unwrap().parts.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_invoking() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("never"))]));
        let runner = ToolCallLoop::new(provider.clone());
        let mut log = seeded_log("Hi");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner
            .run(&mut log, &AgentOptions::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_during_invocation() {
        let provider = Arc::new(StallingProvider);
        let runner = ToolCallLoop::new(provider);
        let mut log = seeded_log("Hi");
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = runner
            .run(&mut log, &AgentOptions::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_during_tool_dispatch() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(tool_response(
            "",
            vec![tool_call("t1", "HassTurnOn")],
        ))]));
        let runner = ToolCallLoop::new(provider.clone()).with_tools(Arc::new(StallingTools));
        let mut log = seeded_log("Turn on the kitchen");
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = runner
            .run(&mut log, &AgentOptions::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(provider.call_count(), 1);
        // The tool-call entry stays, no result was appended
        assert_eq!(log.last().unwrap().role(), EntryRole::Assistant);
        assert!(!log.has_unresponded_tool_results());
    }

    #[tokio::test]
    async fn events_are_published() {
        let bus = Arc::new(EventBus::new(64));
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response("", vec![tool_call("t1", "HassTurnOn")])),
            Ok(text_response("Done")),
        ]));
        let runner = ToolCallLoop::new(provider)
            .with_tools(Arc::new(RecordingTools::default()))
            .with_event_bus(bus);
        let mut log = seeded_log("light on");
        runner
            .run(&mut log, &AgentOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        let mut invoked = 0;
        let mut executed = 0;
        while let Ok(event) = rx.try_recv() {
            match event.as_ref() {
                DomainEvent::ModelInvoked { .. } => invoked += 1,
                DomainEvent::ToolExecuted { .. } => executed += 1,
                _ => {}
            }
        }
        assert_eq!(invoked, 2);
        assert_eq!(executed, 1);
    }
}
