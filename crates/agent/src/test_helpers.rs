//! Shared test doubles for the agent crate.

use async_trait::async_trait;
use homeclaw_core::device::DeviceContext;
use homeclaw_core::error::{ContextError, MemoryError, ProviderError};
use homeclaw_core::memory::AssistantMemory;
use homeclaw_core::message::ToolCall;
use homeclaw_core::provider::{ModelResponse, Provider, ProviderRequest, ToolDefinition, Usage};
use homeclaw_core::tool::{ToolExecutor, ToolOutput};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that replays a scripted sequence of results.
///
/// Every request is recorded. Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The `n`th request received.
    pub fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ModelResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no response for call #{call}"))
    }
}

/// A provider that never answers.
pub struct StallingProvider;

#[async_trait]
impl Provider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ModelResponse, ProviderError> {
        std::future::pending().await
    }
}

/// A text-only response.
pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        text: text.into(),
        tool_calls: Vec::new(),
        stop_reason: Some("end_turn".into()),
        model: "mock-model".into(),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

/// A response requesting tools, with optional leading text.
pub fn tool_response(text: &str, tool_calls: Vec<ToolCall>) -> ModelResponse {
    ModelResponse {
        text: text.into(),
        tool_calls,
        stop_reason: Some("tool_use".into()),
        model: "mock-model".into(),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

pub fn tool_call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        input: serde_json::json!({ "area": "kitchen" }),
    }
}

/// A tool executor that records call ids and answers with a fixed outcome.
#[derive(Default)]
pub struct RecordingTools {
    fail: bool,
    executed: Mutex<Vec<String>>,
}

impl RecordingTools {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for RecordingTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "HassTurnOn".into(),
            description: "Turn on a device".into(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        self.executed.lock().unwrap().push(call.id.clone());
        if self.fail {
            ToolOutput::failure("device unavailable")
        } else {
            ToolOutput::success(serde_json::json!({ "success": true }))
        }
    }
}

/// A tool executor whose calls never resolve.
pub struct StallingTools;

#[async_trait]
impl ToolExecutor for StallingTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        RecordingTools::default().definitions()
    }

    async fn execute(&self, _call: &ToolCall) -> ToolOutput {
        std::future::pending().await
    }
}

/// Device context with a fixed rendering.
pub struct StaticDevices(pub String);

#[async_trait]
impl DeviceContext for StaticDevices {
    async fn build_context(&self, _area_filter: Option<&[String]>) -> Result<String, ContextError> {
        Ok(self.0.clone())
    }
}

pub struct FailingDevices;

#[async_trait]
impl DeviceContext for FailingDevices {
    async fn build_context(&self, _area_filter: Option<&[String]>) -> Result<String, ContextError> {
        Err(ContextError::Devices("inventory unreachable".into()))
    }
}

pub struct FailingMemory;

#[async_trait]
impl AssistantMemory for FailingMemory {
    fn name(&self) -> &str {
        "failing"
    }

    async fn record_interaction(&self, _text: &str) -> Result<(), MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }

    async fn load(&self) -> Result<(), MemoryError> {
        Err(MemoryError::Corrupted("bad json".into()))
    }

    async fn build_prompt(&self) -> Result<String, MemoryError> {
        Err(MemoryError::NotLoaded)
    }
}
