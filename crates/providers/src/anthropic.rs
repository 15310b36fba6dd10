//! Anthropic-compatible Messages API provider.
//!
//! Targets z.ai's Anthropic-compatible endpoint by default; any server that
//! speaks the Messages API works through [`AnthropicProvider::with_base_url`].
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level text blocks marked for prompt caching
//! - Native tool use with `tool_use` / `tool_result` content blocks

use async_trait::async_trait;
use homeclaw_config::{AppConfig, DEFAULT_CHAT_MODEL, MODELS};
use homeclaw_core::error::ProviderError;
use homeclaw_core::message::ToolCall;
use homeclaw_core::provider::*;
use homeclaw_core::wire::WireMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = homeclaw_config::DEFAULT_BASE_URL;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const HEALTH_CHECK_MAX_TOKENS: u32 = 10;

/// Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new provider against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Build from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_key.clone().unwrap_or_default())
            .with_base_url(&config.base_url)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the HTTP client with one using `timeout` per request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Build the JSON request body.
    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(system) = request.system.as_ref().filter(|s| !s.is_empty()) {
            body["system"] = serde_json::json!(Self::to_system_blocks(system));
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    /// One cacheable text block per system prompt part.
    fn to_system_blocks(system: &SystemPrompt) -> Vec<SystemBlock> {
        system
            .parts
            .iter()
            .map(|text| SystemBlock {
                kind: "text",
                text: text.clone(),
                cache_control: CacheControl { kind: "ephemeral" },
            })
            .collect()
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    async fn post(&self, body: &serde_json::Value) -> std::result::Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();

        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Messages API error");
        Err(classify_status(status, retry_after_secs, error_body))
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else {
        ProviderError::Connection(err.to_string())
    }
}

fn classify_status(status: u16, retry_after_secs: u64, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Authentication("API key rejected".into()),
        408 | 504 => ProviderError::Timeout(format!("gateway timeout (status {status})")),
        429 => ProviderError::RateLimited { retry_after_secs },
        _ => ProviderError::Api {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl homeclaw_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ModelResponse, ProviderError> {
        let body = Self::build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self.post(&body).await?;

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse reply: {e}")))?;

        Ok(Self::to_model_response(api_resp, &request.model))
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        // The compatible endpoint has no listing route; return the known set
        Ok(MODELS.iter().map(|m| (*m).to_string()).collect())
    }

    async fn health_check(&self) -> std::result::Result<(), ProviderError> {
        let request = ProviderRequest {
            model: DEFAULT_CHAT_MODEL.into(),
            messages: vec![WireMessage::user_text("test")],
            max_tokens: HEALTH_CHECK_MAX_TOKENS,
            temperature: 0.0,
            system: None,
            tools: Vec::new(),
        };
        self.post(&Self::build_body(&request)).await.map(|_| ())
    }
}

impl AnthropicProvider {
    /// Decompose an API reply into text and tool calls.
    ///
    /// Text blocks are concatenated with no separator. Unknown block types
    /// are ignored.
    fn to_model_response(resp: AnthropicResponse, requested_model: &str) -> ModelResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                ResponseContentBlock::Text { text: t } => text.push_str(&t),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall { id, name, input });
                }
                ResponseContentBlock::Other => {}
            }
        }

        ModelResponse {
            text,
            tool_calls,
            stop_reason: resp.stop_reason,
            model: resp.model.unwrap_or_else(|| requested_model.to_string()),
            usage: resp.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

// --- Messages API types ---

#[derive(Debug, Serialize)]
struct SystemBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
    cache_control: CacheControl,
}

#[derive(Debug, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
