//! Error types for the homeclaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all homeclaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Enrichment errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The enclosing session abandoned the turn.
    #[error("Turn cancelled")]
    Cancelled,

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised by the model invocation boundary.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    Timeout,
    Connection,
    Generic,
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Authentication(_) => ProviderErrorKind::Authentication,
            Self::Timeout(_) => ProviderErrorKind::Timeout,
            Self::Connection(_) => ProviderErrorKind::Connection,
            Self::RateLimited { .. } | Self::Api { .. } | Self::InvalidResponse(_) => {
                ProviderErrorKind::Generic
            }
        }
    }

    /// The single explanatory message shown to the user when a turn aborts.
    ///
    /// Never includes response bodies, status codes or request ids.
    pub fn user_message(&self) -> String {
        let reason = match self.kind() {
            ProviderErrorKind::Authentication => "the API key was rejected",
            ProviderErrorKind::Timeout => "the request timed out",
            ProviderErrorKind::Connection => "the service could not be reached",
            ProviderErrorKind::Generic => match self {
                Self::RateLimited { .. } => "the service is busy right now",
                _ => "the service returned an error",
            },
        };
        format!("Sorry, I had a problem talking to the language model: {reason}.")
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Memory is not loaded")]
    NotLoaded,

    #[error("Corrupted memory document: {0}")]
    Corrupted(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("No matching device: {0}")]
    NoMatch(String),
}

/// Failures while gathering optional prompt enrichment.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Device context unavailable: {0}")]
    Devices(String),

    #[error("Prompt assembly failed: {0}")]
    Assembly(String),

    #[error("Host system prompt unavailable")]
    HostPromptMissing,
}
