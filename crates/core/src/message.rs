//! Conversation entry and chat log domain types.
//!
//! A turn flows through the system as an append-only [`ChatLog`]:
//! the host seeds it with history, the agent appends the user utterance,
//! model replies and tool results, and the host persists it afterwards.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role an entry plays in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRole {
    System,
    User,
    Assistant,
    ToolResult,
}

/// A structured request from the model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id, unique within a turn
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON value
    pub input: serde_json::Value,
}

/// A file attached to a user utterance, already base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type, e.g. `image/png` or `application/pdf`
    pub media_type: String,

    /// Base64 payload
    pub data: String,

    /// Original file name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Attachment {
    /// Encode raw bytes into an attachment.
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data: STANDARD.encode(bytes),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One entry of the conversation log.
///
/// Each variant has a fixed field set; there is no optional probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEntry {
    /// Instructions from the host. Sent as the system prompt, never as a message.
    System { content: Option<String> },

    /// An utterance from the end user, with optional attachments.
    User {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attachments: Vec<Attachment>,
    },

    /// A model reply: free text followed by the tool calls it requested.
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// The outcome of one tool call, keyed by the originating call id.
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl ConversationEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: Some(content.into()),
            attachments: Vec::new(),
        }
    }

    pub fn user_with_attachments(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self::User {
            content: Some(content.into()),
            attachments,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// An assistant reply carrying tool calls. Empty text is stored as `None`.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let content: String = content.into();
        Self::Assistant {
            content: (!content.is_empty()).then_some(content),
            tool_calls,
        }
    }

    pub fn tool_result(
        call: &ToolCall,
        result: serde_json::Value,
        is_error: bool,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            result,
            is_error,
        }
    }

    pub fn role(&self) -> EntryRole {
        match self {
            Self::System { .. } => EntryRole::System,
            Self::User { .. } => EntryRole::User,
            Self::Assistant { .. } => EntryRole::Assistant,
            Self::ToolResult { .. } => EntryRole::ToolResult,
        }
    }

    /// The free text of the entry, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content }
            | Self::User { content, .. }
            | Self::Assistant { content, .. } => content.as_deref(),
            Self::ToolResult { result, .. } => result.as_str(),
        }
    }
}

/// An append-only, turn-ordered conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLog {
    /// Unique conversation ID
    pub id: ConversationId,

    entries: Vec<ConversationEntry>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last entry was appended
    pub updated_at: DateTime<Utc>,
}

impl ChatLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::with_history(ConversationId::new(), Vec::new())
    }

    /// Seed a log with prior history supplied by the host session.
    pub fn with_history(id: ConversationId, entries: Vec<ConversationEntry>) -> Self {
        let now = Utc::now();
        Self {
            id,
            entries,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an entry. Prior entries are never edited or removed.
    pub fn push(&mut self, entry: ConversationEntry) {
        self.updated_at = Utc::now();
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub fn into_entries(self) -> Vec<ConversationEntry> {
        self.entries
    }

    /// Text of the leading System entry, when the log starts with one.
    pub fn system_text(&self) -> Option<&str> {
        match self.entries.first() {
            Some(ConversationEntry::System { content }) => content.as_deref(),
            _ => None,
        }
    }

    /// Tool calls of the most recent Assistant entry that have no ToolResult yet.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(pos) = self
            .entries
            .iter()
            .rposition(|e| e.role() == EntryRole::Assistant)
        else {
            return Vec::new();
        };

        let ConversationEntry::Assistant { tool_calls, .. } = &self.entries[pos] else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.entries[pos + 1..]
            .iter()
            .filter_map(|e| match e {
                ConversationEntry::ToolResult { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();

        tool_calls
            .iter()
            .filter(|tc| !answered.contains(&tc.id.as_str()))
            .collect()
    }

    /// True when the log ends with tool results the model has not seen yet.
    pub fn has_unresponded_tool_results(&self) -> bool {
        matches!(self.entries.last(), Some(ConversationEntry::ToolResult { .. }))
    }

    /// Text of the latest Assistant entry, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.role() == EntryRole::Assistant)
            .and_then(|e| e.text())
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}
