//! Wire message shapes for the Anthropic-compatible Messages API.
//!
//! These are produced transiently from a [`ChatLog`](crate::message::ChatLog)
//! for each model invocation and never persisted.

use serde::{Deserialize, Serialize};

/// Role of a wire message. The Messages API only knows two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
}

/// One message in the `messages` array of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: WireContent,
}

impl WireMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            content: WireContent::Text(text.into()),
        }
    }

    /// Content as a block list, upgrading a bare text body to one text block.
    pub fn blocks_mut(&mut self) -> &mut Vec<ContentBlock> {
        if let WireContent::Text(text) = &mut self.content {
            let text = std::mem::take(text);
            self.content = WireContent::Blocks(vec![ContentBlock::Text { text }]);
        }
        match &mut self.content {
            WireContent::Blocks(blocks) => blocks,
            WireContent::Text(_) => unreachable!("text content upgraded above"),
        }
    }

    /// Borrow the blocks, if the content is already a list.
    pub fn blocks(&self) -> Option<&[ContentBlock]> {
        match &self.content {
            WireContent::Blocks(blocks) => Some(blocks),
            WireContent::Text(_) => None,
        }
    }
}

/// Message content: either a bare string or a list of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A typed content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: MediaSource,
    },
    Document {
        source: MediaSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

/// Inline base64 payload for image and document blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl MediaSource {
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: "base64".into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}
