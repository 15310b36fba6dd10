//! Conversion from the provider-agnostic chat log to wire messages.
//!
//! Rules:
//! - System entries never become messages; they travel as the system prompt.
//! - Adjacent entries that map to the same wire role are merged into one
//!   message, preserving arrival order. The Messages API rejects two
//!   consecutive messages with the same role.
//! - Tool results are user-role content.
//! - Attachments with an unsupported media type are dropped, never fatal.
//!
//! The conversion is pure and deterministic.

use homeclaw_core::message::{Attachment, ConversationEntry};
use homeclaw_core::wire::{ContentBlock, MediaSource, WireContent, WireMessage, WireRole};
use tracing::debug;

/// Floor message sent when a log converts to nothing.
pub const FLOOR_MESSAGE: &str = "Hello";

/// Convert log entries to wire messages.
///
/// With `skip_leading_system`, a System entry at position 0 is skipped
/// explicitly; System entries anywhere else are excluded either way.
pub fn to_wire_messages(entries: &[ConversationEntry], skip_leading_system: bool) -> Vec<WireMessage> {
    let entries = match entries.first() {
        Some(ConversationEntry::System { .. }) if skip_leading_system => &entries[1..],
        _ => entries,
    };

    let mut messages: Vec<WireMessage> = Vec::new();

    for entry in entries {
        match entry {
            ConversationEntry::System { .. } => {
                debug!("Dropping embedded system entry from wire messages");
            }
            ConversationEntry::User {
                content,
                attachments,
            } => {
                let text = content.clone().unwrap_or_default();
                let media: Vec<ContentBlock> =
                    attachments.iter().filter_map(attachment_block).collect();

                if media.is_empty() {
                    push_text(&mut messages, WireRole::User, text);
                } else {
                    let target = open_message(&mut messages, WireRole::User);
                    let blocks = target.blocks_mut();
                    if !text.is_empty() {
                        blocks.push(ContentBlock::Text { text });
                    }
                    blocks.extend(media);
                }
            }
            ConversationEntry::Assistant {
                content,
                tool_calls,
            } => {
                let blocks = open_blocks(&mut messages, WireRole::Assistant);
                if let Some(text) = content.as_ref().filter(|t| !t.is_empty()) {
                    blocks.push(ContentBlock::Text { text: text.clone() });
                }
                blocks.extend(tool_calls.iter().map(|tc| ContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: tc.input.clone(),
                }));
            }
            ConversationEntry::ToolResult {
                tool_call_id,
                result,
                is_error,
                ..
            } => {
                open_message(&mut messages, WireRole::User)
                    .blocks_mut()
                    .push(ContentBlock::ToolResult {
                        tool_use_id: tool_call_id.clone(),
                        content: result_text(result),
                        is_error: *is_error,
                    });
            }
        }
    }

    // An assistant entry with neither text nor tool calls leaves an empty
    // message behind, which the API rejects.
    messages.retain(|m| !matches!(&m.content, WireContent::Blocks(b) if b.is_empty()));
    messages
}

/// Convert and apply the floor default so the result is never empty.
pub fn to_wire_messages_or_floor(entries: &[ConversationEntry], skip_leading_system: bool) -> Vec<WireMessage> {
    let messages = to_wire_messages(entries, skip_leading_system);
    if messages.is_empty() {
        return vec![WireMessage::user_text(FLOOR_MESSAGE)];
    }
    messages
}

/// Map an attachment to its block kind, or `None` for unsupported types.
pub fn attachment_block(attachment: &Attachment) -> Option<ContentBlock> {
    let media_type = attachment.media_type.to_ascii_lowercase();
    let source = MediaSource::base64(media_type.clone(), attachment.data.clone());
    match media_type.as_str() {
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" => Some(ContentBlock::Image { source }),
        "application/pdf" => Some(ContentBlock::Document { source }),
        other => {
            debug!(media_type = other, name = ?attachment.name, "Dropping unsupported attachment");
            None
        }
    }
}

/// Append a text entry, merging into a trailing message of the same role.
fn push_text(messages: &mut Vec<WireMessage>, role: WireRole, text: String) {
    match messages.last_mut() {
        Some(last) if last.role == role => last.blocks_mut().push(ContentBlock::Text { text }),
        _ => messages.push(WireMessage {
            role,
            content: WireContent::Text(text),
        }),
    }
}

/// The trailing message if it has `role`, otherwise a fresh block message.
fn open_message(messages: &mut Vec<WireMessage>, role: WireRole) -> &mut WireMessage {
    let reuse = matches!(messages.last(), Some(last) if last.role == role);
    if !reuse {
        messages.push(WireMessage {
            role,
            content: WireContent::Blocks(Vec::new()),
        });
    }
    let last = messages.len() - 1;
    &mut messages[last]
}

fn open_blocks(messages: &mut Vec<WireMessage>, role: WireRole) -> &mut Vec<ContentBlock> {
    open_message(messages, role).blocks_mut()
}

fn result_text(result: &serde_json::Value) -> String {
    match result {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
