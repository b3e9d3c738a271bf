// Message types
//
// Message is the storage-agnostic unit of conversation history. Each variant carries
// an optional metadata map (e.g. the "timestamp" stamped when the message was added).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentReference;
use crate::tool_types::{ToolCall, ToolCallResult};

/// Metadata key holding the RFC3339 creation time of a message
pub const METADATA_TIMESTAMP: &str = "timestamp";

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    ToolCallResult,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::ToolCallResult => write!(f, "toolCallResult"),
        }
    }
}

/// Content part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    Text { text: String },
    Document { document: DocumentReference },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn document(document: DocumentReference) -> Self {
        Content::Document { document }
    }

    /// Get text if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
            Content::Document { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemMessage {
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AssistantMessage {
    pub fn new(content: Vec<Content>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls,
            metadata: Map::new(),
        }
    }

    /// All text parts joined with newlines, None when there is no text
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self.content.iter().filter_map(Content::as_text).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolCallResultMessage {
    pub results: Vec<ToolCallResult>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolCallResult(ToolCallResultMessage),
}

impl Message {
    /// Create a system message with a single text part
    pub fn system(text: impl Into<String>) -> Self {
        Message::System(SystemMessage {
            content: vec![Content::text(text)],
            metadata: Map::new(),
        })
    }

    /// Create a user message with a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Message::User(UserMessage {
            content: vec![Content::text(text)],
            ..Default::default()
        })
    }

    /// Create a text-only assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage::new(vec![Content::text(text)], vec![]))
    }

    /// Create an assistant message requesting tool calls
    pub fn assistant_with_tools(content: Vec<Content>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant(AssistantMessage::new(content, tool_calls))
    }

    pub fn tool_call_results(results: Vec<ToolCallResult>) -> Self {
        Message::ToolCallResult(ToolCallResultMessage {
            results,
            metadata: Map::new(),
        })
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Message::System(_) => MessageRole::System,
            Message::User(_) => MessageRole::User,
            Message::Assistant(_) => MessageRole::Assistant,
            Message::ToolCallResult(_) => MessageRole::ToolCallResult,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System(_))
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Message::System(m) => &m.metadata,
            Message::User(m) => &m.metadata,
            Message::Assistant(m) => &m.metadata,
            Message::ToolCallResult(m) => &m.metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Message::System(m) => &mut m.metadata,
            Message::User(m) => &mut m.metadata,
            Message::Assistant(m) => &mut m.metadata,
            Message::ToolCallResult(m) => &mut m.metadata,
        }
    }

    /// Stamp the message with the current time
    pub fn with_timestamp(mut self) -> Self {
        self.metadata_mut().insert(
            METADATA_TIMESTAMP.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        self
    }

    /// First text part, if any
    pub fn text(&self) -> Option<&str> {
        let content = match self {
            Message::System(m) => &m.content,
            Message::User(m) => &m.content,
            Message::Assistant(m) => &m.content,
            Message::ToolCallResult(_) => return None,
        };
        content.iter().find_map(Content::as_text)
    }
}

impl From<AssistantMessage> for Message {
    fn from(message: AssistantMessage) -> Self {
        Message::Assistant(message)
    }
}
