// Agent context
//
// AgentContext is the serializable state of one agent conversation. It is threaded
// through every step as an input/output pair; the engine keeps nothing else between
// invocations.
//
// Design Decision: fields are private and every update goes through a consuming
// `with_*` method, so a context handed to a collaborator is never mutated behind
// the caller's back.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentReference;
use crate::message::Message;
use crate::tool_types::{unique_by_name, ToolDefinition};

// ============================================================================
// AgentState
// ============================================================================

/// Coarse phase of the agent state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// No tools resolved yet (transient)
    #[default]
    Initializing,
    /// Waiting for gateway tool discovery results (transient)
    ToolDiscovery,
    /// Last model turn requested tool calls
    WaitingForToolInput,
    /// Ready for the next user prompt
    Ready,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Initializing => "INITIALIZING",
            AgentState::ToolDiscovery => "TOOL_DISCOVERY",
            AgentState::WaitingForToolInput => "WAITING_FOR_TOOL_INPUT",
            AgentState::Ready => "READY",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metrics and metadata
// ============================================================================

/// Token usage accumulated over all model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_token_count: u64,
    pub output_token_count: u64,
}

impl TokenUsage {
    pub fn new(input_token_count: u64, output_token_count: u64) -> Self {
        Self {
            input_token_count,
            output_token_count,
        }
    }

    /// Sum of both usages
    pub fn add(&self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_token_count: self.input_token_count + other.input_token_count,
            output_token_count: self.output_token_count + other.output_token_count,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_token_count + self.output_token_count
    }
}

/// Monotonic agent metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    #[serde(default)]
    pub model_calls: u32,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

impl AgentMetrics {
    pub fn new(model_calls: u32, token_usage: TokenUsage) -> Self {
        Self {
            model_calls,
            token_usage,
        }
    }

    /// Record one more model call with its token usage
    pub fn record_model_call(&self, usage: TokenUsage) -> AgentMetrics {
        AgentMetrics {
            model_calls: self.model_calls + 1,
            token_usage: self.token_usage.add(usage),
        }
    }
}

/// Process identity the context was last executed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetadata {
    pub process_definition_key: i64,
    pub process_instance_key: i64,
}

impl AgentMetadata {
    pub fn new(process_definition_key: i64, process_instance_key: i64) -> Self {
        Self {
            process_definition_key,
            process_instance_key,
        }
    }
}

// ============================================================================
// ConversationContext
// ============================================================================

/// Storage-specific pointer to the persisted conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConversationContext {
    /// History stored inline in the agent context
    #[serde(rename_all = "camelCase")]
    InProcess {
        conversation_id: String,
        #[serde(default)]
        messages: Vec<Message>,
    },
    /// History stored as a document in a document store
    #[serde(rename_all = "camelCase")]
    Document {
        conversation_id: String,
        document: DocumentReference,
        #[serde(default)]
        previous_documents: Vec<DocumentReference>,
    },
}

impl ConversationContext {
    /// Storage kind key, matching the conversation store kinds
    pub fn kind(&self) -> &'static str {
        match self {
            ConversationContext::InProcess { .. } => "in-process",
            ConversationContext::Document { .. } => "document",
        }
    }

    pub fn conversation_id(&self) -> &str {
        match self {
            ConversationContext::InProcess {
                conversation_id, ..
            }
            | ConversationContext::Document {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

// ============================================================================
// AgentContext
// ============================================================================

/// Serializable state of one agent conversation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    #[serde(default)]
    state: AgentState,
    #[serde(default)]
    metrics: AgentMetrics,
    #[serde(default)]
    tool_definitions: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversation: Option<ConversationContext>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<AgentMetadata>,
}

impl AgentContext {
    /// Fresh context: INITIALIZING, zero metrics, nothing else
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    pub fn conversation(&self) -> Option<&ConversationContext> {
        self.conversation.as_ref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn metadata(&self) -> Option<&AgentMetadata> {
        self.metadata.as_ref()
    }

    pub fn with_state(mut self, state: AgentState) -> Self {
        self.state = state;
        self
    }

    pub fn with_metrics(mut self, metrics: AgentMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the tool definitions; tools sharing a name are collapsed
    pub fn with_tool_definitions(mut self, tool_definitions: Vec<ToolDefinition>) -> Self {
        self.tool_definitions = unique_by_name(tool_definitions);
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationContext) -> Self {
        self.conversation = Some(conversation);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: AgentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
