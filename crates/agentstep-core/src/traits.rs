// Core traits for pluggable collaborators
//
// These traits allow the step engine to be used with different backends:
// - In-memory implementations for examples and testing (see memory.rs)
// - Database implementations for production (see agentstep-storage)
// - Remote model clients provided by the embedding application

use async_trait::async_trait;
use serde_json::Value;

use crate::context::AgentContext;
use crate::document::{DocumentCreationRequest, DocumentReference};
use crate::error::Result;
use crate::execution::AgentExecutionContext;
use crate::message::AssistantMessage;
use crate::runtime_memory::RuntimeMemory;
use crate::tool_types::{GatewayToolDefinition, ToolDefinition};

// ============================================================================
// ModelClient - For calling the model
// ============================================================================

/// Outcome of one model call
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Context with metrics updated for this call
    pub agent_context: AgentContext,
    pub assistant_message: AssistantMessage,
    /// Provider response as received, for diagnostics
    pub raw_response: Option<Value>,
}

/// Trait for model invocation
///
/// Implementations must increment `metrics.model_calls` by exactly one, add the
/// token usage of the call, and only read `memory.filtered_messages()`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn execute_chat_request(
        &self,
        execution: &AgentExecutionContext,
        context: AgentContext,
        memory: &RuntimeMemory,
    ) -> Result<ChatResponse>;
}

// ============================================================================
// ToolSchemaResolver - For resolving the declared tools
// ============================================================================

/// Tools declared for the agent in the current process version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    pub tool_definitions: Vec<ToolDefinition>,
    pub gateway_tool_definitions: Vec<GatewayToolDefinition>,
}

impl ToolSchema {
    pub fn new(
        tool_definitions: Vec<ToolDefinition>,
        gateway_tool_definitions: Vec<GatewayToolDefinition>,
    ) -> Self {
        Self {
            tool_definitions,
            gateway_tool_definitions,
        }
    }
}

#[async_trait]
pub trait ToolSchemaResolver: Send + Sync {
    async fn resolve_schema(&self, execution: &AgentExecutionContext) -> Result<ToolSchema>;
}

// ============================================================================
// ConversationStore - For persisting conversation history
// ============================================================================

/// Trait for loading and persisting the message history of a conversation
///
/// Implementations can:
/// - Keep messages inline in the agent context
/// - Store messages as documents in a document store
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Storage kind key (e.g. "in-process")
    fn kind(&self) -> &'static str;

    /// Load the persisted history into the runtime memory
    async fn load_into_runtime_memory(
        &self,
        execution: &AgentExecutionContext,
        context: &AgentContext,
        memory: &mut RuntimeMemory,
    ) -> Result<()>;

    /// Persist the full runtime memory, returning the context pointing at it
    async fn store_from_runtime_memory(
        &self,
        execution: &AgentExecutionContext,
        context: AgentContext,
        memory: &RuntimeMemory,
    ) -> Result<AgentContext>;

    /// Roll back what a failed job completion left behind
    async fn compensate_failed_job_completion(
        &self,
        _execution: &AgentExecutionContext,
        _context: &AgentContext,
        _error: &(dyn std::error::Error + Send + Sync),
    ) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// DocumentStore - For binary documents
// ============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, request: DocumentCreationRequest) -> Result<DocumentReference>;

    async fn read_document(&self, reference: &DocumentReference) -> Result<Vec<u8>>;

    async fn delete_document(&self, reference: &DocumentReference) -> Result<()>;
}
