// Agent Step Engine
//
// This crate provides a DB-agnostic implementation of a single agent step
// (initialize → assemble messages → model call → persist → respond).
//
// Key design decisions:
// - One invocation performs exactly one step; an external dispatcher drives the loop
// - All state between steps lives in AgentContext and the conversation store
// - Uses traits (ModelClient, ToolSchemaResolver, ConversationStore, DocumentStore) for pluggable backends
// - Gateway tool handlers (MCP, A2A) are registered explicitly by type
// - Error handling distinguishes stable domain error codes from collaborator errors

// Runtime types (context, messages, tools)
pub mod context;
pub mod document;
pub mod message;
pub mod tool_types;

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod runtime_memory;
pub mod step;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use agent::{AgentInitializationResult, AgentInitializer, AgentRequestHandler};
pub use config::{AgentExecutionConfig, AgentExecutionConfigBuilder};
pub use context::{AgentContext, AgentMetadata, AgentMetrics, AgentState, ConversationContext, TokenUsage};
pub use conversation::{ConversationStoreRegistry, DocumentConversationStore, InProcessConversationStore};
pub use document::{DocumentCreationRequest, DocumentReference};
pub use error::{AgentError, ErrorCode, Result};
pub use execution::AgentExecutionContext;
pub use gateway::{GatewayToolHandler, GatewayToolHandlerRegistry};
pub use message::{AssistantMessage, Content, Message, MessageRole};
pub use runtime_memory::RuntimeMemory;
pub use step::{AgentResponse, AgentStepCompletion};
pub use tool_types::{GatewayToolDefinition, ToolCall, ToolCallResult, ToolCallVariable, ToolDefinition};
pub use traits::{ChatResponse, ConversationStore, DocumentStore, ModelClient, ToolSchema, ToolSchemaResolver};
