// In-memory implementations for examples and testing
//
// These implementations keep all data in memory, making them perfect for:
// - Standalone usage without a database
// - Unit and integration tests
// - Scripting model responses deterministically

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::{AgentContext, TokenUsage};
use crate::document::{DocumentCreationRequest, DocumentReference};
use crate::error::{AgentError, Result};
use crate::execution::AgentExecutionContext;
use crate::gateway::{
    GatewayToolDefinitionUpdates, GatewayToolDiscoveryInitiationResult, GatewayToolHandler,
};
use crate::message::{AssistantMessage, Content, Message};
use crate::runtime_memory::RuntimeMemory;
use crate::tool_types::{GatewayToolDefinition, ToolCall, ToolCallResult, ToolDefinition};
use crate::traits::{ChatResponse, DocumentStore, ModelClient, ToolSchema, ToolSchemaResolver};

// ============================================================================
// MockModelClient - Returns predefined responses
// ============================================================================

/// A scripted model response
#[derive(Debug, Clone)]
pub struct MockModelResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub token_usage: TokenUsage,
}

impl MockModelResponse {
    /// Create a text-only response
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            token_usage: TokenUsage::default(),
        }
    }

    /// Create a response with tool calls
    pub fn with_tools(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: text.into(),
            tool_calls,
            token_usage: TokenUsage::default(),
        }
    }

    pub fn with_token_usage(mut self, input: u64, output: u64) -> Self {
        self.token_usage = TokenUsage::new(input, output);
        self
    }

    fn into_assistant_message(self) -> AssistantMessage {
        let content = if self.text.is_empty() {
            vec![]
        } else {
            vec![Content::text(self.text)]
        };
        AssistantMessage::new(content, self.tool_calls)
    }
}

/// Mock model client for testing
///
/// Returns predefined responses in sequence and records the messages it was given.
#[derive(Debug, Default)]
pub struct MockModelClient {
    responses: Arc<RwLock<Vec<MockModelResponse>>>,
    call_index: Arc<RwLock<usize>>,
    call_log: Arc<RwLock<Vec<Vec<Message>>>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with all responses queued
    pub fn with_responses(responses: Vec<MockModelResponse>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses)),
            ..Self::default()
        }
    }

    /// Add a response to the queue
    pub async fn add_response(&self, response: MockModelResponse) {
        self.responses.write().await.push(response);
    }

    /// Filtered messages of every call so far
    pub async fn calls(&self) -> Vec<Vec<Message>> {
        self.call_log.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.read().await.len()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn execute_chat_request(
        &self,
        _execution: &AgentExecutionContext,
        context: AgentContext,
        memory: &RuntimeMemory,
    ) -> Result<ChatResponse> {
        self.call_log.write().await.push(memory.filtered_messages());

        let mut index = self.call_index.write().await;
        let response = self
            .responses
            .read()
            .await
            .get(*index)
            .cloned()
            .unwrap_or_else(|| MockModelResponse::text("Mock response (no more responses configured)"));
        *index += 1;
        drop(index);

        let metrics = context.metrics().record_model_call(response.token_usage);
        let raw_response = json!({
            "text": response.text,
            "toolCalls": response.tool_calls,
        });

        Ok(ChatResponse {
            agent_context: context.with_metrics(metrics),
            assistant_message: response.into_assistant_message(),
            raw_response: Some(raw_response),
        })
    }
}

// ============================================================================
// FailingModelClient - Always returns an error
// ============================================================================

/// Model client that always fails
///
/// Useful for testing error propagation.
#[derive(Debug, Clone)]
pub struct FailingModelClient {
    error_message: String,
}

impl FailingModelClient {
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
        }
    }
}

impl Default for FailingModelClient {
    fn default() -> Self {
        Self::new("Model call failed")
    }
}

#[async_trait]
impl ModelClient for FailingModelClient {
    async fn execute_chat_request(
        &self,
        _execution: &AgentExecutionContext,
        _context: AgentContext,
        _memory: &RuntimeMemory,
    ) -> Result<ChatResponse> {
        Err(AgentError::model(self.error_message.clone()))
    }
}

// ============================================================================
// StaticToolSchemaResolver - Returns a fixed schema
// ============================================================================

#[derive(Debug, Default)]
pub struct StaticToolSchemaResolver {
    schema: std::sync::RwLock<ToolSchema>,
    resolve_count: AtomicUsize,
}

impl StaticToolSchemaResolver {
    pub fn new(schema: ToolSchema) -> Self {
        Self {
            schema: std::sync::RwLock::new(schema),
            resolve_count: AtomicUsize::new(0),
        }
    }

    pub fn with_tools(tool_definitions: Vec<ToolDefinition>) -> Self {
        Self::new(ToolSchema::new(tool_definitions, vec![]))
    }

    /// Replace the schema, e.g. to simulate a redeployment
    pub fn set_schema(&self, schema: ToolSchema) {
        if let Ok(mut current) = self.schema.write() {
            *current = schema;
        }
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSchemaResolver for StaticToolSchemaResolver {
    async fn resolve_schema(&self, _execution: &AgentExecutionContext) -> Result<ToolSchema> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        self.schema
            .read()
            .map(|schema| schema.clone())
            .map_err(|_| AgentError::Internal(anyhow::anyhow!("tool schema lock poisoned")))
    }
}

// ============================================================================
// InMemoryDocumentStore - Stores documents in memory
// ============================================================================

/// In-memory document store
///
/// Records creation requests and deletions; deletes can be made to fail per document.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    creation_requests: Arc<RwLock<Vec<DocumentCreationRequest>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    failing_deletes: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn creation_requests(&self) -> Vec<DocumentCreationRequest> {
        self.creation_requests.read().await.clone()
    }

    /// Ids of successfully deleted documents, in deletion order
    pub async fn deleted_ids(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Make every delete of this document fail
    pub async fn fail_deletes_for(&self, document_id: &str) {
        self.failing_deletes.write().await.insert(document_id.to_string());
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, request: DocumentCreationRequest) -> Result<DocumentReference> {
        let reference = DocumentReference::new(Uuid::new_v4().to_string())
            .with_content_type(request.content_type.clone())
            .with_file_name(request.file_name.clone());

        self.documents
            .write()
            .await
            .insert(reference.document_id.clone(), request.content.clone());
        self.creation_requests.write().await.push(request);

        Ok(reference)
    }

    async fn read_document(&self, reference: &DocumentReference) -> Result<Vec<u8>> {
        self.documents
            .read()
            .await
            .get(&reference.document_id)
            .cloned()
            .ok_or_else(|| AgentError::store(format!("Document '{}' not found", reference.document_id)))
    }

    async fn delete_document(&self, reference: &DocumentReference) -> Result<()> {
        if self.failing_deletes.read().await.contains(&reference.document_id) {
            return Err(AgentError::store(format!(
                "Failed to delete document '{}'",
                reference.document_id
            )));
        }

        self.documents.write().await.remove(&reference.document_id);
        self.deleted.write().await.push(reference.document_id.clone());
        Ok(())
    }
}

// ============================================================================
// RecordingGatewayToolHandler - Identity handler that records invocations
// ============================================================================

/// Gateway handler of an arbitrary type that changes nothing
///
/// Records the name of every operation it was asked to perform.
#[derive(Debug, Default)]
pub struct RecordingGatewayToolHandler {
    gateway_type: String,
    invocations: Mutex<Vec<String>>,
}

impl RecordingGatewayToolHandler {
    pub fn new(gateway_type: impl Into<String>) -> Self {
        Self {
            gateway_type: gateway_type.into(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .map(|invocations| invocations.clone())
            .unwrap_or_default()
    }

    fn record(&self, operation: &str) {
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(operation.to_string());
        }
    }
}

impl GatewayToolHandler for RecordingGatewayToolHandler {
    fn gateway_type(&self) -> &str {
        &self.gateway_type
    }

    fn is_gateway_managed(&self, _tool_name: &str) -> bool {
        false
    }

    fn initiate_tool_discovery(
        &self,
        context: AgentContext,
        _gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> Result<GatewayToolDiscoveryInitiationResult> {
        self.record("initiate_tool_discovery");
        Ok(GatewayToolDiscoveryInitiationResult {
            agent_context: context,
            tool_discovery_tool_calls: vec![],
        })
    }

    fn all_tool_discovery_results_present(
        &self,
        _context: &AgentContext,
        _results: &[ToolCallResult],
    ) -> bool {
        self.record("all_tool_discovery_results_present");
        true
    }

    fn handles_tool_discovery_result(&self, _result: &ToolCallResult) -> bool {
        false
    }

    fn handle_tool_discovery_results(
        &self,
        _context: &AgentContext,
        _results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>> {
        self.record("handle_tool_discovery_results");
        Ok(vec![])
    }

    fn resolve_updated_gateway_tool_definitions(
        &self,
        _context: &AgentContext,
        _gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates {
        self.record("resolve_updated_gateway_tool_definitions");
        GatewayToolDefinitionUpdates::default()
    }

    fn transform_tool_calls(&self, _context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        self.record("transform_tool_calls");
        tool_calls
    }

    fn transform_tool_call_results(
        &self,
        _context: &AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<Vec<ToolCallResult>> {
        self.record("transform_tool_call_results");
        Ok(results)
    }
}
