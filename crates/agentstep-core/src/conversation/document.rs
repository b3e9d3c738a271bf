// Document conversation store
//
// Writes the full history as a JSON document on every step. The context keeps a
// reference to the current document plus a bounded list of previous ones, so a
// failed completion can be rolled back to the last committed document.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{DocumentStorageConfig, MemoryStorageConfig};
use crate::context::{AgentContext, ConversationContext};
use crate::document::{DocumentCreationRequest, DocumentReference};
use crate::error::{AgentError, Result};
use crate::execution::AgentExecutionContext;
use crate::message::Message;
use crate::runtime_memory::RuntimeMemory;
use crate::traits::{ConversationStore, DocumentStore};

pub const KIND: &str = "document";

const PROPERTY_CONVERSATION_ID: &str = "conversationId";

/// Persisted document content
#[derive(Debug, Serialize, Deserialize)]
struct ConversationDocument {
    messages: Vec<Message>,
}

pub struct DocumentConversationStore {
    documents: Arc<dyn DocumentStore>,
}

impl DocumentConversationStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    fn storage_config(execution: &AgentExecutionContext) -> DocumentStorageConfig {
        match execution.config.storage() {
            MemoryStorageConfig::Document(config) => config,
            MemoryStorageConfig::InProcess => DocumentStorageConfig::default(),
        }
    }

    fn creation_request(
        execution: &AgentExecutionContext,
        config: &DocumentStorageConfig,
        conversation_id: &str,
        content: Vec<u8>,
    ) -> Result<DocumentCreationRequest> {
        let mut request =
            DocumentCreationRequest::json(content, format!("{}_conversation.json", execution.element_id));

        request.properties = config.custom_properties.clone();
        request.properties.insert(
            PROPERTY_CONVERSATION_ID.to_string(),
            Value::String(conversation_id.to_string()),
        );
        if !execution.bpmn_process_id.is_empty() {
            request.process_definition_id = Some(execution.bpmn_process_id.clone());
        }
        request.process_instance_key = Some(execution.process_instance_key);
        request.expires_at = config.time_to_live.map(expires_at).transpose()?;

        Ok(request)
    }

    /// Delete the oldest documents beyond the retention size.
    ///
    /// Documents that fail to delete stay in the list.
    async fn purge_previous_documents(
        &self,
        previous_documents: Vec<DocumentReference>,
        retention_size: usize,
    ) -> Vec<DocumentReference> {
        let excess = previous_documents.len().saturating_sub(retention_size);
        let mut kept = Vec::with_capacity(previous_documents.len());

        for (index, document) in previous_documents.into_iter().enumerate() {
            if index >= excess {
                kept.push(document);
                continue;
            }

            match self.documents.delete_document(&document).await {
                Ok(()) => {
                    tracing::trace!(document_id = %document.document_id, "Purged previous conversation document");
                }
                Err(e) => {
                    tracing::warn!(
                        document_id = %document.document_id,
                        error = %e,
                        "Failed to purge previous conversation document"
                    );
                    kept.push(document);
                }
            }
        }

        kept
    }
}

fn expires_at(time_to_live: u64) -> Result<DateTime<Utc>> {
    i64::try_from(time_to_live)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| AgentError::config(format!("Invalid document time to live of {} seconds", time_to_live)))
}

impl std::fmt::Debug for DocumentConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentConversationStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ConversationStore for DocumentConversationStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    async fn load_into_runtime_memory(
        &self,
        _execution: &AgentExecutionContext,
        context: &AgentContext,
        memory: &mut RuntimeMemory,
    ) -> Result<()> {
        let document = match context.conversation() {
            None => return Ok(()),
            Some(ConversationContext::Document { document, .. }) => document,
            Some(other) => {
                return Err(AgentError::store(format!(
                    "Unsupported conversation context of type '{}'",
                    other.kind()
                )))
            }
        };

        let content = self.documents.read_document(document).await?;
        let conversation: ConversationDocument = serde_json::from_slice(&content).map_err(|e| {
            AgentError::store(format!(
                "Failed to read conversation document '{}': {}",
                document.document_id, e
            ))
        })?;

        memory.load_history(conversation.messages);
        Ok(())
    }

    async fn store_from_runtime_memory(
        &self,
        execution: &AgentExecutionContext,
        context: AgentContext,
        memory: &RuntimeMemory,
    ) -> Result<AgentContext> {
        let config = Self::storage_config(execution);

        let (conversation_id, mut previous_documents) = match context.conversation() {
            Some(ConversationContext::Document {
                conversation_id,
                document,
                previous_documents,
            }) => {
                let mut previous = previous_documents.clone();
                previous.push(document.clone());
                (conversation_id.clone(), previous)
            }
            _ => (Uuid::new_v4().to_string(), Vec::new()),
        };

        let content = serde_json::to_vec(&ConversationDocument {
            messages: memory.all_messages().to_vec(),
        })?;
        let request = Self::creation_request(execution, &config, &conversation_id, content)?;
        let document = self.documents.create_document(request).await?;

        tracing::debug!(
            conversation_id = %conversation_id,
            document_id = %document.document_id,
            messages = memory.len(),
            "Stored conversation document"
        );

        previous_documents = self
            .purge_previous_documents(previous_documents, config.retention_size())
            .await;

        Ok(context.with_conversation(ConversationContext::Document {
            conversation_id,
            document,
            previous_documents,
        }))
    }

    async fn compensate_failed_job_completion(
        &self,
        _execution: &AgentExecutionContext,
        context: &AgentContext,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> Result<()> {
        let Some(ConversationContext::Document { document, .. }) = context.conversation() else {
            return Ok(());
        };

        tracing::debug!(
            document_id = %document.document_id,
            error = %error,
            "Deleting conversation document of failed job completion"
        );

        if let Err(e) = self.documents.delete_document(document).await {
            tracing::warn!(
                document_id = %document.document_id,
                error = %e,
                "Failed to delete conversation document of failed job completion"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentExecutionConfigBuilder;
    use crate::memory::InMemoryDocumentStore;
    use serde_json::json;

    fn execution(config: DocumentStorageConfig) -> AgentExecutionContext {
        AgentExecutionContext::new(1, 42, "agent_task")
            .with_bpmn_process_id("order_process")
            .with_config(
                AgentExecutionConfigBuilder::new()
                    .storage(MemoryStorageConfig::Document(config))
                    .build(),
            )
    }

    fn memory_with(messages: &[&str]) -> RuntimeMemory {
        let mut memory = RuntimeMemory::default();
        memory.add_messages(messages.iter().map(|text| Message::user(*text)));
        memory
    }

    fn document_refs(context: &AgentContext) -> (String, Vec<String>) {
        match context.conversation() {
            Some(ConversationContext::Document {
                document,
                previous_documents,
                ..
            }) => (
                document.document_id.clone(),
                previous_documents
                    .iter()
                    .map(|d| d.document_id.clone())
                    .collect(),
            ),
            other => panic!("unexpected conversation {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_and_load_round_trip() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let mut custom_properties = serde_json::Map::new();
        custom_properties.insert("team".to_string(), json!("sales"));
        let execution = execution(DocumentStorageConfig {
            time_to_live: Some(3600),
            custom_properties,
            ..Default::default()
        });

        let memory = memory_with(&["Hi", "How are you?"]);
        let context = store
            .store_from_runtime_memory(&execution, AgentContext::empty(), &memory)
            .await
            .unwrap();

        let requests = documents.creation_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].file_name, "agent_task_conversation.json");
        assert_eq!(requests[0].content_type, "application/json");
        assert_eq!(requests[0].properties["team"], "sales");
        assert_eq!(
            requests[0].properties["conversationId"],
            json!(context.conversation().unwrap().conversation_id())
        );
        assert_eq!(requests[0].process_definition_id.as_deref(), Some("order_process"));
        assert!(requests[0].expires_at.is_some());

        let mut loaded = RuntimeMemory::default();
        store
            .load_into_runtime_memory(&execution, &context, &mut loaded)
            .await
            .unwrap();
        assert_eq!(loaded.all_messages(), memory.all_messages());
    }

    #[tokio::test]
    async fn test_out_of_range_time_to_live_fails() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let execution = execution(DocumentStorageConfig {
            time_to_live: Some(u64::MAX / 2),
            ..Default::default()
        });

        let err = store
            .store_from_runtime_memory(&execution, AgentContext::empty(), &memory_with(&["Hi"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(crate::error::ErrorCode::ConfigurationError));
        assert!(documents.creation_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_previous_documents_are_purged() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let execution = execution(DocumentStorageConfig::default());
        let memory = memory_with(&["Hi"]);

        let mut context = AgentContext::empty();
        let mut created = Vec::new();
        for _ in 0..4 {
            context = store
                .store_from_runtime_memory(&execution, context, &memory)
                .await
                .unwrap();
            created.push(document_refs(&context).0);
        }

        let (current, previous) = document_refs(&context);
        assert_eq!(current, created[3]);
        assert_eq!(previous, vec![created[1].clone(), created[2].clone()]);
        assert_eq!(documents.deleted_ids().await, vec![created[0].clone()]);
    }

    #[tokio::test]
    async fn test_failed_purge_keeps_document() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let execution = execution(DocumentStorageConfig {
            previous_documents_retention_size: Some(1),
            ..Default::default()
        });
        let memory = memory_with(&["Hi"]);

        let first = store
            .store_from_runtime_memory(&execution, AgentContext::empty(), &memory)
            .await
            .unwrap();
        let first_id = document_refs(&first).0;
        documents.fail_deletes_for(&first_id).await;

        let second = store
            .store_from_runtime_memory(&execution, first, &memory)
            .await
            .unwrap();
        let third = store
            .store_from_runtime_memory(&execution, second.clone(), &memory)
            .await
            .unwrap();

        let (_, previous) = document_refs(&third);
        assert_eq!(previous, vec![first_id, document_refs(&second).0]);
    }

    #[tokio::test]
    async fn test_compensation_deletes_current_document() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let execution = execution(DocumentStorageConfig::default());

        let context = store
            .store_from_runtime_memory(&execution, AgentContext::empty(), &memory_with(&["Hi"]))
            .await
            .unwrap();
        let current = document_refs(&context).0;

        let error = AgentError::model("completion failed");
        store
            .compensate_failed_job_completion(&execution, &context, &error)
            .await
            .unwrap();

        assert_eq!(documents.deleted_ids().await, vec![current]);
    }

    #[tokio::test]
    async fn test_compensation_failure_is_tolerated() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let store = DocumentConversationStore::new(documents.clone());
        let execution = execution(DocumentStorageConfig::default());

        let context = store
            .store_from_runtime_memory(&execution, AgentContext::empty(), &memory_with(&["Hi"]))
            .await
            .unwrap();
        documents.fail_deletes_for(&document_refs(&context).0).await;

        let error = AgentError::model("completion failed");
        assert!(store
            .compensate_failed_job_completion(&execution, &context, &error)
            .await
            .is_ok());
    }
}
