// Database-backed DocumentStore implementation
//
// Conversation documents are written once and never updated: every store of
// the conversation creates a new row, and old rows are deleted by the
// document conversation store once they fall out of retention.

use agentstep_core::{traits::DocumentStore, AgentError, DocumentCreationRequest, DocumentReference, Result};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{CreateDocumentRow, DocumentRow};
use crate::repositories::Database;

// ============================================================================
// DbDocumentStore - Stores documents in database
// ============================================================================

/// Database-backed document store
#[derive(Clone)]
pub struct DbDocumentStore {
    db: Database,
}

impl DbDocumentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for DbDocumentStore {
    async fn create_document(&self, request: DocumentCreationRequest) -> Result<DocumentReference> {
        let row = self
            .db
            .create_document(create_row(Uuid::now_v7(), request))
            .await
            .map_err(|e| AgentError::store(e.to_string()))?;

        tracing::debug!(
            document_id = %row.id,
            size = row.content.len(),
            "Created conversation document"
        );

        Ok(reference_from_row(&row))
    }

    async fn read_document(&self, reference: &DocumentReference) -> Result<Vec<u8>> {
        let id = parse_document_id(reference)?;
        let row = self
            .db
            .get_document(id)
            .await
            .map_err(|e| AgentError::store(e.to_string()))?
            .ok_or_else(|| AgentError::store(format!("Document '{}' not found", reference.document_id)))?;

        Ok(row.content)
    }

    async fn delete_document(&self, reference: &DocumentReference) -> Result<()> {
        let id = parse_document_id(reference)?;
        let deleted = self
            .db
            .delete_document(id)
            .await
            .map_err(|e| AgentError::store(e.to_string()))?;

        if !deleted {
            tracing::debug!(document_id = %id, "Document was already deleted");
        }
        Ok(())
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn create_row(id: Uuid, request: DocumentCreationRequest) -> CreateDocumentRow {
    CreateDocumentRow {
        id,
        content: request.content,
        content_type: Some(request.content_type),
        file_name: Some(request.file_name),
        properties: Value::Object(request.properties),
        process_definition_id: request.process_definition_id,
        process_instance_key: request.process_instance_key,
        expires_at: request.expires_at,
    }
}

fn reference_from_row(row: &DocumentRow) -> DocumentReference {
    let mut reference = DocumentReference::new(row.id.to_string());
    reference.content_type = row.content_type.clone();
    reference.file_name = row.file_name.clone();
    reference
}

fn parse_document_id(reference: &DocumentReference) -> Result<Uuid> {
    Uuid::parse_str(&reference.document_id)
        .map_err(|_| AgentError::store(format!("Invalid document id '{}'", reference.document_id)))
}

/// Create a database-backed document store
pub fn create_db_document_store(db: Database) -> DbDocumentStore {
    DbDocumentStore::new(db)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_row_from_request() {
        let mut request = DocumentCreationRequest::json(b"{\"messages\":[]}".to_vec(), "agent_conversation.json");
        request.properties.insert("conversationId".to_string(), json!("c1"));
        request.process_definition_id = Some("order-process".to_string());
        request.process_instance_key = Some(42);

        let id = Uuid::now_v7();
        let row = create_row(id, request);

        assert_eq!(row.id, id);
        assert_eq!(row.content_type.as_deref(), Some("application/json"));
        assert_eq!(row.file_name.as_deref(), Some("agent_conversation.json"));
        assert_eq!(row.properties, json!({"conversationId": "c1"}));
        assert_eq!(row.process_definition_id.as_deref(), Some("order-process"));
        assert_eq!(row.process_instance_key, Some(42));
        assert!(row.expires_at.is_none());
    }

    #[test]
    fn test_reference_from_row() {
        let row = DocumentRow {
            id: Uuid::now_v7(),
            content: vec![],
            content_type: Some("application/json".to_string()),
            file_name: None,
            properties: json!({}),
            process_definition_id: None,
            process_instance_key: None,
            expires_at: None,
            created_at: Utc::now(),
        };

        let reference = reference_from_row(&row);

        assert_eq!(reference.document_id, row.id.to_string());
        assert_eq!(reference.content_type.as_deref(), Some("application/json"));
        assert!(reference.file_name.is_none());
    }

    #[test]
    fn test_invalid_document_id() {
        let err = parse_document_id(&DocumentReference::new("not-a-uuid")).unwrap_err();

        assert!(matches!(err, AgentError::ConversationStore(_)));
        assert_eq!(
            err.to_string(),
            "Conversation store error: Invalid document id 'not-a-uuid'"
        );
    }
}
