// Database models (internal, may differ from core types)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Conversation documents
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub properties: sqlx::types::JsonValue,
    pub process_definition_id: Option<String>,
    pub process_instance_key: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocumentRow {
    pub id: Uuid,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub properties: serde_json::Value,
    pub process_definition_id: Option<String>,
    pub process_instance_key: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}
