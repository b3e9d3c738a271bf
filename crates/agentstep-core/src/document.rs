// Document types
//
// Documents are opaque binary blobs managed by a DocumentStore. They appear in two
// places: attached to user prompts and as the backing storage of document-based
// conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    /// Store-specific document identifier
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl DocumentReference {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Request to create a new document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCreationRequest {
    pub content: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
    pub process_definition_id: Option<String>,
    pub process_instance_key: Option<i64>,
    pub properties: Map<String, Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DocumentCreationRequest {
    /// Create a JSON document request
    pub fn json(content: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            content,
            content_type: "application/json".to_string(),
            file_name: file_name.into(),
            process_definition_id: None,
            process_instance_key: None,
            properties: Map::new(),
            expires_at: None,
        }
    }
}
