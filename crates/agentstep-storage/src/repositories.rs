// Repository layer for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Conversation documents
    // ============================================

    pub async fn create_document(&self, input: CreateDocumentRow) -> Result<DocumentRow> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO agent_conversation_documents
                (id, content, content_type, file_name, properties, process_definition_id, process_instance_key, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, content, content_type, file_name, properties, process_definition_id, process_instance_key, expires_at, created_at
            "#,
        )
        .bind(input.id)
        .bind(&input.content)
        .bind(&input.content_type)
        .bind(&input.file_name)
        .bind(&input.properties)
        .bind(&input.process_definition_id)
        .bind(input.process_instance_key)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Get a document unless it has expired
    pub async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, content, content_type, file_name, properties, process_definition_id, process_instance_key, expires_at, created_at
            FROM agent_conversation_documents
            WHERE id = $1 AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agent_conversation_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove all expired documents, returning how many were deleted
    pub async fn delete_expired_documents(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM agent_conversation_documents WHERE expires_at IS NOT NULL AND expires_at <= NOW()",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
