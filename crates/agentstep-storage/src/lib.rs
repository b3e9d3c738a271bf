// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - DbDocumentStore: implements DocumentStore for conversation documents

pub mod document_store;
pub mod models;
pub mod repositories;

pub use document_store::{create_db_document_store, DbDocumentStore};
pub use models::*;
pub use repositories::*;
