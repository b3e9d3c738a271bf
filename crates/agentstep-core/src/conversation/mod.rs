// Conversation stores
//
// A conversation store persists the full message history of an agent between
// steps. The storage kind is chosen by the memory configuration; the agent
// context only carries the store-specific pointer.

mod document;
mod in_process;

pub use document::DocumentConversationStore;
pub use in_process::InProcessConversationStore;

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::execution::AgentExecutionContext;
use crate::traits::{ConversationStore, DocumentStore};

/// Conversation stores keyed by storage kind
#[derive(Clone)]
pub struct ConversationStoreRegistry {
    stores: HashMap<&'static str, Arc<dyn ConversationStore>>,
}

impl ConversationStoreRegistry {
    /// Registry with the in-process store only
    pub fn new() -> Self {
        let mut registry = Self {
            stores: HashMap::new(),
        };
        registry.register(Arc::new(InProcessConversationStore::new()));
        registry
    }

    /// Registry with the in-process store and a document store backed by `documents`
    pub fn with_document_store(documents: Arc<dyn DocumentStore>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocumentConversationStore::new(documents)));
        registry
    }

    /// Register a store, replacing any store of the same kind
    pub fn register(&mut self, store: Arc<dyn ConversationStore>) {
        self.stores.insert(store.kind(), store);
    }

    /// Store for the configured storage kind.
    ///
    /// Fails when the context already points at a conversation of another kind.
    pub fn get_conversation_store(
        &self,
        execution: &AgentExecutionContext,
        context: &AgentContext,
    ) -> Result<Arc<dyn ConversationStore>> {
        let kind = execution.config.storage().kind();
        let store = self.stores.get(kind).cloned().ok_or_else(|| {
            AgentError::config(format!("No conversation store registered for type '{}'", kind))
        })?;

        if let Some(conversation) = context.conversation() {
            if conversation.kind() != kind {
                return Err(AgentError::config(format!(
                    "Conversation store '{}' does not support conversation context of type '{}'",
                    kind,
                    conversation.kind()
                )));
            }
        }

        Ok(store)
    }
}

impl Default for ConversationStoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversationStoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.stores.keys().collect();
        kinds.sort();
        f.debug_struct("ConversationStoreRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
