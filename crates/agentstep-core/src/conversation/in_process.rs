// In-process conversation store
//
// Keeps the whole history inside the agent context. Simple, but the context grows
// with every step.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::{AgentContext, ConversationContext};
use crate::error::{AgentError, Result};
use crate::execution::AgentExecutionContext;
use crate::runtime_memory::RuntimeMemory;
use crate::traits::ConversationStore;

pub const KIND: &str = "in-process";

#[derive(Debug, Default)]
pub struct InProcessConversationStore;

impl InProcessConversationStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversationStore for InProcessConversationStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    async fn load_into_runtime_memory(
        &self,
        _execution: &AgentExecutionContext,
        context: &AgentContext,
        memory: &mut RuntimeMemory,
    ) -> Result<()> {
        match context.conversation() {
            None => Ok(()),
            Some(ConversationContext::InProcess { messages, .. }) => {
                memory.load_history(messages.iter().cloned());
                Ok(())
            }
            Some(other) => Err(AgentError::store(format!(
                "Unsupported conversation context of type '{}'",
                other.kind()
            ))),
        }
    }

    async fn store_from_runtime_memory(
        &self,
        _execution: &AgentExecutionContext,
        context: AgentContext,
        memory: &RuntimeMemory,
    ) -> Result<AgentContext> {
        let conversation_id = context
            .conversation()
            .map(|conversation| conversation.conversation_id().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(context.with_conversation(ConversationContext::InProcess {
            conversation_id,
            messages: memory.all_messages().to_vec(),
        }))
    }
}
