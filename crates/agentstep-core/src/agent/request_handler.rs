// Agent request handler
//
// Runs a single agent step end to end. The step either short-circuits during
// initialization (gateway tool discovery), completes silently when there is
// nothing left to process, or calls the model once and persists the outcome.

use std::sync::Arc;

use crate::agent::initializer::{AgentInitializationResult, AgentInitializer};
use crate::agent::limits::validate_configured_limits;
use crate::agent::messages::AgentMessagesHandler;
use crate::agent::response::create_response;
use crate::context::{AgentContext, AgentState};
use crate::conversation::ConversationStoreRegistry;
use crate::error::{ErrorCode, Result};
use crate::execution::AgentExecutionContext;
use crate::gateway::GatewayToolHandlerRegistry;
use crate::message::Message;
use crate::runtime_memory::RuntimeMemory;
use crate::step::AgentStepCompletion;
use crate::tool_types::ToolCallResult;
use crate::traits::{ModelClient, ToolSchemaResolver};

pub struct AgentRequestHandler {
    initializer: AgentInitializer,
    messages_handler: AgentMessagesHandler,
    model_client: Arc<dyn ModelClient>,
    conversation_registry: Arc<ConversationStoreRegistry>,
    gateway_registry: Arc<GatewayToolHandlerRegistry>,
}

impl AgentRequestHandler {
    pub fn new(
        schema_resolver: Arc<dyn ToolSchemaResolver>,
        model_client: Arc<dyn ModelClient>,
        conversation_registry: Arc<ConversationStoreRegistry>,
        gateway_registry: Arc<GatewayToolHandlerRegistry>,
    ) -> Self {
        Self {
            initializer: AgentInitializer::new(schema_resolver, gateway_registry.clone()),
            messages_handler: AgentMessagesHandler::new(gateway_registry.clone()),
            model_client,
            conversation_registry,
            gateway_registry,
        }
    }

    /// Execute one agent step
    pub async fn handle_request(&self, execution: &AgentExecutionContext) -> Result<AgentStepCompletion> {
        let (context, tool_call_results) = match self.initializer.initialize_agent(execution).await? {
            AgentInitializationResult::Context {
                agent_context,
                tool_call_results,
            } => (agent_context, tool_call_results),
            AgentInitializationResult::Response(response) => {
                tracing::debug!(
                    element_id = %execution.element_id,
                    tool_calls = response.tool_calls.len(),
                    "Completing step with initialization response"
                );
                return AgentStepCompletion::from_response(response, false);
            }
            AgentInitializationResult::DiscoveryInProgress => {
                return Ok(AgentStepCompletion::without_response());
            }
        };

        validate_configured_limits(execution, &context)?;

        let store = self.conversation_registry.get_conversation_store(execution, &context)?;
        let mut memory = RuntimeMemory::new(execution.config.context_window_size());
        store.load_into_runtime_memory(execution, &context, &mut memory).await?;

        let cancel_remaining_instances = tool_call_results.iter().any(ToolCallResult::is_interrupted);

        self.messages_handler.add_system_message(execution, &context, &mut memory)?;
        let added = match self
            .messages_handler
            .add_user_messages(execution, &context, &mut memory, tool_call_results)
        {
            Ok(added) => added,
            Err(e) if e.code() == Some(ErrorCode::NoUserMessageContent) => {
                tracing::debug!(element_id = %execution.element_id, "No user message content left, completing silently");
                return Ok(AgentStepCompletion::without_response());
            }
            Err(e) => return Err(e),
        };
        if added.is_empty() {
            tracing::debug!(element_id = %execution.element_id, "No messages added, completing silently");
            return Ok(AgentStepCompletion::without_response());
        }

        let chat = self
            .model_client
            .execute_chat_request(execution, context, &memory)
            .await?;
        let assistant_message = chat.assistant_message;
        memory.add_message(Message::from(assistant_message.clone()));

        let tool_calls = self
            .gateway_registry
            .transform_tool_calls(&chat.agent_context, assistant_message.tool_calls.clone());
        let state = if tool_calls.is_empty() {
            AgentState::Ready
        } else {
            AgentState::WaitingForToolInput
        };

        let context = store
            .store_from_runtime_memory(execution, chat.agent_context.with_state(state), &memory)
            .await?;

        let response = create_response(execution, context, &assistant_message, tool_calls)?;
        let completion = AgentStepCompletion::from_response(response, cancel_remaining_instances)?;

        tracing::info!(
            element_id = %execution.element_id,
            process_instance_key = execution.process_instance_key,
            model_calls = completion
                .agent_response
                .as_ref()
                .map_or(0, |response| response.context.metrics().model_calls),
            tool_calls = completion.tool_calls().len(),
            completed = completion.completion_condition_fulfilled,
            "Agent step completed"
        );

        Ok(completion)
    }

    /// Roll back conversation state after the dispatcher failed to complete the step
    pub async fn compensate_failed_completion(
        &self,
        execution: &AgentExecutionContext,
        context: &AgentContext,
        error: &(dyn std::error::Error + Send + Sync),
    ) -> Result<()> {
        let store = self.conversation_registry.get_conversation_store(execution, context)?;
        tracing::debug!(
            element_id = %execution.element_id,
            store = store.kind(),
            error = %error,
            "Compensating failed job completion"
        );
        store.compensate_failed_job_completion(execution, context, error).await
    }
}
