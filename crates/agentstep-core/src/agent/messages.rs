// Message assembly
//
// Adds the system prompt and the request content (user prompt or tool call results)
// to the runtime memory, checking that the agent state allows it.

use std::sync::Arc;

use crate::config::PromptTemplate;
use crate::context::{AgentContext, AgentState};
use crate::error::{AgentError, ErrorCode, Result};
use crate::execution::AgentExecutionContext;
use crate::gateway::GatewayToolHandlerRegistry;
use crate::message::{Content, Message, UserMessage};
use crate::runtime_memory::RuntimeMemory;
use crate::tool_types::ToolCallResult;

pub struct AgentMessagesHandler {
    gateway_registry: Arc<GatewayToolHandlerRegistry>,
}

impl AgentMessagesHandler {
    pub fn new(gateway_registry: Arc<GatewayToolHandlerRegistry>) -> Self {
        Self { gateway_registry }
    }

    /// Render and add the configured system prompt; blank prompts are skipped
    pub fn add_system_message(
        &self,
        execution: &AgentExecutionContext,
        _context: &AgentContext,
        memory: &mut RuntimeMemory,
    ) -> Result<()> {
        let Some(config) = execution.config.system_prompt.as_ref() else {
            return Ok(());
        };
        let Some(prompt) = config.prompt.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Ok(());
        };

        let text = PromptTemplate::new(prompt).render(&config.parameters)?;
        memory.add_message(Message::system(text));
        Ok(())
    }

    /// Add the request content and return exactly the messages added
    pub fn add_user_messages(
        &self,
        execution: &AgentExecutionContext,
        context: &AgentContext,
        memory: &mut RuntimeMemory,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<Vec<Message>> {
        if !tool_call_results.is_empty() && context.conversation().is_none() {
            return Err(AgentError::domain(
                ErrorCode::ToolCallResultsOnEmptyContext,
                "Agent received tool call results, but the agent context was empty (no previous conversation)",
            ));
        }

        let messages = match context.state() {
            AgentState::WaitingForToolInput => self
                .tool_call_result_message(context, memory, tool_call_results)?
                .into_iter()
                .collect(),
            AgentState::Ready => vec![self.user_prompt_message(execution)?],
            state => {
                return Err(AgentError::domain(
                    ErrorCode::InInvalidState,
                    format!(
                        "Agent is in invalid state '{}', not ready to add user messages",
                        state
                    ),
                ))
            }
        };

        memory.add_messages(messages.iter().cloned());
        Ok(messages)
    }

    fn tool_call_result_message(
        &self,
        context: &AgentContext,
        memory: &RuntimeMemory,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<Option<Message>> {
        if tool_call_results.is_empty() {
            return Err(AgentError::domain(
                ErrorCode::WaitingForToolInputEmptyResults,
                "Agent is waiting for tool input, but tool call results were empty. Is the tool feedback loop configured correctly?",
            ));
        }

        let results = self
            .gateway_registry
            .transform_tool_call_results(context, tool_call_results)?;

        let requested = requested_tool_call_ids(memory);
        let pending = requested
            .iter()
            .filter(|id| !results.iter().any(|result| result.id == **id))
            .count();
        if pending > 0 {
            tracing::debug!(
                requested = requested.len(),
                pending,
                "Waiting for remaining tool call results"
            );
            return Ok(None);
        }

        let results = order_by_requested_tool_calls(&requested, results);

        tracing::debug!(tool_call_results = results.len(), "Adding tool call results");
        Ok(Some(Message::tool_call_results(results).with_timestamp()))
    }

    fn user_prompt_message(&self, execution: &AgentExecutionContext) -> Result<Message> {
        let mut content = Vec::new();

        if let Some(config) = execution.config.user_prompt.as_ref() {
            if let Some(prompt) = config.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
                content.push(Content::text(PromptTemplate::new(prompt).render(&config.parameters)?));
            }
            content.extend(config.documents.iter().cloned().map(Content::document));
        }

        if content.is_empty() {
            return Err(AgentError::domain(
                ErrorCode::NoUserMessageContent,
                "Agent cannot proceed as no user message content (user message, tool call results) is left to add.",
            ));
        }

        Ok(Message::User(UserMessage {
            content,
            ..Default::default()
        })
        .with_timestamp())
    }
}

/// Tool call ids of the last assistant message
fn requested_tool_call_ids(memory: &RuntimeMemory) -> Vec<String> {
    memory
        .all_messages()
        .iter()
        .rev()
        .find_map(|message| match message {
            Message::Assistant(assistant) => Some(
                assistant
                    .tool_calls
                    .iter()
                    .map(|call| call.id.clone())
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

/// Order results like the requested tool calls; unknown ids go last
fn order_by_requested_tool_calls(requested: &[String], results: Vec<ToolCallResult>) -> Vec<ToolCallResult> {
    let (mut ordered, unknown): (Vec<_>, Vec<_>) = results
        .into_iter()
        .partition(|result| requested.contains(&result.id));
    ordered.sort_by_key(|result| requested.iter().position(|id| *id == result.id));
    ordered.extend(unknown);
    ordered
}
