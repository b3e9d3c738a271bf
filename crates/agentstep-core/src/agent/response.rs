use serde_json::Value;

use crate::config::{ResponseConfig, ResponseFormat};
use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::execution::AgentExecutionContext;
use crate::message::AssistantMessage;
use crate::step::AgentResponse;
use crate::tool_types::{ToolCall, ToolCallVariable};

/// Shape the assistant message into the configured response
pub fn create_response(
    execution: &AgentExecutionContext,
    context: AgentContext,
    assistant_message: &AssistantMessage,
    tool_calls: Vec<ToolCall>,
) -> Result<AgentResponse> {
    let default_config = ResponseConfig::default();
    let config = execution.config.response.as_ref().unwrap_or(&default_config);

    let mut response = AgentResponse::new(
        context,
        tool_calls.into_iter().map(ToolCallVariable::from).collect(),
    );

    if config.include_assistant_message {
        response.response_message = Some(assistant_message.clone());
    }

    let text = assistant_message.text();
    match &config.format {
        ResponseFormat::Text { parse_json } => {
            if *parse_json {
                response.response_json = text.as_deref().and_then(parse_json_lenient);
            }
            response.response_text = text;
        }
        ResponseFormat::Json { .. } => {
            let text = text.unwrap_or_default();
            let json = serde_json::from_str::<Value>(strip_code_fence(&text)).map_err(|e| {
                AgentError::domain(
                    ErrorCode::FailedToParseResponseContent,
                    format!("Failed to parse response content as JSON: {}", e),
                )
            })?;
            response.response_json = Some(json);
        }
    }

    Ok(response)
}

fn parse_json_lenient(text: &str) -> Option<Value> {
    match serde_json::from_str(strip_code_fence(text)) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse response text as JSON");
            None
        }
    }
}

/// Models often wrap JSON in a markdown code block
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
