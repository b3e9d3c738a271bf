// Step outcome
//
// AgentResponse is the shaped result of one step; AgentStepCompletion is what the
// dispatcher consumes: a variable bag to persist plus the two control flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::AgentContext;
use crate::error::Result;
use crate::message::AssistantMessage;
use crate::tool_types::ToolCallVariable;

pub const VARIABLE_AGENT: &str = "agent";
pub const VARIABLE_AGENT_CONTEXT: &str = "agentContext";
pub const VARIABLE_TOOL_CALL_RESULTS: &str = "toolCallResults";

/// Result of one agent step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub context: AgentContext,
    /// Tool calls the dispatcher must activate next
    #[serde(default)]
    pub tool_calls: Vec<ToolCallVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<AssistantMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json: Option<Value>,
}

impl AgentResponse {
    /// Response carrying only a context and tool calls (no model output)
    pub fn new(context: AgentContext, tool_calls: Vec<ToolCallVariable>) -> Self {
        Self {
            context,
            tool_calls,
            response_message: None,
            response_text: None,
            response_json: None,
        }
    }
}

/// What the dispatcher receives for one step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentStepCompletion {
    pub variables: Map<String, Value>,
    /// True only when the step produced a final answer with no outstanding tool calls
    pub completion_condition_fulfilled: bool,
    /// True when an in-flight tool call was cancelled and its siblings should be too
    pub cancel_remaining_instances: bool,
    pub agent_response: Option<AgentResponse>,
}

impl AgentStepCompletion {
    pub fn from_response(response: AgentResponse, cancel_remaining_instances: bool) -> Result<Self> {
        let completion_condition_fulfilled = response.tool_calls.is_empty();

        let mut variables = Map::new();
        if completion_condition_fulfilled {
            variables.insert(VARIABLE_AGENT.to_string(), serde_json::to_value(&response)?);
        } else {
            variables.insert(
                VARIABLE_AGENT_CONTEXT.to_string(),
                serde_json::to_value(&response.context)?,
            );
            variables.insert(VARIABLE_TOOL_CALL_RESULTS.to_string(), Value::Array(vec![]));
        }

        Ok(Self {
            variables,
            completion_condition_fulfilled,
            cancel_remaining_instances,
            agent_response: Some(response),
        })
    }

    /// Completion with nothing to persist or dispatch
    pub fn without_response() -> Self {
        Self::default()
    }

    pub fn tool_calls(&self) -> &[ToolCallVariable] {
        self.agent_response
            .as_ref()
            .map(|response| response.tool_calls.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AgentState;
    use crate::tool_types::ToolCall;

    #[test]
    fn test_fulfilled_completion() {
        let response = AgentResponse {
            response_text: Some("A haiku".to_string()),
            ..AgentResponse::new(AgentContext::empty().with_state(AgentState::Ready), vec![])
        };

        let completion = AgentStepCompletion::from_response(response, false).unwrap();

        assert!(completion.completion_condition_fulfilled);
        assert!(!completion.cancel_remaining_instances);
        assert_eq!(completion.variables[VARIABLE_AGENT]["responseText"], "A haiku");
        assert_eq!(completion.variables[VARIABLE_AGENT]["context"]["state"], "READY");
        assert!(!completion.variables.contains_key(VARIABLE_AGENT_CONTEXT));
    }

    #[test]
    fn test_completion_with_tool_calls() {
        let response = AgentResponse::new(
            AgentContext::empty().with_state(AgentState::WaitingForToolInput),
            vec![ToolCall::new("1", "getWeather", Map::new()).into()],
        );

        let completion = AgentStepCompletion::from_response(response, true).unwrap();

        assert!(!completion.completion_condition_fulfilled);
        assert!(completion.cancel_remaining_instances);
        assert_eq!(
            completion.variables[VARIABLE_AGENT_CONTEXT]["state"],
            "WAITING_FOR_TOOL_INPUT"
        );
        assert_eq!(completion.variables[VARIABLE_TOOL_CALL_RESULTS], Value::Array(vec![]));
        assert_eq!(completion.tool_calls()[0].metadata.name, "getWeather");
    }

    #[test]
    fn test_without_response() {
        let completion = AgentStepCompletion::without_response();

        assert!(completion.variables.is_empty());
        assert!(!completion.completion_condition_fulfilled);
        assert!(!completion.cancel_remaining_instances);
        assert!(completion.tool_calls().is_empty());
    }
}
