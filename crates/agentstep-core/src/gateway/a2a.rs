// A2A client gateway
//
// Each A2A client element represents one remote agent. Discovery fetches the agent
// card, which becomes a single `A2A_<element>` tool; calls to it are sent to the
// element as `sendMessage` operations.

use serde_json::{json, Map, Value};

use super::{
    diff_element_names, element_names, GatewayToolDefinitionUpdates, GatewayToolDiscoveryInitiationResult,
    GatewayToolHandler,
};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::tool_types::{GatewayToolDefinition, ToolCall, ToolCallResult, ToolDefinition};

pub const GATEWAY_TYPE: &str = "a2aClient";
pub const PROPERTY_A2A_CLIENTS: &str = "a2aClients";

const A2A_PREFIX: &str = "A2A_";
const A2A_TOOLS_DISCOVERY_PREFIX: &str = "A2A_fetchAgentCard_";

fn tool_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "The message to send to the remote agent."
            },
            "contextId": {
                "type": "string",
                "description": "Context id returned by a previous interaction, to continue that conversation."
            },
            "taskId": {
                "type": "string",
                "description": "Task id returned by a previous interaction, to continue that task."
            }
        },
        "required": ["text"]
    })
}

#[derive(Debug, Default)]
pub struct A2aGatewayToolHandler;

impl A2aGatewayToolHandler {
    pub fn new() -> Self {
        Self
    }

    fn tool_definition_from_agent_card(&self, result: &ToolCallResult) -> Result<ToolDefinition> {
        if !result.content.is_object() {
            return Err(AgentError::gateway(format!(
                "Tool call result content for A2A client tool discovery of '{}' is not an object",
                result.name
            )));
        }

        let agent_card = serde_json::to_string(&result.content)?;
        Ok(ToolDefinition::new(
            format!("{}{}", A2A_PREFIX, result.name),
            format!(
                "This tool allows interaction with the remote agent represented by the following agent card:\n{}",
                agent_card
            ),
            tool_input_schema(),
        ))
    }
}

impl GatewayToolHandler for A2aGatewayToolHandler {
    fn gateway_type(&self) -> &str {
        GATEWAY_TYPE
    }

    fn is_gateway_managed(&self, tool_name: &str) -> bool {
        tool_name
            .strip_prefix(A2A_PREFIX)
            .is_some_and(|element| !element.is_empty())
    }

    fn initiate_tool_discovery(
        &self,
        context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> Result<GatewayToolDiscoveryInitiationResult> {
        let clients: Vec<&str> = gateway_tool_definitions
            .iter()
            .filter(|definition| definition.gateway_type == GATEWAY_TYPE)
            .map(|definition| definition.name.as_str())
            .collect();

        if clients.is_empty() {
            return Ok(GatewayToolDiscoveryInitiationResult {
                agent_context: context,
                tool_discovery_tool_calls: vec![],
            });
        }

        let mut fetch_agent_card = Map::new();
        fetch_agent_card.insert("operation".to_string(), json!("fetchAgentCard"));

        let tool_discovery_tool_calls = clients
            .iter()
            .map(|client| {
                ToolCall::new(
                    format!("{}{}", A2A_TOOLS_DISCOVERY_PREFIX, client),
                    *client,
                    fetch_agent_card.clone(),
                )
            })
            .collect();

        Ok(GatewayToolDiscoveryInitiationResult {
            agent_context: context.with_property(PROPERTY_A2A_CLIENTS, json!(clients)),
            tool_discovery_tool_calls,
        })
    }

    fn all_tool_discovery_results_present(
        &self,
        context: &AgentContext,
        results: &[ToolCallResult],
    ) -> bool {
        element_names(context, PROPERTY_A2A_CLIENTS)
            .iter()
            .all(|client| {
                let id = format!("{}{}", A2A_TOOLS_DISCOVERY_PREFIX, client);
                results.iter().any(|result| result.id == id)
            })
    }

    fn handles_tool_discovery_result(&self, result: &ToolCallResult) -> bool {
        result.id.starts_with(A2A_TOOLS_DISCOVERY_PREFIX)
    }

    fn handle_tool_discovery_results(
        &self,
        _context: &AgentContext,
        results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>> {
        results
            .iter()
            .map(|result| self.tool_definition_from_agent_card(result))
            .collect()
    }

    fn resolve_updated_gateway_tool_definitions(
        &self,
        context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates {
        diff_element_names(
            &element_names(context, PROPERTY_A2A_CLIENTS),
            GATEWAY_TYPE,
            gateway_tool_definitions,
        )
    }

    fn transform_tool_calls(&self, _context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        tool_calls
            .into_iter()
            .map(|call| {
                let element = match call.name.strip_prefix(A2A_PREFIX) {
                    Some(element) if !element.is_empty() => element.to_string(),
                    _ => return call,
                };

                let mut arguments = Map::new();
                arguments.insert("operation".to_string(), json!("sendMessage"));
                arguments.insert("params".to_string(), Value::Object(call.arguments));
                ToolCall::new(call.id, element, arguments)
            })
            .collect()
    }

    fn transform_tool_call_results(
        &self,
        context: &AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<Vec<ToolCallResult>> {
        let clients = element_names(context, PROPERTY_A2A_CLIENTS);
        Ok(results
            .into_iter()
            .map(|result| {
                if clients.contains(&result.name) {
                    let name = format!("{}{}", A2A_PREFIX, result.name);
                    result.with_name(name)
                } else {
                    result
                }
            })
            .collect())
    }
}
