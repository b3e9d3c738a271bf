// MCP client gateway
//
// Each MCP client element exposes the tools of one MCP server. Discovery calls
// `tools/list` on every client; discovered tools are exposed to the model as
// `MCP_<element>___<tool>` and routed back to the element as `tools/call`.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    diff_element_names, element_names, GatewayToolDefinitionUpdates, GatewayToolDiscoveryInitiationResult,
    GatewayToolHandler,
};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::tool_types::{GatewayToolDefinition, ToolCall, ToolCallResult, ToolDefinition};

pub const GATEWAY_TYPE: &str = "mcpClient";
pub const PROPERTY_MCP_CLIENTS: &str = "mcpClients";

const MCP_PREFIX: &str = "MCP_";
const MCP_TOOLS_DISCOVERY_PREFIX: &str = "MCP_toolsList_";
const SEPARATOR: &str = "___";

/// Split `MCP_<element>___<tool>` into element and tool name
fn parse_tool_name(tool_name: &str) -> Option<(&str, &str)> {
    let (element, tool) = tool_name.strip_prefix(MCP_PREFIX)?.split_once(SEPARATOR)?;
    if element.is_empty() || tool.is_empty() {
        return None;
    }
    Some((element, tool))
}

fn qualified_tool_name(element: &str, tool: &str) -> String {
    format!("{}{}{}{}", MCP_PREFIX, element, SEPARATOR, tool)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsResult {
    #[serde(default)]
    tool_definitions: Vec<ToolDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallToolResult {
    name: String,
    #[serde(default)]
    content: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct McpClientGatewayToolHandler;

impl McpClientGatewayToolHandler {
    pub fn new() -> Self {
        Self
    }

    fn tool_definitions_from_discovery_result(&self, result: &ToolCallResult) -> Result<Vec<ToolDefinition>> {
        let list_tools: ListToolsResult = serde_json::from_value(result.content.clone()).map_err(|e| {
            AgentError::gateway(format!(
                "Invalid MCP tool discovery result for client '{}': {}",
                result.name, e
            ))
        })?;

        Ok(list_tools
            .tool_definitions
            .into_iter()
            .map(|tool| ToolDefinition {
                name: qualified_tool_name(&result.name, &tool.name),
                ..tool
            })
            .collect())
    }

    fn tool_call_result_from_call_tool(&self, result: ToolCallResult) -> Result<ToolCallResult> {
        let call_tool: CallToolResult = serde_json::from_value(result.content.clone()).map_err(|e| {
            AgentError::gateway(format!(
                "Invalid MCP tool call result for client '{}': {}",
                result.name, e
            ))
        })?;

        let name = qualified_tool_name(&result.name, &call_tool.name);
        let single_text = match call_tool.content.as_slice() {
            [single] if single.get("type").and_then(Value::as_str) == Some("text") => {
                Some(single.get("text").cloned().unwrap_or(Value::Null))
            }
            _ => None,
        };
        let content = single_text.unwrap_or(Value::Array(call_tool.content));

        Ok(result.with_name(name).with_content(content))
    }
}

impl GatewayToolHandler for McpClientGatewayToolHandler {
    fn gateway_type(&self) -> &str {
        GATEWAY_TYPE
    }

    fn is_gateway_managed(&self, tool_name: &str) -> bool {
        parse_tool_name(tool_name).is_some()
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

        let mut list_tools = Map::new();
        list_tools.insert("method".to_string(), json!("tools/list"));

        let tool_discovery_tool_calls = clients
            .iter()
            .map(|client| {
                ToolCall::new(
                    format!("{}{}", MCP_TOOLS_DISCOVERY_PREFIX, client),
                    *client,
                    list_tools.clone(),
                )
            })
            .collect();

        Ok(GatewayToolDiscoveryInitiationResult {
            agent_context: context.with_property(PROPERTY_MCP_CLIENTS, json!(clients)),
            tool_discovery_tool_calls,
        })
    }

    fn all_tool_discovery_results_present(
        &self,
        context: &AgentContext,
        results: &[ToolCallResult],
    ) -> bool {
        let missing: Vec<String> = element_names(context, PROPERTY_MCP_CLIENTS)
            .into_iter()
            .filter(|client| {
                let id = format!("{}{}", MCP_TOOLS_DISCOVERY_PREFIX, client);
                !results.iter().any(|result| result.id == id)
            })
            .collect();

        if !missing.is_empty() {
            tracing::debug!(clients = ?missing, "Missing MCP client tool discovery results");
            return false;
        }
        true
    }

    fn handles_tool_discovery_result(&self, result: &ToolCallResult) -> bool {
        result.id.starts_with(MCP_TOOLS_DISCOVERY_PREFIX)
    }

    fn handle_tool_discovery_results(
        &self,
        _context: &AgentContext,
        results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>> {
        let mut tool_definitions = Vec::new();
        for result in results {
            tool_definitions.extend(self.tool_definitions_from_discovery_result(result)?);
        }
        Ok(tool_definitions)
    }

    fn resolve_updated_gateway_tool_definitions(
        &self,
        context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates {
        diff_element_names(
            &element_names(context, PROPERTY_MCP_CLIENTS),
            GATEWAY_TYPE,
            gateway_tool_definitions,
        )
    }

    fn transform_tool_calls(&self, _context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        tool_calls
            .into_iter()
            .map(|call| match parse_tool_name(&call.name) {
                Some((element, tool)) => {
                    let mut arguments = Map::new();
                    arguments.insert("method".to_string(), json!("tools/call"));
                    arguments.insert(
                        "params".to_string(),
                        json!({"name": tool, "arguments": call.arguments}),
                    );
                    ToolCall::new(call.id.clone(), element, arguments)
                }
                None => call,
            })
            .collect()
    }

    fn transform_tool_call_results(
        &self,
        context: &AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<Vec<ToolCallResult>> {
        let clients = element_names(context, PROPERTY_MCP_CLIENTS);
        results
            .into_iter()
            .map(|result| {
                if clients.contains(&result.name) {
                    self.tool_call_result_from_call_tool(result)
                } else {
                    Ok(result)
                }
            })
            .collect()
    }
}
