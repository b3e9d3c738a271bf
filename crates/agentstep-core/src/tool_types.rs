// Tool definitions, calls and results
//
// Design Decision: Tools are identified by name (string). Gateway tool definitions
// live in their own namespace until discovery turns them into regular ToolDefinitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool definition exposed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name (unique within an agent context)
    pub name: String,
    /// Tool description for the model
    #[serde(default)]
    pub description: String,
    /// JSON schema for tool parameters
    #[serde(default)]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Collapse tools sharing a name, keeping the first position and the last definition
pub fn unique_by_name(tool_definitions: impl IntoIterator<Item = ToolDefinition>) -> Vec<ToolDefinition> {
    let mut unique: Vec<ToolDefinition> = Vec::new();
    for tool in tool_definitions {
        match unique.iter_mut().find(|existing| existing.name == tool.name) {
            Some(existing) => *existing = tool,
            None => unique.push(tool),
        }
    }
    unique
}

/// Gateway tool definition (e.g. an MCP client or A2A client element)
///
/// Resolved into regular tool definitions by the matching gateway tool handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayToolDefinition {
    /// Gateway kind, used to select the handler
    #[serde(rename = "type")]
    pub gateway_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl GatewayToolDefinition {
    pub fn new(gateway_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gateway_type: gateway_type.into(),
            name: name.into(),
            description: String::new(),
            properties: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Tool call requested by the model (or by gateway discovery)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// Arguments as JSON object
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Result of an external tool execution, correlated by call id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl ToolCallResult {
    /// Property marking a tool call that was cancelled before it completed
    pub const PROPERTY_INTERRUPTED: &'static str = "interrupted";

    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            properties: Map::new(),
        }
    }

    /// Create a result for a cancelled tool call
    pub fn interrupted(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Value::Null).with_property(Self::PROPERTY_INTERRUPTED, true)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<Value>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_interrupted(&self) -> bool {
        self.properties
            .get(Self::PROPERTY_INTERRUPTED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Identity of a tool call handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallMetadata {
    pub id: String,
    pub name: String,
}

/// Tool call in the shape the dispatcher activates elements with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallVariable {
    #[serde(rename = "_meta")]
    pub metadata: ToolCallMetadata,
    #[serde(rename = "toolCall")]
    pub arguments: Map<String, Value>,
}

impl From<ToolCall> for ToolCallVariable {
    fn from(tool_call: ToolCall) -> Self {
        Self {
            metadata: ToolCallMetadata {
                id: tool_call.id,
                name: tool_call.name,
            },
            arguments: tool_call.arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_tool_definition_serialization() {
        let json = r#"{
            "type": "mcpClient",
            "name": "filesystem",
            "description": "Filesystem MCP"
        }"#;

        let definition: GatewayToolDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.gateway_type, "mcpClient");
        assert_eq!(definition.name, "filesystem");
        assert!(definition.properties.is_empty());
    }

    #[test]
    fn test_tool_definition_equality_includes_schema() {
        let a = ToolDefinition::new("search", "Search", json!({"type": "object"}));
        let b = ToolDefinition::new("search", "Search", json!({"type": "string"}));

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_unique_by_name_keeps_first_position_and_last_definition() {
        let unique = unique_by_name(vec![
            ToolDefinition::new("search", "Search v1", json!({})),
            ToolDefinition::new("getWeather", "Weather", json!({})),
            ToolDefinition::new("search", "Search v2", json!({})),
        ]);

        let names: Vec<_> = unique.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec!["search", "getWeather"]);
        assert_eq!(unique[0].description, "Search v2");
    }

    #[test]
    fn test_interrupted_tool_call_result() {
        let result = ToolCallResult::interrupted("call_1", "getWeather");
        assert!(result.is_interrupted());

        let regular = ToolCallResult::new("call_2", "getWeather", "Sunny");
        assert!(!regular.is_interrupted());
    }

    #[test]
    fn test_tool_call_variable_shape() {
        let mut arguments = Map::new();
        arguments.insert("city".to_string(), json!("Munich"));
        let variable = ToolCallVariable::from(ToolCall::new("call_1", "getWeather", arguments));

        let value = serde_json::to_value(&variable).unwrap();
        assert_eq!(
            value,
            json!({
                "_meta": {"id": "call_1", "name": "getWeather"},
                "toolCall": {"city": "Munich"}
            })
        );
    }
}
