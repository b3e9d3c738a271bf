// Gateway tool handlers
//
// A gateway tool definition (an MCP client, a remote A2A agent, ...) stands for a
// set of tools that are only known after a discovery round trip. Each gateway type
// has a handler which:
// - Emits discovery tool calls and turns their results into tool definitions
// - Maps the model's tool calls onto the gateway element and back
// - Reports which gateway definitions changed between process versions
//
// Design Decision: handlers are registered explicitly and kept in registration
// order; every operation folds the agent context through them in that order.

mod a2a;
mod mcp;

pub use a2a::A2aGatewayToolHandler;
pub use mcp::McpClientGatewayToolHandler;

use std::sync::Arc;

use serde_json::Value;

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::tool_types::{GatewayToolDefinition, ToolCall, ToolCallResult, ToolDefinition};

/// Type key reserved for the fallback handler
const RESERVED_DEFAULT_TYPE: &str = "_default";

// ============================================================================
// Result types
// ============================================================================

/// Context after discovery was initiated, plus the discovery calls to dispatch
#[derive(Debug, Clone)]
pub struct GatewayToolDiscoveryInitiationResult {
    pub agent_context: AgentContext,
    pub tool_discovery_tool_calls: Vec<ToolCall>,
}

/// Context with discovered tools merged in, plus the results discovery did not consume
#[derive(Debug, Clone)]
pub struct GatewayToolDiscoveryResult {
    pub agent_context: AgentContext,
    pub remaining_tool_call_results: Vec<ToolCallResult>,
}

/// Gateway definition names added or removed for one gateway type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayToolDefinitionUpdates {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl GatewayToolDefinitionUpdates {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Per-type updates in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayToolDefinitionChanges(Vec<(String, GatewayToolDefinitionUpdates)>);

impl GatewayToolDefinitionChanges {
    pub fn get(&self, gateway_type: &str) -> Option<&GatewayToolDefinitionUpdates> {
        self.0
            .iter()
            .find(|(t, _)| t == gateway_type)
            .map(|(_, updates)| updates)
    }

    /// Types with at least one added or removed definition
    pub fn changed(&self) -> impl Iterator<Item = (&str, &GatewayToolDefinitionUpdates)> {
        self.0
            .iter()
            .filter(|(_, updates)| !updates.is_empty())
            .map(|(t, updates)| (t.as_str(), updates))
    }

    pub fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }
}

// ============================================================================
// GatewayToolHandler
// ============================================================================

pub trait GatewayToolHandler: Send + Sync {
    /// Gateway type this handler is responsible for (e.g. "mcpClient")
    fn gateway_type(&self) -> &str;

    /// Whether a tool definition name was produced by this gateway
    fn is_gateway_managed(&self, tool_name: &str) -> bool;

    /// Record the gateway elements on the context and emit discovery calls.
    ///
    /// Receives all gateway definitions; handlers pick their own type.
    fn initiate_tool_discovery(
        &self,
        context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> Result<GatewayToolDiscoveryInitiationResult>;

    fn all_tool_discovery_results_present(
        &self,
        context: &AgentContext,
        results: &[ToolCallResult],
    ) -> bool;

    fn handles_tool_discovery_result(&self, result: &ToolCallResult) -> bool;

    /// Turn this handler's discovery results into tool definitions
    fn handle_tool_discovery_results(
        &self,
        context: &AgentContext,
        results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>>;

    fn resolve_updated_gateway_tool_definitions(
        &self,
        context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates;

    fn transform_tool_calls(&self, context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall>;

    fn transform_tool_call_results(
        &self,
        context: &AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<Vec<ToolCallResult>>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Gateway element names recorded under a context property
pub(crate) fn element_names(context: &AgentContext, property: &str) -> Vec<String> {
    context
        .property(property)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Compare recorded element names with the new definitions of one type
pub(crate) fn diff_element_names(
    recorded: &[String],
    gateway_type: &str,
    gateway_tool_definitions: &[GatewayToolDefinition],
) -> GatewayToolDefinitionUpdates {
    let current: Vec<&str> = gateway_tool_definitions
        .iter()
        .filter(|definition| definition.gateway_type == gateway_type)
        .map(|definition| definition.name.as_str())
        .collect();

    GatewayToolDefinitionUpdates {
        added: current
            .iter()
            .filter(|name| !recorded.iter().any(|r| r == *name))
            .map(|name| name.to_string())
            .collect(),
        removed: recorded
            .iter()
            .filter(|name| !current.contains(&name.as_str()))
            .cloned()
            .collect(),
    }
}

// ============================================================================
// GatewayToolHandlerRegistry
// ============================================================================

/// Ordered set of gateway tool handlers keyed by type
#[derive(Clone, Default)]
pub struct GatewayToolHandlerRegistry {
    handlers: Vec<Arc<dyn GatewayToolHandler>>,
}

impl GatewayToolHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the MCP client and A2A client handlers
    pub fn with_default_handlers() -> Self {
        Self {
            handlers: vec![
                Arc::new(McpClientGatewayToolHandler::new()),
                Arc::new(A2aGatewayToolHandler::new()),
            ],
        }
    }

    pub fn register(&mut self, handler: Arc<dyn GatewayToolHandler>) -> Result<()> {
        let gateway_type = handler.gateway_type();
        if gateway_type.trim().is_empty() || gateway_type == RESERVED_DEFAULT_TYPE {
            return Err(AgentError::gateway(format!(
                "Invalid gateway tool handler type: '{}'",
                gateway_type
            )));
        }

        if self.get(gateway_type).is_some() {
            return Err(AgentError::gateway(format!(
                "Duplicate gateway tool handler type: '{}'",
                gateway_type
            )));
        }

        self.handlers.push(handler);
        Ok(())
    }

    pub fn get(&self, gateway_type: &str) -> Option<Arc<dyn GatewayToolHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.gateway_type() == gateway_type)
            .cloned()
    }

    pub fn gateway_types(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|handler| handler.gateway_type().to_string())
            .collect()
    }

    pub fn is_gateway_managed(&self, tool_name: &str) -> bool {
        self.handlers
            .iter()
            .any(|handler| handler.is_gateway_managed(tool_name))
    }

    pub fn initiate_tool_discovery(
        &self,
        context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> Result<GatewayToolDiscoveryInitiationResult> {
        let mut agent_context = context;
        let mut tool_discovery_tool_calls = Vec::new();

        for handler in &self.handlers {
            let initiation = handler.initiate_tool_discovery(agent_context, gateway_tool_definitions)?;
            agent_context = initiation.agent_context;
            tool_discovery_tool_calls.extend(initiation.tool_discovery_tool_calls);
        }

        Ok(GatewayToolDiscoveryInitiationResult {
            agent_context,
            tool_discovery_tool_calls,
        })
    }

    pub fn all_tool_discovery_results_present(
        &self,
        context: &AgentContext,
        results: &[ToolCallResult],
    ) -> bool {
        self.handlers
            .iter()
            .all(|handler| handler.all_tool_discovery_results_present(context, results))
    }

    /// Merge discovered tool definitions into the context.
    ///
    /// Results no handler claims are returned untouched, in their original order.
    pub fn handle_tool_discovery_results(
        &self,
        context: AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<GatewayToolDiscoveryResult> {
        let mut agent_context = context;
        let mut remaining = results;

        for handler in &self.handlers {
            let (handled, rest): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|result| handler.handles_tool_discovery_result(result));
            remaining = rest;

            if handled.is_empty() {
                continue;
            }

            let discovered = handler.handle_tool_discovery_results(&agent_context, &handled)?;
            tracing::debug!(
                gateway_type = handler.gateway_type(),
                tool_definitions = discovered.len(),
                "Discovered gateway tool definitions"
            );

            let mut tool_definitions = agent_context.tool_definitions().to_vec();
            tool_definitions.extend(discovered);
            agent_context = agent_context.with_tool_definitions(tool_definitions);
        }

        Ok(GatewayToolDiscoveryResult {
            agent_context,
            remaining_tool_call_results: remaining,
        })
    }

    pub fn resolve_updated_gateway_tool_definitions(
        &self,
        context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionChanges {
        GatewayToolDefinitionChanges(
            self.handlers
                .iter()
                .map(|handler| {
                    (
                        handler.gateway_type().to_string(),
                        handler.resolve_updated_gateway_tool_definitions(context, gateway_tool_definitions),
                    )
                })
                .collect(),
        )
    }

    pub fn transform_tool_calls(&self, context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        self.handlers
            .iter()
            .fold(tool_calls, |calls, handler| handler.transform_tool_calls(context, calls))
    }

    pub fn transform_tool_call_results(
        &self,
        context: &AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<Vec<ToolCallResult>> {
        let mut transformed = results;
        for handler in &self.handlers {
            transformed = handler.transform_tool_call_results(context, transformed)?;
        }
        Ok(transformed)
    }
}

impl std::fmt::Debug for GatewayToolHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayToolHandlerRegistry")
            .field("gateway_types", &self.gateway_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::RecordingGatewayToolHandler;
    use serde_json::json;

    #[test]
    fn test_register_rejects_invalid_types() {
        let mut registry = GatewayToolHandlerRegistry::new();

        for invalid in ["", "  ", "_default"] {
            let err = registry
                .register(Arc::new(RecordingGatewayToolHandler::new(invalid)))
                .unwrap_err();
            assert!(err
                .to_string()
                .contains(&format!("Invalid gateway tool handler type: '{}'", invalid)));
        }
    }

    #[test]
    fn test_register_rejects_duplicate_types() {
        let mut registry = GatewayToolHandlerRegistry::new();
        registry
            .register(Arc::new(RecordingGatewayToolHandler::new("A")))
            .unwrap();

        let err = registry
            .register(Arc::new(RecordingGatewayToolHandler::new("A")))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Duplicate gateway tool handler type: 'A'"));
    }

    #[test]
    fn test_default_handlers_order() {
        let registry = GatewayToolHandlerRegistry::with_default_handlers();

        assert_eq!(registry.gateway_types(), vec!["mcpClient", "a2aClient"]);
        assert!(registry.is_gateway_managed("MCP_fs___read"));
        assert!(registry.is_gateway_managed("A2A_weatherAgent"));
        assert!(!registry.is_gateway_managed("getWeather"));
    }

    #[test]
    fn test_initiate_tool_discovery_folds_handlers() {
        let registry = GatewayToolHandlerRegistry::with_default_handlers();
        let definitions = vec![
            GatewayToolDefinition::new("a2aClient", "weatherAgent"),
            GatewayToolDefinition::new("mcpClient", "filesystem"),
        ];

        let initiation = registry
            .initiate_tool_discovery(AgentContext::empty(), &definitions)
            .unwrap();

        let ids: Vec<_> = initiation
            .tool_discovery_tool_calls
            .iter()
            .map(|call| call.id.as_str())
            .collect();
        assert_eq!(ids, vec!["MCP_toolsList_filesystem", "A2A_fetchAgentCard_weatherAgent"]);
        assert_eq!(initiation.agent_context.property("mcpClients"), Some(&json!(["filesystem"])));
        assert_eq!(initiation.agent_context.property("a2aClients"), Some(&json!(["weatherAgent"])));
    }

    #[test]
    fn test_handle_tool_discovery_results_returns_remaining() {
        let registry = GatewayToolHandlerRegistry::with_default_handlers();
        let context = AgentContext::empty()
            .with_tool_definitions(vec![ToolDefinition::new("getWeather", "", json!({}))])
            .with_property("mcpClients", json!(["filesystem"]));
        let results = vec![
            ToolCallResult::new("other", "getWeather", "Sunny"),
            ToolCallResult::new(
                "MCP_toolsList_filesystem",
                "filesystem",
                json!({"toolDefinitions": [
                    {"name": "read", "description": "Read a file", "inputSchema": {"type": "object"}}
                ]}),
            ),
        ];

        let discovery = registry.handle_tool_discovery_results(context, results).unwrap();

        let names: Vec<_> = discovery
            .agent_context
            .tool_definitions()
            .iter()
            .map(|tool| tool.name.as_str())
            .collect();
        assert_eq!(names, vec!["getWeather", "MCP_filesystem___read"]);
        assert_eq!(discovery.remaining_tool_call_results.len(), 1);
        assert_eq!(discovery.remaining_tool_call_results[0].id, "other");
    }

    #[test]
    fn test_resolve_updated_gateway_tool_definitions_keeps_registration_order() {
        let registry = GatewayToolHandlerRegistry::with_default_handlers();
        let context = AgentContext::empty()
            .with_property("mcpClients", json!(["filesystem"]))
            .with_property("a2aClients", json!([]));
        let definitions = vec![GatewayToolDefinition::new("a2aClient", "filesystem")];

        let changes = registry.resolve_updated_gateway_tool_definitions(&context, &definitions);

        let changed: Vec<_> = changes.changed().map(|(t, _)| t).collect();
        assert_eq!(changed, vec!["mcpClient", "a2aClient"]);
        assert_eq!(changes.get("mcpClient").unwrap().removed, vec!["filesystem"]);
        assert_eq!(changes.get("a2aClient").unwrap().added, vec!["filesystem"]);
    }

    #[test]
    fn test_transformations_visit_every_handler() {
        let custom = Arc::new(RecordingGatewayToolHandler::new("custom"));
        let mut registry = GatewayToolHandlerRegistry::with_default_handlers();
        registry.register(custom.clone()).unwrap();

        let calls = registry.transform_tool_calls(
            &AgentContext::empty(),
            vec![ToolCall::new("1", "getWeather", serde_json::Map::new())],
        );
        let results = registry
            .transform_tool_call_results(
                &AgentContext::empty(),
                vec![ToolCallResult::new("1", "getWeather", "Sunny")],
            )
            .unwrap();

        assert_eq!(calls[0].name, "getWeather");
        assert_eq!(results[0].content, json!("Sunny"));
        assert_eq!(
            custom.invocations(),
            vec!["transform_tool_calls", "transform_tool_call_results"]
        );
    }
}
