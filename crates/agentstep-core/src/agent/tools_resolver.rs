// Tool definition reconciliation after a process migration
//
// When the process definition of a running agent changes, the tools recorded in
// the context are reconciled with the newly declared ones:
// - Declared tools may change description and schema, and new tools may be added
// - Removing or renaming a declared tool fails
// - Any change of the gateway elements fails
// - Tools discovered through gateways are kept as they are

use std::sync::Arc;

use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::execution::AgentExecutionContext;
use crate::gateway::{GatewayToolDefinitionChanges, GatewayToolHandlerRegistry};
use crate::tool_types::{unique_by_name, ToolDefinition};
use crate::traits::ToolSchemaResolver;

pub struct AgentToolsResolver {
    schema_resolver: Arc<dyn ToolSchemaResolver>,
    gateway_registry: Arc<GatewayToolHandlerRegistry>,
}

impl AgentToolsResolver {
    pub fn new(
        schema_resolver: Arc<dyn ToolSchemaResolver>,
        gateway_registry: Arc<GatewayToolHandlerRegistry>,
    ) -> Self {
        Self {
            schema_resolver,
            gateway_registry,
        }
    }

    pub async fn update_tool_definitions(
        &self,
        execution: &AgentExecutionContext,
        context: AgentContext,
    ) -> Result<AgentContext> {
        let schema = self.schema_resolver.resolve_schema(execution).await?;
        let new_tools = unique_by_name(schema.tool_definitions);

        let missing: Vec<&str> = context
            .tool_definitions()
            .iter()
            .map(|tool| tool.name.as_str())
            .filter(|name| !self.gateway_registry.is_gateway_managed(name))
            .filter(|name| !new_tools.iter().any(|tool| tool.name == *name))
            .collect();

        if !missing.is_empty() {
            return Err(AgentError::domain(
                ErrorCode::MigrationMissingTools,
                format!(
                    "The AI Agent references tools that are no longer defined, most likely due to a process migration.\n\
                     Removing or renaming existing tools is currently not supported.\n\
                     Please re-add the following tools to continue agent execution: {}",
                    missing.join(", ")
                ),
            ));
        }

        let changes = self
            .gateway_registry
            .resolve_updated_gateway_tool_definitions(&context, &schema.gateway_tool_definitions);
        if changes.has_changes() {
            return Err(AgentError::domain(
                ErrorCode::MigrationGatewayToolDefinitionsChanged,
                format!(
                    "Gateway tool definitions have changed, most likely due to a process migration.\n\
                     Adding or removing gateway tool definitions to a running AI Agent is currently not supported.\n\
                     Please restore gateway tool definitions to the previous state to continue agent execution.\n\
                     Changes: {}",
                    describe_changes(&changes)
                ),
            ));
        }

        let merged = self.merge_tool_definitions(context.tool_definitions(), &new_tools);
        tracing::debug!(
            tool_definitions = merged.len(),
            "Updated tool definitions after process migration"
        );

        Ok(context.with_tool_definitions(merged))
    }

    /// Existing tools in their original order (declared ones updated), then new tools
    fn merge_tool_definitions(&self, existing: &[ToolDefinition], new_tools: &[ToolDefinition]) -> Vec<ToolDefinition> {
        let mut merged: Vec<ToolDefinition> = existing
            .iter()
            .map(|tool| {
                if self.gateway_registry.is_gateway_managed(&tool.name) {
                    return tool.clone();
                }
                new_tools
                    .iter()
                    .find(|new_tool| new_tool.name == tool.name)
                    .cloned()
                    .unwrap_or_else(|| tool.clone())
            })
            .collect();

        for tool in new_tools {
            if !existing.iter().any(|e| e.name == tool.name) {
                merged.push(tool.clone());
            }
        }

        merged
    }
}

/// `mcpClient [added: a; removed: b], a2aClient [added: c]`
fn describe_changes(changes: &GatewayToolDefinitionChanges) -> String {
    changes
        .changed()
        .map(|(gateway_type, updates)| {
            let mut parts = Vec::new();
            if !updates.added.is_empty() {
                parts.push(format!("added: {}", updates.added.join(", ")));
            }
            if !updates.removed.is_empty() {
                parts.push(format!("removed: {}", updates.removed.join(", ")));
            }
            format!("{} [{}]", gateway_type, parts.join("; "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
