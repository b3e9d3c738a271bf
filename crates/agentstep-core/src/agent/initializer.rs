// Agent initialization
//
// Decides how a step starts:
// - First step: resolve tools, maybe start gateway tool discovery
// - Discovery pending: wait for all discovery results, then merge the tools
// - Running agent: pass through, reconciling tools after a process migration

use std::sync::Arc;

use crate::agent::tools_resolver::AgentToolsResolver;
use crate::context::{AgentContext, AgentState};
use crate::error::Result;
use crate::execution::AgentExecutionContext;
use crate::gateway::GatewayToolHandlerRegistry;
use crate::step::AgentResponse;
use crate::tool_types::{ToolCallResult, ToolCallVariable};
use crate::traits::ToolSchemaResolver;

/// Outcome of initialization
#[derive(Debug, Clone)]
pub enum AgentInitializationResult {
    /// Continue the step with this context and the tool call results left to add
    Context {
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    },
    /// Complete the step with this response, no model call
    Response(AgentResponse),
    /// Discovery results are still outstanding; complete without a response
    DiscoveryInProgress,
}

pub struct AgentInitializer {
    schema_resolver: Arc<dyn ToolSchemaResolver>,
    gateway_registry: Arc<GatewayToolHandlerRegistry>,
    tools_resolver: AgentToolsResolver,
}

impl AgentInitializer {
    pub fn new(
        schema_resolver: Arc<dyn ToolSchemaResolver>,
        gateway_registry: Arc<GatewayToolHandlerRegistry>,
    ) -> Self {
        Self {
            tools_resolver: AgentToolsResolver::new(schema_resolver.clone(), gateway_registry.clone()),
            schema_resolver,
            gateway_registry,
        }
    }

    pub async fn initialize_agent(&self, execution: &AgentExecutionContext) -> Result<AgentInitializationResult> {
        let context = execution
            .initial_agent_context
            .clone()
            .unwrap_or_else(AgentContext::empty);
        let results = execution.initial_tool_call_results.clone();

        let result = match context.state() {
            AgentState::Initializing => self.initialize_tools(execution, context, results).await?,
            AgentState::ToolDiscovery => self.complete_tool_discovery(context, results)?,
            _ => {
                let migrated = context
                    .metadata()
                    .map_or(true, |metadata| metadata.process_definition_key != execution.process_definition_key);
                let agent_context = if migrated {
                    self.tools_resolver.update_tool_definitions(execution, context).await?
                } else {
                    context
                };
                AgentInitializationResult::Context {
                    agent_context,
                    tool_call_results: results,
                }
            }
        };

        Ok(with_metadata(result, execution))
    }

    async fn initialize_tools(
        &self,
        execution: &AgentExecutionContext,
        context: AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<AgentInitializationResult> {
        let schema = self.schema_resolver.resolve_schema(execution).await?;
        let context = context.with_tool_definitions(schema.tool_definitions);

        if schema.gateway_tool_definitions.is_empty() {
            tracing::debug!("No gateway tool definitions, agent is ready");
            return Ok(AgentInitializationResult::Context {
                agent_context: context.with_state(AgentState::Ready),
                tool_call_results: results,
            });
        }

        let initiation = self
            .gateway_registry
            .initiate_tool_discovery(context, &schema.gateway_tool_definitions)?;

        if initiation.tool_discovery_tool_calls.is_empty() {
            return Ok(AgentInitializationResult::Context {
                agent_context: initiation.agent_context.with_state(AgentState::Ready),
                tool_call_results: results,
            });
        }

        tracing::debug!(
            tool_calls = initiation.tool_discovery_tool_calls.len(),
            "Initiated gateway tool discovery"
        );

        let tool_calls = initiation
            .tool_discovery_tool_calls
            .into_iter()
            .map(ToolCallVariable::from)
            .collect();
        Ok(AgentInitializationResult::Response(AgentResponse::new(
            initiation.agent_context.with_state(AgentState::ToolDiscovery),
            tool_calls,
        )))
    }

    fn complete_tool_discovery(
        &self,
        context: AgentContext,
        results: Vec<ToolCallResult>,
    ) -> Result<AgentInitializationResult> {
        if !self
            .gateway_registry
            .all_tool_discovery_results_present(&context, &results)
        {
            tracing::debug!(
                tool_call_results = results.len(),
                "Waiting for remaining tool discovery results"
            );
            return Ok(AgentInitializationResult::DiscoveryInProgress);
        }

        let discovery = self
            .gateway_registry
            .handle_tool_discovery_results(context, results)?;

        Ok(AgentInitializationResult::Context {
            agent_context: discovery.agent_context.with_state(AgentState::Ready),
            tool_call_results: discovery.remaining_tool_call_results,
        })
    }
}

fn with_metadata(result: AgentInitializationResult, execution: &AgentExecutionContext) -> AgentInitializationResult {
    match result {
        AgentInitializationResult::Context {
            agent_context,
            tool_call_results,
        } => AgentInitializationResult::Context {
            agent_context: agent_context.with_metadata(execution.metadata()),
            tool_call_results,
        },
        AgentInitializationResult::Response(mut response) => {
            response.context = response.context.with_metadata(execution.metadata());
            AgentInitializationResult::Response(response)
        }
        AgentInitializationResult::DiscoveryInProgress => AgentInitializationResult::DiscoveryInProgress,
    }
}
