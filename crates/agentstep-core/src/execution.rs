// Execution context of one agent step
//
// Everything the dispatcher hands to the engine for a single invocation: process
// identity, the element's configuration, the previous context and the tool call
// results collected since the last step.

use crate::config::AgentExecutionConfig;
use crate::context::{AgentContext, AgentMetadata};
use crate::tool_types::ToolCallResult;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentExecutionContext {
    /// Deployed process version; changes on redeployment
    pub process_definition_key: i64,
    pub process_instance_key: i64,
    /// Element id of the agent within the process
    pub element_id: String,
    pub bpmn_process_id: String,
    /// Context returned by the previous step, absent on the first invocation
    pub initial_agent_context: Option<AgentContext>,
    pub initial_tool_call_results: Vec<ToolCallResult>,
    pub config: AgentExecutionConfig,
}

impl AgentExecutionContext {
    pub fn new(process_definition_key: i64, process_instance_key: i64, element_id: impl Into<String>) -> Self {
        Self {
            process_definition_key,
            process_instance_key,
            element_id: element_id.into(),
            bpmn_process_id: String::new(),
            initial_agent_context: None,
            initial_tool_call_results: Vec::new(),
            config: AgentExecutionConfig::default(),
        }
    }

    pub fn with_bpmn_process_id(mut self, bpmn_process_id: impl Into<String>) -> Self {
        self.bpmn_process_id = bpmn_process_id.into();
        self
    }

    pub fn with_agent_context(mut self, context: AgentContext) -> Self {
        self.initial_agent_context = Some(context);
        self
    }

    pub fn with_tool_call_results(mut self, results: Vec<ToolCallResult>) -> Self {
        self.initial_tool_call_results = results;
        self
    }

    pub fn with_config(mut self, config: AgentExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Process identity to record on the agent context
    pub fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.process_definition_key, self.process_instance_key)
    }
}
