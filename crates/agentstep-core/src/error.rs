// Error types for the agent step engine
//
// Domain errors carry a stable machine-readable code next to the human-readable
// message. Collaborator failures (model, stores) are wrapped but never retried here.

use std::fmt;

use thiserror::Error;

/// Result type alias for agent step operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Stable error codes surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Tool call results were supplied for a conversation that does not exist yet
    ToolCallResultsOnEmptyContext,
    /// Agent state does not allow adding user-origin messages
    InInvalidState,
    /// Agent waits for tool input but no results were supplied
    WaitingForToolInputEmptyResults,
    /// Nothing left to send to the model
    NoUserMessageContent,
    /// Configured model call ceiling reached
    MaximumNumberOfModelCallsReached,
    /// Previously declared tools vanished after a redeployment
    MigrationMissingTools,
    /// Gateway tool definitions changed after a redeployment
    MigrationGatewayToolDefinitionsChanged,
    /// Structured response could not be parsed
    FailedToParseResponseContent,
    /// User configuration is invalid
    ConfigurationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ToolCallResultsOnEmptyContext => "TOOL_CALL_RESULTS_ON_EMPTY_CONTEXT",
            ErrorCode::InInvalidState => "IN_INVALID_STATE",
            ErrorCode::WaitingForToolInputEmptyResults => "WAITING_FOR_TOOL_INPUT_EMPTY_RESULTS",
            ErrorCode::NoUserMessageContent => "NO_USER_MESSAGE_CONTENT",
            ErrorCode::MaximumNumberOfModelCallsReached => "MAXIMUM_NUMBER_OF_MODEL_CALLS_REACHED",
            ErrorCode::MigrationMissingTools => "MIGRATION_MISSING_TOOLS",
            ErrorCode::MigrationGatewayToolDefinitionsChanged => {
                "MIGRATION_GATEWAY_TOOL_DEFINITIONS_CHANGED"
            }
            ErrorCode::FailedToParseResponseContent => "FAILED_TO_PARSE_RESPONSE_CONTENT",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while executing an agent step
#[derive(Debug, Error)]
pub enum AgentError {
    /// Domain error with a stable code (state consistency, limits, migration, parsing)
    #[error("{message}")]
    Domain { code: ErrorCode, message: String },

    /// Invalid user configuration (prompt templates, storage selection)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Conversation or document store failure
    #[error("Conversation store error: {0}")]
    ConversationStore(String),

    /// Model invocation failure
    #[error("Model error: {0}")]
    Model(String),

    /// Gateway tool handler failure (registration, discovery result mapping)
    #[error("Gateway tool handler error: {0}")]
    GatewayToolHandler(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AgentError {
    /// Create a domain error with a stable code
    pub fn domain(code: ErrorCode, message: impl Into<String>) -> Self {
        AgentError::Domain {
            code,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Create a conversation store error
    pub fn store(msg: impl Into<String>) -> Self {
        AgentError::ConversationStore(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        AgentError::Model(msg.into())
    }

    /// Create a gateway tool handler error
    pub fn gateway(msg: impl Into<String>) -> Self {
        AgentError::GatewayToolHandler(msg.into())
    }

    /// Stable code of this error, if it has one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            AgentError::Domain { code, .. } => Some(*code),
            AgentError::Configuration(_) => Some(ErrorCode::ConfigurationError),
            _ => None,
        }
    }

    /// Whether re-running the same step unchanged could succeed.
    ///
    /// Domain and configuration errors need a change on the caller's side.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            AgentError::Domain { .. }
                | AgentError::Configuration(_)
                | AgentError::GatewayToolHandler(_)
                | AgentError::Serialization(_)
        )
    }
}
