// Agent step engine
//
// One invocation runs one step of the agent loop:
// - Initialize the context (tools, gateway discovery, migrations)
// - Check limits, assemble messages, call the model
// - Persist the conversation and shape the response
//
// All state between steps lives in the returned AgentContext and the conversation store.

// ============================================================================
// Agent Modules
// ============================================================================

mod initializer;
mod limits;
mod messages;
mod request_handler;
mod response;
mod tools_resolver;

pub use initializer::{AgentInitializationResult, AgentInitializer};
pub use limits::validate_configured_limits;
pub use messages::AgentMessagesHandler;
pub use request_handler::AgentRequestHandler;
pub use response::create_response;
pub use tools_resolver::AgentToolsResolver;
