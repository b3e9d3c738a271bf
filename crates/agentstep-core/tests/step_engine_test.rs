// Integration tests for the agent step engine
//
// These tests drive AgentRequestHandler through complete multi-step
// conversations the way an external dispatcher would: each step's context
// and tool call results feed the next step.

use std::sync::Arc;

use agentstep_core::{
    config::{SystemPromptConfig, UserPromptConfig},
    memory::{MockModelClient, MockModelResponse, StaticToolSchemaResolver},
    AgentContext, AgentExecutionConfig, AgentExecutionConfigBuilder, AgentExecutionContext, AgentMetadata,
    AgentRequestHandler, AgentState, AgentStepCompletion, ConversationContext, ConversationStoreRegistry,
    ErrorCode, GatewayToolDefinition, GatewayToolHandlerRegistry, Message, MessageRole, ToolCall,
    ToolCallResult, ToolDefinition, ToolSchema,
};
use serde_json::{json, Map, Value};

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const PROCESS_DEFINITION_KEY: i64 = 2251799813685249;
const PROCESS_INSTANCE_KEY: i64 = 2251799813685300;

fn weather_tool() -> ToolDefinition {
    ToolDefinition::new(
        "getWeather",
        "Get the weather for a location",
        json!({"type": "object", "properties": {"location": {"type": "string"}}}),
    )
}

fn handler(client: Arc<MockModelClient>, resolver: Arc<StaticToolSchemaResolver>) -> AgentRequestHandler {
    AgentRequestHandler::new(
        resolver,
        client,
        Arc::new(ConversationStoreRegistry::new()),
        Arc::new(GatewayToolHandlerRegistry::with_default_handlers()),
    )
}

fn execution(config: AgentExecutionConfig) -> AgentExecutionContext {
    AgentExecutionContext::new(PROCESS_DEFINITION_KEY, PROCESS_INSTANCE_KEY, "ai_agent").with_config(config)
}

fn config(user_prompt: &str) -> AgentExecutionConfig {
    AgentExecutionConfigBuilder::new()
        .system_prompt(SystemPromptConfig::new("You are a helpful assistant"))
        .user_prompt(UserPromptConfig::new(user_prompt))
        .build()
}

fn context_of(completion: &AgentStepCompletion) -> AgentContext {
    completion
        .agent_response
        .as_ref()
        .map(|response| response.context.clone())
        .expect("completion without response")
}

fn history(context: &AgentContext) -> Vec<Message> {
    match context.conversation() {
        Some(ConversationContext::InProcess { messages, .. }) => messages.clone(),
        other => panic!("expected in-process conversation, got {:?}", other),
    }
}

fn location(value: &str) -> Map<String, Value> {
    let mut arguments = Map::new();
    arguments.insert("location".to_string(), json!(value));
    arguments
}

// =============================================================================
// Single step
// =============================================================================

#[tokio::test]
async fn test_haiku_completes_in_one_step() {
    init_tracing();
    let client = Arc::new(MockModelClient::with_responses(vec![MockModelResponse::text(
        "Waves fold into foam\nsalt wind carries gull voices\nthe tide keeps its time",
    )
    .with_token_usage(25, 17)]));
    let handler = handler(client, Arc::new(StaticToolSchemaResolver::default()));

    let completion = handler
        .handle_request(&execution(config("Write a haiku about the sea")))
        .await
        .unwrap();

    assert!(completion.completion_condition_fulfilled);
    let response = completion.agent_response.as_ref().unwrap();
    assert!(response.response_text.as_deref().unwrap().starts_with("Waves fold into foam"));
    assert!(response.tool_calls.is_empty());

    let context = &response.context;
    assert_eq!(context.state(), AgentState::Ready);
    assert_eq!(context.metrics().model_calls, 1);
    assert_eq!(context.metrics().token_usage.total(), 42);
    assert_eq!(
        context.metadata(),
        Some(&AgentMetadata::new(PROCESS_DEFINITION_KEY, PROCESS_INSTANCE_KEY))
    );

    let roles: Vec<_> = history(context).iter().map(Message::role).collect();
    assert_eq!(roles, vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]);
}

#[tokio::test]
async fn test_two_tool_calls_are_dispatched() {
    let client = Arc::new(MockModelClient::with_responses(vec![MockModelResponse::with_tools(
        "Let me check the weather",
        vec![
            ToolCall::new("call_berlin", "getWeather", location("Berlin")),
            ToolCall::new("call_paris", "getWeather", location("Paris")),
        ],
    )]));
    let handler = handler(
        client,
        Arc::new(StaticToolSchemaResolver::with_tools(vec![weather_tool()])),
    );

    let completion = handler
        .handle_request(&execution(config("Compare the weather in Berlin and Paris")))
        .await
        .unwrap();

    assert!(!completion.completion_condition_fulfilled);
    assert!(!completion.cancel_remaining_instances);
    let calls = completion.tool_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].metadata.id, "call_berlin");
    assert_eq!(calls[0].metadata.name, "getWeather");
    assert_eq!(calls[0].arguments["location"], "Berlin");
    assert_eq!(calls[1].metadata.id, "call_paris");

    let serialized = serde_json::to_value(&calls[1]).unwrap();
    assert_eq!(
        serialized,
        json!({"_meta": {"id": "call_paris", "name": "getWeather"}, "toolCall": {"location": "Paris"}})
    );
    assert_eq!(context_of(&completion).state(), AgentState::WaitingForToolInput);
}

// =============================================================================
// Multi-step conversations
// =============================================================================

#[tokio::test]
async fn test_tool_feedback_loop() {
    let client = Arc::new(MockModelClient::with_responses(vec![
        MockModelResponse::with_tools("", vec![ToolCall::new("call_1", "getWeather", location("Berlin"))]),
        MockModelResponse::text("It is sunny in Berlin"),
    ]));
    let handler = handler(
        client.clone(),
        Arc::new(StaticToolSchemaResolver::with_tools(vec![weather_tool()])),
    );
    let config = config("What is the weather in Berlin?");

    let first = handler.handle_request(&execution(config.clone())).await.unwrap();
    let first_context = context_of(&first);
    let second = handler
        .handle_request(
            &execution(config)
                .with_agent_context(first_context.clone())
                .with_tool_call_results(vec![ToolCallResult::new(
                    "call_1",
                    "getWeather",
                    json!({"temperature": 24, "condition": "sunny"}),
                )]),
        )
        .await
        .unwrap();

    assert!(second.completion_condition_fulfilled);
    let context = context_of(&second);
    assert_eq!(context.metrics().model_calls, 2);
    assert_eq!(
        context.conversation().map(ConversationContext::conversation_id),
        first_context.conversation().map(ConversationContext::conversation_id)
    );

    let roles: Vec<_> = history(&context).iter().map(Message::role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::ToolCallResult,
            MessageRole::Assistant,
        ]
    );
    assert_eq!(client.call_count().await, 2);
}

#[tokio::test]
async fn test_mcp_gateway_discovery_and_tool_call() {
    init_tracing();
    let client = Arc::new(MockModelClient::with_responses(vec![
        MockModelResponse::with_tools(
            "",
            vec![ToolCall::new("call_1", "MCP_filesystem___readFile", {
                let mut arguments = Map::new();
                arguments.insert("path".to_string(), json!("/tmp/notes.txt"));
                arguments
            })],
        ),
        MockModelResponse::text("The notes say hello"),
    ]));
    let resolver = Arc::new(StaticToolSchemaResolver::new(ToolSchema::new(
        vec![weather_tool()],
        vec![GatewayToolDefinition::new("mcpClient", "filesystem")],
    )));
    let handler = handler(client.clone(), resolver);
    let config = config("What is in my notes?");

    // Step 1: discovery calls, no model call
    let discovery = handler.handle_request(&execution(config.clone())).await.unwrap();
    assert!(!discovery.completion_condition_fulfilled);
    assert_eq!(discovery.tool_calls()[0].metadata.id, "MCP_toolsList_filesystem");
    assert_eq!(discovery.tool_calls()[0].metadata.name, "filesystem");
    assert_eq!(context_of(&discovery).state(), AgentState::ToolDiscovery);
    assert_eq!(client.call_count().await, 0);

    // Step 2: discovery results arrive, the model calls a discovered tool
    let tool_call = handler
        .handle_request(
            &execution(config.clone())
                .with_agent_context(context_of(&discovery))
                .with_tool_call_results(vec![ToolCallResult::new(
                    "MCP_toolsList_filesystem",
                    "filesystem",
                    json!({"toolDefinitions": [{
                        "name": "readFile",
                        "description": "Read a file",
                        "inputSchema": {"type": "object"}
                    }]}),
                )]),
        )
        .await
        .unwrap();

    let context = context_of(&tool_call);
    let names: Vec<_> = context.tool_definitions().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["getWeather", "MCP_filesystem___readFile"]);
    assert_eq!(tool_call.tool_calls()[0].metadata.name, "filesystem");
    assert_eq!(tool_call.tool_calls()[0].arguments["method"], "tools/call");
    assert_eq!(tool_call.tool_calls()[0].arguments["params"]["name"], "readFile");

    // Step 3: the gateway result is mapped back to the discovered tool name
    let answer = handler
        .handle_request(
            &execution(config)
                .with_agent_context(context)
                .with_tool_call_results(vec![ToolCallResult::new(
                    "call_1",
                    "filesystem",
                    json!({"name": "readFile", "content": [{"type": "text", "text": "hello"}]}),
                )]),
        )
        .await
        .unwrap();

    assert!(answer.completion_condition_fulfilled);
    let messages = history(&context_of(&answer));
    let Message::ToolCallResult(results) = &messages[3] else {
        panic!("expected tool call results, got {:?}", messages[3]);
    };
    assert_eq!(results.results[0].name, "MCP_filesystem___readFile");
    assert_eq!(results.results[0].content, json!("hello"));
}

#[tokio::test]
async fn test_migration_with_removed_tool_fails() {
    let client = Arc::new(MockModelClient::with_responses(vec![MockModelResponse::with_tools(
        "",
        vec![ToolCall::new("call_1", "getWeather", location("Berlin"))],
    )]));
    let resolver = Arc::new(StaticToolSchemaResolver::with_tools(vec![weather_tool()]));
    let handler = handler(client.clone(), resolver.clone());

    let first = handler
        .handle_request(&execution(config("What is the weather in Berlin?")))
        .await
        .unwrap();

    resolver.set_schema(ToolSchema::new(
        vec![ToolDefinition::new("search", "Search the web", json!({}))],
        vec![],
    ));
    let migrated = AgentExecutionContext::new(PROCESS_DEFINITION_KEY + 1, PROCESS_INSTANCE_KEY, "ai_agent")
        .with_config(config("What is the weather in Berlin?"))
        .with_agent_context(context_of(&first))
        .with_tool_call_results(vec![ToolCallResult::new("call_1", "getWeather", "Sunny")]);

    let err = handler.handle_request(&migrated).await.unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::MigrationMissingTools));
    assert!(err.to_string().ends_with("continue agent execution: getWeather"));
    assert_eq!(client.call_count().await, 1);
}

// =============================================================================
// Memory windowing
// =============================================================================

fn long_running_context(message_count: usize) -> AgentContext {
    AgentContext::empty()
        .with_state(AgentState::Ready)
        .with_metadata(AgentMetadata::new(PROCESS_DEFINITION_KEY, PROCESS_INSTANCE_KEY))
        .with_conversation(ConversationContext::InProcess {
            conversation_id: "conversation-1".to_string(),
            messages: (0..message_count)
                .map(|i| Message::user(format!("User message {}", i)))
                .collect(),
        })
}

#[tokio::test]
async fn test_context_window_limits_model_input() {
    let client = Arc::new(MockModelClient::new());
    let handler = handler(client.clone(), Arc::new(StaticToolSchemaResolver::default()));
    let config = AgentExecutionConfigBuilder::new()
        .user_prompt(UserPromptConfig::new("User message 29"))
        .context_window_size(11)
        .build();

    let completion = handler
        .handle_request(&execution(config).with_agent_context(long_running_context(29)))
        .await
        .unwrap();

    let calls = client.calls().await;
    assert_eq!(calls[0].len(), 11);
    assert_eq!(calls[0][0].text(), Some("User message 19"));
    assert_eq!(calls[0][10].text(), Some("User message 29"));
    assert_eq!(history(&context_of(&completion)).len(), 31);
}

#[tokio::test]
async fn test_default_context_window() {
    let client = Arc::new(MockModelClient::new());
    let handler = handler(client.clone(), Arc::new(StaticToolSchemaResolver::default()));
    let config = AgentExecutionConfigBuilder::new()
        .user_prompt(UserPromptConfig::new("User message 29"))
        .build();

    handler
        .handle_request(&execution(config).with_agent_context(long_running_context(29)))
        .await
        .unwrap();

    let calls = client.calls().await;
    assert_eq!(calls[0].len(), 20);
    assert_eq!(calls[0][0].text(), Some("User message 10"));
}
