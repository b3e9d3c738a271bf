use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::execution::AgentExecutionContext;

/// Fail once the context reached the configured model call ceiling
pub fn validate_configured_limits(execution: &AgentExecutionContext, context: &AgentContext) -> Result<()> {
    let model_calls = context.metrics().model_calls;
    let limit = execution.config.max_model_calls();

    if model_calls >= limit {
        return Err(AgentError::domain(
            ErrorCode::MaximumNumberOfModelCallsReached,
            format!(
                "Maximum number of model calls reached (modelCalls: {}, limit: {})",
                model_calls, limit
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentExecutionConfigBuilder;
    use crate::context::{AgentMetrics, TokenUsage};

    fn context_with_model_calls(model_calls: u32) -> AgentContext {
        AgentContext::empty().with_metrics(AgentMetrics::new(model_calls, TokenUsage::default()))
    }

    #[test]
    fn test_default_limit() {
        let execution = AgentExecutionContext::new(1, 2, "agent");

        assert!(validate_configured_limits(&execution, &context_with_model_calls(9)).is_ok());

        let err = validate_configured_limits(&execution, &context_with_model_calls(10)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MaximumNumberOfModelCallsReached));
        assert_eq!(
            err.to_string(),
            "Maximum number of model calls reached (modelCalls: 10, limit: 10)"
        );
    }

    #[test]
    fn test_configured_limit() {
        let execution = AgentExecutionContext::new(1, 2, "agent")
            .with_config(AgentExecutionConfigBuilder::new().max_model_calls(3).build());

        assert!(validate_configured_limits(&execution, &context_with_model_calls(2)).is_ok());
        assert!(validate_configured_limits(&execution, &context_with_model_calls(5)).is_err());
    }
}
