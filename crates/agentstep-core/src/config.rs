// Agent execution configuration
//
// AgentExecutionConfig carries the user configuration of one agent element:
// - Created directly (all sections optional, defaults applied at use)
// - Built with AgentExecutionConfigBuilder
// - Deserialized from JSON (camelCase keys)

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentReference;
use crate::error::{AgentError, Result};

/// Context window applied when memory configuration does not set one
pub const DEFAULT_CONTEXT_WINDOW_SIZE: usize = 20;

/// Model call ceiling applied when limits configuration does not set one
pub const DEFAULT_MAX_MODEL_CALLS: u32 = 10;

/// Number of superseded conversation documents kept by the document store
pub const DEFAULT_PREVIOUS_DOCUMENTS_RETENTION_SIZE: usize = 2;

// ============================================================================
// Prompts
// ============================================================================

/// Prompt text with `{{name}}` placeholders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptTemplate<'a> {
    template: &'a str,
}

impl<'a> PromptTemplate<'a> {
    pub fn new(template: &'a str) -> Self {
        Self { template }
    }

    /// Replace every placeholder with its parameter value.
    ///
    /// String values are inserted as-is, anything else as compact JSON.
    pub fn render(&self, parameters: &BTreeMap<String, Value>) -> Result<String> {
        let key_pattern = Regex::new(r"^[A-Za-z0-9_]+$").map_err(anyhow::Error::from)?;
        if let Some(invalid) = parameters.keys().find(|key| !key_pattern.is_match(key)) {
            return Err(AgentError::config(format!(
                "Invalid prompt parameter name '{}'",
                invalid
            )));
        }

        let placeholder = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").map_err(anyhow::Error::from)?;
        let mut rendered = String::with_capacity(self.template.len());
        let mut last = 0;
        for captures in placeholder.captures_iter(self.template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = parameters.get(name.as_str()).ok_or_else(|| {
                AgentError::config(format!(
                    "Missing prompt parameter '{}'",
                    name.as_str()
                ))
            })?;

            rendered.push_str(&self.template[last..whole.start()]);
            match value {
                Value::String(s) => rendered.push_str(s),
                other => rendered.push_str(&other.to_string()),
            }
            last = whole.end();
        }
        rendered.push_str(&self.template[last..]);

        Ok(rendered)
    }
}

/// System prompt configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemPromptConfig {
    pub prompt: Option<String>,
    pub parameters: BTreeMap<String, Value>,
}

impl SystemPromptConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// User prompt configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPromptConfig {
    pub prompt: Option<String>,
    pub parameters: BTreeMap<String, Value>,
    pub documents: Vec<DocumentReference>,
}

impl UserPromptConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_document(mut self, document: DocumentReference) -> Self {
        self.documents.push(document);
        self
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Document-backed conversation storage settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentStorageConfig {
    /// Document lifetime in seconds, unlimited when absent
    pub time_to_live: Option<u64>,
    pub custom_properties: Map<String, Value>,
    pub previous_documents_retention_size: Option<usize>,
}

impl DocumentStorageConfig {
    pub fn retention_size(&self) -> usize {
        self.previous_documents_retention_size
            .unwrap_or(DEFAULT_PREVIOUS_DOCUMENTS_RETENTION_SIZE)
    }
}

/// Where the conversation history is persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MemoryStorageConfig {
    #[default]
    InProcess,
    Document(DocumentStorageConfig),
}

impl MemoryStorageConfig {
    /// Storage kind key, matching the conversation store kinds
    pub fn kind(&self) -> &'static str {
        match self {
            MemoryStorageConfig::InProcess => "in-process",
            MemoryStorageConfig::Document(_) => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryConfig {
    pub storage: MemoryStorageConfig,
    pub context_window_size: Option<usize>,
}

impl MemoryConfig {
    pub fn context_window_size(&self) -> usize {
        self.context_window_size.unwrap_or(DEFAULT_CONTEXT_WINDOW_SIZE)
    }
}

// ============================================================================
// Limits and response
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitsConfig {
    pub max_model_calls: Option<u32>,
}

impl LimitsConfig {
    pub fn max_model_calls(&self) -> u32 {
        self.max_model_calls.unwrap_or(DEFAULT_MAX_MODEL_CALLS)
    }
}

/// Output shape of the agent response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResponseFormat {
    /// Plain text, optionally parsed as JSON on a best-effort basis
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        parse_json: bool,
    },
    /// Strict JSON output
    #[serde(rename_all = "camelCase")]
    Json {
        #[serde(default)]
        schema: Option<Value>,
        #[serde(default)]
        schema_name: Option<String>,
    },
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Text { parse_json: false }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseConfig {
    pub format: ResponseFormat,
    pub include_assistant_message: bool,
}

// ============================================================================
// AgentExecutionConfig
// ============================================================================

/// Configuration of one agent element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentExecutionConfig {
    pub system_prompt: Option<SystemPromptConfig>,
    pub user_prompt: Option<UserPromptConfig>,
    pub memory: Option<MemoryConfig>,
    pub limits: Option<LimitsConfig>,
    pub response: Option<ResponseConfig>,
}

impl AgentExecutionConfig {
    pub fn context_window_size(&self) -> usize {
        self.memory
            .as_ref()
            .map(MemoryConfig::context_window_size)
            .unwrap_or(DEFAULT_CONTEXT_WINDOW_SIZE)
    }

    pub fn max_model_calls(&self) -> u32 {
        self.limits
            .as_ref()
            .map(LimitsConfig::max_model_calls)
            .unwrap_or(DEFAULT_MAX_MODEL_CALLS)
    }

    pub fn storage(&self) -> MemoryStorageConfig {
        self.memory
            .as_ref()
            .map(|memory| memory.storage.clone())
            .unwrap_or_default()
    }
}

/// Builder for AgentExecutionConfig with fluent API
pub struct AgentExecutionConfigBuilder {
    config: AgentExecutionConfig,
}

impl AgentExecutionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AgentExecutionConfig::default(),
        }
    }

    pub fn system_prompt(mut self, prompt: SystemPromptConfig) -> Self {
        self.config.system_prompt = Some(prompt);
        self
    }

    pub fn user_prompt(mut self, prompt: UserPromptConfig) -> Self {
        self.config.user_prompt = Some(prompt);
        self
    }

    /// Set the storage kind, keeping any configured window size
    pub fn storage(mut self, storage: MemoryStorageConfig) -> Self {
        self.config.memory.get_or_insert_with(MemoryConfig::default).storage = storage;
        self
    }

    pub fn context_window_size(mut self, size: usize) -> Self {
        self.config
            .memory
            .get_or_insert_with(MemoryConfig::default)
            .context_window_size = Some(size);
        self
    }

    pub fn max_model_calls(mut self, max: u32) -> Self {
        self.config.limits = Some(LimitsConfig {
            max_model_calls: Some(max),
        });
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.config
            .response
            .get_or_insert_with(ResponseConfig::default)
            .format = format;
        self
    }

    pub fn include_assistant_message(mut self, include: bool) -> Self {
        self.config
            .response
            .get_or_insert_with(ResponseConfig::default)
            .include_assistant_message = include;
        self
    }

    pub fn build(self) -> AgentExecutionConfig {
        self.config
    }
}

impl Default for AgentExecutionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
