use plugin_core::NodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CLAUDE_MODEL: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Claude models offered in the node's model picker, with their display names.
pub const CLAUDE_MODELS: [(&str, &str); 3] = [
    (
        "us.anthropic.claude-sonnet-4-20250514-v1:0",
        "Claude Sonnet 4 (Latest)",
    ),
    (
        "us.anthropic.claude-3-5-sonnet-20241022-v2:0",
        "Claude 3.5 Sonnet",
    ),
    ("us.anthropic.claude-3-5-haiku-20241022-v1:0", "Claude 3.5 Haiku"),
];

pub const MAX_TOKENS_LIMIT: u32 = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoiceMode {
    /// Claude must call at least one tool.
    #[default]
    Required,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub include_image_url: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub enable_tools: bool,
    #[serde(default)]
    pub tool_choice: ToolChoiceMode,
    /// JSON text from a template field, or an already parsed object/array.
    #[serde(default)]
    pub tool_schema: Option<Value>,
}

fn default_model() -> String {
    DEFAULT_CLAUDE_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            prompt: String::new(),
            include_image_url: false,
            image_url: None,
            enable_tools: false,
            tool_choice: ToolChoiceMode::default(),
            tool_schema: None,
        }
    }
}

impl ClaudeConfig {
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.model.trim().is_empty() {
            return Err(NodeError::Validation("Model is required".to_string()));
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(NodeError::Validation(format!(
                "Temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
            return Err(NodeError::Validation(format!(
                "Max tokens must be between 1 and {}, got {}",
                MAX_TOKENS_LIMIT, self.max_tokens
            )));
        }
        Ok(())
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }

    pub fn image_url(&self) -> Option<&str> {
        if !self.include_image_url {
            return None;
        }
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Tool definitions to send, or `None` when tools are disabled or no schema was given.
    pub fn tools(&self) -> Result<Option<Vec<ToolSchema>>, NodeError> {
        if !self.enable_tools {
            return Ok(None);
        }
        let Some(raw) = self.tool_schema.as_ref() else {
            return Ok(None);
        };
        let tools = parse_tool_schemas(raw)?;
        Ok(if tools.is_empty() { None } else { Some(tools) })
    }
}

/// Tool definition in the Bedrock Converse shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: InputSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub json: Value,
}

pub fn parse_tool_schemas(raw: &Value) -> Result<Vec<ToolSchema>, NodeError> {
    let parsed = match raw {
        Value::String(text) if text.trim().is_empty() => return Ok(vec![]),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map_err(|e| NodeError::ToolSchema(format!("not valid JSON: {}", e)))?,
        other => other.clone(),
    };

    let items = match parsed {
        Value::Null => vec![],
        Value::Object(map) if map.is_empty() => vec![],
        Value::Array(items) => items,
        single => vec![single],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let tool: ToolSchema = serde_json::from_value(item)
                .map_err(|e| NodeError::ToolSchema(format!("tool at index {}: {}", i, e)))?;
            if tool.name.trim().is_empty() {
                return Err(NodeError::ToolSchema(format!(
                    "tool at index {} has an empty name",
                    i
                )));
            }
            Ok(tool)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    pub tool_name: String,
    pub tool_input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBlock {
    Text(String),
    ToolUse(ToolUse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<ToolUse>,
}

impl ClaudeResponse {
    /// Concatenates text blocks; the last tool-use block wins.
    pub fn from_blocks(blocks: Vec<ResponseBlock>, usage: Option<Usage>) -> Self {
        let mut text = String::new();
        let mut tool_use = None;
        for block in blocks {
            match block {
                ResponseBlock::Text(chunk) => text.push_str(&chunk),
                ResponseBlock::ToolUse(tool) => tool_use = Some(tool),
            }
        }
        Self {
            text,
            usage,
            tool_use,
        }
    }

    /// Tool input when a tool was used, otherwise the generated text.
    pub fn primary_output(&self) -> Value {
        match &self.tool_use {
            Some(tool) if !tool.tool_input.is_null() => tool.tool_input.clone(),
            _ => Value::String(self.text.clone()),
        }
    }
}
