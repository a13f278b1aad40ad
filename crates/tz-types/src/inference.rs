//! Inference request and response contracts.

use crate::error::{GatewayError, GatewayResult};
use crate::input::Input;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A tool that the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Controls how tools are selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// No tool should be used.
    None,
    /// Let the model decide.
    Auto,
    /// The model must call a tool.
    Required,
    /// Force a specific tool by name.
    Specific(String),
}

/// Runtime parameter overrides, keyed by variant type then parameter name.
pub type InferenceParams = HashMap<String, Map<String, Value>>;

/// The request type for `POST /inference`.
///
/// Exactly one of `function_name` or `model_name` must be set; see [`InferenceRequest::validate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<String>,
    pub input: Input,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<InferenceParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryrun: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<HashMap<String, String>>,
}

impl InferenceRequest {
    /// Creates a request targeting a configured function.
    pub fn for_function(function_name: impl Into<String>, input: Input) -> Self {
        Self { function_name: Some(function_name.into()), input, ..Self::default() }
    }

    /// Creates a request targeting a model directly.
    pub fn for_model(model_name: impl Into<String>, input: Input) -> Self {
        Self { model_name: Some(model_name.into()), input, ..Self::default() }
    }

    /// Enforces that exactly one non-empty target (`function_name` xor `model_name`) is set.
    pub fn validate(&self) -> GatewayResult<()> {
        let has_function = self.function_name.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_model = self.model_name.as_deref().is_some_and(|s| !s.trim().is_empty());
        match (has_function, has_model) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(GatewayError::Validation(
                "Only one of `function_name` or `model_name` may be provided".to_string(),
            )),
            (false, false) => Err(GatewayError::Validation(
                "Exactly one of `function_name` or `model_name` must be provided".to_string(),
            )),
        }
    }
}

/// Token usage reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A tool call produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    pub id: String,
    pub raw_name: String,
    pub raw_arguments: String,
    /// Validated tool name, absent when the model named an unknown tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parsed arguments, absent when they failed validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// One block of chat output content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockOutput {
    Text { text: String },
    ToolCall(ToolCallOutput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInferenceResponse {
    pub inference_id: String,
    pub episode_id: String,
    pub variant_name: String,
    pub content: Vec<ContentBlockOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Output of a JSON function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonOutput {
    pub raw: String,
    pub parsed: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonInferenceResponse {
    pub inference_id: String,
    pub episode_id: String,
    pub variant_name: String,
    pub output: JsonOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// An inference response, discriminated by the presence of `content` (chat) or `output` (JSON).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Chat(ChatInferenceResponse),
    Json(JsonInferenceResponse),
}

impl InferenceResponse {
    pub fn inference_id(&self) -> &str {
        match self {
            Self::Chat(r) => &r.inference_id,
            Self::Json(r) => &r.inference_id,
        }
    }

    pub fn episode_id(&self) -> &str {
        match self {
            Self::Chat(r) => &r.episode_id,
            Self::Json(r) => &r.episode_id,
        }
    }

    pub fn variant_name(&self) -> &str {
        match self {
            Self::Chat(r) => &r.variant_name,
            Self::Json(r) => &r.variant_name,
        }
    }

    pub fn usage(&self) -> Option<Usage> {
        match self {
            Self::Chat(r) => r.usage,
            Self::Json(r) => r.usage,
        }
    }
}

impl<'de> Deserialize<'de> for InferenceResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let object = Map::<String, Value>::deserialize(deserializer)?;
        let value = match (object.contains_key("content"), object.contains_key("output")) {
            (true, false) => serde_json::from_value(Value::Object(object)).map(Self::Chat),
            (false, true) => serde_json::from_value(Value::Object(object)).map(Self::Json),
            (true, true) => {
                return Err(D::Error::custom(
                    "inference response carries both `content` and `output`",
                ));
            }
            (false, false) => {
                return Err(D::Error::custom(
                    "inference response carries neither `content` nor `output`",
                ));
            }
        };
        value.map_err(D::Error::custom)
    }
}
