//! Dataset datapoint contracts.

use crate::error::{GatewayError, GatewayResult};
use crate::input::Input;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Where a datapoint created from an inference takes its output from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatapointOutputKind {
    /// Copy the inference's own output.
    #[default]
    Inherit,
    /// Use the latest demonstration attached to the inference.
    Demonstration,
    /// Leave the output empty.
    None,
}

impl std::str::FromStr for DatapointOutputKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inherit" => Ok(Self::Inherit),
            "demonstration" => Ok(Self::Demonstration),
            "none" => Ok(Self::None),
            other => Err(GatewayError::Validation(format!(
                "Unknown datapoint output kind: {other} (expected inherit, demonstration or none)"
            ))),
        }
    }
}

/// Body of `POST /datasets/{dataset_name}/datapoints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatapointRequest {
    pub inference_id: String,
    pub output: DatapointOutputKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInferenceDatapoint {
    pub function_name: String,
    pub input: Input,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonInferenceDatapoint {
    pub function_name: String,
    pub input: Input,
    pub output: Value,
    pub output_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<String>,
}

/// A persisted example in a dataset.
///
/// A JSON datapoint is recognized by its `output_schema`; anything else is a chat datapoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Datapoint {
    Chat(ChatInferenceDatapoint),
    Json(JsonInferenceDatapoint),
}

impl Datapoint {
    pub fn function_name(&self) -> &str {
        match self {
            Self::Chat(d) => &d.function_name,
            Self::Json(d) => &d.function_name,
        }
    }

    pub fn input(&self) -> &Input {
        match self {
            Self::Chat(d) => &d.input,
            Self::Json(d) => &d.input,
        }
    }

    /// Local pre-check run before sending a datapoint to the gateway.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.function_name().trim().is_empty() {
            return Err(GatewayError::Validation(
                "Invalid datapoint: function_name must be a non-empty string".to_string(),
            ));
        }
        if let Self::Json(d) = self {
            if !d.output_schema.is_object() {
                return Err(GatewayError::Validation(
                    "Invalid datapoint: output_schema must be a JSON object".to_string(),
                ));
            }
        }
        self.input()
            .validate()
            .map_err(|e| GatewayError::Validation(format!("Invalid datapoint: {e}")))
    }
}

impl<'de> Deserialize<'de> for Datapoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let object = Map::<String, Value>::deserialize(deserializer)?;
        let value = match (object.contains_key("output_schema"), object.contains_key("tool_params")) {
            (true, true) => {
                return Err(D::Error::custom(
                    "datapoint carries both `output_schema` and `tool_params`",
                ));
            }
            (true, false) => serde_json::from_value(Value::Object(object)).map(Self::Json),
            (false, _) => serde_json::from_value(Value::Object(object)).map(Self::Chat),
        };
        value.map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatapointResponse {
    pub id: String,
}
