//! Curated inference rows handed to fine-tuning.

use crate::inference::ContentBlockOutput;
use crate::input::Input;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Stored output of a JSON inference. `raw` may be missing on malformed rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonInferenceOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
}

/// Output of a curated row: a content-block array for chat, an object for JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceOutput {
    Chat(Vec<ContentBlockOutput>),
    Json(JsonInferenceOutput),
}

/// A historical inference selected for training-data conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInferenceRow {
    pub input: Input,
    pub output: InferenceOutput,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_output_shapes() {
        let chat: ParsedInferenceRow = serde_json::from_value(json!({
            "input": {"messages": []},
            "output": [{"type": "text", "text": "hi"}]
        }))
        .unwrap();
        assert!(matches!(chat.output, InferenceOutput::Chat(ref blocks) if blocks.len() == 1));
        assert!(chat.tags.is_empty());

        let json_row: ParsedInferenceRow = serde_json::from_value(json!({
            "input": {"messages": []},
            "output": {"raw": "42", "parsed": 42},
            "tags": {"source": "curated"}
        }))
        .unwrap();
        assert_eq!(
            json_row.output,
            InferenceOutput::Json(JsonInferenceOutput { raw: Some("42".to_string()), parsed: Some(json!(42)) })
        );
    }

    #[test]
    fn test_row_with_neither_shape_is_rejected() {
        let result = serde_json::from_value::<ParsedInferenceRow>(json!({
            "input": {"messages": []},
            "output": "just a string"
        }));
        assert!(result.is_err());
    }
}
