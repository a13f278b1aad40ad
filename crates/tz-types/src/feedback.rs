//! Feedback contracts for `POST /feedback`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Attaches a metric value to an inference or an episode.
///
/// No defaults are filled in: the caller decides which target to set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub metric_name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryrun: Option<bool>,
}

impl FeedbackRequest {
    pub fn for_inference(metric_name: impl Into<String>, inference_id: impl Into<String>, value: Value) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            episode_id: None,
            inference_id: Some(inference_id.into()),
            tags: None,
            dryrun: None,
        }
    }

    pub fn for_episode(metric_name: impl Into<String>, episode_id: impl Into<String>, value: Value) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            episode_id: Some(episode_id.into()),
            inference_id: None,
            tags: None,
            dryrun: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feedback_wire_shape() {
        let request = FeedbackRequest::for_inference("exact_match", "inf-1", json!(true));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"metric_name": "exact_match", "value": true, "inference_id": "inf-1"})
        );
    }
}
