//! Parameters of a supervised fine-tuning request.

use crate::error::{FineTuningError, FineTuningResult};
use crate::provider::FineTuningProvider;
use serde::{Deserialize, Serialize};

/// Base model to fine-tune and the provider hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuningModel {
    pub name: String,
    pub provider: FineTuningProvider,
}

/// What to fine-tune, on which data, and how to split it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SftFormValues {
    pub function: String,
    pub metric: String,
    pub variant: String,
    pub model: FineTuningModel,
    pub validation_split_percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_samples: Option<usize>,
}

impl SftFormValues {
    pub fn validate(&self) -> FineTuningResult<()> {
        if self.model.name.trim().is_empty() {
            return Err(FineTuningError::Validation("Model name must be a non-empty string".to_string()));
        }
        if self.validation_split_percent >= 100 {
            return Err(FineTuningError::Validation(format!(
                "Validation split must be between 0 and 99 percent, got {}",
                self.validation_split_percent
            )));
        }
        if self.max_samples == Some(0) {
            return Err(FineTuningError::Validation("max_samples must be >= 1".to_string()));
        }
        Ok(())
    }
}
