//! Fine-tuning providers and the clients used to reach them.

use crate::error::{FineTuningError, FineTuningResult};
use crate::openai::OpenAIClient;
use serde::{Deserialize, Serialize};

/// A hosted fine-tuning provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineTuningProvider {
    #[serde(rename = "openai")]
    OpenAI,
}

impl FineTuningProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
        }
    }
}

impl std::fmt::Display for FineTuningProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FineTuningProvider {
    type Err = FineTuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            other => Err(FineTuningError::Validation(format!("Unsupported fine-tuning provider: {other}"))),
        }
    }
}

/// Clients for every provider the caller has configured.
#[derive(Debug, Clone, Default)]
pub struct FineTuningProviders {
    openai: Option<OpenAIClient>,
}

impl FineTuningProviders {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_openai(mut self, client: OpenAIClient) -> Self {
        self.openai = Some(client);
        self
    }

    pub fn openai(&self) -> FineTuningResult<&OpenAIClient> {
        self.openai
            .as_ref()
            .ok_or_else(|| FineTuningError::Validation("OpenAI provider is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::OpenAIConfig;

    #[test]
    fn test_provider_names() {
        assert_eq!("OpenAI".parse::<FineTuningProvider>().unwrap(), FineTuningProvider::OpenAI);
        assert_eq!(serde_json::to_string(&FineTuningProvider::OpenAI).unwrap(), "\"openai\"");
        assert!("fireworks".parse::<FineTuningProvider>().unwrap_err().is_validation());
    }

    #[test]
    fn test_unconfigured_provider() {
        assert!(FineTuningProviders::new().openai().unwrap_err().is_validation());
        let providers = FineTuningProviders::new().with_openai(OpenAIClient::new(OpenAIConfig::default()));
        assert!(providers.openai().is_ok());
    }
}
