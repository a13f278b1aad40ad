//! Command implementations for the tz CLI.

pub mod datapoint;
pub mod feedback;
pub mod fine_tune;
pub mod infer;
pub mod types;

pub use types::{DatapointCommand, FeedbackArgs, FineTuneCommand, InferArgs};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tz_client::GatewayClient;
use tz_fine_tuning::OpenAIConfig;

/// Settings resolved from flags, environment and config files.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub gateway_url: String,
    pub openai: OpenAIConfig,
    pub json: bool,
}

impl CommandContext {
    pub fn gateway(&self) -> Result<GatewayClient> {
        GatewayClient::new(&self.gateway_url).context("Failed to create gateway client")
    }

    pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Parses an argument that is either inline JSON or `@path` to a JSON file.
pub fn read_json_arg(arg: &str) -> Result<Value> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {path}"))
    } else {
        serde_json::from_str(arg).with_context(|| format!("Invalid JSON: {arg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_arg_inline_and_file() {
        assert_eq!(read_json_arg(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("input.json");
        std::fs::write(&path, "[true]").unwrap();
        assert_eq!(read_json_arg(&format!("@{}", path.display())).unwrap(), json!([true]));

        assert!(read_json_arg("not json").is_err());
        assert!(read_json_arg("@/definitely/missing.json").is_err());
    }
}
