//! Provider-agnostic fine-tuning job handles.
//!
//! A job is an immutable snapshot of the provider's state. Polling never mutates a job; it
//! returns a new one. Callers own the polling schedule.

use crate::error::{FineTuningError, FineTuningResult};
use crate::form::SftFormValues;
use crate::openai::OpenAISftJob;
use crate::provider::{FineTuningProvider, FineTuningProviders};
use crate::template::TemplateEnv;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tz_types::ParsedInferenceRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatusKind {
    Created,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatusKind {
    /// Terminal jobs never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// The provider's own status string plus its normalized kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub provider_status: String,
    pub kind: JobStatusKind,
}

impl JobStatus {
    pub fn new(provider_status: impl Into<String>, kind: JobStatusKind) -> Self {
        Self { provider_status: provider_status.into(), kind }
    }

    /// Status of a job right after it was submitted.
    pub fn created() -> Self {
        Self::new("created", JobStatusKind::Created)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_tuned_model: Option<String>,
}

impl JobSnapshot {
    /// The trained model, only once the job has succeeded.
    pub fn result(&self) -> Option<&str> {
        match self.status.kind {
            JobStatusKind::Succeeded => self.fine_tuned_model.as_deref(),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.kind.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuningHyperParams {
    pub n_epochs: u32,
}

impl Default for FineTuningHyperParams {
    fn default() -> Self {
        Self { n_epochs: 1 }
    }
}

impl FineTuningHyperParams {
    pub fn validate(&self) -> FineTuningResult<()> {
        if self.n_epochs == 0 {
            return Err(FineTuningError::Validation("n_epochs must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// A supervised fine-tuning job running at some provider.
#[async_trait]
pub trait SftJob: Send + Sync + Sized {
    fn snapshot(&self) -> &JobSnapshot;

    fn job_id(&self) -> &str {
        &self.snapshot().job_id
    }

    fn status(&self) -> &JobStatus {
        &self.snapshot().status
    }

    fn result(&self) -> Option<&str> {
        self.snapshot().result()
    }

    /// Reads the provider's current state and returns it as a new job.
    ///
    /// Jobs that are already terminal are returned unchanged without contacting the provider.
    async fn poll(&self) -> FineTuningResult<Self>;
}

/// Fine-tuning job at any supported provider.
#[derive(Debug, Clone)]
pub enum FineTuningJob {
    OpenAI(OpenAISftJob),
}

impl FineTuningJob {
    /// Converts `rows`, uploads them to the form's provider and starts a job there.
    ///
    /// The form is validated by the provider before any row is converted.
    pub async fn from_form_data(
        form: &SftFormValues,
        rows: Vec<ParsedInferenceRow>,
        templates: &dyn TemplateEnv,
        providers: &FineTuningProviders,
    ) -> FineTuningResult<Self> {
        match form.model.provider {
            FineTuningProvider::OpenAI => {
                let client = providers.openai()?;
                OpenAISftJob::from_form_data(client, form, rows, templates).await.map(Self::OpenAI)
            }
        }
    }

    /// Rebuilds a handle for a job started earlier.
    pub fn resume(
        provider: FineTuningProvider,
        snapshot: JobSnapshot,
        providers: &FineTuningProviders,
    ) -> FineTuningResult<Self> {
        match provider {
            FineTuningProvider::OpenAI => {
                Ok(Self::OpenAI(OpenAISftJob::resume(providers.openai()?.clone(), snapshot)))
            }
        }
    }

    pub fn provider(&self) -> FineTuningProvider {
        match self {
            Self::OpenAI(_) => FineTuningProvider::OpenAI,
        }
    }
}

#[async_trait]
impl SftJob for FineTuningJob {
    fn snapshot(&self) -> &JobSnapshot {
        match self {
            Self::OpenAI(job) => job.snapshot(),
        }
    }

    async fn poll(&self) -> FineTuningResult<Self> {
        match self {
            Self::OpenAI(job) => job.poll().await.map(Self::OpenAI),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(kind: JobStatusKind, model: Option<&str>) -> JobSnapshot {
        JobSnapshot {
            job_id: "ftjob-1".to_string(),
            status: JobStatus::new(kind.to_string(), kind),
            fine_tuned_model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(!JobStatusKind::Created.is_terminal());
        assert!(!JobStatusKind::Running.is_terminal());
        assert!(JobStatusKind::Succeeded.is_terminal());
        assert!(JobStatusKind::Failed.is_terminal());
        assert!(JobStatusKind::Cancelled.is_terminal());
    }

    #[test]
    fn test_result_only_after_success() {
        assert_eq!(snapshot(JobStatusKind::Succeeded, Some("ft:gpt")).result(), Some("ft:gpt"));
        assert_eq!(snapshot(JobStatusKind::Running, Some("ft:gpt")).result(), None);
        assert_eq!(snapshot(JobStatusKind::Failed, None).result(), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let value = serde_json::to_value(snapshot(JobStatusKind::Running, None)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "job_id": "ftjob-1",
                "status": {"provider_status": "running", "kind": "running"}
            })
        );
        let back: JobSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot(JobStatusKind::Running, None));
    }

    #[test]
    fn test_hyperparams_default_and_validate() {
        assert_eq!(FineTuningHyperParams::default().n_epochs, 1);
        assert!(FineTuningHyperParams { n_epochs: 0 }.validate().is_err());
    }

    #[test]
    fn test_resume_requires_configured_provider() {
        let err = FineTuningJob::resume(
            FineTuningProvider::OpenAI,
            snapshot(JobStatusKind::Running, None),
            &FineTuningProviders::new(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}
