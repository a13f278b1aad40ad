//! OpenAI supervised fine-tuning.
//!
//! Starting a job converts curated rows into chat samples, uploads the training and
//! validation splits as JSONL files, and creates a fine-tuning job referencing them.
//!
//! # Example
//!
//! ```no_run
//! use tz_fine_tuning::openai::{OpenAIClient, OpenAIConfig, OpenAISftJob};
//! use tz_fine_tuning::{JobSnapshot, SftJob};
//!
//! # async fn example(snapshot: JobSnapshot) -> Result<(), tz_fine_tuning::FineTuningError> {
//! let client = OpenAIClient::new(OpenAIConfig::from_env());
//! let job = OpenAISftJob::resume(client, snapshot).poll().await?;
//! if let Some(model) = job.result() {
//!     println!("fine-tuned model: {model}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod messages;

pub use messages::{OpenAIFunctionCall, OpenAIMessage, OpenAIToolCall, inference_to_openai_messages, to_jsonl};

use crate::error::{FineTuningError, FineTuningResult};
use crate::form::SftFormValues;
use crate::job::{FineTuningHyperParams, JobSnapshot, JobStatus, JobStatusKind, SftJob};
use crate::split::split_validation_data;
use crate::template::TemplateEnv;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};
use tz_types::ParsedInferenceRow;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the OpenAI API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Where training files are staged before upload; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: DEFAULT_OPENAI_BASE_URL.to_string(), temp_dir: None }
    }
}

impl OpenAIConfig {
    /// Reads `OPENAI_API_KEY` and `OPENAI_BASE_URL`. A missing key is not an error here.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|key| !key.trim().is_empty());
        let base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Self { api_key, base_url, temp_dir: None }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }
}

/// A fine-tuning job as reported by `/fine_tuning/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIFineTuningJob {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
}

impl OpenAIFineTuningJob {
    pub fn to_snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id.clone(),
            status: JobStatus::new(self.status.clone(), map_job_status(&self.status)),
            fine_tuned_model: self.fine_tuned_model.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    model: &'a str,
    training_file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_file: Option<&'a str>,
    hyperparameters: FineTuningHyperParams,
}

/// Normalizes an OpenAI job status. Unknown statuses count as still running.
pub fn map_job_status(status: &str) -> JobStatusKind {
    match status {
        "validating_files" | "queued" | "running" => JobStatusKind::Running,
        "succeeded" => JobStatusKind::Succeeded,
        "failed" => JobStatusKind::Failed,
        "cancelled" => JobStatusKind::Cancelled,
        other => {
            warn!(status = other, "Unknown OpenAI fine-tuning status, treating as running");
            JobStatusKind::Running
        }
    }
}

/// Client for the OpenAI files and fine-tuning endpoints.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    pub fn with_http_client(config: OpenAIConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Appends percent-encoded path segments to the configured base URL.
    fn endpoint(&self, segments: &[&str]) -> FineTuningResult<Url> {
        let invalid = || FineTuningError::Validation(format!("Invalid OpenAI base URL {:?}", self.config.base_url));
        let mut url = Url::parse(self.config.base_url.trim()).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|()| invalid())?.pop_if_empty().extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref api_key) => request.bearer_auth(api_key),
            None => request,
        }
    }

    /// Uploads samples as a JSONL fine-tuning file and returns its file id.
    ///
    /// The samples are staged in a temporary file that is removed whether or not the upload
    /// succeeds.
    pub async fn upload_examples(&self, samples: &[Vec<OpenAIMessage>]) -> FineTuningResult<String> {
        let jsonl = to_jsonl(samples)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("temp_training_data_").suffix(".jsonl");
        let temp_file = match self.config.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let result = self.upload_file(&temp_file, jsonl).await;

        let path = temp_file.path().to_path_buf();
        if let Err(e) = temp_file.close() {
            warn!(path = %path.display(), error = %e, "Error deleting temporary training file");
        }
        result
    }

    async fn upload_file(&self, temp_file: &NamedTempFile, jsonl: String) -> FineTuningResult<String> {
        tokio::fs::write(temp_file.path(), jsonl).await?;
        let file = tokio::fs::File::open(temp_file.path()).await?;
        let size = file.metadata().await?.len();
        let file_name = temp_file
            .path()
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("training_data.jsonl")
            .to_string();

        debug!(file_name = %file_name, size, "Uploading fine-tuning file");

        let form = Form::new()
            .text("purpose", "fine-tune")
            .part("file", Part::stream_with_length(Body::from(file), size).file_name(file_name));
        let request = self.authorize(self.client.post(self.endpoint(&["files"])?).multipart(form));
        let file: FileObject = parse_body(send(request).await?).await?;

        debug!(file_id = %file.id, "Fine-tuning file uploaded");
        Ok(file.id)
    }

    /// Creates a fine-tuning job over previously uploaded files.
    pub async fn create_job(
        &self,
        model: &str,
        training_file: &str,
        validation_file: Option<&str>,
        hyperparams: &FineTuningHyperParams,
    ) -> FineTuningResult<OpenAIFineTuningJob> {
        let body = CreateJobRequest { model, training_file, validation_file, hyperparameters: *hyperparams };
        let request = self.authorize(self.client.post(self.endpoint(&["fine_tuning", "jobs"])?).json(&body));

        let result = match send(request).await {
            Ok(response) => parse_body::<OpenAIFineTuningJob>(response).await,
            Err(e) => Err(e),
        };
        let job = result.map_err(|e| {
            error!(error = %e, model, training_file, "Error creating fine-tuning job");
            FineTuningError::provider("Error creating fine-tuning job", e)
        })?;

        debug!(job_id = %job.id, status = %job.status, "Fine-tuning job created");
        Ok(job)
    }

    /// Fetches the current state of a fine-tuning job.
    ///
    /// The id is sent as a single percent-encoded path segment; blank ids and dot segments
    /// are rejected before any request.
    pub async fn retrieve_job(&self, job_id: &str) -> FineTuningResult<OpenAIFineTuningJob> {
        if matches!(job_id.trim(), "" | "." | "..") {
            return Err(FineTuningError::Validation(format!("Invalid fine-tuning job ID {job_id:?}")));
        }
        let url = self.endpoint(&["fine_tuning", "jobs", job_id])?;
        let request = self.authorize(self.client.get(url));
        parse_body(send(request).await?).await
    }
}

async fn send(request: RequestBuilder) -> FineTuningResult<Response> {
    let response = request.send().await.map_err(|e| {
        error!(error = %e, "Failed to send request to OpenAI");
        FineTuningError::network(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.ok().filter(|text| !text.trim().is_empty());
        error!(
            status = %status,
            error = body.as_deref().unwrap_or_default(),
            "OpenAI returned error status"
        );
        return Err(FineTuningError::Transport { status: Some(status.as_u16()), body });
    }
    Ok(response)
}

async fn parse_body<T: DeserializeOwned>(response: Response) -> FineTuningResult<T> {
    let bytes = response.bytes().await.map_err(FineTuningError::network)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FineTuningError::Parse(format!("Failed to parse OpenAI response: {e}")))
}

/// Converts rows, uploads both splits concurrently and creates the job.
pub async fn start_sft_openai(
    client: &OpenAIClient,
    model_name: &str,
    rows: Vec<ParsedInferenceRow>,
    validation_split_percent: u32,
    templates: &dyn TemplateEnv,
    hyperparams: &FineTuningHyperParams,
) -> FineTuningResult<OpenAISftJob> {
    hyperparams.validate()?;

    let split = split_validation_data(rows, validation_split_percent);
    let train = split
        .train
        .iter()
        .map(|row| inference_to_openai_messages(row, templates))
        .collect::<FineTuningResult<Vec<_>>>()?;
    let validation = split
        .validation
        .iter()
        .map(|row| inference_to_openai_messages(row, templates))
        .collect::<FineTuningResult<Vec<_>>>()?;

    if train.is_empty() {
        return Err(FineTuningError::Validation(
            "No training examples left after the validation split".to_string(),
        ));
    }

    debug!(
        model = model_name,
        train_samples = train.len(),
        validation_samples = validation.len(),
        "Starting OpenAI fine-tuning"
    );

    let (training_file, validation_file) = tokio::try_join!(client.upload_examples(&train), async {
        if validation.is_empty() {
            Ok(None)
        } else {
            client.upload_examples(&validation).await.map(Some)
        }
    })?;

    let job = client
        .create_job(model_name, &training_file, validation_file.as_deref(), hyperparams)
        .await?;

    Ok(OpenAISftJob::started(client.clone(), job.id))
}

/// Supervised fine-tuning job at OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAISftJob {
    client: OpenAIClient,
    snapshot: JobSnapshot,
}

impl OpenAISftJob {
    fn started(client: OpenAIClient, job_id: String) -> Self {
        Self { client, snapshot: JobSnapshot { job_id, status: JobStatus::created(), fine_tuned_model: None } }
    }

    /// Rebuilds a job handle from a stored snapshot.
    pub fn resume(client: OpenAIClient, snapshot: JobSnapshot) -> Self {
        Self { client, snapshot }
    }

    pub async fn from_form_data(
        client: &OpenAIClient,
        form: &SftFormValues,
        mut rows: Vec<ParsedInferenceRow>,
        templates: &dyn TemplateEnv,
    ) -> FineTuningResult<Self> {
        form.validate()?;
        if let Some(max_samples) = form.max_samples {
            rows.truncate(max_samples);
        }
        if rows.is_empty() {
            return Err(FineTuningError::Validation("No curated inferences found".to_string()));
        }

        debug!(
            function = %form.function,
            variant = %form.variant,
            metric = %form.metric,
            rows = rows.len(),
            "Preparing OpenAI fine-tuning job"
        );
        start_sft_openai(
            client,
            &form.model.name,
            rows,
            form.validation_split_percent,
            templates,
            &FineTuningHyperParams::default(),
        )
        .await
    }
}

#[async_trait]
impl SftJob for OpenAISftJob {
    fn snapshot(&self) -> &JobSnapshot {
        &self.snapshot
    }

    async fn poll(&self) -> FineTuningResult<Self> {
        if self.snapshot.job_id.trim().is_empty() {
            return Err(FineTuningError::Validation("Job ID is required to poll OpenAI SFT".to_string()));
        }
        if self.snapshot.is_terminal() {
            debug!(job_id = %self.snapshot.job_id, status = %self.snapshot.status.kind, "Job already finished");
            return Ok(self.clone());
        }

        let job = self
            .client
            .retrieve_job(&self.snapshot.job_id)
            .await
            .map_err(|e| {
                error!(job_id = %self.snapshot.job_id, error = %e, "Failed to poll fine-tuning job");
                FineTuningError::provider("Failed to poll OpenAI fine-tuning job", e)
            })?;

        Ok(Self { client: self.client.clone(), snapshot: job.to_snapshot() })
    }
}
