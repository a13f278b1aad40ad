//! Supervised fine-tuning jobs for hosted model providers.
//!
//! Curated inference rows are converted into provider training samples, uploaded, and
//! turned into a fine-tuning job. Jobs are immutable snapshots: [`SftJob::poll`] returns a
//! fresh job instead of updating the one it was called on, and callers decide when to poll.

pub mod error;
pub mod form;
pub mod job;
pub mod openai;
pub mod provider;
pub mod split;
pub mod template;

pub use error::{FineTuningError, FineTuningResult};
pub use form::{FineTuningModel, SftFormValues};
pub use job::{FineTuningHyperParams, FineTuningJob, JobSnapshot, JobStatus, JobStatusKind, SftJob};
pub use openai::{OpenAIClient, OpenAIConfig, OpenAISftJob};
pub use provider::{FineTuningProvider, FineTuningProviders};
pub use split::{SplitData, split_validation_data};
pub use template::{HandlebarsTemplateEnv, NoTemplates, TemplateEnv, render_message};
