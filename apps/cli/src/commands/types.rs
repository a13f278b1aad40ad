//! Command type definitions shared between main.rs and the command modules.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct InferArgs {
    /// Function to call (mutually exclusive with --model)
    #[arg(long, conflicts_with = "model")]
    pub function: Option<String>,

    /// Model to call directly
    #[arg(long)]
    pub model: Option<String>,

    /// Input object as JSON, or @path to read it from a file
    #[arg(long)]
    pub input: String,

    /// Pin a specific variant
    #[arg(long)]
    pub variant: Option<String>,

    /// Continue an existing episode
    #[arg(long)]
    pub episode: Option<String>,

    /// Stream the response as it is generated
    #[arg(long)]
    pub stream: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FeedbackArgs {
    /// Metric name
    #[arg(long)]
    pub metric: String,

    /// Metric value as JSON (e.g. true, 0.8, "text")
    #[arg(long)]
    pub value: String,

    /// Inference the feedback is about
    #[arg(long, conflicts_with = "episode_id", required_unless_present = "episode_id")]
    pub inference_id: Option<String>,

    /// Episode the feedback is about
    #[arg(long)]
    pub episode_id: Option<String>,

    /// Tag as key=value (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Validate without persisting
    #[arg(long)]
    pub dryrun: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DatapointCommand {
    /// Add a datapoint to a dataset from an existing inference
    Create {
        /// Dataset name
        #[arg(long)]
        dataset: String,

        /// Source inference
        #[arg(long)]
        inference_id: String,

        /// Output to keep (inherit, demonstration, none)
        #[arg(long)]
        output: Option<String>,
    },

    /// Replace a datapoint
    Update {
        /// Dataset name
        #[arg(long)]
        dataset: String,

        /// Datapoint ID
        #[arg(long)]
        id: String,

        /// Datapoint as JSON, or @path to read it from a file
        #[arg(long)]
        datapoint: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FineTuneCommand {
    /// Upload curated rows and start a fine-tuning job
    Start {
        /// Curated inference rows (JSON lines)
        #[arg(long)]
        rows: PathBuf,

        /// Base model to fine-tune
        #[arg(long)]
        model: String,

        /// Provider hosting the model
        #[arg(long, default_value = "openai")]
        provider: String,

        /// Function the rows belong to
        #[arg(long)]
        function: String,

        /// Variant whose templates apply
        #[arg(long)]
        variant: String,

        /// Metric the rows were curated by
        #[arg(long)]
        metric: String,

        /// Percent of rows held out for validation
        #[arg(long, default_value_t = 20)]
        val_split: u32,

        /// Use at most this many rows
        #[arg(long)]
        max_samples: Option<usize>,

        /// Directory of templates named after roles (system.hbs, user.hbs, ...)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Check on a fine-tuning job
    Poll {
        /// Provider job ID
        #[arg(long)]
        job_id: String,

        /// Provider hosting the job
        #[arg(long, default_value = "openai")]
        provider: String,

        /// Keep polling until the job finishes
        #[arg(long)]
        wait: bool,

        /// Seconds between polls with --wait
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}
