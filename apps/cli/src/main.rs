//! tz - command-line client for the TensorZero gateway
//!
//! Runs inferences, records feedback, curates dataset datapoints, and drives
//! supervised fine-tuning jobs from the terminal.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{CommandContext, DatapointCommand, FeedbackArgs, FineTuneCommand, InferArgs};
use commands::{datapoint, feedback, fine_tune, infer};

/// tz - TensorZero gateway client
#[derive(Parser, Debug)]
#[command(
    name = "tz",
    author,
    version,
    about = "tz - TensorZero gateway and fine-tuning client",
    long_about = "tz talks to a TensorZero gateway: run inferences, record feedback and manage dataset datapoints.\nIt can also start and monitor supervised fine-tuning jobs from curated inference rows."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Gateway URL (overrides TENSORZERO_GATEWAY_URL and config files)
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an inference against a function or model
    Infer(InferArgs),

    /// Attach a metric value to an inference or episode
    Feedback(FeedbackArgs),

    /// Manage dataset datapoints
    #[command(subcommand)]
    Datapoint(DatapointCommand),

    /// Start and monitor supervised fine-tuning jobs
    #[command(subcommand)]
    FineTune(FineTuneCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_config = config::load_config();

    // Initialize tracing
    let log_level = args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("info");
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // If no command provided, show help
    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let ctx = CommandContext {
        gateway_url: cli_config.resolve_gateway_url(args.gateway_url),
        openai: cli_config.openai_config(),
        json: args.json || cli_config.wants_json(),
    };

    match command {
        Command::Infer(infer_args) => infer::execute(&ctx, infer_args).await?,
        Command::Feedback(feedback_args) => feedback::execute(&ctx, feedback_args).await?,
        Command::Datapoint(cmd) => datapoint::execute(&ctx, cmd).await?,
        Command::FineTune(cmd) => fine_tune::execute(&ctx, cmd).await?,
    }

    Ok(())
}
