//! `tz datapoint` implementation.

use super::{CommandContext, DatapointCommand, read_json_arg};
use anyhow::{Context, Result};
use colored::Colorize;
use tz_types::{Datapoint, DatapointOutputKind};

pub async fn execute(ctx: &CommandContext, command: DatapointCommand) -> Result<()> {
    match command {
        DatapointCommand::Create { dataset, inference_id, output } => {
            let output_kind = output.as_deref().map(str::parse::<DatapointOutputKind>).transpose()?;
            let response = ctx.gateway()?.create_datapoint(&dataset, &inference_id, output_kind).await?;
            if ctx.json {
                return CommandContext::print_json(&response);
            }
            println!("{} {} in {}", "✓ Created datapoint".green(), response.id.cyan(), dataset.bold());
        }
        DatapointCommand::Update { dataset, id, datapoint } => {
            let datapoint: Datapoint =
                serde_json::from_value(read_json_arg(&datapoint)?).context("Invalid datapoint")?;
            let response = ctx.gateway()?.update_datapoint(&dataset, &id, &datapoint).await?;
            if ctx.json {
                return CommandContext::print_json(&response);
            }
            println!("{} {} in {}", "✓ Updated datapoint".green(), response.id.cyan(), dataset.bold());
        }
    }
    Ok(())
}
