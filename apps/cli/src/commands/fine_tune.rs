//! `tz fine-tune` implementation.
//!
//! `start` submits a job and prints its snapshot; `poll` owns the polling loop, including its
//! interval and timeout.

use super::{CommandContext, FineTuneCommand};
use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tz_fine_tuning::{
    FineTuningJob, FineTuningModel, FineTuningProvider, FineTuningProviders, HandlebarsTemplateEnv,
    JobSnapshot, JobStatus, JobStatusKind, NoTemplates, OpenAIClient, SftFormValues, SftJob, TemplateEnv,
};
use tz_types::ParsedInferenceRow;

pub async fn execute(ctx: &CommandContext, command: FineTuneCommand) -> Result<()> {
    match command {
        FineTuneCommand::Start {
            rows,
            model,
            provider,
            function,
            variant,
            metric,
            val_split,
            max_samples,
            templates,
        } => {
            let form = SftFormValues {
                function,
                metric,
                variant,
                model: FineTuningModel { name: model, provider: provider.parse()? },
                validation_split_percent: val_split,
                max_samples,
            };
            let rows = read_rows(&rows)?;
            let templates: Box<dyn TemplateEnv> = match templates {
                Some(dir) => Box::new(
                    HandlebarsTemplateEnv::from_dir(&dir)
                        .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
                ),
                None => Box::new(NoTemplates),
            };
            start(ctx, &form, rows, templates.as_ref()).await
        }
        FineTuneCommand::Poll { job_id, provider, wait, interval_secs, timeout_secs } => {
            let provider: FineTuningProvider = provider.parse()?;
            let timeout = timeout_secs.map(Duration::from_secs);
            poll(ctx, provider, job_id, wait, Duration::from_secs(interval_secs.max(1)), timeout).await
        }
    }
}

fn providers(ctx: &CommandContext) -> FineTuningProviders {
    FineTuningProviders::new().with_openai(OpenAIClient::new(ctx.openai.clone()))
}

/// Reads curated rows from a JSON lines file. Blank lines are skipped.
fn read_rows(path: &Path) -> Result<Vec<ParsedInferenceRow>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read rows from {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse row on line {} of {}", idx + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

async fn start(
    ctx: &CommandContext,
    form: &SftFormValues,
    rows: Vec<ParsedInferenceRow>,
    templates: &dyn TemplateEnv,
) -> Result<()> {
    let row_count = rows.len();
    let job = FineTuningJob::from_form_data(form, rows, templates, &providers(ctx)).await?;

    if ctx.json {
        return CommandContext::print_json(&json!({
            "provider": job.provider(),
            "snapshot": job.snapshot(),
        }));
    }

    println!();
    println!("{}", "Fine-tuning job started".bold().cyan());
    println!();
    println!("  {:<10} {}", "Job:".dimmed(), job.job_id().cyan());
    println!("  {:<10} {}", "Provider:".dimmed(), job.provider());
    println!("  {:<10} {}", "Model:".dimmed(), form.model.name);
    println!("  {:<10} {}", "Rows:".dimmed(), row_count);
    println!();
    println!(
        "  {}",
        format!("Check progress with `tz fine-tune poll --job-id {} --wait`", job.job_id()).dimmed()
    );
    Ok(())
}

async fn poll(
    ctx: &CommandContext,
    provider: FineTuningProvider,
    job_id: String,
    wait: bool,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<()> {
    let snapshot = JobSnapshot { job_id, status: JobStatus::created(), fine_tuned_model: None };
    let mut job = FineTuningJob::resume(provider, snapshot, &providers(ctx))?;
    let started = Instant::now();

    loop {
        job = job.poll().await?;
        report(ctx, &job)?;

        if !wait || job.snapshot().is_terminal() {
            break;
        }
        if let Some(timeout) = timeout {
            if started.elapsed() + interval > timeout {
                bail!(
                    "Timed out after {}s waiting for job {} (last status: {})",
                    timeout.as_secs(),
                    job.job_id(),
                    job.status().provider_status
                );
            }
        }
        tokio::time::sleep(interval).await;
    }

    match job.status().kind {
        JobStatusKind::Failed | JobStatusKind::Cancelled if wait => {
            bail!("Fine-tuning job {} finished with status {}", job.job_id(), job.status().provider_status)
        }
        _ => Ok(()),
    }
}

fn report(ctx: &CommandContext, job: &FineTuningJob) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(job.snapshot())?);
        return Ok(());
    }

    let status = &job.status().provider_status;
    let status = match job.status().kind {
        JobStatusKind::Succeeded => status.green(),
        JobStatusKind::Failed | JobStatusKind::Cancelled => status.red(),
        JobStatusKind::Created | JobStatusKind::Running => status.yellow(),
    };
    println!("{} {} {}", job.job_id().cyan(), "→".dimmed(), status);
    if let Some(model) = job.result() {
        println!("  {} {}", "Fine-tuned model:".dimmed(), model.bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_rows_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"input": {"messages": []}, "output": [{"type": "text", "text": "a"}]}"#,
                "\n\n",
                r#"{"input": {"messages": []}, "output": {"raw": "{}"}}"#,
                "\n"
            ),
        )
        .unwrap();

        assert_eq!(read_rows(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_read_rows_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"input\": {\"messages\": []}, \"output\": []}\n{oops\n").unwrap();

        let err = read_rows(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
