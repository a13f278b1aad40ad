//! `tz feedback` implementation.

use super::{CommandContext, FeedbackArgs, read_json_arg};
use anyhow::{Result, bail};
use colored::Colorize;
use std::collections::HashMap;
use tz_types::FeedbackRequest;

pub async fn execute(ctx: &CommandContext, args: FeedbackArgs) -> Result<()> {
    let value = read_json_arg(&args.value)?;
    let tags = parse_tags(&args.tags)?;
    let request = FeedbackRequest {
        metric_name: args.metric,
        value,
        episode_id: args.episode_id,
        inference_id: args.inference_id,
        tags: (!tags.is_empty()).then_some(tags),
        dryrun: args.dryrun.then_some(true),
    };

    let response = ctx.gateway()?.submit_feedback(&request).await?;
    if ctx.json {
        return CommandContext::print_json(&response);
    }

    println!("{} {}", "✓ Feedback recorded:".green(), response.feedback_id.cyan());
    if args.dryrun {
        println!("  {}", "Dry run, nothing was persisted.".dimmed());
    }
    Ok(())
}

fn parse_tags(tags: &[String]) -> Result<HashMap<String, String>> {
    let mut parsed = HashMap::new();
    for tag in tags {
        let Some((key, value)) = tag.split_once('=') else {
            bail!("Invalid tag {tag:?}, expected key=value");
        };
        if key.trim().is_empty() {
            bail!("Invalid tag {tag:?}, key is empty");
        }
        parsed.insert(key.trim().to_string(), value.to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(&["user=alice".to_string(), "expr=a=b".to_string()]).unwrap();
        assert_eq!(tags["user"], "alice");
        assert_eq!(tags["expr"], "a=b");

        assert!(parse_tags(&["novalue".to_string()]).is_err());
        assert!(parse_tags(&["=x".to_string()]).is_err());
    }
}
