//! `tz infer` implementation.

use super::{CommandContext, InferArgs, read_json_arg};
use anyhow::{Context, Result};
use colored::Colorize;
use futures::StreamExt;
use std::io::Write;
use tz_types::{ContentBlockOutput, InferenceRequest, InferenceResponse, Input};

pub async fn execute(ctx: &CommandContext, args: InferArgs) -> Result<()> {
    let input: Input = serde_json::from_value(read_json_arg(&args.input)?).context("Invalid inference input")?;
    let request = InferenceRequest {
        function_name: args.function,
        model_name: args.model,
        episode_id: args.episode,
        variant_name: args.variant,
        input,
        ..InferenceRequest::default()
    };

    let client = ctx.gateway()?;
    if args.stream {
        stream(ctx, &client, request).await
    } else {
        let response = client.infer_once(request).await?;
        if ctx.json {
            CommandContext::print_json(&response)
        } else {
            print_response(&response);
            Ok(())
        }
    }
}

async fn stream(ctx: &CommandContext, client: &tz_client::GatewayClient, request: InferenceRequest) -> Result<()> {
    let mut chunks = client.infer_stream(request).await?;
    let mut last = None;
    let mut stdout = std::io::stdout();

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        if ctx.json {
            println!("{}", serde_json::to_string(&chunk)?);
        } else {
            write!(stdout, "{}", response_text(&chunk))?;
            stdout.flush()?;
        }
        last = Some(chunk);
    }

    if !ctx.json {
        println!();
        if let Some(last) = last {
            print_footer(&last);
        }
    }
    Ok(())
}

fn response_text(response: &InferenceResponse) -> String {
    match response {
        InferenceResponse::Chat(chat) => chat
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlockOutput::Text { text } => Some(text.as_str()),
                ContentBlockOutput::ToolCall(_) => None,
            })
            .collect(),
        InferenceResponse::Json(json) => json.output.raw.clone(),
    }
}

fn print_response(response: &InferenceResponse) {
    println!();
    println!("{}", response_text(response));
    if let InferenceResponse::Chat(chat) = response {
        for block in &chat.content {
            if let ContentBlockOutput::ToolCall(call) = block {
                println!("  {} {}({})", "tool call".yellow(), call.raw_name.bold(), call.raw_arguments.dimmed());
            }
        }
    }
    println!();
    print_footer(response);
}

fn print_footer(response: &InferenceResponse) {
    println!("{} {}", "Inference:".dimmed(), response.inference_id().cyan());
    println!("{} {}", "Episode:  ".dimmed(), response.episode_id().cyan());
    println!("{} {}", "Variant:  ".dimmed(), response.variant_name());
    if let Some(usage) = response.usage() {
        println!(
            "{} {} in / {} out",
            "Tokens:   ".dimmed(),
            usage.input_tokens,
            usage.output_tokens
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tz_types::{ChatInferenceResponse, JsonInferenceResponse, JsonOutput};

    #[test]
    fn test_response_text() {
        let chat = InferenceResponse::Chat(ChatInferenceResponse {
            inference_id: "i".to_string(),
            episode_id: "e".to_string(),
            variant_name: "v".to_string(),
            content: vec![
                ContentBlockOutput::Text { text: "leaves ".to_string() },
                ContentBlockOutput::Text { text: "fall".to_string() },
            ],
            usage: None,
        });
        assert_eq!(response_text(&chat), "leaves fall");

        let json = InferenceResponse::Json(JsonInferenceResponse {
            inference_id: "i".to_string(),
            episode_id: "e".to_string(),
            variant_name: "v".to_string(),
            output: JsonOutput { raw: "{\"n\":1}".to_string(), parsed: None },
            usage: None,
        });
        assert_eq!(response_text(&json), "{\"n\":1}");
    }
}
