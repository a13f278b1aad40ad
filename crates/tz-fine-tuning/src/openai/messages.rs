//! Conversion of curated rows into OpenAI chat fine-tuning samples.

use crate::error::{FineTuningError, FineTuningResult};
use crate::template::{TemplateEnv, render_message};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tz_types::{ContentBlockOutput, InferenceOutput, InputMessageContent, ParsedInferenceRow, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAIFunctionCall,
}

/// One chat message of a training sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl OpenAIMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: Some(content.into()), tool_calls: None, tool_call_id: None }
    }
}

/// Converts one curated row into the message list of a training sample.
pub fn inference_to_openai_messages(
    row: &ParsedInferenceRow,
    env: &dyn TemplateEnv,
) -> FineTuningResult<Vec<OpenAIMessage>> {
    let mut messages = Vec::new();

    if env.has_template("system") {
        let system = row.input.system.clone().unwrap_or(Value::Null);
        messages.push(OpenAIMessage::text(Role::System, env.render("system", &system)?));
    } else {
        match &row.input.system {
            None => {}
            Some(Value::String(system)) if system.is_empty() => {}
            Some(Value::String(system)) => messages.push(OpenAIMessage::text(Role::System, system.clone())),
            Some(_) => {
                return Err(FineTuningError::Validation(
                    "System message must be a string when not using templates".to_string(),
                ));
            }
        }
    }

    for message in &row.input.messages {
        for block in &message.content {
            messages.push(content_block_to_openai_message(block, message.role, env)?);
        }
    }

    messages.push(OpenAIMessage::text(Role::Assistant, output_text(&row.output)?));
    Ok(messages)
}

fn content_block_to_openai_message(
    block: &InputMessageContent,
    role: Role,
    env: &dyn TemplateEnv,
) -> FineTuningResult<OpenAIMessage> {
    match block {
        InputMessageContent::ToolCall(call) => Ok(OpenAIMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![OpenAIToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: OpenAIFunctionCall { name: call.name.clone(), arguments: call.arguments.clone() },
            }]),
            tool_call_id: None,
        }),
        InputMessageContent::ToolResult(result) => Ok(OpenAIMessage {
            role: Role::Tool,
            content: Some(result.result.clone()),
            tool_calls: None,
            tool_call_id: Some(result.id.clone()),
        }),
        InputMessageContent::Text { .. }
        | InputMessageContent::TextArguments { .. }
        | InputMessageContent::RawText { .. } => Ok(OpenAIMessage::text(role, render_message(env, role, block)?)),
    }
}

fn output_text(output: &InferenceOutput) -> FineTuningResult<String> {
    match output {
        InferenceOutput::Chat(blocks) => match blocks.as_slice() {
            [ContentBlockOutput::Text { text }] => Ok(text.clone()),
            [_] => Err(FineTuningError::Validation(
                "Chat inference must have a text message as output".to_string(),
            )),
            _ => Err(FineTuningError::Validation(
                "Chat inference must have exactly one message".to_string(),
            )),
        },
        InferenceOutput::Json(json) => json
            .raw
            .clone()
            .ok_or_else(|| FineTuningError::Validation("Invalid inference type".to_string())),
    }
}

#[derive(Serialize)]
struct TrainingSample<'a> {
    messages: &'a [OpenAIMessage],
}

/// Serializes samples as JSON lines, one `{"messages": [...]}` object per line.
pub fn to_jsonl(samples: &[Vec<OpenAIMessage>]) -> FineTuningResult<String> {
    let lines = samples
        .iter()
        .map(|messages| serde_json::to_string(&TrainingSample { messages }))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{HandlebarsTemplateEnv, NoTemplates};
    use serde_json::json;
    use tz_types::{Input, InputMessage, JsonInferenceOutput, ToolCall, ToolCallOutput, ToolResult};

    fn row(system: Option<Value>, output: InferenceOutput) -> ParsedInferenceRow {
        ParsedInferenceRow {
            input: Input { system, messages: vec![InputMessage::text(Role::User, "Write a haiku")] },
            output,
            tags: Default::default(),
        }
    }

    fn text_output(texts: &[&str]) -> InferenceOutput {
        InferenceOutput::Chat(texts.iter().map(|t| ContentBlockOutput::Text { text: (*t).to_string() }).collect())
    }

    #[test]
    fn test_chat_row_with_one_text_block() {
        let messages =
            inference_to_openai_messages(&row(Some(json!("Be terse.")), text_output(&["leaves fall"])), &NoTemplates)
                .unwrap();

        assert_eq!(
            messages,
            vec![
                OpenAIMessage::text(Role::System, "Be terse."),
                OpenAIMessage::text(Role::User, "Write a haiku"),
                OpenAIMessage::text(Role::Assistant, "leaves fall"),
            ]
        );
    }

    #[test]
    fn test_chat_output_must_be_single_text_block() {
        let none = inference_to_openai_messages(&row(None, text_output(&[])), &NoTemplates);
        assert!(none.unwrap_err().is_validation());

        let two = inference_to_openai_messages(&row(None, text_output(&["a", "b"])), &NoTemplates);
        assert!(two.unwrap_err().to_string().contains("exactly one"));

        let tool = InferenceOutput::Chat(vec![ContentBlockOutput::ToolCall(ToolCallOutput {
            id: "call-1".to_string(),
            raw_name: "lookup".to_string(),
            raw_arguments: "{}".to_string(),
            name: None,
            arguments: None,
        })]);
        let err = inference_to_openai_messages(&row(None, tool), &NoTemplates).unwrap_err();
        assert!(err.to_string().contains("text message"));
    }

    #[test]
    fn test_json_output_uses_raw() {
        let output = InferenceOutput::Json(JsonInferenceOutput { raw: Some("42".to_string()), parsed: Some(json!(42)) });
        let messages = inference_to_openai_messages(&row(None, output), &NoTemplates).unwrap();
        assert_eq!(messages.last(), Some(&OpenAIMessage::text(Role::Assistant, "42")));

        let missing = InferenceOutput::Json(JsonInferenceOutput { raw: None, parsed: Some(json!(42)) });
        let err = inference_to_openai_messages(&row(None, missing), &NoTemplates).unwrap_err();
        assert!(err.to_string().contains("Invalid inference type"));
    }

    #[test]
    fn test_structured_system_needs_template() {
        let sample = row(Some(json!({"persona": "poet"})), text_output(&["ok"]));
        let err = inference_to_openai_messages(&sample, &NoTemplates).unwrap_err();
        assert_eq!(err.to_string(), "Validation Error: System message must be a string when not using templates");

        let mut env = HandlebarsTemplateEnv::new();
        env.register_template("system", "You are a {{persona}}.").unwrap();
        let messages = inference_to_openai_messages(&sample, &env).unwrap();
        assert_eq!(messages[0], OpenAIMessage::text(Role::System, "You are a poet."));
    }

    #[test]
    fn test_tool_blocks() {
        let sample = ParsedInferenceRow {
            input: Input {
                system: None,
                messages: vec![
                    InputMessage {
                        role: Role::Assistant,
                        content: vec![InputMessageContent::ToolCall(ToolCall {
                            name: "get_weather".to_string(),
                            arguments: r#"{"city":"Oslo"}"#.to_string(),
                            id: "call-1".to_string(),
                        })],
                    },
                    InputMessage {
                        role: Role::User,
                        content: vec![InputMessageContent::ToolResult(ToolResult {
                            name: "get_weather".to_string(),
                            result: "rainy".to_string(),
                            id: "call-1".to_string(),
                        })],
                    },
                ],
            },
            output: text_output(&["Bring an umbrella."]),
            tags: Default::default(),
        };

        let messages = inference_to_openai_messages(&sample, &NoTemplates).unwrap();
        assert_eq!(
            serde_json::to_value(&messages[..2]).unwrap(),
            json!([
                {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call-1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}
                    }]
                },
                {"role": "tool", "content": "rainy", "tool_call_id": "call-1"}
            ])
        );
    }

    #[test]
    fn test_to_jsonl_one_sample_per_line() {
        let samples = vec![
            vec![OpenAIMessage::text(Role::User, "a")],
            vec![OpenAIMessage::text(Role::User, "b\nc")],
        ];
        let jsonl = to_jsonl(&samples).unwrap();
        let lines: Vec<_> = jsonl.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"messages":[{"role":"user","content":"a"}]}"#);
        assert!(!jsonl.ends_with('\n'));
    }
}
