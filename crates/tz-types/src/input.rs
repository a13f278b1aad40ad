//! Conversation input shared by inference requests, datapoints and curated rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name of the role, also used as the template name for that role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// The arguments as a JSON string.
    pub arguments: String,
    pub id: String,
}

/// A tool call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub result: String,
    pub id: String,
}

/// One typed unit of input message content.
///
/// The `type` tag decides the variant; the remaining fields are never inspected to guess it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputMessageContent {
    /// Structured value, rendered through the role's template or used as-is when it is a string.
    Text { value: Value },
    /// Arguments for the role's template.
    TextArguments { arguments: Value },
    /// Literal text that is never templated.
    RawText { value: String },
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// An input message sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: Vec<InputMessageContent>,
}

impl InputMessage {
    /// A message holding a single plain-text block.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self { role, content: vec![InputMessageContent::Text { value: Value::String(text.into()) }] }
    }
}

/// The inference input object. Message order is conversation order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<Value>,
    #[serde(default)]
    pub messages: Vec<InputMessage>,
}

impl Input {
    /// Checks the structural rules the gateway enforces on stored inputs.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, message) in self.messages.iter().enumerate() {
            if message.content.is_empty() {
                return Err(format!("input.messages[{idx}] has no content"));
            }
            for block in &message.content {
                match block {
                    InputMessageContent::ToolCall(call) if call.id.trim().is_empty() => {
                        return Err(format!("input.messages[{idx}] tool_call is missing an id"));
                    }
                    InputMessageContent::ToolResult(result) if result.id.trim().is_empty() => {
                        return Err(format!("input.messages[{idx}] tool_result is missing an id"));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_tag_is_authoritative() {
        let block: InputMessageContent =
            serde_json::from_value(json!({"type": "raw_text", "value": "{{ not a template }}"}))
                .unwrap();
        assert_eq!(block, InputMessageContent::RawText { value: "{{ not a template }}".to_string() });

        // A `text` tag with tool-call-shaped fields is still rejected rather than reinterpreted.
        let result: Result<InputMessageContent, _> = serde_json::from_value(
            json!({"type": "text", "name": "f", "arguments": "{}", "id": "1"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_tool_call_block_wire_shape() {
        let block = InputMessageContent::ToolCall(ToolCall {
            name: "get_weather".to_string(),
            arguments: r#"{"city":"Paris"}"#.to_string(),
            id: "call_1".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "tool_call", "name": "get_weather", "arguments": "{\"city\":\"Paris\"}", "id": "call_1"})
        );
    }

    #[test]
    fn test_message_order_preserved() {
        let input: Input = serde_json::from_value(json!({
            "system": {"persona": "pirate"},
            "messages": [
                {"role": "user", "content": [{"type": "text", "value": "first"}]},
                {"role": "assistant", "content": [{"type": "text", "value": "second"}]},
                {"role": "user", "content": [{"type": "text_arguments", "arguments": {"n": 3}}]}
            ]
        }))
        .unwrap();

        let roles: Vec<Role> = input.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(input.system, Some(json!({"persona": "pirate"})));
    }

    #[test]
    fn test_validate_rejects_empty_content_and_missing_ids() {
        let input = Input {
            system: None,
            messages: vec![InputMessage { role: Role::User, content: vec![] }],
        };
        assert!(input.validate().is_err());

        let input = Input {
            system: None,
            messages: vec![InputMessage {
                role: Role::Assistant,
                content: vec![InputMessageContent::ToolCall(ToolCall {
                    name: "f".to_string(),
                    arguments: "{}".to_string(),
                    id: " ".to_string(),
                })],
            }],
        };
        assert!(input.validate().unwrap_err().contains("missing an id"));

        assert!(Input { system: None, messages: vec![InputMessage::text(Role::User, "hi")] }
            .validate()
            .is_ok());
    }
}
