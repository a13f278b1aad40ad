//! Prompt templates applied while converting curated rows.
//!
//! Templates are looked up by role name (`system`, `user`, `assistant`). A role without a
//! registered template only accepts plain string content.

use crate::error::{FineTuningError, FineTuningResult};
use handlebars::Handlebars;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use tz_types::{InputMessageContent, Role};

/// Read-only template lookup used during row conversion.
pub trait TemplateEnv: Send + Sync {
    fn has_template(&self, name: &str) -> bool;

    fn render(&self, name: &str, data: &Value) -> FineTuningResult<String>;
}

/// Environment with no templates; every message must already be plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateEnv for NoTemplates {
    fn has_template(&self, _name: &str) -> bool {
        false
    }

    fn render(&self, name: &str, _data: &Value) -> FineTuningResult<String> {
        Err(FineTuningError::Template(format!("Template not found: {name}")))
    }
}

/// Handlebars-backed templates. Output is not HTML-escaped and missing fields are errors.
#[derive(Debug)]
pub struct HandlebarsTemplateEnv {
    registry: Handlebars<'static>,
}

impl Default for HandlebarsTemplateEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlebarsTemplateEnv {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        Self { registry }
    }

    pub fn register_template(&mut self, name: &str, source: &str) -> FineTuningResult<()> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| FineTuningError::Template(format!("Failed to register template {name}: {e}")))
    }

    /// Registers every file in `dir` under its file stem (`system.hbs` becomes `system`).
    pub fn from_dir(dir: &Path) -> FineTuningResult<Self> {
        let mut env = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            env.register_template(name, &source)?;
            debug!(template = name, path = %path.display(), "Registered template");
        }
        Ok(env)
    }
}

impl TemplateEnv for HandlebarsTemplateEnv {
    fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    fn render(&self, name: &str, data: &Value) -> FineTuningResult<String> {
        self.registry
            .render(name, data)
            .map_err(|e| FineTuningError::Template(format!("Failed to render template {name}: {e}")))
    }
}

/// Renders one text-like content block for `role`.
pub fn render_message(env: &dyn TemplateEnv, role: Role, block: &InputMessageContent) -> FineTuningResult<String> {
    let template = role.as_str();
    match block {
        InputMessageContent::Text { value } => {
            if env.has_template(template) {
                return env.render(template, value);
            }
            value.as_str().map(str::to_string).ok_or_else(|| {
                FineTuningError::Validation(format!(
                    "Text content for role {role} must be a string when no {template} template is registered"
                ))
            })
        }
        InputMessageContent::TextArguments { arguments } => {
            if env.has_template(template) {
                env.render(template, arguments)
            } else {
                Err(FineTuningError::Validation(format!(
                    "Template arguments for role {role} require a {template} template"
                )))
            }
        }
        InputMessageContent::RawText { value } => Ok(value.clone()),
        InputMessageContent::ToolCall(_) | InputMessageContent::ToolResult(_) => Err(
            FineTuningError::Validation("Tool content cannot be rendered as message text".to_string()),
        ),
    }
}
