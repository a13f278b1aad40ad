use thiserror::Error;

pub type FineTuningResult<T> = std::result::Result<T, FineTuningError>;

#[derive(Debug, Error)]
pub enum FineTuningError {
    /// Caller input or a curated row was unusable. Raised before any network attempt.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// The provider answered with a non-2xx status, or the connection failed.
    #[error(
        "Provider request failed{}{}",
        status.map(|s| format!(" with status {s}")).unwrap_or_default(),
        body.as_ref().map(|b| format!(": {b}")).unwrap_or_default()
    )]
    Transport { status: Option<u16>, body: Option<String> },

    /// A 2xx body did not match the expected shape.
    #[error("Parse Error: {0}")]
    Parse(String),

    /// A provider operation failed; `source` keeps the original cause.
    #[error("{context}: {source}")]
    Provider { context: String, source: Box<FineTuningError> },

    #[error("Template Error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FineTuningError {
    pub fn provider(context: impl Into<String>, source: Self) -> Self {
        Self::Provider { context: context.into(), source: Box::new(source) }
    }

    pub fn network(error: impl std::fmt::Display) -> Self {
        Self::Transport { status: None, body: Some(error.to_string()) }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Status code of the transport failure behind this error, looking through provider context.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Provider { source, .. } => source.status_code(),
            _ => None,
        }
    }
}
