//! Error types for the AI boundary

use std::time::Duration;

/// Model output could not be turned into a draft
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Nothing but whitespace or fences
    #[error("model returned an empty response")]
    Empty,

    /// Not JSON
    #[error("model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON that does not match the output schema
    #[error("model output does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// Well-formed but unusable content
    #[error("model output rejected: {0}")]
    Semantic(String),
}

/// Generation failure
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network or service failure
    #[error("AI service unavailable: {0}")]
    Transport(String),

    /// Content policy refusal
    #[error("AI request blocked: {0}")]
    Blocked(String),

    /// No answer in time
    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    /// Output failed validation
    #[error(transparent)]
    InvalidOutput(#[from] ParseError),
}

impl GenerationError {
    /// Whether a retry could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Single-line diagnostic for the user
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let text = self.to_string();
        text.lines().next().unwrap_or_default().to_string()
    }
}
