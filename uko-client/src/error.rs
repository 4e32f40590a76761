//! Error types for uko-client
//!
//! `SubmissionError` is the classified outcome of a failed request; its
//! `Display` text is the single message shown to the user. Field validation
//! never goes through here, it stays in `FieldErrorMap`.

use thiserror::Error;
use uko_common::FieldErrorMap;

/// Failed scoring or catalog request, classified for the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// No response received (connectivity, DNS, refused connection)
    #[error("Network error - please check your connection")]
    Network(String),

    /// Client-side deadline exceeded
    #[error("Request timeout - server took too long to respond")]
    Timeout,

    /// Non-success HTTP status
    #[error("{}", server_message(.status, .detail))]
    Server { status: u16, detail: Option<String> },

    /// Success status but the body is not a usable result
    #[error("Invalid server response format")]
    Format(String),
}

impl SubmissionError {
    /// User-facing text (same as `Display`)
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Diagnostic detail for logs, never shown as the banner
    pub fn detail(&self) -> Option<&str> {
        match self {
            SubmissionError::Network(reason) | SubmissionError::Format(reason) => Some(reason),
            SubmissionError::Server { detail, .. } => detail.as_deref(),
            SubmissionError::Timeout => None,
        }
    }
}

fn server_message(status: &u16, detail: &Option<String>) -> String {
    match *status {
        500..=599 => "Server is currently unavailable".to_string(),
        404 => "API endpoint not found".to_string(),
        _ => detail
            .clone()
            .unwrap_or_else(|| format!("Server error ({})", status)),
    }
}

impl From<uko_common::Error> for SubmissionError {
    fn from(err: uko_common::Error) -> Self {
        SubmissionError::Format(err.to_string())
    }
}

/// Why `submit` did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Submission disabled (request in flight or catalog loading); nothing sent
    #[error("Submission is not available right now")]
    Busy,

    /// Local validation failed; nothing sent
    #[error("Please fix the highlighted fields")]
    Invalid(FieldErrorMap),

    /// Request was sent and failed
    #[error(transparent)]
    Failed(#[from] SubmissionError),
}

/// Tribe catalog could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load tribes: {0}")]
pub struct CatalogError(pub SubmissionError);

/// Native share target failed or was dismissed
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Share target unavailable: {0}")]
    Unavailable(String),

    #[error("Share failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Clipboard write failed
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("No clipboard tool available")]
    NoBackend,

    #[error("Clipboard tool {tool} failed: {reason}")]
    Tool { tool: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
