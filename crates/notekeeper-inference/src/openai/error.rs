//! Mapping of OpenAI HTTP failures onto notekeeper errors.

use notekeeper_core::Error;

/// Coarse classes of OpenAI API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    AuthenticationError,
    RateLimitExceeded,
    ModelNotFound,
    ContextLengthExceeded,
    ServerError,
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Which call failed. Embedding failures surface as [`Error::Embedding`],
/// chat failures as [`Error::Inference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Embedding,
    Chat,
}

/// Convert an OpenAI failure into a notekeeper [`Error`].
pub fn to_core_error(kind: CallKind, code: OpenAIErrorCode, message: &str) -> Error {
    let message = match code {
        OpenAIErrorCode::AuthenticationError => {
            return Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => {
            return Error::Config(format!("Model not found: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => format!("Rate limit exceeded: {}", message),
        OpenAIErrorCode::ContextLengthExceeded => format!("Context too long: {}", message),
        OpenAIErrorCode::ServerError => format!("Server error: {}", message),
        OpenAIErrorCode::Unknown => message.to_string(),
    };
    match kind {
        CallKind::Embedding => Error::Embedding(message),
        CallKind::Chat => Error::Inference(message),
    }
}
