use thiserror::Error;

use super::GenerationMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("backend transport failed: {message}")]
    Transport { message: String },
    #[error("backend responded with status {status}")]
    Service { status: u16, message: Option<String> },
    #[error("backend response could not be read: {message}")]
    ResponseParse { message: String },
    #[error("artifact delivery failed: {message}")]
    Delivery { message: String },
    #[error("a submission is already in progress for this form")]
    SubmissionBusy,
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GenerationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn response_parse(message: impl Into<String>) -> Self {
        Self::ResponseParse {
            message: message.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the error was raised before anything was sent to the backend.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::SubmissionBusy)
    }

    /// Text shown on the form's notification channel.
    ///
    /// Backend failures without a usable `error` field, transport failures and
    /// unreadable bodies all collapse to the mode's generic fallback message.
    pub fn user_message(&self, mode: GenerationMode) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Service {
                message: Some(message),
                ..
            } => format!("❌ Error: {message}"),
            Self::Service { message: None, .. }
            | Self::Transport { .. }
            | Self::ResponseParse { .. } => {
                format!("❌ Error: {}", mode.fallback_failure_message())
            }
            Self::Delivery { message } => format!("❌ Error: {message}"),
            Self::SubmissionBusy => {
                "A request for this form is still running. Please wait for it to finish."
                    .to_string()
            }
            Self::Internal { message } => format!("❌ Error: {message}"),
        }
    }
}
