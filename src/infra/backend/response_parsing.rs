use serde::Deserialize;

const MAX_ERROR_MESSAGE_LEN: usize = 256;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
}

pub(crate) fn truncate_message(body: &str) -> String {
    let compact = body.trim().replace('\n', " ");
    compact.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Pulls the `error` text out of a failure body. Bodies that are not JSON,
/// lack the field, or carry a blank value all yield `None`.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body.trim()).ok()?;
    envelope
        .error
        .map(|message| truncate_message(&message))
        .filter(|message| !message.is_empty())
}
