use serde_json::Value;
use thiserror::Error;

pub const GENERIC_INSIGHTS_ERROR_MESSAGE: &str = "An error occurred while fetching insights";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates user-visible failure classes of an insights request.
pub enum InsightsErrorKind {
    NetworkFailure,
    MalformedResponse,
}

impl InsightsErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkFailure => "network_failure",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `InsightsApiError` values.
pub enum InsightsApiError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("insights service returned non-success status {status}: {body}")]
    HttpStatus {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("malformed insights response: {0}")]
    MalformedResponse(String),
}

impl InsightsApiError {
    pub fn kind(&self) -> InsightsErrorKind {
        match self {
            Self::MalformedResponse(_) => InsightsErrorKind::MalformedResponse,
            Self::InvalidConfig(_) | Self::Http(_) | Self::HttpStatus { .. } => {
                InsightsErrorKind::NetworkFailure
            }
        }
    }

    /// Best-effort human readable message for a transient notification.
    ///
    /// Prefers a structured `error` field in the response body, then a
    /// `message` field, then the HTTP status text, then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::HttpStatus {
                status_text, body, ..
            } => extract_body_message(body)
                .or_else(|| non_empty(status_text))
                .unwrap_or_else(|| GENERIC_INSIGHTS_ERROR_MESSAGE.to_string()),
            Self::InvalidConfig(_) | Self::Http(_) | Self::MalformedResponse(_) => {
                GENERIC_INSIGHTS_ERROR_MESSAGE.to_string()
            }
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).and_then(non_empty)
}

fn extract_body_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(body).ok()?;
    let structured = match parsed.get("error") {
        Some(Value::String(error)) => non_empty(error),
        Some(error @ Value::Object(_)) => {
            string_field(error, "error").or_else(|| string_field(error, "message"))
        }
        _ => None,
    };
    structured.or_else(|| string_field(&parsed, "message"))
}

#[cfg(test)]
mod tests {
    use super::{InsightsApiError, InsightsErrorKind, GENERIC_INSIGHTS_ERROR_MESSAGE};

    fn status_error(status_text: &str, body: &str) -> InsightsApiError {
        InsightsApiError::HttpStatus {
            status: 500,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn unit_user_message_prefers_structured_error_string() {
        let error = status_error(
            "Internal Server Error",
            r#"{"error":"upstream exploded","message":"ignored"}"#,
        );
        assert_eq!(error.user_message(), "upstream exploded");
    }

    #[test]
    fn unit_user_message_reads_nested_error_object() {
        let error = status_error(
            "Internal Server Error",
            r#"{"error":{"error":"","message":"project not found"}}"#,
        );
        assert_eq!(error.user_message(), "project not found");
    }

    #[test]
    fn functional_user_message_falls_back_to_message_then_status_text() {
        let with_message = status_error("Bad Gateway", r#"{"error":503,"message":"try later"}"#);
        assert_eq!(with_message.user_message(), "try later");

        let status_only = status_error("Bad Gateway", "<html>gateway</html>");
        assert_eq!(status_only.user_message(), "Bad Gateway");
    }

    #[test]
    fn regression_user_message_uses_generic_fallback_when_nothing_is_readable() {
        let error = status_error("  ", "");
        assert_eq!(error.user_message(), GENERIC_INSIGHTS_ERROR_MESSAGE);

        let malformed = InsightsApiError::MalformedResponse("missing result".to_string());
        assert_eq!(malformed.user_message(), GENERIC_INSIGHTS_ERROR_MESSAGE);
        assert_eq!(malformed.kind(), InsightsErrorKind::MalformedResponse);
        assert_eq!(error.kind(), InsightsErrorKind::NetworkFailure);
    }
}
