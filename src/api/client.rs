//! Single-shot completion requests.

use std::error::Error as StdError;
use std::fmt;

use tracing::debug;

use crate::api::ChatRequest;
use crate::core::providers::ResolvedProvider;

#[derive(Debug)]
pub enum ApiError {
    /// No credential configured for the provider.
    MissingCredential { provider: String },
    /// The request never produced an HTTP response.
    Transport(reqwest::Error),
    /// Non-success status; `message` is a one-line summary of the body.
    Status { status: u16, message: String },
    /// The body did not have the provider's response shape.
    Malformed(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingCredential { provider } => {
                write!(f, "No API key configured for {provider}")
            }
            ApiError::Transport(err) => write!(f, "Network error: {err}"),
            ApiError::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            ApiError::Malformed(detail) => write!(f, "Unexpected response format: {detail}"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of an error body, preferring the provider's own
/// error message when the body is JSON.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value).filter(|s| !s.is_empty()) {
            return summary;
        }
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// POST a chat request to the provider and return the reply text.
pub async fn send_chat_request(
    client: &reqwest::Client,
    provider: &ResolvedProvider,
    request: &ChatRequest,
) -> Result<String, ApiError> {
    let api_key = provider
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::MissingCredential {
            provider: provider.display_name().to_string(),
        })?;

    let descriptor = &provider.descriptor;
    debug!(
        provider = %descriptor.id,
        model = %request.model,
        messages = request.messages.len(),
        "sending chat request"
    );

    let mut http_request = client
        .post(&descriptor.endpoint)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {api_key}"));
    for (name, value) in &descriptor.headers {
        http_request = http_request.header(name.as_str(), value.as_str());
    }

    let response = http_request.json(request).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: format_api_error(&body),
        });
    }

    descriptor.response_format.extract_text(&body)
}
