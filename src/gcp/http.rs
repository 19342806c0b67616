//! HTTP utilities for GCP REST API calls

use crate::error::ComputeError;
use reqwest::Client;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ComputeError> {
        let client = Client::builder()
            .user_agent(concat!("gce-agents/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ComputeError::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ComputeError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only the sanitized body is logged; the error carries the status alone
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ComputeError::Transport {
                status: Some(status.as_u16()),
                message: format!("API request failed: {}", status),
            });
        }

        if body.trim().is_empty() {
            return Err(ComputeError::transport(format!(
                "malformed response from {}: empty body",
                url
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format a GCP API error for display
/// Maps transport failures to short messages that don't echo API internals
pub fn format_gcp_error(error: &ComputeError) -> String {
    let by_status = match error.status() {
        Some(401) => Some("Authentication failed. Run 'gcloud auth application-default login'."),
        Some(403) => Some("Permission denied. Check your GCP IAM permissions."),
        Some(404) => Some("Resource not found."),
        Some(409) => Some("Resource conflict. The resource may already exist or be in use."),
        Some(429) => Some("Rate limit exceeded. Please try again later."),
        Some(400) => Some("Invalid request. Check your parameters."),
        Some(500 | 502 | 503) => Some("GCP service temporarily unavailable. Please try again."),
        Some(_) => Some("Request failed. Check your network connection and try again."),
        None => None,
    };
    if let Some(message) = by_status {
        return message.to_string();
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let logged = sanitize_for_log(&body);
        assert!(logged.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(logged.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_format_error_by_status() {
        let err = ComputeError::Transport {
            status: Some(403),
            message: "API request failed: 403 Forbidden".to_string(),
        };
        assert_eq!(
            format_gcp_error(&err),
            "Permission denied. Check your GCP IAM permissions."
        );

        let err = ComputeError::Transport {
            status: Some(503),
            message: String::new(),
        };
        assert!(format_gcp_error(&err).contains("temporarily unavailable"));
    }

    #[test]
    fn test_format_error_without_status_is_truncated() {
        let err = ComputeError::Configuration("p".repeat(200));
        let formatted = format_gcp_error(&err);
        assert!(formatted.ends_with("..."));
        assert_eq!(formatted.len(), 83);
    }
}
