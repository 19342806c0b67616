//! Error types shared by the Compute Engine client.

use thiserror::Error;

/// Errors raised by the compute client and agent configuration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised before any request when required configuration is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised when the call to the provider fails (network, auth, quota, bad body).
    #[error("transport error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Transport {
        /// HTTP status returned by the provider, if a response arrived.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },
    /// Raised by the strict self-link parser.
    #[error("cannot parse resource reference '{0}'")]
    Parse(String),
    /// Raised when agent access configuration is incomplete.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl ComputeError {
    /// Transport failure without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to a transport failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ComputeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            status: value.status().map(|s| s.as_u16()),
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for ComputeError {
    fn from(value: serde_json::Error) -> Self {
        Self::transport(format!("failed to parse response JSON: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_includes_status() {
        let err = ComputeError::Transport {
            status: Some(403),
            message: "API request failed".to_string(),
        };
        assert_eq!(err.to_string(), "transport error (403): API request failed");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_transport_display_without_status() {
        let err = ComputeError::transport("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(err.status(), None);
    }
}
