//! Error taxonomy for scans

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can end a scan
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// Malformed or disallowed target URL. Never retried.
    #[error("Invalid URL: {0}")]
    Validation(String),

    /// A network operation exceeded its time bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The proxy answered with a non-2xx status or could not be reached
    #[error("{}", proxy_message(.status, .message))]
    Proxy {
        status: Option<u16>,
        message: String,
    },

    /// No API key is configured for the AI scan
    #[error("Generative AI API key is not configured. Set it in the [ai] section of the config or via the configured environment variable.")]
    MissingCredential,

    /// The AI service rejected the API key
    #[error("Generative AI API key was rejected: {0}")]
    InvalidCredential(String),

    /// The AI service refused the request because of quota or rate limits
    #[error("Generative AI quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Transport failure talking to the AI service
    #[error("Generative AI request failed: {0}")]
    AiRequest(String),

    /// The AI response was not valid JSON or did not match the schema
    #[error("Failed to parse file data from the AI response ({0}). Try the Standard Scan instead.")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

fn proxy_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Proxy error ({}): {}", code, message),
        None => format!("Proxy error: {}", message),
    }
}

impl ScanError {
    pub fn proxy(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Proxy {
            status,
            message: message.into(),
        }
    }

    /// Metrics category for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Proxy { .. } | Self::AiRequest(_) => ErrorKind::Network,
            Self::MissingCredential | Self::InvalidCredential(_) => ErrorKind::Credential,
            Self::QuotaExceeded(_) => ErrorKind::Quota,
            Self::Parse(_) => ErrorKind::Parsing,
            Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// Whether the content fetcher may retry after this error.
    ///
    /// Timeouts and proxy failures are transient unless the proxy answered
    /// with a 4xx status.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Proxy { status, .. } => !matches!(status, Some(code) if (400..500).contains(code)),
            _ => false,
        }
    }

    /// Whether the caller should send the user to credential configuration
    pub fn is_credential_error(&self) -> bool {
        self.kind() == ErrorKind::Credential
    }
}

/// Error categories tracked by the metrics store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Timeout,
    Network,
    Credential,
    Quota,
    Parsing,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Credential => "credential",
            Self::Quota => "quota",
            Self::Parsing => "parsing",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_prefix() {
        let err = ScanError::Validation("bad scheme 'ftp'".to_string());
        assert!(err.to_string().starts_with("Invalid URL: "));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_proxy_retry_rules() {
        assert!(ScanError::proxy(None, "connection refused").is_retryable());
        assert!(ScanError::proxy(Some(502), "bad gateway").is_retryable());
        assert!(!ScanError::proxy(Some(404), "not found").is_retryable());
        assert!(!ScanError::proxy(Some(429), "slow down").is_retryable());
        assert!(ScanError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!ScanError::MissingCredential.is_retryable());
    }

    #[test]
    fn test_proxy_message_includes_status() {
        let err = ScanError::proxy(Some(500), "upstream exploded");
        assert_eq!(err.to_string(), "Proxy error (500): upstream exploded");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        assert_eq!(ScanError::MissingCredential.kind(), ErrorKind::Credential);
        assert!(ScanError::MissingCredential.is_credential_error());
        assert_eq!(ScanError::QuotaExceeded("x".into()).kind(), ErrorKind::Quota);
        assert_eq!(ScanError::AiRequest("x".into()).kind(), ErrorKind::Network);
        assert_eq!(ScanError::Parse("x".into()).kind(), ErrorKind::Parsing);
        assert_eq!(ScanError::Other("x".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_timeout_message_is_specific() {
        let err = ScanError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_parse_error_suggests_standard_scan() {
        let err = ScanError::Parse("expected array".into());
        assert!(err.to_string().contains("Standard Scan"));
    }
}
