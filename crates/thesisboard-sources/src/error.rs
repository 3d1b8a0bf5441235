use thiserror::Error;

/// Longest upstream error body kept in a [`FetchError::Status`].
const MAX_BODY_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    Shape(String),
    #[error("not configured: {0}")]
    NotConfigured(&'static str),
    #[error("all endpoints failed: {0}")]
    Exhausted(String),
}

// Request URLs carry credentials (query keys, bot tokens). Strip them
// before the error is displayed or stored.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

impl FetchError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        }
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Network errors, timeouts, throttling, and 5xx responses are worth one
    /// more attempt. A malformed body will be malformed again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Shape(_) | Self::NotConfigured(_) | Self::Exhausted(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(FetchError::status(503, "").is_retryable());
        assert!(FetchError::status(429, "").is_retryable());
        assert!(!FetchError::status(404, "").is_retryable());
        assert!(!FetchError::shape("missing field").is_retryable());
        assert!(!FetchError::NotConfigured("FRED_API_KEY").is_retryable());
    }

    #[test]
    fn status_body_is_truncated() {
        let long = "x".repeat(1000);
        let FetchError::Status { body, .. } = FetchError::status(500, &long) else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), MAX_BODY_CHARS);
    }
}
