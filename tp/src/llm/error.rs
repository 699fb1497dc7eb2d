//! Provider transport errors

use std::time::Duration;

use reqwest::Response;
use thiserror::Error;
use tracing::debug;

/// How one provider call failed
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider rate limited the request, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Provider returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unusable provider reply: {0}")]
    InvalidResponse(String),

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Malformed provider JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } | LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::ApiError { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529),
            LlmError::InvalidResponse(_) | LlmError::Json(_) | LlmError::Config(_) => false,
        }
    }

    /// Wait requested by the provider, if it sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Classify a failed HTTP exchange
    ///
    /// A 429 becomes [`LlmError::RateLimited`], waiting for the `retry-after`
    /// seconds when present and parseable, `fallback_wait` otherwise.
    pub(crate) fn from_status(status: u16, retry_after: Option<&str>, body: String, fallback_wait: Duration) -> Self {
        if status == 429 {
            let retry_after = retry_after
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback_wait);
            return LlmError::RateLimited { retry_after };
        }
        LlmError::ApiError { status, message: body }
    }
}

/// Pass a successful response through; turn anything else into an error
pub(crate) async fn ensure_success(response: Response, fallback_wait: Duration) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), ?retry_after, "ensure_success: provider refused request");
    Err(LlmError::from_status(
        status.as_u16(),
        retry_after.as_deref(),
        body,
        fallback_wait,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(api(503).is_retryable());
        assert!(api(529).is_retryable());
        assert!(api(408).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!LlmError::InvalidResponse("no candidates".into()).is_retryable());
        assert!(!LlmError::Config("missing key".into()).is_retryable());
    }

    #[test]
    fn test_rate_limit_uses_header_or_fallback() {
        let fallback = Duration::from_secs(30);

        let err = LlmError::from_status(429, Some(" 12 "), String::new(), fallback);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert!(err.is_retryable());

        let err = LlmError::from_status(429, Some("Wed, 21 Oct 2026 07:28:00 GMT"), String::new(), fallback);
        assert_eq!(err.retry_after(), Some(fallback));

        let err = LlmError::from_status(429, None, String::new(), fallback);
        assert_eq!(err.retry_after(), Some(fallback));
    }

    #[test]
    fn test_other_statuses_keep_body() {
        let err = LlmError::from_status(400, None, "bad model".into(), Duration::ZERO);
        assert!(matches!(err, LlmError::ApiError { status: 400, ref message } if message == "bad model"));
        assert_eq!(err.retry_after(), None);
    }
}
