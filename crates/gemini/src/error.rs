use thiserror::Error;

/// Errors surfaced by the embedding and generative-text service clients.
///
/// The split matters for control flow: retryable variants are retried with
/// backoff and then escalated to a local fallback, permanent ones skip the
/// retries and go straight to the fallback for that unit of work.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The provider signalled a rate limit (HTTP 429 or quota message).
    #[error("rate limited by provider")]
    RateLimited,
    /// Transient server-side failure (5xx, timeouts).
    #[error("transient service failure: {0}")]
    Transient(String),
    /// The request itself is bad (auth, malformed payload). Retrying is pointless.
    #[error("permanent service failure (HTTP {status}): {message}")]
    Permanent { status: u16, message: String },
    /// The request never reached the service.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered but the payload did not have the expected shape.
    #[error("unparseable service response: {0}")]
    Parse(String),
    /// No API key configured.
    #[error("missing API credentials")]
    MissingCredentials,
}

impl ServiceError {
    /// Whether a retry with backoff has any chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited | ServiceError::Transient(_) | ServiceError::Network(_)
        )
    }
}

/// Map an HTTP status + body into the error taxonomy.
pub fn classify_status(status: u16, body: &str) -> ServiceError {
    let message = body.chars().take(200).collect::<String>();
    match status {
        429 => ServiceError::RateLimited,
        408 | 500..=599 => ServiceError::Transient(format!("HTTP {status}: {message}")),
        _ => ServiceError::Permanent { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        assert!(ServiceError::RateLimited.is_retryable());
        assert!(ServiceError::Transient("503".into()).is_retryable());
        assert!(ServiceError::Network("connection reset".into()).is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        let err = ServiceError::Permanent {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_retryable());
        assert!(!ServiceError::MissingCredentials.is_retryable());
        assert!(!ServiceError::Parse("garbage".into()).is_retryable());
    }

    #[test]
    fn classify_maps_status_classes() {
        assert_eq!(classify_status(429, "slow down"), ServiceError::RateLimited);
        assert!(matches!(classify_status(503, ""), ServiceError::Transient(_)));
        assert!(matches!(classify_status(408, ""), ServiceError::Transient(_)));
        assert!(matches!(
            classify_status(401, "bad key"),
            ServiceError::Permanent { status: 401, .. }
        ));
    }

    #[test]
    fn classify_truncates_long_bodies() {
        let body = "x".repeat(1000);
        if let ServiceError::Permanent { message, .. } = classify_status(400, &body) {
            assert_eq!(message.len(), 200);
        } else {
            panic!("expected permanent error");
        }
    }
}
