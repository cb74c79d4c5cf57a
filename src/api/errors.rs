use thiserror::Error;

/// Classification for retry policy.
///
/// Determines how the request budget responds to a failed call:
/// transient failures are retried on the same budget, terminal failures
/// surface to the call site immediately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry. Bad id, malformed payload, or a client-side error the
    /// upstream will keep rejecting.
    Never,

    /// Retry the same call after a fixed delay, up to the configured
    /// attempt budget. Used for rate limiting (429), timeouts, network
    /// blips, and upstream 5xx responses.
    WithBackoff,
}

/// Errors from the achievement API stack.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The upstream rate limited the request (HTTP 429).
    #[error("Rate limited by the achievement API")]
    RateLimited,

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A network-level failure (DNS, connect, TLS, broken transfer).
    #[error("Network error: {0}")]
    Network(String),

    /// The requested board, game, or user does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The upstream answered with an unexpected HTTP status.
    #[error("Upstream returned status {status}: {context}")]
    Status { status: u16, context: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Returns the retry classification for this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited | Self::Timeout(_) | Self::Network(_) => RetryClass::WithBackoff,
            Self::Status { status, .. } if *status >= 500 => RetryClass::WithBackoff,
            Self::NotFound(_) | Self::Malformed(_) | Self::Status { .. } => RetryClass::Never,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
