//! Error kinds surfaced by the telemetry pipeline
//!
//! Every failure a fetch can produce ends up as the `Failure` payload of a
//! validation state, so the type is cheap to clone and compare.

use thiserror::Error;

/// Why a fetch of the workstation list did not produce data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request rejected, timed out, or answered with a non-2xx status
    #[error("network error: {0}")]
    Network(String),

    /// Payload did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Backend refused our session (401/403)
    #[error("session expired: {0}")]
    AuthExpired(String),

    /// The fetch future panicked before producing a result
    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn auth_expired(msg: impl Into<String>) -> Self {
        Self::AuthExpired(msg.into())
    }

    /// Short label for status displays
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
            FetchError::AuthExpired(_) => "auth",
            FetchError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = FetchError::network("GET /api returned 502");
        assert_eq!(err.to_string(), "network error: GET /api returned 502");
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: FetchError = serde_json::from_str::<Vec<u32>>("{").unwrap_err().into();
        assert_eq!(err.kind(), "decode");
    }
}
