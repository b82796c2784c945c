//! Error types for the embedding system

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Covers configuration problems, transport failures and malformed provider
/// responses. None of these ever reach the retrieval core directly: the
/// [`ResilientEmbedder`](crate::ResilientEmbedder) turns every one of them into
/// a zero vector.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// No API key is available for a provider that needs one
    #[error("Embedding provider is not configured: missing API key")]
    NotConfigured,

    /// Error when provider configuration is invalid
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// Transport level failure talking to the provider
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The provider asked us to back off
    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Non-success status returned by the provider
    #[error("Provider returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not contain a usable embedding
    #[error("Invalid provider response: {message}")]
    InvalidResponse { message: String },

    /// The provider returned a vector of the wrong length
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid response error with a custom message.
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EmbedError::invalid_config("dimension must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid embedding configuration: dimension must be positive"
        );
        let err = EmbedError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: expected 1536, got 768"
        );
    }
}
