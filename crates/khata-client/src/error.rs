//! # Client Error Types
//!
//! Error types for calls to the shop backend.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  CreditLimitExceeded    │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Rejected               │ │
//! │  │  ConfigLoad     │  │  ServerError    │  │  NotFound, Unauthorized │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Retryable: transport only. A sale commit is never retried, whatever   │
//! │  the category; the caller surfaces the error and keeps the cart.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_core::Money;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Every way a backend call can fail.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the backend.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Backend answered with a 5xx.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Remote Rejections
    // =========================================================================
    /// The backend's own credit check rejected the sale.
    ///
    /// Recoverable: resubmitting with `forceOverride` is the defined path.
    #[error("Credit limit exceeded: {message}")]
    CreditLimitExceeded { limit: Option<Money>, message: String },

    /// The backend refused the request (commit failure, bad input, etc.).
    #[error("{message} ({code})")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend wants credentials this terminal does not have.
    #[error("Authentication required")]
    Unauthorized,

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to serialize a request body.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if the operation can be retried as-is.
    ///
    /// ## Retryable Errors
    /// - Connection failures
    /// - Timeouts
    /// - 5xx responses
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Anything the backend deliberately rejected
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_)
                | ClientError::Timeout(_)
                | ClientError::ServerError { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
        )
    }

    /// Returns true for the backend's recoverable credit-limit rejection.
    pub fn is_credit_limit(&self) -> bool {
        matches!(self, ClientError::CreditLimitExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::ConnectionFailed("refused".into()).is_retryable());
        assert!(ClientError::Timeout("30s".into()).is_retryable());
        assert!(ClientError::ServerError {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());

        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
        assert!(!ClientError::CreditLimitExceeded {
            limit: None,
            message: "over".into()
        }
        .is_retryable());
        assert!(!ClientError::Rejected {
            status: 409,
            code: "OUT_OF_STOCK".into(),
            message: "sold out".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(ClientError::InvalidUrl("x".into()).is_config_error());
        assert!(!ClientError::Unauthorized.is_config_error());
    }

    #[test]
    fn test_rejected_display_keeps_backend_message() {
        let err = ClientError::Rejected {
            status: 409,
            code: "OUT_OF_STOCK".into(),
            message: "Basmati 5kg is sold out".into(),
        };
        assert_eq!(err.to_string(), "Basmati 5kg is sold out (OUT_OF_STOCK)");
    }
}
