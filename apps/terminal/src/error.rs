//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Khata POS                              │
//! │                                                                         │
//! │  Console / UI                Commands Layer                             │
//! │  ────────────                ──────────────                             │
//! │                                                                         │
//! │  confirm_sale(...)                                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Backend Error? ─── ClientError::Timeout("...") ───┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule Violation? ─── CoreError::StockLimit ────── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  match err.code {                                                       │
//! │    CREDIT_LIMIT_EXCEEDED => offer "force" (details carry the breach)    │
//! │    STOCK_LIMIT_EXCEEDED  => "Only 5 of Basmati 5kg in stock"            │
//! │    _                     => show message                                │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_client::ClientError;
use khata_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::state::CommitInProgress;

/// Result alias for terminal commands.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CREDIT_LIMIT_EXCEEDED",
///   "message": "Ramesh would owe ₹400.00 against a credit limit of ₹350.00",
///   "details": { "customerId": "c-1", "limit": 35000, "projectedBalance": 40000, ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured payload for codes the caller can act on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Item, variant, line, customer or barcode not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart quantity would exceed the stock snapshot
    StockLimitExceeded,

    /// Settlement would exceed the customer's credit limit (recoverable)
    CreditLimitExceeded,

    /// A sale commit is already pending for this session
    CommitInProgress,

    /// The backend refused the sale
    CommitFailed,

    /// Backend unreachable or timed out
    NetworkError,

    /// Terminal or client misconfigured
    ConfigError,

    /// Backend refused a non-sale request
    BackendError,

    /// Unexpected internal failure
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches a structured payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Wraps a failed sale commit. The backend's message is kept verbatim.
    pub fn commit_failed(err: &ClientError) -> Self {
        let code = if err.is_retryable() {
            ErrorCode::NetworkError
        } else {
            ErrorCode::CommitFailed
        };
        ApiError::new(code, err.to_string())
            .with_details(serde_json::json!({ "retryable": err.is_retryable() }))
    }

    /// True when the operator may resubmit with the override flag.
    pub fn is_credit_limit(&self) -> bool {
        self.code == ErrorCode::CreditLimitExceeded
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Item", &id),
            CoreError::VariantNotFound { item_id, variant_id } => {
                ApiError::not_found("Variant", &format!("{}/{}", item_id, variant_id))
            }
            CoreError::LineNotFound(key) => ApiError::not_found("Cart line", &key),
            CoreError::StockLimitExceeded {
                name,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::StockLimitExceeded,
                format!("Only {} of {} in stock", available, name),
            )
            .with_details(serde_json::json!({
                "name": name,
                "available": available,
                "requested": requested,
            })),
            CoreError::CreditLimitExceeded(breach) => {
                let details = serde_json::to_value(&breach).ok();
                ApiError {
                    code: ErrorCode::CreditLimitExceeded,
                    message: breach.message,
                    details,
                }
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts client errors to API errors.
///
/// Sale commits go through [`ApiError::commit_failed`] instead, so that a
/// rejected sale is distinguishable from a rejected catalog read.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        if err.is_config_error() {
            return ApiError::new(ErrorCode::ConfigError, err.to_string());
        }
        if err.is_retryable() {
            return ApiError::new(ErrorCode::NetworkError, err.to_string());
        }

        match err {
            ClientError::NotFound(what) => ApiError::new(ErrorCode::NotFound, what),
            ClientError::CreditLimitExceeded { limit, message } => ApiError::new(
                ErrorCode::CreditLimitExceeded,
                message,
            )
            .with_details(serde_json::json!({ "limit": limit })),
            ClientError::Rejected { code, message, .. } => {
                ApiError::new(ErrorCode::BackendError, message)
                    .with_details(serde_json::json!({ "code": code }))
            }
            other => {
                tracing::error!("Backend request failed: {}", other);
                ApiError::new(ErrorCode::BackendError, other.to_string())
            }
        }
    }
}

impl From<CommitInProgress> for ApiError {
    fn from(err: CommitInProgress) -> Self {
        ApiError::new(ErrorCode::CommitInProgress, err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("Console I/O failed: {}", err))
    }
}
