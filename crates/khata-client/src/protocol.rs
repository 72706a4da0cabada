//! # Wire Protocol
//!
//! Response shapes, routes and the mapping from an HTTP failure to a
//! [`ClientError`].
//!
//! ## Endpoints
//! ```text
//! ┌────────┬──────────────────────────┬──────────────────────────────────┐
//! │ Method │ Path                     │ Body / Response                  │
//! ├────────┼──────────────────────────┼──────────────────────────────────┤
//! │ POST   │ sales                    │ SaleCommitRequest → SaleReceipt  │
//! │ GET    │ inventory                │ → [InventoryItem]                │
//! │ GET    │ customers                │ → [Customer]                     │
//! │ POST   │ ledger                   │ LedgerBatch → LedgerReceipt      │
//! │ GET    │ customers/{id}/ledger    │ → [LedgerEntry]                  │
//! └────────┴──────────────────────────┴──────────────────────────────────┘
//!
//! Failure body: { "code": "...", "message": "...", "limit": 35000? }
//! ```
//!
//! All amounts are paise.

use khata_core::{LedgerEntry, Money};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Error code the backend uses for its own credit-limit rejection.
pub const CREDIT_LIMIT_EXCEEDED: &str = "CREDIT_LIMIT_EXCEEDED";

pub mod routes {
    pub const SALES: &str = "sales";
    pub const INVENTORY: &str = "inventory";
    pub const CUSTOMERS: &str = "customers";
    pub const LEDGER: &str = "ledger";

    /// `customers/{id}/ledger`, one element per path segment. The id is
    /// encoded when the segments are joined onto the base URL.
    pub fn customer_ledger(customer_id: &str) -> [&str; 3] {
        [CUSTOMERS, customer_id, LEDGER]
    }
}

// =============================================================================
// Response Bodies
// =============================================================================

/// Successful sale commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: String,
    #[serde(default)]
    pub receipt_number: Option<String>,
}

/// Body for `POST ledger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBatch {
    pub entries: Vec<LedgerEntry>,
}

/// Acknowledgement for `POST ledger`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    #[serde(default)]
    pub recorded: usize,
}

/// Failure body returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    #[serde(default)]
    pub message: String,
    /// Credit limit in paise, on `CREDIT_LIMIT_EXCEEDED`.
    #[serde(default)]
    pub limit: Option<i64>,
}

// =============================================================================
// Failure Mapping
// =============================================================================

/// Maps a non-2xx response to a [`ClientError`].
///
/// ## Mapping
/// - `code == CREDIT_LIMIT_EXCEEDED` (any status): `CreditLimitExceeded`
/// - 401: `Unauthorized`
/// - 404: `NotFound`
/// - 5xx: `ServerError` (retryable)
/// - anything else: `Rejected`, carrying the backend's message verbatim
///
/// A body that is not an [`ErrorPayload`] is kept as the message.
pub fn error_from_response(status: u16, body: &str) -> ClientError {
    let payload = serde_json::from_str::<ErrorPayload>(body).unwrap_or_else(|_| ErrorPayload {
        code: format!("HTTP_{}", status),
        message: body.trim().to_string(),
        limit: None,
    });

    if payload.code == CREDIT_LIMIT_EXCEEDED {
        return ClientError::CreditLimitExceeded {
            limit: payload.limit.map(Money::from_paise),
            message: payload.message,
        };
    }

    match status {
        401 => ClientError::Unauthorized,
        404 => ClientError::NotFound(payload.message),
        500..=599 => ClientError::ServerError {
            status,
            message: payload.message,
        },
        _ => ClientError::Rejected {
            status,
            code: payload.code,
            message: payload.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_limit_code_maps_to_recoverable_error() {
        let body = r#"{"code":"CREDIT_LIMIT_EXCEEDED","message":"Limit reached","limit":35000}"#;
        match error_from_response(422, body) {
            ClientError::CreditLimitExceeded { limit, message } => {
                assert_eq!(limit, Some(Money::from_rupees(350)));
                assert_eq!(message, "Limit reached");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_other_codes_are_rejections() {
        let body = r#"{"code":"OUT_OF_STOCK","message":"Basmati 5kg is sold out"}"#;
        match error_from_response(409, body) {
            ClientError::Rejected { status, code, message } => {
                assert_eq!(status, 409);
                assert_eq!(code, "OUT_OF_STOCK");
                assert_eq!(message, "Basmati 5kg is sold out");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_status_mapping_without_payload() {
        assert!(matches!(error_from_response(401, ""), ClientError::Unauthorized));
        assert!(matches!(
            error_from_response(404, "no such customer"),
            ClientError::NotFound(m) if m == "no such customer"
        ));

        let err = error_from_response(503, "<html>bad gateway</html>");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_receipt_number_optional() {
        let receipt: SaleReceipt = serde_json::from_str(r#"{"saleId":"s-1"}"#).unwrap();
        assert_eq!(receipt.sale_id, "s-1");
        assert_eq!(receipt.receipt_number, None);
    }

    #[test]
    fn test_customer_ledger_route() {
        assert_eq!(routes::customer_ledger("c-9"), ["customers", "c-9", "ledger"]);
    }
}
