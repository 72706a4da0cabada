//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Cart, stock and credit rule violations         │
//! │  └── ValidationError  - Malformed or incomplete inputs                 │
//! │                                                                         │
//! │  khata-client errors (separate crate)                                  │
//! │  └── ClientError      - Network / remote API failures                  │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - What the operator sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Operator               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recoverability
//! Only [`CoreError::CreditLimitExceeded`] has a defined retry path (the
//! forced override). Everything else needs the operator to change inputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Item does not exist in the current stock snapshot.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Variant does not belong to the item it was supplied with.
    #[error("Variant {variant_id} not found on item {item_id}")]
    VariantNotFound { item_id: String, variant_id: String },

    /// Cart has no line with the requested identity.
    #[error("No cart line for {0}")]
    LineNotFound(String),

    /// Quantity would exceed what the stock snapshot says is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Increment "Basmati 5kg" (in cart: 5)
    ///      │
    ///      ▼
    /// Snapshot: available = 5
    ///      │
    ///      ▼
    /// StockLimitExceeded { available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Cart unchanged, operator sees "Only 5 in stock"
    /// ```
    #[error("Only {available} of {name} in stock, requested {requested}")]
    StockLimitExceeded {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Settlement would push the customer's khata over their credit limit.
    ///
    /// This is the recoverable half of the two-phase confirmation: the
    /// operator may resubmit the same settlement with `force_override`.
    #[error("{0}")]
    CreditLimitExceeded(CreditLimitBreach),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the same request may be resubmitted with an override.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::CreditLimitExceeded(_))
    }

    /// Returns the credit breach details, if this is a credit-limit rejection.
    pub fn credit_breach(&self) -> Option<&CreditLimitBreach> {
        match self {
            CoreError::CreditLimitExceeded(breach) => Some(breach),
            _ => None,
        }
    }
}

/// Details carried by a credit-limit rejection.
///
/// Enough to render the confirmation prompt: the limit, and the balance the
/// customer would end up with if the operator bypasses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditLimitBreach {
    pub customer_id: String,
    pub limit: Money,
    pub projected_balance: Money,
    pub message: String,
}

impl std::fmt::Display for CreditLimitBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Credit limit exceeded: limit {}, projected balance {}",
            self.limit, self.projected_balance
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements. They are never
/// retried automatically; the operator has to correct the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two variants sharing an id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A credited amount needs a real customer to carry it.
    #[error("no specific customer selected for credited amount")]
    NoCustomerForCredit,

    /// Operation is not allowed in the current state.
    #[error("{0}")]
    NotAllowed(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockLimitExceeded {
            name: "Basmati 5kg".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(err.to_string(), "Only 5 of Basmati 5kg in stock, requested 6");
    }

    #[test]
    fn test_credit_breach_is_recoverable() {
        let err = CoreError::CreditLimitExceeded(CreditLimitBreach {
            customer_id: "c-1".to_string(),
            limit: Money::from_rupees(350),
            projected_balance: Money::from_rupees(400),
            message: "over limit".to_string(),
        });
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded: limit ₹350.00, projected balance ₹400.00"
        );
        assert_eq!(err.credit_breach().unwrap().limit, Money::from_rupees(350));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::NoCustomerForCredit.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_recoverable());
        assert_eq!(
            core_err.to_string(),
            "Validation error: no specific customer selected for credited amount"
        );
    }
}
