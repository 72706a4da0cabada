//! # Validation Module
//!
//! Input validation for data entering the core from the backend or the
//! operator.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator console / frontend                                  │
//! │  └── Parse errors, empty input                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Catalog shape (prices, stock, variant ids)                        │
//! │  └── Amounts typed by the operator                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend (authoritative)                                      │
//! │  └── Stock decrement, credit recheck at commit                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::{Money, MAX_AMOUNT_PAISE};
use crate::types::{Customer, InventoryItem, Variant};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price or balance in paise. Zero is allowed (free items,
/// settled khata).
///
/// ```rust
/// use khata_core::validation::validate_price_paise;
///
/// assert!(validate_price_paise("price", 1099).is_ok());
/// assert!(validate_price_paise("price", 0).is_ok());
/// assert!(validate_price_paise("price", -100).is_err());
/// assert!(validate_price_paise("price", i64::MAX).is_err());
/// ```
pub fn validate_price_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if paise > MAX_AMOUNT_PAISE {
        return Err(out_of_range(field));
    }
    Ok(())
}

/// The error for an amount above [`MAX_AMOUNT_PAISE`].
pub fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: format!("{} (paise)", field),
        min: 0,
        max: MAX_AMOUNT_PAISE,
    }
}

/// Validates a quantity on hand. Zero is allowed (sold out).
pub fn validate_stock_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an amount tendered by the operator.
pub fn validate_tendered(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "amount tendered".to_string(),
        });
    }
    if !amount.is_within_bounds() {
        return Err(out_of_range("amount tendered"));
    }
    Ok(())
}

/// Validates a dues payment amount. Must be strictly positive.
pub fn validate_dues_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Normalises a scanned or typed barcode.
///
/// ## Returns
/// The trimmed code, or an error if nothing is left.
pub fn normalize_barcode(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    validate_required("barcode", code)?;
    Ok(code.to_string())
}

// =============================================================================
// Record Validators
// =============================================================================

fn validate_variant(item_id: &str, variant: &Variant) -> ValidationResult<()> {
    validate_required("variant id", &variant.id)?;
    validate_required("variant label", &variant.label)?;
    validate_price_paise(&format!("price of {}/{}", item_id, variant.id), variant.price_paise)?;
    validate_stock_quantity(&format!("stock of {}/{}", item_id, variant.id), variant.quantity)?;
    Ok(())
}

/// Validates a catalog item and its variants.
///
/// ## Rules
/// - id and name must not be empty
/// - price and stock must not be negative
/// - variant ids must be unique within the item
pub fn validate_item(item: &InventoryItem) -> ValidationResult<()> {
    validate_required("item id", &item.id)?;
    validate_required("item name", &item.name)?;
    validate_price_paise(&format!("price of {}", item.id), item.price_paise)?;
    validate_stock_quantity(&format!("stock of {}", item.id), item.quantity)?;

    let mut seen = HashSet::new();
    for variant in &item.variants {
        validate_variant(&item.id, variant)?;
        if !seen.insert(variant.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: format!("variant of {}", item.id),
                value: variant.id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates a customer record from the backend.
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_required("customer id", &customer.id)?;
    validate_price_paise(
        &format!("credit limit of {}", customer.id),
        customer.credit_limit_paise,
    )?;
    validate_price_paise(
        &format!("outstanding of {}", customer.id),
        customer.outstanding_paise,
    )?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            barcode: None,
            price_paise: 100,
            quantity: 5,
            reorder_level: 1,
            variants: vec![],
        }
    }

    fn variant(id: &str) -> Variant {
        Variant {
            id: id.to_string(),
            label: id.to_uppercase(),
            price_paise: 250,
            quantity: 2,
            reorder_level: 0,
        }
    }

    #[test]
    fn test_validate_item() {
        assert!(validate_item(&item("a")).is_ok());

        let mut bad = item("a");
        bad.price_paise = -1;
        assert!(validate_item(&bad).is_err());

        let mut bad = item("a");
        bad.name = "  ".to_string();
        assert!(matches!(
            validate_item(&bad),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_item_rejects_duplicate_variants() {
        let mut it = item("tea");
        it.variants = vec![variant("250g"), variant("250g")];
        assert!(matches!(
            validate_item(&it),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_item_rejects_negative_variant_stock() {
        let mut it = item("tea");
        let mut v = variant("1kg");
        v.quantity = -3;
        it.variants = vec![v];
        assert!(validate_item(&it).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_tendered(Money::zero()).is_ok());
        assert!(validate_tendered(Money::from_paise(-1)).is_err());
        assert!(matches!(
            validate_tendered(Money::from_paise(MAX_AMOUNT_PAISE + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_dues_amount(Money::from_paise(1)).is_ok());
        assert!(validate_dues_amount(Money::zero()).is_err());
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode(" 8901234 ").unwrap(), "8901234");
        assert!(normalize_barcode("   ").is_err());
    }

    #[test]
    fn test_validate_customer() {
        let mut c = Customer::walk_in();
        assert!(validate_customer(&c).is_ok());
        c.outstanding_paise = -5;
        assert!(validate_customer(&c).is_err());
        c.outstanding_paise = 0;
        c.credit_limit_paise = i64::MAX;
        assert!(validate_customer(&c).is_err());
    }
}
