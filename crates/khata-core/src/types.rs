//! # Domain Types
//!
//! Core domain types used throughout Khata POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryItem  │   │    Customer     │   │  LedgerEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  customer_id    │       │
//! │  │  price_paise    │   │  credit_limit   │   │  kind           │       │
//! │  │  quantity       │   │  outstanding    │   │  amount_paise   │       │
//! │  │  variants[] ─┐  │   └─────────────────┘   │  balance_after  │       │
//! │  └──────────────┼──┘                         └─────────────────┘       │
//! │                 ▼                                                       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Variant      │   │  PaymentMode    │   │ PaymentMethod   │       │
//! │  │  id, label      │   │  CashOrMixed    │   │  Cash           │       │
//! │  │  price_paise    │   │  FullCredit     │   │  Credit         │       │
//! │  │  quantity       │   └─────────────────┘   │  Mixed          │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sellable Identities
//! An item with variants is never sold by itself: only its variants carry
//! price and stock. A [`LineKey`] names exactly one sellable identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::WALK_IN_CUSTOMER_ID;

// =============================================================================
// Inventory
// =============================================================================

/// A sellable variant of an item (size, flavour, pack).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variant {
    /// Unique within its parent item.
    pub id: String,

    /// Display label, e.g. "1 kg".
    pub label: String,

    /// Price in paise.
    pub price_paise: i64,

    /// Quantity on hand.
    pub quantity: i64,

    /// Reorder when quantity drops to this level.
    #[serde(default)]
    pub reorder_level: i64,
}

impl Variant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }
}

/// A catalog item as fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to the operator.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.) used by the scanner lookup.
    #[serde(default)]
    pub barcode: Option<String>,

    /// Price in paise. Ignored when the item has variants.
    #[serde(default)]
    pub price_paise: i64,

    /// Quantity on hand. Ignored when the item has variants.
    #[serde(default)]
    pub quantity: i64,

    /// Reorder threshold for the base item.
    #[serde(default)]
    pub reorder_level: i64,

    /// Sellable variants; empty for a plain item.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl InventoryItem {
    /// Returns true when only variants of this item are sellable.
    #[inline]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Looks up a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Returns the base price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }
}

/// Identity of a cart line: `(item_id, variant_id-or-none)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineKey {
    pub item_id: String,
    pub variant_id: Option<String>,
}

impl LineKey {
    /// Key for a plain item without variants.
    pub fn item(item_id: impl Into<String>) -> Self {
        LineKey {
            item_id: item_id.into(),
            variant_id: None,
        }
    }

    /// Key for one variant of an item.
    pub fn variant(item_id: impl Into<String>, variant_id: impl Into<String>) -> Self {
        LineKey {
            item_id: item_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_id {
            Some(v) => write!(f, "{}/{}", self.item_id, v),
            None => write!(f, "{}", self.item_id),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A shop customer and the state of their khata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub phone: Option<String>,

    /// Credit limit in paise. Zero means no limit is enforced.
    #[serde(default)]
    pub credit_limit_paise: i64,

    /// Amount currently owed to the shop, in paise.
    #[serde(default)]
    pub outstanding_paise: i64,
}

impl Customer {
    /// The unidentified cash buyer. Has no ledger and can never owe money.
    pub fn walk_in() -> Self {
        Customer {
            id: WALK_IN_CUSTOMER_ID.to_string(),
            name: "Walk-in".to_string(),
            phone: None,
            credit_limit_paise: 0,
            outstanding_paise: 0,
        }
    }

    #[inline]
    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_CUSTOMER_ID
    }

    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_paise(self.credit_limit_paise)
    }

    /// Outstanding balance. Always zero for Walk-in regardless of the record.
    #[inline]
    pub fn outstanding(&self) -> Money {
        if self.is_walk_in() {
            Money::zero()
        } else {
            Money::from_paise(self.outstanding_paise)
        }
    }

    /// Returns true when a credit limit is enforced for this customer.
    #[inline]
    pub fn has_credit_limit(&self) -> bool {
        self.credit_limit_paise > 0
    }
}

// =============================================================================
// Payment Mode & Method
// =============================================================================

/// What the operator selected in the payment dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMode {
    /// Pay what is tendered; any shortfall goes on the khata.
    #[default]
    CashOrMixed,
    /// Whole total goes on the khata. Needs a real customer.
    FullCredit,
}

impl std::str::FromStr for PaymentMode {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "mixed" | "cash_or_mixed" => Ok(PaymentMode::CashOrMixed),
            "credit" | "full_credit" | "khata" => Ok(PaymentMode::FullCredit),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "payment mode".to_string(),
                reason: format!("unknown mode '{}', expected cash or credit", other),
            }),
        }
    }
}

/// The effective method label reported for a settlement and sent on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Credit,
    Mixed,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Credit => write!(f, "Credit"),
            PaymentMethod::Mixed => write!(f, "Mixed"),
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Kind of khata movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LedgerEntryKind {
    /// Part or all of a sale was put on credit.
    CreditSale,
    /// Customer paid down their dues.
    DuesPayment,
}

/// One khata movement, produced here and stored by the ledger API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub customer_id: String,
    pub kind: LedgerEntryKind,
    /// Amount moved, always positive.
    pub amount_paise: i64,
    /// Outstanding balance after this entry.
    pub balance_after_paise: i64,
    /// Sale this entry belongs to, for credit sales.
    pub sale_reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }

    #[inline]
    pub fn balance_after(&self) -> Money {
        Money::from_paise(self.balance_after_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_in_has_no_khata() {
        let mut walk_in = Customer::walk_in();
        assert!(walk_in.is_walk_in());
        assert!(!walk_in.has_credit_limit());

        // Even a corrupted record never reports a balance
        walk_in.outstanding_paise = 500;
        assert!(walk_in.outstanding().is_zero());
    }

    #[test]
    fn test_line_key_display() {
        assert_eq!(LineKey::item("rice").to_string(), "rice");
        assert_eq!(LineKey::variant("rice", "5kg").to_string(), "rice/5kg");
    }

    #[test]
    fn test_payment_mode_parsing() {
        assert_eq!("cash".parse::<PaymentMode>().unwrap(), PaymentMode::CashOrMixed);
        assert_eq!("Credit".parse::<PaymentMode>().unwrap(), PaymentMode::FullCredit);
        assert!("card".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Mixed).unwrap(), "\"Mixed\"");
        assert_eq!(PaymentMethod::Credit.to_string(), "Credit");
    }

    #[test]
    fn test_item_deserializes_without_variants() {
        let json = r#"{"id":"a","name":"Soap","pricePaise":4500,"quantity":3}"#;
        let item: InventoryItem = serde_json::from_str(json).unwrap();
        assert!(!item.has_variants());
        assert_eq!(item.price(), Money::from_paise(4500));
        assert_eq!(item.barcode, None);
    }
}
