//! # Sale Commit Payload
//!
//! The body sent to the sale-commit API once the credit guard has approved
//! a settlement.
//!
//! ```text
//! Cart lines ─┐
//!             ├──► SaleCommitRequest::new() ──► POST sales
//! Approval ───┘
//! ```
//!
//! All amounts travel in paise.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::credit::Approval;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;

/// One line of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleCommitItem {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    /// Unit price in paise.
    pub price: i64,
}

impl From<&CartLine> for SaleCommitItem {
    fn from(line: &CartLine) -> Self {
        SaleCommitItem {
            item_id: line.item_id.clone(),
            variant_id: line.variant_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.unit_price_paise,
        }
    }
}

/// Request body for `POST sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleCommitRequest {
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    /// Null for Walk-in.
    pub customer_id: Option<String>,
    pub items: Vec<SaleCommitItem>,
    pub amount_paid: i64,
    pub amount_credited: i64,
    pub force_override: bool,
}

impl SaleCommitRequest {
    /// Builds the commit body from the cart and its approval.
    ///
    /// ## Errors
    /// - `Required` when the cart is empty
    /// - `NotAllowed` when the cart total no longer matches the settlement
    ///   the approval was granted for
    pub fn new(lines: &[CartLine], approval: &Approval) -> CoreResult<Self> {
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "cart items".to_string(),
            }
            .into());
        }

        let settlement = &approval.settlement;
        let cart_total: Money = lines.iter().map(CartLine::line_total).sum();
        if cart_total != settlement.total {
            return Err(ValidationError::NotAllowed(format!(
                "cart total {} does not match settled total {}",
                cart_total, settlement.total
            ))
            .into());
        }

        Ok(SaleCommitRequest {
            total_amount: settlement.total.paise(),
            payment_method: settlement.method,
            customer_id: approval.customer_id.clone(),
            items: lines.iter().map(SaleCommitItem::from).collect(),
            amount_paid: settlement.amount_paid.paise(),
            amount_credited: settlement.amount_credited.paise(),
            force_override: approval.force_override,
        })
    }

    pub fn total(&self) -> Money {
        Money::from_paise(self.total_amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::credit::review;
    use crate::stock::StockSnapshot;
    use crate::types::{Customer, InventoryItem, PaymentMode};
    use crate::settlement::{settle, SettlementInput};

    fn item() -> InventoryItem {
        InventoryItem {
            id: "a".to_string(),
            name: "Soap".to_string(),
            barcode: None,
            price_paise: 4_500,
            quantity: 10,
            reorder_level: 0,
            variants: vec![],
        }
    }

    fn cart_with_two() -> Cart {
        let snap = StockSnapshot::new(vec![item()]).unwrap();
        let mut cart = Cart::new();
        cart.add_item(&item(), None, &snap).unwrap();
        cart.add_item(&item(), None, &snap).unwrap();
        cart
    }

    fn cash_approval(total: Money) -> Approval {
        let s = settle(SettlementInput {
            total,
            mode: PaymentMode::CashOrMixed,
            tendered: Money::from_rupees(100),
            prior_outstanding: Money::zero(),
        });
        review(&s, &Customer::walk_in(), false).unwrap()
    }

    #[test]
    fn test_walk_in_request_wire_shape() {
        let cart = cart_with_two();
        let request = SaleCommitRequest::new(cart.lines(), &cash_approval(cart.total())).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["totalAmount"], 9_000);
        assert_eq!(json["paymentMethod"], "Cash");
        assert!(json["customerId"].is_null());
        assert_eq!(json["amountPaid"], 9_000);
        assert_eq!(json["amountCredited"], 0);
        assert_eq!(json["forceOverride"], false);
        assert_eq!(json["items"][0]["itemId"], "a");
        assert_eq!(json["items"][0]["quantity"], 2);
        assert_eq!(json["items"][0]["price"], 4_500);
        assert!(json["items"][0].get("variantId").is_none());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = SaleCommitRequest::new(&[], &cash_approval(Money::zero())).unwrap_err();
        assert!(err.to_string().contains("cart items"));
    }

    #[test]
    fn test_stale_approval_rejected() {
        let cart = cart_with_two();
        let stale = cash_approval(Money::from_paise(4_500));
        assert!(SaleCommitRequest::new(cart.lines(), &stale).is_err());
    }
}
