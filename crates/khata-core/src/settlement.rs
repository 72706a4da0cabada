//! # Settlement Calculator
//!
//! Turns a cart total and the payment dialog inputs into a concrete split:
//! how much is paid now, how much goes on the khata, how much change is due.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    settle(total, mode, tendered, prior)                 │
//! │                                                                         │
//! │  mode == FullCredit                                                     │
//! │  └── credited = total, paid = 0, change = 0          ──► Credit        │
//! │                                                                         │
//! │  mode == CashOrMixed                                                    │
//! │  ├── tendered >= total                                                  │
//! │  │   └── paid = total, credited = 0,                                   │
//! │  │       change = tendered - total                   ──► Cash          │
//! │  └── tendered <  total                                                  │
//! │      └── paid = tendered, credited = total - tendered,                 │
//! │          change = 0                      ──► Mixed (or Credit if 0)    │
//! │                                                                         │
//! │  resulting_outstanding = prior + credited                               │
//! │                                                                         │
//! │  ALWAYS: paid + credited == total                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator never rejects. It is re-run on every input change so the
//! operator sees the new balance before anything can block the sale; the
//! credit guard decides at confirmation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, PaymentMethod, PaymentMode};

// =============================================================================
// Calculator
// =============================================================================

/// Inputs to [`settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettlementInput {
    pub total: Money,
    pub mode: PaymentMode,
    /// As typed by the operator; may be zero.
    pub tendered: Money,
    /// Customer's khata before this sale (zero for Walk-in).
    pub prior_outstanding: Money,
}

/// A speculative payment/credit split. Nothing is committed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settlement {
    pub total: Money,
    pub mode: PaymentMode,

    /// Amount applied to the sale now.
    pub amount_paid: Money,

    /// Amount added to the khata by this sale.
    pub amount_credited: Money,

    pub change_due: Money,

    /// Cash handed over, as entered.
    pub tendered: Money,

    /// Prior outstanding + amount credited.
    pub resulting_outstanding: Money,

    pub method: PaymentMethod,
}

/// Computes the settlement for one set of payment inputs.
///
/// ## Example
/// ```rust
/// use khata_core::money::Money;
/// use khata_core::settlement::{settle, SettlementInput};
/// use khata_core::types::{PaymentMethod, PaymentMode};
///
/// let s = settle(SettlementInput {
///     total: Money::from_rupees(300),
///     mode: PaymentMode::CashOrMixed,
///     tendered: Money::from_rupees(100),
///     prior_outstanding: Money::from_rupees(200),
/// });
///
/// assert_eq!(s.amount_credited, Money::from_rupees(200));
/// assert_eq!(s.resulting_outstanding, Money::from_rupees(400));
/// assert_eq!(s.method, PaymentMethod::Mixed);
/// ```
pub fn settle(input: SettlementInput) -> Settlement {
    let SettlementInput {
        total,
        mode,
        tendered,
        prior_outstanding,
    } = input;

    let (amount_paid, amount_credited, change_due, method) = match mode {
        PaymentMode::FullCredit => (Money::zero(), total, Money::zero(), PaymentMethod::Credit),
        PaymentMode::CashOrMixed if tendered >= total => {
            (total, Money::zero(), tendered - total, PaymentMethod::Cash)
        }
        PaymentMode::CashOrMixed => {
            let method = if tendered.is_positive() {
                PaymentMethod::Mixed
            } else {
                PaymentMethod::Credit
            };
            (tendered, total - tendered, Money::zero(), method)
        }
    };

    Settlement {
        total,
        mode,
        amount_paid,
        amount_credited,
        change_due,
        tendered,
        resulting_outstanding: prior_outstanding + amount_credited,
        method,
    }
}

// =============================================================================
// Payment Form
// =============================================================================

/// Result of a mode selection on the payment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "result", rename_all = "snake_case")]
#[ts(export)]
pub enum ModeSelection {
    Applied { mode: PaymentMode },
    /// FullCredit was asked for while Walk-in is active.
    Coerced {
        requested: PaymentMode,
        applied: PaymentMode,
    },
}

/// The payment dialog inputs for the sale being built.
///
/// ## Mode Rule
/// FullCredit is only selectable with a real customer. Picking it while
/// Walk-in is active, or switching back to Walk-in while it is selected,
/// puts the form back on CashOrMixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    customer: Customer,
    mode: PaymentMode,
    tendered: Money,
}

impl PaymentForm {
    /// Walk-in, CashOrMixed, nothing tendered.
    pub fn new() -> Self {
        PaymentForm {
            customer: Customer::walk_in(),
            mode: PaymentMode::CashOrMixed,
            tendered: Money::zero(),
        }
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn mode(&self) -> PaymentMode {
        self.mode
    }

    pub fn tendered(&self) -> Money {
        self.tendered
    }

    /// Makes `customer` the active customer.
    ///
    /// Returns true when the mode had to be forced back to CashOrMixed.
    pub fn select_customer(&mut self, customer: Customer) -> bool {
        self.customer = customer;
        if self.customer.is_walk_in() && self.mode == PaymentMode::FullCredit {
            self.mode = PaymentMode::CashOrMixed;
            return true;
        }
        false
    }

    /// Selects a payment mode, coercing FullCredit away for Walk-in.
    pub fn select_mode(&mut self, requested: PaymentMode) -> ModeSelection {
        if requested == PaymentMode::FullCredit && self.customer.is_walk_in() {
            self.mode = PaymentMode::CashOrMixed;
            return ModeSelection::Coerced {
                requested,
                applied: self.mode,
            };
        }
        self.mode = requested;
        ModeSelection::Applied { mode: requested }
    }

    /// Records the cash handed over. Not validated here; a negative tender
    /// is rejected by the credit guard at confirmation.
    pub fn set_tendered(&mut self, tendered: Money) {
        self.tendered = tendered;
    }

    /// Settlement for `total` with the current inputs.
    pub fn settlement(&self, total: Money) -> Settlement {
        settle(SettlementInput {
            total,
            mode: self.mode,
            tendered: self.tendered,
            prior_outstanding: self.customer.outstanding(),
        })
    }

    /// Back to Walk-in / CashOrMixed / zero.
    pub fn reset(&mut self) {
        *self = PaymentForm::new();
    }
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(total: i64, mode: PaymentMode, tendered: i64, prior: i64) -> SettlementInput {
        SettlementInput {
            total: Money::from_rupees(total),
            mode,
            tendered: Money::from_rupees(tendered),
            prior_outstanding: Money::from_rupees(prior),
        }
    }

    fn customer(outstanding: i64, limit: i64) -> Customer {
        Customer {
            id: "c-1".to_string(),
            name: "Ramesh".to_string(),
            phone: None,
            credit_limit_paise: Money::from_rupees(limit).paise(),
            outstanding_paise: Money::from_rupees(outstanding).paise(),
        }
    }

    #[test]
    fn test_full_credit() {
        let s = settle(input(300, PaymentMode::FullCredit, 500, 50));
        assert_eq!(s.amount_paid, Money::zero());
        assert_eq!(s.amount_credited, Money::from_rupees(300));
        assert_eq!(s.change_due, Money::zero());
        assert_eq!(s.resulting_outstanding, Money::from_rupees(350));
        assert_eq!(s.method, PaymentMethod::Credit);
    }

    #[test]
    fn test_cash_with_change() {
        let s = settle(input(300, PaymentMode::CashOrMixed, 500, 0));
        assert_eq!(s.amount_paid, Money::from_rupees(300));
        assert_eq!(s.tendered, Money::from_rupees(500));
        assert_eq!(s.change_due, Money::from_rupees(200));
        assert!(s.amount_credited.is_zero());
        assert_eq!(s.method, PaymentMethod::Cash);
    }

    #[test]
    fn test_exact_tender_is_cash() {
        let s = settle(input(300, PaymentMode::CashOrMixed, 300, 0));
        assert_eq!(s.method, PaymentMethod::Cash);
        assert!(s.change_due.is_zero());
    }

    #[test]
    fn test_partial_tender_is_mixed() {
        let s = settle(input(300, PaymentMode::CashOrMixed, 100, 200));
        assert_eq!(s.amount_paid, Money::from_rupees(100));
        assert_eq!(s.amount_credited, Money::from_rupees(200));
        assert!(s.change_due.is_zero());
        assert_eq!(s.resulting_outstanding, Money::from_rupees(400));
        assert_eq!(s.method, PaymentMethod::Mixed);
    }

    #[test]
    fn test_nothing_tendered_is_credit() {
        let s = settle(input(300, PaymentMode::CashOrMixed, 0, 0));
        assert_eq!(s.amount_credited, Money::from_rupees(300));
        assert_eq!(s.method, PaymentMethod::Credit);
    }

    #[test]
    fn test_empty_cart_settles_to_nothing() {
        let s = settle(input(0, PaymentMode::CashOrMixed, 0, 0));
        assert!(s.amount_paid.is_zero());
        assert!(s.amount_credited.is_zero());
        assert_eq!(s.method, PaymentMethod::Cash);
    }

    #[test]
    fn test_negative_tender_still_balances() {
        let s = settle(input(300, PaymentMode::CashOrMixed, -10, 0));
        assert_eq!(s.amount_paid + s.amount_credited, s.total);
        assert!(s.amount_paid.is_negative());
    }

    #[test]
    fn test_form_coerces_full_credit_for_walk_in() {
        let mut form = PaymentForm::new();
        let selection = form.select_mode(PaymentMode::FullCredit);
        assert_eq!(
            selection,
            ModeSelection::Coerced {
                requested: PaymentMode::FullCredit,
                applied: PaymentMode::CashOrMixed,
            }
        );
        assert_eq!(form.mode(), PaymentMode::CashOrMixed);
    }

    #[test]
    fn test_form_reverting_to_walk_in_resets_mode() {
        let mut form = PaymentForm::new();
        assert!(!form.select_customer(customer(0, 0)));
        assert_eq!(
            form.select_mode(PaymentMode::FullCredit),
            ModeSelection::Applied {
                mode: PaymentMode::FullCredit
            }
        );

        assert!(form.select_customer(Customer::walk_in()));
        assert_eq!(form.mode(), PaymentMode::CashOrMixed);
    }

    #[test]
    fn test_form_uses_customer_outstanding() {
        let mut form = PaymentForm::new();
        form.select_customer(customer(200, 400));
        form.set_tendered(Money::from_rupees(100));

        let s = form.settlement(Money::from_rupees(300));
        assert_eq!(s.resulting_outstanding, Money::from_rupees(400));

        form.reset();
        assert!(form.customer().is_walk_in());
        assert!(form.tendered().is_zero());
    }
}
