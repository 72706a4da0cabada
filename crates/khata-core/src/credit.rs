//! # Credit Ledger Guard
//!
//! Checks a settlement against the active customer's khata before it may be
//! committed, and produces the ledger entries a committed sale or a dues
//! payment implies.
//!
//! ## Two-Phase Confirmation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Confirmation State Machine                           │
//! │                                                                         │
//! │           any input change                                              │
//! │        ┌───────────────────────────────────────────┐                    │
//! │        ▼                                           │                    │
//! │    ┌──────┐  confirm   ┌────────────┐         ┌────┴──────────────┐     │
//! │    │ Idle │──────────► │ Evaluating │──┬────► │ Blocked           │     │
//! │    └──────┘            └────────────┘  │      │ (Validation)      │     │
//! │                              ▲         │      └───────────────────┘     │
//! │                              │         │      ┌───────────────────┐     │
//! │            confirm + override│         ├────► │ Blocked           │     │
//! │                              └─────────┼───── │ (CreditLimit)     │     │
//! │                                        │      └───────────────────┘     │
//! │                                        │      ┌───────────────────┐     │
//! │                                        └────► │ Approved          │     │
//! │                                               └───────────────────┘     │
//! │                                                                         │
//! │  Only Blocked(CreditLimit) may re-enter, and only with override set.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules (in order)
//! 1. Credit on Walk-in: hard block, override does not apply
//! 2. Negative amount paid: hard block
//! 3. Limit set and resulting outstanding > limit, no override: recoverable block
//! 4. Everything else approves
//!
//! The comparison in rule 3 is strictly greater-than. Landing exactly on the
//! limit is allowed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, CreditLimitBreach, ValidationError};
use crate::money::Money;
use crate::settlement::Settlement;
use crate::types::{Customer, LedgerEntry, LedgerEntryKind};
use crate::validation::validate_dues_amount;

// =============================================================================
// Review
// =============================================================================

/// A settlement cleared for commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Approval {
    pub settlement: Settlement,

    /// `None` for Walk-in.
    pub customer_id: Option<String>,

    /// Sent to the backend so its own limit check is bypassed too.
    pub force_override: bool,

    /// True when this approval only exists because of the override.
    pub over_limit: bool,
}

/// Reviews a settlement for the given customer.
///
/// ## Errors
/// - `Validation(NoCustomerForCredit)` when Walk-in would carry credit
/// - `Validation(Negative)` when the amount paid is negative
/// - `CreditLimitExceeded` when over the limit without override
///
/// ## Example
/// ```rust
/// use khata_core::credit::review;
/// use khata_core::money::Money;
/// use khata_core::settlement::{settle, SettlementInput};
/// use khata_core::types::{Customer, PaymentMode};
///
/// let customer = Customer {
///     id: "c-1".into(),
///     name: "Ramesh".into(),
///     phone: None,
///     credit_limit_paise: 35_000,
///     outstanding_paise: 20_000,
/// };
/// let settlement = settle(SettlementInput {
///     total: Money::from_rupees(300),
///     mode: PaymentMode::CashOrMixed,
///     tendered: Money::from_rupees(100),
///     prior_outstanding: customer.outstanding(),
/// });
///
/// let blocked = review(&settlement, &customer, false).unwrap_err();
/// assert!(blocked.is_recoverable());
///
/// let approved = review(&settlement, &customer, true).unwrap();
/// assert!(approved.over_limit);
/// ```
pub fn review(
    settlement: &Settlement,
    customer: &Customer,
    force_override: bool,
) -> CoreResult<Approval> {
    if settlement.amount_credited.is_positive() && customer.is_walk_in() {
        return Err(ValidationError::NoCustomerForCredit.into());
    }

    if settlement.amount_paid.is_negative() {
        return Err(ValidationError::Negative {
            field: "amount paid".to_string(),
        }
        .into());
    }

    let over_limit =
        customer.has_credit_limit() && settlement.resulting_outstanding > customer.credit_limit();

    if over_limit && !force_override {
        return Err(CoreError::CreditLimitExceeded(CreditLimitBreach {
            customer_id: customer.id.clone(),
            limit: customer.credit_limit(),
            projected_balance: settlement.resulting_outstanding,
            message: format!(
                "{} would owe {} against a credit limit of {}",
                customer.name,
                settlement.resulting_outstanding,
                customer.credit_limit()
            ),
        }));
    }

    Ok(Approval {
        settlement: *settlement,
        customer_id: (!customer.is_walk_in()).then(|| customer.id.clone()),
        force_override,
        over_limit,
    })
}

// =============================================================================
// Confirmation Phase
// =============================================================================

/// Why a confirmation attempt was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "reason", rename_all = "snake_case")]
#[ts(export)]
pub enum BlockReason {
    Validation { message: String },
    CreditLimitExceeded { breach: CreditLimitBreach },
}

impl BlockReason {
    fn from_error(err: &CoreError) -> Self {
        match err {
            CoreError::CreditLimitExceeded(breach) => BlockReason::CreditLimitExceeded {
                breach: breach.clone(),
            },
            other => BlockReason::Validation {
                message: other.to_string(),
            },
        }
    }
}

/// Where the current confirmation attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "phase", rename_all = "snake_case")]
#[ts(export)]
pub enum ConfirmPhase {
    #[default]
    Idle,
    Evaluating,
    Approved,
    Blocked { reason: BlockReason },
}

impl ConfirmPhase {
    /// True only in `Blocked(CreditLimitExceeded)`.
    pub fn can_override(&self) -> bool {
        matches!(
            self,
            ConfirmPhase::Blocked {
                reason: BlockReason::CreditLimitExceeded { .. }
            }
        )
    }

    /// Moves to `Evaluating` if the current phase allows it.
    ///
    /// ## Errors
    /// `NotAllowed` when already evaluating, when an approved sale is still
    /// being handed off, or when blocked and the retry is not the override
    /// re-entry.
    pub fn begin(&mut self, force_override: bool) -> Result<(), ValidationError> {
        let can_override = self.can_override();
        match self {
            ConfirmPhase::Idle => {}
            ConfirmPhase::Evaluating => {
                return Err(ValidationError::NotAllowed(
                    "confirmation already in progress".to_string(),
                ));
            }
            ConfirmPhase::Approved => {
                return Err(ValidationError::NotAllowed(
                    "sale already approved and being committed".to_string(),
                ));
            }
            ConfirmPhase::Blocked { .. } if can_override && force_override => {}
            ConfirmPhase::Blocked { .. } if can_override => {
                return Err(ValidationError::NotAllowed(
                    "credit limit exceeded: confirm with override or change the payment"
                        .to_string(),
                ));
            }
            ConfirmPhase::Blocked { .. } => {
                return Err(ValidationError::NotAllowed(
                    "change the payment inputs before confirming again".to_string(),
                ));
            }
        }
        *self = ConfirmPhase::Evaluating;
        Ok(())
    }

    /// Records a block that came from outside the local review, e.g. the
    /// backend rejecting the commit on its own limit check.
    pub fn block(&mut self, err: &CoreError) {
        *self = ConfirmPhase::Blocked {
            reason: BlockReason::from_error(err),
        };
    }

    /// Any change to cart or payment inputs.
    pub fn reset(&mut self) {
        *self = ConfirmPhase::Idle;
    }

    /// Runs one confirmation attempt through the guard.
    ///
    /// Leaves the phase at `Approved` or `Blocked` and returns what
    /// [`review`] returned. If the phase refuses the attempt, it is left
    /// unchanged.
    pub fn evaluate(
        &mut self,
        settlement: &Settlement,
        customer: &Customer,
        force_override: bool,
    ) -> CoreResult<Approval> {
        self.begin(force_override)?;

        let result = review(settlement, customer, force_override);
        match &result {
            Ok(_) => *self = ConfirmPhase::Approved,
            Err(err) => self.block(err),
        }
        result
    }
}

// =============================================================================
// Ledger Entries
// =============================================================================

/// The khata entry a committed sale implies, if any.
///
/// Only an approval that put something on a real customer's khata produces
/// an entry.
pub fn sale_ledger_entry(approval: &Approval, sale_reference: &str) -> Option<LedgerEntry> {
    let customer_id = approval.customer_id.as_ref()?;
    let credited = approval.settlement.amount_credited;
    if !credited.is_positive() {
        return None;
    }

    Some(LedgerEntry {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.clone(),
        kind: LedgerEntryKind::CreditSale,
        amount_paise: credited.paise(),
        balance_after_paise: approval.settlement.resulting_outstanding.paise(),
        sale_reference: Some(sale_reference.to_string()),
        created_at: Utc::now(),
    })
}

/// Records a customer paying down their dues.
///
/// ## Errors
/// - `NotAllowed` for Walk-in
/// - `MustBePositive` for a zero or negative amount
/// - `OutOfRange` when the amount exceeds what is owed
pub fn collect_dues(customer: &Customer, amount: Money) -> CoreResult<LedgerEntry> {
    if customer.is_walk_in() {
        return Err(ValidationError::NotAllowed("Walk-in customer has no khata".to_string()).into());
    }

    validate_dues_amount(amount)?;

    let outstanding = customer.outstanding();
    if amount > outstanding {
        return Err(ValidationError::OutOfRange {
            field: "payment amount (paise)".to_string(),
            min: 1,
            max: outstanding.paise(),
        }
        .into());
    }

    Ok(LedgerEntry {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        kind: LedgerEntryKind::DuesPayment,
        amount_paise: amount.paise(),
        balance_after_paise: (outstanding - amount).paise(),
        sale_reference: None,
        created_at: Utc::now(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{settle, SettlementInput};
    use crate::types::PaymentMode;

    fn customer(outstanding: i64, limit: i64) -> Customer {
        Customer {
            id: "c-1".to_string(),
            name: "Ramesh".to_string(),
            phone: None,
            credit_limit_paise: Money::from_rupees(limit).paise(),
            outstanding_paise: Money::from_rupees(outstanding).paise(),
        }
    }

    fn settlement_for(
        customer: &Customer,
        total: i64,
        mode: PaymentMode,
        tendered: i64,
    ) -> Settlement {
        settle(SettlementInput {
            total: Money::from_rupees(total),
            mode,
            tendered: Money::from_rupees(tendered),
            prior_outstanding: customer.outstanding(),
        })
    }

    #[test]
    fn test_equal_to_limit_is_approved() {
        let c = customer(200, 400);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, 100);

        let approval = review(&s, &c, false).unwrap();
        assert!(!approval.over_limit);
        assert_eq!(approval.customer_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_over_limit_blocks_then_override_approves() {
        let c = customer(200, 350);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, 100);

        let err = review(&s, &c, false).unwrap_err();
        let breach = err.credit_breach().unwrap();
        assert_eq!(breach.limit, Money::from_rupees(350));
        assert_eq!(breach.projected_balance, Money::from_rupees(400));

        let approval = review(&s, &c, true).unwrap();
        assert!(approval.over_limit);
        assert!(approval.force_override);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let c = customer(10_000, 0);
        let s = settlement_for(&c, 300, PaymentMode::FullCredit, 0);
        assert!(review(&s, &c, false).is_ok());
    }

    #[test]
    fn test_walk_in_credit_is_hard_block() {
        let walk_in = Customer::walk_in();
        let s = settlement_for(&walk_in, 300, PaymentMode::CashOrMixed, 100);

        for force in [false, true] {
            let err = review(&s, &walk_in, force).unwrap_err();
            assert_eq!(err, CoreError::Validation(ValidationError::NoCustomerForCredit));
        }
    }

    #[test]
    fn test_walk_in_cash_sale_approved() {
        let walk_in = Customer::walk_in();
        let s = settlement_for(&walk_in, 300, PaymentMode::CashOrMixed, 500);
        let approval = review(&s, &walk_in, false).unwrap();
        assert_eq!(approval.customer_id, None);
    }

    #[test]
    fn test_negative_paid_rejected() {
        let c = customer(0, 0);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, -5);
        let err = review(&s, &c, true).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_phase_override_reentry() {
        let c = customer(200, 350);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, 100);
        let mut phase = ConfirmPhase::default();

        assert!(phase.evaluate(&s, &c, false).is_err());
        assert!(phase.can_override());

        // Same request again without override is refused by the phase itself
        let err = phase.evaluate(&s, &c, false).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::NotAllowed(_))));
        assert!(phase.can_override());

        assert!(phase.evaluate(&s, &c, true).is_ok());
        assert_eq!(phase, ConfirmPhase::Approved);
    }

    #[test]
    fn test_approved_phase_refuses_second_attempt() {
        let c = customer(0, 0);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, 300);
        let mut phase = ConfirmPhase::default();

        assert!(phase.evaluate(&s, &c, false).is_ok());
        assert_eq!(phase, ConfirmPhase::Approved);

        // Stays refused until the committed sale resets the session
        for force in [false, true] {
            let err = phase.evaluate(&s, &c, force).unwrap_err();
            assert!(matches!(err, CoreError::Validation(ValidationError::NotAllowed(_))));
            assert_eq!(phase, ConfirmPhase::Approved);
        }

        phase.reset();
        assert!(phase.evaluate(&s, &c, false).is_ok());
    }

    #[test]
    fn test_phase_validation_block_needs_input_change() {
        let walk_in = Customer::walk_in();
        let s = settlement_for(&walk_in, 300, PaymentMode::CashOrMixed, 0);
        let mut phase = ConfirmPhase::default();

        assert!(phase.evaluate(&s, &walk_in, false).is_err());
        assert!(!phase.can_override());
        assert!(phase.begin(true).is_err());

        phase.reset();
        assert_eq!(phase, ConfirmPhase::Idle);
        assert!(phase.begin(false).is_ok());
        assert_eq!(phase, ConfirmPhase::Evaluating);
        assert!(phase.begin(false).is_err());
    }

    #[test]
    fn test_sale_ledger_entry() {
        let c = customer(200, 0);
        let s = settlement_for(&c, 300, PaymentMode::CashOrMixed, 100);
        let approval = review(&s, &c, false).unwrap();

        let entry = sale_ledger_entry(&approval, "sale-9").unwrap();
        assert_eq!(entry.kind, LedgerEntryKind::CreditSale);
        assert_eq!(entry.amount(), Money::from_rupees(200));
        assert_eq!(entry.balance_after(), Money::from_rupees(400));
        assert_eq!(entry.sale_reference.as_deref(), Some("sale-9"));

        let paid_in_full = settlement_for(&c, 300, PaymentMode::CashOrMixed, 300);
        let approval = review(&paid_in_full, &c, false).unwrap();
        assert!(sale_ledger_entry(&approval, "sale-10").is_none());
    }

    #[test]
    fn test_collect_dues() {
        let c = customer(200, 400);

        let entry = collect_dues(&c, Money::from_rupees(50)).unwrap();
        assert_eq!(entry.kind, LedgerEntryKind::DuesPayment);
        assert_eq!(entry.balance_after(), Money::from_rupees(150));

        assert!(collect_dues(&c, Money::from_rupees(200)).is_ok());
        assert!(collect_dues(&c, Money::from_rupees(201)).is_err());
        assert!(collect_dues(&c, Money::zero()).is_err());
        assert!(collect_dues(&Customer::walk_in(), Money::from_rupees(1)).is_err());
    }
}
