//! # Checkout Commands
//!
//! The payment dialog and the sale confirmation.
//!
//! ## Confirmation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    confirm_sale(force_override)                         │
//! │                                                                         │
//! │  1. CheckoutState::try_begin() ──── busy ────► COMMIT_IN_PROGRESS       │
//! │             │   (under the session lock; edits now refused)             │
//! │  2. phase.evaluate(settlement, customer, force_override)                │
//! │             │         └─ over limit ─► Blocked ─► CREDIT_LIMIT_EXCEEDED │
//! │             ▼                                     (operator: "force")   │
//! │  3. SaleCommitRequest::new(lines, approval)                             │
//! │             │                                                           │
//! │  4. POST sales  (never retried)                                         │
//! │             ├─ CREDIT_LIMIT_EXCEEDED ─► Blocked, same as step 2         │
//! │             ├─ other failure ─────────► COMMIT_FAILED, cart kept        │
//! │             ▼                                                           │
//! │  5. Reset session (empty cart, Walk-in, Idle), then release permit      │
//! │  6. Follow-ups, failures logged and flagged, never fatal:               │
//! │       • record the khata entry                                          │
//! │       • refresh the stock snapshot                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_client::ClientError;
use khata_core::credit::sale_ledger_entry;
use khata_core::validation::validate_tendered;
use khata_core::{
    CoreError, CreditLimitBreach, LedgerEntry, ModeSelection, Money, PaymentMode,
    SaleCommitRequest, Settlement, ValidationError,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::commands::catalog::refresh_inventory;
use crate::error::{ApiError, ApiResult};
use crate::state::{BackendState, CartState, CatalogState, CheckoutState, PaymentPreview};

/// Response to a customer selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSelection {
    /// True when FullCredit had to be dropped because Walk-in was chosen.
    pub mode_coerced: bool,
    pub preview: PaymentPreview,
}

/// Response to a mode selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeResponse {
    pub selection: ModeSelection,
    pub preview: PaymentPreview,
}

/// Response to a committed sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub sale_id: String,
    pub receipt_number: Option<String>,
    pub settlement: Settlement,
    /// `None` for Walk-in.
    pub customer_id: Option<String>,
    /// The sale went through on an operator override.
    pub over_limit: bool,
    pub ledger_entry: Option<LedgerEntry>,
    /// False when the khata entry could not be stored.
    pub ledger_recorded: bool,
    /// False when the post-sale stock refresh failed.
    pub snapshot_refreshed: bool,
}

// =============================================================================
// Payment Dialog
// =============================================================================
//
// Every edit here is refused with `COMMIT_IN_PROGRESS` while a sale commit
// is pending.

/// Makes a customer active for the sale in progress.
pub fn select_customer(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    customer_id: &str,
) -> ApiResult<CustomerSelection> {
    debug!(customer_id, "select_customer command");

    let customer = catalog
        .customer(customer_id)
        .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;

    cart.with_session_edit(checkout, |s| {
        let mode_coerced = s.form.select_customer(customer);
        s.phase.reset();
        Ok(CustomerSelection {
            mode_coerced,
            preview: PaymentPreview::from(&*s),
        })
    })
}

/// Selects the payment mode. FullCredit with Walk-in is coerced to cash.
pub fn select_mode(
    cart: &CartState,
    checkout: &CheckoutState,
    mode: PaymentMode,
) -> ApiResult<ModeResponse> {
    debug!(?mode, "select_mode command");

    cart.with_session_edit(checkout, |s| {
        let selection = s.form.select_mode(mode);
        s.phase.reset();
        Ok(ModeResponse {
            selection,
            preview: PaymentPreview::from(&*s),
        })
    })
}

/// Records the cash handed over.
pub fn set_tendered(
    cart: &CartState,
    checkout: &CheckoutState,
    tendered: Money,
) -> ApiResult<PaymentPreview> {
    debug!(tendered = %tendered, "set_tendered command");

    validate_tendered(tendered)?;
    cart.with_session_edit(checkout, |s| {
        s.form.set_tendered(tendered);
        s.phase.reset();
        Ok(PaymentPreview::from(&*s))
    })
}

/// Current settlement for the cart and payment inputs. Pure read.
pub fn preview_payment(cart: &CartState) -> PaymentPreview {
    debug!("preview_payment command");
    cart.preview()
}

/// Closes the payment dialog, discarding the speculative settlement. The
/// cart is kept.
pub fn cancel_payment(cart: &CartState, checkout: &CheckoutState) -> ApiResult<PaymentPreview> {
    debug!("cancel_payment command");

    cart.with_session_edit(checkout, |s| {
        s.form.reset();
        s.phase.reset();
        Ok(PaymentPreview::from(&*s))
    })
}

/// Abandons the sale entirely.
pub fn cancel_sale(cart: &CartState, checkout: &CheckoutState) -> ApiResult<PaymentPreview> {
    debug!("cancel_sale command");

    cart.with_session_edit(checkout, |s| {
        s.reset();
        Ok(PaymentPreview::from(&*s))
    })
}

// =============================================================================
// Confirmation
// =============================================================================

/// Confirms the sale in progress.
///
/// Call with `force_override = false` first. On `CREDIT_LIMIT_EXCEEDED` the
/// operator may call again with `force_override = true` for the same
/// inputs; any edit in between voids that option.
///
/// ## Errors
/// - `COMMIT_IN_PROGRESS` when another confirmation is pending. The permit
///   is held until the session has been reset, so no edit or second
///   confirmation can land on a sale that is already submitted
/// - `VALIDATION_ERROR` for an empty cart, credit on Walk-in, or a retry
///   the phase does not allow
/// - `CREDIT_LIMIT_EXCEEDED` from the local guard or from the backend
/// - `COMMIT_FAILED` / `NETWORK_ERROR` when the backend did not take the
///   sale; the cart and inputs are kept for another attempt
pub async fn confirm_sale(
    backend: &BackendState,
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    force_override: bool,
) -> ApiResult<ConfirmResponse> {
    debug!(force_override, "confirm_sale command");

    let prepared = cart.with_session_mut(|s| -> ApiResult<_> {
        let permit = checkout.try_begin()?;
        if s.cart.is_empty() {
            return Err(ValidationError::Required {
                field: "cart items".to_string(),
            }
            .into());
        }

        let settlement = s.settlement();
        let customer = s.form.customer().clone();
        let approval = s.phase.evaluate(&settlement, &customer, force_override)?;
        let request = match SaleCommitRequest::new(s.cart.lines(), &approval) {
            Ok(request) => request,
            Err(err) => {
                s.phase.reset();
                return Err(err.into());
            }
        };
        Ok((permit, request, approval, customer))
    });

    let (permit, request, approval, customer) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            info!(code = ?err.code, "Sale blocked before commit");
            return Err(err);
        }
    };

    info!(
        total = %approval.settlement.total,
        method = %approval.settlement.method,
        customer_id = ?approval.customer_id,
        over_limit = approval.over_limit,
        "Committing sale"
    );

    let receipt = match backend.api().commit_sale(&request).await {
        Ok(receipt) => receipt,
        Err(ClientError::CreditLimitExceeded { limit, message }) => {
            let err = CoreError::CreditLimitExceeded(CreditLimitBreach {
                customer_id: customer.id.clone(),
                limit: limit.unwrap_or_else(|| customer.credit_limit()),
                projected_balance: approval.settlement.resulting_outstanding,
                message,
            });
            warn!(customer_id = %customer.id, "Backend rejected sale on credit limit");
            cart.with_session_mut(|s| s.phase.block(&err));
            return Err(err.into());
        }
        Err(err) => {
            error!(error = %err, "Sale commit failed");
            cart.with_session_mut(|s| s.phase.reset());
            return Err(ApiError::commit_failed(&err));
        }
    };

    info!(sale_id = %receipt.sale_id, "Sale committed");
    cart.with_session_mut(|s| {
        s.reset();
        drop(permit);
    });

    let ledger_entry = sale_ledger_entry(&approval, &receipt.sale_id);
    let ledger_recorded = match &ledger_entry {
        None => true,
        Some(entry) => {
            catalog.set_outstanding(&entry.customer_id, entry.balance_after_paise);
            match backend.api().record_entries(std::slice::from_ref(entry)).await {
                Ok(_) => true,
                Err(err) => {
                    warn!(
                        sale_id = %receipt.sale_id,
                        error = %err,
                        "Failed to record khata entry"
                    );
                    false
                }
            }
        }
    };

    let snapshot_refreshed = match refresh_inventory(backend, catalog).await {
        Ok(_) => true,
        Err(err) => {
            warn!(sale_id = %receipt.sale_id, error = %err, "Stock refresh after sale failed");
            false
        }
    };

    Ok(ConfirmResponse {
        sale_id: receipt.sale_id,
        receipt_number: receipt.receipt_number,
        settlement: approval.settlement,
        customer_id: approval.customer_id,
        over_limit: approval.over_limit,
        ledger_entry,
        ledger_recorded,
        snapshot_refreshed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use khata_core::Customer;

    fn catalog_with(customer: Customer) -> CatalogState {
        let catalog = CatalogState::new();
        catalog.replace_customers(vec![customer]);
        catalog
    }

    fn ramesh() -> Customer {
        Customer {
            id: "c-1".to_string(),
            name: "Ramesh".to_string(),
            phone: None,
            credit_limit_paise: 35_000,
            outstanding_paise: 20_000,
        }
    }

    #[test]
    fn test_full_credit_coerced_for_walk_in() {
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        let response = select_mode(&cart, &checkout, PaymentMode::FullCredit).unwrap();

        assert!(matches!(response.selection, ModeSelection::Coerced { .. }));
        assert_eq!(response.preview.mode, PaymentMode::CashOrMixed);
    }

    #[test]
    fn test_switching_back_to_walk_in_drops_full_credit() {
        let catalog = catalog_with(ramesh());
        let cart = CartState::new();
        let checkout = CheckoutState::new();

        select_customer(&catalog, &cart, &checkout, "c-1").unwrap();
        let response = select_mode(&cart, &checkout, PaymentMode::FullCredit).unwrap();
        assert_eq!(
            response.selection,
            ModeSelection::Applied {
                mode: PaymentMode::FullCredit
            }
        );

        let selection =
            select_customer(&catalog, &cart, &checkout, khata_core::WALK_IN_CUSTOMER_ID).unwrap();
        assert!(selection.mode_coerced);
        assert_eq!(selection.preview.mode, PaymentMode::CashOrMixed);
    }

    #[test]
    fn test_unknown_customer() {
        let catalog = CatalogState::new();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        let err = select_customer(&catalog, &cart, &checkout, "c-404").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_negative_tender_rejected() {
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        let err = set_tendered(&cart, &checkout, Money::from_paise(-100)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(cart.preview().settlement.tendered.is_zero());
    }

    #[test]
    fn test_cancel_payment_resets_form_only() {
        let catalog = catalog_with(ramesh());
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        select_customer(&catalog, &cart, &checkout, "c-1").unwrap();
        set_tendered(&cart, &checkout, Money::from_rupees(100)).unwrap();

        let preview = cancel_payment(&cart, &checkout).unwrap();
        assert!(preview.customer.is_walk_in());
        assert!(preview.settlement.tendered.is_zero());
    }

    #[test]
    fn test_payment_edits_refused_while_commit_pending() {
        let catalog = catalog_with(ramesh());
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        select_customer(&catalog, &cart, &checkout, "c-1").unwrap();
        set_tendered(&cart, &checkout, Money::from_rupees(100)).unwrap();

        let permit = checkout.try_begin().unwrap();
        let refused = [
            select_customer(&catalog, &cart, &checkout, "c-1").map(|_| ()),
            select_mode(&cart, &checkout, PaymentMode::FullCredit).map(|_| ()),
            set_tendered(&cart, &checkout, Money::from_rupees(5)).map(|_| ()),
            cancel_payment(&cart, &checkout).map(|_| ()),
            cancel_sale(&cart, &checkout).map(|_| ()),
        ];
        for result in refused {
            assert_eq!(result.unwrap_err().code, ErrorCode::CommitInProgress);
        }

        let preview = preview_payment(&cart);
        assert_eq!(preview.customer.id, "c-1");
        assert_eq!(preview.mode, PaymentMode::CashOrMixed);
        assert_eq!(preview.settlement.tendered, Money::from_rupees(100));

        drop(permit);
        assert!(cancel_sale(&cart, &checkout).unwrap().customer.is_walk_in());
    }
}
