//! # Khata Commands
//!
//! Customer dues: collecting payments against the outstanding balance and
//! reading ledger history.

use khata_client::with_backoff;
use khata_core::{credit, Customer, LedgerEntry, Money, ValidationError};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{BackendState, CartState, CatalogState};

/// Response to a dues payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesResponse {
    pub entry: LedgerEntry,
    /// The customer with the reduced balance.
    pub customer: Customer,
}

/// Takes a payment against a customer's outstanding balance.
///
/// The entry is stored before any local balance changes; if the ledger API
/// refuses it nothing is updated. Writes are not retried.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown customer
/// - `VALIDATION_ERROR` for Walk-in, a non-positive amount, or more than is
///   owed
pub async fn collect_dues(
    backend: &BackendState,
    catalog: &CatalogState,
    cart: &CartState,
    customer_id: &str,
    amount: Money,
) -> ApiResult<DuesResponse> {
    debug!(customer_id, amount = %amount, "collect_dues command");

    let customer = catalog
        .customer(customer_id)
        .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;
    let entry = credit::collect_dues(&customer, amount)?;

    backend.api().record_entries(std::slice::from_ref(&entry)).await?;
    info!(
        customer_id,
        amount = %entry.amount(),
        balance_after = %entry.balance_after(),
        "Dues collected"
    );

    let customer = catalog
        .set_outstanding(customer_id, entry.balance_after_paise)
        .unwrap_or(Customer {
            outstanding_paise: entry.balance_after_paise,
            ..customer
        });

    // Keep an open payment dialog on the same customer in step with the
    // new balance.
    cart.with_session_mut(|s| {
        if s.form.customer().id == customer.id {
            s.form.select_customer(customer.clone());
            s.phase.reset();
        }
    });

    Ok(DuesResponse { entry, customer })
}

/// Ledger history for one customer, in the order the backend returns it.
pub async fn customer_history(
    backend: &BackendState,
    customer_id: &str,
) -> ApiResult<Vec<LedgerEntry>> {
    debug!(customer_id, "customer_history command");

    if customer_id == khata_core::WALK_IN_CUSTOMER_ID {
        return Err(ValidationError::NotAllowed("Walk-in customer has no khata".to_string()).into());
    }

    let api = backend.api();
    let entries = with_backoff(backend.retry(), "customer_ledger", move || {
        api.customer_ledger(customer_id)
    })
    .await?;
    Ok(entries)
}
