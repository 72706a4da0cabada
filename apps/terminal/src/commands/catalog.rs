//! # Catalog Commands
//!
//! Fetching and browsing the stock snapshot and customer list.
//!
//! Reads go through [`with_backoff`]: a flaky connection during a refresh is
//! retried, a malformed catalog is not.

use chrono::{DateTime, Utc};
use khata_client::with_backoff;
use khata_core::validation::validate_customer;
use khata_core::{Customer, InventoryItem, LowStockEntry, StockSnapshot};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::{BackendState, CatalogState};

/// Result of a full catalog refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub item_count: usize,
    pub customer_count: usize,
    pub low_stock_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Re-fetches inventory and swaps in a new snapshot.
///
/// Returns the number of items. The old snapshot stays in place if the
/// fetch or validation fails.
pub async fn refresh_inventory(backend: &BackendState, catalog: &CatalogState) -> ApiResult<usize> {
    debug!("refresh_inventory command");

    let api = backend.api();
    let items =
        with_backoff(backend.retry(), "fetch_inventory", move || api.fetch_inventory()).await?;
    let snapshot = StockSnapshot::new(items)?;
    let count = snapshot.len();

    catalog.replace_snapshot(snapshot);
    info!(items = count, "Stock snapshot replaced");
    Ok(count)
}

/// Re-fetches customers. A malformed record rejects the whole list.
pub async fn refresh_customers(backend: &BackendState, catalog: &CatalogState) -> ApiResult<usize> {
    debug!("refresh_customers command");

    let api = backend.api();
    let customers =
        with_backoff(backend.retry(), "fetch_customers", move || api.fetch_customers()).await?;
    for customer in &customers {
        validate_customer(customer)?;
    }
    let count = customers.len();

    catalog.replace_customers(customers);
    info!(customers = count, "Customer list replaced");
    Ok(count)
}

/// Refreshes inventory and customers.
pub async fn refresh_catalog(
    backend: &BackendState,
    catalog: &CatalogState,
) -> ApiResult<CatalogSummary> {
    debug!("refresh_catalog command");

    let item_count = refresh_inventory(backend, catalog).await?;
    let customer_count = refresh_customers(backend, catalog).await?;
    let snapshot = catalog.snapshot();

    Ok(CatalogSummary {
        item_count,
        customer_count,
        low_stock_count: snapshot.low_stock().len(),
        fetched_at: snapshot.fetched_at(),
    })
}

/// Items in catalog order.
pub fn list_items(catalog: &CatalogState) -> Vec<InventoryItem> {
    debug!("list_items command");
    catalog.snapshot().items().to_vec()
}

pub fn list_customers(catalog: &CatalogState) -> Vec<Customer> {
    debug!("list_customers command");
    catalog.customers()
}

/// Sellable identities at or below their reorder level.
pub fn low_stock(catalog: &CatalogState) -> Vec<LowStockEntry> {
    debug!("low_stock command");
    catalog.snapshot().low_stock()
}
