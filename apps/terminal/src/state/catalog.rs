//! # Catalog State
//!
//! The last fetched stock snapshot and customer list.
//!
//! ## Snapshot Swapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refresh_catalog()                                                      │
//! │       │  GET inventory ──► StockSnapshot::new(items)?                   │
//! │       ▼                                                                 │
//! │  RwLock<Arc<StockSnapshot>>  ◄── write lock held only for the swap      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Readers clone the Arc and keep a consistent view for the whole         │
//! │  command, even if a refresh lands halfway through.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are replaced wholesale, never patched.

use std::sync::{Arc, PoisonError, RwLock};

use khata_core::{Customer, StockSnapshot, WALK_IN_CUSTOMER_ID};

/// Managed catalog state.
#[derive(Debug, Default)]
pub struct CatalogState {
    snapshot: RwLock<Arc<StockSnapshot>>,
    customers: RwLock<Vec<Customer>>,
}

impl CatalogState {
    /// Starts with an empty snapshot and no customers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<StockSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a freshly fetched snapshot.
    pub fn replace_snapshot(&self, snapshot: StockSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.customers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_customers(&self, customers: Vec<Customer>) {
        *self.customers.write().unwrap_or_else(PoisonError::into_inner) = customers;
    }

    /// Looks up a customer. The Walk-in id always resolves.
    pub fn customer(&self, customer_id: &str) -> Option<Customer> {
        if customer_id == WALK_IN_CUSTOMER_ID {
            return Some(Customer::walk_in());
        }
        self.customers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.id == customer_id)
            .cloned()
    }

    /// Applies a balance the ledger just recorded, until the next refresh
    /// brings the backend's figure. Returns the updated customer.
    pub fn set_outstanding(&self, customer_id: &str, outstanding_paise: i64) -> Option<Customer> {
        let mut customers = self.customers.write().unwrap_or_else(PoisonError::into_inner);
        let customer = customers.iter_mut().find(|c| c.id == customer_id)?;
        customer.outstanding_paise = outstanding_paise;
        Some(customer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_core::InventoryItem;

    fn customer(id: &str, outstanding: i64) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {}", id),
            phone: None,
            credit_limit_paise: 50_000,
            outstanding_paise: outstanding,
        }
    }

    #[test]
    fn test_snapshot_swap_keeps_old_readers_consistent() {
        let catalog = CatalogState::new();
        let before = catalog.snapshot();
        assert!(before.is_empty());

        catalog.replace_snapshot(
            StockSnapshot::new(vec![InventoryItem {
                id: "salt".to_string(),
                name: "Salt 1kg".to_string(),
                barcode: None,
                price_paise: 2_500,
                quantity: 10,
                reorder_level: 2,
                variants: vec![],
            }])
            .unwrap(),
        );

        assert!(before.is_empty());
        assert_eq!(catalog.snapshot().len(), 1);
    }

    #[test]
    fn test_walk_in_always_resolves() {
        let catalog = CatalogState::new();
        let walk_in = catalog.customer(WALK_IN_CUSTOMER_ID).unwrap();
        assert!(walk_in.is_walk_in());
        assert!(catalog.customer("c-1").is_none());
    }

    #[test]
    fn test_set_outstanding() {
        let catalog = CatalogState::new();
        catalog.replace_customers(vec![customer("c-1", 20_000), customer("c-2", 0)]);

        let updated = catalog.set_outstanding("c-1", 5_000).unwrap();
        assert_eq!(updated.outstanding_paise, 5_000);
        assert_eq!(catalog.customer("c-1").unwrap().outstanding_paise, 5_000);
        assert!(catalog.set_outstanding("missing", 1).is_none());
    }
}
