//! # Backend API Traits
//!
//! The seams between the terminal and the shop backend. The terminal only
//! ever holds a `dyn PosBackend`; [`HttpBackend`](crate::http::HttpBackend)
//! is the production implementation and tests plug in in-memory fakes.

use async_trait::async_trait;
use khata_core::{Customer, InventoryItem, LedgerEntry, SaleCommitRequest};

use crate::error::ClientResult;
use crate::protocol::SaleReceipt;

/// Sale-commit API.
///
/// The backend is authoritative: it decrements stock and re-runs the credit
/// check, and may return `CreditLimitExceeded` even when the local guard
/// approved.
#[async_trait]
pub trait SaleApi: Send + Sync {
    async fn commit_sale(&self, request: &SaleCommitRequest) -> ClientResult<SaleReceipt>;
}

/// Catalog and customer fetches. Read-only.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_inventory(&self) -> ClientResult<Vec<InventoryItem>>;

    async fn fetch_customers(&self) -> ClientResult<Vec<Customer>>;
}

/// Credit/ledger history API.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Stores entries produced by the core. Returns how many were recorded.
    async fn record_entries(&self, entries: &[LedgerEntry]) -> ClientResult<usize>;

    async fn customer_ledger(&self, customer_id: &str) -> ClientResult<Vec<LedgerEntry>>;
}

/// Everything a terminal session needs from the backend.
pub trait PosBackend: SaleApi + CatalogApi + LedgerApi {}

impl<T> PosBackend for T where T: SaleApi + CatalogApi + LedgerApi {}
