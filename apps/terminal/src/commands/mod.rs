//! # Commands Module
//!
//! Everything an operator can do in a session.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── cart.rs      ◄─── add, scan, quantity, remove, clear
//! ├── checkout.rs  ◄─── payment dialog, confirm_sale
//! ├── catalog.rs   ◄─── refresh, browse, low stock
//! └── khata.rs     ◄─── dues collection, ledger history
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the cart
//! fn get_cart(cart: &CartState)
//!
//! // Needs the snapshot to bound quantities, and the commit slot to refuse
//! // edits while a sale is being committed
//! fn add_to_cart(catalog: &CatalogState, cart: &CartState,
//!                checkout: &CheckoutState, ...)
//!
//! // Talks to the backend
//! async fn confirm_sale(backend: &BackendState, catalog: &CatalogState,
//!                       cart: &CartState, checkout: &CheckoutState, ...)
//! ```
//!
//! Every command logs its entry at `debug` and returns `ApiResult<T>`
//! where it can fail.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod khata;
