//! # khata-core: Pure Business Logic for Khata POS
//!
//! This crate is the settlement engine of Khata POS. It holds every rule
//! about carts, payments and credit as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 khata-terminal (operator console)               │   │
//! │  │    scan/add ──► cart ──► customer/mode/tender ──► confirm       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   stock   │  │   cart    │  │ settlement │  │  credit   │  │   │
//! │  │   │ Snapshot  │─►│   Cart    │─►│  settle()  │─►│ review()  │  │   │
//! │  │   │ ScanOut.  │  │ CartLine  │  │ PaymentForm│  │ ConfirmPh.│  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOCKS • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                khata-client (remote API boundary)               │   │
//! │  │          POST sales, GET inventory/customers, ledger            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, Customer, LedgerEntry, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Stock snapshot and barcode resolution
//! - [`cart`] - Cart manager with per-line stock ceilings
//! - [`settlement`] - Payment/credit split and the payment form
//! - [`credit`] - Credit limit guard, confirmation phase, ledger entries
//! - [`sale`] - Sale commit payload
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::{Cart, Customer, InventoryItem, Money, PaymentMode, StockSnapshot};
//! use khata_core::credit::review;
//! use khata_core::settlement::PaymentForm;
//!
//! let soap = InventoryItem {
//!     id: "soap".into(),
//!     name: "Soap".into(),
//!     barcode: None,
//!     price_paise: 4_500,
//!     quantity: 10,
//!     reorder_level: 2,
//!     variants: vec![],
//! };
//! let snapshot = StockSnapshot::new(vec![soap.clone()]).unwrap();
//!
//! let mut cart = Cart::new();
//! cart.add_item(&soap, None, &snapshot).unwrap();
//!
//! let mut form = PaymentForm::new();
//! form.select_mode(PaymentMode::CashOrMixed);
//! form.set_tendered(Money::from_rupees(50));
//!
//! let settlement = form.settlement(cart.total());
//! assert_eq!(settlement.change_due, Money::from_rupees(5));
//! assert!(review(&settlement, &Customer::walk_in(), false).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod credit;
pub mod error;
pub mod money;
pub mod sale;
pub mod settlement;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AddOutcome, Cart, CartCommand, CartLine, CommandOutcome, LineChange};
pub use credit::{Approval, BlockReason, ConfirmPhase};
pub use error::{CoreError, CoreResult, CreditLimitBreach, ValidationError};
pub use money::Money;
pub use sale::{SaleCommitItem, SaleCommitRequest};
pub use settlement::{settle, ModeSelection, PaymentForm, Settlement, SettlementInput};
pub use stock::{LowStockEntry, ScanOutcome, StockSnapshot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed id of the Walk-in pseudo-customer.
///
/// Never sent to the backend: a Walk-in sale commits with a null customer.
pub const WALK_IN_CUSTOMER_ID: &str = "walk-in";
