//! # State Module
//!
//! Session state for the terminal, split by concern.
//!
//! Each command declares exactly the state it needs, so commands that only
//! touch the cart never wait on a catalog refresh and vice versa.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │  CartState   │ │ CatalogState │ │CheckoutState │ │ BackendState │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  Arc<Mutex<  │ │  RwLock<Arc< │ │  AtomicBool  │ │  Arc<dyn     │   │
//! │  │   Cart +     │ │   Snapshot>> │ │  commit slot │ │  PosBackend> │   │
//! │  │   Form +     │ │  customers   │ │              │ │  + retry     │   │
//! │  │   Phase>>    │ │              │ │              │ │              │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐                                                       │
//! │  │ ConfigState  │  read-only after startup                              │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CartState: cart, payment form and phase change under one Mutex      │
//! │  • CatalogState: snapshot swapped wholesale under a RwLock             │
//! │  • CheckoutState: one commit at a time via compare-exchange            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod cart;
mod catalog;
mod checkout;
mod config;

pub use backend::BackendState;
pub use cart::{CartSession, CartState, CartView, PaymentPreview};
pub use catalog::CatalogState;
pub use checkout::{CheckoutState, CommitInProgress, CommitPermit};
pub use config::ConfigState;
