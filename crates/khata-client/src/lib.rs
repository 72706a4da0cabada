//! # khata-client: Backend Boundary for Khata POS
//!
//! Everything the terminal needs to talk to the shop backend: the API
//! traits, their HTTP implementation, the wire protocol, configuration and
//! retry policy.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backend Request Flow                             │
//! │                                                                         │
//! │  khata-terminal                                                         │
//! │       │  Arc<dyn PosBackend>                                            │
//! │       ▼                                                                 │
//! │  ┌──────────────┐   reads    ┌─────────────┐                            │
//! │  │ HttpBackend  │──────────► │ with_backoff│──► GET inventory/customers │
//! │  │  (http.rs)   │            └─────────────┘                            │
//! │  │              │   commit (never retried)                              │
//! │  │              │──────────────────────────────► POST sales             │
//! │  │              │──────────────────────────────► POST ledger            │
//! │  └──────┬───────┘                                                       │
//! │         │ non-2xx                                                       │
//! │         ▼                                                               │
//! │  protocol::error_from_response ──► ClientError                          │
//! │         CREDIT_LIMIT_EXCEEDED  ──► CreditLimitExceeded (recoverable)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - `SaleApi`, `CatalogApi`, `LedgerApi`, `PosBackend`
//! - [`config`] - Client configuration (TOML + env)
//! - [`error`] - Client error types
//! - [`http`] - reqwest implementation
//! - [`protocol`] - Routes, response bodies, failure mapping
//! - [`retry`] - Exponential backoff for reads

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod retry;

pub use api::{CatalogApi, LedgerApi, PosBackend, SaleApi};
pub use config::{ApiSettings, ClientConfig, RetrySettings};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use protocol::{ErrorPayload, SaleReceipt, CREDIT_LIMIT_EXCEEDED};
pub use retry::with_backoff;
