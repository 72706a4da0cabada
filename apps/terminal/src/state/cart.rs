//! # Cart State
//!
//! The cart, the payment form and the confirmation phase of one terminal
//! session, behind a single lock.
//!
//! ## Thread Safety
//! The session is wrapped in `Arc<Mutex<T>>` because:
//! 1. Every cart or payment edit must also reset the confirmation phase
//! 2. A confirmation reads cart, form and phase as one consistent view
//! 3. Commands can run concurrently
//!
//! The lock is never held across an `.await`; commands copy what they need
//! out, talk to the backend, then lock again to apply the result.
//!
//! ## Session Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Session Operations                              │
//! │                                                                         │
//! │  Operator Action          Command                 Session Change        │
//! │  ───────────────          ───────                 ──────────────        │
//! │                                                                         │
//! │  Pick item ──────────────► add_to_cart() ───────► cart.apply(AddItem)   │
//! │                                                    phase = Idle         │
//! │  +/- quantity ───────────► update_quantity() ───► cart.apply(Increment) │
//! │                                                    phase = Idle         │
//! │  Choose customer ────────► select_customer() ───► form.select_customer  │
//! │                                                    phase = Idle         │
//! │  Confirm ────────────────► confirm_sale() ──────► phase.evaluate(...)   │
//! │                                                                         │
//! │  View Cart ──────────────► get_cart() ──────────► (read only)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operator edits go through [`CartState::with_session_edit`], which refuses
//! them while a sale commit is pending.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use khata_core::{Cart, CartLine, ConfirmPhase, Customer, PaymentForm, PaymentMode, Settlement};
use serde::Serialize;

use super::CheckoutState;
use crate::error::ApiResult;

/// Everything the operator has entered for the sale in progress.
#[derive(Debug, Default)]
pub struct CartSession {
    pub cart: Cart,
    pub form: PaymentForm,
    pub phase: ConfirmPhase,
}

impl CartSession {
    /// Current settlement for the cart total and the payment form.
    pub fn settlement(&self) -> Settlement {
        self.form.settlement(self.cart.total())
    }

    /// Back to an empty cart, Walk-in, cash and no pending confirmation.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.form.reset();
        self.phase.reset();
    }
}

/// Cart contents and totals for command responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_paise: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_paise: cart.total().paise(),
            created_at: cart.created_at(),
        }
    }
}

/// The payment dialog as the operator sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPreview {
    pub customer: Customer,
    pub mode: PaymentMode,
    pub settlement: Settlement,
    pub phase: ConfirmPhase,
    pub can_override: bool,
}

impl From<&CartSession> for PaymentPreview {
    fn from(session: &CartSession) -> Self {
        PaymentPreview {
            customer: session.form.customer().clone(),
            mode: session.form.mode(),
            settlement: session.settlement(),
            phase: session.phase.clone(),
            can_override: session.phase.can_override(),
        }
    }
}

/// Managed cart state.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<CartSession>>`:
/// - `Arc`: the console and background tasks share one session
/// - `Mutex`: cart, form and phase change together or not at all
#[derive(Debug, Clone, Default)]
pub struct CartState {
    session: Arc<Mutex<CartSession>>,
}

impl CartState {
    /// Creates an empty session: no lines, Walk-in, cash, idle.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CartSession> {
        // Core mutations validate before writing, so a poisoned session is
        // still consistent.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let view = cart_state.with_session(|s| CartView::from(&s.cart));
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartSession) -> R,
    {
        let session = self.lock();
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// Does not touch the confirmation phase; commands reset it when the
    /// operator actually changed something. Does not check the commit slot
    /// either: operator edits go through [`Self::with_session_edit`].
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CartSession) -> R,
    {
        let mut session = self.lock();
        f(&mut session)
    }

    /// Executes an operator edit with write access to the session.
    ///
    /// ## Errors
    /// `COMMIT_IN_PROGRESS` while a sale commit holds the permit. The
    /// session is left untouched; it is reset once that commit lands.
    pub fn with_session_edit<F, R>(&self, checkout: &CheckoutState, f: F) -> ApiResult<R>
    where
        F: FnOnce(&mut CartSession) -> ApiResult<R>,
    {
        let mut session = self.lock();
        checkout.ensure_idle()?;
        f(&mut session)
    }

    /// Snapshot of the cart for display.
    pub fn view(&self) -> CartView {
        self.with_session(|s| CartView::from(&s.cart))
    }

    /// Snapshot of the payment dialog for display.
    pub fn preview(&self) -> PaymentPreview {
        self.with_session(|s| PaymentPreview::from(s))
    }
}
