//! # Checkout State
//!
//! Guards the sale commit so at most one is in flight per session, and so
//! the operator cannot edit a sale that is already on its way to the
//! backend.
//!
//! ```text
//! confirm_sale ──► try_begin() ──► CommitPermit ──► POST sales ──► reset session
//!                       │                                           + drop(permit)
//!                       └── already committing ──► CommitInProgress
//!                                                 (nothing is submitted)
//!
//! cart / payment edit ──► ensure_idle() ── committing ──► CommitInProgress
//!                                                        (session untouched)
//! ```
//!
//! Both checks run under the cart session lock, so an edit is either applied
//! before the commit request is built or refused until the session reset.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// A second confirmation arrived while a commit is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("A sale is already being committed")]
pub struct CommitInProgress;

/// Managed checkout state.
#[derive(Debug, Default)]
pub struct CheckoutState {
    committing: AtomicBool,
}

impl CheckoutState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the commit slot. Released when the permit is dropped, on
    /// every exit path including errors.
    pub fn try_begin(&self) -> Result<CommitPermit<'_>, CommitInProgress> {
        self.committing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CommitInProgress)?;
        Ok(CommitPermit { state: self })
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::Acquire)
    }

    /// Fails while a commit holds the permit.
    pub fn ensure_idle(&self) -> Result<(), CommitInProgress> {
        if self.is_committing() {
            Err(CommitInProgress)
        } else {
            Ok(())
        }
    }
}

/// Held for the duration of one sale commit.
#[derive(Debug)]
pub struct CommitPermit<'a> {
    state: &'a CheckoutState,
}

impl Drop for CommitPermit<'_> {
    fn drop(&mut self) {
        self.state.committing.store(false, Ordering::Release);
    }
}
