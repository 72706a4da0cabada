//! # Backend State
//!
//! The shop backend handle and the retry policy for its reads.

use std::sync::Arc;

use khata_client::{PosBackend, RetrySettings};

/// Managed backend state.
///
/// Holds a trait object so the console runs against [`khata_client::HttpBackend`]
/// and tests run against an in-memory fake.
#[derive(Clone)]
pub struct BackendState {
    backend: Arc<dyn PosBackend>,
    retry: RetrySettings,
}

impl BackendState {
    pub fn new(backend: Arc<dyn PosBackend>, retry: RetrySettings) -> Self {
        BackendState { backend, retry }
    }

    pub fn api(&self) -> &dyn PosBackend {
        self.backend.as_ref()
    }

    pub fn retry(&self) -> &RetrySettings {
        &self.retry
    }
}

impl std::fmt::Debug for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendState")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
