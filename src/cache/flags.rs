use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::error::ClientError;
use crate::types::Operation;

#[derive(Debug, Clone, Default)]
pub struct OperationStatus {
    pub in_flight: usize,
    pub last_error: Option<ClientError>,
}

/// Loading and error flags per operation of one resource handle
#[derive(Debug, Default)]
pub struct OperationFlags {
    state: Mutex<HashMap<Operation, OperationStatus>>,
}

impl OperationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` with `op` marked pending; its error (or success) replaces
    /// the last recorded outcome
    pub async fn track<T, F>(&self, op: Operation, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let guard = InFlight::begin(self, op);
        let result = fut.await;
        guard.finish(result.as_ref().err().cloned());
        result
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        self.status(op).in_flight > 0
    }

    pub fn any_pending(&self) -> bool {
        self.lock().values().any(|s| s.in_flight > 0)
    }

    pub fn last_error(&self, op: Operation) -> Option<ClientError> {
        self.status(op).last_error
    }

    pub fn status(&self, op: Operation) -> OperationStatus {
        self.lock().get(&op).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Operation, OperationStatus>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the in-flight count even when the tracked future is dropped
struct InFlight<'a> {
    flags: &'a OperationFlags,
    op: Operation,
}

impl<'a> InFlight<'a> {
    fn begin(flags: &'a OperationFlags, op: Operation) -> Self {
        flags.lock().entry(op).or_default().in_flight += 1;
        Self { flags, op }
    }

    fn finish(self, error: Option<ClientError>) {
        self.flags.lock().entry(self.op).or_default().last_error = error;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.flags.lock();
        let status = state.entry(self.op).or_default();
        status.in_flight = status.in_flight.saturating_sub(1);
    }
}
