use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::warn;

use crate::error::ServiceError;

/// Point in time after which a workflow operation gives up.
///
/// Read-only store calls are raced against it. Mutating phases only check it before
/// they start, so a mutation that was sent is always seen through or compensated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline; calls run to completion.
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// `None` disables the deadline.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with `DeadlineExceeded` once the deadline has passed.
    pub fn check(&self, phase: &str) -> Result<(), ServiceError> {
        if self.is_expired() {
            warn!(phase, "Deadline exceeded");
            return Err(ServiceError::DeadlineExceeded(phase.to_string()));
        }
        Ok(())
    }

    /// Runs a read-only call, abandoning it when the deadline passes first.
    pub async fn run<T, E, F>(&self, phase: &str, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ServiceError>,
    {
        let Some(at) = self.at else {
            return call.await.map_err(Into::into);
        };
        self.check(phase)?;
        match timeout_at(at, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                warn!(phase, "Deadline exceeded");
                Err(ServiceError::DeadlineExceeded(phase.to_string()))
            }
        }
    }
}
