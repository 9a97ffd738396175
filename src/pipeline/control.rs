//! Cancellation and time budgets for a single run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::error::{DegradeError, DegradeResult};

/// Shared flag that stops a run before its next step or frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every run holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether `cancel` was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Deadline and cancellation for one pipeline run.
///
/// Checked before every step and every frame. Work already finished (and cached) stays valid
/// when a run is stopped.
#[derive(Clone, Debug, Default)]
pub struct RunControl {
    timeout: Option<(Instant, Duration)>,
    cancel: CancelToken,
}

impl RunControl {
    /// No deadline, fresh token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget measured from now.
    pub fn with_timeout(mut self, budget: Duration) -> Self {
        self.timeout = Some((Instant::now(), budget));
        self
    }

    /// Share an existing token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this run.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// `Cancelled` or `Timeout` once the run must stop.
    pub fn check(&self) -> DegradeResult<()> {
        if self.cancel.is_cancelled() {
            return Err(DegradeError::Cancelled);
        }
        if let Some((started, budget)) = self.timeout {
            let elapsed = started.elapsed();
            if elapsed >= budget {
                return Err(DegradeError::Timeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                    budget_ms: budget.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/control.rs"]
mod tests;
