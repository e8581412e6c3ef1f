//! One-retry policy for calls to external collaborators.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Errors that can tell a transport-level failure from a well-formed
/// rejection.
pub trait Transient: Sized {
    /// Timeouts and connection failures. These get retried.
    fn is_transient(&self) -> bool;

    /// The error reported when a call exceeds the policy timeout.
    fn timed_out(after: Duration) -> Self;
}

/// Per-call timeout plus a bounded number of retries on transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Retry exactly once.
    pub fn once(timeout: Duration) -> Self {
        Self {
            timeout,
            retries: 1,
        }
    }

    /// Run `op`, retrying it while it fails transiently and retries remain.
    /// Each attempt gets its own timeout, and a timeout counts as a
    /// transient failure.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Transient + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(self.timeout)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(call = what, attempt = attempt, error = %e, "Transient failure, retrying");
                }
                other => return other,
            }
        }
    }
}
