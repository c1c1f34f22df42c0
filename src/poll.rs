//! Readiness polling.
//!
//! Provisioning on the customer API is asynchronous: a create call returns as
//! soon as the request is accepted, and the cluster or topic becomes usable some
//! time later. [`Poller::wait_until`] turns that into a call that only returns
//! once the resource reports ready, the attempt budget runs out, or a status
//! check fails.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ProviderError;

/// Outcome of a single status check.
pub type Tick = Result<bool, ProviderError>;

/// Fixed-interval readiness poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    /// Delay before every status check.
    pub interval: Duration,
    /// Unsuccessful checks tolerated before giving up; `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Poller {
    /// Poll without an attempt cap.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Poll at most `max_attempts` times.
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    /// Run `check` every `interval` until it reports ready.
    ///
    /// `check` returns `Ok(true)` when the resource is ready and `Ok(false)` while
    /// it is still pending. An `Err` ends the wait immediately with that error.
    /// When the budget is exhausted, the error built by `on_timeout` is returned.
    ///
    /// Returns the number of checks performed.
    pub async fn wait_until<F, Fut>(
        &self,
        mut check: F,
        on_timeout: impl FnOnce(u32) -> ProviderError,
    ) -> Result<u32, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Tick>,
    {
        let mut attempts = 0u32;
        loop {
            tokio::time::sleep(self.interval).await;
            attempts += 1;

            if check().await? {
                debug!(attempts, "Resource reported ready");
                return Ok(attempts);
            }
            trace!(attempts, "Resource not ready yet");

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(on_timeout(attempts));
                }
            }
        }
    }
}
