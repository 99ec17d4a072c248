//! Rate-limit-aware request execution.

use crate::error::{RemoteError, RemoteResult};
use crate::gate::Gate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fallback hold applied when the remote suggests no usable wait, and for
/// transient timeouts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Issues logical remote operations, transparently absorbing rate limits
/// and transient timeouts.
///
/// Clones share one [`Gate`], so all requests issued through clones of a
/// transport back off together. Retries are unbounded: an operation is
/// reattempted until it stops being rate limited or timing out. Any other
/// failure propagates immediately.
#[derive(Clone, Debug, Default)]
pub struct Transport {
    gate: Arc<Gate>,
}

impl Transport {
    /// Create a transport with a fresh gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared gate.
    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    /// Run `operation` to completion.
    ///
    /// `operation` must perform exactly one remote attempt per invocation;
    /// it is re-invoked after every absorbed failure.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> RemoteResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        loop {
            self.gate.wait().await;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(RemoteError::RateLimited { retry_after }) => {
                    let delay = retry_after.unwrap_or(DEFAULT_BACKOFF);
                    debug!(delay_ms = delay.as_millis() as u64, "rate limited, holding gate");
                    self.gate.hold_for(delay);
                }
                Err(RemoteError::Timeout) => {
                    debug!("request timed out, holding gate");
                    self.gate.hold_for(DEFAULT_BACKOFF);
                }
                Err(other) => return Err(other),
            }
        }
    }
}
