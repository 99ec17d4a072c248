//! Shared rate-limit gate.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// The earliest instant the next outgoing request may start.
///
/// Every request sharing a transport waits on the same gate, so the first
/// caller to observe a rate limit throttles all concurrent and future
/// requests at once. The deadline is only ever extended, never moved
/// earlier.
#[derive(Debug)]
pub struct Gate {
    deadline: Mutex<Instant>,
}

impl Gate {
    /// Create a gate that is initially clear.
    pub fn new() -> Self {
        Self {
            deadline: Mutex::new(Instant::now()),
        }
    }

    /// Wait until the gate is clear.
    ///
    /// Cooperative: any number of callers may wait simultaneously and all
    /// proceed once the deadline passes. The deadline is re-read after
    /// sleeping because another caller may have extended it meanwhile.
    pub async fn wait(&self) {
        loop {
            let deadline = self.current_deadline();
            if Instant::now() >= deadline {
                return;
            }
            sleep_until(deadline).await;
        }
    }

    /// Extend the gate so the next request starts no earlier than `delay`
    /// from now. Racing extensions keep the later deadline.
    pub fn hold_for(&self, delay: Duration) {
        let candidate = Instant::now() + delay;
        let mut deadline = self.deadline.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("gate mutex was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        });
        if candidate > *deadline {
            *deadline = candidate;
        }
    }

    /// Whether the gate currently blocks new requests.
    pub fn is_held(&self) -> bool {
        Instant::now() < self.current_deadline()
    }

    fn current_deadline(&self) -> Instant {
        *self.deadline.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("gate mutex was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
