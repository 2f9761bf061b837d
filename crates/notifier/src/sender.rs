//! JSON POST with bounded exponential backoff

use crate::error::DeliveryError;
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Retry ceiling and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included (default: 3)
    pub max_attempts: u32,
    /// Delay unit; retry after attempt `n` waits `base_delay * 2^n` (default: 1s)
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based): 2s, 4s, 8s...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Result of delivering one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Exhausted { attempts: u32, last_error: DeliveryError },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } => *attempts,
            DeliveryOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// The one place retries happen; every channel sends through it
#[derive(Clone)]
pub struct RetryingSender {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingSender {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// POST `payload` to `endpoint` until `accepts` approves the status or the
    /// attempts run out
    ///
    /// Never fails: exhaustion is reported through the outcome and logged.
    /// `label` names the destination in logs so the endpoint (often a secret)
    /// never appears there.
    pub async fn send<F>(
        &self,
        label: &str,
        endpoint: &str,
        payload: &Value,
        accepts: F,
    ) -> DeliveryOutcome
    where
        F: Fn(u16) -> bool,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match self.transport.post_json(endpoint, payload).await {
                Ok(status) if accepts(status) => Ok(status),
                Ok(status) => Err(DeliveryError::Rejected { status }),
                Err(e) => Err(e),
            };

            match result {
                Ok(status) => {
                    info!("{} notification sent (status {}, attempt {})", label, status, attempt);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "{} attempt {} failed: {}; retrying in {:?}",
                        label, attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("{} notification failed after {} attempts: {}", label, attempt, e);
                    return DeliveryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
            }
        }
    }
}
