//! Request budget for the achievement API.
//!
//! The upstream publishes a hard request-rate ceiling, so every outbound
//! call goes through one process-wide [`RequestBudget`]. Callers wait for a
//! pacing slot in FIFO order; the budget never releases more than the
//! configured number of calls per interval, no matter how many callers are
//! queued. Transient failures are retried on the same budget with a fixed
//! delay; terminal failures surface immediately.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::errors::ApiError;
use crate::settings::TrackerSettings;

pub struct RequestBudget {
    /// Spacing between releases: `interval / requests_per_interval`.
    spacing: Duration,
    max_retries: u32,
    retry_delay: Duration,
    /// The earliest instant the next slot may be handed out. The tokio
    /// mutex queues waiters fairly, which makes slot handout FIFO.
    next_slot: Mutex<Option<Instant>>,
}

impl RequestBudget {
    pub fn new(
        requests_per_interval: u32,
        interval: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        let per_interval = requests_per_interval.max(1);
        Self {
            spacing: interval / per_interval,
            max_retries,
            retry_delay,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self::new(
            settings.requests_per_interval,
            settings.pacing_interval(),
            settings.max_retries,
            settings.retry_delay(),
        )
    }

    /// Wait for the next pacing slot.
    pub async fn acquire(&self) {
        let wakeup = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.spacing);
            slot
        };
        tokio::time::sleep_until(wakeup).await;
    }

    /// Claim a slot only if one is free right now.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut next) = self.next_slot.try_lock() else {
            return false;
        };
        let now = Instant::now();
        match *next {
            Some(at) if at > now => false,
            _ => {
                *next = Some(now + self.spacing);
                true
            }
        }
    }

    /// Run one logical API call through the budget.
    ///
    /// `op` must be re-invokable: each retry re-acquires a pacing slot and
    /// calls it again. Retries apply only to transient failures and stop
    /// after `max_retries` additional attempts.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.acquire().await;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "achievement API call failed (attempt {}/{}): {}; retrying",
                        attempt, self.max_retries, err
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    debug!("achievement API call gave up: {}", err);
                    return Err(err);
                }
            }
        }
    }
}
