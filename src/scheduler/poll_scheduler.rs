//! Fixed-interval poll loop.
//!
//! One cycle runs to completion before the next timer fire is honored, so a
//! slow cycle can never overlap its own next invocation. `start` while
//! running is a no-op; `stop` lets the in-flight cycle finish, then joins
//! the loop task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One full pass over the tracked work. Implementations must isolate
/// per-unit failures; the scheduler never inspects the outcome.
#[async_trait]
pub trait PollCycle: Send + Sync + 'static {
    async fn run_cycle(&self);
}

pub struct PollScheduler<C: PollCycle> {
    cycle: Arc<C>,
    running: Arc<AtomicBool>,
    loop_task: Mutex<Option<(JoinHandle<()>, Arc<Notify>)>>,
}

impl<C: PollCycle> PollScheduler<C> {
    pub fn new(cycle: Arc<C>) -> Self {
        Self {
            cycle,
            running: Arc::new(AtomicBool::new(false)),
            loop_task: Mutex::new(None),
        }
    }

    /// Start polling. The first cycle runs immediately, then once per
    /// interval. Calling `start` while running is a no-op.
    pub fn start(&self, interval: Duration) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("poll scheduler already running, ignoring start");
            return;
        }
        info!("poll scheduler starting with interval {:?}", interval);

        let running = self.running.clone();
        let cycle = self.cycle.clone();
        let stop_signal = Arc::new(Notify::new());
        let stop = stop_signal.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        cycle.run_cycle().await;
                    }
                    _ = stop.notified() => break,
                }
            }
            debug!("poll loop exited");
        });

        *self.lock_task() = Some((handle, stop_signal));
    }

    /// Stop polling. The in-flight cycle completes before the loop exits.
    /// Calling `stop` while stopped is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("poll scheduler stopping");

        let task = self.lock_task().take();
        if let Some((handle, stop_signal)) = task {
            stop_signal.notify_one();
            if let Err(err) = handle.await {
                warn!("poll loop task ended abnormally: {}", err);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<(JoinHandle<()>, Arc<Notify>)>> {
        self.loop_task.lock().unwrap_or_else(|poisoned| {
            warn!("scheduler task mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
