//! Watchdog and narrator timers of one export.
//!
//! Both timers belong to a single `ProgressTimers` value and stop when it is
//! cancelled or dropped, so no timer outlives the flow that armed it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tokio_util::sync::CancellationToken;

use super::ProgressLog;

pub const WATCHDOG_MESSAGE: &str = "PDF generation is taking longer than expected. This might indicate an issue with the data or the generation process. You can wait or try again later.";

pub struct ProgressTimers {
    token: CancellationToken,
    log: Arc<ProgressLog>,
    active: Arc<AtomicUsize>,
    tasks: Vec<JoinHandle<()>>,
}

/// Counts a running timer task until the task ends, however it ends.
struct ActiveTimer(Arc<AtomicUsize>);

impl ActiveTimer {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for ActiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProgressTimers {
    pub fn new(log: Arc<ProgressLog>, active: Arc<AtomicUsize>) -> Self {
        Self {
            token: CancellationToken::new(),
            log,
            active,
            tasks: Vec::new(),
        }
    }

    /// Log a warning once `delay` has passed. Advisory only.
    pub fn arm_watchdog(&mut self, delay: Duration) {
        let token = self.token.clone();
        let log = self.log.clone();
        let guard = ActiveTimer::enter(&self.active);

        self.tasks.push(tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = sleep(delay) => log.push(WATCHDOG_MESSAGE),
            }
        }));
    }

    /// Log the elapsed time since `started` every `every`.
    pub fn start_narrator(&mut self, every: Duration, started: Instant) {
        let token = self.token.clone();
        let log = self.log.clone();
        let guard = ActiveTimer::enter(&self.active);

        self.tasks.push(tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = interval_at(Instant::now() + every, every);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => log.push(format!(
                        "Still generating PDF... ({:.1} seconds elapsed)",
                        started.elapsed().as_secs_f64()
                    )),
                }
            }
        }));
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for ProgressTimers {
    fn drop(&mut self) {
        self.token.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }
}
