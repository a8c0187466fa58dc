//! Interval-task ownership.
//!
//! The scheduler owns one tokio task per named producer. Scheduling a
//! name twice replaces the earlier task, so there is never more than one
//! timer per producer. `stop()` signals shutdown over a watch channel and
//! awaits every task, so an in-flight tick finishes before `stop()`
//! returns and no producer runs afterwards.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Scheduler {
    tasks: HashMap<&'static str, JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl Default for Scheduler {
    fn default() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            tasks: HashMap::new(),
            shutdown,
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an interval loop running `tick` every `period`. The first
    /// tick fires one period after scheduling. A failed tick is logged
    /// and the loop continues; there is no retry before the next tick.
    ///
    /// Re-scheduling an already-scheduled name aborts the earlier task
    /// first.
    pub fn schedule<F, Fut, E>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send,
        E: Display,
    {
        if let Some(existing) = self.tasks.remove(name) {
            debug!(task = name, "replacing scheduled task");
            existing.abort();
        }

        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the
            // schedule starts one period from now.
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = interval.tick() => {
                        if let Err(error) = tick().await {
                            warn!(task = name, %error, "tick failed; continuing schedule");
                        }
                    }
                }
            }
        });

        self.tasks.insert(name, handle);
    }

    /// Names of currently scheduled tasks.
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.keys().copied().collect()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Signals shutdown and awaits every scheduled task. An in-flight
    /// tick completes before this returns; no task runs afterwards. Safe
    /// to call repeatedly.
    pub async fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let _ = self.shutdown.send(true);
        for (name, handle) in self.tasks.drain() {
            debug!(task = name, "stopping scheduled task");
            if let Err(error) = handle.await {
                if !error.is_cancelled() {
                    warn!(task = name, %error, "scheduled task ended abnormally");
                }
            }
        }
    }
}

impl Drop for Scheduler {
    /// Backstop for schedulers dropped without `stop()`; tasks are
    /// aborted rather than awaited.
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_tick(
        counter: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<(), Infallible>> + Send {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_on_the_period() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();
        scheduler.schedule("alerts", Duration::from_secs(5), counting_tick(counter.clone()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Advance period by period; a single large jump would collapse
        // missed ticks under MissedTickBehavior::Delay.
        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(5)).await;
            tokio::task::yield_now().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_the_task() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();

        scheduler.schedule("alerts", Duration::from_secs(5), counting_tick(first.clone()));
        scheduler.schedule("alerts", Duration::from_secs(5), counting_tick(second.clone()));
        assert_eq!(scheduler.task_names(), vec!["alerts"]);

        for _ in 0..4 {
            tokio::time::advance(Duration::from_secs(5)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert!(second.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks_and_is_idempotent() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();
        scheduler.schedule("metrics", Duration::from_secs(1), counting_tick(counter.clone()));

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
        let before = counter.load(Ordering::SeqCst);
        assert!(before >= 2);

        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_tick() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();
        let tick_counter = counter.clone();

        // The tick body parks on a timer before writing, so stop() lands
        // while the tick is in flight.
        scheduler.schedule("alerts", Duration::from_secs(1), move || {
            let tick_counter = tick_counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                tick_counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), Infallible>(())
            }
        });

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        scheduler.stop().await;
        // The in-flight write landed before stop() returned, and nothing
        // runs after it.
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_restarts_after_stop() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();

        scheduler.schedule("sync", Duration::from_secs(1), counting_tick(counter.clone()));
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        scheduler.stop().await;
        let before = counter.load(Ordering::SeqCst);

        scheduler.schedule("sync", Duration::from_secs(1), counting_tick(counter.clone()));
        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
        assert!(counter.load(Ordering::SeqCst) > before);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_does_not_halt_the_schedule() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();
        let tick_counter = counter.clone();

        scheduler.schedule("sync", Duration::from_secs(1), move || {
            let n = tick_counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n == 0 {
                Err("collection not seeded")
            } else {
                Ok(())
            })
        });

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
        assert!(counter.load(Ordering::SeqCst) >= 3);
    }
}
