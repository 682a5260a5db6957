// Task handles - spawned tokio work that stops when its handle is dropped

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Runs `tick` every `every` until it breaks or the handle goes away.
/// The first tick fires immediately.
pub struct RepeatingTask {
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(every: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(every);
            // a slow call pushes the schedule back instead of bursting
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tick().await.is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs a future once after `delay`, unless dropped first.
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn spawn<Fut>(delay: Duration, fut: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            fut.await;
        });
        Self { handle }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_repeating_task_stops_on_break() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let task = RepeatingTask::spawn(Duration::from_secs(1), move || {
            let seen = seen.clone();
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_repeating_task_stops_it() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let task = RepeatingTask::spawn(Duration::from_secs(1), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(2500)).await;
        drop(task);
        let before = count.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_task_fires_once_unless_dropped() {
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        let kept = DelayedTask::spawn(Duration::from_secs(5), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let f = fired.clone();
        let dropped = DelayedTask::spawn(Duration::from_secs(5), async move {
            f.fetch_add(10, Ordering::SeqCst);
        });
        drop(dropped);

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(kept.is_finished());
    }
}
