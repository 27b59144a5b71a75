use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tracing::debug;

/// Debounces persistence jobs: only the last job scheduled within the delay
/// window runs.
///
/// Scheduling supersedes the pending job. Once a job has started it runs on
/// its own task and is never aborted by later calls.
pub struct SaveScheduler {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `job` after the quiescence delay unless another job is scheduled first.
    pub async fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let delay = self.delay;

        let timer = tokio::spawn(async move {
            sleep(delay).await;
            if generation.load(Ordering::SeqCst) != ticket {
                debug!(ticket, "debounced save superseded");
                return;
            }
            tokio::spawn(job);
        });

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Drop the pending job, if any. A job already running is left alone.
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.pending.lock().await.take() {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time;

    use super::*;

    fn counting_job(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_changes_runs_one_job() {
        let scheduler = SaveScheduler::new(Duration::from_secs(1));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            scheduler.schedule(counting_job(&runs)).await;
            time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn job_waits_for_the_full_delay() {
        let scheduler = SaveScheduler::new(Duration::from_secs(1));
        let runs = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_job(&runs)).await;
        time::sleep(Duration::from_millis(900)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_job() {
        let scheduler = SaveScheduler::new(Duration::from_secs(1));
        let runs = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_job(&runs)).await;
        scheduler.cancel().await;
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn running_job_survives_a_new_schedule() {
        let scheduler = SaveScheduler::new(Duration::from_millis(100));
        let finished = Arc::new(AtomicUsize::new(0));

        let slow = {
            let finished = finished.clone();
            async move {
                time::sleep(Duration::from_secs(2)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };
        scheduler.schedule(slow).await;
        time::sleep(Duration::from_millis(150)).await;

        scheduler.schedule(counting_job(&finished)).await;
        scheduler.cancel().await;
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
