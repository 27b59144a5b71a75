//! Playback position tracking for the video being annotated.
//!
//! The embedded player lives in the browser, so the server only knows what the
//! client reports. [`ReportedPlayback`] turns those reports into a continuous
//! clock and [`PlaybackPoller`] samples it at a fixed cadence.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// Anything able to tell the current playback position in seconds.
pub trait PlaybackSource: Send + Sync {
    /// Current position, or `None` while the player is not initialised.
    fn current_time(&self) -> Option<f64>;
}

/// Last position reported by the client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackReport {
    pub position: f64,
    pub paused: bool,
    pub received_at: Instant,
}

/// Playback source fed by client reports.
///
/// While playing, the position keeps advancing with wall-clock time elapsed
/// since the last report.
#[derive(Clone)]
pub struct ReportedPlayback {
    last: Arc<watch::Sender<Option<PlaybackReport>>>,
}

impl Default for ReportedPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportedPlayback {
    pub fn new() -> Self {
        let (last, _rx) = watch::channel(None);
        Self {
            last: Arc::new(last),
        }
    }

    /// Record a position reported by the client and return the snapped time.
    pub fn report(&self, position: f64, paused: bool) -> f64 {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        self.last.send_replace(Some(PlaybackReport {
            position,
            paused,
            received_at: Instant::now(),
        }));
        position
    }

    pub fn last_report(&self) -> Option<PlaybackReport> {
        *self.last.borrow()
    }

    /// Forget every report, e.g. when the tracking session ends.
    pub fn reset(&self) {
        self.last.send_replace(None);
    }
}

impl PlaybackSource for ReportedPlayback {
    fn current_time(&self) -> Option<f64> {
        let report = self.last_report()?;
        if report.paused {
            return Some(report.position);
        }
        Some(report.position + report.received_at.elapsed().as_secs_f64())
    }
}

/// Background task sampling a [`PlaybackSource`] on a fixed interval.
///
/// The latest sample is published on a watch channel; ticks where the source
/// has no position yet leave the published value untouched. The task stops
/// when the poller is dropped.
pub struct PlaybackPoller {
    clock: watch::Receiver<Option<f64>>,
    task: JoinHandle<()>,
}

impl PlaybackPoller {
    pub fn spawn(source: Arc<dyn PlaybackSource>, period: Duration) -> Self {
        let (tx, clock) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(now) = source.current_time() else {
                    continue;
                };
                if tx.send(Some(now)).is_err() {
                    break;
                }
            }
        });

        Self { clock, task }
    }

    /// Most recent sample, if any tick has produced one.
    pub fn latest(&self) -> Option<f64> {
        *self.clock.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<f64>> {
        self.clock.clone()
    }
}

impl Drop for PlaybackPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn source_is_empty_before_first_report() {
        let playback = ReportedPlayback::new();
        assert_eq!(playback.current_time(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn playing_position_advances_with_time() {
        let playback = ReportedPlayback::new();
        playback.report(10.0, false);

        time::advance(Duration::from_millis(2_500)).await;

        let now = playback.current_time().unwrap();
        assert!((now - 12.5).abs() < 1e-6, "got {now}");
    }

    #[tokio::test(start_paused = true)]
    async fn paused_position_is_frozen() {
        let playback = ReportedPlayback::new();
        assert_eq!(playback.report(42.0, true), 42.0);

        time::advance(Duration::from_secs(5)).await;

        assert_eq!(playback.current_time(), Some(42.0));
    }

    #[tokio::test(start_paused = true)]
    async fn negative_reports_are_clamped() {
        let playback = ReportedPlayback::new();
        assert_eq!(playback.report(-1.0, true), 0.0);
        assert_eq!(playback.report(f64::NAN, true), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_skips_ticks_until_source_reports() {
        let playback = ReportedPlayback::new();
        let poller = PlaybackPoller::spawn(Arc::new(playback.clone()), Duration::from_millis(100));

        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(poller.latest(), None);

        playback.report(7.0, true);
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(poller.latest(), Some(7.0));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_forgets_position() {
        let playback = ReportedPlayback::new();
        playback.report(3.0, true);
        playback.reset();
        assert_eq!(playback.current_time(), None);
    }
}
