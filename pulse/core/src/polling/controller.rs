//! Polling Controller
//!
//! Owns one periodic-fetch loop for one entity type. The loop runs as a
//! spawned task that is aborted on [`PollingController::stop`] or drop, so a
//! result that arrives after teardown is never written anywhere.
//!
//! # State Machine
//!
//! ```text
//!            tick / refresh
//!   Idle ────────────────────▶ Fetching ──ok──▶ Ready
//!                                 ▲  │
//!   backoff elapsed, view shown   │  │ err
//!                                 │  ▼
//!                               Degraded
//! ```
//!
//! Fetches within a controller are strictly sequential: the loop only waits
//! for the next tick after the current fetch cycle (including its retries)
//! has finished, and ticks missed meanwhile are skipped. A hidden view
//! suppresses both ticks and pending retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::retry::RetryPolicy;
use super::state::{PollError, PollSnapshot, PollState};
use crate::api::PulseApi;
use crate::error::Result;
use crate::models::{MoodSnapshot, PulseHistory};

/// Refresh cadence of both dashboard feeds
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
/// Age after which a value is reported stale
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10);
/// Default pulse history lookback
pub const DEFAULT_HISTORY_DAYS: i64 = 7;

/// One fetch operation a controller can repeat
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    /// Perform a single fetch
    async fn fetch(&self) -> Result<T>;
}

/// Fetches the current mood
pub struct MoodFetcher {
    api: Arc<dyn PulseApi>,
}

impl MoodFetcher {
    /// Create a fetcher over the given API
    pub fn new(api: Arc<dyn PulseApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Fetcher<MoodSnapshot> for MoodFetcher {
    fn name(&self) -> &str {
        "mood"
    }

    async fn fetch(&self) -> Result<MoodSnapshot> {
        self.api.current_mood().await
    }
}

/// Fetches a fixed lookback window of pulse history
pub struct HistoryFetcher {
    api: Arc<dyn PulseApi>,
    days: i64,
}

impl HistoryFetcher {
    /// Create a fetcher for `days` days of history
    pub fn new(api: Arc<dyn PulseApi>, days: i64) -> Self {
        Self { api, days }
    }

    /// Lookback window in days
    #[must_use]
    pub fn days(&self) -> i64 {
        self.days
    }
}

#[async_trait]
impl Fetcher<PulseHistory> for HistoryFetcher {
    fn name(&self) -> &str {
        "pulse_history"
    }

    async fn fetch(&self) -> Result<PulseHistory> {
        self.api.pulse_history(self.days).await
    }
}

/// Cadence, staleness and retry settings for one controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Age after which the held value is reported stale
    pub stale_after: Duration,
    /// Backoff for failed fetches within one tick
    pub retry: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            retry: RetryPolicy::polling(),
        }
    }
}

/// Periodic fetch loop holding the latest known good value
pub struct PollingController<T> {
    fetcher: Arc<dyn Fetcher<T>>,
    config: PollConfig,
    state_tx: Arc<watch::Sender<PollSnapshot<T>>>,
    visible_tx: watch::Sender<bool>,
    refresh: Arc<Notify>,
    run: Option<RunHandle>,
}

/// The spawned loop of one `start`, with the flag that gates its writes
struct RunHandle {
    task: JoinHandle<()>,
    active: Arc<AtomicBool>,
}

impl RunHandle {
    fn cancel(self) {
        // Clear the flag first so a loop still being polled publishes nothing
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

impl<T: Send + Sync + 'static> PollingController<T> {
    /// Create a stopped, visible controller
    pub fn new(fetcher: Arc<dyn Fetcher<T>>, config: PollConfig) -> Self {
        let (state_tx, _) = watch::channel(PollSnapshot::idle(config.stale_after));
        let (visible_tx, _) = watch::channel(true);
        Self {
            fetcher,
            config,
            state_tx: Arc::new(state_tx),
            visible_tx,
            refresh: Arc::new(Notify::new()),
            run: None,
        }
    }

    /// Name of the underlying fetch
    pub fn name(&self) -> &str {
        self.fetcher.name()
    }

    /// Controller settings
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Start the loop; the first tick fires immediately
    ///
    /// Must be called from within a Tokio runtime. Calling it on a running
    /// controller does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!(feed = self.name(), "Controller already running");
            return;
        }

        info!(
            feed = self.name(),
            interval_ms = self.config.interval.as_millis() as u64,
            "Starting polling controller"
        );

        // Fresh per run: a permit left over from an earlier run must not
        // add a fetch on top of the immediate first tick
        self.refresh = Arc::new(Notify::new());
        let active = Arc::new(AtomicBool::new(true));

        let run = PollLoop {
            fetcher: Arc::clone(&self.fetcher),
            config: self.config,
            state: Publisher {
                tx: Arc::clone(&self.state_tx),
                active: Arc::clone(&active),
            },
            visible_rx: self.visible_tx.subscribe(),
            refresh: Arc::clone(&self.refresh),
        };
        self.run = Some(RunHandle {
            task: tokio::spawn(run.run()),
            active,
        });
    }

    /// Stop the loop and cancel any in-flight fetch
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel();
            info!(feed = self.name(), "Stopped polling controller");

            // An aborted fetch never completes, so don't leave it advertised
            self.state_tx.send_modify(|s| {
                if s.state == PollState::Fetching {
                    s.state = if s.last_error.is_some() {
                        PollState::Degraded
                    } else if s.current.is_some() {
                        PollState::Ready
                    } else {
                        PollState::Idle
                    };
                }
            });
        }
    }

    /// Whether the loop task is alive
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Report whether the consuming view is visible
    ///
    /// While hidden, ticks are skipped and a pending retry waits until the
    /// view is shown again.
    pub fn set_visible(&self, visible: bool) {
        let changed = self.visible_tx.send_if_modified(|v| {
            let changed = *v != visible;
            *v = visible;
            changed
        });
        if changed {
            debug!(feed = self.name(), visible, "Visibility changed");
        }
    }

    /// Whether ticks currently trigger fetches
    pub fn is_visible(&self) -> bool {
        *self.visible_tx.borrow()
    }

    /// Ask for a fetch now; requests made while a fetch is running collapse into one
    ///
    /// Ignored while stopped, since `start` fetches immediately anyway.
    pub fn refresh(&self) {
        if self.is_running() {
            self.refresh.notify_one();
        } else {
            debug!(feed = self.name(), "Not running, ignoring refresh");
        }
    }

    /// Current state
    pub fn snapshot(&self) -> PollSnapshot<T> {
        self.state_tx.borrow().clone()
    }

    /// Latest known good value
    pub fn current(&self) -> Option<Arc<T>> {
        self.state_tx.borrow().current.clone()
    }

    /// Receive every state transition
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot<T>> {
        self.state_tx.subscribe()
    }
}

impl<T> Drop for PollingController<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancel();
        }
    }
}

/// Write side of the state channel as seen by one run
struct Publisher<T> {
    tx: Arc<watch::Sender<PollSnapshot<T>>>,
    active: Arc<AtomicBool>,
}

impl<T> Publisher<T> {
    /// Apply `update` unless the run has been stopped
    ///
    /// The flag is read under the channel's write lock, so once `stop` has
    /// published its final state no later write from this run can land.
    fn publish(&self, update: impl FnOnce(&mut PollSnapshot<T>)) -> bool {
        self.tx.send_if_modified(|s| {
            if !self.active.load(Ordering::SeqCst) {
                return false;
            }
            update(s);
            true
        })
    }
}

/// Everything the spawned loop owns
struct PollLoop<T> {
    fetcher: Arc<dyn Fetcher<T>>,
    config: PollConfig,
    state: Publisher<T>,
    visible_rx: watch::Receiver<bool>,
    refresh: Arc<Notify>,
}

impl<T: Send + Sync + 'static> PollLoop<T> {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !*self.visible_rx.borrow() {
                        trace!(feed = self.fetcher.name(), "View hidden, skipping tick");
                        continue;
                    }
                }
                () = self.refresh.notified() => {
                    debug!(feed = self.fetcher.name(), "Refresh requested");
                }
            }

            self.fetch_cycle().await;
        }
    }

    /// One fetch plus its retries
    async fn fetch_cycle(&mut self) {
        let retry = self.config.retry;
        let mut retries_done = 0;

        loop {
            self.state.publish(|s| s.state = PollState::Fetching);

            match self.fetcher.fetch().await {
                Ok(value) => {
                    self.state.publish(|s| {
                        s.state = PollState::Ready;
                        s.current = Some(Arc::new(value));
                        s.last_error = None;
                        s.consecutive_failures = 0;
                        s.fetched_at = Some(Instant::now());
                    });
                    debug!(feed = self.fetcher.name(), retries_done, "Fetch succeeded");
                    return;
                }
                Err(e) => {
                    let error = PollError::from(&e);
                    self.state.publish(|s| {
                        s.state = PollState::Degraded;
                        s.last_error = Some(error);
                        s.consecutive_failures += 1;
                    });

                    if !e.is_retryable() {
                        warn!(feed = self.fetcher.name(), error = %e, "Fetch failed, not retryable");
                        return;
                    }
                    if !retry.allows_retry(retries_done) {
                        warn!(
                            feed = self.fetcher.name(),
                            error = %e,
                            retries_done,
                            "Fetch failed, retries exhausted"
                        );
                        return;
                    }

                    let delay = retry.delay_for_attempt(retries_done);
                    retries_done += 1;
                    debug!(
                        feed = self.fetcher.name(),
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        attempt = retries_done,
                        "Fetch failed, backing off"
                    );
                    tokio::time::sleep(delay).await;

                    if !self.wait_until_visible().await {
                        return;
                    }
                }
            }
        }
    }

    /// Hold a pending retry while the view is hidden
    ///
    /// Returns false if the controller went away while waiting.
    async fn wait_until_visible(&mut self) -> bool {
        if *self.visible_rx.borrow() {
            return true;
        }
        debug!(feed = self.fetcher.name(), "View hidden, holding retry");
        self.visible_rx.wait_for(|visible| *visible).await.is_ok()
    }
}
