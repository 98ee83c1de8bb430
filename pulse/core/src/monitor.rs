//! Pulse Monitor
//!
//! The dashboard's data layer: one mood controller and one history
//! controller sharing an API, mounted and unmounted together.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::api::PulseApi;
use crate::models::{MoodSnapshot, PulseHistory};
use crate::polling::{
    HistoryFetcher, MoodFetcher, PollConfig, PollSnapshot, PollingController, DEFAULT_HISTORY_DAYS,
};

/// Settings for both feeds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Current-mood feed
    pub mood: PollConfig,
    /// Pulse-history feed
    pub history: PollConfig,
    /// Window requested from the history endpoint
    pub history_days: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mood: PollConfig::default(),
            history: PollConfig::default(),
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

/// Mood and history feeds with a shared lifecycle
pub struct PulseMonitor {
    mood: PollingController<MoodSnapshot>,
    history: PollingController<PulseHistory>,
    mounted: bool,
}

impl PulseMonitor {
    /// Build both controllers; nothing is fetched until [`mount`](Self::mount)
    pub fn new(api: Arc<dyn PulseApi>, config: MonitorConfig) -> Self {
        let mood = PollingController::new(Arc::new(MoodFetcher::new(Arc::clone(&api))), config.mood);
        let history = PollingController::new(
            Arc::new(HistoryFetcher::new(api, config.history_days)),
            config.history,
        );
        Self {
            mood,
            history,
            mounted: false,
        }
    }

    /// Start both feeds
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        info!("Mounting pulse monitor");
        self.mood.start();
        self.history.start();
        self.mounted = true;
    }

    /// Forward view visibility to both feeds
    pub fn set_visible(&self, visible: bool) {
        self.mood.set_visible(visible);
        self.history.set_visible(visible);
    }

    /// Fetch both feeds now
    pub fn refresh(&self) {
        self.mood.refresh();
        self.history.refresh();
    }

    /// Stop both feeds; no request is issued afterwards
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mood.stop();
        self.history.stop();
        self.mounted = false;
        info!("Unmounted pulse monitor");
    }

    /// Whether [`mount`](Self::mount) was called without a matching unmount
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Current mood feed state
    pub fn mood(&self) -> PollSnapshot<MoodSnapshot> {
        self.mood.snapshot()
    }

    /// Pulse history feed state
    pub fn history(&self) -> PollSnapshot<PulseHistory> {
        self.history.snapshot()
    }

    /// Follow mood transitions
    pub fn subscribe_mood(&self) -> watch::Receiver<PollSnapshot<MoodSnapshot>> {
        self.mood.subscribe()
    }

    /// Follow history transitions
    pub fn subscribe_history(&self) -> watch::Receiver<PollSnapshot<PulseHistory>> {
        self.history.subscribe()
    }
}

impl Drop for PulseMonitor {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PulseError, Result};
    use crate::models::{ChatExchange, HealthStatus, Mood};
    use crate::polling::PollState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts calls per endpoint and always succeeds
    #[derive(Default)]
    struct CountingApi {
        mood_calls: AtomicUsize,
        history_calls: AtomicUsize,
        last_days: std::sync::Mutex<Option<i64>>,
    }

    #[async_trait]
    impl PulseApi for CountingApi {
        fn name(&self) -> &str {
            "counting"
        }

        async fn current_mood(&self) -> Result<MoodSnapshot> {
            self.mood_calls.fetch_add(1, Ordering::SeqCst);
            Ok(MoodSnapshot {
                mood: Mood::Healing,
                score: 0.7,
                timestamp: "2025-06-01T12:00:00".into(),
                predictive_statement: "Forests recovering".into(),
                confidence: 0.9,
                factors: vec!["reforestation".into()],
                trend: "improving".into(),
                next_update: "2025-06-01T12:05:00".into(),
            })
        }

        async fn pulse_history(&self, days: i64) -> Result<PulseHistory> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_days.lock().unwrap() = Some(days);
            Ok(PulseHistory {
                points: vec![],
                period: format!("{days}d"),
                aggregation: "hourly".into(),
                total_points: 0,
            })
        }

        async fn send_chat(&self, _text: &str) -> Result<ChatExchange> {
            Err(PulseError::Network("unused".into()))
        }

        async fn health_check(&self) -> Result<HealthStatus> {
            Err(PulseError::Network("unused".into()))
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_both_feeds() {
        let api = Arc::new(CountingApi::default());
        let config = MonitorConfig {
            history_days: 30,
            ..MonitorConfig::default()
        };
        let mut monitor = PulseMonitor::new(api.clone(), config);
        assert_eq!(monitor.mood().state, PollState::Idle);

        monitor.mount();
        settle().await;

        assert_eq!(api.mood_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*api.last_days.lock().unwrap(), Some(30));
        assert_eq!(monitor.mood().state, PollState::Ready);
        assert_eq!(monitor.mood().current.unwrap().mood, Mood::Healing);
        assert_eq!(monitor.history().state, PollState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_all_requests() {
        let api = Arc::new(CountingApi::default());
        let mut monitor = PulseMonitor::new(api.clone(), MonitorConfig::default());
        monitor.mount();
        settle().await;

        monitor.unmount();
        assert!(!monitor.is_mounted());
        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(api.mood_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_monitor_skips_ticks() {
        let api = Arc::new(CountingApi::default());
        let mut monitor = PulseMonitor::new(api.clone(), MonitorConfig::default());
        monitor.mount();
        settle().await;

        monitor.set_visible(false);
        tokio::time::sleep(Duration::from_secs(65)).await;
        settle().await;
        assert_eq!(api.mood_calls.load(Ordering::SeqCst), 1);

        monitor.set_visible(true);
        // Next tick at t=80s
        tokio::time::sleep(Duration::from_secs(16)).await;
        settle().await;
        assert_eq!(api.mood_calls.load(Ordering::SeqCst), 2);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_feeds() {
        let api = Arc::new(CountingApi::default());
        {
            let mut monitor = PulseMonitor::new(api.clone(), MonitorConfig::default());
            monitor.mount();
            settle().await;
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(api.mood_calls.load(Ordering::SeqCst), 1);
    }
}
