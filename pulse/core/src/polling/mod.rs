//! Periodic Fetching
//!
//! Generic polling controllers with owned timers, explicit retry policies,
//! and a watch channel carrying the latest known good value.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+      tick       +-----------+      +-----------+
//! | PollingController | --------------> |  Fetcher  | ---> |  PulseApi |
//! |  (owned task)     | <-------------- | (mood /   | <--- |           |
//! +---------+---------+  Result<T>      |  history) |      +-----------+
//!           |                           +-----------+
//!           v
//!   watch::Sender<PollSnapshot<T>>  --->  consumers (read-only)
//! ```

mod controller;
mod retry;
mod state;

pub use controller::{
    Fetcher, HistoryFetcher, MoodFetcher, PollConfig, PollingController, DEFAULT_HISTORY_DAYS,
    DEFAULT_POLL_INTERVAL, DEFAULT_STALE_AFTER,
};
pub use retry::RetryPolicy;
pub use state::{PollError, PollSnapshot, PollState};
