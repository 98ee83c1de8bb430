//! Pulse Daemon - Terminal Consumer for the GaiaPulse Monitor
//!
//! Runs the mood and history feeds in the foreground and prints every
//! change, or performs a single request and exits.
//!
//! # Usage
//!
//! ```bash
//! # Follow mood and history until interrupted
//! pulse-daemon watch --days 30
//!
//! # One-shot requests
//! pulse-daemon mood
//! pulse-daemon history --days 7
//! pulse-daemon chat "How are the oceans doing?"
//! pulse-daemon health
//!
//! # Against a local backend, with verbose logging
//! RUST_LOG=debug pulse-daemon --base-url http://localhost:8000 mood
//! ```
//!
//! # Environment Variables
//!
//! - `GAIAPULSE_API_URL`: API base URL
//! - `GAIAPULSE_TIMEOUT_MS`: Per-request timeout
//! - `GAIAPULSE_CONFIG`: Configuration file path
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Signals
//!
//! - SIGTERM/SIGINT: Stop the feeds and exit

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use pulse_core::config::{default_config_path, load_config_from_path};
use pulse_core::{
    ApiClient, ChatReply, ChatSession, ConfigOverrides, HttpTransport, PulseApi, PulseConfig,
    PulseMonitor,
};

/// Pulse Daemon - GaiaPulse environmental monitor for the terminal
#[derive(Parser, Debug)]
#[command(name = "pulse-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "GAIAPULSE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// API base URL, overriding file and environment
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// What to do
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Poll mood and history, printing every change until interrupted
    Watch {
        /// History window in days
        #[arg(long, value_name = "N")]
        days: Option<i64>,

        /// Seconds between polls
        #[arg(long, value_name = "S")]
        interval_secs: Option<u64>,
    },

    /// Fetch the current mood once
    Mood,

    /// Fetch pulse history once
    History {
        /// History window in days
        #[arg(long, value_name = "N")]
        days: Option<i64>,
    },

    /// Ask the assistant a question
    Chat {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Check service health
    Health,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.base_url {
            overrides = overrides.with_base_url(url.clone());
        }
        match self.command {
            Command::Watch {
                days,
                interval_secs,
            } => {
                if let Some(days) = days {
                    overrides = overrides.with_history_days(days);
                }
                if let Some(secs) = interval_secs {
                    overrides = overrides.with_interval_secs(secs);
                }
            }
            Command::History { days: Some(days) } => {
                overrides = overrides.with_history_days(days);
            }
            _ => {}
        }
        overrides
    }

    fn load_config(&self) -> Result<PulseConfig> {
        let path = self.config.clone().or_else(default_config_path);
        let mut config = load_config_from_path(path).context("Failed to load configuration")?;
        self.overrides()
            .apply(&mut config)
            .context("Invalid command-line option")?;
        Ok(config)
    }
}

/// Resolves when the process is asked to stop
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn watch(api: Arc<dyn PulseApi>, config: &PulseConfig, json: bool) -> Result<()> {
    let mut monitor = PulseMonitor::new(api, config.monitor);
    let mut moods = monitor.subscribe_mood();
    let mut histories = monitor.subscribe_history();
    monitor.mount();

    info!(
        days = config.monitor.history_days,
        interval_secs = config.monitor.mood.interval.as_secs(),
        "Watching GaiaPulse"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // Print each value once, the first time it is seen
    let mut last_mood = None;
    let mut last_history = None;

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = moods.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = moods.borrow_and_update().clone();
                if let Some(line) = render::feed_status("mood", &snapshot) {
                    eprintln!("{line}");
                }
                if let Some(current) = snapshot.current {
                    if last_mood.as_ref().map_or(true, |seen| !Arc::ptr_eq(seen, &current)) {
                        if json {
                            print_json(&*current)?;
                        } else {
                            println!("{}\n", render::mood(&current));
                        }
                        last_mood = Some(current);
                    }
                }
            }
            changed = histories.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = histories.borrow_and_update().clone();
                if let Some(line) = render::feed_status("history", &snapshot) {
                    eprintln!("{line}");
                }
                if let Some(current) = snapshot.current {
                    if last_history.as_ref().map_or(true, |seen| !Arc::ptr_eq(seen, &current)) {
                        if json {
                            print_json(&*current)?;
                        } else {
                            println!("{}\n", render::history(&current, 5));
                        }
                        last_history = Some(current);
                    }
                }
            }
        }
    }

    monitor.unmount();
    info!("Stopped watching");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pulse_daemon=info".parse()?)
                .add_directive("pulse_core=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = args.load_config()?;
    info!(
        base_url = %config.client.base_url,
        source = %config.source(),
        "Configuration loaded"
    );

    let transport = HttpTransport::new(&config.client).context("Failed to create HTTP client")?;
    let api: Arc<dyn PulseApi> = Arc::new(ApiClient::new(transport));

    match args.command {
        Command::Watch { .. } => watch(api, &config, args.json).await?,
        Command::Mood => {
            let mood = api.current_mood().await.context("Failed to fetch current mood")?;
            if args.json {
                print_json(&mood)?;
            } else {
                println!("{}", render::mood(&mood));
            }
        }
        Command::History { .. } => {
            let history = api
                .pulse_history(config.monitor.history_days)
                .await
                .context("Failed to fetch pulse history")?;
            if args.json {
                print_json(&history)?;
            } else {
                println!("{}", render::history(&history, 10));
            }
        }
        Command::Chat { ref message } => {
            let mut session = ChatSession::new(api, config.chat_retry);
            match session.send(&message.join(" ")).await? {
                ChatReply::Answered(exchange) => {
                    if args.json {
                        print_json(&exchange)?;
                    } else {
                        println!("{}", render::chat(&exchange));
                    }
                }
                ChatReply::Fallback { error } => {
                    warn!(error = %error, "Assistant unavailable");
                    if let Some(last) = session.last() {
                        println!("{}", last.content);
                    }
                }
            }
        }
        Command::Health => {
            let health = api.health_check().await.context("Health check failed")?;
            if args.json {
                print_json(&health)?;
            } else {
                println!("{}", render::health(&health));
            }
            if !health.is_healthy() {
                anyhow::bail!("service reports {}", health.status);
            }
        }
    }

    Ok(())
}
