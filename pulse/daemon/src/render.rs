//! Plain-text rendering of monitor data for the terminal

use std::fmt::Write;

use pulse_core::animation::{self, MoodLook};
use pulse_core::{ChatExchange, HealthStatus, MoodSnapshot, PollSnapshot, PollState, PulseHistory};

/// Percentage with no decimals
fn percent(unit: f64) -> String {
    format!("{:.0}%", unit * 100.0)
}

/// One-paragraph summary of the current mood
pub fn mood(snapshot: &MoodSnapshot) -> String {
    let look = MoodLook::for_mood(snapshot.mood);
    let mut out = format!(
        "Earth is {} ({}) score {} confidence {} trend {}",
        animation::label(snapshot.mood),
        look.base_color,
        percent(snapshot.score),
        percent(snapshot.confidence),
        snapshot.trend,
    );
    let _ = write!(out, "\n  {}", snapshot.predictive_statement);
    if !snapshot.factors.is_empty() {
        let _ = write!(out, "\n  factors: {}", snapshot.factors.join(", "));
    }
    let _ = write!(out, "\n  as of {} (next update {})", snapshot.timestamp, snapshot.next_update);
    out
}

/// Summary line plus the most recent readings
pub fn history(history: &PulseHistory, tail: usize) -> String {
    let mut out = format!(
        "{} readings over {} ({})",
        history.total_points, history.period, history.aggregation
    );
    if let Some(summary) = history.summary() {
        let _ = write!(
            out,
            "\n  min {:.2} max {:.2} mean {:.2} latest {:.2} change {:+.2}",
            summary.min, summary.max, summary.mean, summary.latest, summary.change
        );
    }
    let skip = history.points.len().saturating_sub(tail);
    for point in &history.points[skip..] {
        let _ = write!(
            out,
            "\n  {} {:>10.2} {} ({})",
            point.timestamp,
            point.value,
            point.unit,
            point.source.as_tag(),
        );
    }
    out
}

/// Reply text followed by its sources and up to three suggestions
pub fn chat(exchange: &ChatExchange) -> String {
    let mut out = exchange.response.clone();
    if !exchange.sources.is_empty() {
        let _ = write!(out, "\n\nsources: {}", exchange.sources.join(", "));
    }
    for suggestion in exchange.visible_suggestions() {
        let _ = write!(out, "\n  > {suggestion}");
    }
    out
}

/// Service status with each dependency
pub fn health(health: &HealthStatus) -> String {
    let mut out = format!(
        "{} v{} up {:.0}s",
        health.status, health.version, health.uptime
    );
    for (name, status) in &health.services {
        let _ = write!(out, "\n  {name}: {status}");
    }
    out
}

/// Status line for a feed transition, `None` when nothing worth printing changed
pub fn feed_status<T>(feed: &str, snapshot: &PollSnapshot<T>) -> Option<String> {
    match snapshot.state {
        PollState::Degraded => {
            let error = snapshot.last_error.as_ref()?;
            let held = if snapshot.current.is_some() {
                "showing last known value"
            } else {
                "no data yet"
            };
            Some(format!(
                "[{feed}] degraded after {} failure(s): {} ({held})",
                snapshot.consecutive_failures, error.message
            ))
        }
        PollState::Idle | PollState::Fetching | PollState::Ready => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{DataPoint, DataSource, Mood, PollError};
    use std::sync::Arc;
    use std::time::Duration;

    fn point(value: f64) -> DataPoint {
        DataPoint {
            timestamp: "2025-06-01T00:00:00".into(),
            value,
            unit: "ppm".into(),
            source: DataSource::AirQuality,
            confidence: 0.9,
            metadata: None,
        }
    }

    #[test]
    fn test_mood_render() {
        let snapshot = MoodSnapshot {
            mood: Mood::Stressed,
            score: 0.456,
            timestamp: "2025-06-01T12:00:00".into(),
            predictive_statement: "Heatwaves likely".into(),
            confidence: 0.8,
            factors: vec!["temperature".into()],
            trend: "declining".into(),
            next_update: "2025-06-01T12:05:00".into(),
        };
        let text = mood(&snapshot);
        assert!(text.starts_with("Earth is Stressed (#ffcc00) score 46%"));
        assert!(text.contains("factors: temperature"));
    }

    #[test]
    fn test_history_render_tail() {
        let readings = PulseHistory {
            points: vec![point(1.0), point(2.0), point(4.0)],
            period: "7d".into(),
            aggregation: "hourly".into(),
            total_points: 3,
        };
        let text = history(&readings, 2);
        assert!(text.starts_with("3 readings over 7d (hourly)"));
        assert!(text.contains("change +3.00"));
        assert_eq!(text.matches("(air_quality)").count(), 2);
    }

    #[test]
    fn test_chat_render_caps_suggestions() {
        let exchange = ChatExchange {
            response: "Hi".into(),
            confidence: 0.9,
            sources: vec![],
            suggestions: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            timestamp: "2025-06-01T12:00:00Z".into(),
        };
        assert_eq!(chat(&exchange).matches("  > ").count(), 3);
    }

    #[test]
    fn test_feed_status_only_for_degraded() {
        let mut snapshot: PollSnapshot<u32> = PollSnapshot::idle(Duration::from_secs(10));
        assert!(feed_status("mood", &snapshot).is_none());

        snapshot.state = PollState::Degraded;
        snapshot.current = Some(Arc::new(1));
        snapshot.consecutive_failures = 3;
        snapshot.last_error = Some(PollError {
            kind: pulse_core::ErrorKind::Transport,
            message: "server returned HTTP 503".into(),
        });
        let line = feed_status("mood", &snapshot).unwrap();
        assert!(line.contains("3 failure(s)"));
        assert!(line.contains("showing last known value"));
    }
}
