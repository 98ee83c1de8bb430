//! Domain Models
//!
//! Strongly-shaped entities returned by the GaiaPulse API. Values of these
//! types only ever come out of the schema validator, so their invariants
//! (ranges, enum membership, `total_points` consistency) hold by
//! construction. They are replaced wholesale on every fetch and never
//! mutated in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coarse categorical summary of Earth's environmental indicators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Nothing notable either way
    Neutral,
    /// Indicators trending badly
    Stressed,
    /// Indicators past alarm thresholds
    Critical,
    /// Indicators improving
    Healing,
}

impl Mood {
    /// Every accepted wire tag, in declaration order
    pub const TAGS: [&'static str; 4] = ["neutral", "stressed", "critical", "healing"];

    /// Parse a wire tag; anything outside [`Mood::TAGS`] is rejected
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "neutral" => Some(Self::Neutral),
            "stressed" => Some(Self::Stressed),
            "critical" => Some(Self::Critical),
            "healing" => Some(Self::Healing),
            _ => None,
        }
    }

    /// Wire tag for this mood
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Stressed => "stressed",
            Self::Critical => "critical",
            Self::Healing => "healing",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Current mood as computed by the remote service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodSnapshot {
    /// Mood category
    pub mood: Mood,
    /// Overall score in [0, 1]
    pub score: f64,
    /// When the mood was computed (ISO-8601)
    pub timestamp: String,
    /// Forward-looking statement generated by the service
    pub predictive_statement: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Factors that drove the mood, most significant first
    pub factors: Vec<String>,
    /// Trend direction ("improving", "declining", "stable", ...)
    pub trend: String,
    /// When the service expects to recompute (ISO-8601)
    pub next_update: String,
}

/// Origin of a single reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// NASA datasets
    Nasa,
    /// Weather services
    Weather,
    /// Air quality monitors
    AirQuality,
    /// Ocean buoys and surveys
    Ocean,
    /// Forest cover monitoring
    Forest,
    /// Satellite observation
    Satellite,
    /// Ground sensors
    Sensor,
    /// Model output
    AiPrediction,
}

impl DataSource {
    /// Every accepted wire tag
    pub const TAGS: [&'static str; 8] = [
        "nasa",
        "weather",
        "air_quality",
        "ocean",
        "forest",
        "satellite",
        "sensor",
        "ai_prediction",
    ];

    /// Parse a wire tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "nasa" => Some(Self::Nasa),
            "weather" => Some(Self::Weather),
            "air_quality" => Some(Self::AirQuality),
            "ocean" => Some(Self::Ocean),
            "forest" => Some(Self::Forest),
            "satellite" => Some(Self::Satellite),
            "sensor" => Some(Self::Sensor),
            "ai_prediction" => Some(Self::AiPrediction),
            _ => None,
        }
    }

    /// Wire tag for this source
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Nasa => "nasa",
            Self::Weather => "weather",
            Self::AirQuality => "air_quality",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Satellite => "satellite",
            Self::Sensor => "sensor",
            Self::AiPrediction => "ai_prediction",
        }
    }
}

/// Scalar metadata value attached to a reading
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// JSON null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Numeric value
    Number(serde_json::Number),
    /// Free text
    Text(String),
}

/// One reading in a pulse history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// When the reading was taken (ISO-8601)
    pub timestamp: String,
    /// Reading value
    pub value: f64,
    /// Unit of `value`
    pub unit: String,
    /// Where the reading came from
    pub source: DataSource,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Extra scalar annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, MetadataValue>>,
}

/// Time series of readings for charting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PulseHistory {
    /// Readings in ascending timestamp order
    #[serde(rename = "data")]
    pub points: Vec<DataPoint>,
    /// Covered period ("7d", "30d", ...)
    pub period: String,
    /// Aggregation method ("hourly", ...)
    pub aggregation: String,
    /// Always equal to `points.len()`
    pub total_points: u64,
}

impl PulseHistory {
    /// Most recent reading, if any
    #[must_use]
    pub fn latest(&self) -> Option<&DataPoint> {
        self.points.last()
    }

    /// Summary statistics over the readings
    #[must_use]
    pub fn summary(&self) -> Option<HistorySummary> {
        let first = self.points.first()?;
        let mut min = first.value;
        let mut max = first.value;
        let mut sum = 0.0;
        for point in &self.points {
            min = min.min(point.value);
            max = max.max(point.value);
            sum += point.value;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.points.len() as f64;
        let latest = self.points.last().map_or(first.value, |p| p.value);

        Some(HistorySummary {
            min,
            max,
            mean,
            latest,
            change: latest - first.value,
        })
    }
}

/// Aggregate view of a pulse history
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistorySummary {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Most recent value
    pub latest: f64,
    /// Latest minus earliest
    pub change: f64,
}

/// Most suggestions a surface should show at once
pub const MAX_VISIBLE_SUGGESTIONS: usize = 3;

/// Assistant reply to a chat message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    /// Reply text
    pub response: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Data sources the reply drew on
    pub sources: Vec<String>,
    /// Follow-up prompts
    pub suggestions: Vec<String>,
    /// When the reply was generated (ISO-8601)
    pub timestamp: String,
}

impl ChatExchange {
    /// Suggestions a surface should display
    #[must_use]
    pub fn visible_suggestions(&self) -> &[String] {
        let n = self.suggestions.len().min(MAX_VISIBLE_SUGGESTIONS);
        &self.suggestions[..n]
    }
}

/// Context tag sent with every chat message
pub const CHAT_CONTEXT: &str = "environmental_monitoring";

/// Body of a chat POST
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message
    pub message: String,
    /// Fixed context tag
    pub context: String,
    /// Client send time (RFC 3339, UTC)
    pub timestamp: String,
}

impl ChatRequest {
    /// Build a request stamped with the current time
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: CHAT_CONTEXT.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Service health as reported by `/api/v1/health`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status ("healthy", ...)
    pub status: String,
    /// Check time, as sent by the server
    pub timestamp: String,
    /// API version
    pub version: String,
    /// Uptime in seconds
    pub uptime: f64,
    /// Status of each dependent service
    pub services: BTreeMap<String, String>,
}

impl HealthStatus {
    /// Whether the service and all of its dependencies report healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.services.values().all(|s| s == "healthy")
    }
}
