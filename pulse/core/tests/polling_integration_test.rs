//! End-to-end tests: real `ApiClient` and controllers over a scripted transport
//!
//! Time is paused, so backoff delays and poll intervals are exact.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use pulse_core::api::{CHAT_PATH, CURRENT_MOOD_PATH, PULSE_HISTORY_PATH};
use pulse_core::chat::FALLBACK_REPLY;
use pulse_core::{
    ApiClient, ChatReply, ChatRequest, ChatSession, ErrorKind, Mood, MoodFetcher, MoodSnapshot,
    PollConfig, PollState, PollingController, PulseApi, PulseError, RawResponse, Result,
    RetryPolicy, SchemaErrorKind, Transport,
};

// =============================================================================
// Scripted transport
// =============================================================================

/// One recorded request
#[derive(Clone, Debug)]
struct Recorded {
    method: &'static str,
    path: String,
    query: Vec<(String, String)>,
    at: Instant,
}

/// Replays responses in order, then repeats the fallback response
///
/// Clones share the script and the request log.
#[derive(Clone)]
struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<RawResponse>>>,
    fallback: RawResponse,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<RawResponse>, fallback: RawResponse) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, method: &'static str, path: &str, query: &[(&str, String)]) -> RawResponse {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            at: Instant::now(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse> {
        Ok(self.next("GET", path, query))
    }

    async fn post_json(&self, path: &str, _body: &ChatRequest) -> Result<RawResponse> {
        Ok(self.next("POST", path, &[]))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn envelope(data: Value) -> RawResponse {
    let body = json!({ "success": true, "data": data, "message": "ok" });
    RawResponse::new(200, serde_json::to_vec(&body).unwrap())
}

fn mood_ok(mood: &str) -> RawResponse {
    envelope(json!({
        "mood": mood,
        "score": 0.42,
        "timestamp": "2025-06-01T12:00:00.123456",
        "predictive_statement": "Ocean temperatures will keep rising",
        "confidence": 0.87,
        "factors": ["sea surface temperature", "CO2 levels"],
        "trend": "declining",
        "next_update": "2025-06-01T12:05:00",
    }))
}

fn unavailable() -> RawResponse {
    RawResponse::new(503, b"Service Unavailable".to_vec())
}

fn mood_controller(transport: &ScriptedTransport) -> PollingController<MoodSnapshot> {
    let api: Arc<dyn PulseApi> = Arc::new(ApiClient::new(transport.clone()));
    PollingController::new(Arc::new(MoodFetcher::new(api)), PollConfig::default())
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_fail_twice_then_succeed_reaches_ready() {
    let transport = ScriptedTransport::new(
        vec![unavailable(), unavailable(), mood_ok("critical")],
        unavailable(),
    );
    let mut controller = mood_controller(&transport);

    let started = Instant::now();
    controller.start();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.path == CURRENT_MOOD_PATH));
    assert_eq!(requests[0].at, started);
    assert_eq!(requests[1].at - requests[0].at, Duration::from_secs(1));
    assert_eq!(requests[2].at - requests[1].at, Duration::from_secs(2));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, PollState::Ready);
    assert_eq!(snapshot.current.unwrap().mood, Mood::Critical);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_keeps_previous_value() {
    let transport = ScriptedTransport::new(vec![mood_ok("healing")], unavailable());
    let mut controller = mood_controller(&transport);

    controller.start();
    settle().await;
    assert_eq!(controller.snapshot().state, PollState::Ready);

    // Tick at t=20s fails, retried at 21s and 23s, then gives up until 40s
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(transport.requests().len(), 4);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, PollState::Degraded);
    assert_eq!(snapshot.consecutive_failures, 3);
    assert_eq!(snapshot.current.unwrap().mood, Mood::Healing);

    let error = snapshot.last_error.unwrap();
    assert_eq!(error.kind, ErrorKind::Transport);
    assert!(error.message.contains("503"));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_view_suppresses_fetches() {
    let transport = ScriptedTransport::new(vec![], mood_ok("neutral"));
    let mut controller = mood_controller(&transport);

    controller.start();
    settle().await;
    assert_eq!(transport.requests().len(), 1);

    controller.set_visible(false);
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(transport.requests().len(), 1);

    controller.set_visible(true);
    tokio::time::sleep(Duration::from_secs(16)).await;
    settle().await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    // Resumed on the regular tick, not at the moment of becoming visible
    assert_eq!(requests[1].at - requests[0].at, Duration::from_secs(80));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_view_holds_backoff_retries() {
    let transport = ScriptedTransport::new(vec![], unavailable());
    let mut controller = mood_controller(&transport);

    controller.start();
    settle().await;
    assert_eq!(transport.requests().len(), 1);

    controller.set_visible(false);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.requests().len(), 1, "retried while hidden");
    assert_eq!(controller.snapshot().state, PollState::Degraded);

    controller.set_visible(true);
    settle().await;
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].at - requests[0].at, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_further_requests() {
    let transport = ScriptedTransport::new(vec![], mood_ok("stressed"));
    let mut controller = mood_controller(&transport);

    controller.start();
    settle().await;
    controller.stop();
    assert!(!controller.is_running());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(controller.snapshot().state, PollState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_schema_failure_is_not_retried() {
    let broken = envelope(json!({ "mood": "ecstatic" }));
    let transport = ScriptedTransport::new(vec![broken], mood_ok("neutral"));
    let config = PollConfig {
        retry: RetryPolicy::polling(),
        ..PollConfig::default()
    };
    let api: Arc<dyn PulseApi> = Arc::new(ApiClient::new(transport.clone()));
    let mut controller = PollingController::new(Arc::new(MoodFetcher::new(api)), config);

    controller.start();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(transport.requests().len(), 1);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, PollState::Degraded);
    assert!(snapshot.current.is_none());
    assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::SchemaValidation);
}

// =============================================================================
// API client
// =============================================================================

#[tokio::test]
async fn test_history_total_points_mismatch_rejected() {
    let point = json!({
        "timestamp": "2025-05-31T00:00:00",
        "value": 421.3,
        "unit": "ppm",
        "source": "nasa",
        "confidence": 0.9,
        "metadata": { "co2_levels": 421.3, "data_quality": "high" },
    });
    let body = envelope(json!({
        "data": [point.clone(), point],
        "period": "7d",
        "aggregation": "hourly",
        "total_points": 3,
    }));
    let transport = ScriptedTransport::new(vec![body], unavailable());
    let client = ApiClient::new(transport.clone());

    let err = assert_err!(client.pulse_history(7).await);
    let PulseError::SchemaValidation(schema) = &err else {
        panic!("expected schema error, got {err:?}");
    };
    assert_eq!(schema.field, "data.total_points");
    assert!(matches!(schema.kind, SchemaErrorKind::OutOfRange { .. }));

    let requests = transport.requests();
    assert_eq!(requests[0].path, PULSE_HISTORY_PATH);
    assert_eq!(requests[0].query, vec![("days".to_string(), "7".to_string())]);
}

#[tokio::test]
async fn test_invalid_arguments_never_reach_transport() {
    let transport = ScriptedTransport::new(vec![], unavailable());
    let client = ApiClient::new(transport.clone());

    assert_err!(client.pulse_history(0).await);
    assert_err!(client.pulse_history(-3).await);
    assert_err!(client.send_chat("").await);
    assert_err!(client.send_chat(" \t\n").await);
    assert!(transport.requests().is_empty());
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_chat_falls_back_after_retries() {
    let transport = ScriptedTransport::new(vec![], unavailable());
    let api: Arc<dyn PulseApi> = Arc::new(ApiClient::new(transport.clone()));
    let mut session = ChatSession::with_default_retry(api);

    let reply = assert_ok!(session.send("How are the oceans doing?").await);
    assert!(matches!(
        reply,
        ChatReply::Fallback {
            error: PulseError::Transport { status: 503 }
        }
    ));

    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests
        .iter()
        .all(|r| r.method == "POST" && r.path == CHAT_PATH));
    assert_eq!(session.last().unwrap().content, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_chat_answer_round_trip() {
    let answer = envelope(json!({
        "response": "Arctic sea ice is at a record low for June.",
        "confidence": 0.82,
        "sources": ["NSIDC"],
        "suggestions": ["Why does sea ice matter?", "What about Antarctica?"],
        "timestamp": "2025-06-01T12:00:01Z",
    }));
    let transport = ScriptedTransport::new(vec![answer], unavailable());
    let api: Arc<dyn PulseApi> = Arc::new(ApiClient::new(transport.clone()));
    let mut session = ChatSession::with_default_retry(api);

    let reply = assert_ok!(session.send("hi").await);
    let ChatReply::Answered(exchange) = reply else {
        panic!("expected an answer");
    };
    assert_eq!(exchange.sources, vec!["NSIDC".to_string()]);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(session.visible_suggestions().len(), 2);
}
