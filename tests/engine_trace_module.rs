use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use traceflow::engine::record_trace;
use traceflow::store::TraceStatus;

#[test]
fn latency_is_the_wall_clock_delta_in_whole_milliseconds() {
    let started_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let ended_at = started_at + Duration::milliseconds(1_500);
    let event = record_trace(
        "research",
        TraceStatus::Completed,
        Some(json!({"instruction": "Research Rust"})),
        Some(json!({"result": "ok"})),
        started_at,
        ended_at,
    );
    assert_eq!(event.step_id, "research");
    assert_eq!(
        event.metrics.as_ref().and_then(|m| m.latency_ms),
        Some(1_500)
    );
    assert_eq!(event.timestamp, ended_at);
}

#[test]
fn sub_millisecond_durations_round_down() {
    let started_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let ended_at = started_at + Duration::microseconds(2_900);
    let event = record_trace("s", TraceStatus::Completed, None, None, started_at, ended_at);
    assert_eq!(event.metrics.as_ref().and_then(|m| m.latency_ms), Some(2));
}

#[test]
fn clock_skew_clamps_latency_at_zero() {
    let started_at = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    let ended_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let event = record_trace("s", TraceStatus::Failed, None, None, started_at, ended_at);
    assert_eq!(event.metrics.as_ref().and_then(|m| m.latency_ms), Some(0));
}

#[test]
fn cost_is_reported_for_completed_events_only() {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let completed = record_trace("s", TraceStatus::Completed, None, None, at, at);
    assert_eq!(
        completed.metrics.as_ref().and_then(|m| m.cost_usd),
        Some(0.0)
    );

    let failed = record_trace("s", TraceStatus::Failed, None, None, at, at);
    assert_eq!(failed.metrics.as_ref().and_then(|m| m.cost_usd), None);
    assert!(failed.metrics.as_ref().and_then(|m| m.latency_ms).is_some());
}
