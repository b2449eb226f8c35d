use crate::store::{TraceEvent, TraceMetrics, TraceStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub fn record_trace(
    step_id: &str,
    status: TraceStatus,
    input: Option<Value>,
    output: Option<Value>,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> TraceEvent {
    let latency_ms = ended_at
        .signed_duration_since(started_at)
        .num_milliseconds()
        .max(0) as u64;
    let cost_usd = match status {
        TraceStatus::Completed => Some(0.0),
        TraceStatus::Failed => None,
    };
    TraceEvent {
        step_id: step_id.to_string(),
        status,
        input,
        output,
        metrics: Some(TraceMetrics {
            latency_ms: Some(latency_ms),
            cost_usd,
        }),
        timestamp: ended_at,
    }
}
