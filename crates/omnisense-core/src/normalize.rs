// ── Snapshot normalization ──
//
// The single boundary where wire absence is resolved. Input is whatever
// JSON the backend pushed; output is a fully populated `DashboardState`.
// Never fails: every missing or malformed field falls back to a neutral
// default and the rest of the snapshot is kept.

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{
    AI_AGENT_SENTINEL, Assignment, CallId, CallSnapshot, CallStatus, Caller, DashboardState,
    LOCATION_UNKNOWN, Location, SUMMARY_IN_PROGRESS, SeverityLevel, Stats, TranscriptEntry,
};

/// Emergency type used when the backend has not classified a call yet.
pub const UNKNOWN_EMERGENCY_TYPE: &str = "unknown";

/// Phone number shown when the caller's number is missing.
pub const UNKNOWN_PHONE: &str = "Unknown";

/// Normalize a raw snapshot payload.
pub fn normalize(raw: &Value) -> DashboardState {
    let Some(root) = raw.as_object() else {
        debug!(kind = json_kind(raw), "snapshot root is not an object, using empty state");
        return DashboardState::default();
    };

    let active_calls = call_list(root, "active_calls", &[]);
    let queue = call_list(root, "queue", &active_calls);
    let completed_calls = call_list(root, "completed_calls", &[]);

    DashboardState {
        stats: stats(root.get("stats")),
        queue,
        active_calls,
        completed_calls,
        patterns: patterns(root.get("patterns")),
    }
}

/// Normalize one call object. `fallback_id` is used when `id` is absent.
pub fn normalize_call(raw: &Map<String, Value>, fallback_id: &str) -> CallSnapshot {
    let id = match raw.get("id").and_then(scalar_string) {
        Some(id) => CallId::new(id),
        None => {
            debug!(fallback_id, "call without id, assigning positional id");
            CallId::new(fallback_id)
        }
    };

    let archived = raw.get("archived").is_some_and(truthy);
    let mut status = raw
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| CallStatus::from_str(s.trim()).ok())
        .unwrap_or(CallStatus::Queued);
    if archived && !status.is_terminal() {
        debug!(call_id = %id, %status, "archived call with live status, treating as completed");
        status = CallStatus::Completed;
    }

    CallSnapshot {
        call_number: raw.get("call_number").and_then(non_negative),
        emergency_type: raw
            .get("emergency_type")
            .and_then(non_blank)
            .unwrap_or(UNKNOWN_EMERGENCY_TYPE)
            .to_owned(),
        severity_score: raw.get("severity_score").map_or(0, score),
        severity_level: raw
            .get("severity_level")
            .and_then(Value::as_str)
            .and_then(|s| SeverityLevel::from_str(s.trim()).ok())
            .unwrap_or_default(),
        status,
        assigned_to: assignment(raw.get("assigned_to")),
        archived,
        caller: caller(raw.get("caller")),
        location: location(raw.get("location")),
        transcript: transcript(raw.get("transcript")),
        summary: raw
            .get("summary")
            .and_then(non_blank)
            .unwrap_or(SUMMARY_IN_PROGRESS)
            .to_owned(),
        id,
    }
}

// ── Lists ────────────────────────────────────────────────────────────

/// Normalize the call list under `key`.
///
/// Entries may also be bare call ids (the backend's queue is a list of
/// ids); those are resolved against `known` and skipped when unknown.
fn call_list(root: &Map<String, Value>, key: &str, known: &[CallSnapshot]) -> Vec<CallSnapshot> {
    let Some(entries) = root.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            Value::Object(call) => Some(normalize_call(call, &format!("{key}-{index}"))),
            Value::String(id) => {
                let found = known.iter().find(|c| c.id.as_str() == id).cloned();
                if found.is_none() {
                    debug!(list = key, call_id = %id, "unresolved call reference skipped");
                }
                found
            }
            other => {
                debug!(list = key, index, kind = json_kind(other), "non-object call entry skipped");
                None
            }
        })
        .collect()
}

fn stats(raw: Option<&Value>) -> Stats {
    let Some(stats) = raw.and_then(Value::as_object) else {
        return Stats::default();
    };
    let count = |key: &str| stats.get(key).and_then(non_negative).unwrap_or(0);
    Stats {
        total_active: count("total_active"),
        queued: count("queued"),
        completed: count("completed"),
    }
}

fn patterns(raw: Option<&Value>) -> Vec<String> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(non_blank)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ── Call fields ──────────────────────────────────────────────────────

fn assignment(raw: Option<&Value>) -> Assignment {
    match raw.and_then(scalar_string) {
        Some(op) if !op.eq_ignore_ascii_case(AI_AGENT_SENTINEL) => Assignment::Operator(op),
        _ => Assignment::AiAgent,
    }
}

fn caller(raw: Option<&Value>) -> Caller {
    let obj = raw.and_then(Value::as_object);
    let field = |key: &str| obj.and_then(|o| o.get(key)).and_then(non_blank);
    Caller {
        phone_number: field("phone_number").unwrap_or(UNKNOWN_PHONE).to_owned(),
        name: field("name").map(str::to_owned),
    }
}

fn location(raw: Option<&Value>) -> Location {
    let address = match raw {
        Some(Value::Object(loc)) => loc.get("address").and_then(non_blank),
        Some(other) => non_blank(other),
        None => None,
    };
    Location {
        address: address.unwrap_or(LOCATION_UNKNOWN).to_owned(),
    }
}

fn transcript(raw: Option<&Value>) -> Vec<TranscriptEntry> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(e) => Some(TranscriptEntry {
                text: e.get("text").and_then(non_blank)?.to_owned(),
                timestamp: e.get("timestamp").and_then(scalar_string),
                role: e.get("role").and_then(non_blank).map(str::to_owned),
            }),
            Value::String(text) if !text.trim().is_empty() => Some(TranscriptEntry {
                text: text.clone(),
                timestamp: None,
                role: None,
            }),
            _ => None,
        })
        .collect()
}

/// Clamp a score into `0..=100`. Non-numeric input scores 0.
fn score(raw: &Value) -> u8 {
    let value = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(round_to_i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, round_to_i64),
        _ => 0,
    };
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn round_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        0
    } else {
        // Saturating: out-of-range floats become i64::MIN / i64::MAX.
        value.round() as i64
    }
}

// ── Scalar helpers ───────────────────────────────────────────────────

fn non_blank(raw: &Value) -> Option<&str> {
    raw.as_str().filter(|s| !s.trim().is_empty())
}

fn non_negative(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A string or number rendered as a string. Blank strings count as absent.
fn scalar_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_u64().is_some_and(|v| v != 0),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn non_object_root_is_empty_state() {
        assert_eq!(normalize(&json!([1, 2, 3])), DashboardState::default());
        assert_eq!(normalize(&json!("hello")), DashboardState::default());
        assert_eq!(normalize(&Value::Null), DashboardState::default());
    }

    #[test]
    fn missing_sections_default_to_zero_and_empty() {
        let state = normalize(&json!({
            "active_calls": [{ "id": "c1", "severity_score": 70, "status": "ACTIVE" }]
        }));
        assert_eq!(state.stats, Stats::default());
        assert!(state.queue.is_empty());
        assert!(state.completed_calls.is_empty());
        assert!(state.patterns.is_empty());

        let call = &state.active_calls[0];
        assert_eq!(call.location.address, LOCATION_UNKNOWN);
        assert_eq!(call.summary, SUMMARY_IN_PROGRESS);
        assert!(call.transcript.is_empty());
        assert_eq!(call.caller.phone_number, UNKNOWN_PHONE);
        assert_eq!(call.emergency_type, UNKNOWN_EMERGENCY_TYPE);
        assert_eq!(call.assigned_to, Assignment::AiAgent);
        assert_eq!(call.severity_level, SeverityLevel::Medium);
    }

    #[test]
    fn stats_are_read_when_present() {
        let state = normalize(&json!({
            "stats": { "total_active": 4, "queued": "2", "completed": -1 }
        }));
        assert_eq!(
            state.stats,
            Stats {
                total_active: 4,
                queued: 2,
                completed: 0,
            }
        );
    }

    #[test]
    fn score_is_clamped() {
        let state = normalize(&json!({
            "active_calls": [
                { "id": "hi", "severity_score": 140 },
                { "id": "lo", "severity_score": -5 },
                { "id": "fl", "severity_score": 79.6 },
                { "id": "junk", "severity_score": {"x": 1} },
            ]
        }));
        let scores: Vec<u8> = state.active_calls.iter().map(|c| c.severity_score).collect();
        assert_eq!(scores, vec![100, 0, 80, 0]);
    }

    #[test]
    fn non_sequence_transcript_is_empty() {
        let state = normalize(&json!({
            "active_calls": [
                { "id": "a", "transcript": "not a list" },
                { "id": "b", "transcript": [
                    { "text": "help", "timestamp": "2024-01-01T00:00:00", "role": "caller" },
                    { "timestamp": "no text" },
                    "plain line",
                ] },
            ]
        }));
        assert!(state.active_calls[0].transcript.is_empty());
        let texts: Vec<&str> = state.active_calls[1]
            .transcript
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["help", "plain line"]);
        assert_eq!(
            state.active_calls[1].transcript[0].role.as_deref(),
            Some("caller")
        );
    }

    #[test]
    fn blank_address_uses_placeholder() {
        let state = normalize(&json!({
            "active_calls": [
                { "id": "a", "location": { "address": "   " } },
                { "id": "b", "location": { "address": "12 Main St" } },
                { "id": "c", "location": null },
            ]
        }));
        let addresses: Vec<&str> = state
            .active_calls
            .iter()
            .map(|c| c.location.address.as_str())
            .collect();
        assert_eq!(addresses, vec![LOCATION_UNKNOWN, "12 Main St", LOCATION_UNKNOWN]);
    }

    #[test]
    fn assignment_sentinels() {
        let state = normalize(&json!({
            "active_calls": [
                { "id": "a", "assigned_to": null },
                { "id": "b", "assigned_to": "AI_AGENT" },
                { "id": "c", "assigned_to": "" },
                { "id": "d", "assigned_to": "OP7" },
                { "id": "e", "assigned_to": 12 },
            ]
        }));
        let assigned: Vec<Assignment> = state
            .active_calls
            .iter()
            .map(|c| c.assigned_to.clone())
            .collect();
        assert_eq!(
            assigned,
            vec![
                Assignment::AiAgent,
                Assignment::AiAgent,
                Assignment::AiAgent,
                Assignment::Operator("OP7".into()),
                Assignment::Operator("12".into()),
            ]
        );
    }

    #[test]
    fn status_mapping_and_archived_coercion() {
        let state = normalize(&json!({
            "active_calls": [
                { "id": "a", "status": "IN_PROGRESS" },
                { "id": "b", "status": "bogus" },
                { "id": "c", "status": "ACTIVE", "archived": true },
                { "id": "d", "status": "DROPPED", "archived": true },
            ]
        }));
        let statuses: Vec<CallStatus> = state.active_calls.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                CallStatus::Active,
                CallStatus::Queued,
                CallStatus::Completed,
                CallStatus::Dropped,
            ]
        );
    }

    #[test]
    fn missing_id_gets_positional_id() {
        let state = normalize(&json!({
            "completed_calls": [{ "id": "x" }, { "severity_score": 10 }]
        }));
        assert_eq!(state.completed_calls[1].id.as_str(), "completed_calls-1");
    }

    #[test]
    fn queue_id_references_resolve_against_active_calls() {
        let state = normalize(&json!({
            "active_calls": [{ "id": "c1", "severity_score": 60 }],
            "queue": ["c1", "ghost", 42, { "id": "q2" }],
        }));
        let ids: Vec<&str> = state.queue.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "q2"]);
        assert_eq!(state.queue[0].severity_score, 60);
    }

    #[test]
    fn patterns_keep_strings_in_order() {
        let state = normalize(&json!({
            "patterns": ["MASS EVENT DETECTED: 3 calls reporting fire in Downtown", 7, "", "second"]
        }));
        assert_eq!(
            state.patterns,
            vec![
                "MASS EVENT DETECTED: 3 calls reporting fire in Downtown".to_owned(),
                "second".to_owned(),
            ]
        );
    }

    #[test]
    fn caller_name_and_call_number() {
        let state = normalize(&json!({
            "active_calls": [{
                "id": "a",
                "call_number": 17,
                "caller": { "name": "Dana", "phone_number": "555-1" }
            }]
        }));
        let call = &state.active_calls[0];
        assert_eq!(call.call_number, Some(17));
        assert_eq!(call.caller.name.as_deref(), Some("Dana"));
        assert_eq!(call.caller.phone_number, "555-1");
    }
}
