//! # Record Extraction
//!
//! Turns one raw log line into a normalized [`UsageRecord`].
//!
//! The source logs drift between field spellings (snake_case, camelCase,
//! OpenAI-style names), and token usage may live under `message.usage`, a
//! top-level `usage` object, or directly on the record. The probe lists below
//! encode the precedence as data; the first source whose input-or-output
//! probe yields a positive count wins all four slots.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{MonitorError, Result};
use crate::models::{TokenVector, UsageRecord};

const INPUT_KEYS: &[&str] = &["input_tokens", "inputTokens", "prompt_tokens"];
const OUTPUT_KEYS: &[&str] = &["output_tokens", "outputTokens", "completion_tokens"];
const CACHE_CREATE_KEYS: &[&str] = &[
    "cache_creation_tokens",
    "cache_creation_input_tokens",
    "cacheCreationInputTokens",
];
const CACHE_READ_KEYS: &[&str] = &[
    "cache_read_input_tokens",
    "cache_read_tokens",
    "cacheReadInputTokens",
];
const REQUEST_ID_KEYS: &[&str] = &["request_id", "requestId", "uuid"];

/// Outcome of probing one log line.
#[derive(Debug, PartialEq)]
pub enum Extracted {
    /// A usable usage record.
    Record(UsageRecord),
    /// Not an assistant usage line; ignored without comment.
    NotUsage,
    /// Usage-shaped, but rejected: zero tokens everywhere or an unparseable
    /// timestamp.
    Dropped,
}

/// Probe one slot: the first key present with a numeric value wins.
fn probe_slot(source: &Value, keys: &[&'static str]) -> Result<u64> {
    for &key in keys {
        let Some(val) = source.get(key) else {
            continue;
        };
        if let Some(n) = val.as_u64() {
            return Ok(n);
        }
        if let Some(n) = val.as_i64() {
            // as_u64 failed, so this is negative
            return Err(MonitorError::NegativeTokens {
                field: key,
                value: n,
            });
        }
    }
    Ok(0)
}

fn probe_tokens(source: &Value) -> Result<TokenVector> {
    Ok(TokenVector::new(
        probe_slot(source, INPUT_KEYS)?,
        probe_slot(source, OUTPUT_KEYS)?,
        probe_slot(source, CACHE_CREATE_KEYS)?,
        probe_slot(source, CACHE_READ_KEYS)?,
    ))
}

/// Parse the timestamp forms the logs are known to carry, normalizing to UTC:
/// RFC 3339 (trailing `Z` or explicit offset), bare ISO date-times treated as
/// UTC, integer epoch seconds (<= 10^12) and epoch milliseconds (> 10^12).
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    if let Some(s) = v.as_str() {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.and_utc());
            }
        }
        return None;
    }
    if let Some(n) = v.as_i64() {
        return if n <= 1_000_000_000_000 {
            DateTime::from_timestamp(n, 0)
        } else {
            DateTime::from_timestamp_millis(n)
        };
    }
    None
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|s| s.as_str()).map(|s| s.to_string())
}

/// Extract a usage record from one parsed log line.
pub fn extract_value(v: &Value) -> Result<Extracted> {
    if v.get("type").and_then(|t| t.as_str()) != Some("assistant") {
        return Ok(Extracted::NotUsage);
    }
    let message = v.get("message");
    let message_usage = message.and_then(|m| m.get("usage")).filter(|u| u.is_object());
    let top_usage = v.get("usage").filter(|u| u.is_object());
    if message_usage.is_none() && top_usage.is_none() {
        return Ok(Extracted::NotUsage);
    }

    // Fixed source precedence: message.usage, then usage, then the record
    // itself.
    let mut probed: Vec<TokenVector> = Vec::with_capacity(3);
    for source in [message_usage, top_usage, Some(v)].into_iter().flatten() {
        probed.push(probe_tokens(source)?);
    }
    let tokens = probed
        .iter()
        .copied()
        .find(|t| t.input > 0 || t.output > 0)
        .or_else(|| probed.iter().copied().find(|t| !t.is_zero()));
    let Some(tokens) = tokens else {
        return Ok(Extracted::Dropped);
    };

    let Some(timestamp) = v
        .get("timestamp")
        .or_else(|| message.and_then(|m| m.get("timestamp")))
        .and_then(parse_timestamp)
    else {
        return Ok(Extracted::Dropped);
    };

    let model = message
        .and_then(|m| str_field(m, "model"))
        .or_else(|| str_field(v, "model"))
        .map(|m| m.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let message_id = message.and_then(|m| str_field(m, "id"));
    let request_id = REQUEST_ID_KEYS.iter().find_map(|&k| str_field(v, k));

    Ok(Extracted::Record(UsageRecord {
        timestamp,
        model,
        tokens,
        message_id,
        request_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(v: Value) -> UsageRecord {
        match extract_value(&v).unwrap() {
            Extracted::Record(r) => r,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_assistant_line() {
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:37:25Z",
            "requestId": "r1",
            "message": {
                "id": "m1",
                "model": "claude-3-5-sonnet",
                "usage": {
                    "input_tokens": 1000,
                    "output_tokens": 500,
                    "cache_creation_input_tokens": 200,
                    "cache_read_input_tokens": 100
                }
            }
        }));
        assert_eq!(rec.tokens, TokenVector::new(1000, 500, 200, 100));
        assert_eq!(rec.model, "claude-3-5-sonnet");
        assert_eq!(rec.identity().as_deref(), Some("m1:r1"));
        assert_eq!(
            rec.timestamp,
            Utc.with_ymd_and_hms(2024, 9, 11, 14, 37, 25).unwrap()
        );
    }

    #[test]
    fn test_camel_case_and_openai_spellings() {
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "usage": {
                "inputTokens": 10,
                "completion_tokens": 20,
                "cacheCreationInputTokens": 30,
                "cacheReadInputTokens": 40
            }
        }));
        assert_eq!(rec.tokens, TokenVector::new(10, 20, 30, 40));
        assert_eq!(rec.model, "unknown");
    }

    #[test]
    fn test_source_precedence_message_usage_wins() {
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "message": { "usage": { "input_tokens": 5, "output_tokens": 1 } },
            "usage": { "input_tokens": 9999, "output_tokens": 9999 }
        }));
        assert_eq!(rec.tokens.input, 5);
    }

    #[test]
    fn test_zero_usage_source_falls_through() {
        // message.usage exists but is all-zero in input/output; the top-level
        // usage object carries the real counts.
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "message": { "usage": { "input_tokens": 0, "output_tokens": 0 } },
            "usage": { "input_tokens": 7, "output_tokens": 3 }
        }));
        assert_eq!(rec.tokens, TokenVector::new(7, 3, 0, 0));
    }

    #[test]
    fn test_cache_only_record_kept() {
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "message": { "usage": { "cache_read_input_tokens": 512 } }
        }));
        assert_eq!(rec.tokens, TokenVector::new(0, 0, 0, 512));
    }

    #[test]
    fn test_all_zero_rejected() {
        let out = extract_value(&json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "message": { "usage": { "input_tokens": 0, "output_tokens": 0 } }
        }))
        .unwrap();
        assert_eq!(out, Extracted::Dropped);
    }

    #[test]
    fn test_non_assistant_ignored() {
        let out = extract_value(&json!({
            "type": "user",
            "usage": { "input_tokens": 10 }
        }))
        .unwrap();
        assert_eq!(out, Extracted::NotUsage);

        let out = extract_value(&json!({
            "type": "assistant",
            "message": { "content": [] }
        }))
        .unwrap();
        assert_eq!(out, Extracted::NotUsage);
    }

    #[test]
    fn test_bad_timestamp_drops_record() {
        let out = extract_value(&json!({
            "type": "assistant",
            "timestamp": "not-a-date",
            "usage": { "input_tokens": 10 }
        }))
        .unwrap();
        assert_eq!(out, Extracted::Dropped);

        let out = extract_value(&json!({
            "type": "assistant",
            "usage": { "input_tokens": 10 }
        }))
        .unwrap();
        assert_eq!(out, Extracted::Dropped);
    }

    #[test]
    fn test_epoch_timestamp_forms() {
        let secs = parse_timestamp(&json!(1_726_065_445)).unwrap();
        assert_eq!(secs, Utc.with_ymd_and_hms(2024, 9, 11, 14, 37, 25).unwrap());

        let millis = parse_timestamp(&json!(1_726_065_445_000i64)).unwrap();
        assert_eq!(millis, secs);

        let offset = parse_timestamp(&json!("2024-09-11T16:37:25+02:00")).unwrap();
        assert_eq!(offset, secs);

        let bare = parse_timestamp(&json!("2024-09-11T14:37:25.500")).unwrap();
        assert_eq!(bare.timestamp_millis(), secs.timestamp_millis() + 500);
    }

    #[test]
    fn test_negative_tokens_error() {
        let err = extract_value(&json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "usage": { "input_tokens": -5 }
        }))
        .unwrap_err();
        match err {
            MonitorError::NegativeTokens { field, value } => {
                assert_eq!(field, "input_tokens");
                assert_eq!(value, -5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_request_id_probe_order() {
        let rec = record(json!({
            "type": "assistant",
            "timestamp": "2024-09-11T14:00:00Z",
            "uuid": "u1",
            "requestId": "r1",
            "message": { "id": "m1", "usage": { "input_tokens": 1 } }
        }));
        // request_id spelling missing; requestId outranks uuid
        assert_eq!(rec.request_id.as_deref(), Some("r1"));
    }
}
