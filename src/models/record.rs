use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TokenVector;

/// One normalized usage record extracted from a log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// UTC timestamp of the assistant message.
    pub timestamp: DateTime<Utc>,
    /// Model identifier as reported by the log, trimmed; `"unknown"` when absent.
    pub model: String,
    pub tokens: TokenVector,
    pub message_id: Option<String>,
    pub request_id: Option<String>,
}

impl UsageRecord {
    /// Global dedup key, present only when both halves of the identity pair
    /// are known.
    pub fn identity(&self) -> Option<String> {
        match (&self.message_id, &self.request_id) {
            (Some(m), Some(r)) => Some(format!("{m}:{r}")),
            _ => None,
        }
    }
}
