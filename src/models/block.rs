use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Add;

use crate::models::TokenVector;
use crate::utils::{minutes_between, round_micro_usd};

/// Per-model accumulation inside one block or one aggregated snapshot.
///
/// Percentages are `None` while the stats are still being accumulated and
/// are filled in against the owning aggregate's totals when it closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub tokens: TokenVector,
    pub cost: f64,
    pub entries: u64,
    pub pct_by_cost: Option<f64>,
    pub pct_by_tokens: Option<f64>,
}

impl ModelStats {
    pub fn record(&mut self, tokens: TokenVector, cost: f64) {
        self.tokens += tokens;
        self.cost += cost;
        self.entries += 1;
        self.pct_by_cost = None;
        self.pct_by_tokens = None;
    }

    /// Recompute both percentages against aggregate totals. The token
    /// denominator is usage tokens (input + output), not the cache-inclusive
    /// total.
    pub fn finalize(&mut self, total_cost: f64, total_usage_tokens: u64) {
        self.pct_by_cost = if total_cost > 0.0 {
            Some((self.cost / total_cost) * 100.0)
        } else {
            None
        };
        self.pct_by_tokens = if total_usage_tokens > 0 {
            Some((self.tokens.usage() as f64 / total_usage_tokens as f64) * 100.0)
        } else {
            None
        };
    }
}

impl Add for ModelStats {
    type Output = ModelStats;

    // Percentages are denominator-relative, so a sum carries none until the
    // new aggregate is finalized.
    fn add(self, rhs: ModelStats) -> ModelStats {
        ModelStats {
            tokens: self.tokens + rhs.tokens,
            cost: self.cost + rhs.cost,
            entries: self.entries + rhs.entries,
            pct_by_cost: None,
            pct_by_tokens: None,
        }
    }
}

/// A five-hour usage window aligned to the UTC hour, or a gap marker.
///
/// For real blocks `end` is always `start + session duration` regardless of
/// when the last record arrived; `actual_end` tracks the last record. Gap
/// blocks span the idle interval itself and carry no usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlock {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub actual_end: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_gap: bool,
    pub tokens: TokenVector,
    pub cost: f64,
    pub per_model_stats: HashMap<String, ModelStats>,
    pub message_ids: HashSet<String>,
    pub message_count: u64,
    /// Minutes from `start` to `actual_end` (for gaps, to `end`).
    pub duration_minutes: f64,
}

impl SessionBlock {
    /// Open a new block at an hour-aligned start.
    pub fn open(start: DateTime<Utc>, session_duration: Duration) -> Self {
        SessionBlock {
            id: start.to_rfc3339(),
            start,
            end: start + session_duration,
            actual_end: None,
            is_active: false,
            is_gap: false,
            tokens: TokenVector::default(),
            cost: 0.0,
            per_model_stats: HashMap::new(),
            message_ids: HashSet::new(),
            message_count: 0,
            duration_minutes: 0.0,
        }
    }

    /// Build a gap marker spanning the idle interval between the previous
    /// block's last record and the record that opened the next block.
    pub fn gap(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        SessionBlock {
            id: format!("gap-{}", start.to_rfc3339()),
            start,
            end,
            actual_end: None,
            is_active: false,
            is_gap: true,
            tokens: TokenVector::default(),
            cost: 0.0,
            per_model_stats: HashMap::new(),
            message_ids: HashSet::new(),
            message_count: 0,
            duration_minutes: minutes_between(start, end),
        }
    }

    /// Fold one record into the block.
    pub fn accumulate(
        &mut self,
        timestamp: DateTime<Utc>,
        model: &str,
        tokens: TokenVector,
        cost: f64,
        message_id: Option<&str>,
    ) {
        self.tokens += tokens;
        self.cost += cost;
        self.message_count += 1;
        if let Some(mid) = message_id {
            self.message_ids.insert(mid.to_string());
        }
        self.per_model_stats
            .entry(model.to_string())
            .or_default()
            .record(tokens, cost);
        self.actual_end = Some(timestamp);
        self.duration_minutes = minutes_between(self.start, timestamp);
    }

    /// Freeze the block: round cost to micro precision and fill in the
    /// per-model percentages against the block totals.
    pub fn close(&mut self) {
        self.cost = round_micro_usd(self.cost);
        let total_cost = self.cost;
        let total_usage = self.tokens.usage();
        for stats in self.per_model_stats.values_mut() {
            stats.cost = round_micro_usd(stats.cost);
            stats.finalize(total_cost, total_usage);
        }
    }

    /// End of the block's observed activity: `actual_end` when any record
    /// landed, the fixed `end` otherwise.
    pub fn actual_end_or_end(&self) -> DateTime<Utc> {
        self.actual_end.unwrap_or(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stats(input: u64, output: u64, cost: f64, entries: u64) -> ModelStats {
        ModelStats {
            tokens: TokenVector::new(input, output, 0, 0),
            cost,
            entries,
            pct_by_cost: None,
            pct_by_tokens: None,
        }
    }

    #[test]
    fn test_model_stats_addition_associative_commutative() {
        let a = stats(100, 50, 0.1, 1);
        let b = stats(200, 100, 0.2, 2);
        let c = stats(300, 150, 0.3, 3);

        let ab_c = (a.clone() + b.clone()) + c.clone();
        let a_bc = a.clone() + (b.clone() + c.clone());
        assert_eq!(ab_c, a_bc);

        assert_eq!(a.clone() + b.clone(), b + a);
    }

    #[test]
    fn test_finalize_uses_usage_token_denominator() {
        let mut s = ModelStats {
            tokens: TokenVector::new(300, 100, 5000, 5000),
            cost: 1.0,
            entries: 4,
            pct_by_cost: None,
            pct_by_tokens: None,
        };
        s.finalize(2.0, 800);
        assert_eq!(s.pct_by_cost, Some(50.0));
        // 400 usage tokens of 800, cache tokens ignored
        assert_eq!(s.pct_by_tokens, Some(50.0));
    }

    #[test]
    fn test_block_serde_round_trip() {
        let start = Utc.with_ymd_and_hms(2024, 9, 11, 14, 0, 0).unwrap();
        let mut block = SessionBlock::open(start, Duration::hours(5));
        block.accumulate(
            start + Duration::minutes(37),
            "claude-3-5-sonnet",
            TokenVector::new(1000, 500, 200, 100),
            0.01128,
            Some("m1"),
        );
        block.close();
        block.is_active = true;

        let json = serde_json::to_value(&block).unwrap();
        let back: SessionBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_gap_block_carries_no_usage() {
        let start = Utc.with_ymd_and_hms(2024, 9, 11, 14, 0, 0).unwrap();
        let gap = SessionBlock::gap(start, start + Duration::hours(6));
        assert!(gap.is_gap);
        assert!(gap.tokens.is_zero());
        assert_eq!(gap.cost, 0.0);
        assert_eq!(gap.message_count, 0);
        assert_eq!(gap.duration_minutes, 360.0);
    }
}
