use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ModelStats, SessionBlock, UsageRecord};

/// Token and cost flux over the last 60 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnRate {
    pub tokens_per_minute: f64,
    pub cost_per_hour: f64,
    pub computed_at: DateTime<Utc>,
}

/// Skip counters accumulated during one load pass, reported alongside the
/// metrics for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files_skipped: u64,
    pub lines_skipped: u64,
    pub duplicates_skipped: u64,
    pub records_dropped: u64,
}

/// One immutable snapshot returned by a `compute` call.
///
/// `None` fields mean "not applicable" (e.g. no active session, hence no
/// exhaustion prediction), never "error".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Summed cost of active blocks, rounded to display precision.
    pub cost_usage: f64,
    /// Summed input+output tokens of active blocks.
    pub token_usage: u64,
    /// Unique message ids across active blocks.
    pub messages_usage: u64,
    /// Whole minutes until the active block's fixed reset.
    pub time_to_reset_minutes: i64,
    /// Per-model stats summed over active blocks, percentages recomputed.
    pub model_distribution: HashMap<String, ModelStats>,
    /// Rolling 60-minute burn rate over the full block list.
    pub burn_rate: Option<BurnRate>,
    /// Summed hourly cost rate of active blocks.
    pub cost_rate: f64,
    /// Predicted exhaustion instant, when it falls before the reset.
    pub tokens_will_run_out: Option<DateTime<Utc>>,
    /// Fixed end of the active block, or a synthetic 5h-ahead value.
    pub limit_resets_at: DateTime<Utc>,
    pub p90_token_limit: f64,
    pub p90_cost_limit: f64,
    pub p90_message_limit: f64,
    /// Full ordered block list, gap markers included.
    pub blocks: Vec<SessionBlock>,
    /// All records that passed the window filter and dedup, sorted.
    pub records: Vec<UsageRecord>,
    pub load_stats: LoadStats,
}
