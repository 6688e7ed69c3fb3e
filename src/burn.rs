//! # Burn Rate
//!
//! Token and cost flux over the trailing 60 minutes, allocated to each block
//! proportionally to how much of its lifetime overlaps that window.

use chrono::{DateTime, Duration, Utc};

use crate::models::{BurnRate, SessionBlock};
use crate::utils::minutes_between;

/// Compute the rolling burn rate at `now` over the full block list.
///
/// Each non-gap block contributes `value * d / D`, where `D` is the block's
/// lifetime (start to its last activity, or to `now` while active) and `d`
/// is the part of that lifetime inside `[now - 1h, now]`. Returns `None`
/// when no tokens land in the window.
pub fn calculate_burn_rate(blocks: &[SessionBlock], now: DateTime<Utc>) -> Option<BurnRate> {
    let hour_ago = now - Duration::hours(1);
    let mut tokens_in_hour = 0.0f64;
    let mut cost_in_hour = 0.0f64;

    for block in blocks {
        if block.is_gap {
            continue;
        }
        let seg_end = if block.is_active {
            now
        } else {
            block.actual_end_or_end()
        };
        if seg_end <= hour_ago || block.start >= now {
            continue;
        }

        let a = block.start.max(hour_ago);
        let b = seg_end.min(now);
        let lifetime = minutes_between(block.start, seg_end);
        let overlap = minutes_between(a, b);
        if lifetime <= 0.0 || overlap <= 0.0 {
            continue;
        }

        let fraction = overlap / lifetime;
        tokens_in_hour += block.tokens.total() as f64 * fraction;
        cost_in_hour += block.cost * fraction;
    }

    if tokens_in_hour == 0.0 {
        return None;
    }
    Some(BurnRate {
        tokens_per_minute: tokens_in_hour / 60.0,
        cost_per_hour: cost_in_hour,
        computed_at: now,
    })
}
