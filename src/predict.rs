//! # Predictor
//!
//! Extrapolates the active block's spend rate against an adaptive cost
//! ceiling to predict when the limit would be reached, and reports the fixed
//! reset time of the current window.

use chrono::{DateTime, Duration, Utc};

use crate::models::SessionBlock;
use crate::utils::minutes_between;

fn active_block(blocks: &[SessionBlock]) -> Option<&SessionBlock> {
    blocks.iter().find(|b| b.is_active && !b.is_gap)
}

/// Fixed end of the current window: the active block's end, the most recent
/// block's start plus one session duration, or a synthetic value one session
/// ahead of `now` when no blocks exist.
pub fn reset_time(
    blocks: &[SessionBlock],
    session_duration: Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if let Some(active) = active_block(blocks) {
        return active.end;
    }
    if let Some(latest) = blocks.iter().rev().find(|b| !b.is_gap) {
        return latest.start + session_duration;
    }
    now + session_duration
}

/// Predicted exhaustion instant for the active block under `cost_limit`.
///
/// Returns `None` when there is no active block, no measurable spend rate,
/// the projection lands more than 24 h out, or the block resets before the
/// limit would be hit. An already-exceeded limit predicts `now`.
pub fn predict_exhaustion(
    blocks: &[SessionBlock],
    cost_limit: f64,
    session_duration: Duration,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let active = active_block(blocks)?;

    let elapsed = minutes_between(active.start, now);
    if elapsed <= 0.0 {
        return None;
    }
    let cost_per_minute = active.cost / elapsed;
    if cost_per_minute <= 0.0 {
        return None;
    }

    let remaining = cost_limit - active.cost;
    let predicted = if remaining <= 0.0 {
        now
    } else {
        // remaining / cost_per_minute, written to avoid the rounding noise
        // of dividing by a just-computed quotient
        let minutes_to_limit = (remaining * elapsed / active.cost).ceil() as i64;
        now + Duration::minutes(minutes_to_limit)
    };

    if predicted > now + Duration::hours(24) {
        return None;
    }
    let reset = reset_time(blocks, session_duration, now);
    if predicted < reset {
        Some(predicted)
    } else {
        None
    }
}
