//! # Block Builder
//!
//! Groups time-ordered usage records into five-hour windows aligned to UTC
//! hour boundaries, with gap markers for idle stretches of at least one
//! session duration.

use chrono::{DateTime, Duration, Utc};

use crate::cost::CostCalculator;
use crate::error::Result;
use crate::models::{SessionBlock, UsageRecord};
use crate::utils::floor_to_hour;

/// Build the ordered block sequence from records sorted ascending by
/// timestamp.
///
/// A new block opens when a record lands on or past the current block's
/// fixed end, or at least one session duration after the previous record.
/// When the idle stretch between the closed block's last record and the new
/// record reaches the session duration, a gap marker spanning exactly that
/// stretch is inserted between them. Active flags are assigned afterwards
/// against `now`: every non-gap block whose fixed end lies in the future.
pub fn build_blocks(
    records: &[UsageRecord],
    costs: &mut CostCalculator,
    session_duration: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<SessionBlock>> {
    let mut blocks: Vec<SessionBlock> = Vec::new();
    let mut current: Option<SessionBlock> = None;
    let mut prev_ts: Option<DateTime<Utc>> = None;

    for record in records {
        let needs_new = match (&current, prev_ts) {
            (None, _) => true,
            (Some(block), prev) => {
                record.timestamp >= block.end
                    || prev.is_some_and(|p| record.timestamp - p >= session_duration)
            }
        };

        if needs_new {
            if let Some(mut closed) = current.take() {
                closed.close();
                let last_activity = closed.actual_end_or_end();
                blocks.push(closed);
                if record.timestamp - last_activity >= session_duration {
                    blocks.push(SessionBlock::gap(last_activity, record.timestamp));
                }
            }
            current = Some(SessionBlock::open(
                floor_to_hour(record.timestamp),
                session_duration,
            ));
        }

        let cost = costs.cost(&record.model, record.tokens)?;
        current.as_mut().expect("block opened above").accumulate(
            record.timestamp,
            &record.model,
            record.tokens,
            cost,
            record.message_id.as_deref(),
        );
        prev_ts = Some(record.timestamp);
    }

    if let Some(mut last) = current.take() {
        last.close();
        blocks.push(last);
    }

    for block in &mut blocks {
        block.is_active = !block.is_gap && block.end > now;
    }

    Ok(blocks)
}
