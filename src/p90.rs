//! # P90 Estimator
//!
//! Adaptive usage ceilings derived from completed blocks: the 90th
//! percentile of historical token totals, costs and message counts. The
//! token limit prefers blocks that plausibly ran into a known plan limit;
//! when none exist it widens to every completed block with usage.

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::models::SessionBlock;

/// Fallback cost ceiling when no completed blocks exist yet.
pub const DEFAULT_COST_LIMIT: f64 = 5.0;
/// Fallback message ceiling when no completed blocks exist yet.
pub const DEFAULT_MESSAGE_LIMIT: f64 = 100.0;

/// The three adaptive ceilings, as one cached unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct P90Limits {
    pub tokens: f64,
    pub cost: f64,
    pub messages: f64,
}

/// 90th percentile with linear interpolation, exclusive definition:
/// `p = 0.9 * (n + 1) - 1`, clamped into `[0, n - 1]`.
fn percentile_90(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let p = (0.9 * (n as f64 + 1.0) - 1.0).clamp(0.0, (n - 1) as f64);
    let lo = p.floor() as usize;
    let hi = p.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = p - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted_values(blocks: &[&SessionBlock], value: impl Fn(&SessionBlock) -> f64) -> Vec<f64> {
    let mut vals: Vec<f64> = blocks.iter().map(|b| value(b)).collect();
    vals.sort_by(|a, b| a.partial_cmp(b).expect("finite metric values"));
    vals
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheState {
    limits: P90Limits,
    computed_at: DateTime<Utc>,
    /// Signature of the completed-block history the limits were derived
    /// from: count plus the start of the newest completed block.
    history: (usize, Option<DateTime<Utc>>),
}

/// Estimator with a TTL cache, owned by the facade.
pub struct P90Estimator {
    common_limits: Vec<u64>,
    limit_threshold: f64,
    default_min_limit: f64,
    cache_ttl: Duration,
    cache: Option<CacheState>,
}

impl P90Estimator {
    pub fn new(config: &MonitorConfig) -> Self {
        P90Estimator {
            common_limits: config.p90_common_limits.clone(),
            limit_threshold: config.p90_limit_threshold,
            default_min_limit: config.p90_default_min_limit,
            cache_ttl: Duration::seconds(config.p90_cache_ttl_seconds as i64),
            cache: None,
        }
    }

    /// The P90 triple for the given block list, served from cache while the
    /// TTL holds and the completed-block history has not grown.
    pub fn estimate(&mut self, blocks: &[SessionBlock], now: DateTime<Utc>) -> P90Limits {
        let completed: Vec<&SessionBlock> = blocks
            .iter()
            .filter(|b| !b.is_gap && !b.is_active)
            .collect();
        let history = (completed.len(), completed.last().map(|b| b.start));

        if let Some(cached) = self.cache {
            if cached.history == history && now - cached.computed_at < self.cache_ttl {
                return cached.limits;
            }
        }

        let limits = P90Limits {
            tokens: self.token_limit(&completed),
            cost: percentile_90(&sorted_values(&completed, |b| b.cost))
                .unwrap_or(DEFAULT_COST_LIMIT),
            messages: percentile_90(&sorted_values(&completed, |b| b.message_count as f64))
                .unwrap_or(DEFAULT_MESSAGE_LIMIT),
        };
        self.cache = Some(CacheState {
            limits,
            computed_at: now,
            history,
        });
        limits
    }

    /// Two-tier token-limit selection: prefer blocks that came within the
    /// threshold of any common plan limit; fall back to every completed
    /// block with usage. The answer never drops below the configured
    /// minimum.
    fn token_limit(&self, completed: &[&SessionBlock]) -> f64 {
        let near_limit: Vec<&SessionBlock> = completed
            .iter()
            .filter(|b| {
                let total = b.tokens.total() as f64;
                self.common_limits
                    .iter()
                    .any(|&limit| total >= limit as f64 * self.limit_threshold)
            })
            .copied()
            .collect();

        let sample: Vec<&SessionBlock> = if near_limit.is_empty() {
            completed
                .iter()
                .filter(|b| b.tokens.total() > 0)
                .copied()
                .collect()
        } else {
            near_limit
        };

        let p90 = percentile_90(&sorted_values(&sample, |b| b.tokens.total() as f64))
            .unwrap_or(self.default_min_limit);
        p90.max(self.default_min_limit)
    }
}
