//! # Metrics Facade
//!
//! The single entry point of the pipeline. Each `compute` call re-reads the
//! logs and produces a fresh, immutable [`Metrics`] snapshot; the only state
//! carried between calls is the cost memoization map and the P90 TTL cache,
//! both owned here.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::blocks::build_blocks;
use crate::burn::calculate_burn_rate;
use crate::config::MonitorConfig;
use crate::cost::CostCalculator;
use crate::error::Result;
use crate::loader::load_records;
use crate::models::{Metrics, ModelStats, SessionBlock};
use crate::p90::P90Estimator;
use crate::predict::{predict_exhaustion, reset_time};
use crate::scheduler::CancelToken;
use crate::utils::{minutes_until, round_decimals};

pub struct UsageMonitor {
    config: MonitorConfig,
    costs: CostCalculator,
    p90: P90Estimator,
    cancel: CancelToken,
}

impl UsageMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let costs = CostCalculator::with_precision(
            config.strict_unknown_models,
            config.cost_decimals_internal,
        );
        let p90 = P90Estimator::new(&config);
        UsageMonitor {
            config,
            costs,
            p90,
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Token the scheduler uses to interrupt an in-flight compute.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Compute over the configured window, ending now.
    pub fn compute_current(&mut self) -> Result<Metrics> {
        let now = Utc::now();
        let (start, end) = self.config.effective_window(now);
        self.compute_at(start, end, now)
    }

    /// Compute over an explicit `[start, end)` window.
    pub fn compute(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Metrics> {
        self.compute_at(start, end, Utc::now())
    }

    /// Compute with an injected notion of "now"; the testable core of the
    /// facade.
    pub fn compute_at(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Metrics> {
        self.cancel.reset();
        let session_duration = self.config.session_duration();

        let outcome = load_records(&self.config.base_paths, (start, end), Some(&self.cancel))?;
        let blocks = build_blocks(&outcome.records, &mut self.costs, session_duration, now)?;

        let limits = self.p90.estimate(&blocks, now);

        let active: Vec<&SessionBlock> = blocks
            .iter()
            .filter(|b| b.is_active && !b.is_gap)
            .collect();

        let cost_usage = round_decimals(
            active.iter().map(|b| b.cost).sum(),
            self.config.cost_decimals_display,
        );
        let token_usage: u64 = active.iter().map(|b| b.tokens.usage()).sum();
        let messages_usage = active
            .iter()
            .flat_map(|b| b.message_ids.iter())
            .collect::<HashSet<_>>()
            .len() as u64;

        let model_distribution = aggregate_model_distribution(&active);

        let cost_rate: f64 = active
            .iter()
            .filter(|b| b.duration_minutes >= 1.0)
            .map(|b| (b.cost / b.duration_minutes) * 60.0)
            .sum();

        let burn_rate = calculate_burn_rate(&blocks, now);
        let limit_resets_at = reset_time(&blocks, session_duration, now);
        let tokens_will_run_out = predict_exhaustion(&blocks, limits.cost, session_duration, now);

        Ok(Metrics {
            cost_usage,
            token_usage,
            messages_usage,
            time_to_reset_minutes: minutes_until(now, limit_resets_at),
            model_distribution,
            burn_rate,
            cost_rate,
            tokens_will_run_out,
            limit_resets_at,
            p90_token_limit: limits.tokens,
            p90_cost_limit: limits.cost,
            p90_message_limit: limits.messages,
            blocks,
            records: outcome.records,
            load_stats: outcome.stats,
        })
    }
}

/// Sum per-model stats across the active blocks and recompute percentages
/// against the combined totals.
fn aggregate_model_distribution(active: &[&SessionBlock]) -> HashMap<String, ModelStats> {
    let mut merged: HashMap<String, ModelStats> = HashMap::new();
    for block in active {
        for (model, stats) in &block.per_model_stats {
            let entry = merged.entry(model.clone()).or_default();
            *entry = std::mem::take(entry) + stats.clone();
        }
    }

    let total_cost: f64 = merged.values().map(|s| s.cost).sum();
    let total_usage: u64 = merged.values().map(|s| s.tokens.usage()).sum();
    for stats in merged.values_mut() {
        stats.finalize(total_cost, total_usage);
    }
    merged
}
