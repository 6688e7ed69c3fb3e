//! # Display Module
//!
//! Renders one metrics snapshot as colored terminal text or as a JSON
//! document for machine consumers.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

use crate::models::Metrics;
use crate::utils::{format_currency, format_minutes, format_tokens};

fn format_instant(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M:%SZ").to_string()
}

/// Build the machine-readable snapshot document.
///
/// Blocks and raw records are summarized rather than embedded; callers who
/// need the full structures should serialize [`Metrics`] directly.
pub fn build_json_output(metrics: &Metrics) -> Value {
    let models: Value = metrics
        .model_distribution
        .iter()
        .map(|(model, stats)| {
            (
                model.clone(),
                json!({
                    "input_tokens": stats.tokens.input,
                    "output_tokens": stats.tokens.output,
                    "cache_create_tokens": stats.tokens.cache_create,
                    "cache_read_tokens": stats.tokens.cache_read,
                    "cost_usd": stats.cost,
                    "entries": stats.entries,
                    "pct_by_cost": stats.pct_by_cost,
                    "pct_by_tokens": stats.pct_by_tokens,
                }),
            )
        })
        .collect::<serde_json::Map<String, Value>>()
        .into();

    json!({
        "cost_usage": metrics.cost_usage,
        "token_usage": metrics.token_usage,
        "messages_usage": metrics.messages_usage,
        "time_to_reset_minutes": metrics.time_to_reset_minutes,
        "limit_resets_at": metrics.limit_resets_at.to_rfc3339(),
        "tokens_will_run_out": metrics.tokens_will_run_out.map(|t| t.to_rfc3339()),
        "burn_rate": metrics.burn_rate.map(|r| json!({
            "tokens_per_minute": r.tokens_per_minute,
            "cost_per_hour": r.cost_per_hour,
        })),
        "cost_rate_per_hour": metrics.cost_rate,
        "p90": {
            "token_limit": metrics.p90_token_limit,
            "cost_limit": metrics.p90_cost_limit,
            "message_limit": metrics.p90_message_limit,
        },
        "model_distribution": models,
        "blocks": metrics.blocks.len(),
        "records": metrics.records.len(),
        "load_stats": {
            "files_skipped": metrics.load_stats.files_skipped,
            "lines_skipped": metrics.load_stats.lines_skipped,
            "duplicates_skipped": metrics.load_stats.duplicates_skipped,
            "records_dropped": metrics.load_stats.records_dropped,
        },
    })
}

pub fn print_json_output(metrics: &Metrics) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&build_json_output(metrics))?);
    Ok(())
}

pub fn print_text_output(metrics: &Metrics, show_blocks: bool) {
    println!(
        "{} {}  {} {}  {} {}",
        "cost".dimmed(),
        format_currency(metrics.cost_usage).bright_white().bold(),
        "tokens".dimmed(),
        format_tokens(metrics.token_usage).bright_white(),
        "messages".dimmed(),
        metrics.messages_usage.bright_white(),
    );

    match metrics.burn_rate {
        Some(rate) => println!(
            "{} {}/min  {}/h",
            "burn".dimmed(),
            format_tokens(rate.tokens_per_minute.round() as u64).bright_cyan(),
            format_currency(rate.cost_per_hour).bright_cyan(),
        ),
        None => println!("{} {}", "burn".dimmed(), "idle".dimmed()),
    }
    if metrics.cost_rate > 0.0 {
        println!(
            "{} {}/h",
            "rate".dimmed(),
            format_currency(metrics.cost_rate).bright_cyan()
        );
    }

    println!(
        "{} {} ({})",
        "resets".dimmed(),
        format_instant(metrics.limit_resets_at).bright_yellow(),
        format_minutes(metrics.time_to_reset_minutes),
    );
    if let Some(out) = metrics.tokens_will_run_out {
        println!(
            "{} {}",
            "limit hit".dimmed(),
            format_instant(out).bright_red().bold()
        );
    }

    println!(
        "{} {} tok  {} cost  {} msgs",
        "p90".dimmed(),
        format_tokens(metrics.p90_token_limit.round() as u64),
        format_currency(metrics.p90_cost_limit),
        metrics.p90_message_limit.round() as u64,
    );

    if !metrics.model_distribution.is_empty() {
        let mut models: Vec<_> = metrics.model_distribution.iter().collect();
        models.sort_by(|a, b| b.1.cost.partial_cmp(&a.1.cost).unwrap_or(std::cmp::Ordering::Equal));
        for (model, stats) in models {
            println!(
                "  {} {} {} ({:.0}%)",
                model.bright_magenta(),
                format_tokens(stats.tokens.usage()),
                format_currency(stats.cost),
                stats.pct_by_cost.unwrap_or(0.0),
            );
        }
    }

    if show_blocks {
        for block in &metrics.blocks {
            if block.is_gap {
                println!(
                    "  {} {} -> {}",
                    "gap".dimmed(),
                    format_instant(block.start).dimmed(),
                    format_instant(block.end).dimmed(),
                );
            } else {
                let marker = if block.is_active { "*" } else { " " };
                println!(
                    "  {}{} {} {} {} msgs",
                    marker.bright_green(),
                    format_instant(block.start),
                    format_tokens(block.tokens.total()),
                    format_currency(block.cost),
                    block.message_count,
                );
            }
        }
    }

    let stats = metrics.load_stats;
    if stats.files_skipped + stats.lines_skipped + stats.duplicates_skipped + stats.records_dropped
        > 0
    {
        println!(
            "{}",
            format!(
                "skipped: {} files, {} lines, {} dups, {} dropped",
                stats.files_skipped,
                stats.lines_skipped,
                stats.duplicates_skipped,
                stats.records_dropped
            )
            .dimmed()
        );
    }
}
