use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::config::{default_base_paths, MonitorConfig};

#[derive(clap::Parser, Debug)]
#[command(name = "claude-usage-monitor", version, about)]
pub struct Args {
    /// Force log path(s), comma-separated. Defaults to ~/.claude/projects
    /// and ~/.config/claude/projects
    #[arg(long, env = "CLAUDE_MONITOR_DIRS")]
    pub data_dir: Option<String>,

    /// Emit JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Keep running and re-render on every refresh
    #[arg(long)]
    pub watch: bool,

    /// Analysis window length in days
    #[arg(long, default_value_t = 7)]
    pub days: i64,

    /// Explicit window start (RFC 3339); overrides --days
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Explicit window end (RFC 3339); defaults to now
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,

    /// Refresh interval for --watch, in seconds
    #[arg(long, default_value_t = 8)]
    pub refresh_seconds: u64,

    /// Fail on models missing from the pricing table instead of falling
    /// back to sonnet rates
    #[arg(long)]
    pub strict_models: bool,

    /// Show the session block timeline in text output
    #[arg(long)]
    pub show_blocks: bool,
}

impl Args {
    /// Resolve the flag/env surface into a pipeline configuration.
    pub fn to_config(&self) -> MonitorConfig {
        let base_paths: Vec<PathBuf> = default_base_paths(self.data_dir.as_deref());
        let window = match (self.since, self.until) {
            (Some(start), Some(end)) => Some((start, end)),
            (Some(start), None) => Some((start, Utc::now())),
            _ => None,
        };
        MonitorConfig {
            base_paths,
            window,
            window_days: self.days,
            refresh_interval_seconds: self.refresh_seconds,
            strict_unknown_models: self.strict_models,
            ..MonitorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["claude-usage-monitor"]);
        let cfg = args.to_config();
        assert_eq!(cfg.window_days, 7);
        assert_eq!(cfg.refresh_interval_seconds, 8);
        assert!(!cfg.strict_unknown_models);
        assert!(cfg.window.is_none());
    }

    #[test]
    fn test_explicit_window_and_paths() {
        let args = Args::parse_from([
            "claude-usage-monitor",
            "--data-dir",
            "/tmp/logs-a,/tmp/logs-b",
            "--since",
            "2024-09-01T00:00:00Z",
            "--until",
            "2024-09-11T00:00:00Z",
            "--strict-models",
        ]);
        let cfg = args.to_config();
        assert_eq!(cfg.base_paths.len(), 2);
        assert!(cfg.strict_unknown_models);
        let (start, end) = cfg.window.unwrap();
        assert_eq!((end - start).num_days(), 10);
    }
}
