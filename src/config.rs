//! Configuration surface for the monitoring engine.

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

/// Env var listing comma-separated log directories, overriding discovery.
pub const DIRS_ENV: &str = "CLAUDE_MONITOR_DIRS";

/// Everything the pipeline can be tuned with. `Default` matches the
/// documented defaults; the CLI layers flag and env overrides on top.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directories scanned recursively for `.jsonl` logs.
    pub base_paths: Vec<PathBuf>,
    /// Fixed analysis window; `None` resolves to `[now - window_days, now]`
    /// at compute time.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub window_days: i64,
    pub refresh_interval_seconds: u64,
    pub p90_common_limits: Vec<u64>,
    pub p90_limit_threshold: f64,
    pub p90_default_min_limit: f64,
    pub p90_cache_ttl_seconds: u64,
    pub session_duration_hours: i64,
    pub cost_decimals_internal: u32,
    pub cost_decimals_display: u32,
    pub strict_unknown_models: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            base_paths: default_base_paths(None),
            window: None,
            window_days: 7,
            refresh_interval_seconds: 8,
            p90_common_limits: vec![19_000, 88_000, 220_000, 880_000],
            p90_limit_threshold: 0.9,
            p90_default_min_limit: 44_000.0,
            p90_cache_ttl_seconds: 3600,
            session_duration_hours: 5,
            cost_decimals_internal: 6,
            cost_decimals_display: 2,
            strict_unknown_models: false,
        }
    }
}

impl MonitorConfig {
    pub fn session_duration(&self) -> Duration {
        Duration::hours(self.session_duration_hours)
    }

    /// The `[start, end)` window a compute call should cover.
    pub fn effective_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        self.window
            .unwrap_or_else(|| (now - Duration::days(self.window_days), now))
    }
}

/// Resolve the log directories to scan.
///
/// An explicit comma-separated override (CLI flag or env) takes precedence;
/// otherwise both known Claude Code data roots are used. Missing directories
/// are fine here, the loader skips them silently.
pub fn default_base_paths(override_list: Option<&str>) -> Vec<PathBuf> {
    if let Some(list) = override_list {
        let paths: Vec<PathBuf> = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if !paths.is_empty() {
            return paths;
        }
    }

    let basedirs = directories::BaseDirs::new();
    let home = basedirs
        .as_ref()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"));
    let xdg_config = basedirs
        .as_ref()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| home.join(".config"));
    vec![
        home.join(".claude").join("projects"),
        xdg_config.join("claude").join("projects"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.window_days, 7);
        assert_eq!(cfg.refresh_interval_seconds, 8);
        assert_eq!(cfg.p90_common_limits, vec![19_000, 88_000, 220_000, 880_000]);
        assert_eq!(cfg.p90_limit_threshold, 0.9);
        assert_eq!(cfg.p90_default_min_limit, 44_000.0);
        assert_eq!(cfg.p90_cache_ttl_seconds, 3600);
        assert_eq!(cfg.session_duration_hours, 5);
        assert!(!cfg.strict_unknown_models);
        assert_eq!(cfg.base_paths.len(), 2);
    }

    #[test]
    fn test_effective_window_defaults_to_seven_days() {
        let cfg = MonitorConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 9, 11, 15, 30, 0).unwrap();
        let (start, end) = cfg.effective_window(now);
        assert_eq!(end, now);
        assert_eq!(start, now - Duration::days(7));

        let fixed = (now - Duration::days(1), now);
        let pinned = MonitorConfig {
            window: Some(fixed),
            ..MonitorConfig::default()
        };
        assert_eq!(pinned.effective_window(now + Duration::hours(2)), fixed);
    }

    #[test]
    fn test_override_list_parsing() {
        let paths = default_base_paths(Some("/tmp/a, /tmp/b,,"));
        assert_eq!(paths, vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
        // Blank override falls back to discovery
        assert_eq!(default_base_paths(Some("  ")).len(), 2);
    }
}
