use clap::Parser;
use serial_test::serial;
use std::path::PathBuf;

use claude_usage_monitor::cli::Args;

#[test]
#[serial]
fn test_data_dir_env_override() {
    // SAFETY: test runs serially, no concurrent env access
    unsafe { std::env::set_var("CLAUDE_MONITOR_DIRS", "/tmp/logs-x,/tmp/logs-y") };

    let args = Args::parse_from(["claude-usage-monitor"]);
    let cfg = args.to_config();
    assert_eq!(
        cfg.base_paths,
        vec![PathBuf::from("/tmp/logs-x"), PathBuf::from("/tmp/logs-y")]
    );

    unsafe { std::env::remove_var("CLAUDE_MONITOR_DIRS") };
}

#[test]
#[serial]
fn test_flag_beats_env() {
    // SAFETY: test runs serially, no concurrent env access
    unsafe { std::env::set_var("CLAUDE_MONITOR_DIRS", "/tmp/from-env") };

    let args = Args::parse_from(["claude-usage-monitor", "--data-dir", "/tmp/from-flag"]);
    let cfg = args.to_config();
    assert_eq!(cfg.base_paths, vec![PathBuf::from("/tmp/from-flag")]);

    unsafe { std::env::remove_var("CLAUDE_MONITOR_DIRS") };
}

#[test]
fn test_watch_and_json_flags() {
    let args = Args::parse_from(["claude-usage-monitor", "--watch", "--json", "--refresh-seconds", "3"]);
    assert!(args.watch);
    assert!(args.json);
    assert_eq!(args.to_config().refresh_interval_seconds, 3);
}
