//! # Loader Module
//!
//! Discovers append-only `.jsonl` logs under the configured base directories,
//! streams their lines through the extractor, applies the analysis window and
//! global dedup, and returns records sorted by timestamp.
//!
//! All I/O failures are recovered locally: a missing directory is not an
//! error, an unreadable file is skipped, a malformed line is skipped. Only
//! strict-mode model errors, negative-token validation and cancellation
//! propagate.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::extract::{extract_value, Extracted};
use crate::models::{LoadStats, UsageRecord};
use crate::scheduler::CancelToken;

/// Records plus the skip counters accumulated while producing them.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub records: Vec<UsageRecord>,
    pub stats: LoadStats,
}

/// Enumerate every `.jsonl` file under the base directories, in no
/// particular order.
pub fn discover_files(base_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for base in base_paths {
        if !base.is_dir() {
            debug!(path = %base.display(), "base directory missing, skipping");
            continue;
        }
        let walker = match globwalk::GlobWalkerBuilder::from_patterns(base, &["**/*.jsonl"]).build()
        {
            Ok(w) => w,
            Err(e) => {
                warn!(path = %base.display(), error = %e, "glob walk failed, skipping directory");
                continue;
            }
        };
        for entry in walker.flatten() {
            files.push(entry.path().to_path_buf());
        }
    }
    files
}

/// Load all usage records inside `[start, end)`.
///
/// Dedup is global across every file in this call: the first record carrying
/// a given `(message-id, request-id)` pair wins, later ones are counted and
/// dropped. Records missing either id are never deduplicated. Output is
/// sorted ascending by timestamp; the sort is stable, so ties keep insertion
/// order.
pub fn load_records(
    base_paths: &[PathBuf],
    window: (DateTime<Utc>, DateTime<Utc>),
    cancel: Option<&CancelToken>,
) -> Result<LoadOutcome> {
    let (start, end) = window;
    let mut out = LoadOutcome::default();
    let mut seen_identities: HashSet<String> = HashSet::new();

    for path in discover_files(base_paths) {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(MonitorError::Cancelled);
        }
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot open file, skipping");
                out.stats.files_skipped += 1;
                continue;
            }
        };

        let reader = BufReader::new(file);
        for line in reader.lines() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(MonitorError::Cancelled);
            }
            let line = match line {
                Ok(l) => l,
                Err(_) => continue,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let v: serde_json::Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(_) => {
                    // Partial last lines of a growing file land here too.
                    out.stats.lines_skipped += 1;
                    continue;
                }
            };
            let record = match extract_value(&v)? {
                Extracted::Record(r) => r,
                Extracted::NotUsage => continue,
                Extracted::Dropped => {
                    debug!(path = %path.display(), "usage record dropped");
                    out.stats.records_dropped += 1;
                    continue;
                }
            };
            if record.timestamp < start || record.timestamp >= end {
                continue;
            }
            if let Some(identity) = record.identity() {
                if !seen_identities.insert(identity) {
                    out.stats.duplicates_skipped += 1;
                    continue;
                }
            }
            out.records.push(record);
        }
    }

    out.records.sort_by_key(|r| r.timestamp);
    Ok(out)
}
