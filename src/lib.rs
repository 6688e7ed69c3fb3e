//! # Claude Usage Monitor
//!
//! A local usage-monitoring engine for Claude Code sessions. It ingests the
//! assistant's append-only JSONL conversation logs, reconstructs a
//! session-and-block model of usage, and publishes live metrics together with
//! historical aggregates.
//!
//! ## Overview
//!
//! The pipeline runs in stages on every [`monitor::UsageMonitor::compute`]
//! call:
//!
//! 1. [`loader`] discovers and streams `.jsonl` files, extracting normalized
//!    usage records with global dedup and a `[start, end)` window filter
//! 2. [`blocks`] groups records into fixed five-hour windows aligned to UTC
//!    hour boundaries, inserting gap markers where ≥ 5 h pass with no usage
//! 3. [`burn`], [`p90`] and [`predict`] derive burn rates, adaptive P90
//!    limits and exhaustion/reset predictions from the block list
//! 4. [`monitor`] assembles the final [`models::Metrics`] snapshot
//!
//! The engine never writes to the source logs and keeps no state between
//! calls other than the cost memoization map and the P90 TTL cache, both
//! owned by the facade. [`scheduler`] offers a small worker-thread shim so a
//! UI-capable caller is never blocked by file I/O.

/// Five-hour session block construction with gap detection
pub mod blocks;

/// Proportional burn-rate calculation over the last 60 minutes
pub mod burn;

/// Command-line argument parsing
pub mod cli;

/// Configuration surface and defaults
pub mod config;

/// Memoized per-model cost computation
pub mod cost;

/// Display formatting for text and JSON output
pub mod display;

/// Library error types
pub mod error;

/// Raw log line to usage record extraction
pub mod extract;

/// Log discovery, streaming, dedup and sorting
pub mod loader;

/// Data models for records, blocks and metrics
pub mod models;

/// Metrics facade: the single synchronous entry point
pub mod monitor;

/// P90 adaptive-limit estimation
pub mod p90;

/// Model pricing table and category resolution
pub mod pricing;

/// Exhaustion and reset-time prediction
pub mod predict;

/// Worker-thread scheduling shim
pub mod scheduler;

/// Utility functions for time and formatting
pub mod utils;

pub use error::MonitorError;
pub use monitor::UsageMonitor;
