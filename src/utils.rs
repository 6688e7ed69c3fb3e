use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

/// Floor a timestamp to the start of its UTC hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), ts.hour(), 0, 0)
        .unwrap()
}

/// Elapsed minutes between two instants as a real number.
///
/// Measured in milliseconds to keep sub-minute resolution; negative spans
/// clamp to zero.
pub fn minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    ((b - a).num_milliseconds().max(0) as f64) / 60_000.0
}

/// Round half-away-from-zero at the given number of decimal places.
pub fn round_decimals(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (x * scale).round() / scale
}

/// Round a USD amount to micro precision (6 decimals).
pub fn round_micro_usd(x: f64) -> f64 {
    round_decimals(x, 6)
}

pub fn format_currency(v: f64) -> String {
    format!("${v:.2}")
}

pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

/// Render a minute count as `XhYYm` / `Ym`.
pub fn format_minutes(mins: i64) -> String {
    let mins = mins.max(0);
    if mins >= 60 {
        format!("{}h{:02}m", mins / 60, mins % 60)
    } else {
        format!("{mins}m")
    }
}

/// Whole-minute remainder until `later`, clamped at zero.
pub fn minutes_until(now: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - now).num_minutes().max(0)
}

/// Five hours as a chrono duration, from the configured hour count.
pub fn session_duration(hours: i64) -> Duration {
    Duration::hours(hours)
}
