use thiserror::Error;

/// Errors that can escape a `compute` call.
///
/// Everything else (unreadable files, malformed lines, bad timestamps) is
/// recovered locally and surfaced through the skip counters in
/// [`crate::models::LoadStats`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Model not present in the pricing table while strict mode is on.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A usage field carried a negative token count.
    #[error("negative token count in field {field}: {value}")]
    NegativeTokens { field: &'static str, value: i64 },

    /// The in-flight compute was cancelled between files or lines.
    #[error("compute cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
