use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinancialTableError {
    #[error("Invalid default window {0}: must be at least 1 period")]
    InvalidWindow(usize),

    #[error("Unknown range preset '{0}': expected one of 1Y, 5Y, 10Y, All")]
    UnknownPreset(String),

    #[error("Unknown period type '{0}': expected annual or quarterly")]
    UnknownPeriodType(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinancialTableError>;

fn suppressed_statistics(base: &f64) -> &'static str {
    if *base == 0.0 {
        "total change and CAGR unavailable"
    } else {
        "CAGR unavailable, total change still reported"
    }
}

/// Non-fatal conditions met while building a table.
///
/// These are recovered locally and reported alongside the output; they never
/// abort processing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    #[error("Skipped record with unparsable period (date: {date:?}) from {source_name}")]
    MalformedPeriod {
        source_name: String,
        date: Option<String>,
    },

    #[error("Not enough data points for {series}: {points} available")]
    InsufficientData { series: String, points: usize },

    #[error("Degenerate base value {base} for {series}: {}", suppressed_statistics(.base))]
    DegenerateBase { series: String, base: f64 },

    #[error("Requested window [{requested_start}, {requested_end}] clamped to [{start}, {end}]")]
    OutOfRangeWindow {
        requested_start: usize,
        requested_end: usize,
        start: usize,
        end: usize,
    },

    #[error("Period label '{label}' has no chronological format; ordered lexically after known periods")]
    UnorderedLabel { label: String },
}
