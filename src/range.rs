use crate::error::{Anomaly, FinancialTableError};
use crate::schema::PeriodType;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive index window over a sorted period list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RangePreset {
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "10Y")]
    TenYears,
    All,
}

impl RangePreset {
    /// Number of trailing periods the preset shows; `None` shows everything.
    pub fn period_count(&self) -> Option<usize> {
        match self {
            RangePreset::OneYear => Some(4),
            RangePreset::FiveYears => Some(10),
            RangePreset::TenYears => Some(20),
            RangePreset::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::OneYear => "1Y",
            RangePreset::FiveYears => "5Y",
            RangePreset::TenYears => "10Y",
            RangePreset::All => "All",
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = FinancialTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1Y" | "1y" => Ok(RangePreset::OneYear),
            "5Y" | "5y" => Ok(RangePreset::FiveYears),
            "10Y" | "10y" => Ok(RangePreset::TenYears),
            s if s.eq_ignore_ascii_case("all") => Ok(RangePreset::All),
            _ => Err(FinancialTableError::UnknownPreset(s.to_string())),
        }
    }
}

/// How the caller chose the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RangeRequest {
    /// Most recent periods, sized by the period type's default window.
    #[default]
    Default,
    Explicit { start: usize, end: usize },
    Preset { preset: RangePreset },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeSelection {
    pub range: VisibleRange,
    pub anomaly: Option<Anomaly>,
}

/// Default window sizes per period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultWindows {
    pub annual: usize,
    pub quarterly: usize,
}

impl Default for DefaultWindows {
    fn default() -> Self {
        Self {
            annual: 5,
            quarterly: 8,
        }
    }
}

impl DefaultWindows {
    pub fn for_period_type(&self, period_type: PeriodType) -> usize {
        match period_type {
            PeriodType::Annual => self.annual,
            PeriodType::Quarterly => self.quarterly,
        }
    }
}

/// Window of the last `count` periods, ending at the last index.
pub fn trailing_range(period_count: usize, count: usize) -> VisibleRange {
    let end = period_count.saturating_sub(1);
    let start = end.saturating_sub(count.max(1) - 1);
    VisibleRange { start, end }
}

pub fn preset_range(period_count: usize, preset: RangePreset) -> VisibleRange {
    match preset.period_count() {
        Some(count) => trailing_range(period_count, count),
        None => VisibleRange::new(0, period_count.saturating_sub(1)),
    }
}

/// Clamps an explicit window into `[0, period_count - 1]`.
pub fn clamp_range(period_count: usize, start: usize, end: usize) -> RangeSelection {
    let last = period_count.saturating_sub(1);
    let clamped_end = end.min(last);
    let clamped_start = start.min(clamped_end);
    let range = VisibleRange::new(clamped_start, clamped_end);

    let anomaly = (clamped_start != start || clamped_end != end).then(|| {
        debug!(
            "Clamping window [{}, {}] to [{}, {}] over {} periods",
            start, end, clamped_start, clamped_end, period_count
        );
        Anomaly::OutOfRangeWindow {
            requested_start: start,
            requested_end: end,
            start: clamped_start,
            end: clamped_end,
        }
    });

    RangeSelection { range, anomaly }
}

/// Resolves a range request against a sorted period list of `period_count` entries.
///
/// TTM, when present, is the last period and therefore always inside default
/// and preset windows.
pub fn select_range(
    period_count: usize,
    period_type: PeriodType,
    request: &RangeRequest,
    windows: &DefaultWindows,
) -> RangeSelection {
    let range = match request {
        RangeRequest::Default => {
            trailing_range(period_count, windows.for_period_type(period_type))
        }
        RangeRequest::Preset { preset } => preset_range(period_count, *preset),
        RangeRequest::Explicit { start, end } => return clamp_range(period_count, *start, *end),
    };

    RangeSelection {
        range,
        anomaly: None,
    }
}
