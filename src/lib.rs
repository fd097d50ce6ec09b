//! # Financial Table Engine
//!
//! A library for merging raw per-period financial statements (income statement,
//! balance sheet, cash flow) from one or more reporting entities into a single
//! chronological table, with growth statistics per metric.
//!
//! ## Core Concepts
//!
//! - **Period Labels**: Annual rows are labelled by year (`"2023"`), quarterly rows by
//!   month and two-digit year (`"Mar 23"`). Trailing-twelve-month figures get `"TTM"`,
//!   which always sorts last
//! - **Metric Origin**: Every metric id belongs to exactly one statement; unknown ids
//!   are read from the income statement
//! - **Visible Range**: An inclusive index window over the sorted periods, chosen
//!   explicitly, by preset (`1Y`, `5Y`, `10Y`, `All`) or by default (latest 5 annual
//!   or 8 quarterly periods)
//! - **Derived Statistics**: Total change and CAGR over the full non-TTM history,
//!   independent of the visible window
//! - **Graceful Degradation**: Malformed records, short histories and bad windows are
//!   reported as anomalies; processing never fails
//!
//! ## Example
//!
//! ```rust
//! use financial_table_engine::*;
//!
//! let request = TableRequest {
//!     entities: vec![EntityStatements::new("AAA").with_income(vec![
//!         RawStatementRecord::new("2022-12-31").with_metric("revenue", 100.0),
//!         RawStatementRecord::new("2023-12-31").with_metric("revenue", 150.0),
//!         RawStatementRecord::ttm().with_metric("revenue", 160.0),
//!     ])],
//!     metrics: vec!["revenue".to_string()],
//!     period_type: PeriodType::Annual,
//!     range: RangeRequest::Preset { preset: RangePreset::FiveYears },
//! };
//!
//! let output = build_financial_table(&request);
//! assert_eq!(output.visible_periods(), vec!["2022", "2023", "TTM"]);
//! assert_eq!(output.stats["AAA_revenue"].total_change_percent, Some(50.0));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod merger;
pub mod metrics;
pub mod periods;
pub mod range;
pub mod schema;
pub mod statistics;
pub mod ttm;
pub mod utils;

pub use config::{EngineConfig, MissingValuePolicy};
pub use engine::FinancialTableEngine;
pub use error::{Anomaly, FinancialTableError, Result};
pub use merger::{EntityIndex, MergedTable, TableMerger};
pub use metrics::{is_known_metric, known_metrics, metric_origin};
pub use periods::{
    compare_periods, extract_periods, extract_periods_from, period_label, sort_periods,
    sort_periods_with_anomalies, PeriodExtraction, TTM_LABEL,
};
pub use range::{select_range, RangePreset, RangeRequest, RangeSelection, VisibleRange};
pub use schema::*;
pub use statistics::{compute_stats, DerivedStats, MetricSeries, SeriesPoint, StatisticsCalculator};
pub use ttm::derive_ttm;

/// Builds a table with the default engine configuration.
pub fn build_financial_table(request: &TableRequest) -> TableOutput {
    FinancialTableEngine::default().process(request)
}

/// Builds a table with a caller-supplied configuration.
pub fn build_financial_table_with_config(
    request: &TableRequest,
    config: EngineConfig,
) -> Result<TableOutput> {
    let engine = FinancialTableEngine::new(config)?;
    Ok(engine.process(request))
}
