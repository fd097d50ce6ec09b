use crate::error::{Anomaly, FinancialTableError};
use crate::periods::TTM_LABEL;
use crate::range::{RangeRequest, VisibleRange};
use crate::statistics::DerivedStats;
use crate::utils::{coerce_numeric, parse_record_date};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    #[schemars(description = "One row per fiscal year, labelled with the four-digit year (e.g. '2023')")]
    Annual,

    #[schemars(description = "One row per quarter, labelled '{MonAbbrev} {YY}' from the period end date (e.g. 'Mar 23')")]
    Quarterly,
}

impl FromStr for PeriodType {
    type Err = FinancialTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" | "fy" | "year" => Ok(Self::Annual),
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            _ => Err(FinancialTableError::UnknownPeriodType(s.to_string())),
        }
    }
}

/// Which statement supplies a metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricOrigin {
    Income,
    BalanceSheet,
    CashFlow,
}

impl MetricOrigin {
    pub const ALL: [MetricOrigin; 3] = [
        MetricOrigin::Income,
        MetricOrigin::BalanceSheet,
        MetricOrigin::CashFlow,
    ];

    /// Flow statements accumulate over a period; the balance sheet is a snapshot.
    pub fn is_flow(&self) -> bool {
        !matches!(self, MetricOrigin::BalanceSheet)
    }
}

impl fmt::Display for MetricOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricOrigin::Income => "income statement",
            MetricOrigin::BalanceSheet => "balance sheet",
            MetricOrigin::CashFlow => "cash flow statement",
        };
        f.write_str(name)
    }
}

/// A raw field value as delivered by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
    /// Nested objects or arrays the provider attaches to a record; never numeric.
    Other(Value),
}

impl MetricValue {
    /// Numeric reading of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) if n.is_finite() => Some(*n),
            MetricValue::Text(s) => coerce_numeric(s),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawStatementRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    #[schemars(with = "Option<String>")]
    #[schemars(description = "Period end date in YYYY-MM-DD format, or the literal 'TTM' for trailing-twelve-month figures")]
    pub date: Option<String>,

    #[serde(default)]
    #[schemars(description = "Explicit fiscal/calendar year; takes precedence over the date year for annual labels")]
    pub calendar_year: Option<MetricValue>,

    #[serde(default, deserialize_with = "lenient_text")]
    #[schemars(with = "Option<String>")]
    #[schemars(description = "Provider period code such as 'FY', 'Q1' or 'TTM'")]
    pub period: Option<String>,

    #[serde(flatten)]
    #[schemars(description = "Metric id to value, e.g. {\"revenue\": 1000000}")]
    pub metrics: BTreeMap<String, MetricValue>,
}

/// Reads a string or number as text; any other JSON value becomes `None` so the
/// record is later reported as malformed instead of failing the whole request.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl RawStatementRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn ttm() -> Self {
        Self::new(TTM_LABEL)
    }

    pub fn with_calendar_year(mut self, year: i32) -> Self {
        self.calendar_year = Some(MetricValue::Number(f64::from(year)));
        self
    }

    pub fn with_metric(mut self, metric_id: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(metric_id.into(), value.into());
        self
    }

    pub fn is_ttm(&self) -> bool {
        let is_marker = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(TTM_LABEL))
        };
        is_marker(&self.date) || is_marker(&self.period)
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_record_date)
    }

    pub fn metric(&self, metric_id: &str) -> Option<f64> {
        self.metrics.get(metric_id).and_then(MetricValue::as_f64)
    }
}

/// The three statement collections for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementSet {
    #[serde(default)]
    pub income: Vec<RawStatementRecord>,
    #[serde(default)]
    pub balance_sheet: Vec<RawStatementRecord>,
    #[serde(default)]
    pub cash_flow: Vec<RawStatementRecord>,
}

impl StatementSet {
    pub fn records(&self, origin: MetricOrigin) -> &[RawStatementRecord] {
        match origin {
            MetricOrigin::Income => &self.income,
            MetricOrigin::BalanceSheet => &self.balance_sheet,
            MetricOrigin::CashFlow => &self.cash_flow,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatements {
    #[schemars(description = "Identifier of the reporting entity, usually a ticker symbol")]
    pub entity_id: String,

    #[serde(flatten)]
    pub statements: StatementSet,

    #[serde(default)]
    #[schemars(
        description = "Optional quarterly statements used only to derive a TTM row when a source has no explicit TTM record"
    )]
    pub ttm_basis: Option<StatementSet>,
}

impl EntityStatements {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    pub fn with_income(mut self, records: Vec<RawStatementRecord>) -> Self {
        self.statements.income = records;
        self
    }

    pub fn with_balance_sheet(mut self, records: Vec<RawStatementRecord>) -> Self {
        self.statements.balance_sheet = records;
        self
    }

    pub fn with_cash_flow(mut self, records: Vec<RawStatementRecord>) -> Self {
        self.statements.cash_flow = records;
        self
    }

    pub fn with_ttm_basis(mut self, basis: StatementSet) -> Self {
        self.ttm_basis = Some(basis);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRequest {
    pub entities: Vec<EntityStatements>,

    #[schemars(description = "Metric ids to merge, e.g. ['revenue', 'totalAssets', 'freeCashFlow']")]
    pub metrics: Vec<String>,

    #[serde(default)]
    pub period_type: PeriodType,

    #[serde(default)]
    pub range: RangeRequest,
}

impl TableRequest {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TableRequest)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Column key of one (entity, metric) pair in an [`AggregatedRow`].
pub fn column_key(entity_id: &str, metric_id: &str) -> String {
    format!("{}_{}", entity_id, metric_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedRow {
    pub period: String,

    #[schemars(description = "Values keyed '{entityId}_{metricId}'; null marks a period without data")]
    pub values: BTreeMap<String, Option<f64>>,
}

impl AggregatedRow {
    pub fn is_ttm(&self) -> bool {
        self.period == TTM_LABEL
    }

    pub fn value(&self, entity_id: &str, metric_id: &str) -> Option<f64> {
        self.values
            .get(&column_key(entity_id, metric_id))
            .copied()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableOutput {
    pub period_type: PeriodType,

    #[schemars(description = "Every known period, ascending, TTM last")]
    pub periods: Vec<String>,

    pub range: VisibleRange,

    pub rows: Vec<AggregatedRow>,

    #[schemars(description = "Growth statistics keyed '{entityId}_{metricId}'")]
    pub stats: BTreeMap<String, DerivedStats>,

    pub anomalies: Vec<Anomaly>,
}

impl TableOutput {
    pub fn visible_periods(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.period.as_str()).collect()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TableOutput)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}
