//! Period labels: extraction from raw records and chronological ordering.
//!
//! Annual labels are four-digit years (`"2023"`), quarterly labels are
//! `"{Mon} {YY}"` (`"Mar 23"`). The trailing-twelve-month label `"TTM"` is
//! produced for any record carrying the TTM marker and always sorts last.

use crate::error::Anomaly;
use crate::schema::{MetricValue, PeriodType, RawStatementRecord};
use crate::utils::{parse_four_digit_year, parse_quarter_label, parse_year_label, quarter_label};
use chrono::Datelike;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::HashSet;

pub const TTM_LABEL: &str = "TTM";

/// Sort key of a period label.
///
/// Variant order is the chronological order across formats: plain years,
/// then month labels, then unrecognised labels (lexical), then TTM.
/// Unrecognised labels therefore do not interleave with recognised ones the way
/// a plain lexical comparison would (`"2020Q1"` sorts after `"2021"`); each one
/// is reported as [`Anomaly::UnorderedLabel`] instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodKey {
    Year(i64),
    Month { year: u32, month: u32 },
    Other(String),
    Ttm,
}

impl PeriodKey {
    pub fn parse(label: &str) -> Self {
        if label == TTM_LABEL {
            return PeriodKey::Ttm;
        }
        if let Some(year) = parse_year_label(label) {
            return PeriodKey::Year(year);
        }
        if let Some((year, month)) = parse_quarter_label(label) {
            return PeriodKey::Month { year, month };
        }
        PeriodKey::Other(label.to_string())
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, PeriodKey::Other(_))
    }
}

pub fn is_ttm(label: &str) -> bool {
    label == TTM_LABEL
}

/// Total order over period labels with TTM forced last.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    PeriodKey::parse(a).cmp(&PeriodKey::parse(b))
}

pub fn sort_periods<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    sort_periods_with_anomalies(labels).0
}

/// Sorts labels ascending, reporting every label that could only be placed lexically.
pub fn sort_periods_with_anomalies<S: AsRef<str>>(labels: &[S]) -> (Vec<String>, Vec<Anomaly>) {
    let mut keyed: Vec<(PeriodKey, String)> = labels
        .iter()
        .map(|l| (PeriodKey::parse(l.as_ref()), l.as_ref().to_string()))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let anomalies: Vec<Anomaly> = keyed
        .iter()
        .filter(|(key, _)| !key.is_recognised())
        .map(|(_, label)| {
            warn!(
                "Period label '{}' matches no known format; ordering it lexically",
                label
            );
            Anomaly::UnorderedLabel {
                label: label.clone(),
            }
        })
        .collect();

    (keyed.into_iter().map(|(_, label)| label).collect(), anomalies)
}

/// Canonical label of one record, or `None` when its period cannot be read.
pub fn period_label(record: &RawStatementRecord, period_type: PeriodType) -> Option<String> {
    if record.is_ttm() {
        return Some(TTM_LABEL.to_string());
    }

    match period_type {
        PeriodType::Annual => explicit_year(record)
            .or_else(|| {
                record
                    .parsed_date()
                    .map(|d| d.year())
                    .filter(|y| (1000..=9999).contains(y))
            })
            .or_else(|| record.date.as_deref().and_then(parse_four_digit_year))
            .map(|year| year.to_string()),
        PeriodType::Quarterly => record.parsed_date().map(quarter_label),
    }
}

fn explicit_year(record: &RawStatementRecord) -> Option<i32> {
    match record.calendar_year.as_ref()? {
        MetricValue::Number(n) if n.fract() == 0.0 && (1000.0..=9999.0).contains(n) => {
            Some(*n as i32)
        }
        MetricValue::Text(s) => parse_four_digit_year(s),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodExtraction {
    /// Unique labels in first-seen order.
    pub labels: Vec<String>,
    pub anomalies: Vec<Anomaly>,
}

/// Records of one source keyed by their period label.
#[derive(Debug, Clone, Default)]
pub struct LabelledRecords<'a> {
    /// One entry per unique label in first-seen order; later duplicates are dropped.
    pub entries: Vec<(String, &'a RawStatementRecord)>,
    pub anomalies: Vec<Anomaly>,
}

pub fn extract_periods(records: &[RawStatementRecord], period_type: PeriodType) -> Vec<String> {
    extract_periods_from("records", records, period_type).labels
}

/// Extracts deduplicated labels from one source, skipping records whose
/// period cannot be parsed.
pub fn extract_periods_from(
    source_name: &str,
    records: &[RawStatementRecord],
    period_type: PeriodType,
) -> PeriodExtraction {
    let labelled = label_records(source_name, records, period_type);
    PeriodExtraction {
        labels: labelled.entries.iter().map(|(label, _)| label.clone()).collect(),
        anomalies: labelled.anomalies,
    }
}

pub fn label_records<'a>(
    source_name: &str,
    records: &'a [RawStatementRecord],
    period_type: PeriodType,
) -> LabelledRecords<'a> {
    let mut seen = HashSet::new();
    let mut labelled = LabelledRecords::default();

    for record in records {
        match period_label(record, period_type) {
            Some(label) => {
                if seen.insert(label.clone()) {
                    labelled.entries.push((label, record));
                } else {
                    debug!(
                        "Ignoring duplicate {} record for period {}",
                        source_name, label
                    );
                }
            }
            None => {
                warn!(
                    "Skipping {} record with unparsable period (date: {:?})",
                    source_name, record.date
                );
                labelled.anomalies.push(Anomaly::MalformedPeriod {
                    source_name: source_name.to_string(),
                    date: record.date.clone(),
                });
            }
        }
    }

    debug!(
        "Labelled {} {:?} periods from {} {} records",
        labelled.entries.len(),
        period_type,
        records.len(),
        source_name
    );

    labelled
}
