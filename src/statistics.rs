//! Growth statistics over a metric's chronological series.
//!
//! Statistics always use the full non-TTM history of a metric, so they do not
//! move when the visible window changes.

use crate::error::Anomaly;
use crate::periods::is_ttm;
use crate::utils::parse_year_label;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesPoint {
    pub period: String,
    pub value: f64,
}

/// (period, value) pairs, oldest first, TTM optionally last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricSeries {
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(period, value)| SeriesPoint {
                    period: period.into(),
                    value,
                })
                .collect(),
        }
    }

    pub fn push(&mut self, period: impl Into<String>, value: f64) {
        self.points.push(SeriesPoint {
            period: period.into(),
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points that count towards growth figures (everything but TTM).
    pub fn growth_basis(&self) -> Vec<&SeriesPoint> {
        self.points.iter().filter(|p| !is_ttm(&p.period)).collect()
    }

    pub fn ttm_value(&self) -> Option<f64> {
        self.points
            .iter()
            .find(|p| is_ttm(&p.period))
            .map(|p| p.value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub total_change_percent: Option<f64>,
    pub cagr_percent: Option<f64>,
}

/// Years spanned by a series: the difference of the first and last labels when
/// both are plain years, otherwise one per step between points.
pub fn years_spanned(first_period: &str, last_period: &str, point_count: usize) -> f64 {
    match (parse_year_label(first_period), parse_year_label(last_period)) {
        (Some(first), Some(last)) => (last - first) as f64,
        _ => point_count.saturating_sub(1) as f64,
    }
}

pub fn total_change_percent(first: f64, last: f64) -> Option<f64> {
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first.abs() * 100.0)
}

pub fn cagr_percent(first: f64, last: f64, years: f64) -> Option<f64> {
    if first <= 0.0 || last <= 0.0 || years <= 0.0 {
        return None;
    }
    let rate = ((last / first).powf(1.0 / years) - 1.0) * 100.0;
    rate.is_finite().then_some(rate)
}

pub fn compute_stats(series: &MetricSeries) -> DerivedStats {
    compute_stats_with_anomalies("series", series).0
}

/// Computes growth statistics and reports why a figure is missing, if it is.
pub fn compute_stats_with_anomalies(name: &str, series: &MetricSeries) -> (DerivedStats, Vec<Anomaly>) {
    let basis = series.growth_basis();
    let mut anomalies = Vec::new();

    let (first, last) = match (basis.first(), basis.last()) {
        (Some(first), Some(last)) if basis.len() >= 2 => (*first, *last),
        _ => {
            debug!("{}: {} growth points, statistics unavailable", name, basis.len());
            anomalies.push(Anomaly::InsufficientData {
                series: name.to_string(),
                points: basis.len(),
            });
            return (DerivedStats::default(), anomalies);
        }
    };

    if first.value <= 0.0 {
        debug!(
            "{}: base value {} in {} blocks growth statistics",
            name, first.value, first.period
        );
        anomalies.push(Anomaly::DegenerateBase {
            series: name.to_string(),
            base: first.value,
        });
    }

    let years = years_spanned(&first.period, &last.period, basis.len());
    let stats = DerivedStats {
        total_change_percent: total_change_percent(first.value, last.value),
        cagr_percent: cagr_percent(first.value, last.value, years),
    };

    (stats, anomalies)
}

pub struct StatisticsCalculator;

impl StatisticsCalculator {
    /// Statistics for every keyed series, e.g. one per `"{entityId}_{metricId}"` column.
    pub fn for_series(
        series: &BTreeMap<String, MetricSeries>,
    ) -> (BTreeMap<String, DerivedStats>, Vec<Anomaly>) {
        let mut stats = BTreeMap::new();
        let mut anomalies = Vec::new();

        for (key, values) in series {
            let (derived, mut notes) = compute_stats_with_anomalies(key, values);
            stats.insert(key.clone(), derived);
            anomalies.append(&mut notes);
        }

        (stats, anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let value = actual.expect("expected a value");
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            value
        );
    }

    #[test]
    fn test_two_year_growth() {
        let series = MetricSeries::from_pairs([("2020", 100.0), ("2021", 150.0)]);
        let stats = compute_stats(&series);
        assert_close(stats.total_change_percent, 50.0);
        assert_close(stats.cagr_percent, 50.0);
    }

    #[test]
    fn test_zero_base_has_no_total_change() {
        let series = MetricSeries::from_pairs([("2020", 0.0), ("2021", 150.0)]);
        let (stats, anomalies) = compute_stats_with_anomalies("AAA_revenue", &series);
        assert_eq!(stats.total_change_percent, None);
        assert_eq!(stats.cagr_percent, None);
        assert!(matches!(
            &anomalies[..],
            [Anomaly::DegenerateBase { series, base }] if series == "AAA_revenue" && *base == 0.0
        ));
        assert!(anomalies[0]
            .to_string()
            .ends_with("total change and CAGR unavailable"));
    }

    #[test]
    fn test_single_point_has_no_statistics() {
        let series = MetricSeries::from_pairs([("2023", 42.0)]);
        let (stats, anomalies) = compute_stats_with_anomalies("AAA_revenue", &series);
        assert_eq!(stats, DerivedStats::default());
        assert!(matches!(
            &anomalies[..],
            [Anomaly::InsufficientData { points: 1, .. }]
        ));
    }

    #[test]
    fn test_negative_base_uses_absolute_value_for_total_change() {
        let series = MetricSeries::from_pairs([("2020", -100.0), ("2022", 50.0)]);
        let (stats, anomalies) = compute_stats_with_anomalies("AAA_netIncome", &series);
        assert_close(stats.total_change_percent, 150.0);
        assert_eq!(stats.cagr_percent, None);

        assert_eq!(anomalies.len(), 1);
        let message = anomalies[0].to_string();
        assert!(message.contains("CAGR unavailable, total change still reported"));
    }

    #[test]
    fn test_negative_last_value_has_no_cagr() {
        let series = MetricSeries::from_pairs([("2020", 100.0), ("2022", -50.0)]);
        let stats = compute_stats(&series);
        assert_close(stats.total_change_percent, -150.0);
        assert_eq!(stats.cagr_percent, None);
    }

    #[test]
    fn test_ttm_is_excluded_from_growth() {
        let series = MetricSeries::from_pairs([("2019", 100.0), ("2023", 200.0), ("TTM", 1000.0)]);
        let stats = compute_stats(&series);
        assert_close(stats.total_change_percent, 100.0);
        // 2019 -> 2023 is four years
        assert_close(stats.cagr_percent, (2f64.powf(0.25) - 1.0) * 100.0);
        assert_eq!(series.ttm_value(), Some(1000.0));

        let only_ttm = MetricSeries::from_pairs([("2023", 100.0), ("TTM", 120.0)]);
        assert_eq!(compute_stats(&only_ttm), DerivedStats::default());
    }

    #[test]
    fn test_quarterly_labels_fall_back_to_point_count() {
        let series = MetricSeries::from_pairs([
            ("Mar 22", 100.0),
            ("Jun 22", 110.0),
            ("Sep 22", 121.0),
        ]);
        assert_eq!(years_spanned("Mar 22", "Sep 22", 3), 2.0);
        let stats = compute_stats(&series);
        assert_close(stats.total_change_percent, 21.0);
        assert_close(stats.cagr_percent, 10.0);
    }

    #[test]
    fn test_same_year_labels_have_no_cagr() {
        assert_eq!(cagr_percent(100.0, 150.0, 0.0), None);
        assert_eq!(years_spanned("2021", "2021", 2), 0.0);
    }

    #[test]
    fn test_calculator_keys_every_series() {
        let mut series = BTreeMap::new();
        series.insert(
            "AAA_revenue".to_string(),
            MetricSeries::from_pairs([("2020", 100.0), ("2021", 150.0)]),
        );
        series.insert("BBB_revenue".to_string(), MetricSeries::new());

        let (stats, anomalies) = StatisticsCalculator::for_series(&series);
        assert_eq!(stats.len(), 2);
        assert_close(stats["AAA_revenue"].total_change_percent, 50.0);
        assert_eq!(stats["BBB_revenue"], DerivedStats::default());
        assert_eq!(anomalies.len(), 1);
    }
}
