use crate::metrics::is_additive;
use crate::schema::{MetricOrigin, MetricValue, RawStatementRecord};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

const QUARTERS_PER_YEAR: usize = 4;

/// Maximum distance between the oldest and newest of four consecutive quarter ends.
const MAX_TTM_SPAN_DAYS: i64 = 300;

/// Rolls the latest four quarterly records of one statement into a TTM record.
///
/// Flow statements sum additive metrics across the four quarters; the balance
/// sheet and non-additive metrics take the latest quarter's value. Returns
/// `None` when fewer than four dated quarters exist or they are not consecutive.
pub fn derive_ttm(origin: MetricOrigin, quarterly: &[RawStatementRecord]) -> Option<RawStatementRecord> {
    let mut dated: Vec<(NaiveDate, &RawStatementRecord)> = quarterly
        .iter()
        .filter(|r| !r.is_ttm())
        .filter_map(|r| r.parsed_date().map(|d| (d, r)))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.dedup_by_key(|(date, _)| *date);

    if dated.len() < QUARTERS_PER_YEAR {
        debug!(
            "Cannot derive {} TTM: {} dated quarters available",
            origin,
            dated.len()
        );
        return None;
    }

    let window = &dated[..QUARTERS_PER_YEAR];
    let span = (window[0].0 - window[QUARTERS_PER_YEAR - 1].0).num_days();
    if span > MAX_TTM_SPAN_DAYS {
        debug!(
            "Cannot derive {} TTM: latest quarters span {} days",
            origin, span
        );
        return None;
    }

    let metric_ids: BTreeSet<&String> = window.iter().flat_map(|(_, r)| r.metrics.keys()).collect();
    let latest = window[0].1;
    let mut ttm = RawStatementRecord::ttm();

    for id in metric_ids {
        let value = if origin.is_flow() && is_additive(id) {
            window
                .iter()
                .map(|(_, r)| r.metric(id))
                .sum::<Option<f64>>()
        } else {
            latest.metric(id)
        };

        if let Some(value) = value {
            ttm.metrics.insert(id.clone(), MetricValue::Number(value));
        }
    }

    debug!(
        "Derived {} TTM ending {} with {} metrics",
        origin,
        window[0].0,
        ttm.metrics.len()
    );

    Some(ttm)
}
