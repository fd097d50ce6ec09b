use crate::config::EngineConfig;
use crate::error::Anomaly;
use crate::metrics::metric_origin;
use crate::periods::{label_records, sort_periods_with_anomalies, TTM_LABEL};
use crate::range::{select_range, RangeRequest, VisibleRange};
use crate::schema::{column_key, AggregatedRow, EntityStatements, MetricOrigin, PeriodType, RawStatementRecord};
use crate::statistics::MetricSeries;
use crate::ttm::derive_ttm;
use log::debug;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One entity's statement records keyed by origin and period label.
pub struct EntityIndex<'a> {
    pub entity_id: &'a str,
    sources: HashMap<MetricOrigin, HashMap<String, Cow<'a, RawStatementRecord>>>,
}

impl<'a> EntityIndex<'a> {
    pub fn record(&self, origin: MetricOrigin, period: &str) -> Option<&RawStatementRecord> {
        self.sources
            .get(&origin)
            .and_then(|records| records.get(period))
            .map(|record| record.as_ref())
    }

    /// Numeric value of a metric in a period, read from the statement the metric belongs to.
    pub fn value(&self, metric_id: &str, period: &str) -> Option<f64> {
        self.record(metric_origin(metric_id), period)
            .and_then(|record| record.metric(metric_id))
    }

    /// Every period label present in at least one statement.
    pub fn periods(&self) -> BTreeSet<&str> {
        self.sources
            .values()
            .flat_map(|records| records.keys().map(String::as_str))
            .collect()
    }
}

/// Result of merging entities over a sorted timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    /// Union of every entity's periods, ascending, TTM last.
    pub periods: Vec<String>,
    pub range: VisibleRange,
    pub rows: Vec<AggregatedRow>,
    /// Full-history series per `"{entityId}_{metricId}"`, independent of the window.
    pub series: BTreeMap<String, MetricSeries>,
    pub anomalies: Vec<Anomaly>,
}

pub struct TableMerger<'a> {
    config: &'a EngineConfig,
}

impl<'a> TableMerger<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Indexes every source of one entity by period label, injecting a derived
    /// TTM record where a source has none and quarterly data allows it.
    pub fn index_entity<'e>(
        &self,
        entity: &'e EntityStatements,
        period_type: PeriodType,
        anomalies: &mut Vec<Anomaly>,
    ) -> EntityIndex<'e> {
        let mut sources = HashMap::new();

        for origin in MetricOrigin::ALL {
            let records = entity.statements.records(origin);
            let source_name = format!("{} {}", entity.entity_id, origin);
            let labelled = label_records(&source_name, records, period_type);
            anomalies.extend(labelled.anomalies);

            let mut by_period: HashMap<String, Cow<'e, RawStatementRecord>> = labelled
                .entries
                .into_iter()
                .map(|(label, record)| (label, Cow::Borrowed(record)))
                .collect();

            if self.config.derive_ttm && !by_period.contains_key(TTM_LABEL) {
                let basis = match (&entity.ttm_basis, period_type) {
                    (Some(basis), _) => Some(basis.records(origin)),
                    (None, PeriodType::Quarterly) => Some(records),
                    (None, PeriodType::Annual) => None,
                };

                if let Some(ttm) = basis.and_then(|b| derive_ttm(origin, b)) {
                    by_period.insert(TTM_LABEL.to_string(), Cow::Owned(ttm));
                }
            }

            sources.insert(origin, by_period);
        }

        EntityIndex {
            entity_id: &entity.entity_id,
            sources,
        }
    }

    pub fn merge(
        &self,
        entities: &[EntityStatements],
        metrics: &[String],
        period_type: PeriodType,
        range: &RangeRequest,
    ) -> MergedTable {
        let mut anomalies = Vec::new();

        let indexes: Vec<EntityIndex<'_>> = entities
            .iter()
            .map(|entity| self.index_entity(entity, period_type, &mut anomalies))
            .collect();

        let union: BTreeSet<&str> = indexes.iter().flat_map(|index| index.periods()).collect();
        let union: Vec<&str> = union.into_iter().collect();
        let (periods, mut ordering_anomalies) = sort_periods_with_anomalies(&union);
        anomalies.append(&mut ordering_anomalies);

        let selection = select_range(
            periods.len(),
            period_type,
            range,
            &self.config.default_windows(),
        );
        anomalies.extend(selection.anomaly);
        let range = selection.range;

        debug!(
            "Merging {} entities x {} metrics over {} periods, window [{}, {}]",
            entities.len(),
            metrics.len(),
            periods.len(),
            range.start,
            range.end
        );

        let fill = self.config.missing_value.fill();
        let rows = periods
            .iter()
            .enumerate()
            .filter(|(idx, _)| range.contains(*idx))
            .map(|(_, period)| {
                let values = indexes
                    .iter()
                    .flat_map(|index| {
                        metrics.iter().map(move |metric| {
                            let value = index.value(metric, period).or(fill);
                            (column_key(index.entity_id, metric), value)
                        })
                    })
                    .collect();
                AggregatedRow {
                    period: period.clone(),
                    values,
                }
            })
            .collect();

        let series = self.build_series(&indexes, metrics, &periods);

        MergedTable {
            periods,
            range,
            rows,
            series,
            anomalies,
        }
    }

    fn build_series(
        &self,
        indexes: &[EntityIndex<'_>],
        metrics: &[String],
        periods: &[String],
    ) -> BTreeMap<String, MetricSeries> {
        let mut series = BTreeMap::new();

        for index in indexes {
            for metric in metrics {
                let mut values = MetricSeries::new();
                for period in periods {
                    if let Some(value) = index.value(metric, period) {
                        values.push(period.clone(), value);
                    }
                }
                series.insert(column_key(index.entity_id, metric), values);
            }
        }

        series
    }
}
