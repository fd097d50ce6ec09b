use crate::config::EngineConfig;
use crate::error::Result;
use crate::merger::TableMerger;
use crate::schema::{TableOutput, TableRequest};
use crate::statistics::StatisticsCalculator;
use log::{debug, info};

#[derive(Debug, Default)]
pub struct FinancialTableEngine {
    config: EngineConfig,
}

impl FinancialTableEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline: label, sort, window, merge and compute statistics.
    ///
    /// Never fails; malformed input surfaces as `anomalies` on the output and as
    /// empty cells or missing statistics.
    pub fn process(&self, request: &TableRequest) -> TableOutput {
        info!(
            "Building {:?} table for {} entities and {} metrics",
            request.period_type,
            request.entities.len(),
            request.metrics.len()
        );

        let merger = TableMerger::new(&self.config);
        let merged = merger.merge(
            &request.entities,
            &request.metrics,
            request.period_type,
            &request.range,
        );

        let (stats, stat_anomalies) = StatisticsCalculator::for_series(&merged.series);

        let mut anomalies = merged.anomalies;
        anomalies.extend(stat_anomalies);

        if !anomalies.is_empty() {
            debug!("Table built with {} anomalies", anomalies.len());
            for anomaly in &anomalies {
                debug!("Anomaly: {}", anomaly);
            }
        }

        TableOutput {
            period_type: request.period_type,
            periods: merged.periods,
            range: merged.range,
            rows: merged.rows,
            stats,
            anomalies,
        }
    }

    /// JSON in, JSON out. Only malformed request JSON is an error.
    pub fn process_json(&self, request_json: &str) -> Result<String> {
        let request: TableRequest = serde_json::from_str(request_json)?;
        let output = self.process(&request);
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
