//! Metrics for dedup runs
//!
//! Every metric name lives in [`MetricName`] so no magic strings leak into the
//! pipeline. Recording goes through the `metrics` facade, which is a no-op
//! until [`MetricsRecorder::install`] is called.

use std::fmt;
use std::fs;
use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::{DedupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Run lifecycle
    RunsSuccess,
    RunsError,
    RunDuration,

    // Table shape
    RowsRead,
    RowsKept,
    RowsRemoved,

    // Diagnostics
    DuplicateAddressRows,
    DuplicateNameRows,
    SecondaryOnlyRows,
    UnmatchedAddresses,
    CoordinatesOutOfBounds,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsSuccess => "store_dedup_runs_success_total",
            MetricName::RunsError => "store_dedup_runs_error_total",
            MetricName::RunDuration => "store_dedup_run_duration_seconds",
            MetricName::RowsRead => "store_dedup_rows_read_total",
            MetricName::RowsKept => "store_dedup_rows_kept_total",
            MetricName::RowsRemoved => "store_dedup_rows_removed_total",
            MetricName::DuplicateAddressRows => "store_dedup_duplicate_address_rows",
            MetricName::DuplicateNameRows => "store_dedup_duplicate_name_rows",
            MetricName::SecondaryOnlyRows => "store_dedup_secondary_only_rows",
            MetricName::UnmatchedAddresses => "store_dedup_unmatched_addresses_total",
            MetricName::CoordinatesOutOfBounds => "store_dedup_coordinates_out_of_bounds",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RunsSuccess,
            RunsError,
            RunDuration,
            RowsRead,
            RowsKept,
            RowsRemoved,
            DuplicateAddressRows,
            DuplicateNameRows,
            SecondaryOnlyRows,
            UnmatchedAddresses,
            CoordinatesOutOfBounds,
        ]
        .into_iter()
    }

    /// (phase, description, kind)
    pub fn metadata(&self) -> (&'static str, &'static str, MetricKind) {
        match self {
            MetricName::RunsSuccess => ("run", "Completed dedup runs", MetricKind::Counter),
            MetricName::RunsError => ("run", "Aborted dedup runs", MetricKind::Counter),
            MetricName::RunDuration => ("run", "Wall time of a dedup run", MetricKind::Histogram),
            MetricName::RowsRead => ("table", "Rows read from the input table", MetricKind::Counter),
            MetricName::RowsKept => ("table", "Rows kept after deduplication", MetricKind::Counter),
            MetricName::RowsRemoved => ("table", "Rows dropped as duplicates", MetricKind::Counter),
            MetricName::DuplicateAddressRows => ("diagnostics", "Rows sharing a normalized address", MetricKind::Gauge),
            MetricName::DuplicateNameRows => ("diagnostics", "Rows sharing a normalized name", MetricKind::Gauge),
            MetricName::SecondaryOnlyRows => ("diagnostics", "Rows matched only by secondary verification", MetricKind::Gauge),
            MetricName::UnmatchedAddresses => ("diagnostics", "Addresses kept as written (no road pattern)", MetricKind::Counter),
            MetricName::CoordinatesOutOfBounds => ("diagnostics", "Rows with coordinates outside Seoul", MetricKind::Gauge),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

pub fn emit_counter(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

pub fn emit_histogram(name: MetricName, value: f64) {
    ::metrics::histogram!(name.as_str()).record(value);
}

/// Register descriptions for every metric with the installed recorder
pub fn describe_all() {
    for name in MetricName::all_metrics() {
        let (_, description, kind) = name.metadata();
        match kind {
            MetricKind::Counter => ::metrics::describe_counter!(name.as_str(), description),
            MetricKind::Gauge => ::metrics::describe_gauge!(name.as_str(), description),
            MetricKind::Histogram => ::metrics::describe_histogram!(name.as_str(), description),
        }
    }
}

/// Process-wide Prometheus recorder whose snapshot is written as a textfile after a run
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| DedupError::Metrics(format!("Failed to install Prometheus recorder: {}", e)))?;
        describe_all();
        info!("Metrics recorder installed");
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the text exposition format, e.g. for a node_exporter textfile collector
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        info!("Metrics written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();

        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("store_dedup_")));
    }

    #[test]
    fn test_counters_render_in_exposition() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            emit_counter(MetricName::RowsRead, 3);
            emit_gauge(MetricName::DuplicateAddressRows, 2.0);
        });

        let rendered = handle.render();
        assert!(rendered.contains("store_dedup_rows_read_total 3"));
        assert!(rendered.contains("store_dedup_duplicate_address_rows 2"));
    }
}
