use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::ports::{RecordSinkPort, RecordSourcePort};
use crate::app::report::DedupReport;
use crate::config::Config;
use crate::constants;
use crate::domain::StoreTable;
use crate::error::{DedupError, Result};
use crate::infra::csv_table_adapter::{same_file, CsvTableSink, CsvTableSource};
use crate::observability::metrics::{emit_counter, emit_gauge, emit_histogram, MetricName};
use crate::pipeline::processing::dedup::deduplicate;
use crate::pipeline::processing::diagnostics::{Diagnostics, PostDedupSummary};
use crate::pipeline::processing::normalize::AddressNormalizer;

/// Knobs of a dedup run that do not depend on where the table lives
#[derive(Debug, Clone)]
pub struct DedupSettings {
    pub districts: Vec<String>,
    pub secondary_reason: String,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            districts: vec![constants::DEFAULT_DISTRICT.to_string()],
            secondary_reason: constants::SECONDARY_VERIFICATION_REASON.to_string(),
        }
    }
}

impl From<&Config> for DedupSettings {
    fn from(config: &Config) -> Self {
        Self {
            districts: config.normalize.districts.clone(),
            secondary_reason: config.diagnostics.secondary_reason.clone(),
        }
    }
}

/// Load a store table, report on it, keep the first row per normalized
/// address and persist the result
pub struct DedupUseCase {
    normalizer: AddressNormalizer,
    secondary_reason: String,
    source: Box<dyn RecordSourcePort>,
    sink: Option<Box<dyn RecordSinkPort>>,
}

impl DedupUseCase {
    /// Without a sink the run is a preview: diagnostics only, nothing written.
    pub fn new(
        settings: &DedupSettings,
        source: Box<dyn RecordSourcePort>,
        sink: Option<Box<dyn RecordSinkPort>>,
    ) -> Self {
        Self {
            normalizer: AddressNormalizer::with_districts(&settings.districts),
            secondary_reason: settings.secondary_reason.clone(),
            source,
            sink,
        }
    }

    pub fn run(&self) -> Result<DedupReport> {
        let span = tracing::info_span!("dedup_run", source = %self.source.describe());
        let _enter = span.enter();

        let result = self.execute();
        match &result {
            Ok(report) => {
                emit_counter(MetricName::RunsSuccess, 1);
                info!(
                    "Dedup run finished: {} -> {} rows in {}ms",
                    report.before.total_rows, report.after.total_rows, report.duration_ms
                );
            }
            Err(e) => {
                emit_counter(MetricName::RunsError, 1);
                error!("Dedup run failed: {}", e);
            }
        }
        result
    }

    fn execute(&self) -> Result<DedupReport> {
        let started = Instant::now();

        let raw = self.source.load()?;
        let table = StoreTable::from_raw(raw, &self.normalizer)?;
        info!(
            rows = table.len(),
            address_key = ?table.address_key,
            "Store table loaded"
        );
        if table.unmatched_addresses > 0 {
            warn!(
                "{} addresses had no road pattern and were kept as written",
                table.unmatched_addresses
            );
        }

        let before = Diagnostics::collect(&table, &self.secondary_reason);
        self.emit_diagnostics(&before);

        let unique = table.with_records(deduplicate(table.records.clone()));
        let after = PostDedupSummary::collect(&table, &unique);
        info!(
            kept = after.total_rows,
            removed = after.removed_rows,
            "Deduplicated by normalized address"
        );

        let output = match &self.sink {
            Some(sink) => {
                sink.write(&unique.to_raw())?;
                Some(sink.describe())
            }
            None => None,
        };

        emit_counter(MetricName::RowsKept, after.total_rows as u64);
        emit_counter(MetricName::RowsRemoved, after.removed_rows as u64);

        let elapsed = started.elapsed();
        emit_histogram(MetricName::RunDuration, elapsed.as_secs_f64());

        Ok(DedupReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            input: self.source.describe(),
            output,
            input_sha256: table.fingerprint.clone(),
            address_key: table.address_key,
            before,
            after,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    fn emit_diagnostics(&self, diagnostics: &Diagnostics) {
        emit_counter(MetricName::RowsRead, diagnostics.total_rows as u64);
        emit_counter(MetricName::UnmatchedAddresses, diagnostics.unmatched_addresses as u64);
        emit_gauge(MetricName::DuplicateAddressRows, diagnostics.duplicate_address_rows as f64);
        emit_gauge(MetricName::DuplicateNameRows, diagnostics.duplicate_name_rows as f64);
        emit_gauge(MetricName::SecondaryOnlyRows, diagnostics.secondary_only.len() as f64);
        if let Some(coordinates) = &diagnostics.coordinates {
            emit_gauge(
                MetricName::CoordinatesOutOfBounds,
                coordinates.outside_seoul.len() as f64,
            );
        }
    }
}

/// Deduplicate the CSV at `input` into a new CSV at `output`.
pub fn run_dedup(input: &Path, output: &Path, settings: &DedupSettings) -> Result<DedupReport> {
    if same_file(input, output) {
        return Err(DedupError::Config(format!(
            "Output path '{}' must differ from the input",
            output.display()
        )));
    }

    DedupUseCase::new(
        settings,
        Box::new(CsvTableSource::new(input)),
        Some(Box::new(CsvTableSink::new(output))),
    )
    .run()
}

/// Diagnostics and a dedup preview for the CSV at `input`; writes nothing.
pub fn preview_dedup(input: &Path, settings: &DedupSettings) -> Result<DedupReport> {
    DedupUseCase::new(settings, Box::new(CsvTableSource::new(input)), None).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::in_memory_table_adapter::{InMemoryTableSink, InMemoryTableSource};

    const HEADERS: [&str; 4] = ["이름", "주소", "출처", "매칭이유"];

    fn use_case(rows: &[&[&str]], sink: &InMemoryTableSink) -> DedupUseCase {
        DedupUseCase::new(
            &DedupSettings::default(),
            Box::new(InMemoryTableSource::from_rows(&HEADERS, rows)),
            Some(Box::new(sink.clone())),
        )
    }

    #[test]
    fn test_two_spellings_of_one_address_collapse_to_first() {
        let sink = InMemoryTableSink::new();
        let report = use_case(
            &[
                &["GS25 당산점", "서울특별시 영등포구 당산로 1", "kakao", "1차매칭"],
                &["GS25 당산", "서울 영등포구 당산로 1", "naver", "2차검증"],
                &["CU 선유점", "서울 영등포구 선유로 10", "kakao", "1차매칭"],
            ],
            &sink,
        )
        .run()
        .unwrap();

        assert_eq!(report.before.total_rows, 3);
        assert_eq!(report.before.duplicate_address_rows, 2);
        assert_eq!(report.before.secondary_only.len(), 1);
        assert_eq!(report.after.total_rows, 2);
        assert_eq!(report.after.removed_rows, 1);
        assert_eq!(report.output.as_deref(), Some("memory"));

        let written = sink.written().unwrap();
        assert_eq!(written.rows.len(), 2);
        assert_eq!(written.rows[0][0], "GS25 당산점");
        assert_eq!(written.rows[1][0], "CU 선유점");
        assert_eq!(written.headers.last().map(String::as_str), Some("주소_정규화"));
    }

    #[test]
    fn test_missing_column_aborts_without_writing() {
        let sink = InMemoryTableSink::new();
        let use_case = DedupUseCase::new(
            &DedupSettings::default(),
            Box::new(InMemoryTableSource::from_rows(&["이름", "주소"], &[&["a", "b"]])),
            Some(Box::new(sink.clone())),
        );

        let result = use_case.run();

        assert!(matches!(result, Err(DedupError::MissingColumns(_))));
        assert!(sink.written().is_none());
    }

    #[test]
    fn test_preview_writes_nothing() {
        let use_case = DedupUseCase::new(
            &DedupSettings::default(),
            Box::new(InMemoryTableSource::from_rows(
                &HEADERS,
                &[&["a", "서울 영등포구 당산로 1", "kakao", "1차매칭"]],
            )),
            None,
        );

        let report = use_case.run().unwrap();

        assert!(report.output.is_none());
        assert_eq!(report.after.total_rows, 1);
    }

    #[test]
    fn test_report_renders_and_serializes() {
        let sink = InMemoryTableSink::new();
        let report = use_case(
            &[
                &["A", "서울 영등포구 당산로 1", "kakao", "2차검증"],
                &["B", "서울 영등포구 당산로 1", "kakao", "1차매칭"],
            ],
            &sink,
        )
        .run()
        .unwrap();

        let text = report.to_string();
        assert!(text.contains("Matched only by 2차검증"));
        assert!(text.contains("Unique stores: 1"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["address_key"], "computed");
        assert_eq!(json["after"]["removed_rows"], 1);
    }

    #[test]
    fn test_output_must_differ_from_input() {
        let path = Path::new("matched_stores.csv");
        let result = run_dedup(path, path, &DedupSettings::default());
        assert!(matches!(result, Err(DedupError::Config(_))));
    }
}
