use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::{RecordSinkPort, RecordSourcePort};
use crate::constants::UTF8_BOM;
use crate::domain::RawTable;
use crate::error::{DedupError, Result};

/// Reads a comma-separated store table from disk
pub struct CsvTableSource {
    path: PathBuf,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSourcePort for CsvTableSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RawTable> {
        if !self.path.exists() {
            return Err(DedupError::InputNotFound(self.path.clone()));
        }

        let bytes = fs::read(&self.path)?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        let mut table = parse_csv(&bytes)?;
        table.fingerprint = Some(fingerprint);

        info!(
            "Loaded {} rows ({} columns, {} bytes) from {}",
            table.rows.len(),
            table.headers.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(table)
    }
}

/// Writes the table as BOM-prefixed UTF-8 CSV.
///
/// The file is written next to its destination and renamed into place, so an
/// aborted run never leaves a truncated artifact behind.
pub struct CsvTableSink {
    path: PathBuf,
}

impl CsvTableSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordSinkPort for CsvTableSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write(&self, table: &RawTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = render_csv(table)?;
        let staging = self.staging_path();
        if let Err(e) = fs::write(&staging, &bytes).and_then(|_| fs::rename(&staging, &self.path)) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        info!("Wrote {} rows to {}", table.rows.len(), self.path.display());
        Ok(())
    }
}

/// Parse CSV bytes with a header row. A leading UTF-8 byte-order mark is dropped.
pub fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let body = match bytes.strip_prefix(UTF8_BOM.as_bytes()) {
        Some(rest) => {
            debug!("Stripped UTF-8 byte-order mark");
            rest
        }
        None => bytes,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);

    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        headers,
        rows,
        fingerprint: None,
    })
}

/// Render the table as UTF-8 CSV prefixed with a byte-order mark
pub fn render_csv(table: &RawTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| DedupError::Io(e.into_error()))
}

/// True when both paths name the same file, whether or not it exists yet
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\u{feff}이름,주소,출처,매칭이유\nGS25 당산점,서울특별시 영등포구 당산로 1,kakao,1차매칭\n\"CU, 선유점\",서울 영등포구 선유로 10,naver,2차검증\n";

    #[test]
    fn test_parse_strips_bom_from_first_header() {
        let table = parse_csv(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["이름", "주소", "출처", "매칭이유"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], "CU, 선유점");
    }

    #[test]
    fn test_parse_without_bom() {
        let table = parse_csv("이름,주소\nA,B\n".as_bytes()).unwrap();
        assert_eq!(table.headers[0], "이름");
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = parse_csv("이름,주소\nA,B,C\n".as_bytes());
        assert!(matches!(result, Err(DedupError::Csv(_))));
    }

    #[test]
    fn test_render_prefixes_bom_and_quotes_commas() {
        let table = parse_csv(SAMPLE.as_bytes()).unwrap();
        let bytes = render_csv(&table).unwrap();

        assert!(bytes.starts_with(UTF8_BOM.as_bytes()));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"CU, 선유점\""));
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let dir = tempdir().unwrap();
        let source = CsvTableSource::new(dir.path().join("absent.csv"));

        assert!(matches!(source.load(), Err(DedupError::InputNotFound(_))));
    }

    #[test]
    fn test_source_fingerprints_and_sink_round_trips() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("matched_stores.csv");
        let output = dir.path().join("out").join("matched_stores_unique.csv");
        fs::write(&input, SAMPLE).unwrap();

        let table = CsvTableSource::new(&input).load().unwrap();
        let fingerprint = table.fingerprint.clone().unwrap();
        assert_eq!(fingerprint.len(), 64);

        CsvTableSink::new(&output).write(&table).unwrap();

        let written = fs::read(&output).unwrap();
        assert!(written.starts_with(UTF8_BOM.as_bytes()));
        assert!(!dir.path().join("out").join("matched_stores_unique.csv.tmp").exists());

        let reloaded = CsvTableSource::new(&output).load().unwrap();
        assert_eq!(reloaded.headers, table.headers);
        assert_eq!(reloaded.rows, table.rows);
    }

    #[test]
    fn test_failed_write_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("taken");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("keep.txt"), "x").unwrap();
        let table = parse_csv(SAMPLE.as_bytes()).unwrap();

        let result = CsvTableSink::new(&output).write(&table);

        assert!(matches!(result, Err(DedupError::Io(_))));
        assert!(!dir.path().join("taken.tmp").exists());
        assert!(output.join("keep.txt").exists());
    }

    #[test]
    fn test_same_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "x").unwrap();

        assert!(same_file(&path, &path));
        assert!(same_file(&path, &dir.path().join(".").join("a.csv")));
        assert!(!same_file(&path, &dir.path().join("b.csv")));
    }
}
