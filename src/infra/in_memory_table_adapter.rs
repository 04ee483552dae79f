use std::sync::{Arc, Mutex};

use crate::app::ports::{RecordSinkPort, RecordSourcePort};
use crate::domain::RawTable;
use crate::error::Result;

/// Serves a table held in memory; for tests and callers that already hold rows
pub struct InMemoryTableSource {
    table: RawTable,
}

impl InMemoryTableSource {
    pub fn new(table: RawTable) -> Self {
        Self { table }
    }

    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            fingerprint: None,
        })
    }
}

impl RecordSourcePort for InMemoryTableSource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<RawTable> {
        Ok(self.table.clone())
    }
}

/// Captures the written table. Clones share the same slot.
#[derive(Clone, Default)]
pub struct InMemoryTableSink {
    written: Arc<Mutex<Option<RawTable>>>,
}

impl InMemoryTableSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Option<RawTable> {
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RecordSinkPort for InMemoryTableSink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn write(&self, table: &RawTable) -> Result<()> {
        let mut slot = self
            .written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(table.clone());
        Ok(())
    }
}
