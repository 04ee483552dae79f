use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::domain::AddressKeyOrigin;
use crate::error::Result;
use crate::pipeline::processing::diagnostics::{Diagnostics, PostDedupSummary, ValueCount};

/// Structured outcome of one dedup run
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub input: String,
    /// None for preview runs that do not persist a table
    pub output: Option<String>,
    pub input_sha256: Option<String>,
    pub address_key: AddressKeyOrigin,
    pub before: Diagnostics,
    pub after: PostDedupSummary,
    pub duration_ms: u64,
}

impl DedupReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const RULE_WIDTH: usize = 70;

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f)?;
    writeln!(f, "{}", rule)?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", rule)
}

fn counts(f: &mut fmt::Formatter<'_>, values: &[ValueCount]) -> fmt::Result {
    if values.is_empty() {
        return writeln!(f, "   (none)");
    }
    for value in values {
        writeln!(f, "   {}: {}", value.value, value.count)?;
    }
    Ok(())
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

impl fmt::Display for DedupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let before = &self.before;

        section(f, "📊 Overview")?;
        writeln!(f, "   Run: {}", self.run_id)?;
        writeln!(f, "   Input: {}", self.input)?;
        if let Some(sha) = &self.input_sha256 {
            writeln!(f, "   Input SHA-256: {}", sha)?;
        }
        writeln!(f, "   Total rows: {}", before.total_rows)?;
        writeln!(f, "\n   Rows by source:")?;
        counts(f, &before.by_source)?;

        section(f, "📊 Rows by match reason")?;
        counts(f, &before.by_match_reason)?;

        section(f, "📊 Duplicate analysis")?;
        let key_origin = match self.address_key {
            AddressKeyOrigin::InputColumn => "input column",
            AddressKeyOrigin::Computed => "computed",
        };
        writeln!(f, "   Address key: {}", key_origin)?;
        writeln!(f, "   Rows sharing a normalized address: {}", before.duplicate_address_rows)?;
        writeln!(f, "   Rows sharing a normalized name: {}", before.duplicate_name_rows)?;
        if before.unmatched_addresses > 0 {
            writeln!(f, "   Addresses kept as written (no road pattern): {}", before.unmatched_addresses)?;
        }

        section(f, &format!("🔍 Matched only by {}", before.secondary_reason))?;
        writeln!(f, "   Total: {}", before.secondary_only.len())?;
        for store in &before.secondary_only {
            writeln!(f, "   - {}", or_dash(&store.name))?;
            writeln!(f, "     Source: {}", or_dash(&store.source))?;
            writeln!(f, "     Address: {}", or_dash(&store.address))?;
        }

        if let Some(closure) = &before.closure {
            section(f, "🏪 Closure status")?;
            writeln!(f, "   Open: {}", closure.open)?;
            writeln!(f, "   Closed: {}", closure.closed)?;
            writeln!(f, "   Unknown: {}", closure.other)?;
            if let Some(rate) = closure.closure_rate {
                writeln!(f, "   Closure rate: {:.1}%", rate)?;
            }
        }

        if let Some(coordinates) = &before.coordinates {
            section(f, "📍 Coordinate check")?;
            writeln!(f, "   Checked: {}", coordinates.checked)?;
            writeln!(f, "   Missing: {}", coordinates.missing)?;
            writeln!(f, "   Unparseable: {}", coordinates.invalid)?;
            writeln!(f, "   Outside Seoul: {}", coordinates.outside_seoul.len())?;
            for store in &coordinates.outside_seoul {
                writeln!(
                    f,
                    "   ⚠️  row {} {} ({}, {})",
                    store.row,
                    or_dash(&store.name),
                    store.latitude,
                    store.longitude
                )?;
            }
        }

        section(f, "🎯 Deduplication (first row per normalized address)")?;
        writeln!(f, "   Unique stores: {}", self.after.total_rows)?;
        writeln!(f, "   Removed duplicates: {}", self.after.removed_rows)?;
        match &self.output {
            Some(output) => writeln!(f, "   Saved: {}", output)?,
            None => writeln!(f, "   Preview only, nothing written")?,
        }
        writeln!(f, "\n   Rows by source after deduplication:")?;
        counts(f, &self.after.by_source)
    }
}
