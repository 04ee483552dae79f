use serde::Serialize;
use std::collections::HashMap;

use crate::constants;
use crate::domain::{CoordinateCell, StoreTable};

/// Occurrences of one categorical value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// A record that was matched only through the secondary verification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryMatch {
    pub row: usize,
    pub name: Option<String>,
    pub source: Option<String>,
    pub address: Option<String>,
}

/// Open/closed split from the closure-detection status column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureStats {
    pub open: usize,
    pub closed: usize,
    /// Rows with a missing or unrecognized status
    pub other: usize,
    /// Percentage of closed stores among rows with a known status
    pub closure_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutOfBoundsStore {
    pub row: usize,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordinate sanity check against the Seoul bounding box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateCheck {
    pub checked: usize,
    pub missing: usize,
    pub invalid: usize,
    pub outside_seoul: Vec<OutOfBoundsStore>,
}

/// Everything reported about the table before deduplication
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub total_rows: usize,
    pub by_source: Vec<ValueCount>,
    pub by_match_reason: Vec<ValueCount>,
    /// Rows whose normalized address is shared with at least one other row
    pub duplicate_address_rows: usize,
    /// Rows whose normalized name is shared with at least one other row
    pub duplicate_name_rows: usize,
    pub secondary_reason: String,
    pub secondary_only: Vec<SecondaryMatch>,
    pub unmatched_addresses: usize,
    pub closure: Option<ClosureStats>,
    pub coordinates: Option<CoordinateCheck>,
}

impl Diagnostics {
    pub fn collect(table: &StoreTable, secondary_reason: &str) -> Self {
        let records = &table.records;

        let secondary_only = records
            .iter()
            .filter(|r| r.match_reason.as_deref() == Some(secondary_reason))
            .map(|r| SecondaryMatch {
                row: r.row,
                name: r.name.clone(),
                source: r.source.clone(),
                address: r.address.clone(),
            })
            .collect();

        Self {
            total_rows: records.len(),
            by_source: value_counts(records.iter().map(|r| r.source.as_deref())),
            by_match_reason: value_counts(records.iter().map(|r| r.match_reason.as_deref())),
            duplicate_address_rows: duplicated_rows(records.iter().map(|r| r.normalized_address.as_str())),
            duplicate_name_rows: duplicated_rows(records.iter().map(|r| r.normalized_name.as_str())),
            secondary_reason: secondary_reason.to_string(),
            secondary_only,
            unmatched_addresses: table.unmatched_addresses,
            closure: table.has_status_column().then(|| closure_stats(table)),
            coordinates: table.has_coordinate_columns().then(|| coordinate_check(table)),
        }
    }
}

/// Row count and source distribution after deduplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDedupSummary {
    pub total_rows: usize,
    pub removed_rows: usize,
    pub by_source: Vec<ValueCount>,
}

impl PostDedupSummary {
    pub fn collect(before: &StoreTable, after: &StoreTable) -> Self {
        Self {
            total_rows: after.len(),
            removed_rows: before.len().saturating_sub(after.len()),
            by_source: value_counts(after.records.iter().map(|r| r.source.as_deref())),
        }
    }
}

/// Count non-missing values, most frequent first; ties keep first-seen order.
pub fn value_counts<'a, I>(values: I) -> Vec<ValueCount>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in values.into_iter().flatten() {
        if let Some(&i) = index.get(value) {
            counts[i].count += 1;
            continue;
        }
        index.insert(value, counts.len());
        counts.push(ValueCount {
            value: value.to_string(),
            count: 1,
        });
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Number of rows whose key occurs more than once (every member of a group counts).
pub fn duplicated_rows<'a, I>(keys: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: HashMap<&'a str, usize> = HashMap::new();
    for key in keys {
        *groups.entry(key).or_insert(0) += 1;
    }
    groups.values().filter(|&&n| n > 1).sum()
}

fn closure_stats(table: &StoreTable) -> ClosureStats {
    let mut stats = ClosureStats {
        open: 0,
        closed: 0,
        other: 0,
        closure_rate: None,
    };

    for record in &table.records {
        match record.status.as_deref().map(str::trim) {
            Some(constants::STATUS_OPEN) => stats.open += 1,
            Some(constants::STATUS_CLOSED) => stats.closed += 1,
            _ => stats.other += 1,
        }
    }

    let known = stats.open + stats.closed;
    if known > 0 {
        stats.closure_rate = Some(stats.closed as f64 * 100.0 / known as f64);
    }
    stats
}

fn coordinate_check(table: &StoreTable) -> CoordinateCheck {
    let mut check = CoordinateCheck {
        checked: 0,
        missing: 0,
        invalid: 0,
        outside_seoul: Vec::new(),
    };

    for record in &table.records {
        match &record.coordinates {
            CoordinateCell::Missing => check.missing += 1,
            CoordinateCell::Invalid(_) => check.invalid += 1,
            CoordinateCell::Point(point) => {
                check.checked += 1;
                if !point.within_seoul() {
                    check.outside_seoul.push(OutOfBoundsStore {
                        row: record.row,
                        name: record.name.clone(),
                        latitude: point.latitude,
                        longitude: point.longitude,
                    });
                }
            }
        }
    }

    check
}
