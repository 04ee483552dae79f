// Domain data shapes shared across layers

use serde::Serialize;

use crate::constants;
use crate::error::{DedupError, Result};
use crate::pipeline::processing::normalize::{normalize_name, AddressForm, AddressNormalizer};

/// A table as read from or written to storage: a header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// SHA-256 of the bytes the table was read from, when it came from a file
    pub fingerprint: Option<String>,
}

/// Where the address dedup key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKeyOrigin {
    /// The input already carried a `주소_정규화` column
    InputColumn,
    /// Computed from `주소` during load and appended on output
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn within_seoul(&self) -> bool {
        (constants::SEOUL_LAT_MIN..=constants::SEOUL_LAT_MAX).contains(&self.latitude)
            && (constants::SEOUL_LNG_MIN..=constants::SEOUL_LNG_MAX).contains(&self.longitude)
    }
}

/// Coordinate cells of a row, when the input has latitude/longitude columns
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateCell {
    Missing,
    Invalid(String),
    Point(Coordinates),
}

/// One collected store row with its derived dedup keys
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    /// Zero-based position in the input table
    pub row: usize,
    pub name: Option<String>,
    pub address: Option<String>,
    pub source: Option<String>,
    pub match_reason: Option<String>,
    pub status: Option<String>,
    pub coordinates: CoordinateCell,
    pub normalized_name: String,
    pub normalized_address: String,
    /// Every input cell in header order, written back out untouched
    pub raw: Vec<String>,
}

impl StoreRecord {
    /// Build a record from its four required fields with keys from the default normalizer.
    pub fn from_fields(
        row: usize,
        name: Option<&str>,
        address: Option<&str>,
        source: Option<&str>,
        match_reason: Option<&str>,
    ) -> Self {
        let raw = [name, address, source, match_reason]
            .iter()
            .map(|cell| cell.unwrap_or_default().to_string())
            .collect();

        Self {
            row,
            name: name.map(str::to_string),
            address: address.map(str::to_string),
            source: source.map(str::to_string),
            match_reason: match_reason.map(str::to_string),
            status: None,
            coordinates: CoordinateCell::Missing,
            normalized_name: normalize_name(name),
            normalized_address: crate::pipeline::processing::normalize::normalize_address(address),
            raw,
        }
    }
}

/// Positions of the columns the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnMap {
    name: usize,
    address: usize,
    source: usize,
    match_reason: usize,
    normalized_address: Option<usize>,
    normalized_name: Option<usize>,
    status: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);

        let missing: Vec<String> = constants::REQUIRED_COLUMNS
            .iter()
            .filter(|column| find(**column).is_none())
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DedupError::MissingColumns(missing));
        }

        let required = |column: &str| find(column).ok_or_else(|| DedupError::MissingColumns(vec![column.to_string()]));

        Ok(Self {
            name: required(constants::COL_NAME)?,
            address: required(constants::COL_ADDRESS)?,
            source: required(constants::COL_SOURCE)?,
            match_reason: required(constants::COL_MATCH_REASON)?,
            normalized_address: find(constants::COL_NORMALIZED_ADDRESS),
            normalized_name: find(constants::COL_NORMALIZED_NAME),
            status: find(constants::COL_STATUS),
            latitude: find(constants::COL_LATITUDE),
            longitude: find(constants::COL_LONGITUDE),
        })
    }

    fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// An empty cell is a missing value
fn cell(row: &[String], index: usize) -> Option<String> {
    row.get(index).filter(|value| !value.is_empty()).cloned()
}

fn coordinate_cell(row: &[String], columns: &ColumnMap) -> CoordinateCell {
    let (Some(lat_index), Some(lng_index)) = (columns.latitude, columns.longitude) else {
        return CoordinateCell::Missing;
    };

    match (cell(row, lat_index), cell(row, lng_index)) {
        (None, None) => CoordinateCell::Missing,
        (Some(lat), Some(lng)) => match (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => CoordinateCell::Point(Coordinates { latitude, longitude }),
            _ => CoordinateCell::Invalid(format!("{},{}", lat, lng)),
        },
        (lat, lng) => CoordinateCell::Invalid(format!(
            "{},{}",
            lat.unwrap_or_default(),
            lng.unwrap_or_default()
        )),
    }
}

/// The loaded store table with resolved columns and derived keys
#[derive(Debug, Clone)]
pub struct StoreTable {
    pub headers: Vec<String>,
    pub records: Vec<StoreRecord>,
    pub address_key: AddressKeyOrigin,
    /// Addresses that did not match the road pattern and were kept as written
    pub unmatched_addresses: usize,
    pub fingerprint: Option<String>,
    columns: ColumnMap,
}

impl StoreTable {
    /// Resolve columns and compute the normalized name/address of every row.
    ///
    /// Fails when any required column is absent; nothing else about a row is fatal.
    pub fn from_raw(raw: RawTable, normalizer: &AddressNormalizer) -> Result<Self> {
        let columns = ColumnMap::resolve(&raw.headers)?;
        let address_key = if columns.normalized_address.is_some() {
            AddressKeyOrigin::InputColumn
        } else {
            AddressKeyOrigin::Computed
        };

        let mut unmatched_addresses = 0;
        let mut records = Vec::with_capacity(raw.rows.len());

        for (row, cells) in raw.rows.into_iter().enumerate() {
            let name = cell(&cells, columns.name);
            let address = cell(&cells, columns.address);

            let normalized_address = match columns.normalized_address {
                Some(index) => cell(&cells, index).unwrap_or_default(),
                None => match normalizer.canonicalize(address.as_deref()) {
                    AddressForm::Empty => String::new(),
                    AddressForm::Canonical(value) => value,
                    AddressForm::Unmatched(value) => {
                        unmatched_addresses += 1;
                        value
                    }
                },
            };

            records.push(StoreRecord {
                row,
                normalized_name: normalize_name(name.as_deref()),
                normalized_address,
                source: cell(&cells, columns.source),
                match_reason: cell(&cells, columns.match_reason),
                status: columns.status.and_then(|index| cell(&cells, index)),
                coordinates: coordinate_cell(&cells, &columns),
                name,
                address,
                raw: cells,
            });
        }

        Ok(Self {
            headers: raw.headers,
            records,
            address_key,
            unmatched_addresses,
            fingerprint: raw.fingerprint,
            columns,
        })
    }

    /// Same schema, different rows
    pub fn with_records(&self, records: Vec<StoreRecord>) -> Self {
        Self {
            headers: self.headers.clone(),
            records,
            address_key: self.address_key,
            unmatched_addresses: self.unmatched_addresses,
            fingerprint: self.fingerprint.clone(),
            columns: self.columns,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_status_column(&self) -> bool {
        self.columns.status.is_some()
    }

    pub fn has_coordinate_columns(&self) -> bool {
        self.columns.has_coordinates()
    }

    /// Input columns in order, then `이름_정규화` (overwritten in place if the
    /// input had it) and `주소_정규화` when it was computed here.
    pub fn to_raw(&self) -> RawTable {
        let mut headers = self.headers.clone();
        if self.columns.normalized_name.is_none() {
            headers.push(constants::COL_NORMALIZED_NAME.to_string());
        }
        if self.address_key == AddressKeyOrigin::Computed {
            headers.push(constants::COL_NORMALIZED_ADDRESS.to_string());
        }

        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut cells = record.raw.clone();
                cells.resize(self.headers.len(), String::new());
                match self.columns.normalized_name {
                    Some(index) => cells[index] = record.normalized_name.clone(),
                    None => cells.push(record.normalized_name.clone()),
                }
                if self.address_key == AddressKeyOrigin::Computed {
                    cells.push(record.normalized_address.clone());
                }
                cells
            })
            .collect();

        RawTable {
            headers,
            rows,
            fingerprint: None,
        }
    }
}
