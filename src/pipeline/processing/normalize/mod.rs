use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants;

/// A road name (ending in 로, 길 or 대로, optionally followed by a numbered
/// sub-road such as 당산로47길) and its building number, with an optional
/// hyphenated sub-number.
static ROAD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([가-힣]+(?:로|길|대로)[0-9가-힣]*)\s*(\d+(?:-\d+)?)")
        .expect("road pattern is a valid regex")
});

static DEFAULT_NORMALIZER: Lazy<AddressNormalizer> = Lazy::new(AddressNormalizer::default);

/// Lowercase, trim, and strip every space, hyphen and underscore.
///
/// Missing names normalize to the empty string.
pub fn normalize_name(name: Option<&str>) -> String {
    match name {
        Some(name) => name.trim().to_lowercase().replace([' ', '-', '_'], ""),
        None => String::new(),
    }
}

/// Canonical `"서울 <district> <road> <number>"` form of an address using the
/// default district list. See [`AddressNormalizer::normalize`].
pub fn normalize_address(address: Option<&str>) -> String {
    DEFAULT_NORMALIZER.normalize(address)
}

/// Result of canonicalizing one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressForm {
    /// Missing or blank input
    Empty,
    /// Road pattern found; canonical form produced
    Canonical(String),
    /// No road pattern; the trimmed input is kept as written
    Unmatched(String),
}

impl AddressForm {
    pub fn into_string(self) -> String {
        match self {
            AddressForm::Empty => String::new(),
            AddressForm::Canonical(value) | AddressForm::Unmatched(value) => value,
        }
    }
}

/// Address canonicalizer with a configurable set of district qualifiers
#[derive(Debug, Clone)]
pub struct AddressNormalizer {
    districts: Vec<String>,
}

impl Default for AddressNormalizer {
    fn default() -> Self {
        Self::with_districts([constants::DEFAULT_DISTRICT])
    }
}

impl AddressNormalizer {
    /// Blank entries are ignored; an empty list disables district extraction.
    pub fn with_districts<I, S>(districts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let districts = districts
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self { districts }
    }

    pub fn districts(&self) -> &[String] {
        &self.districts
    }

    pub fn normalize(&self, address: Option<&str>) -> String {
        self.canonicalize(address).into_string()
    }

    pub fn canonicalize(&self, address: Option<&str>) -> AddressForm {
        let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            return AddressForm::Empty;
        };

        let shortened = constants::CITY_LONG_FORMS
            .iter()
            .fold(address.to_string(), |acc, long| acc.replace(long, constants::CITY_SHORT));

        let Some(captures) = ROAD_PATTERN.captures(&shortened) else {
            return AddressForm::Unmatched(address.to_string());
        };

        let district = self.find_district(&shortened).unwrap_or("");
        let canonical = format!(
            "{} {} {} {}",
            constants::CITY_SHORT,
            district,
            &captures[1],
            &captures[2]
        );

        AddressForm::Canonical(canonical.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// The configured district that occurs earliest in the address
    fn find_district(&self, address: &str) -> Option<&str> {
        self.districts
            .iter()
            .filter_map(|d| address.find(d.as_str()).map(|pos| (pos, d.as_str())))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, d)| d)
    }
}
