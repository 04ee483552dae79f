use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::StoreRecord;

/// Keep the first record for every normalized address, in input order.
pub fn deduplicate(records: Vec<StoreRecord>) -> Vec<StoreRecord> {
    dedup_first_seen(records, |record| record.normalized_address.as_str())
}

/// Single linear scan that keeps the first item seen for each key.
///
/// Output order is input order, so callers choose the winner of a duplicate
/// group by ordering their input (e.g. authoritative sources first).
pub fn dedup_first_seen<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut first_seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut kept = Vec::with_capacity(items.len());

    for (position, item) in items.into_iter().enumerate() {
        let item_key = key(&item);
        if let Some(&first) = first_seen.get(item_key) {
            debug!(position, first, key = item_key, "Dropping duplicate");
            continue;
        }
        first_seen.insert(item_key.to_string(), position);
        kept.push(item);
    }

    kept
}
