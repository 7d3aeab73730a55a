use std::collections::BTreeMap;

use crate::models::record::Record;

/// Collapse a stream of same-kind records into the authoritative record per
/// business day, most recent day first.
///
/// Within a day the record with the highest `timestamp` wins; equal timestamps
/// are settled by `id`, so the result does not depend on input order.
pub fn reduce_to_latest_per_day(records: impl IntoIterator<Item = Record>) -> Vec<Record> {
    let mut latest: BTreeMap<String, Record> = BTreeMap::new();
    for record in records {
        match latest.get(&record.date_str) {
            Some(current) if !record.is_newer_than(current) => {}
            _ => {
                latest.insert(record.date_str.clone(), record);
            }
        }
    }
    latest.into_values().rev().collect()
}
