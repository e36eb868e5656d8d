use std::collections::BTreeMap;

use crate::model::InsightRecord;

/// Group records by a key that may be absent. Records whose key is `None`
/// are skipped entirely rather than collected under a sentinel.
///
/// Keys are ordered, so iterating the result is independent of input order.
pub fn group_by<'a, K, F>(records: &'a [InsightRecord], key: F) -> BTreeMap<K, Vec<&'a InsightRecord>>
where
    K: Ord,
    F: Fn(&'a InsightRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a InsightRecord>> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().push(record);
        }
    }
    groups
}

/// Count records per key, skipping records without one.
pub fn count_by<'a, K, F>(records: &'a [InsightRecord], key: F) -> BTreeMap<K, u64>
where
    K: Ord,
    F: Fn(&'a InsightRecord) -> Option<K>,
{
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            *counts.entry(k).or_default() += 1;
        }
    }
    counts
}
