// Helpers for batched lookups: one query for many keys, answers lined up
// with the caller's keys.
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Distinct keys in first-seen order.
pub fn dedup_keys<K: Copy + Eq + Hash>(keys: &[K]) -> Vec<K> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().copied().filter(|key| seen.insert(*key)).collect()
}

/// Line rows up with `keys`: one slot per key, in key order, `None` where no
/// row matched. Duplicate keys each get their own copy of the row.
pub fn align_to_keys<K, V, F>(keys: &[K], rows: Vec<V>, key_of: F) -> Vec<Option<V>>
where
    K: Eq + Hash,
    V: Clone,
    F: Fn(&V) -> K,
{
    let by_key: HashMap<K, V> = rows.into_iter().map(|row| (key_of(&row), row)).collect();
    keys.iter().map(|key| by_key.get(key).cloned()).collect()
}
