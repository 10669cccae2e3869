// Ordered union of two character sequences, keyed by id.

use std::collections::HashSet;

use crate::source::traits::Character;

/// Append `incoming` onto `existing`, skipping entries whose id is already
/// present. Relative order of both inputs is preserved; membership is a set
/// lookup so the merge is O(n + m).
///
/// The backend may return an item already seen on an earlier page when
/// inserts happen concurrently with paging; those duplicates are absorbed
/// here rather than treated as errors.
pub fn merge_dedup(existing: Vec<Character>, incoming: Vec<Character>) -> Vec<Character> {
    let mut seen: HashSet<String> = existing.iter().map(|c| c.id.clone()).collect();
    let mut merged = existing;
    merged.reserve(incoming.len());
    for entry in incoming {
        if seen.insert(entry.id.clone()) {
            merged.push(entry);
        }
    }
    merged
}
