use std::collections::{HashMap, HashSet};

use crate::record::{canonical_amount, canonical_date, Transaction};

/// Same amount, same day, same vendor: a legitimate repeat purchase that
/// would otherwise collapse to one hash.
pub fn has_duplicates(records: &[Transaction]) -> bool {
    let mut seen = HashSet::new();
    records.iter().any(|record| !seen.insert(group_key(record)))
}

/// Disambiguate exact (date, amount, source) collisions within one imported
/// batch: every member of a colliding group gets a 1-based counter suffix
/// appended to `source`, in original order. Runs before hashing, so repeats
/// end up with distinct hashes. Singleton groups are left untouched.
pub fn deduplicate(records: &mut [Transaction]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records.iter() {
        *counts.entry(group_key(record)).or_default() += 1;
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for record in records.iter_mut() {
        let key = group_key(record);
        if counts[&key] > 1 {
            let n = seen.entry(key).or_default();
            *n += 1;
            record.source = format!("{} {}", record.source, n);
        }
    }
}

fn group_key(record: &Transaction) -> String {
    format!(
        "{}|{}|{}",
        canonical_date(record.date),
        canonical_amount(record.amount),
        record.source
    )
}
