use std::collections::HashSet;

use crate::dedup;
use crate::record::{sort_ledger, Transaction};
use crate::store::{ledger_to_table, table_to_ledger, SheetStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Size of the incoming batch after within-batch dedup.
    pub imported: usize,
    /// Rows that were genuinely new (not already persisted upstream).
    pub added: usize,
    /// Final row count of the persisted collection.
    pub total: usize,
}

/// Merge a freshly imported batch into the persisted collection.
///
/// The batch is disambiguated, stamped with its provider and hashed; the
/// upstream collection is fetched once, the two sets are unioned with upstream
/// winning on any hash collision (so manual edits survive a re-import of the
/// same statement), and the result is written back sorted, fully replacing the
/// worksheet. One read, one write; a write failure leaves upstream untouched
/// and propagates.
pub fn commit(
    mut batch: Vec<Transaction>,
    provider: &str,
    worksheet: &str,
    store: &mut dyn SheetStore,
) -> Result<CommitSummary, StoreError> {
    if dedup::has_duplicates(&batch) {
        dedup::deduplicate(&mut batch);
    }

    for record in batch.iter_mut() {
        record.provider = provider.to_string();
        record.hash = record.content_hash();
    }
    let imported = batch.len();

    let upstream = table_to_ledger(&store.read(worksheet)?)?;

    // Rows a human has overridden upstream are never replaced by a re-import.
    let overridden: HashSet<String> = upstream
        .iter()
        .filter(|r| r.overridden)
        .map(|r| r.hash.clone())
        .collect();
    batch.retain(|r| !overridden.contains(&r.hash));

    // Union with upstream first: on a hash collision the previously persisted
    // (possibly hand-edited) row wins.
    let upstream_len = upstream.len();
    let mut merged = upstream;
    merged.extend(batch);

    let mut seen = HashSet::new();
    merged.retain(|r| seen.insert(r.hash.clone()));

    sort_ledger(&mut merged);

    let total = merged.len();
    store.replace(worksheet, &ledger_to_table(&merged))?;

    let summary = CommitSummary { imported, added: total - upstream_len, total };
    tracing::info!(
        worksheet,
        provider,
        imported = summary.imported,
        added = summary.added,
        total = summary.total,
        "committed batch"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn tx(day: u32, amount: &str, source: &str) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            Decimal::from_str(amount).unwrap(),
            source,
        )
    }

    fn persisted(store: &MemoryStore, worksheet: &str) -> Vec<Transaction> {
        table_to_ledger(&store.read(worksheet).unwrap()).unwrap()
    }

    #[test]
    fn commit_into_empty_collection() {
        let mut store = MemoryStore::new();
        let summary = commit(
            vec![tx(5, "-5.00", "Cafe"), tx(6, "-80.00", "Groceries")],
            "HSBC",
            "credit",
            &mut store,
        )
        .unwrap();

        assert_eq!(summary, CommitSummary { imported: 2, added: 2, total: 2 });
        let rows = persisted(&store, "credit");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.provider == "HSBC"));
        assert!(rows.iter().all(|r| r.hash.len() == 64));
    }

    #[test]
    fn commit_is_idempotent() {
        let batch = vec![tx(5, "-5.00", "Cafe"), tx(6, "-80.00", "Groceries")];
        let mut store = MemoryStore::new();

        commit(batch.clone(), "HSBC", "credit", &mut store).unwrap();
        let after_first = store.read("credit").unwrap();

        let summary = commit(batch, "HSBC", "credit", &mut store).unwrap();
        assert_eq!(summary.added, 0);
        assert_eq!(store.read("credit").unwrap(), after_first);
    }

    #[test]
    fn upstream_wins_on_hash_collision() {
        let mut store = MemoryStore::new();

        let mut first = tx(5, "-5.00", "Cafe");
        first.topcat = Some("eats".into());
        commit(vec![first], "HSBC", "credit", &mut store).unwrap();

        // Re-import the same transaction with a different category.
        let mut again = tx(5, "-5.00", "Cafe");
        again.topcat = Some("bills".into());
        commit(vec![again], "HSBC", "credit", &mut store).unwrap();

        let rows = persisted(&store, "credit");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topcat.as_deref(), Some("eats"));
    }

    #[test]
    fn override_survives_reimport() {
        let mut store = MemoryStore::new();

        let mut edited = tx(5, "-120.00", "AGL ENERGY");
        edited.topcat = Some("bills".into());
        edited.overridden = true;
        commit(vec![edited], "BOM", "offset", &mut store).unwrap();

        let mut reimport = tx(5, "-120.00", "AGL ENERGY");
        reimport.topcat = Some("transfer".into());
        commit(vec![reimport], "BOM", "offset", &mut store).unwrap();

        let rows = persisted(&store, "offset");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topcat.as_deref(), Some("bills"));
        assert!(rows[0].overridden);
    }

    #[test]
    fn within_batch_duplicates_get_distinct_hashes() {
        let mut store = MemoryStore::new();
        let batch = vec![tx(5, "-5.00", "Cafe"), tx(5, "-5.00", "Cafe")];
        let summary = commit(batch, "HSBC", "credit", &mut store).unwrap();
        assert_eq!(summary.total, 2);

        let rows = persisted(&store, "credit");
        let mut sources: Vec<&str> = rows.iter().map(|r| r.source.as_str()).collect();
        sources.sort();
        assert_eq!(sources, vec!["Cafe 1", "Cafe 2"]);
        assert_ne!(rows[0].hash, rows[1].hash);
    }

    #[test]
    fn merged_ledger_is_sorted_descending() {
        let mut store = MemoryStore::new();
        commit(
            vec![tx(3, "-1.00", "a"), tx(9, "-2.00", "b")],
            "HSBC",
            "credit",
            &mut store,
        )
        .unwrap();
        commit(
            vec![tx(7, "-3.00", "c"), tx(9, "-4.00", "d")],
            "HSBC",
            "credit",
            &mut store,
        )
        .unwrap();

        let rows = persisted(&store, "credit");
        assert_eq!(rows.len(), 4);
        for pair in rows.windows(2) {
            assert!(pair[0].date >= pair[1].date);
            if pair[0].date == pair[1].date {
                assert!(pair[0].hash > pair[1].hash);
            }
        }
    }

    #[test]
    fn new_and_existing_records_interleave() {
        let mut store = MemoryStore::new();
        commit(vec![tx(5, "-5.00", "Cafe")], "HSBC", "credit", &mut store).unwrap();

        let summary = commit(
            vec![tx(5, "-5.00", "Cafe"), tx(8, "-10.00", "Lunch")],
            "HSBC",
            "credit",
            &mut store,
        )
        .unwrap();
        assert_eq!(summary, CommitSummary { imported: 2, added: 1, total: 2 });
    }

    #[test]
    fn malformed_upstream_schema_propagates() {
        let mut store = MemoryStore::new();
        let mut table = ledger_to_table(&[]);
        table.header.retain(|h| h != "hash");
        table.rows.push(vec!["2024-01-05".into(); 9]);
        store.replace("credit", &table).unwrap();

        let err = commit(vec![tx(5, "-5.00", "Cafe")], "HSBC", "credit", &mut store).unwrap_err();
        assert!(matches!(err, StoreError::DataIntegrity(_)));
    }
}
