use crate::mapping::Mapping;
use crate::matcher::{categorise, Ruleset};
use crate::record::sort_ledger;
use crate::store::{ledger_to_table, table_to_ledger, SheetStore, StoreError};

/// Records sharing one source description that stayed unmatched after a
/// matcher pass, presented to the resolver as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedGroup {
    pub source: String,
    pub count: usize,
}

/// The outcome of resolving one unmatched group.
///
/// With `pattern` set the ruleset learns: the pattern is appended under
/// (topcat, seccat) so future imports match on their own, and the records stay
/// rematchable. Without one the records are pinned instead: category applied
/// and `overridden` set, freezing them out of all future matcher passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub topcat: String,
    pub seccat: String,
    pub pattern: Option<String>,
}

/// Strategy for deciding what an unmatched group is. The interactive prompt
/// lives behind this seam; `None` skips the group.
pub trait Resolver {
    fn resolve(&mut self, group: &UnmatchedGroup) -> Option<Decision>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecatSummary {
    pub total: usize,
    /// Previously unmatched records that a pattern now explains.
    pub newly_matched: usize,
    /// Records categorised through resolver decisions.
    pub resolved: usize,
    /// Whether a decision appended patterns to the mapping (caller should save).
    pub mapping_changed: bool,
}

/// Re-run the matcher over a persisted collection, then let the resolver deal
/// with whatever is still unmatched. Operates in place on the fetched dataset
/// (no merge against upstream) and writes it back in the canonical sort.
pub fn recategorise(
    store: &mut dyn SheetStore,
    worksheet: &str,
    mapping: &mut Mapping,
    mut resolver: Option<&mut dyn Resolver>,
) -> Result<RecatSummary, StoreError> {
    let mut records = table_to_ledger(&store.read(worksheet)?)?;

    let unmatched_before: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.overridden && !r.is_categorised())
        .map(|(i, _)| i)
        .collect();

    let ruleset = Ruleset::compile(mapping);
    categorise(&mut records, &ruleset);

    let newly_matched = unmatched_before
        .iter()
        .filter(|&&i| records[i].is_categorised())
        .count();

    let mut summary = RecatSummary {
        total: records.len(),
        newly_matched,
        ..RecatSummary::default()
    };

    if let Some(resolver) = resolver.as_deref_mut() {
        for group in unmatched_groups(&records) {
            let Some(decision) = resolver.resolve(&group) else {
                continue;
            };

            if let Some(pattern) = &decision.pattern {
                mapping.append_pattern(&decision.topcat, &decision.seccat, pattern);
                summary.mapping_changed = true;
            }

            for record in records
                .iter_mut()
                .filter(|r| !r.overridden && !r.is_categorised() && r.source == group.source)
            {
                record.topcat = Some(decision.topcat.clone());
                record.seccat = Some(decision.seccat.clone());
                match &decision.pattern {
                    Some(pattern) => record.searchterm = Some(pattern.clone()),
                    None => {
                        record.searchterm = None;
                        record.overridden = true;
                    }
                }
                summary.resolved += 1;
            }
        }
    }

    sort_ledger(&mut records);
    store.replace(worksheet, &ledger_to_table(&records))?;

    tracing::info!(
        worksheet,
        total = summary.total,
        newly_matched = summary.newly_matched,
        resolved = summary.resolved,
        "recategorised collection"
    );
    Ok(summary)
}

/// Group still-unmatched records by source, in first-seen order.
fn unmatched_groups(records: &[crate::record::Transaction]) -> Vec<UnmatchedGroup> {
    let mut groups: Vec<UnmatchedGroup> = Vec::new();
    for record in records.iter().filter(|r| !r.overridden && !r.is_categorised()) {
        match groups.iter_mut().find(|g| g.source == record.source) {
            Some(group) => group.count += 1,
            None => groups.push(UnmatchedGroup { source: record.source.clone(), count: 1 }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::commit;
    use crate::record::Transaction;
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

    fn seed(store: &mut MemoryStore, batch: Vec<Transaction>) {
        commit(batch, "HSBC", "credit", store).unwrap();
    }

    struct FixedResolver {
        decision: Option<Decision>,
        seen: Vec<UnmatchedGroup>,
    }

    impl Resolver for FixedResolver {
        fn resolve(&mut self, group: &UnmatchedGroup) -> Option<Decision> {
            self.seen.push(group.clone());
            self.decision.clone()
        }
    }

    #[test]
    fn ruleset_change_picks_up_new_matches() {
        let mut store = MemoryStore::new();
        seed(&mut store, vec![tx(5, "-120.00", "AGL ENERGY"), tx(6, "-9.00", "UNKNOWN")]);

        let mut mapping = Mapping::from_yaml("mapping:\n  bills:\n    power:\n    - AGL\n").unwrap();
        let summary = recategorise(&mut store, "credit", &mut mapping, None).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.newly_matched, 1);
        assert_eq!(summary.resolved, 0);

        let rows = persisted(&store, "credit");
        let agl = rows.iter().find(|r| r.source == "AGL ENERGY").unwrap();
        assert_eq!(agl.topcat.as_deref(), Some("bills"));
        let unknown = rows.iter().find(|r| r.source == "UNKNOWN").unwrap();
        assert_eq!(unknown.topcat, None);
    }

    #[test]
    fn overridden_rows_are_left_alone() {
        let mut store = MemoryStore::new();
        let mut pinned = tx(5, "-120.00", "AGL ENERGY");
        pinned.topcat = Some("house".into());
        pinned.overridden = true;
        seed(&mut store, vec![pinned]);

        let mut mapping = Mapping::from_yaml("mapping:\n  bills:\n    power:\n    - AGL\n").unwrap();
        let summary = recategorise(&mut store, "credit", &mut mapping, None).unwrap();
        assert_eq!(summary.newly_matched, 0);

        let rows = persisted(&store, "credit");
        assert_eq!(rows[0].topcat.as_deref(), Some("house"));
    }

    #[test]
    fn resolver_sees_groups_with_counts() {
        let mut store = MemoryStore::new();
        seed(
            &mut store,
            vec![tx(5, "-9.00", "MYSTERY"), tx(6, "-9.50", "MYSTERY"), tx(7, "-1.00", "OTHER")],
        );

        let mut mapping = Mapping::default();
        let mut resolver = FixedResolver { decision: None, seen: Vec::new() };
        recategorise(&mut store, "credit", &mut mapping, Some(&mut resolver)).unwrap();

        // The persisted collection is date-descending, so OTHER (newest) leads.
        assert_eq!(
            resolver.seen,
            vec![
                UnmatchedGroup { source: "OTHER".into(), count: 1 },
                UnmatchedGroup { source: "MYSTERY".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn decision_without_pattern_pins_records() {
        let mut store = MemoryStore::new();
        seed(&mut store, vec![tx(5, "-9.00", "MYSTERY")]);

        let mut mapping = Mapping::default();
        let mut resolver = FixedResolver {
            decision: Some(Decision {
                topcat: "eats".into(),
                seccat: "lunch".into(),
                pattern: None,
            }),
            seen: Vec::new(),
        };
        let summary =
            recategorise(&mut store, "credit", &mut mapping, Some(&mut resolver)).unwrap();
        assert_eq!(summary.resolved, 1);
        assert!(!summary.mapping_changed);

        let rows = persisted(&store, "credit");
        assert_eq!(rows[0].topcat.as_deref(), Some("eats"));
        assert!(rows[0].overridden);
        assert_eq!(rows[0].searchterm, None);
    }

    #[test]
    fn decision_with_pattern_teaches_the_ruleset() {
        let mut store = MemoryStore::new();
        seed(&mut store, vec![tx(5, "-9.00", "SOUL ORIGIN SYDNEY")]);

        let mut mapping = Mapping::default();
        let mut resolver = FixedResolver {
            decision: Some(Decision {
                topcat: "eats".into(),
                seccat: "coffee".into(),
                pattern: Some("SOUL ORIGIN".into()),
            }),
            seen: Vec::new(),
        };
        let summary =
            recategorise(&mut store, "credit", &mut mapping, Some(&mut resolver)).unwrap();
        assert_eq!(summary.resolved, 1);
        assert!(summary.mapping_changed);

        // The ruleset learned the pattern.
        assert_eq!(mapping.topcats[0].seccats[0].patterns, vec!["SOUL ORIGIN"]);

        // The record is categorised but stays rematchable.
        let rows = persisted(&store, "credit");
        assert_eq!(rows[0].topcat.as_deref(), Some("eats"));
        assert_eq!(rows[0].searchterm.as_deref(), Some("SOUL ORIGIN"));
        assert!(!rows[0].overridden);
    }

    #[test]
    fn recat_keeps_canonical_sort() {
        let mut store = MemoryStore::new();
        seed(&mut store, vec![tx(3, "-1.00", "a"), tx(9, "-2.00", "b"), tx(7, "-3.00", "c")]);

        let mut mapping = Mapping::default();
        recategorise(&mut store, "credit", &mut mapping, None).unwrap();

        let rows = persisted(&store, "credit");
        for pair in rows.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
    }
}
