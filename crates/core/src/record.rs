use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One ledger row. `topcat`/`seccat`/`searchterm` stay `None` until the
/// matcher assigns a category; `provider` and `hash` are stamped at commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub source: String,
    pub topcat: Option<String>,
    pub seccat: Option<String>,
    pub searchterm: Option<String>,
    /// A human fixed this row's category upstream; it must never be rematched.
    pub overridden: bool,
    pub provider: String,
    pub hash: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: Decimal, source: impl Into<String>) -> Self {
        Transaction {
            date,
            amount,
            source: source.into(),
            topcat: None,
            seccat: None,
            searchterm: None,
            overridden: false,
            provider: String::new(),
            hash: String::new(),
        }
    }

    /// SHA-256 over the canonical renderings of (date, amount, source).
    /// Stable across runs for identical triples; this is the merge key.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical_date(self.date).as_bytes());
        hasher.update(canonical_amount(self.amount).as_bytes());
        hasher.update(self.source.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn is_categorised(&self) -> bool {
        self.topcat.is_some()
    }
}

pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Minimal decimal rendering at cent precision: "5.00", "5.0" and "5" all
/// render as "5", so re-exports with different amount formatting hash the same.
pub fn canonical_amount(amount: Decimal) -> String {
    amount.round_dp(2).normalize().to_string()
}

/// Order the ledger by date descending, then hash descending. Hash is unique
/// after a commit, so this is a total order with no ties.
pub fn sort_ledger(records: &mut [Transaction]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.hash.cmp(&a.hash)));
}
