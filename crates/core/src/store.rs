use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::record::{canonical_amount, canonical_date, Transaction};

/// Canonical persisted column order. Round-trips through the store must
/// preserve it; `month` is a display-only formula column appended on write.
pub const LEDGER_COLUMNS: [&str; 9] = [
    "date", "amount", "source", "topcat", "seccat", "searchterm", "override", "provider", "hash",
];
pub const MONTH_COLUMN: &str = "month";

pub const MAPPING_COLUMNS: [&str; 4] = ["topcat", "seccat", "searchterm", "comment"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),
    #[error("Persisted data violates the expected schema: {0}")]
    DataIntegrity(String),
}

/// A worksheet as the store sees it: a header row plus string cells.
/// Rows may be ragged; readers pad with empty cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: &[&str]) -> Table {
        Table {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    fn cell<'a>(&'a self, row: &'a [String], name: &str) -> &'a str {
        self.column(name)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One worksheet read, one worksheet replace, both blocking and treated as
/// atomic. No retries; failures propagate to the caller.
pub trait SheetStore {
    fn read(&self, worksheet: &str) -> Result<Table, StoreError>;
    fn replace(&mut self, worksheet: &str, table: &Table) -> Result<(), StoreError>;
}

// ── In-memory store (always available, used for tests and dry runs) ───────────

/// Holds worksheets in a map. Reading a worksheet that was never written
/// returns an empty table, mirroring a freshly created sheet.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: HashMap<String, Table>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn sheet(&self, worksheet: &str) -> Option<&Table> {
        self.sheets.get(worksheet)
    }
}

impl SheetStore for MemoryStore {
    fn read(&self, worksheet: &str) -> Result<Table, StoreError> {
        Ok(self.sheets.get(worksheet).cloned().unwrap_or_default())
    }

    fn replace(&mut self, worksheet: &str, table: &Table) -> Result<(), StoreError> {
        self.sheets.insert(worksheet.to_string(), table.clone());
        Ok(())
    }
}

// ── Ledger schema ─────────────────────────────────────────────────────────────

/// Render the ledger in canonical column order, appending the `month` formula
/// column for spreadsheet-side pivoting.
pub fn ledger_to_table(records: &[Transaction]) -> Table {
    let mut header: Vec<String> = LEDGER_COLUMNS.iter().map(|h| h.to_string()).collect();
    header.push(MONTH_COLUMN.to_string());

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                canonical_date(r.date),
                canonical_amount(r.amount),
                r.source.clone(),
                r.topcat.clone().unwrap_or_default(),
                r.seccat.clone().unwrap_or_default(),
                r.searchterm.clone().unwrap_or_default(),
                if r.overridden { "1" } else { "0" }.to_string(),
                r.provider.clone(),
                r.hash.clone(),
                // Header is row 1, data starts at row 2.
                format!("=TEXT(A{}, \"yyyy-mm\")", i + 2),
            ]
        })
        .collect();

    Table { header, rows }
}

/// Parse a persisted worksheet back into records. A completely empty table is
/// a valid empty upstream (a collection that has never been written); a
/// non-empty one missing a canonical column is a DataIntegrity failure.
pub fn table_to_ledger(table: &Table) -> Result<Vec<Transaction>, StoreError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    for name in LEDGER_COLUMNS {
        if table.column(name).is_none() {
            return Err(StoreError::DataIntegrity(format!(
                "ledger sheet is missing column '{name}'"
            )));
        }
    }

    let mut records = Vec::new();
    for row in &table.rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date = table.cell(row, "date");
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| StoreError::DataIntegrity(format!("unparseable date '{date}'")))?;
        let amount = table.cell(row, "amount");
        let amount = Decimal::from_str(amount)
            .map_err(|_| StoreError::DataIntegrity(format!("unparseable amount '{amount}'")))?;

        let mut record = Transaction::new(date, amount, table.cell(row, "source"));
        record.topcat = non_empty(table.cell(row, "topcat"));
        record.seccat = non_empty(table.cell(row, "seccat"));
        record.searchterm = non_empty(table.cell(row, "searchterm"));
        record.overridden = matches!(table.cell(row, "override"), "1" | "true" | "TRUE");
        record.provider = table.cell(row, "provider").to_string();
        record.hash = table.cell(row, "hash").to_string();
        records.push(record);
    }

    Ok(records)
}

// ── Mapping sheet schema ──────────────────────────────────────────────────────

use crate::mapping::MappingRow;

pub fn mapping_to_table(rows: &[MappingRow]) -> Table {
    let mut table = Table::new(&MAPPING_COLUMNS);
    table.rows = rows
        .iter()
        .map(|r| {
            vec![
                r.topcat.clone(),
                r.seccat.clone(),
                r.pattern.clone(),
                r.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();
    table
}

pub fn table_to_mapping_rows(table: &Table) -> Result<Vec<MappingRow>, StoreError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    for name in &MAPPING_COLUMNS[..3] {
        if table.column(name).is_none() {
            return Err(StoreError::DataIntegrity(format!(
                "mapping sheet is missing column '{name}'"
            )));
        }
    }

    Ok(table
        .rows
        .iter()
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
        .map(|row| MappingRow {
            topcat: table.cell(row, "topcat").to_string(),
            seccat: table.cell(row, "seccat").to_string(),
            pattern: table.cell(row, "searchterm").to_string(),
            comment: non_empty(table.cell(row, "comment")),
        })
        .collect())
}

fn non_empty(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}
