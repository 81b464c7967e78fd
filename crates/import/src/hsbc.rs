use std::io::Read;

use crate::util::{column_index, parse_amount, parse_date, prepare_source};
use crate::{ImportError, StatementRecord};

pub const PROVIDER: &str = "HSBC";
pub const WORKSHEET: &str = "credit";

/// HSBC credit card CSV export: `Date,Description,Amount`, dates as dd/mm/yy.
/// The export renders charges positive and repayments negative, so the sign is
/// flipped to the ledger convention (debits negative).
pub fn parse<R: Read>(data: R) -> Result<Vec<StatementRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = reader.headers()?.clone();
    let date_col = column_index(&headers, "Date")?;
    let desc_col = column_index(&headers, "Description")?;
    let amount_col = column_index(&headers, "Amount")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date = parse_date(row.get(date_col).unwrap_or_default(), "%d/%m/%y")?;
        let source = prepare_source(row.get(desc_col).unwrap_or_default());
        let amount = parse_amount(row.get(amount_col).unwrap_or_default())?;

        records.push(StatementRecord::new(date, -amount, source));
    }

    if records.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    Ok(records)
}
