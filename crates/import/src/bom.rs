use std::io::Read;

use crate::util::{column_index, parse_amount, parse_date, prepare_source};
use crate::{ImportError, Preset, StatementRecord};

pub const PROVIDER: &str = "BOM";

/// BOM account CSV export: `Date,Description,Debit,Credit,Category`, dates as
/// dd/mm/yyyy, debit and credit in separate unsigned columns. The statement's
/// own `Category` column explains deposits and bank fees, which become presets
/// rather than going through pattern matching.
pub fn parse<R: Read>(data: R) -> Result<Vec<StatementRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = reader.headers()?.clone();
    let date_col = column_index(&headers, "Date")?;
    let desc_col = column_index(&headers, "Description")?;
    let debit_col = column_index(&headers, "Debit")?;
    let credit_col = column_index(&headers, "Credit")?;
    let category_col = column_index(&headers, "Category")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date = parse_date(row.get(date_col).unwrap_or_default(), "%d/%m/%Y")?;
        let source = prepare_source(row.get(desc_col).unwrap_or_default());

        // Debits are unsigned in the export; merge into one signed column.
        let debit = row.get(debit_col).unwrap_or_default().trim();
        let credit = row.get(credit_col).unwrap_or_default().trim();
        let amount = if !debit.is_empty() {
            -parse_amount(debit)?
        } else if !credit.is_empty() {
            parse_amount(credit)?
        } else {
            continue;
        };

        let mut record = StatementRecord::new(date, amount, source);
        let category = row.get(category_col).unwrap_or_default().trim();
        if category == "Deposits" {
            record = record.with_preset(Preset {
                topcat: "payment",
                seccat: "payment",
                searchterm: "Deposits",
            });
        } else if category.contains("Foreign Transaction Fee") {
            record = record.with_preset(Preset {
                topcat: "bills",
                seccat: "bankfees",
                searchterm: "FEES",
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    Ok(records)
}
