use std::io::Read;

use crate::util::{column_index, parse_amount, parse_date, prepare_source};
use crate::{ImportError, Preset, StatementRecord};

pub const PROVIDER: &str = "NAB";
pub const WORKSHEET: &str = "credit";

/// NAB credit card CSV export: dates as `05 Jan 24`, amounts already signed,
/// merchant name and transaction details in separate columns. The
/// `Transaction Type` column explains cash advances, card payments and fee
/// adjustments, which become presets.
pub fn parse<R: Read>(data: R) -> Result<Vec<StatementRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = reader.headers()?.clone();
    let date_col = column_index(&headers, "Date")?;
    let amount_col = column_index(&headers, "Amount")?;
    let type_col = column_index(&headers, "Transaction Type")?;
    let details_col = column_index(&headers, "Transaction Details")?;
    let merchant_col = column_index(&headers, "Merchant Name")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date = parse_date(row.get(date_col).unwrap_or_default(), "%d %b %y")?;
        let amount = parse_amount(row.get(amount_col).unwrap_or_default())?;

        // Merchant name is blank for bank-originated rows.
        let merchant = row.get(merchant_col).unwrap_or_default();
        let details = row.get(details_col).unwrap_or_default();
        let source = prepare_source(&format!("{merchant} {details}"));

        let mut record = StatementRecord::new(date, amount, source);
        let kind = row.get(type_col).unwrap_or_default().trim();
        if kind == "CREDIT CARD CASH ADVANCE" {
            record = record.with_preset(Preset {
                topcat: "bills",
                seccat: "cash",
                searchterm: "CREDIT CARD CASH ADVANCE",
            });
        } else if kind == "CREDIT CARD PAYMENT" {
            record = record.with_preset(Preset {
                topcat: "payment",
                seccat: "payment",
                searchterm: "CREDIT CARD PAYMENT",
            });
        } else if ["FEES", "DEBIT ADJUSTMENTS", "MISCELLANEOUS CREDIT"]
            .iter()
            .any(|marker| kind.contains(marker))
        {
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
