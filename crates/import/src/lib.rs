pub mod bom;
pub mod hsbc;
pub mod nab;
pub(crate) mod util;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use reckon_core::matcher::{categorise, Ruleset};
use reckon_core::Transaction;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No transactions in statement")]
    NoDataRows,
}

/// The normalized shape every statement adapter produces: the common
/// (date, amount, source) triple plus any category the statement itself
/// already explains (deposits, fees, cash advances).
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub source: String,
    pub preset: Option<Preset>,
}

/// A category preset from statement metadata. Applied after pattern matching,
/// so it wins over both pattern hits and the forced-refund rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub topcat: &'static str,
    pub seccat: &'static str,
    pub searchterm: &'static str,
}

impl StatementRecord {
    pub fn new(date: NaiveDate, amount: Decimal, source: String) -> StatementRecord {
        StatementRecord { date, amount, source, preset: None }
    }

    pub fn with_preset(mut self, preset: Preset) -> StatementRecord {
        self.preset = Some(preset);
        self
    }
}

/// Run a parsed statement through the matcher, then patch in the statement's
/// own presets. Returns records ready to commit.
pub fn categorise_statement(records: &[StatementRecord], ruleset: &Ruleset) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = records
        .iter()
        .map(|r| Transaction::new(r.date, r.amount, r.source.clone()))
        .collect();

    let matched = categorise(&mut out, ruleset);
    tracing::info!(total = out.len(), matched, "categorised statement");

    for (record, raw) in out.iter_mut().zip(records) {
        if let Some(preset) = &raw.preset {
            record.topcat = Some(preset.topcat.to_string());
            record.seccat = Some(preset.seccat.to_string());
            record.searchterm = Some(preset.searchterm.to_string());
        }
    }

    out
}
