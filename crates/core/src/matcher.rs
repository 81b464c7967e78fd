use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;

use crate::mapping::Mapping;
use crate::record::Transaction;

/// Topcats exempt from the forced-refund rule: incoming money already
/// explained by a pattern in one of these needs no reclassification.
pub const EXPLAINED_TOPCATS: [&str; 2] = ["transfer", "income"];

/// Category written by the forced-refund rule. Unexplained incoming money is
/// almost always a refund of an earlier purchase.
pub const REFUND_TOPCAT: &str = "transfer";
pub const REFUND_SECCAT: &str = "refund";
pub const REFUND_TERM: &str = "refund";

/// A ruleset flattened into precedence order with every pattern's matcher
/// built up front. Patterns that fail to compile are warned about and skipped
/// here, once, instead of erroring on every match attempt.
pub struct Ruleset {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    topcat: String,
    seccat: String,
    pattern: String,
    regex: Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchHit {
    pub topcat: String,
    pub seccat: String,
    pub pattern: String,
}

impl Ruleset {
    pub fn compile(mapping: &Mapping) -> Ruleset {
        let mut rules = Vec::new();
        for topcat in &mapping.topcats {
            for seccat in &topcat.seccats {
                for pattern in &seccat.patterns {
                    match compile_pattern(pattern) {
                        Ok(regex) => rules.push(CompiledRule {
                            topcat: topcat.name.clone(),
                            seccat: seccat.name.clone(),
                            pattern: pattern.clone(),
                            regex,
                        }),
                        Err(e) => {
                            tracing::warn!(pattern = %pattern, error = %e, "skipping unparseable pattern");
                        }
                    }
                }
            }
        }
        Ruleset { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First pattern matching `source`, in declaration order.
    pub fn find(&self, source: &str) -> Option<MatchHit> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(source))
            .map(|rule| MatchHit {
                topcat: rule.topcat.clone(),
                seccat: rule.seccat.clone(),
                pattern: rule.pattern.clone(),
            })
    }
}

/// A pattern's whitespace-delimited tokens must appear in order in the source
/// text, case-insensitively, with anything in between.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let tokens: Vec<&str> = pattern.split_whitespace().collect();
    RegexBuilder::new(&tokens.join(".*?"))
        .case_insensitive(true)
        .build()
}

/// Re-derive categories for every non-overridden record: assign the first
/// matching rule (clearing the category when nothing matches any more), then
/// apply the forced-refund rule. Returns the number of categorised records.
pub fn categorise(records: &mut [Transaction], ruleset: &Ruleset) -> usize {
    let mut categorised = 0;

    for record in records.iter_mut().filter(|r| !r.overridden) {
        match ruleset.find(&record.source) {
            Some(hit) => {
                record.topcat = Some(hit.topcat);
                record.seccat = Some(hit.seccat);
                record.searchterm = Some(hit.pattern);
            }
            None => {
                record.topcat = None;
                record.seccat = None;
                record.searchterm = None;
            }
        }

        // Unexplained incoming money is a refund, whatever the patterns say.
        let explained = matches!(record.topcat.as_deref(), Some(t) if EXPLAINED_TOPCATS.contains(&t));
        if record.amount > Decimal::ZERO && !explained {
            record.topcat = Some(REFUND_TOPCAT.to_string());
            record.seccat = Some(REFUND_SECCAT.to_string());
            record.searchterm = Some(REFUND_TERM.to_string());
        }

        if record.topcat.is_some() {
            categorised += 1;
        }
    }

    categorised
}
