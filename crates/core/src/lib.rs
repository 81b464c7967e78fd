pub mod dedup;
pub mod mapping;
pub mod matcher;
pub mod recat;
pub mod reconcile;
pub mod record;
pub mod store;

pub use mapping::{Mapping, MappingError, MappingRow};
pub use matcher::{categorise, MatchHit, Ruleset};
pub use recat::{recategorise, Decision, RecatSummary, Resolver, UnmatchedGroup};
pub use reconcile::{commit, CommitSummary};
pub use record::Transaction;
pub use store::{MemoryStore, SheetStore, StoreError, Table};
