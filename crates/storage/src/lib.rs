pub mod sheets;
pub mod sync;

pub use sheets::SheetsStore;
pub use sync::{pull_mapping, push_mapping, MAPPING_WORKSHEET};
