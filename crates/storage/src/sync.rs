use reckon_core::mapping::{merge_comments, Mapping};
use reckon_core::store::{mapping_to_table, table_to_mapping_rows, SheetStore, StoreError};

pub const MAPPING_WORKSHEET: &str = "mapping";

/// Push the YAML ruleset to the mapping worksheet, outer-joining against the
/// persisted rows so comments annotated upstream survive. Returns the number
/// of rows written.
pub fn push_mapping(store: &mut dyn SheetStore, mapping: &Mapping) -> Result<usize, StoreError> {
    let upstream = table_to_mapping_rows(&store.read(MAPPING_WORKSHEET)?)?;
    let merged = merge_comments(&mapping.to_rows(), &upstream);
    store.replace(MAPPING_WORKSHEET, &mapping_to_table(&merged))?;

    tracing::info!(rows = merged.len(), "pushed mapping");
    Ok(merged.len())
}

/// Pull the mapping worksheet down into a ruleset tree, preserving row order.
pub fn pull_mapping(store: &dyn SheetStore) -> Result<Mapping, StoreError> {
    let rows = table_to_mapping_rows(&store.read(MAPPING_WORKSHEET)?)?;
    Ok(Mapping::from_rows(&rows))
}
