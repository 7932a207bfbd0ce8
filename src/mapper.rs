use std::collections::HashMap;

use tracing::debug;

use crate::error::{IngestError, Result};
use crate::schema;
use crate::table::RawTable;

/// The validated subset of a user-supplied column mapping: (canonical,
/// source) pairs where the canonical key is in the schema catalog and the
/// source column exists in the loaded table. Pairs are held in catalog order
/// so the mapped table's shape does not depend on map iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamePlan {
    pairs: Vec<(String, String)>,
}

impl RenamePlan {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Filter a user mapping down to a usable [`RenamePlan`].
///
/// An empty input mapping and a plan left empty after filtering both fail
/// with [`IngestError::InvalidMapping`] carrying the table's column names, so
/// the caller can retry with a corrected mapping.
pub fn resolve_rename_plan(
    table: &RawTable,
    mapping: &HashMap<String, String>,
) -> Result<RenamePlan> {
    if mapping.is_empty() {
        return Err(invalid_mapping(table));
    }

    let mut pairs = Vec::new();
    for canonical in schema::CANONICAL_FIELDS {
        if let Some(source) = mapping.get(canonical) {
            if table.column_index(source).is_some() {
                pairs.push((canonical.to_string(), source.clone()));
            } else {
                debug!("mapping entry '{}' -> '{}' names no column", canonical, source);
            }
        }
    }

    if pairs.is_empty() {
        return Err(invalid_mapping(table));
    }
    Ok(RenamePlan { pairs })
}

/// Rewrite the table to the plan's canonical column names. Source columns
/// without a surviving mapping entry are dropped.
pub fn apply_rename_plan(table: &RawTable, plan: &RenamePlan) -> RawTable {
    let indices: Vec<usize> = plan
        .pairs
        .iter()
        .filter_map(|(_, source)| table.column_index(source))
        .collect();

    let mut mapped = RawTable::new(
        plan.pairs
            .iter()
            .map(|(canonical, _)| canonical.clone())
            .collect(),
    );
    for row in &table.rows {
        mapped
            .rows
            .push(indices.iter().map(|&i| table.cell(row, i).to_string()).collect());
    }
    mapped
}

fn invalid_mapping(table: &RawTable) -> IngestError {
    IngestError::InvalidMapping {
        columns: table.columns.clone(),
    }
}
