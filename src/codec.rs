// Collection document encoding: one JSON array per collection

use crate::record::Record;
use eyre::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

/// Serialize the whole collection as a JSON array
pub fn encode_collection<R: Record>(records: &[R]) -> Result<String> {
    serde_json::to_string(records).context("Failed to serialize collection")
}

/// Parse a collection document.
///
/// The document itself must be a JSON array; entries that don't match the
/// record schema, or repeat an id seen earlier, are skipped with a warning.
pub fn decode_collection<R: Record>(text: &str) -> Result<Vec<R>> {
    let values: Vec<Value> = serde_json::from_str(text).context("Collection document is not a JSON array")?;
    let collection = R::collection_name();

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let record: R = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(collection, index, error = ?e, "Failed to parse record, skipping");
                continue;
            }
        };
        if !seen.insert(record.id().to_string()) {
            warn!(collection, index, id = record.id(), "Duplicate record id, skipping");
            continue;
        }
        records.push(record);
    }

    info!(collection, count = records.len(), "Loaded records from collection document");
    Ok(records)
}
