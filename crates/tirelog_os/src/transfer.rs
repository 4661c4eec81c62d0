#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tirelog_contracts::tire::TireRecord;
use tirelog_contracts::Validate;
use tirelog_storage::TireRepo;

use crate::error::OpError;

/// Bulk transfer document: `{ "tires": [TireRecord, ...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub tires: Vec<TireRecord>,
}

/// Snapshot of every record, in stable key order.
pub fn export_document<S: TireRepo>(store: &S) -> ExportDocument {
    ExportDocument {
        tires: store.all_tires().into_iter().cloned().collect(),
    }
}

pub fn export_json<S: TireRepo>(store: &S) -> Result<String, OpError> {
    serde_json::to_string_pretty(&export_document(store)).map_err(|e| OpError::Format(e.to_string()))
}

/// Bulk-loads a previously exported document. This is a trust boundary:
/// records are written through the raw store escape hatch with no role
/// check and no audit events appended. Every record is contract-validated
/// before the first write, so a malformed document cannot partially apply.
/// Returns the number of records loaded.
pub fn import_json<S: TireRepo>(store: &mut S, raw: &str) -> Result<usize, OpError> {
    let doc: ExportDocument = serde_json::from_str(raw)
        .map_err(|e| OpError::Format(format!("invalid import document: {e}")))?;
    for record in &doc.tires {
        record.validate()?;
    }
    let count = doc.tires.len();
    for record in doc.tires {
        store.replace_tire_unchecked(record)?;
    }
    Ok(count)
}
