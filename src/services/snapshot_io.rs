//! Snapshot export and import.
//!
//! Export writes the grouped ranking as pretty JSON. Import accepts either a
//! grouped ranking, a flat character list, or a single history record, and
//! always yields a flat list.

use serde_json::{Map, Value};
use tracing::debug;

use crate::services::aggregator::flatten_groups;
use crate::types::character::CharacterRecord;
use crate::types::errors::{ExportError, ImportError};
use crate::types::ranking::RankingGroup;

/// A normalized imported snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSnapshot {
    pub records: Vec<CharacterRecord>,
    /// Capture time, when the file carried one.
    pub timestamp: Option<String>,
}

/// Serializes grouped rankings for download.
pub fn export_groups(groups: &[RankingGroup]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(groups)?)
}

/// Parses an exported or hand-made snapshot file.
///
/// Records without a usable id are dropped; the rest of the file still counts.
pub fn import_snapshot(document: &str) -> Result<ImportedSnapshot, ImportError> {
    let value: Value = serde_json::from_str(document).map_err(ImportError::Parse)?;
    import_value(value)
}

/// Same as [`import_snapshot`] for an already-parsed document.
///
/// The shape is decided on the document itself:
/// - an array whose objects all carry `title` and `characters` is grouped;
/// - any other array of objects is a flat character list;
/// - an object with a `data` array is a history record.
pub fn import_value(value: Value) -> Result<ImportedSnapshot, ImportError> {
    match value {
        Value::Array(items) => {
            let objects = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err(ImportError::UnrecognizedShape),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let grouped = !objects.is_empty() && objects.iter().all(is_group);
            let records = if grouped {
                flatten_groups(objects.into_iter().map(decode_group).collect())
            } else {
                objects
                    .into_iter()
                    .filter_map(|map| decode_record(Value::Object(map)))
                    .collect()
            };
            Ok(ImportedSnapshot {
                records,
                timestamp: None,
            })
        }
        Value::Object(mut map) => {
            let Some(Value::Array(data)) = map.remove("data") else {
                return Err(ImportError::UnrecognizedShape);
            };
            let timestamp = match map.remove("timestamp") {
                Some(Value::String(ts)) => Some(ts),
                _ => None,
            };
            Ok(ImportedSnapshot {
                records: data.into_iter().filter_map(decode_record).collect(),
                timestamp,
            })
        }
        _ => Err(ImportError::UnrecognizedShape),
    }
}

fn is_group(map: &Map<String, Value>) -> bool {
    map.get("title").is_some_and(Value::is_string)
        && map.get("characters").is_some_and(Value::is_array)
}

/// Decodes one group, keeping its records in file order. A record without a
/// section takes the group's title.
fn decode_group(mut group: Map<String, Value>) -> RankingGroup {
    let title = match group.remove("title") {
        Some(Value::String(title)) => title,
        _ => String::new(),
    };
    let characters = match group.remove("characters") {
        Some(Value::Array(characters)) => characters
            .into_iter()
            .filter_map(decode_record)
            .map(|mut record| {
                if record.section_title.is_empty() {
                    record.section_title = title.clone();
                }
                record
            })
            .collect(),
        _ => Vec::new(),
    };
    RankingGroup {
        is_ranking_section: group
            .get("isRankingSection")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        title,
        characters,
    }
}

fn decode_record(value: Value) -> Option<CharacterRecord> {
    match serde_json::from_value::<CharacterRecord>(value) {
        Ok(record) if !record.id.is_empty() => Some(record),
        Ok(_) => {
            debug!("Skipping imported record with an empty id");
            None
        }
        Err(e) => {
            debug!(error = %e, "Skipping unreadable imported record");
            None
        }
    }
}
