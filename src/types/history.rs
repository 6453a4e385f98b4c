use serde::{Deserialize, Serialize};

use super::character::CharacterRecord;

/// A snapshot of the flat character list captured at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub data: Vec<CharacterRecord>,
}

/// Lightweight listing row for the history panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub timestamp: String,
    pub count: usize,
}

impl From<&HistoryRecord> for HistorySummary {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            timestamp: record.timestamp.clone(),
            count: record.data.len(),
        }
    }
}
