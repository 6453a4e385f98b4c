use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Direction of an interaction-count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Growth,
    Decline,
    Neutral,
}

/// Comparison of one character against the prior snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Comparison {
    /// The character did not appear in the prior snapshot.
    NoData,
    Change { delta: i64, trend: Trend, percent: f64 },
}

/// Per-character comparison result, in current-snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDiff {
    pub id: String,
    pub current_count: u64,
    pub comparison: Comparison,
}

/// Prior counts plus the timestamp they were taken at, if known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonBaseline {
    pub prior_counts: HashMap<String, u64>,
    pub prior_timestamp: Option<String>,
}
