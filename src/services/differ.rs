//! Differ for charrank.
//!
//! Compares interaction counts of a current snapshot against a prior one.
//! A character absent from the prior snapshot has [`Comparison::NoData`];
//! a character whose prior count was exactly zero and has grown is reported
//! as 100% growth.

use std::collections::HashMap;

use crate::types::character::CharacterRecord;
use crate::types::diff::{CharacterDiff, Comparison, Trend};

/// Builds the id -> prior interaction count lookup. The first occurrence of
/// an id wins.
pub fn prior_counts(prior: &[CharacterRecord]) -> HashMap<String, u64> {
    let mut counts = HashMap::with_capacity(prior.len());
    for record in prior {
        counts
            .entry(record.id.clone())
            .or_insert(record.interaction_count_with_regen);
    }
    counts
}

/// Classifies the change from `prior` to `current`. The delta saturates at
/// the `i64` range; the percentage uses the exact difference.
pub fn classify(current: u64, prior: u64) -> Comparison {
    let wide = i128::from(current) - i128::from(prior);
    let delta = i64::try_from(wide).unwrap_or(if wide > 0 { i64::MAX } else { i64::MIN });
    let magnitude = wide.unsigned_abs() as f64;
    let percent = |base: u64| {
        if base > 0 {
            magnitude / base as f64 * 100.0
        } else {
            100.0
        }
    };

    match delta {
        d if d > 0 => Comparison::Change {
            delta,
            trend: Trend::Growth,
            percent: percent(prior),
        },
        d if d < 0 => Comparison::Change {
            delta,
            trend: Trend::Decline,
            percent: percent(prior),
        },
        _ => Comparison::Change {
            delta: 0,
            trend: Trend::Neutral,
            percent: 0.0,
        },
    }
}

/// Compares every current record against the prior lookup, in current order.
pub fn compare(current: &[CharacterRecord], prior: &HashMap<String, u64>) -> Vec<CharacterDiff> {
    current
        .iter()
        .map(|record| {
            let count = record.interaction_count_with_regen;
            let comparison = match prior.get(&record.id) {
                Some(&before) => classify(count, before),
                None => Comparison::NoData,
            };
            CharacterDiff {
                id: record.id.clone(),
                current_count: count,
                comparison,
            }
        })
        .collect()
}

/// Convenience wrapper comparing two flat snapshots.
pub fn diff_snapshots(current: &[CharacterRecord], prior: &[CharacterRecord]) -> Vec<CharacterDiff> {
    compare(current, &prior_counts(prior))
}
