//! Aggregator/Grouper for charrank.
//!
//! Groups merged character records by section, ranks each section by
//! interaction count, and orders sections by the canonical section list.
//! Pure: the same input always yields the same output.

use crate::types::character::CharacterRecord;
use crate::types::ranking::{RankingGroup, SECTION_ORDER, TOP_SECTION_TITLE};

/// Groups records into ranked sections.
///
/// Within a section, records are sorted by `interaction_count_with_regen`
/// descending; ties keep their input order. Sections listed in
/// [`SECTION_ORDER`] come first, in that order; any other section follows in
/// first-seen order.
pub fn group_rankings(records: &[CharacterRecord]) -> Vec<RankingGroup> {
    // Vec of (title, members) keeps first-seen order without a map.
    let mut partitions: Vec<(String, Vec<CharacterRecord>)> = Vec::new();
    for record in records {
        match partitions
            .iter_mut()
            .find(|(title, _)| *title == record.section_title)
        {
            Some((_, members)) => members.push(record.clone()),
            None => partitions.push((record.section_title.clone(), vec![record.clone()])),
        }
    }

    for (_, members) in partitions.iter_mut() {
        // sort_by is stable
        members.sort_by(|a, b| {
            b.interaction_count_with_regen
                .cmp(&a.interaction_count_with_regen)
        });
    }

    let mut ordered: Vec<(String, Vec<CharacterRecord>)> = Vec::with_capacity(partitions.len());
    for known in SECTION_ORDER {
        if let Some(pos) = partitions.iter().position(|(title, _)| title == known) {
            ordered.push(partitions.remove(pos));
        }
    }
    ordered.extend(partitions);

    ordered
        .into_iter()
        .map(|(title, characters)| RankingGroup {
            is_ranking_section: title == TOP_SECTION_TITLE,
            title,
            characters,
        })
        .collect()
}

/// Flattens grouped rankings back into a single record list, group by group.
pub fn flatten_groups(groups: Vec<RankingGroup>) -> Vec<CharacterRecord> {
    groups.into_iter().flat_map(|g| g.characters).collect()
}
