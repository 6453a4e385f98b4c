use serde::{Deserialize, Serialize};

use super::character::CharacterRecord;

/// Title of the real-time top-10 section, the only ranking section.
pub const TOP_SECTION_TITLE: &str = "실시간 TOP 10 캐릭터";

/// Section used for cards scraped without a section heading.
pub const OVERFLOW_SECTION_TITLE: &str = "기타";

/// Preferred display order of known section titles.
pub const SECTION_ORDER: &[&str] = &[TOP_SECTION_TITLE, "퀘스트"];

/// Characters of one section, sorted by interaction count descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingGroup {
    pub title: String,
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub is_ranking_section: bool,
}
