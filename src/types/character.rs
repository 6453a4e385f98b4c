use serde::{Deserialize, Deserializer, Serialize};

/// Reads an interaction count, treating `null` as 0.
fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Weak reference to the creator of a character: a denormalized label pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub nickname: String,
}

/// Raw attributes captured from one rendered character card.
///
/// Every field is optional because the host page's markup is owned by a third
/// party and drifts without notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardNode {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub creator_href: Option<String>,
    #[serde(default)]
    pub creator_nickname: Option<String>,
    #[serde(default)]
    pub section_title: Option<String>,
}

/// A structured capture of the character cards visible on the host page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub cards: Vec<CardNode>,
}

/// Basic character fields available from the page alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicCharacter {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub creator: Creator,
    pub section_title: String,
}

/// Per-character metadata returned by the detail read API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetail {
    #[serde(default, deserialize_with = "count_or_zero")]
    pub interaction_count_with_regen: u64,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
}

/// A fully merged character record: page fields plus detail fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub creator: Creator,
    #[serde(default)]
    pub section_title: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub interaction_count_with_regen: u64,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
}

impl CharacterRecord {
    /// Merges page fields with the detail fetched for the same id.
    pub fn merge(basic: BasicCharacter, detail: CharacterDetail) -> Self {
        Self {
            id: basic.id,
            name: basic.name,
            image_url: basic.image_url,
            creator: basic.creator,
            section_title: basic.section_title,
            interaction_count_with_regen: detail.interaction_count_with_regen,
            hashtags: detail.hashtags,
            created_at: detail.created_at,
        }
    }

    /// Whether the record carries everything a card needs to be drawn.
    pub fn is_renderable(&self) -> bool {
        !self.name.is_empty() && !self.image_url.is_empty() && !self.creator.nickname.is_empty()
    }
}
