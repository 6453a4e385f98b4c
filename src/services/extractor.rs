//! DOM Extractor for charrank.
//!
//! Turns a [`PageSnapshot`] of rendered character cards into basic records.
//! The host markup drifts without notice, so unmatched cards are skipped
//! rather than failing the whole extraction.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::types::character::{BasicCharacter, CardNode, Creator, PageSnapshot};
use crate::types::ranking::OVERFLOW_SECTION_TITLE;

fn character_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/characters?/([A-Za-z0-9_-]+)").expect("character id pattern is valid")
    })
}

fn creator_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/(?:creators?|users?)/([A-Za-z0-9_-]+)").expect("creator id pattern is valid")
    })
}

/// Strips the query string and fragment from a link.
fn link_path(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}

fn capture_segment(pattern: &Regex, href: &str) -> Option<String> {
    pattern
        .captures(link_path(href))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts the character id from a card link, e.g. `/characters/abc123`.
pub fn extract_character_id(href: &str) -> Option<String> {
    capture_segment(character_id_pattern(), href)
}

/// Extracts the creator id from a creator profile link.
pub fn extract_creator_id(href: &str) -> Option<String> {
    capture_segment(creator_id_pattern(), href)
}

/// Converts one card into a basic record, or `None` if it carries no id.
pub fn extract_card(card: CardNode) -> Option<BasicCharacter> {
    let Some(id) = card.href.as_deref().and_then(extract_character_id) else {
        debug!(href = ?card.href, name = ?card.name, "Skipping card without a character id");
        return None;
    };

    let section_title = card
        .section_title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| OVERFLOW_SECTION_TITLE.to_string());

    Some(BasicCharacter {
        id,
        name: card.name.map(|n| n.trim().to_string()).unwrap_or_default(),
        image_url: card.image_url.unwrap_or_default(),
        creator: Creator {
            id: card.creator_href.as_deref().and_then(extract_creator_id),
            nickname: card
                .creator_nickname
                .map(|n| n.trim().trim_start_matches('@').to_string())
                .unwrap_or_default(),
        },
        section_title,
    })
}

/// Lazily extracts basic records from every card of the snapshot.
///
/// Consumes the snapshot; duplicate ids are passed through.
pub fn extract(snapshot: PageSnapshot) -> impl Iterator<Item = BasicCharacter> {
    snapshot.cards.into_iter().filter_map(extract_card)
}
