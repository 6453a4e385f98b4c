//! Ranking collection pipeline: extraction followed by the detail fan-out.

use std::sync::Arc;

use tracing::info;

use crate::services::detail_fetcher::{fetch_details, DetailSource};
use crate::services::extractor::extract;
use crate::types::character::{BasicCharacter, CharacterRecord, PageSnapshot};

/// Extracts the page's cards and augments them with fetched detail.
///
/// Never fails: unmatched cards and failed fetches are dropped, so an empty
/// result means nothing could be collected.
pub async fn collect_rankings(
    source: Arc<dyn DetailSource>,
    page: PageSnapshot,
) -> Vec<CharacterRecord> {
    let basics: Vec<BasicCharacter> = extract(page).collect();
    let extracted = basics.len();
    let records = fetch_details(source, basics).await;
    info!(extracted, merged = records.len(), "Ranking collection finished");
    records
}
