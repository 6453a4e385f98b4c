//! Detail Fetcher for charrank.
//!
//! Fans out one detail read per unique character id, waits for every read
//! to settle, and merges the successful ones into full records. A failing id
//! is logged and dropped; it never affects its siblings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::character::{BasicCharacter, CharacterDetail, CharacterRecord};
use crate::types::errors::FetchError;
use crate::types::settings::ApiSettings;

/// Read port for per-character detail metadata.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, id: &str) -> Result<CharacterDetail, FetchError>;
}

/// Detail source backed by the site's HTTP read API.
pub struct HttpDetailSource {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpDetailSource {
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: settings
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }

    /// The endpoint queried for `id`, if a base URL is configured.
    pub fn detail_url(&self, id: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/characters/{}", base, id))
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch_detail(&self, id: &str) -> Result<CharacterDetail, FetchError> {
        let url = self.detail_url(id).ok_or(FetchError::NotConfigured)?;

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body: Value = response.json().await?;
        parse_detail_response(body)
    }
}

/// Decodes a detail API body, accepting both `{"data": {...}}` and a bare object.
pub fn parse_detail_response(body: Value) -> Result<CharacterDetail, FetchError> {
    let inner = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(other) => {
                return Err(FetchError::Malformed(format!("`data` is not an object: {}", other)))
            }
            None => Value::Object(map),
        },
        other => return Err(FetchError::Malformed(format!("expected an object, got {}", other))),
    };
    serde_json::from_value(inner).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Fetches every id concurrently, one spawned task per id.
///
/// Completes once all tasks have settled. Results keep the order of `ids`.
pub async fn fetch_all(
    source: Arc<dyn DetailSource>,
    ids: Vec<String>,
) -> Vec<(String, Result<CharacterDetail, FetchError>)> {
    let handles = ids.iter().map(|id| {
        let source = Arc::clone(&source);
        let id = id.clone();
        tokio::spawn(async move { source.fetch_detail(&id).await })
    });

    let settled = join_all(handles).await;

    ids.into_iter()
        .zip(settled)
        .map(|(id, joined)| {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(FetchError::TaskFailed(e.to_string())),
            };
            (id, result)
        })
        .collect()
}

/// Augments basic records with their fetched detail.
///
/// Each unique id is fetched once and its detail is applied to every record
/// sharing that id. Records whose fetch failed are omitted. Output order is
/// the input order.
pub async fn fetch_details(
    source: Arc<dyn DetailSource>,
    basics: Vec<BasicCharacter>,
) -> Vec<CharacterRecord> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = basics
        .iter()
        .filter(|b| !b.id.is_empty())
        .filter(|b| seen.insert(b.id.clone()))
        .map(|b| b.id.clone())
        .collect();

    debug!(unique_ids = ids.len(), cards = basics.len(), "Fetching character details");

    let mut details: HashMap<String, CharacterDetail> = HashMap::with_capacity(ids.len());
    for (id, result) in fetch_all(source, ids).await {
        match result {
            Ok(detail) => {
                details.insert(id, detail);
            }
            Err(e) => warn!(id = %id, error = %e, "Failed to fetch character detail"),
        }
    }

    basics
        .into_iter()
        .filter_map(|basic| {
            let detail = details.get(&basic.id)?.clone();
            Some(CharacterRecord::merge(basic, detail))
        })
        .collect()
}
