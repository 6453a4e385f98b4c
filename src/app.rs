//! App Core for charrank.
//!
//! The explicitly owned state object: ranking history, favorites, settings,
//! the latest ranking, and the comparison baseline. Constructed once per
//! process and passed by reference to whatever needs it.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::database::{Database, KeyValueStore};
use crate::managers::favorites_manager::{FavoritesManager, FavoritesManagerTrait};
use crate::managers::history_manager::{HistoryManager, HistoryManagerTrait};
use crate::services::aggregator::group_rankings;
use crate::services::detail_fetcher::{DetailSource, HttpDetailSource};
use crate::services::differ::{compare, prior_counts};
use crate::services::pipeline::collect_rankings;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::snapshot_io::{export_groups, import_snapshot};
use crate::types::character::{CharacterRecord, PageSnapshot};
use crate::types::diff::{CharacterDiff, ComparisonBaseline};
use crate::types::errors::{AppError, HistoryError};
use crate::types::history::HistorySummary;
use crate::types::ranking::RankingGroup;

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "charrank.db";

/// Result of one refresh pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// Nothing could be collected; history is unchanged.
    Empty,
    #[serde(rename_all = "camelCase")]
    Recorded {
        timestamp: String,
        characters: usize,
        groups: usize,
    },
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingView {
    pub groups: Vec<RankingGroup>,
    pub baseline: Option<ComparisonBaseline>,
    pub diffs: Vec<CharacterDiff>,
}

/// Central application state.
pub struct App {
    store: Arc<dyn KeyValueStore>,
    pub settings_engine: SettingsEngine,
    pub history: HistoryManager,
    pub favorites: FavoritesManager,
    detail_source: Arc<dyn DetailSource>,
    latest_page: Option<PageSnapshot>,
    current: Vec<CharacterRecord>,
    baseline: Option<ComparisonBaseline>,
}

impl App {
    /// Opens the database under `data_dir`, loads settings, and hydrates the stores.
    pub fn open(data_dir: &Path, settings_path: Option<String>) -> Result<Self, AppError> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        settings_engine.load()?;

        let store: Arc<dyn KeyValueStore> = Arc::new(Database::open(data_dir.join(DATABASE_FILE))?);
        let detail_source: Arc<dyn DetailSource> = Arc::new(
            HttpDetailSource::new(&settings_engine.get_settings().api)
                .map_err(|e| AppError::Client(e.to_string()))?,
        );

        Self::with_parts(store, detail_source, settings_engine)
    }

    /// Builds an App from already-constructed parts. The settings engine is
    /// used as-is; call `load` on it beforehand if needed.
    pub fn with_parts(
        store: Arc<dyn KeyValueStore>,
        detail_source: Arc<dyn DetailSource>,
        settings_engine: SettingsEngine,
    ) -> Result<Self, AppError> {
        let capacity = settings_engine.get_settings().history.capacity;
        let history = HistoryManager::load(Arc::clone(&store), capacity)?;
        let favorites = FavoritesManager::load(Arc::clone(&store))?;
        let current = history.latest().map(|r| r.data.clone()).unwrap_or_default();

        info!(history = history.len(), capacity, "App state hydrated");

        Ok(Self {
            store,
            settings_engine,
            history,
            favorites,
            detail_source,
            latest_page: None,
            current,
            baseline: None,
        })
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    pub fn detail_source(&self) -> Arc<dyn DetailSource> {
        Arc::clone(&self.detail_source)
    }

    pub fn set_detail_source(&mut self, source: Arc<dyn DetailSource>) {
        self.detail_source = source;
    }

    /// Rebuilds the HTTP detail source from the current API settings.
    pub fn rebuild_detail_source(&mut self) -> Result<(), AppError> {
        let source = HttpDetailSource::new(&self.settings_engine.get_settings().api)
            .map_err(|e| AppError::Client(e.to_string()))?;
        self.detail_source = Arc::new(source);
        Ok(())
    }

    /// Remembers the latest page snapshot for manual and scheduled refreshes.
    pub fn set_page(&mut self, page: PageSnapshot) {
        self.latest_page = Some(page);
    }

    pub fn latest_page(&self) -> Option<&PageSnapshot> {
        self.latest_page.as_ref()
    }

    /// Records the outcome of a collection pass.
    ///
    /// A non-empty result becomes the current ranking and is appended to the
    /// history; an empty one is reported as [`RefreshOutcome::Empty`]. Only a
    /// failed history write fails the pass.
    pub fn record_rankings(
        &mut self,
        records: Vec<CharacterRecord>,
    ) -> Result<RefreshOutcome, AppError> {
        let records: Vec<CharacterRecord> =
            records.into_iter().filter(|r| !r.id.is_empty()).collect();
        if records.is_empty() {
            return Ok(RefreshOutcome::Empty);
        }

        let saved = self.history.append(records.clone())?;
        let groups = group_rankings(&records).len();
        let characters = records.len();
        self.current = records;

        // The nickname cache is auxiliary; the ranking is already recorded.
        if let Err(e) = self.favorites.remember_creators(&self.current) {
            warn!(error = %e, "Failed to update creator nickname cache");
        }

        Ok(RefreshOutcome::Recorded {
            timestamp: saved.timestamp,
            characters,
            groups,
        })
    }

    pub fn current(&self) -> &[CharacterRecord] {
        &self.current
    }

    /// Grouped current ranking, including records that cannot be rendered.
    pub fn groups(&self) -> Vec<RankingGroup> {
        group_rankings(&self.current)
    }

    /// Grouped ranking plus comparison data, with unrenderable records skipped.
    pub fn view(&self) -> RankingView {
        let renderable: Vec<CharacterRecord> = self
            .current
            .iter()
            .filter(|r| r.is_renderable())
            .cloned()
            .collect();
        let diffs = match &self.baseline {
            Some(baseline) => compare(&renderable, &baseline.prior_counts),
            None => Vec::new(),
        };
        RankingView {
            groups: group_rankings(&renderable),
            baseline: self.baseline.clone(),
            diffs,
        }
    }

    pub fn baseline(&self) -> Option<&ComparisonBaseline> {
        self.baseline.as_ref()
    }

    /// Uses the history entry with `timestamp` as the comparison baseline.
    pub fn compare_with_history(&mut self, timestamp: &str) -> Result<&ComparisonBaseline, AppError> {
        let record = self
            .history
            .get(timestamp)
            .ok_or_else(|| HistoryError::NotFound(timestamp.to_string()))?;
        let baseline = ComparisonBaseline {
            prior_counts: prior_counts(&record.data),
            prior_timestamp: Some(record.timestamp.clone()),
        };
        Ok(&*self.baseline.insert(baseline))
    }

    /// Uses an imported snapshot file as the comparison baseline.
    ///
    /// A malformed document leaves the current baseline untouched.
    pub fn compare_with_import(&mut self, document: &str) -> Result<&ComparisonBaseline, AppError> {
        let imported = import_snapshot(document)?;
        let baseline = ComparisonBaseline {
            prior_counts: prior_counts(&imported.records),
            prior_timestamp: imported.timestamp,
        };
        Ok(&*self.baseline.insert(baseline))
    }

    pub fn clear_comparison(&mut self) {
        self.baseline = None;
    }

    /// Serializes the current grouped ranking for download.
    pub fn export_current(&self) -> Result<String, AppError> {
        Ok(export_groups(&self.groups())?)
    }

    pub fn history_summaries(&self) -> Vec<HistorySummary> {
        self.history.list().into_iter().map(HistorySummary::from).collect()
    }

    pub fn delete_history(&mut self, timestamp: &str) -> Result<bool, AppError> {
        Ok(self.history.delete(timestamp)?)
    }

    pub fn toggle_favorite(&mut self, creator_id: &str) -> Result<bool, AppError> {
        Ok(self.favorites.toggle(creator_id)?)
    }

    /// Persists a new autosave interval.
    pub fn set_autosave_interval(&mut self, minutes: u32) -> Result<(), AppError> {
        self.settings_engine
            .set_value("autosave.interval_minutes", serde_json::json!(minutes))?;
        Ok(())
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) -> Result<(), AppError> {
        self.settings_engine
            .set_value("autosave.enabled", serde_json::json!(enabled))?;
        Ok(())
    }

    /// Applies a history capacity change from settings to the live store.
    pub fn set_history_capacity(&mut self, capacity: usize) -> Result<(), AppError> {
        self.settings_engine
            .set_value("history.capacity", serde_json::json!(capacity))?;
        self.history.set_capacity(capacity)?;
        Ok(())
    }
}

/// Runs one refresh pass against a shared App.
///
/// The lock is held only to read inputs and to record the result, so manual
/// and scheduled refreshes can interleave; the last one to finish wins.
pub async fn refresh(app: &Mutex<App>, page: Option<PageSnapshot>) -> Result<RefreshOutcome, AppError> {
    let (source, page) = {
        let mut guard = app.lock().await;
        if let Some(page) = page {
            guard.set_page(page);
        }
        let page = guard.latest_page().cloned().ok_or(AppError::NoPageSnapshot)?;
        (guard.detail_source(), page)
    };

    let records = collect_rankings(source, page).await;

    app.lock().await.record_rankings(records)
}
