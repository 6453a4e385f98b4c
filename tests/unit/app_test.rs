//! End-to-end tests of the App state object against a scripted detail source
//! and an in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use charrank::app::{refresh, App, RefreshOutcome};
use charrank::database::{KeyValueStore, MemoryStore};
use charrank::managers::favorites_manager::{FavoritesManagerTrait, CREATOR_NAMES_KEY};
use charrank::managers::history_manager::HistoryManagerTrait;
use charrank::services::autosave::AutosaveScheduler;
use charrank::services::detail_fetcher::DetailSource;
use charrank::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use charrank::types::character::{CardNode, CharacterDetail, CharacterRecord, Creator, PageSnapshot};
use charrank::types::diff::{Comparison, Trend};
use charrank::types::errors::{AppError, FetchError, HistoryError, ImportError, StorageError};
use charrank::types::ranking::TOP_SECTION_TITLE;
use charrank::types::settings::AutosaveSettings;

/// Serves counts from a mutable table; unknown ids fail.
#[derive(Default)]
struct TableSource {
    counts: StdMutex<HashMap<String, u64>>,
}

impl TableSource {
    fn with(pairs: &[(&str, u64)]) -> Arc<Self> {
        let source = Self::default();
        source.set(pairs);
        Arc::new(source)
    }

    fn set(&self, pairs: &[(&str, u64)]) {
        let mut counts = self.counts.lock().unwrap();
        for (id, count) in pairs {
            counts.insert(id.to_string(), *count);
        }
    }
}

#[async_trait]
impl DetailSource for TableSource {
    async fn fetch_detail(&self, id: &str) -> Result<CharacterDetail, FetchError> {
        let count = self.counts.lock().unwrap().get(id).copied();
        match count {
            Some(count) => Ok(CharacterDetail {
                interaction_count_with_regen: count,
                hashtags: Vec::new(),
                created_at: "2024-05-01T00:00:00Z".to_string(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Like `TableSource`, but every read takes `delay`.
struct SlowSource {
    delay: Duration,
    inner: Arc<TableSource>,
}

#[async_trait]
impl DetailSource for SlowSource {
    async fn fetch_detail(&self, id: &str) -> Result<CharacterDetail, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_detail(id).await
    }
}

/// In-memory store that refuses writes to one key.
struct RejectingStore {
    inner: MemoryStore,
    rejected: &'static str,
}

impl KeyValueStore for RejectingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        if key == self.rejected {
            return Err(StorageError::Backend("read-only key".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

fn card(id: &str, section: Option<&str>) -> CardNode {
    CardNode {
        href: Some(format!("/characters/{}", id)),
        name: Some(format!("name-{}", id)),
        image_url: Some(format!("https://img.example/{}.png", id)),
        creator_href: Some("/creators/c1".to_string()),
        creator_nickname: Some("@maker".to_string()),
        section_title: section.map(str::to_string),
    }
}

fn page() -> PageSnapshot {
    PageSnapshot {
        cards: vec![
            card("q1", Some("퀘스트")),
            card("t1", Some(TOP_SECTION_TITLE)),
            card("t2", Some(TOP_SECTION_TITLE)),
            CardNode {
                href: Some("/about".to_string()),
                ..CardNode::default()
            },
        ],
    }
}

fn record(id: &str, count: u64) -> CharacterRecord {
    CharacterRecord {
        id: id.to_string(),
        name: format!("name-{}", id),
        image_url: format!("https://img.example/{}.png", id),
        creator: Creator {
            id: Some("c1".to_string()),
            nickname: "maker".to_string(),
        },
        section_title: TOP_SECTION_TITLE.to_string(),
        interaction_count_with_regen: count,
        hashtags: Vec::new(),
        created_at: String::new(),
    }
}

fn app_with(source: Arc<dyn DetailSource>) -> (TempDir, Arc<dyn KeyValueStore>, App) {
    let dir = TempDir::new().unwrap();
    let settings = SettingsEngine::new(Some(
        dir.path().join("settings.json").to_string_lossy().to_string(),
    ));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = App::with_parts(Arc::clone(&store), source, settings).unwrap();
    (dir, store, app)
}

#[tokio::test]
async fn test_refresh_records_grouped_ranking() {
    let source = TableSource::with(&[("q1", 5), ("t1", 100), ("t2", 300)]);
    let (_dir, _store, app) = app_with(source);
    let app = Mutex::new(app);

    let outcome = refresh(&app, Some(page())).await.unwrap();
    match outcome {
        RefreshOutcome::Recorded {
            characters, groups, ..
        } => {
            assert_eq!(characters, 3);
            assert_eq!(groups, 2);
        }
        other => panic!("expected a recorded ranking, got {:?}", other),
    }

    let app = app.lock().await;
    assert_eq!(app.history.len(), 1);
    assert_eq!(app.favorites.nickname("c1"), Some("maker"));

    let view = app.view();
    assert_eq!(view.groups[0].title, TOP_SECTION_TITLE);
    let top: Vec<&str> = view.groups[0].characters.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(top, vec!["t2", "t1"]);
    assert!(view.diffs.is_empty());
}

#[tokio::test]
async fn test_refresh_without_page_fails() {
    let (_dir, _store, app) = app_with(TableSource::with(&[]));
    let app = Mutex::new(app);

    assert!(matches!(
        refresh(&app, None).await,
        Err(AppError::NoPageSnapshot)
    ));
}

#[tokio::test]
async fn test_refresh_reuses_latest_page() {
    let source = TableSource::with(&[("q1", 1), ("t1", 1), ("t2", 1)]);
    let (_dir, _store, app) = app_with(source);
    let app = Mutex::new(app);

    app.lock().await.set_page(page());
    let outcome = refresh(&app, None).await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::Recorded { characters: 3, .. }));
}

#[tokio::test]
async fn test_empty_refresh_does_not_touch_history() {
    let (_dir, _store, app) = app_with(TableSource::with(&[]));
    let app = Mutex::new(app);

    let outcome = refresh(&app, Some(page())).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Empty);
    assert!(app.lock().await.history.is_empty());
}

#[test]
fn test_compare_with_history_produces_diffs() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    app.history
        .append_at(vec![record("a", 100), record("b", 10)], "2024-05-01T00:00:00.000Z")
        .unwrap();
    app.record_rankings(vec![record("a", 150), record("b", 10), record("c", 1)])
        .unwrap();

    let baseline = app.compare_with_history("2024-05-01T00:00:00.000Z").unwrap();
    assert_eq!(
        baseline.prior_timestamp.as_deref(),
        Some("2024-05-01T00:00:00.000Z")
    );

    let view = app.view();
    let by_id: HashMap<&str, &Comparison> = view
        .diffs
        .iter()
        .map(|d| (d.id.as_str(), &d.comparison))
        .collect();
    assert_eq!(
        by_id["a"],
        &Comparison::Change {
            delta: 50,
            trend: Trend::Growth,
            percent: 50.0
        }
    );
    assert!(matches!(by_id["b"], Comparison::Change { trend: Trend::Neutral, .. }));
    assert_eq!(by_id["c"], &Comparison::NoData);

    app.clear_comparison();
    assert!(app.baseline().is_none());
    assert!(app.view().diffs.is_empty());
}

#[test]
fn test_compare_with_unknown_history_fails() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    assert!(matches!(
        app.compare_with_history("nope"),
        Err(AppError::History(HistoryError::NotFound(_)))
    ));
}

#[test]
fn test_malformed_import_keeps_previous_baseline() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    app.record_rankings(vec![record("a", 10)]).unwrap();

    let document = json!([{"id": "a", "interactionCountWithRegen": 4}]).to_string();
    app.compare_with_import(&document).unwrap();

    let result = app.compare_with_import("not json at all");
    assert!(matches!(result, Err(AppError::Import(ImportError::Parse(_)))));
    assert_eq!(app.baseline().unwrap().prior_counts.get("a"), Some(&4));
}

#[test]
fn test_export_round_trips_through_import() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    app.record_rankings(vec![record("a", 10), record("b", 20)]).unwrap();

    let document = app.export_current().unwrap();
    app.compare_with_import(&document).unwrap();

    for diff in app.view().diffs {
        assert!(matches!(
            diff.comparison,
            Comparison::Change { delta: 0, trend: Trend::Neutral, .. }
        ));
    }
}

#[test]
fn test_view_skips_unrenderable_records() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    let mut nameless = record("x", 999);
    nameless.name.clear();
    app.record_rankings(vec![record("a", 1), nameless]).unwrap();

    assert_eq!(app.current().len(), 2);
    let view = app.view();
    let ids: Vec<&str> = view.groups[0].characters.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a"]);
}

#[test]
fn test_latest_history_hydrates_current_ranking() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let dir = TempDir::new().unwrap();
    let settings_path = dir.path().join("settings.json").to_string_lossy().to_string();
    {
        let mut app = App::with_parts(
            Arc::clone(&store),
            TableSource::with(&[]),
            SettingsEngine::new(Some(settings_path.clone())),
        )
        .unwrap();
        app.record_rankings(vec![record("a", 42)]).unwrap();
    }

    let app = App::with_parts(
        store,
        TableSource::with(&[]),
        SettingsEngine::new(Some(settings_path)),
    )
    .unwrap();
    assert_eq!(app.current().len(), 1);
    assert_eq!(app.current()[0].interaction_count_with_regen, 42);
}

#[test]
fn test_delete_history_and_summaries() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    app.history.append_at(vec![record("a", 1)], "t1").unwrap();
    app.history
        .append_at(vec![record("a", 1), record("b", 2)], "t2")
        .unwrap();

    let summaries = app.history_summaries();
    assert_eq!(summaries[0].timestamp, "t2");
    assert_eq!(summaries[0].count, 2);

    assert!(app.delete_history("t1").unwrap());
    assert!(!app.delete_history("t1").unwrap());
    assert_eq!(app.history_summaries().len(), 1);
}

#[test]
fn test_settings_changes_apply_to_state() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));

    app.set_autosave_interval(5).unwrap();
    app.set_autosave_enabled(false).unwrap();
    let autosave = &app.settings_engine.get_settings().autosave;
    assert_eq!(autosave.interval_minutes, 5);
    assert!(!autosave.enabled);

    assert!(app.set_autosave_interval(0).is_err());
    assert_eq!(app.settings_engine.get_settings().autosave.interval_minutes, 5);

    for i in 0..4 {
        app.history.append_at(Vec::new(), &format!("t{}", i)).unwrap();
    }
    app.set_history_capacity(2).unwrap();
    assert_eq!(app.history.len(), 2);
}

#[test]
fn test_toggle_favorite_through_app() {
    let (_dir, _store, mut app) = app_with(TableSource::with(&[]));
    assert!(app.toggle_favorite("c1").unwrap());
    assert!(app.favorites.is_favorite("c1"));
}

#[tokio::test]
async fn test_autosave_records_periodically_and_stops() {
    let source = TableSource::with(&[("q1", 1), ("t1", 2), ("t2", 3)]);
    let (_dir, _store, mut app) = app_with(source);
    app.set_page(page());
    let app = Arc::new(Mutex::new(app));

    let mut scheduler = AutosaveScheduler::new();
    scheduler.start(Arc::clone(&app), Duration::from_millis(40));
    assert!(scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.stop();
    assert!(!scheduler.is_running());

    // Let a pass that was already running finish.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let recorded = app.lock().await.history.len();
    assert!(recorded >= 1, "autosave should have recorded at least once");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(app.lock().await.history.len(), recorded);
}

#[tokio::test]
async fn test_autosave_apply_follows_settings() {
    let (_dir, _store, app) = app_with(TableSource::with(&[]));
    let app = Arc::new(Mutex::new(app));
    let mut scheduler = AutosaveScheduler::new();

    scheduler.apply(
        Arc::clone(&app),
        &AutosaveSettings {
            enabled: true,
            interval_minutes: 30,
        },
    );
    assert_eq!(scheduler.period(), Some(Duration::from_secs(1800)));

    scheduler.apply(
        Arc::clone(&app),
        &AutosaveSettings {
            enabled: true,
            interval_minutes: 5,
        },
    );
    assert_eq!(scheduler.period(), Some(Duration::from_secs(300)));

    scheduler.apply(
        app,
        &AutosaveSettings {
            enabled: false,
            interval_minutes: 5,
        },
    );
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.period(), None);
}

#[tokio::test]
async fn test_interval_change_lets_running_pass_finish() {
    let source = Arc::new(SlowSource {
        delay: Duration::from_millis(200),
        inner: TableSource::with(&[("q1", 1), ("t1", 2), ("t2", 3)]),
    });
    let (_dir, _store, mut app) = app_with(source);
    app.set_page(page());
    let app = Arc::new(Mutex::new(app));

    let mut scheduler = AutosaveScheduler::new();
    scheduler.start(Arc::clone(&app), Duration::from_millis(50));

    // First pass starts at 50 ms and is still fetching at 120 ms.
    tokio::time::sleep(Duration::from_millis(120)).await;
    scheduler.start(Arc::clone(&app), Duration::from_secs(3600));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(app.lock().await.history.len(), 1);
    scheduler.stop();
}

#[test]
fn test_nickname_cache_failure_keeps_recorded_ranking() {
    let dir = TempDir::new().unwrap();
    let settings = SettingsEngine::new(Some(
        dir.path().join("settings.json").to_string_lossy().to_string(),
    ));
    let store: Arc<dyn KeyValueStore> = Arc::new(RejectingStore {
        inner: MemoryStore::new(),
        rejected: CREATOR_NAMES_KEY,
    });
    let mut app = App::with_parts(store, TableSource::with(&[]), settings).unwrap();

    let outcome = app.record_rankings(vec![record("a", 10)]).unwrap();
    assert!(matches!(outcome, RefreshOutcome::Recorded { characters: 1, .. }));
    assert_eq!(app.history.len(), 1);
    assert_eq!(app.current().len(), 1);
    assert_eq!(app.favorites.nickname("c1"), None);
}
