//! RPC method handler for the charrank JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches the presentation layer's intents to the `App`.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::{refresh, App};
use crate::managers::favorites_manager::FavoritesManagerTrait;
use crate::services::autosave::AutosaveScheduler;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::character::PageSnapshot;

/// Shared state behind the RPC loop.
pub struct RpcContext {
    pub app: Arc<Mutex<App>>,
    pub autosave: Mutex<AutosaveScheduler>,
}

impl RpcContext {
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
            autosave: Mutex::new(AutosaveScheduler::new()),
        }
    }

    /// Starts or stops the autosave timer to match the current settings.
    pub async fn sync_autosave(&self) {
        let settings = self.app.lock().await.settings_engine.get_settings().autosave.clone();
        self.autosave
            .lock()
            .await
            .apply(Arc::clone(&self.app), &settings);
    }
}

fn parse_page(value: &Value) -> Result<PageSnapshot, String> {
    serde_json::from_value(value.clone()).map_err(|e| format!("invalid page: {}", e))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(ctx: &RpcContext, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Ranking ───
        "ranking.refresh" => {
            let page = match params.get("page") {
                Some(v) if !v.is_null() => Some(parse_page(v)?),
                _ => None,
            };
            let outcome = refresh(&ctx.app, page).await.map_err(|e| e.to_string())?;
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }
        "page.update" => {
            let page = parse_page(params.get("page").ok_or("missing page")?)?;
            let cards = page.cards.len();
            ctx.app.lock().await.set_page(page);
            Ok(json!({"ok": true, "cards": cards}))
        }
        "ranking.view" => {
            let view = ctx.app.lock().await.view();
            serde_json::to_value(view).map_err(|e| e.to_string())
        }
        "ranking.export" => {
            let document = ctx.app.lock().await.export_current().map_err(|e| e.to_string())?;
            Ok(json!({"document": document}))
        }
        "ranking.compare_history" => {
            let timestamp = params.get("timestamp").and_then(|v| v.as_str()).ok_or("missing timestamp")?;
            let mut a = ctx.app.lock().await;
            let baseline = a.compare_with_history(timestamp).map_err(|e| e.to_string())?;
            Ok(json!({"priorTimestamp": baseline.prior_timestamp, "characters": baseline.prior_counts.len()}))
        }
        "ranking.compare_import" => {
            let document = match params.get("document") {
                Some(Value::String(text)) => text.clone(),
                Some(other) if !other.is_null() => other.to_string(),
                _ => return Err("missing document".to_string()),
            };
            let mut a = ctx.app.lock().await;
            let baseline = a.compare_with_import(&document).map_err(|e| e.to_string())?;
            Ok(json!({"priorTimestamp": baseline.prior_timestamp, "characters": baseline.prior_counts.len()}))
        }
        "ranking.clear_comparison" => {
            ctx.app.lock().await.clear_comparison();
            Ok(json!({"ok": true}))
        }

        // ─── History ───
        "history.list" => {
            let summaries = ctx.app.lock().await.history_summaries();
            serde_json::to_value(summaries).map_err(|e| e.to_string())
        }
        "history.delete" => {
            let timestamp = params.get("timestamp").and_then(|v| v.as_str()).ok_or("missing timestamp")?;
            let deleted = ctx.app.lock().await.delete_history(timestamp).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "deleted": deleted}))
        }

        // ─── Favorites ───
        "favorites.toggle" => {
            let creator_id = params.get("creator_id").and_then(|v| v.as_str()).ok_or("missing creator_id")?;
            let favorite = ctx.app.lock().await.toggle_favorite(creator_id).map_err(|e| e.to_string())?;
            Ok(json!({"creator_id": creator_id, "favorite": favorite}))
        }
        "favorites.list" => {
            let favorites = ctx.app.lock().await.favorites.list();
            serde_json::to_value(favorites).map_err(|e| e.to_string())
        }

        // ─── Settings ───
        "settings.get" => {
            let a = ctx.app.lock().await;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set_autosave_interval" => {
            let minutes = params.get("minutes").and_then(|v| v.as_u64()).ok_or("missing minutes")?;
            let minutes = u32::try_from(minutes).map_err(|_| "minutes out of range".to_string())?;
            ctx.app.lock().await.set_autosave_interval(minutes).map_err(|e| e.to_string())?;
            ctx.sync_autosave().await;
            Ok(json!({"ok": true, "interval_minutes": minutes}))
        }
        "settings.set_autosave_enabled" => {
            let enabled = params.get("enabled").and_then(|v| v.as_bool()).ok_or("missing enabled")?;
            ctx.app.lock().await.set_autosave_enabled(enabled).map_err(|e| e.to_string())?;
            ctx.sync_autosave().await;
            Ok(json!({"ok": true, "enabled": enabled}))
        }
        "settings.set_api_base" => {
            let base_url = match params.get("base_url") {
                Some(Value::String(url)) if !url.trim().is_empty() => Value::String(url.trim().to_string()),
                Some(Value::String(_)) | Some(Value::Null) | None => Value::Null,
                Some(_) => return Err("invalid base_url".to_string()),
            };
            let mut a = ctx.app.lock().await;
            a.settings_engine.set_value("api.base_url", base_url).map_err(|e| e.to_string())?;
            a.rebuild_detail_source().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
