//! charrank RPC server: JSON-RPC over stdin/stdout for the presentation layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"ranking.refresh", "params":{"page":{"cards":[...]}}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use charrank::app::App;
use charrank::rpc_handler::{handle_method, RpcContext};
use charrank::services::settings_engine::SettingsEngineTrait;

fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHARRANK_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("charrank")
    }
}

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> io::Result<()> {
    stdout.write_all(format!("{}\n", value).as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,charrank=debug")),
        )
        .init();

    let data_dir = data_dir();
    let settings_path = std::env::var("CHARRANK_SETTINGS").ok();
    let mut app = App::open(&data_dir, settings_path)?;

    if let Ok(base) = std::env::var("CHARRANK_API_BASE") {
        app.settings_engine
            .set_value("api.base_url", Value::String(base))?;
        app.rebuild_detail_source()?;
    }
    info!(data_dir = %data_dir.display(), "charrank RPC server starting");

    let ctx = Arc::new(RpcContext::new(app));
    ctx.sync_autosave().await;

    let mut stdout = io::stdout();
    write_line(&mut stdout, &json!({"event":"ready","version":env!("CARGO_PKG_VERSION")})).await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                write_line(&mut stdout, &json!({"id":null,"error":format!("parse error: {}",e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&ctx, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => {
                error!(method, error = %err, "RPC call failed");
                json!({"id": id, "error": err})
            }
        };
        write_line(&mut stdout, &response).await?;
    }

    info!("stdin closed, shutting down");
    ctx.autosave.lock().await.stop();
    Ok(())
}
