//! HTTP server assembly for the orgchart service.
//!
//! [`app`] wires the JSON API under `/api`, a `/health` check and request
//! tracing around any backend; the binary in `main.rs` supplies
//! configuration and the SQLite store.

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, routing::get};
use orgchart_api::Directory;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ORGCHART_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  pub const DEFAULT_HOST: &str = "127.0.0.1";
  pub const DEFAULT_PORT: u16 = 8080;
  pub const DEFAULT_STORE_PATH: &str = "orgchart.db";

  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", Self::DEFAULT_HOST)?
      .set_default("port", i64::from(Self::DEFAULT_PORT))?
      .set_default("store_path", Self::DEFAULT_STORE_PATH)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ORGCHART"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the complete application router for `store`.
pub fn app<S: Directory>(store: Arc<S>) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api", orgchart_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::{Request, StatusCode}};
  use orgchart_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[tokio::test]
  async fn health_is_public_and_api_is_nested() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = app(Arc::new(store));

    let res = app
      .clone()
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
      .oneshot(Request::builder().uri("/api/employees").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = ServerConfig::load(PathBuf::from("/nonexistent/orgchart.toml")).unwrap();
    assert_eq!(cfg.port, ServerConfig::DEFAULT_PORT);
    assert_eq!(cfg.store_path, PathBuf::from(ServerConfig::DEFAULT_STORE_PATH));
  }
}
