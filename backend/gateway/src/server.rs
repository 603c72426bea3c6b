//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, instrument, warn};

use codedoc_config::AppConfig;
use codedoc_planner::{LlmPlanner, ProviderRegistry};
use codedoc_store::SqlDatabase;

use crate::{documents, health_api, query, relay};

/// Application state shared across routes.
///
/// Built once at start-up and only read afterwards.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub planner: Arc<LlmPlanner>,
    pub database: Arc<SqlDatabase>,
}

impl GatewayState {
    pub fn new(config: AppConfig, planner: LlmPlanner) -> Self {
        let database = SqlDatabase::new(&config.database);
        Self {
            config: Arc::new(config),
            planner: Arc::new(planner),
            database: Arc::new(database),
        }
    }

    /// Wire the configured provider and database.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.provider);
        let planner = LlmPlanner::from_config(&registry, &config.provider)?;
        Ok(Self::new(config, planner))
    }
}

/// Build the router with every route, CORS, request tracing and, when
/// configured, the static client.
pub fn build_router(state: GatewayState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    let mut app = Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/query", post(query::run_query))
        .route("/schema", get(query::get_schema))
        .route("/connect", post(query::connect))
        .route("/generalquery", post(relay::general_query))
        .route(
            "/generateDocument",
            get(documents::document_repository).post(documents::document_content),
        )
        .route("/getDocx", post(documents::get_docx))
        .with_state(state);

    if let Some(dir) = static_dir {
        let dir = PathBuf::from(dir);
        if !dir.join("index.html").is_file() {
            warn!(dir = %dir.display(), "Static directory has no index.html");
        }
        let spa = ServeDir::new(&dir).fallback(ServeFile::new(dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("CodeDoc server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
