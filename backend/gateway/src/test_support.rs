use std::path::Path;

use tokio::net::TcpListener;

use codedoc_config::{AppConfig, ProviderConfig};
use codedoc_planner::providers::MockProvider;
use codedoc_planner::{GenerationPolicy, LlmPlanner};

use crate::server::{GatewayState, build_router};

pub fn mock_state(provider: MockProvider) -> GatewayState {
    mock_state_with(provider, AppConfig::default())
}

pub fn mock_state_with(provider: MockProvider, config: AppConfig) -> GatewayState {
    let planner = LlmPlanner::new(
        std::sync::Arc::new(provider),
        GenerationPolicy::from(&ProviderConfig::default()),
    );
    GatewayState::new(config, planner)
}

/// Serve the full router on an ephemeral port; returns the base URL.
pub async fn spawn_app(state: GatewayState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

/// SQLite fixture with a small `users` table.
pub fn sqlite_fixture(dir: &Path) -> String {
    let path = dir.join("app.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO users (name) VALUES ('ada'), ('grace');",
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}
