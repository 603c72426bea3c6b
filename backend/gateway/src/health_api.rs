//! Health API
//!
//! Liveness plus the provider this process talks to.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub database_configured: bool,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "codedoc",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.planner.provider_name().to_string(),
        database_configured: state.database.is_configured(),
    })
}
