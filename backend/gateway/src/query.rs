//! Natural-language SQL routes and database probes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use codedoc_logging::{EventLogger, RequestEvent};
use codedoc_store::{SchemaRow, format_schema_for_prompt};

use crate::error::ApiError;
use crate::server::GatewayState;

const NO_QUERY: &str = "Bad request: no query was provided.";
const SQL_FAILED: &str = "Failed to generate SQL query.";
const EXECUTION_FAILED: &str = "Error executing query.";

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(rename = "naturalLanguageQuery", default)]
    pub natural_language_query: Option<String>,
}

/// `POST /query`: question in, rows out.
pub async fn run_query(
    State(state): State<GatewayState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let question = body
        .ok()
        .and_then(|Json(req)| req.natural_language_query)
        .filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::BadRequest(NO_QUERY))?;

    let request_id = Uuid::new_v4().to_string();
    let schema = state
        .database
        .schema()
        .await
        .map_err(|e| ApiError::internal(SQL_FAILED, format!("{e:#}")))?;

    let prompt_schema = format_schema_for_prompt(&schema);
    EventLogger::log_event(
        &request_id,
        RequestEvent::PromptDispatched {
            route: "/query".into(),
            provider: state.planner.provider_name().into(),
            prompt_chars: question.len() + prompt_schema.len(),
        },
    );

    let sql = state
        .planner
        .generate_sql(&question, &prompt_schema)
        .await
        .map_err(|e| {
            EventLogger::log_event(&request_id, RequestEvent::Error { error_msg: format!("{e:#}") });
            ApiError::Internal(SQL_FAILED)
        })?;

    let rows = state
        .database
        .execute(&sql)
        .await
        .map_err(|e| ApiError::internal(EXECUTION_FAILED, format!("{e:#}")))?;

    info!(request_id = %request_id, rows = rows.len(), "Query executed");
    Ok(Json(rows))
}

/// `GET /schema`: the catalog as flat rows.
pub async fn get_schema(State(state): State<GatewayState>) -> Result<Json<Vec<SchemaRow>>, ApiError> {
    let schema = state
        .database
        .schema()
        .await
        .map_err(|e| ApiError::internal("Error getting schema.", format!("{e:#}")))?;
    Ok(Json(schema.rows()))
}

/// `POST /connect`: open and close a connection.
pub async fn connect(State(state): State<GatewayState>) -> Result<Json<Value>, ApiError> {
    state
        .database
        .ping()
        .await
        .map_err(|e| ApiError::internal("Error connecting to database.", format!("{e:#}")))?;
    Ok(Json(json!({ "message": "Connected to database" })))
}
