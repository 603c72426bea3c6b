//! Documentation routes.
//!
//! `GET /generateDocument` documents a whole repository into one Markdown
//! file; `POST /generateDocument` documents a single pasted file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use codedoc_core::SourceFile;
use codedoc_logging::{EventLogger, RequestEvent};
use codedoc_planner::prompts::DEFAULT_EXTENSION;
use codedoc_repo::{checkout_dir, collect_source_files, fetch_repository, validate_repo_url};

use crate::error::ApiError;
use crate::server::GatewayState;

const NO_REPOSITORY: &str = "Bad request: no repository was provided.";
const INVALID_REPOSITORY: &str = "Bad request: invalid repository URL.";
const NO_CONTENT: &str = "Bad request: no content provided";

#[derive(Debug, Deserialize)]
pub struct RepositoryQuery {
    #[serde(rename = "gitRepo")]
    pub git_repo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    #[serde(rename = "fileContent", default)]
    pub file_content: Option<String>,
    #[serde(rename = "userPrompt", default)]
    pub user_prompt: Option<String>,
}

/// `GET /generateDocument?gitRepo=<url>`: clone or update, document every
/// matching file, write the result next to the checkout and send it.
pub async fn document_repository(
    State(state): State<GatewayState>,
    Query(query): Query<RepositoryQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .git_repo
        .filter(|u| !u.trim().is_empty())
        .ok_or(ApiError::BadRequest(NO_REPOSITORY))?;
    validate_repo_url(&url).map_err(|_| ApiError::BadRequest(INVALID_REPOSITORY))?;

    let request_id = Uuid::new_v4().to_string();
    let dir = checkout_dir(Path::new(&state.config.docs.workspace_dir), &url);
    fetch_repository(&url, &dir)
        .await
        .map_err(|e| log_failure(&request_id, e))?;

    let (path, markdown) = document_checkout(&state, &request_id, &dir)
        .await
        .map_err(|e| log_failure(&request_id, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        markdown,
    )
        .into_response())
}

/// Document the files under `dir` and write the timestamped Markdown file
/// into it. Returns the written path and its content.
async fn document_checkout(state: &GatewayState, request_id: &str, dir: &Path) -> Result<(PathBuf, String)> {
    let docs = &state.config.docs;
    let root = dir.to_path_buf();
    let extensions = docs.extensions.clone();
    let max_bytes = docs.max_file_bytes;
    let files = tokio::task::spawn_blocking(move || collect_source_files(&root, &extensions, max_bytes))
        .await
        .context("File collection task failed")??;
    info!(request_id = %request_id, files = files.len(), "Documenting repository");

    let markdown = state.planner.document_project(&files).await;

    let path = dir.join(format!("{}{}.md", docs.output_file_name, Utc::now().timestamp_millis()));
    tokio::fs::write(&path, &markdown)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    EventLogger::log_event(
        request_id,
        RequestEvent::DocumentWritten {
            path: path.display().to_string(),
            files: files.len(),
        },
    );
    Ok((path, markdown))
}

/// `POST /generateDocument`: structured documentation for one pasted file.
pub async fn document_content(
    State(state): State<GatewayState>,
    body: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest(NO_CONTENT))?;
    let content = request
        .file_content
        .filter(|c| !c.trim().is_empty())
        .ok_or(ApiError::BadRequest(NO_CONTENT))?;
    let user_prompt = request.user_prompt.filter(|p| !p.trim().is_empty());

    let request_id = Uuid::new_v4().to_string();
    EventLogger::log_event(
        &request_id,
        RequestEvent::PromptDispatched {
            route: "/generateDocument".into(),
            provider: state.planner.provider_name().into(),
            prompt_chars: content.len() + user_prompt.as_deref().map_or(0, str::len),
        },
    );

    let extension = match &user_prompt {
        Some(prompt) => state.planner.detect_extension(prompt).await,
        None => DEFAULT_EXTENSION.to_string(),
    };
    let file = SourceFile {
        path: PathBuf::from(format!("UserInput{extension}")),
        relative_path: "UserInput".to_string(),
        content,
    };

    state
        .planner
        .document_file(&file, user_prompt.as_deref(), true)
        .await
        .map_err(|e| log_failure(&request_id, e))
}

/// `POST /getDocx`
pub async fn get_docx() -> ApiError {
    ApiError::NotImplemented("DOCX export is not supported.")
}

fn log_failure(request_id: &str, err: anyhow::Error) -> ApiError {
    EventLogger::log_event(request_id, RequestEvent::Error { error_msg: format!("{err:#}") });
    ApiError::InternalJson
}
