//! Git checkout via the `git` binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

use codedoc_core::CodedocError;

const ACCEPTED_SCHEMES: [&str; 4] = ["https://", "http://", "git@", "ssh://"];

/// Reject anything that is not a plain remote URL before it reaches `git`.
pub fn validate_repo_url(url: &str) -> Result<(), CodedocError> {
    if url.is_empty() {
        return Err(CodedocError::BadRequest("no repository URL provided".into()));
    }
    if url.starts_with('-') || url.chars().any(char::is_whitespace) {
        return Err(CodedocError::BadRequest(format!("invalid repository URL: {url}")));
    }
    if !ACCEPTED_SCHEMES.iter().any(|s| url.starts_with(s)) {
        return Err(CodedocError::BadRequest(format!(
            "unsupported repository URL scheme: {url}"
        )));
    }
    Ok(())
}

/// Per-repository checkout directory under `workspace`.
///
/// `https://github.com/acme/api.git` maps to `workspace/github.com-acme-api`.
pub fn checkout_dir(workspace: &Path, url: &str) -> PathBuf {
    let mut rest = url;
    for scheme in ACCEPTED_SCHEMES {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            break;
        }
    }
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut name: String = rest
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
        .collect();
    while name.contains("..") {
        name = name.replace("..", "-");
    }
    let name = name.trim_matches(|c| c == '.' || c == '-');
    let name = if name.is_empty() { "repository" } else { name };
    workspace.join(name)
}

/// Bring `dir` up to date with `url`: fast-forward pull when it already holds
/// a checkout, shallow clone otherwise.
pub async fn fetch_repository(url: &str, dir: &Path) -> Result<()> {
    validate_repo_url(url)?;

    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    if dir.join(".git").is_dir() {
        info!(url = %url, dir = %dir.display(), "Pulling repository");
        cmd.arg("-C").arg(dir).args(["pull", "--ff-only"]);
    } else {
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        info!(url = %url, dir = %dir.display(), "Cloning repository");
        cmd.args(["clone", "--depth", "1", "--", url]).arg(dir);
    }

    let output = cmd.output().await.context("Failed to run git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CodedocError::Repository(format!("git failed for {url}: {}", stderr.trim())).into());
    }
    Ok(())
}
