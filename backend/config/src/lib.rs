//! `codedoc-config`: CodeDoc runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, AI provider, database, documentation, relay, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution
//! - Environment variable overrides
//! - Config redaction for safe logging/display
//! - Validation

pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, collect_referenced_vars, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_raw};
pub use redact::redact;
pub use schema::{
    AppConfig, DatabaseConfig, DocsConfig, LoggingConfig, ProviderConfig, RelayConfig,
    ServerConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, substitute env vars, apply env overrides and validate a config file.
///
/// This is the main entry point for loading a config at runtime. A missing
/// file yields the defaults.
pub async fn load_and_prepare(path: &Path) -> Result<AppConfig> {
    let raw = load_raw(path).await?;

    // Substitute ${VAR} env vars.
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;

    let config: AppConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let env: std::collections::HashMap<String, String> = std::env::vars().collect();
    let config = apply_env_overrides(config, &env);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("{} configuration error(s); first: {}", report.errors.len(), report.errors[0]);
    }

    Ok(config)
}
