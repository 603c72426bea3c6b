//! Config validation with user-friendly error messages.

use crate::schema::AppConfig;
use thiserror::Error;

/// Provider names the runtime knows how to construct.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini", "openrouter", "ollama", "mock"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_provider(config, &mut report);
    validate_database(config, &mut report);
    validate_docs(config, &mut report);
    validate_relay(config, &mut report);
    report
}

fn validate_server(config: &AppConfig, report: &mut ValidationReport) {
    if config.server.port == 0 {
        report.error("server.port", "Port must be between 1 and 65535");
    }
    if config.server.bind_address.trim().is_empty() {
        report.error("server.bind_address", "Bind address cannot be empty");
    }
}

fn validate_provider(config: &AppConfig, report: &mut ValidationReport) {
    let provider = &config.provider;
    if !KNOWN_PROVIDERS.contains(&provider.active.as_str()) {
        report.error(
            "provider.active",
            format!(
                "Unknown provider '{}'; expected one of {}",
                provider.active,
                KNOWN_PROVIDERS.join(", ")
            ),
        );
    }
    if provider.model.trim().is_empty() {
        report.error("provider.model", "Model cannot be empty");
    }
    if !(0.0..=2.0).contains(&provider.temperature) {
        report.error("provider.temperature", "Temperature must be between 0.0 and 2.0");
    }
    if provider.max_tokens == 0 {
        report.error("provider.max_tokens", "max_tokens must be greater than 0");
    }
    match provider.active.as_str() {
        "gemini" if provider.gemini_api_key.is_none() => {
            report.warn("provider.gemini_api_key", "Gemini is active but no API key is set; AI calls will fail");
        }
        "openrouter" if provider.openrouter_api_key.is_none() => {
            report.warn("provider.openrouter_api_key", "OpenRouter is active but no API key is set; AI calls will fail");
        }
        _ => {}
    }
}

fn validate_database(config: &AppConfig, report: &mut ValidationReport) {
    if config.database.path.is_none() {
        report.warn("database.path", "No database configured; /query and /schema will fail");
    }
}

fn validate_docs(config: &AppConfig, report: &mut ValidationReport) {
    if config.docs.extensions.is_empty() {
        report.warn("docs.extensions", "No extensions listed; repository documentation will be empty");
    }
    if config.docs.extensions.iter().any(|e| e.starts_with('.')) {
        report.error("docs.extensions", "Extensions are listed without the leading dot");
    }
    if config.docs.output_file_name.contains('/') || config.docs.output_file_name.contains('\\') {
        report.error("docs.output_file_name", "Output file name cannot contain path separators");
    }
}

fn validate_relay(config: &AppConfig, report: &mut ValidationReport) {
    if config.relay.queue_depth == 0 {
        report.error("relay.queue_depth", "Queue depth must be at least 1");
    }
}
