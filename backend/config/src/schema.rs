//! Typed configuration schema.
//!
//! Every section has defaults, so a partial (or missing) YAML file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub database: DatabaseConfig,
    pub docs: DocsConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Directory holding the built web client, served with an SPA fallback.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

/// AI provider selection and generation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Name of the provider requests are sent to ("gemini", "openrouter", "ollama").
    pub active: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Replaces the default system message used for documentation prompts.
    pub system_prompt: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub ollama_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            active: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_tokens: 8192,
            system_prompt: None,
            gemini_api_key: None,
            gemini_base_url: None,
            openrouter_api_key: None,
            ollama_url: None,
        }
    }
}

/// SQLite database the natural-language queries run against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. Query routes answer 500 when unset.
    pub path: Option<String>,
    /// Open the database read-only so generated SQL cannot modify it.
    pub read_only: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            read_only: true,
        }
    }
}

/// Repository documentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Directory repositories are cloned into.
    pub workspace_dir: String,
    /// Prefix of generated documentation files.
    pub output_file_name: String,
    /// Source file extensions (without dot) to document.
    pub extensions: Vec<String>,
    /// Files larger than this are skipped.
    pub max_file_bytes: u64,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            workspace_dir: "repos".to_string(),
            output_file_name: "PROJECT_DOCUMENTATION".to_string(),
            extensions: ["js", "ts", "jsx", "tsx"].iter().map(|s| s.to_string()).collect(),
            max_file_bytes: 200_000,
        }
    }
}

/// Chunked stream relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Fragments buffered between the model stream and the response body.
    pub queue_depth: usize,
    /// When non-zero, fragments are split on spaces and written one word at a
    /// time with this delay.
    pub word_delay_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_depth: 32,
            word_delay_ms: 0,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling NDJSON log files. Console only when unset.
    pub dir: Option<String>,
    /// Emit JSON on the console instead of human-readable lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.provider.active, "gemini");
        assert!(config.database.read_only);
        assert_eq!(config.docs.extensions, vec!["js", "ts", "jsx", "tsx"]);
        assert_eq!(config.relay.word_delay_ms, 0);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "provider:\n  active: ollama\n  model: llama3\ndatabase:\n  path: data.db\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.active, "ollama");
        assert_eq!(config.provider.max_tokens, 8192);
        assert_eq!(config.database.path.as_deref(), Some("data.db"));
        assert!(config.database.read_only);
        assert_eq!(config.server.port, 5000);
    }
}
