use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use codedoc_config::ProviderConfig;
use codedoc_core::{ChatTurn, CodedocError, LlmProvider, LlmRequest, SourceFile, TextStream};
use codedoc_markdown::CodeBlockAnalyzer;

use crate::prompts;
use crate::providers::ProviderRegistry;

/// Placeholder section body for a file the model failed to document.
pub const FILE_DOC_FAILED: &str = "Error generating documentation.";

/// Model selection and sampling settings shared by every call.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Replaces [`prompts::DOC_SYSTEM_MESSAGE`] for documentation calls.
    pub system_prompt: Option<String>,
}

impl From<&ProviderConfig> for GenerationPolicy {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

/// Front door to the active model: every prompt CodeDoc sends goes through here.
///
/// No call is retried; a failed model call fails the operation.
pub struct LlmPlanner {
    provider: Arc<dyn LlmProvider>,
    policy: GenerationPolicy,
}

impl LlmPlanner {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: GenerationPolicy) -> Self {
        Self { provider, policy }
    }

    /// Select the configured provider from the registry.
    pub fn from_config(
        registry: &ProviderRegistry,
        config: &ProviderConfig,
    ) -> Result<Self, CodedocError> {
        let provider = registry
            .get(&config.active)
            .ok_or_else(|| CodedocError::UnknownProvider(config.active.clone()))?;
        Ok(Self::new(provider, GenerationPolicy::from(config)))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    fn request(&self, prompt: String) -> LlmRequest {
        LlmRequest {
            model: self.policy.model.clone(),
            system_prompt: String::new(),
            user_prompt: prompt,
            max_tokens: self.policy.max_tokens,
            temperature: self.policy.temperature,
        }
    }

    fn doc_system_prompt(&self) -> &str {
        self.policy
            .system_prompt
            .as_deref()
            .unwrap_or(prompts::DOC_SYSTEM_MESSAGE)
    }

    /// Translate a question into a single SQL statement for the given schema.
    ///
    /// Markdown fences around the reply are removed.
    pub async fn generate_sql(&self, question: &str, formatted_schema: &str) -> Result<String> {
        let request = self.request(prompts::sql_prompt(formatted_schema, question));
        let response = self
            .provider
            .complete(&request)
            .await
            .context("SQL generation failed")?;

        let sql = CodeBlockAnalyzer::strip_fences(&response.content, &["sql"]);
        if sql.is_empty() {
            anyhow::bail!("Model returned an empty SQL query");
        }
        info!(
            provider = %response.provider,
            latency_ms = response.latency_ms,
            sql = %sql,
            "Generated SQL"
        );
        Ok(sql)
    }

    /// Open a streaming reply to `user_prompt` in the context of `history`.
    pub async fn chat_stream(&self, history: &[ChatTurn], user_prompt: &str) -> Result<TextStream> {
        let request = self.request(prompts::chat_prompt(history, user_prompt));
        self.provider.stream(&request).await
    }

    /// Ask the model which file extension the request refers to.
    ///
    /// Never fails: errors and unusable replies give `.md`.
    pub async fn detect_extension(&self, user_prompt: &str) -> String {
        let request = self.request(prompts::extension_prompt(user_prompt));
        match self.provider.complete(&request).await {
            Ok(response) => prompts::normalize_extension(&response.content),
            Err(e) => {
                warn!(error = %e, "Extension detection failed, defaulting to .md");
                prompts::DEFAULT_EXTENSION.to_string()
            }
        }
    }

    /// Document one file.
    ///
    /// With `structured`, the model is asked for the JSON documentation object
    /// and ```` ```json ```` fences are stripped from the reply.
    pub async fn document_file(
        &self,
        file: &SourceFile,
        user_prompt: Option<&str>,
        structured: bool,
    ) -> Result<String> {
        let prompt =
            prompts::documentation_prompt(&file.extension(), &file.content, user_prompt, structured);
        let request = self.request(prompt).with_system_prompt(self.doc_system_prompt());
        let response = self
            .provider
            .complete(&request)
            .await
            .with_context(|| format!("Documentation failed for {}", file.relative_path))?;

        if structured {
            Ok(CodeBlockAnalyzer::strip_fences(&response.content, &["json"]))
        } else {
            Ok(response.content)
        }
    }

    /// Document every file and assemble one Markdown document.
    ///
    /// Files are processed one at a time in the given order. A file the model
    /// fails on gets a placeholder section instead of aborting the project.
    pub async fn document_project(&self, files: &[SourceFile]) -> String {
        let mut sections = Vec::with_capacity(files.len());
        for file in files {
            info!(file = %file.relative_path, "Generating documentation");
            let body = match self.document_file(file, None, false).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(file = %file.relative_path, error = %format!("{e:#}"), "File documentation failed");
                    FILE_DOC_FAILED.to_string()
                }
            };
            sections.push(format!("## {}\n\n{}\n\n", file.relative_path, body));
        }
        format!("# Project Documentation\n\n{}", sections.join("---\n\n"))
    }
}
