use thiserror::Error;

/// Top-level error type for the CodeDoc runtime.
#[derive(Debug, Error)]
pub enum CodedocError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("LLM provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("no LLM provider registered under '{0}'")]
    UnknownProvider(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("repository error: {0}")]
    Repository(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = CodedocError::Provider {
            provider: "gemini".into(),
            message: "quota exceeded".into(),
        };
        assert_eq!(
            err.to_string(),
            "LLM provider error (gemini): quota exceeded"
        );
    }

    #[test]
    fn test_survives_anyhow_context() {
        let err = anyhow::Error::from(CodedocError::Repository("clone failed".into()))
            .context("Documenting repository");
        assert!(matches!(
            err.downcast_ref::<CodedocError>(),
            Some(CodedocError::Repository(_))
        ));
    }
}
