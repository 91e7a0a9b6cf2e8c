//! Error types for the discharge agent.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Remote model errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} is not configured (set {key})")]
    NotConfigured { provider: String, key: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl LlmError {
    /// True when the failure is about missing setup rather than a bad round-trip.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

/// Document rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render {format}: {reason}")]
    Render { format: String, reason: String },

    #[error("Failed to load font {path}: {reason}")]
    Font { path: String, reason: String },
}

/// Outbound email errors.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP_USER / SMTP_PASSWORD environment variables are not set")]
    MissingCredentials,

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Transport(String),
}

/// Summary generation errors.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("No admission notes were provided")]
    EmptyInput,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_errors_convert_into_summary_errors() {
        let err: SummaryError = LlmError::NotConfigured {
            provider: "remote".into(),
            key: "COLAB_API_BASE".into(),
        }
        .into();

        assert!(matches!(err, SummaryError::Llm(ref e) if e.is_not_configured()));
        assert_eq!(
            err.to_string(),
            "LLM error: Provider remote is not configured (set COLAB_API_BASE)"
        );
    }

    #[test]
    fn config_errors_name_the_key() {
        let err = ConfigError::InvalidValue {
            key: "SMTP_PORT".into(),
            message: "not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for SMTP_PORT: not a number"
        );
    }
}
