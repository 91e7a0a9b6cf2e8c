//! Remote model integration.
//!
//! The model server exposes three JSON endpoints:
//! - `POST /route_action` — classify a command into an action
//! - `POST /agent_chat` — generate a short Korean reply for a prompt
//! - `POST /generate_ko` — draft the bilingual discharge summary
//!
//! `LlmProvider` is the seam the agent talks to; `RemoteProvider` is the
//! reqwest implementation.

mod remote;

pub use remote::RemoteProvider;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::error::LlmError;

/// Payload for `/route_action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteActionRequest {
    pub command: String,
    pub summary_ko: String,
}

/// Payload for `/agent_chat` and `/generate_ko`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Response of `/agent_chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Response of `/generate_ko`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub response_en: Option<String>,
    #[serde(default)]
    pub response_ko: Option<String>,
}

/// Capabilities the agent needs from the model server.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Classify a command. The payload is returned untyped; callers decode it defensively.
    async fn route_action(
        &self,
        request: &RouteActionRequest,
    ) -> Result<serde_json::Value, LlmError>;

    /// Generate reply text for a composed prompt. Returns the raw `response` field.
    async fn agent_chat(&self, prompt: &str) -> Result<String, LlmError>;

    /// Draft the English and Korean discharge summaries.
    async fn generate_summary(&self, prompt: &str) -> Result<SummaryResponse, LlmError>;
}

/// Create the remote provider from configuration.
pub fn create_provider(config: &RemoteConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = RemoteProvider::new(config.clone())?;
    match config.base_url {
        Some(ref base) => tracing::info!("Using remote model server at {}", base),
        None => tracing::warn!("COLAB_API_BASE is not set; remote calls will fail"),
    }
    Ok(Arc::new(provider))
}
