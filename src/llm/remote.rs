//! HTTP provider for the remote model server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::RemoteConfig;
use crate::error::LlmError;
use crate::llm::{
    ChatResponse, LlmProvider, PromptRequest, RouteActionRequest, SummaryResponse,
};

const PROVIDER: &str = "remote";

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("discharge-agent/", env!("CARGO_PKG_VERSION"));

/// Model server reached over plain JSON-over-HTTP.
pub struct RemoteProvider {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteProvider {
    pub fn new(config: RemoteConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> Result<String, LlmError> {
        let base = self
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| LlmError::NotConfigured {
                provider: PROVIDER.into(),
                key: "COLAB_API_BASE".into(),
            })?;
        Ok(format!("{base}/{path}"))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, timeout: Duration) -> Result<T, LlmError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, timeout = ?timeout, "Calling model server");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("{path} returned {status}: {}", truncate(&detail, 200)),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| request_error(e, timeout))?;
        serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: format!("{path}: {e}"),
        })
    }
}

#[async_trait]
impl LlmProvider for RemoteProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn route_action(
        &self,
        request: &RouteActionRequest,
    ) -> Result<serde_json::Value, LlmError> {
        self.post_json("route_action", request, self.config.route_timeout)
            .await
    }

    async fn agent_chat(&self, prompt: &str) -> Result<String, LlmError> {
        let body = PromptRequest {
            prompt: prompt.to_string(),
        };
        let response: ChatResponse = self
            .post_json("agent_chat", &body, self.config.chat_timeout)
            .await?;
        Ok(response.response.unwrap_or_default().trim().to_string())
    }

    async fn generate_summary(&self, prompt: &str) -> Result<SummaryResponse, LlmError> {
        let body = PromptRequest {
            prompt: prompt.to_string(),
        };
        self.post_json("generate_ko", &body, self.config.summary_timeout)
            .await
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout {
            provider: PROVIDER.into(),
            timeout,
        }
    } else {
        LlmError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let provider = RemoteProvider::new(RemoteConfig {
            base_url: Some("https://abc.ngrok-free.dev".into()),
            ..RemoteConfig::default()
        })
        .unwrap();
        assert_eq!(
            provider.endpoint("route_action").unwrap(),
            "https://abc.ngrok-free.dev/route_action"
        );
    }

    #[test]
    fn endpoint_without_base_is_not_configured() {
        let provider = RemoteProvider::new(RemoteConfig::default()).unwrap();
        let err = provider.endpoint("agent_chat").unwrap_err();
        assert!(err.is_not_configured());
    }

    #[tokio::test]
    async fn agent_chat_without_base_fails_fast() {
        let provider = RemoteProvider::new(RemoteConfig::default()).unwrap();
        let err = provider.agent_chat("안녕하세요").await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured { .. }));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("퇴원요약", 2), "퇴원");
    }
}
