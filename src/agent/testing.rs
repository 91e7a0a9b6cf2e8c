//! Test doubles shared by the agent's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{EmailError, LlmError};
use crate::email::EmailDispatcher;
use crate::llm::{LlmProvider, RouteActionRequest, SummaryResponse};

/// Scripted provider. Each queued result is used once; an empty queue
/// answers with a chat-only route and a fixed Korean reply.
#[derive(Default)]
pub(crate) struct StubLlm {
    routes: Mutex<VecDeque<Result<serde_json::Value, LlmError>>>,
    chats: Mutex<VecDeque<Result<String, LlmError>>>,
    route_requests: Mutex<Vec<RouteActionRequest>>,
    chat_prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, result: Result<serde_json::Value, LlmError>) -> Self {
        self.routes.lock().unwrap().push_back(result);
        self
    }

    pub fn with_chat(self, result: Result<String, LlmError>) -> Self {
        self.chats.lock().unwrap().push_back(result);
        self
    }

    pub fn route_requests(&self) -> Vec<RouteActionRequest> {
        self.route_requests.lock().unwrap().clone()
    }

    pub fn chat_prompts(&self) -> Vec<String> {
        self.chat_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn route_action(
        &self,
        request: &RouteActionRequest,
    ) -> Result<serde_json::Value, LlmError> {
        self.route_requests.lock().unwrap().push(request.clone());
        self.routes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"action": "none"})))
    }

    async fn agent_chat(&self, prompt: &str) -> Result<String, LlmError> {
        self.chat_prompts.lock().unwrap().push(prompt.to_string());
        self.chats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("요청을 처리했습니다.".to_string()))
    }

    async fn generate_summary(&self, _prompt: &str) -> Result<SummaryResponse, LlmError> {
        Ok(SummaryResponse::default())
    }
}

/// A sent message as seen by `StubMailer`.
#[derive(Debug, Clone)]
pub(crate) struct SentMail {
    pub to: String,
    pub subject: String,
    pub filename: String,
    pub size: usize,
}

/// Records messages instead of sending them; optionally fails every send.
#[derive(Default)]
pub(crate) struct StubMailer {
    fail_with: Option<String>,
    sent: Mutex<Vec<SentMail>>,
}

impl StubMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailDispatcher for StubMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _body: &str,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<(), EmailError> {
        if let Some(ref reason) = self.fail_with {
            return Err(EmailError::Transport(reason.clone()));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            filename: filename.to_string(),
            size: file_bytes.len(),
        });
        Ok(())
    }
}
