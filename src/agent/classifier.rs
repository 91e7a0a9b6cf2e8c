//! Action classifier — asks the model server what a command wants done.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::plan::ActionPlan;
use crate::llm::{LlmProvider, RouteActionRequest};

/// Turns a free-text command into an `ActionPlan`.
pub struct ActionClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl ActionClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Classify `command` in the context of the Korean summary.
    ///
    /// Never fails: a missing server URL, transport failures and malformed
    /// payloads all degrade to a chat-only plan. The composer then reports
    /// the underlying problem to the user in Korean.
    pub async fn classify(&self, command: &str, summary_ko: &str) -> ActionPlan {
        let request = RouteActionRequest {
            command: command.to_string(),
            summary_ko: summary_ko.to_string(),
        };

        let payload = match self.llm.route_action(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    provider = self.llm.name(),
                    error = %e,
                    not_configured = e.is_not_configured(),
                    "route_action failed, falling back to chat"
                );
                return ActionPlan::chat();
            }
        };

        let plan = ActionPlan::from_route_payload(&payload);
        debug!(
            action = %plan.action,
            file_format = %plan.file_format,
            has_email = !plan.destination_email.is_empty(),
            "Classified command"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::agent::plan::{Action, FileFormat};
    use crate::agent::testing::StubLlm;
    use crate::error::LlmError;

    #[tokio::test]
    async fn passes_command_and_summary_through() {
        let llm = Arc::new(StubLlm::new().with_route(Ok(json!({
            "action": "send_email",
            "file_type": "pdf",
            "email": " doctor@hospital.kr ",
        }))));
        let classifier = ActionClassifier::new(llm.clone());

        let plan = classifier
            .classify("doctor@hospital.kr로 pdf 보내줘", "퇴원 요약")
            .await;

        assert_eq!(plan.action, Action::SendEmail);
        assert_eq!(plan.file_format, FileFormat::Pdf);
        assert_eq!(plan.destination_email, "doctor@hospital.kr");

        let seen = llm.route_requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].summary_ko, "퇴원 요약");
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_chat() {
        let llm = Arc::new(StubLlm::new().with_route(Err(LlmError::RequestFailed {
            provider: "stub".into(),
            reason: "connection reset".into(),
        })));
        let plan = ActionClassifier::new(llm)
            .classify("파일 만들어줘", "요약")
            .await;
        assert_eq!(plan, ActionPlan::chat());
    }

    #[tokio::test]
    async fn malformed_payload_degrades_to_chat() {
        let llm = Arc::new(StubLlm::new().with_route(Err(LlmError::InvalidResponse {
            provider: "stub".into(),
            reason: "expected value at line 1".into(),
        })));
        let plan = ActionClassifier::new(llm).classify("pdf", "요약").await;
        assert_eq!(plan.action, Action::None);
        assert_eq!(plan.file_format, FileFormat::None);
    }

    #[tokio::test]
    async fn not_configured_degrades_to_chat() {
        let llm = Arc::new(StubLlm::new().with_route(Err(LlmError::NotConfigured {
            provider: "stub".into(),
            key: "COLAB_API_BASE".into(),
        })));
        let plan = ActionClassifier::new(llm).classify("pdf로 저장", "요약").await;
        assert_eq!(plan, ActionPlan::chat());
    }
}
