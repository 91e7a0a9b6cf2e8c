//! Reply composer — builds the per-action prompt and asks for a Korean reply.

use std::sync::Arc;

use tracing::warn;

use crate::agent::filter::ReplyFilter;
use crate::agent::plan::{Action, ActionPlan, FileFormat};
use crate::llm::LlmProvider;

/// Shared instruction block appended to every prompt.
const STRICT_INSTRUCTION: &str = "STRICT INSTRUCTION:\n\
     1. Output ONLY the final answer in Korean.\n\
     2. DO NOT include any reasoning, thinking process, or English explanation.\n\
     3. DO NOT repeat the user's question.\n\
     4. Just give the answer directly.";

/// Placeholder shown to the model when no summary exists yet.
const NO_SUMMARY_PLACEHOLDER: &str = "(아직 생성되지 않았음)";

pub(crate) const NOT_CONFIGURED_REPLY: &str =
    "서버 설정(COLAB_API_BASE)에 문제가 있어서 답변을 생성할 수 없습니다. 관리자에게 문의해 주세요.";

pub(crate) const EMPTY_REPLY: &str =
    "답변 생성에 문제가 발생했습니다. 다시 한 번 시도해 주세요.";

/// Composes the user-facing reply for a classified command.
pub struct ReplyComposer {
    llm: Arc<dyn LlmProvider>,
    filter: ReplyFilter,
}

impl ReplyComposer {
    pub fn new(llm: Arc<dyn LlmProvider>, filter: ReplyFilter) -> Self {
        Self { llm, filter }
    }

    /// Produce reply text. Never fails: remote errors become the reply itself.
    pub async fn compose(&self, command: &str, summary_ko: &str, plan: &ActionPlan) -> String {
        let prompt = build_prompt(command, summary_ko, plan);

        let reply = match self.llm.agent_chat(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) if e.is_not_configured() => return NOT_CONFIGURED_REPLY.to_string(),
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "agent_chat failed");
                return format!("답변 생성 중 오류가 발생했습니다: {e}");
            }
        };

        let reply = if reply.is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            reply
        };

        self.filter.filter_to_target_language(&reply)
    }
}

/// Pick and fill the prompt template for a plan.
///
/// A plan whose action needs a file but carries no format is inconsistent
/// and gets the generic template.
pub(crate) fn build_prompt(command: &str, summary_ko: &str, plan: &ActionPlan) -> String {
    match (plan.action, plan.file_format) {
        (Action::None, _) => {
            let summary = if summary_ko.trim().is_empty() {
                NO_SUMMARY_PLACEHOLDER
            } else {
                summary_ko
            };
            format!(
                "You are a medical/general knowledge chatbot.\n\
                 {STRICT_INSTRUCTION}\n\n\
                 [사용자 입력]\n{command}\n\n\
                 [한국어 BHC/DI 요약]\n{summary}"
            )
        }
        (Action::SaveFile, format) if format != FileFormat::None => format!(
            "You are a medical chatbot.\n\
             {STRICT_INSTRUCTION}\n\n\
             Context: The system is creating a \"{format}\" file for the discharge summary.\n\
             Your role: Briefly and politely explain in Korean that the file is being created.\n\n\
             [사용자 입력]\n{command}"
        ),
        (Action::SendEmail, format) if format != FileFormat::None => format!(
            "You are a medical chatbot.\n\
             {STRICT_INSTRUCTION}\n\n\
             Context: The system is sending a \"{format}\" file to \"{email}\".\n\
             Your role: Briefly and politely explain in Korean that the email is being sent.\n\n\
             [사용자 입력]\n{command}",
            email = plan.destination_email
        ),
        _ => format!(
            "You are a chatbot.\n\
             {STRICT_INSTRUCTION}\n\n\
             [사용자 입력]\n{command}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::StubLlm;
    use crate::error::LlmError;

    fn plan(action: Action, file_format: FileFormat, email: &str) -> ActionPlan {
        ActionPlan {
            action,
            file_format,
            destination_email: email.to_string(),
        }
    }

    #[test]
    fn chat_prompt_includes_summary_or_placeholder() {
        let with = build_prompt("수술 후 주의사항?", "퇴원 후 약물을 복용하세요.", &ActionPlan::chat());
        assert!(with.contains("[한국어 BHC/DI 요약]\n퇴원 후 약물을 복용하세요."));
        assert!(with.contains("STRICT INSTRUCTION"));

        let without = build_prompt("수술 후 주의사항?", "  ", &ActionPlan::chat());
        assert!(without.contains(NO_SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn save_prompt_names_format_and_omits_summary() {
        let prompt = build_prompt("pdf로 저장", "요약 본문", &plan(Action::SaveFile, FileFormat::Pdf, ""));
        assert!(prompt.contains("creating a \"pdf\" file"));
        assert!(!prompt.contains("요약 본문"));
    }

    #[test]
    fn email_prompt_names_recipient() {
        let prompt = build_prompt(
            "메일 보내줘",
            "요약",
            &plan(Action::SendEmail, FileFormat::Docx, "nurse@hospital.kr"),
        );
        assert!(prompt.contains("sending a \"docx\" file to \"nurse@hospital.kr\""));
    }

    #[test]
    fn inconsistent_plan_uses_generic_template() {
        let prompt = build_prompt("저장", "요약", &plan(Action::SaveFile, FileFormat::None, ""));
        assert!(prompt.starts_with("You are a chatbot."));
        assert!(prompt.contains("[사용자 입력]\n저장"));
    }

    #[tokio::test]
    async fn reply_is_filtered() {
        let llm = Arc::new(
            StubLlm::new().with_chat(Ok("<think>plan the answer</think>\nSure.\n파일을 만들고 있습니다.".into())),
        );
        let composer = ReplyComposer::new(llm.clone(), ReplyFilter::default());
        let reply = composer
            .compose("docx 만들어줘", "요약", &plan(Action::SaveFile, FileFormat::Docx, ""))
            .await;
        assert_eq!(reply, "파일을 만들고 있습니다.");
        assert_eq!(llm.chat_prompts().len(), 1);
    }

    #[tokio::test]
    async fn empty_reply_becomes_retry_notice() {
        let llm = Arc::new(StubLlm::new().with_chat(Ok("   ".into())));
        let composer = ReplyComposer::new(llm, ReplyFilter::default());
        let reply = composer.compose("안녕", "", &ActionPlan::chat()).await;
        assert_eq!(reply, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_text() {
        let llm = Arc::new(StubLlm::new().with_chat(Err(LlmError::RequestFailed {
            provider: "stub".into(),
            reason: "502 Bad Gateway".into(),
        })));
        let composer = ReplyComposer::new(llm, ReplyFilter::default());
        let reply = composer.compose("안녕", "", &ActionPlan::chat()).await;
        assert!(reply.starts_with("답변 생성 중 오류가 발생했습니다:"));
        assert!(reply.contains("502 Bad Gateway"));
    }

    #[tokio::test]
    async fn not_configured_gets_fixed_reply() {
        let llm = Arc::new(StubLlm::new().with_chat(Err(LlmError::NotConfigured {
            provider: "stub".into(),
            key: "COLAB_API_BASE".into(),
        })));
        let composer = ReplyComposer::new(llm, ReplyFilter::default());
        assert_eq!(
            composer.compose("안녕", "", &ActionPlan::chat()).await,
            NOT_CONFIGURED_REPLY
        );
    }
}
