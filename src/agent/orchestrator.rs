//! Agent orchestrator — one command in, one `AgentResult` out.
//!
//! Flow: classify the command, guard file/email actions that have no summary
//! to act on, compose the Korean reply, then perform the side effect (write
//! an artifact, optionally email it). Every failure is folded into the reply
//! text; `run` itself never fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::agent::classifier::ActionClassifier;
use crate::agent::composer::ReplyComposer;
use crate::agent::filter::ReplyFilter;
use crate::agent::plan::{Action, ActionPlan, AgentInput, AgentResult, FileFormat};
use crate::artifacts::ArtifactProducer;
use crate::config::AgentConfig;
use crate::email::EmailDispatcher;
use crate::error::ArtifactError;
use crate::llm::LlmProvider;

const NO_SUMMARY_NOTICE: &str = "아직 생성된 BHC/DI 출력물이 없습니다.\n\
     왼쪽 패널에서 먼저 퇴원 요약을 생성하신 후 다시 요청해 주세요.";

const EMAIL_SUBJECT: &str = "퇴원 요약 및 지침서";
const EMAIL_BODY: &str = "첨부된 퇴원 요약/지침서를 확인해 주세요.";

const SAVE_FILE_STEM: &str = "discharge_summary";
const EMAIL_FILE_STEM: &str = "discharge_summary_email";

/// Stages of a single run, logged as they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStage {
    Start,
    Classified,
    Guarded,
    Composed,
    Executed,
    Done,
}

impl AgentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Classified => "classified",
            Self::Guarded => "guarded",
            Self::Composed => "composed",
            Self::Executed => "executed",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for AgentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(stage: AgentStage) {
    debug!(stage = %stage, "Agent stage");
}

/// Wires classifier, composer, artifact producer and mailer together.
///
/// Holds no per-invocation state, so one instance can serve concurrent runs.
pub struct AgentOrchestrator {
    classifier: ActionClassifier,
    composer: ReplyComposer,
    artifacts: Arc<ArtifactProducer>,
    mailer: Arc<dyn EmailDispatcher>,
    config: AgentConfig,
}

impl AgentOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        mailer: Arc<dyn EmailDispatcher>,
        config: AgentConfig,
    ) -> Self {
        let artifacts = ArtifactProducer::new(config.pdf_font_path.as_deref());
        Self::with_artifacts(llm, mailer, artifacts, config)
    }

    /// Like `new`, with a prebuilt artifact producer.
    pub fn with_artifacts(
        llm: Arc<dyn LlmProvider>,
        mailer: Arc<dyn EmailDispatcher>,
        artifacts: ArtifactProducer,
        config: AgentConfig,
    ) -> Self {
        Self {
            classifier: ActionClassifier::new(Arc::clone(&llm)),
            composer: ReplyComposer::new(llm, ReplyFilter::new(config.filter)),
            artifacts: Arc::new(artifacts),
            mailer,
            config,
        }
    }

    /// Handle one command.
    pub async fn run(&self, input: AgentInput) -> AgentResult {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "agent_run",
            request_id = %request_id,
            session = input.session_id.as_deref().unwrap_or("")
        );
        self.run_inner(input).instrument(span).await
    }

    async fn run_inner(&self, input: AgentInput) -> AgentResult {
        enter(AgentStage::Start);

        let plan = self
            .classifier
            .classify(&input.command, &input.summary_ko)
            .await;
        enter(AgentStage::Classified);

        if plan.action.needs_artifact() && input.summary_missing() {
            info!(action = %plan.action, "No summary yet, refusing file action");
            enter(AgentStage::Done);
            return AgentResult::chat(NO_SUMMARY_NOTICE);
        }
        enter(AgentStage::Guarded);

        let mut message = self
            .composer
            .compose(&input.command, &input.summary_ko, &plan)
            .await;
        enter(AgentStage::Composed);

        let artifact_path = match plan.action {
            Action::None => None,
            Action::SaveFile => self.save_file(&input, &plan, &mut message).await,
            Action::SendEmail => self.send_email(&input, &plan, &mut message).await,
        };
        enter(AgentStage::Executed);

        let result = AgentResult {
            action: plan.action,
            file_format: plan.file_format,
            destination_email: plan.destination_email,
            artifact_path,
            message,
        };
        enter(AgentStage::Done);
        result
    }

    async fn save_file(
        &self,
        input: &AgentInput,
        plan: &ActionPlan,
        message: &mut String,
    ) -> Option<PathBuf> {
        let format = plan.file_format.renderable();
        let path = self.artifact_path(input, SAVE_FILE_STEM, format);

        match self.write_artifact(format, &input.summary_ko, path).await {
            Ok(path) => {
                let name = file_name(&path);
                message.push_str(&format!("\n\n(✅ 파일이 생성되었습니다: {name})"));
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Artifact generation failed");
                message.push_str(&format!("\n\n(⚠️ 파일 생성 중 오류가 발생했습니다: {e})"));
                None
            }
        }
    }

    async fn send_email(
        &self,
        input: &AgentInput,
        plan: &ActionPlan,
        message: &mut String,
    ) -> Option<PathBuf> {
        let format = plan.file_format.renderable();
        let path = self.artifact_path(input, EMAIL_FILE_STEM, format);

        let path = match self.write_artifact(format, &input.summary_ko, path).await {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Artifact generation failed");
                message.push_str(&format!("\n\n(⚠️ 파일 생성 중 오류가 발생했습니다: {e})"));
                return None;
            }
        };

        let to = plan.destination_email.trim();
        if to.is_empty() {
            message.push_str("\n\n(⚠️ 이메일 주소를 인식하지 못해 실제 전송은 하지 못했습니다.)");
        } else {
            self.dispatch(to, &path, format, message).await;
        }
        Some(path)
    }

    /// Read the written artifact back and mail it. Outcomes are appended to
    /// `message`; the artifact stays on disk whatever happens here.
    async fn dispatch(&self, to: &str, path: &Path, format: FileFormat, message: &mut String) {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read artifact back");
                message.push_str(&format!("\n\n(⚠️ 파일 생성 중 오류가 발생했습니다: {e})"));
                return;
            }
        };

        let filename = file_name(path);
        match self
            .mailer
            .send(to, EMAIL_SUBJECT, EMAIL_BODY, &filename, bytes)
            .await
        {
            Ok(()) => {
                info!(to = %to, file_format = %format, "Summary emailed");
                message.push_str(&format!("\n\n(📧 {to} 주소로 파일을 전송했습니다.)"));
            }
            Err(e) => {
                warn!(to = %to, error = %e, "Email dispatch failed");
                message.push_str(&format!("\n\n(⚠️ 이메일 전송 중 오류가 발생했습니다: {e})"));
            }
        }
    }

    /// Render on the blocking pool and return the written path.
    async fn write_artifact(
        &self,
        format: FileFormat,
        text: &str,
        path: PathBuf,
    ) -> Result<PathBuf, ArtifactError> {
        let producer = Arc::clone(&self.artifacts);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || producer.produce(format, &text, &path).map(|()| path))
            .await
            .map_err(|e| {
                error!(error = %e, "Artifact task failed");
                ArtifactError::Render {
                    format: format.to_string(),
                    reason: e.to_string(),
                }
            })?
    }

    fn artifact_path(&self, input: &AgentInput, stem: &str, format: FileFormat) -> PathBuf {
        let mut dir = self.config.output_dir();
        if let Some(session) = input.session_id.as_deref().and_then(session_dir_name) {
            dir.push(session);
        }
        dir.join(format!("{stem}.{}", format.extension()))
    }
}

/// Map a caller-supplied session id to a single safe path component.
///
/// Ids made only of `[A-Za-z0-9_-]` are used as-is. Anything else is
/// reduced to that alphabet and suffixed with a digest of the raw id, so two
/// different ids never share a directory.
fn session_dir_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let is_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if raw.chars().all(is_safe) {
        return Some(raw.to_string());
    }

    let cleaned: String = raw
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()).simple().to_string();
    let digest = &digest[..12];

    Some(if cleaned.is_empty() {
        format!("session-{digest}")
    } else {
        format!("{cleaned}-{digest}")
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
