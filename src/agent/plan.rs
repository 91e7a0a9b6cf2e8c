//! Agent data model: inputs, the classified plan, and the final result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Side effect requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Just chat.
    #[default]
    None,
    /// Render the summary to a file.
    SaveFile,
    /// Render the summary and mail it as an attachment.
    SendEmail,
}

impl Action {
    /// Parse a loosely formatted action name. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "none" => Some(Self::None),
            "savefile" => Some(Self::SaveFile),
            "sendemail" => Some(Self::SendEmail),
            _ => None,
        }
    }

    /// Does this action operate on the summary text?
    pub fn needs_artifact(&self) -> bool {
        matches!(self, Self::SaveFile | Self::SendEmail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SaveFile => "save_file",
            Self::SendEmail => "send_email",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Pdf,
    Docx,
    #[default]
    None,
}

impl FileFormat {
    /// Parse a renderable format (`pdf` or `docx`, any case).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Format to render for an action: anything that is not PDF becomes DOCX.
    pub fn renderable(self) -> Self {
        match self {
            Self::Pdf => Self::Pdf,
            Self::Docx | Self::None => Self::Docx,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::None => "",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::None => "application/octet-stream",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied input for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentInput {
    /// The user's instruction.
    pub command: String,
    /// Korean BHC/DI summary, possibly empty.
    pub summary_ko: String,
    /// English BHC/DI summary, possibly empty.
    pub summary_en: String,
    /// When set, artifacts are written to a per-session subdirectory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AgentInput {
    pub fn new(
        command: impl Into<String>,
        summary_ko: impl Into<String>,
        summary_en: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            summary_ko: summary_ko.into(),
            summary_en: summary_en.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// True when there is no Korean summary to act on.
    pub fn summary_missing(&self) -> bool {
        self.summary_ko.trim().is_empty()
    }
}

/// Classified intent.
///
/// Invariant: `file_format` is `Pdf` or `Docx` whenever `action` needs an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: Action,
    pub file_format: FileFormat,
    pub destination_email: String,
}

impl ActionPlan {
    /// Plain chat, no side effect.
    pub fn chat() -> Self {
        Self::default()
    }

    /// Decode a `/route_action` payload.
    ///
    /// Every field is optional and validated: unknown actions become `none`,
    /// unknown formats become `docx` when an action is present and `none`
    /// otherwise, and the email is trimmed. Non-string values count as missing.
    pub fn from_route_payload(payload: &serde_json::Value) -> Self {
        let field = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| payload.get(*k).and_then(|v| v.as_str()))
                .map(str::to_string)
        };

        let action = field(&["action"])
            .and_then(|raw| Action::parse(&raw))
            .unwrap_or(Action::None);

        let file_format = match field(&["file_type", "fileFormat", "file_format"])
            .and_then(|raw| FileFormat::parse(&raw))
        {
            Some(format) => format,
            None if action == Action::None => FileFormat::None,
            None => FileFormat::Docx,
        };

        let destination_email = field(&["email", "destinationEmail", "destination_email"])
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Self {
            action,
            file_format,
            destination_email,
        }
    }
}

/// Structured outcome returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub action: Action,
    pub file_format: FileFormat,
    pub destination_email: String,
    /// Path of the generated artifact, if any. Serialized as `""` when absent.
    #[serde(default, with = "path_or_empty")]
    pub artifact_path: Option<PathBuf>,
    /// Final Korean text shown to the user.
    pub message: String,
}

impl AgentResult {
    /// A chat-only result carrying `message`.
    pub fn chat(message: impl Into<String>) -> Self {
        Self {
            action: Action::None,
            file_format: FileFormat::None,
            destination_email: String::new(),
            artifact_path: None,
            message: message.into(),
        }
    }

    /// Artifact path as a string, empty when nothing was produced.
    pub fn artifact_path_str(&self) -> String {
        self.artifact_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// Base filename of the artifact.
    pub fn artifact_name(&self) -> Option<&str> {
        self.artifact_path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }

    /// MIME type for offering the artifact as a download.
    pub fn artifact_mime(&self) -> Option<&'static str> {
        let path = self.artifact_path.as_deref()?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Some(FileFormat::Pdf.mime_type()),
            Some(_) => Some(FileFormat::Docx.mime_type()),
            None => Some(FileFormat::None.mime_type()),
        }
    }
}

mod path_or_empty {
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(path: &Option<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
        match path {
            Some(path) => s.collect_str(&path.display()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PathBuf>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok((!raw.is_empty()).then(|| PathBuf::from(raw)))
    }
}
