//! Summary generator — raw admission notes to a bilingual BHC/DI draft.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SummaryError;
use crate::llm::LlmProvider;

/// Physician-writer instructions prepended to the raw notes.
const BHC_DI_PROMPT: &str = "\
You are an expert physician-writer who crafts hospital discharge summaries.

OBJECTIVE
- For this admission, write BOTH:
  1) Brief Hospital Course
  2) Discharge Instructions

EVIDENCE RULES
- Use ONLY facts explicitly present in the input for this admission.
- Do NOT invent diagnoses, tests, medications, or follow-up items that are not stated.
- Preserve all medication names, doses, units, and frequencies exactly as written when you cite them.

STYLE
- English, clinical, crisp, and readable.
- Prefer short paragraphs or bullet points.
- Maintain clear chronology (presentation → key findings → workup → treatments/changes → course → discharge condition).
- Avoid narrative fluff and repetition.

OUTPUT FORMAT
- Your output MUST contain exactly two top-level headings, in this order:

Brief Hospital Course
[Write the hospital course for this admission only.]

Discharge Instructions
[Write patient-facing, concise instructions strictly based on the input orders/medications/instructions.]

- Do NOT add any other top-level headings.
- Do NOT include comments about what you are doing.

Below is the raw chart for this admission. Use it to write the two sections above.";

const NOTES_SEPARATOR: &str = "\n\n===== RAW ADMISSION NOTES =====\n\n";

/// Generated summary in both languages. Missing halves are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeSummary {
    pub summary_en: String,
    pub summary_ko: String,
}

/// Drafts the English summary and its Korean translation on the model server.
pub struct SummaryGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl SummaryGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, raw_notes: &str) -> Result<DischargeSummary, SummaryError> {
        if raw_notes.trim().is_empty() {
            return Err(SummaryError::EmptyInput);
        }

        let response = self.llm.generate_summary(&build_prompt(raw_notes)).await?;
        let summary = DischargeSummary {
            summary_en: response.response_en.unwrap_or_default().trim().to_string(),
            summary_ko: response.response_ko.unwrap_or_default().trim().to_string(),
        };

        info!(
            provider = self.llm.name(),
            en_chars = summary.summary_en.chars().count(),
            ko_chars = summary.summary_ko.chars().count(),
            "Discharge summary generated"
        );
        Ok(summary)
    }
}

fn build_prompt(raw_notes: &str) -> String {
    format!("{BHC_DI_PROMPT}{NOTES_SEPARATOR}{raw_notes}")
}
