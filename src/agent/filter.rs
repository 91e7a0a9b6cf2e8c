//! Reply filter — keeps the Korean content lines of a model reply.
//!
//! Reasoning models sometimes leak English chain-of-thought around the
//! answer. This is a heuristic: lines with no Hangul at all are dropped, and
//! long lines where Hangul is only a small share are dropped too. If nothing
//! survives, the original text is returned so the user still sees something.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::FilterConfig;

/// `<think>...</think>` blocks, across lines.
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Hangul syllables block.
fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Filters model output down to target-language lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyFilter {
    config: FilterConfig,
}

impl ReplyFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn filter_to_target_language(&self, text: &str) -> String {
        let without_reasoning = THINK_BLOCK.replace_all(text, "");

        let kept: Vec<&str> = without_reasoning
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| self.keep_line(line))
            .collect();

        let result = kept.join("\n").trim().to_string();
        if result.is_empty() {
            tracing::debug!("Reply filter removed every line, returning original text");
            return text.to_string();
        }
        result
    }

    fn keep_line(&self, line: &str) -> bool {
        let hangul = line.chars().filter(|c| is_hangul(*c)).count();
        if hangul == 0 {
            return false;
        }

        let total = line.chars().filter(|c| !c.is_whitespace()).count();
        if total > self.config.short_line_threshold {
            let ratio = hangul as f64 / total as f64;
            if ratio < self.config.min_script_ratio {
                return false;
            }
        }
        true
    }
}
