//! Reasoning-service access and the parse-or-degrade boundary.
//!
//! [`TextGenerator`] is the single seam between the pipeline and the model:
//! one operation, prompt in, text out. The production implementation is
//! [`GeminiClient`]; tests inject scripted doubles.
//!
//! Everything else here exists to keep malformed model output away from
//! business logic. Replies may arrive wrapped in markdown code fences, with
//! commentary, truncated, or as JSON whose items miss required fields. The
//! helpers in this module normalise and parse them; a failure surfaces as a
//! plain `Err`/`None` for the calling stage to map onto its degraded value.
//! No parse error ever crosses this boundary as a panic or a fatal error.

mod gemini;

pub use gemini::GeminiClient;

use crate::error::ReasoningError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

/// The reasoning service: one synchronous-per-call text generation
/// operation. No retry, backoff, or rate-limit handling lives at this level.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one prompt, receive the raw reply text.
    async fn generate(&self, prompt: &str) -> Result<String, ReasoningError>;
}

/// First fenced code block in a reply, tolerant of a `json` language tag and
/// of prose before/after the fence.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").unwrap());

/// Strip markdown code-fence wrappers from a model reply.
///
/// If the reply contains a fenced block, its content is returned; otherwise
/// the reply itself, trimmed either way.
pub fn strip_code_fences(reply: &str) -> &str {
    match FENCE_RE.captures(reply) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(reply).trim(),
        None => reply.trim(),
    }
}

/// Parse a reply as a JSON array of `T`, all-or-nothing.
///
/// Used where the degradation unit is the whole reply (structuring a page):
/// one malformed element poisons the array and the caller degrades it
/// entirely.
pub fn parse_json_array<T: DeserializeOwned>(reply: &str) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_str(strip_code_fences(reply))
}

/// Parse a reply as a JSON array, keeping only the items that deserialize
/// as `T`.
///
/// Used where the degradation unit is a single item (synthesis candidates):
/// an unparseable array is an error for the caller to degrade, but a
/// malformed item inside a well-formed array only drops itself.
pub fn parse_json_items<T: DeserializeOwned>(reply: &str) -> Result<Vec<T>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_str(strip_code_fences(reply))?;
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Dropping malformed array item: {}", e);
                None
            }
        })
        .collect();
    if items.len() < total {
        debug!("Kept {}/{} array items after parsing", items.len(), total);
    }
    Ok(items)
}

/// Whether a judgment reply is affirmative.
///
/// The verdict must normalise (fence-strip, trim, lowercase, one trailing
/// period stripped) to exactly `true`. Replies that merely mention "true"
/// somewhere count as rejections.
pub fn is_affirmative(reply: &str) -> bool {
    let normalized = strip_code_fences(reply)
        .trim()
        .trim_end_matches('.')
        .to_ascii_lowercase();
    normalized == "true"
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateQuestion, StructuredBlock};

    #[test]
    fn strips_json_fence_wrapper() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("  [3]  "), "[3]");
    }

    #[test]
    fn strips_fence_with_surrounding_prose() {
        let reply = "Here is the result:\n```json\n[{\"page\":1,\"type\":\"header\",\"content\":\"Intro\"}]\n```\nLet me know!";
        let stripped = strip_code_fences(reply);
        assert!(stripped.starts_with('['));
        assert!(stripped.ends_with(']'));
    }

    #[test]
    fn fenced_empty_array_parses_to_empty_list() {
        let blocks: Vec<StructuredBlock> = parse_json_array("```json\n[]\n```").unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn unparseable_reply_is_an_error_not_a_panic() {
        let res: Result<Vec<StructuredBlock>, _> = parse_json_array("I could not comply.");
        assert!(res.is_err());
    }

    #[test]
    fn malformed_item_drops_alone() {
        let reply = r#"[
            {"type": "short_answer", "question": "Capital of France?", "answer": "Paris"},
            {"type": "short_answer", "question": "missing answer field"},
            {"type": "essay", "question": "unknown kind", "answer": "x"}
        ]"#;
        let kept: Vec<CandidateQuestion> = parse_json_items(reply).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].answer, "Paris");
    }

    #[test]
    fn unparseable_array_fails_whole_call() {
        let res: Result<Vec<CandidateQuestion>, _> = parse_json_items("{\"not\": \"an array\"}");
        assert!(res.is_err());
    }

    #[test]
    fn affirmative_requires_bare_true() {
        assert!(is_affirmative("true"));
        assert!(is_affirmative(" True.\n"));
        assert!(is_affirmative("```\ntrue\n```"));
        assert!(!is_affirmative("false"));
        assert!(!is_affirmative("not true"));
        assert!(!is_affirmative("The statement is true"));
        assert!(!is_affirmative(""));
    }
}
