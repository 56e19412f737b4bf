//! Question Synthesizer: structured blocks → candidate question bank.
//!
//! A single reasoning call over the whole block context, asking for twice
//! the requested question count so the validator has surplus to reject
//! from. Individual malformed array items are dropped; a reply that is not
//! a JSON array at all yields an empty bank. Either way the pipeline
//! continues — downstream stages and the packager decide what a thin bank
//! means for the final quiz.

use crate::model::{CandidateQuestion, GenerateOptions, StructuredBlock};
use crate::prompts;
use crate::reasoning::{self, TextGenerator};
use tracing::{info, warn};

/// Over-generation factor: candidates requested per final question wanted.
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// Generate candidate questions from structured blocks.
///
/// Returns an empty bank when there is no content to draw from, when the
/// reasoning call fails, or when the reply is not a JSON array.
pub async fn synthesize(
    generator: &dyn TextGenerator,
    blocks: &[StructuredBlock],
    options: &GenerateOptions,
) -> Vec<CandidateQuestion> {
    if blocks.is_empty() {
        warn!("No structured blocks; skipping synthesis");
        return Vec::new();
    }

    let target = options.count * CANDIDATE_MULTIPLIER;
    let prompt = prompts::synthesize_questions(blocks, options, target);

    let reply = match generator.generate(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Synthesis call failed: {}; continuing with empty bank", e);
            return Vec::new();
        }
    };

    match reasoning::parse_json_items::<CandidateQuestion>(&reply) {
        Ok(candidates) => {
            info!(
                "Synthesized {} candidate questions (target {})",
                candidates.len(),
                target
            );
            candidates
        }
        Err(e) => {
            warn!(
                "Synthesis reply is not a JSON array: {}; continuing with empty bank",
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasoningError;
    use crate::model::{BlockKind, QuestionKind};
    use crate::reasoning::testing::ScriptedGenerator;

    fn blocks() -> Vec<StructuredBlock> {
        vec![StructuredBlock {
            page: 1,
            kind: BlockKind::Paragraph,
            text: "Water boils at 100 degrees Celsius at sea level.".into(),
        }]
    }

    #[tokio::test]
    async fn requests_twice_the_question_count() {
        let generator = ScriptedGenerator::replying(&["[]"]);
        let options = GenerateOptions {
            count: 5,
            ..Default::default()
        };

        let bank = synthesize(&generator, &blocks(), &options).await;

        assert!(bank.is_empty());
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Total questions to generate: 10"));
    }

    #[tokio::test]
    async fn empty_blocks_make_no_call() {
        let generator = ScriptedGenerator::replying(&[]);

        let bank = synthesize(&generator, &[], &GenerateOptions::default()).await;

        assert!(bank.is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn parses_candidates_from_fenced_reply() {
        let reply = r#"```json
[
  {"page": 1, "type": "true_false", "question": "Water boils at 100C at sea level.", "answer": "true", "explanation": "Stated directly.", "source_context": "Water boils at 100 degrees Celsius at sea level."}
]
```"#;
        let generator = ScriptedGenerator::replying(&[reply]);

        let bank = synthesize(&generator, &blocks(), &GenerateOptions::default()).await;

        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].kind, QuestionKind::TrueFalse);
        assert_eq!(bank[0].answer, "true");
        assert_eq!(bank[0].page, 1);
    }

    #[tokio::test]
    async fn malformed_items_drop_without_sinking_the_bank() {
        // Second item has an unknown type, third lacks an answer; both drop.
        let reply = r#"[
  {"type": "short_answer", "question": "Boiling point of water in C?", "answer": "100"},
  {"type": "essay", "question": "Discuss.", "answer": "n/a"},
  {"type": "short_answer", "question": "No answer given"}
]"#;
        let generator = ScriptedGenerator::replying(&[reply]);

        let bank = synthesize(&generator, &blocks(), &GenerateOptions::default()).await;

        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].text, "Boiling point of water in C?");
    }

    #[tokio::test]
    async fn call_failure_yields_empty_bank() {
        let generator = ScriptedGenerator::new(vec![Err(ReasoningError::Timeout { secs: 60 })]);

        let bank = synthesize(&generator, &blocks(), &GenerateOptions::default()).await;

        assert!(bank.is_empty());
    }

    #[tokio::test]
    async fn non_array_reply_yields_empty_bank() {
        let generator = ScriptedGenerator::replying(&["I cannot generate questions for this."]);

        let bank = synthesize(&generator, &blocks(), &GenerateOptions::default()).await;

        assert!(bank.is_empty());
    }
}
