//! Weakness Analyzer and remediation inputs.
//!
//! The analyzer turns the wrong-answer snapshots of one graded result into
//! a short second-person diagnosis. The reply is free text by contract:
//! any non-empty string is accepted verbatim, and a failed or empty call
//! degrades to no diagnosis rather than failing remediation.
//!
//! The other helpers shape remediation's synthesis input: a fixed-size,
//! medium-difficulty request with a randomly drawn kind mix, grounded
//! exclusively in the note's stored source excerpts.

use crate::model::{
    BlockKind, Difficulty, GenerateOptions, QuestionKind, StructuredBlock, WrongAnswerItem,
};
use crate::prompts;
use crate::reasoning::TextGenerator;
use rand::seq::SliceRandom;
use tracing::warn;

/// Every remediation quiz targets exactly this many questions.
pub const REMEDIATION_QUESTION_COUNT: usize = 3;

/// Diagnose the conceptual gap behind a set of wrong answers.
///
/// One reasoning call over all items. Returns `None` when there is nothing
/// to analyze or the call yields nothing usable.
pub async fn analyze_weakness(
    generator: &dyn TextGenerator,
    items: &[WrongAnswerItem],
) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    match generator.generate(&prompts::analyze_weakness(items)).await {
        Ok(reply) if !reply.trim().is_empty() => Some(reply),
        Ok(_) => {
            warn!("Weakness analysis reply was empty; proceeding without diagnosis");
            None
        }
        Err(e) => {
            warn!("Weakness analysis failed: {}; proceeding without diagnosis", e);
            None
        }
    }
}

/// Synthesis options for a remediation run: three questions, medium
/// difficulty, and a kind mix drawn at random per run.
pub fn remediation_options() -> GenerateOptions {
    let mut rng = rand::thread_rng();
    let mut kinds: Vec<QuestionKind> = (0..REMEDIATION_QUESTION_COUNT)
        .filter_map(|_| QuestionKind::ALL.choose(&mut rng).copied())
        .collect();
    kinds.sort_by_key(|k| k.as_str());
    kinds.dedup();

    GenerateOptions {
        count: REMEDIATION_QUESTION_COUNT,
        kinds,
        difficulty: Difficulty::Medium,
    }
}

/// Rebuild synthesis input from a note's stored excerpts, so remediation
/// questions can only be grounded in material the learner got wrong.
pub fn blocks_from_items(items: &[WrongAnswerItem]) -> Vec<StructuredBlock> {
    items
        .iter()
        .filter(|item| !item.source_context.trim().is_empty())
        .map(|item| StructuredBlock {
            // Snapshots taken after persistence carry page 0; clamp so the
            // block keeps the 1-indexed page contract.
            page: item.page.max(1),
            kind: BlockKind::Paragraph,
            text: item.source_context.clone(),
        })
        .collect()
}
