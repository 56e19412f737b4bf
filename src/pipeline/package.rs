//! Quiz Packager: verified bank → assembled quiz draft.
//!
//! Pure selection, no reasoning calls. Filter to the requested kinds,
//! shuffle uniformly, then truncate to the requested count. A thin bank
//! yields a short quiz; the packager never pads and never errors on
//! shortage. Binding fields on the draft (regeneration flags, note and
//! document references) are left unset for the caller to fill in.

use crate::model::{CandidateQuestion, GenerateOptions, QuizDraft};
use rand::seq::SliceRandom;
use tracing::debug;

/// Assemble a quiz draft of at most `options.count` questions.
pub fn package(
    verified: Vec<CandidateQuestion>,
    options: &GenerateOptions,
    title: String,
) -> QuizDraft {
    let mut picked: Vec<CandidateQuestion> = verified
        .into_iter()
        .filter(|c| options.kinds.contains(&c.kind))
        .collect();

    picked.shuffle(&mut rand::thread_rng());
    picked.truncate(options.count);

    debug!(
        "Packaged {} of {} requested questions",
        picked.len(),
        options.count
    );

    QuizDraft {
        title,
        is_regenerated: false,
        source_note_id: None,
        weakness_analysis: None,
        source_document_id: None,
        questions: picked,
    }
}
