//! Question Validator: candidate bank → verified bank.
//!
//! Two gates. A structural minimum bar drops candidates with a blank
//! question or answer without spending a reasoning call on them. Survivors
//! each get one quality judgment from the reasoning service covering answer
//! uniqueness, distractor plausibility, and grounding in the candidate's
//! own source excerpt; only an affirmative verdict keeps the candidate.
//!
//! Judgments fan out with bounded concurrency. Each verdict (or judgment
//! failure) affects only its own candidate, and the kept set comes out in
//! input order regardless of call completion order.

use crate::model::CandidateQuestion;
use crate::prompts;
use crate::reasoning::{self, TextGenerator};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Judge candidates and keep only those affirmed by the reasoning service.
pub async fn validate(
    generator: &dyn TextGenerator,
    candidates: Vec<CandidateQuestion>,
    concurrency: usize,
) -> Vec<CandidateQuestion> {
    let submitted = candidates.len();
    let pool: Vec<CandidateQuestion> = candidates
        .into_iter()
        .filter(|c| {
            let ok = !c.text.trim().is_empty() && !c.answer.trim().is_empty();
            if !ok {
                debug!("Dropping structurally incomplete candidate: {:?}", c.text);
            }
            ok
        })
        .collect();

    let verdicts: Vec<(usize, bool)> = stream::iter(pool.iter().enumerate())
        .map(|(idx, candidate)| async move { (idx, judge(generator, candidate).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut keep = vec![false; pool.len()];
    for (idx, verdict) in verdicts {
        keep[idx] = verdict;
    }

    let verified: Vec<CandidateQuestion> = pool
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect();

    info!("Validation kept {}/{} candidates", verified.len(), submitted);
    verified
}

/// One quality judgment for one candidate; any failure counts as rejection.
async fn judge(generator: &dyn TextGenerator, candidate: &CandidateQuestion) -> bool {
    let payload = match serde_json::to_string(candidate) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Candidate not serializable ({}); dropped", e);
            return false;
        }
    };

    match generator.generate(&prompts::validate_candidate(&payload)).await {
        Ok(reply) => {
            let keep = reasoning::is_affirmative(&reply);
            if !keep {
                debug!("Reviewer rejected candidate: {:?}", candidate.text);
            }
            keep
        }
        Err(e) => {
            warn!(
                "Judgment call failed for candidate {:?}: {}; dropped",
                candidate.text, e
            );
            false
        }
    }
}
