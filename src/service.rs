//! Quiz generation, grading, and remediation entry points.
//!
//! [`QuizService`] owns the full flow: documents in, quizzes out, graded
//! results and wrong-answer notes after submissions, remediation quizzes
//! from notes. It wires a durable [`QuizStore`] and a [`TextGenerator`]
//! to the pipeline stages and enforces the two 1:1 bindings of the system
//! (document→quiz and note→remediation quiz).
//!
//! Those bindings use check-then-create, which races against a concurrent
//! duplicate request. Each check runs under a per-id async lock so two
//! requests for the same document (or note) serialize; requests for
//! different ids proceed in parallel.

use crate::config::QuizConfig;
use crate::error::QuizError;
use crate::grade::{self, GradedSubmission, SubmittedAnswer};
use crate::model::{
    DocumentDraft, GenerateOptions, NoteDraft, Quiz, QuizResult, RawPage, SourceDocument,
    WrongAnswerNote,
};
use crate::pipeline::{package, structure, synthesize, validate};
use crate::prompts;
use crate::reasoning::{self, TextGenerator};
use crate::remediate;
use crate::store::QuizStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Quiz title when the model cannot produce one.
const GENERATED_TITLE_FALLBACK: &str = "Generated Quiz";
/// Remediation title when the original quiz has a blank title.
const REVIEW_TITLE_FALLBACK: &str = "Review Quiz";

// ── Keyed locks ──────────────────────────────────────────────────────────

/// One async mutex per id, created on first use.
///
/// Guards the check-then-create windows in [`QuizService::generate_quiz`]
/// and [`QuizService::regenerate_quiz`]. Slots live for the lifetime of the
/// service.
struct KeyedLocks {
    slots: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let slot = self.slots.lock().await.entry(key).or_default().clone();
        slot.lock_owned().await
    }
}

// ── Service ──────────────────────────────────────────────────────────────

/// A graded submission together with the wrong-answer note it spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingOutcome {
    pub result: QuizResult,
    /// Present only when at least one answer was wrong and the graded quiz
    /// was not itself a remediation quiz.
    pub note: Option<WrongAnswerNote>,
}

/// The orchestrator over store, reasoning service, and pipeline stages.
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    generator: Arc<dyn TextGenerator>,
    config: QuizConfig,
    generation_locks: KeyedLocks,
    regeneration_locks: KeyedLocks,
}

impl QuizService {
    pub fn new(
        store: Arc<dyn QuizStore>,
        generator: Arc<dyn TextGenerator>,
        config: QuizConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
            generation_locks: KeyedLocks::new(),
            regeneration_locks: KeyedLocks::new(),
        }
    }

    /// Register a document and its extracted page text in one hand-off.
    ///
    /// Pages may be empty at registration; [`Self::generate_quiz`] polls for
    /// them within its retry budget, so an ingestion worker can deliver
    /// chunks later via [`QuizStore::create_chunks`].
    pub async fn register_document(
        &self,
        draft: DocumentDraft,
        pages: Vec<RawPage>,
    ) -> Result<SourceDocument, QuizError> {
        let document = self.store.create_document(draft).await?;
        if !pages.is_empty() {
            self.store.create_chunks(document.id, pages).await?;
        }
        info!("Registered document {} ({})", document.id, document.name);
        Ok(document)
    }

    /// Generate the quiz for a document, or return the existing one.
    ///
    /// This is the primary entry point for the library.
    ///
    /// # Arguments
    /// * `document_id` — A document previously registered with the store
    /// * `options` — Question count, allowed kinds, and difficulty
    ///
    /// # Returns
    /// The persisted quiz. Calling again for the same document returns the
    /// same quiz without re-running the pipeline.
    ///
    /// # Errors
    /// * [`QuizError::DocumentNotFound`] — unknown document id
    /// * [`QuizError::ChunksNotReady`] — no page text after the retry budget
    /// * [`QuizError::NoQuestions`] — the pipeline produced nothing usable
    pub async fn generate_quiz(
        &self,
        document_id: Uuid,
        options: &GenerateOptions,
    ) -> Result<Quiz, QuizError> {
        let _guard = self.generation_locks.acquire(document_id).await;

        // ── Step 1: Idempotency check ────────────────────────────────────
        if let Some(existing) = self.store.find_quiz_for_document(document_id).await? {
            info!(
                "Document {} already has quiz {}; returning it",
                document_id, existing.id
            );
            return Ok(existing);
        }

        // ── Step 2: Wait for source text ─────────────────────────────────
        let pages = self.wait_for_chunks(document_id).await?;
        info!("Document {} has {} pages of text", document_id, pages.len());

        // ── Step 3: Structure ────────────────────────────────────────────
        let blocks = structure::structure_pages(self.generator.as_ref(), &pages).await;

        // ── Step 4: Synthesize ───────────────────────────────────────────
        let candidates = synthesize::synthesize(self.generator.as_ref(), &blocks, options).await;

        // ── Step 5: Validate ─────────────────────────────────────────────
        let verified = validate::validate(
            self.generator.as_ref(),
            candidates,
            self.config.validation_concurrency,
        )
        .await;

        // ── Step 6: Title & package ──────────────────────────────────────
        let title = generated_title(self.generator.as_ref(), &pages).await;
        let mut draft = package::package(verified, options, title);
        if draft.questions.is_empty() {
            return Err(QuizError::NoQuestions {
                requested: options.count,
            });
        }
        draft.source_document_id = Some(document_id);

        // ── Step 7: Persist ──────────────────────────────────────────────
        let quiz = self.store.create_quiz(draft).await?;
        self.store.mark_document_processed(document_id).await?;
        info!(
            "Generated quiz {} with {} questions for document {}",
            quiz.id,
            quiz.questions.len(),
            document_id
        );
        Ok(quiz)
    }

    /// Grade a submission against a persisted quiz.
    ///
    /// Persists the result always; additionally persists a wrong-answer
    /// note when the submission had wrong answers and the quiz is not a
    /// remediation quiz.
    pub async fn grade_quiz(
        &self,
        quiz_id: Uuid,
        answers: &[SubmittedAnswer],
    ) -> Result<GradingOutcome, QuizError> {
        let quiz = self.quiz(quiz_id).await?;

        let GradedSubmission {
            result,
            wrong_items,
            needs_note,
        } = grade::grade(&quiz, answers);
        info!(
            "Graded quiz {}: {}/{} correct, score {}",
            quiz.id, result.correct_questions, result.total_questions, result.score
        );

        let result = self.store.create_result(result).await?;

        let note = if needs_note {
            let note = self
                .store
                .create_note(NoteDraft {
                    title: note_title(&quiz.title),
                    quiz_result_id: result.id,
                    items: wrong_items,
                })
                .await?;
            info!("Recorded wrong-answer note {} ({} items)", note.id, note.items.len());
            Some(note)
        } else {
            None
        };

        Ok(GradingOutcome { result, note })
    }

    /// Generate the remediation quiz for a wrong-answer note, or return the
    /// existing one.
    ///
    /// The new quiz targets the note's diagnosed weakness: exactly three
    /// medium-difficulty questions in a randomly mixed set of kinds, all
    /// grounded in the source excerpts the learner got wrong.
    ///
    /// # Errors
    /// * [`QuizError::NoteNotFound`] / [`QuizError::ResultNotFound`] /
    ///   [`QuizError::QuizNotFound`] — a broken reference in the
    ///   note→result→quiz chain
    /// * [`QuizError::NoQuestions`] — remediation synthesis produced
    ///   nothing usable
    pub async fn regenerate_quiz(&self, note_id: Uuid) -> Result<Quiz, QuizError> {
        let _guard = self.regeneration_locks.acquire(note_id).await;

        // ── Step 1: Idempotency check ────────────────────────────────────
        if let Some(existing) = self.store.find_quiz_for_note(note_id).await? {
            info!(
                "Note {} already has remediation quiz {}; returning it",
                note_id, existing.id
            );
            return Ok(existing);
        }

        // ── Step 2: Resolve the note→result→quiz chain ───────────────────
        let note = self.note(note_id).await?;
        let result = self.result(note.quiz_result_id).await?;
        let original = self.quiz(result.quiz_id).await?;

        // ── Step 3: Diagnose the weakness ────────────────────────────────
        let weakness = remediate::analyze_weakness(self.generator.as_ref(), &note.items).await;

        // ── Step 4: Synthesize from the wrong items' excerpts ────────────
        let blocks = remediate::blocks_from_items(&note.items);
        let options = remediate::remediation_options();
        let candidates =
            synthesize::synthesize(self.generator.as_ref(), &blocks, &options).await;

        // ── Step 5: Validate ─────────────────────────────────────────────
        let verified = validate::validate(
            self.generator.as_ref(),
            candidates,
            self.config.validation_concurrency,
        )
        .await;

        // ── Step 6: Package & persist ────────────────────────────────────
        let mut draft = package::package(verified, &options, review_title(&original.title));
        if draft.questions.is_empty() {
            return Err(QuizError::NoQuestions {
                requested: options.count,
            });
        }
        draft.is_regenerated = true;
        draft.source_note_id = Some(note.id);
        draft.weakness_analysis = weakness;
        draft.source_document_id = original.source_document_id;

        let quiz = self.store.create_quiz(draft).await?;
        info!(
            "Generated remediation quiz {} with {} questions for note {}",
            quiz.id,
            quiz.questions.len(),
            note_id
        );
        Ok(quiz)
    }

    // ── Lookups & listings ───────────────────────────────────────────────

    pub async fn document(&self, id: Uuid) -> Result<SourceDocument, QuizError> {
        self.store
            .find_document(id)
            .await?
            .ok_or(QuizError::DocumentNotFound { id })
    }

    /// Registered documents, newest first, optionally scoped to one owner.
    pub async fn documents(&self, owner: Option<&str>) -> Result<Vec<SourceDocument>, QuizError> {
        self.store.find_documents(owner).await
    }

    pub async fn quiz(&self, id: Uuid) -> Result<Quiz, QuizError> {
        self.store
            .find_quiz(id)
            .await?
            .ok_or(QuizError::QuizNotFound { id })
    }

    /// All quizzes, newest first.
    pub async fn quizzes(&self) -> Result<Vec<Quiz>, QuizError> {
        self.store.find_quizzes().await
    }

    pub async fn result(&self, id: Uuid) -> Result<QuizResult, QuizError> {
        self.store
            .find_result(id)
            .await?
            .ok_or(QuizError::ResultNotFound { id })
    }

    pub async fn note(&self, id: Uuid) -> Result<WrongAnswerNote, QuizError> {
        self.store
            .find_note(id)
            .await?
            .ok_or(QuizError::NoteNotFound { id })
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Poll for a document's page text within the configured retry budget.
    async fn wait_for_chunks(&self, document_id: Uuid) -> Result<Vec<RawPage>, QuizError> {
        if self.store.find_document(document_id).await?.is_none() {
            return Err(QuizError::DocumentNotFound { id: document_id });
        }

        let attempts = self.config.chunk_wait_attempts;
        for attempt in 1..=attempts {
            let pages = self.store.find_chunks(document_id).await?;
            if !pages.is_empty() {
                return Ok(pages);
            }
            if attempt < attempts {
                debug!(
                    "No chunks yet for document {} (attempt {}/{}); waiting {}ms",
                    document_id, attempt, attempts, self.config.chunk_wait_delay_ms
                );
                tokio::time::sleep(Duration::from_millis(self.config.chunk_wait_delay_ms)).await;
            }
        }

        Err(QuizError::ChunksNotReady {
            id: document_id,
            attempts,
        })
    }
}

/// Ask the model for a quiz title; fall back to a fixed default on any
/// failure. One call, no retry.
async fn generated_title(generator: &dyn TextGenerator, pages: &[RawPage]) -> String {
    match generator.generate(&prompts::quiz_title(pages)).await {
        Ok(reply) => {
            let title = reasoning::strip_code_fences(&reply)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .trim_matches('"')
                .trim()
                .to_string();
            if title.is_empty() {
                GENERATED_TITLE_FALLBACK.to_string()
            } else {
                title
            }
        }
        Err(e) => {
            warn!("Title generation failed: {}; using fallback", e);
            GENERATED_TITLE_FALLBACK.to_string()
        }
    }
}

/// Remediation quizzes carry the original title under a "Review:" prefix.
fn review_title(original: &str) -> String {
    let original = original.trim();
    if original.is_empty() {
        REVIEW_TITLE_FALLBACK.to_string()
    } else {
        format!("Review: {original}")
    }
}

/// Wrong-answer notes are titled after the quiz they were graded from.
fn note_title(quiz_title: &str) -> String {
    let quiz_title = quiz_title.trim();
    if quiz_title.is_empty() {
        "Wrong Answers".to_string()
    } else {
        format!("Wrong Answers: {quiz_title}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasoningError;
    use crate::reasoning::testing::ScriptedGenerator;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_key_serializes_acquires() {
        let locks = KeyedLocks::new();
        let key = Uuid::new_v4();

        let held = locks.acquire(key).await;
        let blocked = timeout(Duration::from_millis(50), locks.acquire(key)).await;
        assert!(blocked.is_err(), "second acquire must wait for the first");

        drop(held);
        let unblocked = timeout(Duration::from_millis(50), locks.acquire(key)).await;
        assert!(unblocked.is_ok());
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::new();

        let _held = locks.acquire(Uuid::new_v4()).await;
        let other = timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn title_reply_is_cleaned_to_one_line() {
        let generator =
            ScriptedGenerator::replying(&["```\n\"Neural Networks Basics\"\nsecond line\n```"]);
        let pages = [RawPage {
            page: 1,
            content: "Neural networks.".into(),
        }];

        let title = generated_title(&generator, &pages).await;

        assert_eq!(title, "Neural Networks Basics");
    }

    #[tokio::test]
    async fn title_falls_back_on_failure_and_empty() {
        let failing = ScriptedGenerator::new(vec![Err(ReasoningError::EmptyReply)]);
        let pages = [RawPage {
            page: 1,
            content: "text".into(),
        }];
        assert_eq!(generated_title(&failing, &pages).await, "Generated Quiz");

        let empty = ScriptedGenerator::replying(&["\n  \n"]);
        assert_eq!(generated_title(&empty, &pages).await, "Generated Quiz");
    }

    #[test]
    fn derived_titles() {
        assert_eq!(review_title("Neural Networks"), "Review: Neural Networks");
        assert_eq!(review_title("  "), "Review Quiz");
        assert_eq!(note_title("Neural Networks"), "Wrong Answers: Neural Networks");
        assert_eq!(note_title(""), "Wrong Answers");
    }
}
