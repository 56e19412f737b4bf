//! Durable-store contract for the pipeline's entities.
//!
//! The pipeline only ever needs create/find-one/find-many operations, so
//! that is all [`QuizStore`] exposes. Each call commits independently — no
//! transaction spans multiple pipeline stages, so a crash between stages
//! can leave a partially-completed run (a quiz row whose document was never
//! marked processed, say) that is not auto-repaired.
//!
//! Identity and timestamps are assigned here, not by callers: stores accept
//! draft values ([`QuizDraft`], [`QuizResultDraft`], [`NoteDraft`],
//! [`DocumentDraft`]) and hand back the persisted entities. Promoting a
//! draft question to a [`crate::model::Question`] is also where it sheds
//! its page number.
//!
//! [`MemoryStore`] is the in-process implementation used by the CLI and
//! tests; a relational backend would implement the same trait.

mod memory;

pub use memory::MemoryStore;

use crate::error::QuizError;
use crate::model::{
    DocumentDraft, NoteDraft, Quiz, QuizDraft, QuizResult, QuizResultDraft, RawPage,
    SourceDocument, WrongAnswerNote,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Create/find operations over the persisted entities.
#[async_trait]
pub trait QuizStore: Send + Sync {
    // ── Documents ─────────────────────────────────────────────────────────

    /// Register an ingested document.
    async fn create_document(&self, draft: DocumentDraft) -> Result<SourceDocument, QuizError>;

    async fn find_document(&self, id: Uuid) -> Result<Option<SourceDocument>, QuizError>;

    /// All documents, newest first, optionally scoped to one owner tag.
    async fn find_documents(&self, owner: Option<&str>) -> Result<Vec<SourceDocument>, QuizError>;

    /// Flip a document's `processed` flag to true.
    async fn mark_document_processed(&self, id: Uuid) -> Result<(), QuizError>;

    // ── Chunks ────────────────────────────────────────────────────────────

    /// Append extracted page text for a document.
    async fn create_chunks(&self, document_id: Uuid, pages: Vec<RawPage>)
        -> Result<(), QuizError>;

    /// A document's page text, ordered by page number. Empty when ingestion
    /// has not delivered yet.
    async fn find_chunks(&self, document_id: Uuid) -> Result<Vec<RawPage>, QuizError>;

    // ── Quizzes ───────────────────────────────────────────────────────────

    /// Persist a packaged quiz, assigning ids to it and its questions.
    async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, QuizError>;

    async fn find_quiz(&self, id: Uuid) -> Result<Option<Quiz>, QuizError>;

    /// The non-regenerated quiz bound to a document, if one exists.
    async fn find_quiz_for_document(&self, document_id: Uuid)
        -> Result<Option<Quiz>, QuizError>;

    /// The regenerated quiz bound to a wrong-answer note, if one exists.
    async fn find_quiz_for_note(&self, note_id: Uuid) -> Result<Option<Quiz>, QuizError>;

    /// All quizzes, newest first.
    async fn find_quizzes(&self) -> Result<Vec<Quiz>, QuizError>;

    // ── Results ───────────────────────────────────────────────────────────

    /// Persist a graded submission.
    async fn create_result(&self, draft: QuizResultDraft) -> Result<QuizResult, QuizError>;

    async fn find_result(&self, id: Uuid) -> Result<Option<QuizResult>, QuizError>;

    // ── Wrong-answer notes ────────────────────────────────────────────────

    /// Persist a wrong-answer note with its item snapshots.
    async fn create_note(&self, draft: NoteDraft) -> Result<WrongAnswerNote, QuizError>;

    async fn find_note(&self, id: Uuid) -> Result<Option<WrongAnswerNote>, QuizError>;
}
