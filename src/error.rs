//! Error types for the docuquiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizError`] — **Fatal**: the request cannot produce a usable outcome
//!   (referenced entity missing, source text never arrived, zero questions
//!   survived packaging, bad configuration). Returned as `Err(QuizError)`
//!   from the [`crate::service::QuizService`] entry points.
//!
//! * [`ReasoningError`] — **Non-fatal**: a single reasoning-service call
//!   failed (transport error, bad status, empty reply). Pipeline stages
//!   contain these to the smallest affected unit — a page degrades to an
//!   `unknown` block, a candidate is dropped, a synthesis call yields an
//!   empty bank — and the run continues with whatever remains.
//!
//! The separation keeps model flakiness out of the caller's error surface:
//! callers only ever see exhaustion (nothing left to work with), never the
//! individual call failures that led there.

use thiserror::Error;
use uuid::Uuid;

/// All fatal errors returned by the docuquiz library.
///
/// Per-call reasoning failures use [`ReasoningError`] and are absorbed by
/// the pipeline stages rather than propagated here.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Not-found errors ──────────────────────────────────────────────────
    /// No document exists under the given id.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: Uuid },

    /// No quiz exists under the given id.
    #[error("Quiz not found: {id}")]
    QuizNotFound { id: Uuid },

    /// No quiz result exists under the given id.
    #[error("Quiz result not found: {id}")]
    ResultNotFound { id: Uuid },

    /// No wrong-answer note exists under the given id.
    #[error("Wrong-answer note not found: {id}")]
    NoteNotFound { id: Uuid },

    // ── Ingestion errors ──────────────────────────────────────────────────
    /// The document exists but its extracted text never became available
    /// within the polling budget.
    #[error(
        "Document {id} has no extracted text after {attempts} polls.\n\
         Ingestion may still be running — retry in a moment."
    )]
    ChunksNotReady { id: Uuid, attempts: u32 },

    // ── Pipeline exhaustion ───────────────────────────────────────────────
    /// Every candidate was lost to parsing or validation; the packaged quiz
    /// would be empty.
    #[error(
        "No usable questions were produced (requested {requested}).\n\
         The source text may be too short or the model output unparseable."
    )]
    NoQuestions { requested: usize },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The durable store failed an operation.
    #[error("Storage error: {0}")]
    Store(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single reasoning-service call.
///
/// Produced by [`crate::reasoning::TextGenerator`] implementations and
/// absorbed at the call site: stages log it at `warn` level and substitute
/// the stage's degraded value. It never reaches the caller of the service.
#[derive(Debug, Clone, Error)]
pub enum ReasoningError {
    /// Transport-level failure (connection refused, TLS, DNS ...).
    #[error("reasoning request failed: {detail}")]
    Http { detail: String },

    /// The service answered with a non-success status code.
    #[error("reasoning service returned HTTP {code}: {detail}")]
    Status { code: u16, detail: String },

    /// The call did not complete within the configured timeout.
    #[error("reasoning call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response decoded but carried no generated text.
    #[error("reasoning service returned an empty reply")]
    EmptyReply,
}
