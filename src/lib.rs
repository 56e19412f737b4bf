//! # docuquiz
//!
//! Turn extracted document text into graded quizzes using a reasoning model.
//!
//! ## Why this crate?
//!
//! Hand-writing quiz questions from a document is slow, and naively asking a
//! model for "10 questions about this PDF" yields ungrounded trivia in an
//! unpredictable shape. This crate treats question generation as a pipeline
//! of narrow, individually recoverable stages: structure the text, over-ask
//! for candidates, have the model re-judge each candidate against its own
//! source excerpt, then package exactly what survived. Wrong answers feed a
//! second loop that diagnoses the learner's weakness and generates a small
//! targeted review quiz.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page text
//!  │
//!  ├─ 1. Structure  classify each page into typed blocks (one call/page)
//!  ├─ 2. Synthesize over-generate 2× candidate questions (one call)
//!  ├─ 3. Validate   per-candidate quality judgment (bounded fan-out)
//!  ├─ 4. Package    filter kinds, shuffle, truncate to the requested count
//!  └─ 5. Persist    quiz with model-generated title
//!
//! submission ─ Grade ─ result ┬─ (wrong answers) WrongAnswerNote
//!                             └─ Regenerate: diagnose weakness, 3-question
//!                                review quiz from the missed excerpts
//! ```
//!
//! Every stage tolerates a flaky model: a page that fails structuring
//! degrades to one `unknown` block, a malformed candidate drops alone, and
//! a failed synthesis call yields an empty bank. Only "nothing usable at
//! all" surfaces as an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docuquiz::{
//!     DocumentDraft, GenerateOptions, GeminiClient, MemoryStore, QuizConfig, QuizService,
//!     RawPage,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY (and optional DOCUQUIZ_MODEL) from the environment.
//!     let config = QuizConfig::from_env();
//!     let generator = Arc::new(GeminiClient::new(&config)?);
//!     let service = QuizService::new(Arc::new(MemoryStore::new()), generator, config);
//!
//!     let document = service
//!         .register_document(
//!             DocumentDraft {
//!                 name: "lecture-notes.pdf".into(),
//!                 ..Default::default()
//!             },
//!             vec![RawPage {
//!                 page: 1,
//!                 content: "Neural networks are trained with backpropagation.".into(),
//!             }],
//!         )
//!         .await?;
//!
//!     let quiz = service
//!         .generate_quiz(document.id, &GenerateOptions::default())
//!         .await?;
//!     println!("{}: {} questions", quiz.title, quiz.questions.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docuquiz` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docuquiz = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod grade;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod reasoning;
pub mod remediate;
pub mod service;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{QuizConfig, QuizConfigBuilder};
pub use error::{QuizError, ReasoningError};
pub use grade::{grade, GradedSubmission, SubmittedAnswer};
pub use model::{
    BlockKind, CandidateQuestion, Difficulty, DocumentDraft, GenerateOptions, Question,
    QuestionKind, Quiz, QuizResult, RawPage, SourceDocument, StructuredBlock, UserAnswer,
    WrongAnswerItem, WrongAnswerNote, BLANK_MARKER,
};
pub use reasoning::{GeminiClient, TextGenerator};
pub use service::{GradingOutcome, QuizService};
pub use store::{MemoryStore, QuizStore};
