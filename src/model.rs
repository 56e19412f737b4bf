//! Domain types for the quiz generation pipeline.
//!
//! Three groups live here, mirroring the lifecycle of a generation run:
//!
//! * **Run-scoped values** — [`RawPage`], [`StructuredBlock`],
//!   [`CandidateQuestion`]. They exist only inside a single pipeline run and
//!   are discarded once a quiz is persisted or a candidate is rejected.
//! * **Persisted entities** — [`SourceDocument`], [`Quiz`], [`Question`],
//!   [`QuizResult`], [`WrongAnswerNote`] and their owned rows. Identity
//!   (UUID) and `created_at` are assigned by the store at persistence time;
//!   nothing is updated in place afterwards except a document's `processed`
//!   flag.
//! * **Drafts** — [`QuizDraft`], [`QuizResultDraft`], [`NoteDraft`]: the
//!   unpersisted shapes handed to the store. A draft question is still a
//!   [`CandidateQuestion`]; it sheds its `page` and gains its id when the
//!   store promotes it to a [`Question`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Enums ────────────────────────────────────────────────────────────────

/// Semantic kind of a structured content block.
///
/// The reasoning service labels each block it emits; anything it labels
/// outside this set deserializes as [`BlockKind::Unknown`] rather than
/// failing the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Section or sub-section heading.
    Header,
    /// Running prose.
    Paragraph,
    /// Bulleted or numbered list, flattened to text.
    List,
    /// Tabular data, flattened to text.
    Table,
    /// Unclassifiable content, including whole pages that failed structuring.
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    /// Wire/prompt name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Table => "table",
            BlockKind::Unknown => "unknown",
        }
    }
}

/// Question format. A closed set: a candidate whose `type` falls outside it
/// is malformed and dropped during synthesis parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// One correct option among plausible distractors.
    MultipleChoice,
    /// Free-typed answer; a single token with no internal whitespace.
    ShortAnswer,
    /// A statement to affirm or reject.
    TrueFalse,
    /// A sentence with an elided span marked by [`BLANK_MARKER`].
    FillBlank,
}

/// Marker for the elided span in fill-in-the-blank questions.
pub const BLANK_MARKER: &str = "____";

impl QuestionKind {
    /// All kinds, in canonical order.
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::MultipleChoice,
        QuestionKind::ShortAnswer,
        QuestionKind::TrueFalse,
        QuestionKind::FillBlank,
    ];

    /// Wire/prompt name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::FillBlank => "fill_blank",
        }
    }
}

/// Requested cognitive difficulty of generated questions.
///
/// Each level maps to distinct prompt guidance: recall for easy,
/// paraphrase/explain for medium, cross-paragraph inference for hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Wire/prompt name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

// ── Run-scoped values ────────────────────────────────────────────────────

/// One page of raw extracted text, as handed over by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPage {
    /// 1-indexed page number.
    pub page: u32,
    /// Raw extracted text of the page.
    pub content: String,
}

/// A typed content block produced by the Content Structurer.
///
/// Blocks are ordered by page, then by the order the reasoning service
/// emitted them within that page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredBlock {
    /// 1-indexed page the block was derived from.
    pub page: u32,
    /// Semantic kind of the block.
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Block text, stripped of running headers/footers/page numbers.
    #[serde(rename = "content")]
    pub text: String,
}

/// An unvalidated question emitted by the Question Synthesizer.
///
/// The serde names match the JSON shape the reasoning service is instructed
/// to emit (`type`, `question`, `source_context` ...). Fields the model
/// routinely omits default to empty; a candidate missing `type`, `question`
/// or `answer` fails deserialization and is dropped on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuestion {
    /// 1-indexed page of the grounding excerpt.
    #[serde(default)]
    pub page: u32,
    /// Question format.
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// The question text shown to the learner.
    #[serde(rename = "question")]
    pub text: String,
    /// Options, present only for multiple choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// The single correct answer.
    pub answer: String,
    /// Why the answer is correct.
    #[serde(default)]
    pub explanation: String,
    /// Verbatim or near-verbatim source excerpt the question is grounded in.
    #[serde(default, rename = "source_context")]
    pub source_context: String,
}

// ── Request types ────────────────────────────────────────────────────────

/// Shape of a generation request: how many questions, of which kinds, at
/// which difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Number of questions the caller wants in the final quiz.
    pub count: usize,
    /// Allowed question kinds; the Packager filters to exactly these.
    pub kinds: Vec<QuestionKind>,
    /// Requested difficulty.
    pub difficulty: Difficulty,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            count: 5,
            kinds: QuestionKind::ALL.to_vec(),
            difficulty: Difficulty::Medium,
        }
    }
}

// ── Persisted entities ───────────────────────────────────────────────────

/// An ingested source document. The pipeline treats the underlying file as
/// an opaque external reference; only the extracted per-page text matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub id: Uuid,
    /// Display name, usually the uploaded filename.
    pub name: String,
    /// Opaque reference (URL or storage key) to the original file.
    pub source_ref: Option<String>,
    /// Optional caller tag used to scope listing queries.
    pub owner: Option<String>,
    /// Flipped to true after the first successful generation run.
    /// The only in-place update in the system.
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// A persisted question, owned by exactly one quiz.
///
/// A promoted [`CandidateQuestion`] minus its `page`, plus identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub kind: QuestionKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer: String,
    pub explanation: String,
    pub source_context: String,
}

/// A persisted quiz: either a primary generation (bound to a source
/// document) or a remediation quiz (bound to a wrong-answer note).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// True for remediation quizzes produced by `regenerate`.
    pub is_regenerated: bool,
    /// The wrong-answer note this quiz remediates, if any.
    pub source_note_id: Option<Uuid>,
    /// Free-text weakness diagnosis carried by remediation quizzes.
    pub weakness_analysis: Option<String>,
    /// The document this quiz (or its remediation ancestor) was generated from.
    pub source_document_id: Option<Uuid>,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Look up an owned question by id.
    pub fn find_question(&self, id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// One submitted answer, matched against a question of the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: Uuid,
    pub selected_answer: String,
    pub is_correct: bool,
}

/// The graded outcome of one submission. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: Uuid,
    pub quiz_id: Uuid,
    /// Rounded percentage, 0–100. A zero-question quiz scores 0.
    pub score: u8,
    pub total_questions: usize,
    pub correct_questions: usize,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<UserAnswer>,
}

/// Immutable snapshot of one wrong answer, denormalized so later edits or
/// deletion of the original question cannot corrupt the note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswerItem {
    pub question_id: Uuid,
    pub question_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    pub source_context: String,
    /// Source page of the question when still known; 0 otherwise
    /// (persisted questions shed their page number).
    pub page: u32,
}

/// A durable record of a learner's wrong answers for one quiz result.
///
/// Created at most once per [`QuizResult`], and only when the graded quiz
/// was not itself a remediation quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswerNote {
    pub id: Uuid,
    pub title: String,
    pub quiz_result_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<WrongAnswerItem>,
}

// ── Drafts (unpersisted) ─────────────────────────────────────────────────

/// A source document awaiting registration, as handed over by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentDraft {
    pub name: String,
    pub source_ref: Option<String>,
    pub owner: Option<String>,
}

/// An assembled quiz awaiting persistence. Output of the Quiz Packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub is_regenerated: bool,
    pub source_note_id: Option<Uuid>,
    pub weakness_analysis: Option<String>,
    pub source_document_id: Option<Uuid>,
    pub questions: Vec<CandidateQuestion>,
}

/// A graded submission awaiting persistence. Output of the Grading Engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultDraft {
    pub quiz_id: Uuid,
    pub score: u8,
    pub total_questions: usize,
    pub correct_questions: usize,
    pub answers: Vec<UserAnswer>,
}

/// A wrong-answer note awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub quiz_result_id: Uuid,
    pub items: Vec<WrongAnswerItem>,
}
