//! Prompts for every reasoning-service call in the pipeline.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing generation behaviour (tightening
//!    an authoring rule, adjusting the JSON shape) requires editing exactly
//!    one place.
//!
//! 2. **Testability** — unit tests can inspect the exact text sent to the
//!    model without spinning up a real reasoning service, making prompt
//!    regressions easy to catch.
//!
//! Builders return complete prompts (instructions plus embedded content);
//! the pipeline stages pass them verbatim to
//! [`crate::reasoning::TextGenerator::generate`].

use crate::model::{
    Difficulty, GenerateOptions, QuestionKind, RawPage, StructuredBlock, WrongAnswerItem,
    BLANK_MARKER,
};
use std::fmt::Write as _;

/// Instruction body for structuring one page of raw text into typed blocks.
pub const STRUCTURE_PROMPT: &str = r#"You are an expert document analyst. Your task is to segment one page of raw extracted text into typed content blocks.

Follow these rules precisely:

1. BLOCK TYPES
   - "header": a section or sub-section heading
   - "paragraph": running prose
   - "list": bulleted or numbered list items, joined into one block
   - "table": tabular data, flattened to text

2. SEGMENTATION
   - Split the page into blocks in reading order
   - Keep each block's text exactly as it appears; do not paraphrase

3. WHAT TO EXCLUDE
   - Page numbers ("Page 3 of 10", bare numerals at page edges)
   - Running headers/footers repeated on every page
   - Do NOT emit excluded content at all, under any type

4. OUTPUT FORMAT
   - Output ONLY a JSON array, one object per block:
     [{"page": <page number>, "type": "header", "content": "..."}]
   - "page" must equal the page number given below for every block
   - Do NOT wrap the array in ```json fences
   - Do NOT add commentary"#;

/// Build the structuring prompt for a single page.
pub fn structure_page(page: u32, text: &str) -> String {
    format!(
        "{STRUCTURE_PROMPT}\n\nPage number: {page}\n\nPage text:\n\"\"\"\n{text}\n\"\"\""
    )
}

fn difficulty_rule(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "easy: direct recall — each question must be answerable by locating a single stated fact"
        }
        Difficulty::Medium => {
            "medium: paraphrase and explanation — each question must require understanding a concept restated in different words"
        }
        Difficulty::Hard => {
            "hard: inference — each question must require combining information across paragraphs or pages"
        }
    }
}

fn kind_rule(kind: QuestionKind) -> String {
    match kind {
        QuestionKind::MultipleChoice => "multiple_choice: provide 3-4 options with exactly one \
             correct; distractors must be plausible, grounded in the document context, and \
             clearly wrong"
            .to_string(),
        QuestionKind::ShortAnswer => "short_answer: the answer must be a single token with no \
             internal whitespace"
            .to_string(),
        QuestionKind::TrueFalse => "true_false: the question must be a statement answerable \
             from a single (possibly slightly altered) sentence of the context; the answer \
             must be exactly \"true\" or \"false\""
            .to_string(),
        QuestionKind::FillBlank => format!(
            "fill_blank: the question must contain exactly one \"{BLANK_MARKER}\" marking the \
             elided span, with exactly one correct filler as the answer"
        ),
    }
}

/// Build the synthesis prompt: document context assembled from structured
/// blocks, hard authoring rules for the requested kinds and difficulty, and
/// the exact JSON array shape, targeting `target_count` candidates.
pub fn synthesize_questions(
    blocks: &[StructuredBlock],
    options: &GenerateOptions,
    target_count: usize,
) -> String {
    let mut context = String::new();
    for block in blocks {
        let _ = writeln!(
            context,
            "[Page {} - {}]\n{}\n",
            block.page,
            block.kind.as_str(),
            block.text
        );
    }

    let allowed: Vec<&str> = options.kinds.iter().map(|k| k.as_str()).collect();
    let mut kind_rules = String::new();
    for kind in &options.kinds {
        let _ = writeln!(kind_rules, "   - {}", kind_rule(*kind));
    }

    format!(
        r#"You are an expert quiz author. Generate exam questions strictly from the document context below.

[DOCUMENT CONTEXT]
{context}
[REQUEST]
- Allowed question types: {allowed}
- Difficulty ({difficulty}): {difficulty_rule}
- Total questions to generate: {target_count}

[AUTHORING RULES]
1. GROUNDING
   - Every question must be 100% answerable from the document context alone
   - Every question's "source_context" must be a verbatim or near-verbatim excerpt
     of the context, with its "page" number
2. PER-TYPE CONSTRAINTS
{kind_rules}3. EXPLANATIONS
   - Include a concise "explanation" of why the answer is correct

[OUTPUT FORMAT]
- Respond with ONLY a JSON array in this exact shape:
[
  {{"page": 1, "type": "multiple_choice", "question": "...", "options": ["...", "...", "..."], "answer": "...", "explanation": "...", "source_context": "..."}},
  {{"page": 2, "type": "short_answer", "question": "...", "answer": "...", "explanation": "...", "source_context": "..."}}
]
- Do NOT wrap the array in ```json fences
- Do NOT add commentary"#,
        context = context,
        allowed = allowed.join(", "),
        difficulty = options.difficulty.as_str(),
        difficulty_rule = difficulty_rule(options.difficulty),
        target_count = target_count,
        kind_rules = kind_rules,
    )
}

/// Build the per-candidate quality judgment prompt.
///
/// The reply contract is a bare `true` or `false`; anything else is treated
/// as a rejection by the validator.
pub fn validate_candidate(candidate_json: &str) -> String {
    format!(
        r#"You are a strict quiz reviewer. Judge whether the following question meets ALL of these criteria:

1. ANSWER UNIQUENESS — the given answer is the single clearly correct answer to the question.
2. DISTRACTOR QUALITY — for multiple choice, every wrong option is plausible yet clearly incorrect; none is trivially absurd or accidentally correct.
3. GROUNDING — the question can be answered, and the explanation holds, using only the text in "source_context".

[QUESTION]
{candidate_json}

Reply with exactly one word: "true" if ALL criteria hold, otherwise "false". No other text."#
    )
}

/// Build the weakness-analysis prompt over all wrong answers of one result.
pub fn analyze_weakness(items: &[WrongAnswerItem]) -> String {
    let mut listing = String::new();
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(
            listing,
            "{n}. Question: {q}\n   Your answer: {ua}\n   Correct answer: {ca}\n   Source: {sc}\n",
            n = i + 1,
            q = item.question_text,
            ua = item.user_answer,
            ca = item.correct_answer,
            sc = item.source_context,
        );
    }

    format!(
        r#"A learner answered the following quiz questions incorrectly:

{listing}
Write a 3-4 sentence diagnosis of the conceptual gap or recurring mistake pattern behind these errors. Address the learner directly as "you", in a conversational tone. Plain prose only: no lists, no headings, no markdown."#
    )
}

/// How many leading pages feed the title prompt.
pub const TITLE_MAX_PAGES: usize = 3;

/// Build the quiz-title prompt from the first pages of raw text.
pub fn quiz_title(pages: &[RawPage]) -> String {
    let mut excerpt = String::new();
    for page in pages.iter().take(TITLE_MAX_PAGES) {
        let _ = writeln!(excerpt, "{}\n", page.content);
    }

    format!(
        r#"Based on the document text below, write one concise quiz title (at most 60 characters).

{excerpt}
Respond with the title only: no quotes, no markdown, no trailing punctuation."#
    )
}
