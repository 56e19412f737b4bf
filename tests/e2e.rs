//! End-to-end tests against the live reasoning service.
//!
//! These tests make real Gemini API calls. They are gated behind the
//! `E2E_ENABLED` environment variable plus `GEMINI_API_KEY`, so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e test_generate -- --nocapture
//!
//! The scripted, offline counterparts of these flows live in
//! `tests/pipeline.rs` and always run.

use std::sync::Arc;

use docuquiz::{
    DocumentDraft, GeminiClient, GenerateOptions, MemoryStore, QuestionKind, Quiz, QuizConfig,
    QuizService, RawPage, SubmittedAnswer,
};

// ── Test helpers ─────────────────────────────────────────────────────────

/// Skip this test unless `E2E_ENABLED` and `GEMINI_API_KEY` are both set.
macro_rules! e2e_skip_unless_ready {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if std::env::var("GEMINI_API_KEY")
            .map(|k| k.trim().is_empty())
            .unwrap_or(true)
        {
            println!("SKIP: GEMINI_API_KEY not set");
            return;
        }
    };
}

fn live_service() -> QuizService {
    let config = QuizConfig::from_env();
    let generator = GeminiClient::new(&config).expect("client must build from env");
    QuizService::new(Arc::new(MemoryStore::new()), Arc::new(generator), config)
}

/// Two pages of study text with running headers, enough material for a
/// handful of grounded questions.
fn study_pages() -> Vec<RawPage> {
    vec![
        RawPage {
            page: 1,
            content: "EARTH SCIENCE READER                              Page 1\n\n\
                      The Water Cycle\n\n\
                      The water cycle describes how water moves between the oceans, the \
                      atmosphere, and the land. Evaporation turns liquid water at the surface \
                      into water vapor, driven almost entirely by energy from the Sun. Plants \
                      contribute additional vapor through transpiration from their leaves.\n\n\
                      As moist air rises it cools, and the vapor condenses onto microscopic \
                      particles to form clouds. This step is called condensation."
                .to_string(),
        },
        RawPage {
            page: 2,
            content: "EARTH SCIENCE READER                              Page 2\n\n\
                      Precipitation and Collection\n\n\
                      When cloud droplets grow too heavy to stay aloft, they fall as \
                      precipitation: rain, snow, sleet, or hail, depending on the air \
                      temperature they fall through. Most precipitation lands in the oceans.\n\n\
                      Water that reaches land either runs off into rivers and lakes or soaks \
                      into the ground as infiltration, recharging aquifers. From these \
                      collection points, evaporation begins the cycle again."
                .to_string(),
        },
    ]
}

async fn register_reader(service: &QuizService) -> uuid::Uuid {
    let document = service
        .register_document(
            DocumentDraft {
                name: "earth-science-reader.pdf".to_string(),
                source_ref: None,
                owner: Some("e2e".to_string()),
            },
            study_pages(),
        )
        .await
        .expect("registration must succeed");
    document.id
}

/// Assert the quiz passes basic shape checks.
fn assert_quiz_quality(quiz: &Quiz, context: &str) {
    assert!(!quiz.title.trim().is_empty(), "[{context}] Title is empty");
    assert!(
        !quiz.questions.is_empty(),
        "[{context}] Quiz has no questions"
    );

    for (i, q) in quiz.questions.iter().enumerate() {
        assert!(
            !q.text.trim().is_empty(),
            "[{context}] Question {i} has empty text"
        );
        assert!(
            !q.answer.trim().is_empty(),
            "[{context}] Question {i} has empty answer"
        );
        if q.kind == QuestionKind::MultipleChoice {
            let options = q.options.as_deref().unwrap_or_default();
            assert!(
                options.len() >= 2,
                "[{context}] Question {i} has too few options: {options:?}"
            );
            assert!(
                options.iter().any(|o| o.trim() == q.answer.trim()),
                "[{context}] Question {i} answer {:?} is not among options {:?}",
                q.answer,
                options
            );
        }
    }

    println!(
        "[{context}] ✓  \"{}\", {} questions, quality checks passed",
        quiz.title,
        quiz.questions.len()
    );
}

fn print_quiz(quiz: &Quiz) {
    println!("--- BEGIN QUIZ: {} ---", quiz.title);
    for (i, q) in quiz.questions.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, q.kind.as_str(), q.text);
        println!("   answer: {}", q.answer);
    }
    println!("--- END QUIZ ---");
}

// ── Generation ───────────────────────────────────────────────────────────

/// Generate a quiz from the reader and re-request it, verifying both the
/// bank shape and idempotent re-entry against the live service.
#[tokio::test]
async fn test_generate_quiz_live() {
    e2e_skip_unless_ready!();

    let service = live_service();
    let document_id = register_reader(&service).await;

    let options = GenerateOptions {
        count: 4,
        ..GenerateOptions::default()
    };
    let quiz = service
        .generate_quiz(document_id, &options)
        .await
        .expect("live generation should succeed");

    assert!(
        quiz.questions.len() <= 4,
        "a 4-question request must never over-deliver, got {}",
        quiz.questions.len()
    );
    assert!(!quiz.is_regenerated);
    assert_eq!(quiz.source_document_id, Some(document_id));
    assert_quiz_quality(&quiz, "generate");
    print_quiz(&quiz);

    // Second request returns the persisted quiz, not a fresh run.
    let again = service
        .generate_quiz(document_id, &options)
        .await
        .expect("repeat request should succeed");
    assert_eq!(
        quiz.id, again.id,
        "repeat generation must return the same quiz"
    );
}

/// Restricting the kind set must steer both synthesis and packaging.
#[tokio::test]
async fn test_generate_short_answer_only_live() {
    e2e_skip_unless_ready!();

    let service = live_service();
    let document_id = register_reader(&service).await;

    let options = GenerateOptions {
        count: 3,
        kinds: vec![QuestionKind::ShortAnswer],
        ..GenerateOptions::default()
    };
    let quiz = service
        .generate_quiz(document_id, &options)
        .await
        .expect("live generation should succeed");

    assert_quiz_quality(&quiz, "short-answer-only");
    for q in &quiz.questions {
        assert_eq!(
            q.kind,
            QuestionKind::ShortAnswer,
            "kind filter must hold, got {:?} in: {}",
            q.kind,
            q.text
        );
    }
    print_quiz(&quiz);
}

// ── The full learning loop ───────────────────────────────────────────────

/// Generate, fail the whole quiz, and remediate. Exercises every
/// reasoning-backed stage in one pass.
#[tokio::test]
async fn test_full_loop_live() {
    e2e_skip_unless_ready!();

    let service = live_service();
    let document_id = register_reader(&service).await;

    let quiz = service
        .generate_quiz(
            document_id,
            &GenerateOptions {
                count: 3,
                ..GenerateOptions::default()
            },
        )
        .await
        .expect("live generation should succeed");
    assert_quiz_quality(&quiz, "loop-generate");

    // Miss every question so the note captures the full quiz.
    let answers: Vec<SubmittedAnswer> = quiz
        .questions
        .iter()
        .map(|q| SubmittedAnswer {
            question_id: q.id,
            selected_answer: "intentionally wrong e2e answer".to_string(),
        })
        .collect();
    let outcome = service
        .grade_quiz(quiz.id, &answers)
        .await
        .expect("grading should succeed");
    assert_eq!(outcome.result.score, 0);
    let note = outcome
        .note
        .expect("an all-wrong submission must record a note");
    assert_eq!(note.items.len(), quiz.questions.len());

    let review = service
        .regenerate_quiz(note.id)
        .await
        .expect("live remediation should succeed");

    assert!(review.is_regenerated);
    assert_eq!(review.source_note_id, Some(note.id));
    assert_eq!(review.source_document_id, Some(document_id));
    assert!(
        (1..=3).contains(&review.questions.len()),
        "review quizzes carry at most three questions, got {}",
        review.questions.len()
    );
    assert!(
        review.weakness_analysis.is_some(),
        "a healthy live run should produce a diagnosis"
    );
    assert_quiz_quality(&review, "loop-review");

    println!(
        "Diagnosis: {}",
        review.weakness_analysis.as_deref().unwrap_or("(none)")
    );
    print_quiz(&review);

    // Remediation is idempotent per note as well.
    let again = service
        .regenerate_quiz(note.id)
        .await
        .expect("repeat remediation should succeed");
    assert_eq!(review.id, again.id);
}
