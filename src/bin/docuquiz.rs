//! CLI binary for docuquiz.
//!
//! A thin shim over the library crate: reads extracted page text from a
//! JSON file, runs the generation pipeline against an in-memory store, and
//! optionally grades a submission and produces the remediation quiz.

use anyhow::{bail, Context, Result};
use clap::Parser;
use docuquiz::{
    Difficulty, DocumentDraft, GeminiClient, GenerateOptions, GradingOutcome, MemoryStore,
    Question, QuestionKind, Quiz, QuizConfig, QuizService, RawPage, SubmittedAnswer,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a 5-question quiz from extracted page text
  docuquiz pages.json

  # 10 hard questions, multiple choice only, written to a file
  docuquiz --count 10 --difficulty hard --kinds multiple_choice pages.json -o quiz.json

  # Show the answer key alongside the questions
  docuquiz --show-answers pages.json

  # Grade a submission and, if anything was wrong, generate the review quiz
  docuquiz --answers my-answers.json --remediate pages.json

  # Structured JSON output for scripting
  docuquiz --json pages.json > quiz.json

INPUT FORMAT (pages.json):
  [
    {"page": 1, "content": "Raw text extracted from page 1..."},
    {"page": 2, "content": "Raw text extracted from page 2..."}
  ]

ANSWERS FORMAT (my-answers.json):
  One answer per quiz question, in display order:
  ["Paris", "true", "backpropagation", "1968", "false"]

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (required)
  DOCUQUIZ_MODEL     Override model ID (default: gemini-2.0-flash)
  DOCUQUIZ_API_BASE  Override API base URL (proxy/emulator)

SETUP:
  1. Set API key:  export GEMINI_API_KEY=AIza...
  2. Generate:     docuquiz pages.json -o quiz.json
"#;

/// Generate, grade, and remediate quizzes from extracted document text.
#[derive(Parser, Debug)]
#[command(
    name = "docuquiz",
    version,
    about = "Generate grounded quizzes from extracted document text",
    long_about = "Generate quizzes from extracted document text using a reasoning model. \
Each question is synthesized from the supplied pages, individually re-judged for grounding \
and answer quality, and packaged into a quiz. Optionally grades a submission and generates \
a targeted review quiz from the wrong answers.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON file with extracted page text: [{"page": 1, "content": "..."}].
    input: PathBuf,

    /// Write the quiz as pretty JSON to this file instead of stdout.
    #[arg(short, long, env = "DOCUQUIZ_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of questions in the final quiz.
    #[arg(long, env = "DOCUQUIZ_COUNT", default_value_t = 5)]
    count: usize,

    /// Allowed question kinds: all, or a comma list of
    /// multiple_choice, short_answer, true_false, fill_blank.
    #[arg(long, env = "DOCUQUIZ_KINDS", default_value = "all")]
    kinds: String,

    /// Question difficulty.
    #[arg(long, env = "DOCUQUIZ_DIFFICULTY", value_enum, default_value = "medium")]
    difficulty: DifficultyArg,

    /// Reasoning model ID.
    #[arg(long, env = "DOCUQUIZ_MODEL")]
    model: Option<String>,

    /// Concurrent validation calls.
    #[arg(short, long, env = "DOCUQUIZ_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "DOCUQUIZ_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max model output tokens per call.
    #[arg(long, env = "DOCUQUIZ_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-call API timeout in seconds.
    #[arg(long, env = "DOCUQUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// JSON file with one answer per question, in display order; the quiz
    /// is graded against it after generation.
    #[arg(long)]
    answers: Option<PathBuf>,

    /// After a graded submission with wrong answers, also generate the
    /// review quiz. Requires --answers.
    #[arg(long, requires = "answers")]
    remediate: bool,

    /// Print the answer key and explanations with the questions.
    #[arg(long)]
    show_answers: bool,

    /// Output the quiz (and result, if graded) as pretty JSON.
    #[arg(long, env = "DOCUQUIZ_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCUQUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCUQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the quiz itself.
    #[arg(short, long, env = "DOCUQUIZ_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(v: DifficultyArg) -> Self {
        match v {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user-facing feedback; keep library logs at error
    // level unless explicitly asked for more.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read page text ───────────────────────────────────────────────────
    let raw = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let pages: Vec<RawPage> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of pages", cli.input.display()))?;
    if pages.is_empty() {
        bail!("{} contains no pages", cli.input.display());
    }

    // ── Build config & service ───────────────────────────────────────────
    let options = GenerateOptions {
        count: cli.count,
        kinds: parse_kinds(&cli.kinds)?,
        difficulty: cli.difficulty.clone().into(),
    };

    let env = QuizConfig::from_env();
    let mut builder = QuizConfig::builder()
        .api_key(env.api_key)
        .api_base(env.api_base)
        .model(env.model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .validation_concurrency(cli.concurrency)
        // Chunks are registered in the same process; never worth waiting on.
        .chunk_wait_attempts(1)
        .chunk_wait_delay_ms(0);
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let generator = Arc::new(GeminiClient::new(&config).context("Reasoning client setup failed")?);
    let service = QuizService::new(Arc::new(MemoryStore::new()), generator, config);

    // ── Generate ─────────────────────────────────────────────────────────
    let name = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let bar = if show_progress {
        Some(spinner(&format!(
            "Generating {} questions from {} pages…",
            options.count,
            pages.len()
        )))
    } else {
        None
    };

    let document = service
        .register_document(
            DocumentDraft {
                name,
                ..Default::default()
            },
            pages,
        )
        .await
        .context("Failed to register document")?;

    let quiz = service
        .generate_quiz(document.id, &options)
        .await
        .context("Quiz generation failed")?;

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {} {}",
            green("✔"),
            bold(&quiz.title),
            dim(&format!("({} questions)", quiz.questions.len()))
        );
    }

    // ── Emit the quiz ────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        let json = serde_json::to_string_pretty(&quiz).context("Failed to serialise quiz")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&quiz).context("Failed to serialise quiz")?
        );
    } else {
        print_quiz(&quiz, cli.show_answers)?;
    }

    // ── Grade & remediate ────────────────────────────────────────────────
    if let Some(ref answers_path) = cli.answers {
        let outcome = grade_from_file(&service, &quiz, answers_path).await?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome.result)
                    .context("Failed to serialise result")?
            );
        } else {
            print_result(&quiz, &outcome);
        }

        if let (true, Some(note)) = (cli.remediate, outcome.note.as_ref()) {
            let bar = if show_progress {
                Some(spinner("Generating review quiz…"))
            } else {
                None
            };
            let review = service
                .regenerate_quiz(note.id)
                .await
                .context("Remediation failed")?;
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&review)
                        .context("Failed to serialise review quiz")?
                );
            } else {
                if let Some(ref analysis) = review.weakness_analysis {
                    eprintln!("\n{} {}", cyan("◆"), bold("Diagnosis"));
                    eprintln!("  {analysis}");
                }
                eprintln!();
                print_quiz(&review, cli.show_answers)?;
            }
        } else if cli.remediate && !cli.quiet {
            eprintln!("{} Nothing to remediate", green("✔"));
        }
    }

    Ok(())
}

/// A steady-tick spinner in the house style.
fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Parse `--kinds` into a non-empty kind list.
fn parse_kinds(s: &str) -> Result<Vec<QuestionKind>> {
    let s = s.trim().to_lowercase();
    if s == "all" {
        return Ok(QuestionKind::ALL.to_vec());
    }

    let mut kinds = Vec::new();
    for part in s.split(',') {
        let kind = match part.trim() {
            "multiple_choice" => QuestionKind::MultipleChoice,
            "short_answer" => QuestionKind::ShortAnswer,
            "true_false" => QuestionKind::TrueFalse,
            "fill_blank" => QuestionKind::FillBlank,
            other => bail!(
                "Unknown question kind '{}' (expected multiple_choice, short_answer, \
                 true_false, or fill_blank)",
                other
            ),
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        bail!("--kinds must name at least one question kind");
    }
    Ok(kinds)
}

/// Read a positional answer file and grade the quiz against it.
async fn grade_from_file(
    service: &QuizService,
    quiz: &Quiz,
    path: &Path,
) -> Result<GradingOutcome> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let selected: Vec<String> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of answers", path.display()))?;

    if selected.len() != quiz.questions.len() {
        eprintln!(
            "{} {} answers for {} questions; unmatched positions are ignored",
            cyan("⚠"),
            selected.len(),
            quiz.questions.len()
        );
    }

    let answers: Vec<SubmittedAnswer> = quiz
        .questions
        .iter()
        .zip(selected)
        .map(|(question, selected_answer)| SubmittedAnswer {
            question_id: question.id,
            selected_answer,
        })
        .collect();

    service
        .grade_quiz(quiz.id, &answers)
        .await
        .context("Grading failed")
}

/// Render a quiz as numbered plain text on stdout.
fn print_quiz(quiz: &Quiz, show_answers: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "{} {}", cyan("◆"), bold(&quiz.title))?;
    for (i, question) in quiz.questions.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} {}",
            i + 1,
            dim(&format!("[{}]", question.kind.as_str())),
            question.text
        )?;
        if let Some(ref options) = question.options {
            for (j, option) in options.iter().enumerate() {
                let letter = (b'a' + j as u8) as char;
                writeln!(out, "       {letter}) {option}")?;
            }
        }
        if show_answers {
            writeln!(out, "       {}", green(&format!("answer: {}", question.answer)))?;
            if !question.explanation.is_empty() {
                writeln!(out, "       {}", dim(&question.explanation))?;
            }
        }
    }
    Ok(())
}

/// Render a graded result and its wrong answers on stderr.
fn print_result(quiz: &Quiz, outcome: &GradingOutcome) {
    let result = &outcome.result;
    let tick = if result.correct_questions == result.total_questions {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "\n{} Score: {}  {}",
        tick,
        bold(&result.score.to_string()),
        dim(&format!(
            "({}/{} correct)",
            result.correct_questions, result.total_questions
        ))
    );

    for answer in result.answers.iter().filter(|a| !a.is_correct) {
        if let Some(question) = quiz.find_question(answer.question_id) {
            eprintln!(
                "  {} {}",
                red("✗"),
                wrong_answer_line(question, &answer.selected_answer)
            );
        }
    }

    if let Some(ref note) = outcome.note {
        eprintln!(
            "  {}",
            dim(&format!("wrong-answer note recorded ({} items)", note.items.len()))
        );
    }
}

fn wrong_answer_line(question: &Question, selected: &str) -> String {
    format!(
        "{}  {}  {}",
        question.text,
        red(&format!("yours: {selected}")),
        green(&format!("correct: {}", question.answer))
    )
}
