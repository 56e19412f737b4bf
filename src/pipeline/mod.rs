//! Pipeline stages for quiz generation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and keeps failure
//! containment local: a stage degrades its own unit of work and never
//! aborts the run on behalf of another.
//!
//! ## Data Flow
//!
//! ```text
//! raw pages ──▶ structure ──▶ synthesize ──▶ validate ──▶ package
//! (ingestion)   (blocks)      (candidates)   (verified)   (quiz draft)
//! ```
//!
//! 1. [`structure`]  — classify each page's raw text into typed blocks;
//!    a failed page degrades to one `unknown` block
//! 2. [`synthesize`] — one reasoning call producing an over-generated
//!    candidate bank; an unparseable reply degrades to an empty bank
//! 3. [`validate`]   — per-candidate quality judgments, fanned out with
//!    bounded concurrency; a failed judgment drops only its candidate
//! 4. [`package`]    — deterministic shaping: type filter, shuffle,
//!    truncate; pure, no I/O

pub mod package;
pub mod structure;
pub mod synthesize;
pub mod validate;
