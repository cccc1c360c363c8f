//! Pipeline stages for cause-list analysis.
//!
//! Each submodule implements one step. The two stages that talk to the
//! outside world sit behind traits ([`extract::PageExtractor`] and
//! [`classify::RecordClassifier`]) so the orchestrator can be driven by
//! in-memory fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunked ──▶ classify ──▶ response ──▶ normalize ──▶ assemble
//! (path/URL) (pdfium)   (chunks)    (LLM)        (JSON)       (Record)      (result)
//! ```
//!
//! 1. [`input`]:     resolve the path or URL to an in-memory [`crate::model::Document`]
//! 2. [`extract`]:   page texts in order; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`chunked`]:   partition pages into chunks, classify each chunk
//!    concurrently, merge in page order, drive progress
//! 4. [`classify`]:  the LLM call with retry/backoff; the only stage with
//!    network I/O after input
//! 5. [`response`]:  clean the raw model text into JSON items
//! 6. [`normalize`]: map items onto complete [`crate::model::Record`]s
//! 7. [`assemble`]:  package the records as an [`crate::output::AnalysisResult`]

pub mod assemble;
pub mod chunked;
pub mod classify;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod response;
