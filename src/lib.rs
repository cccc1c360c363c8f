//! # edgequake-causelist
//!
//! Turn court cause-list PDFs into categorized case records using an LLM.
//!
//! ## Why this crate?
//!
//! Cause lists are long, dense and inconsistently laid out; after text
//! extraction they read like OCR soup. Instead of brittle regexes this crate
//! hands each page's text to an LLM with a fixed legal taxonomy, then
//! normalizes whatever comes back into complete, typed [`Record`]s.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Chunk     pages in fixed-size batches, chunk after chunk
//!  ├─ 4. Classify  concurrent LLM calls within a chunk (gemini / openai / …)
//!  ├─ 5. Normalize placeholders, category mapping, dates, ids
//!  └─ 6. Output    records in page order + per-category counts + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_causelist::{analyze, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = AnalysisConfig::default();
//!     let result = analyze("cause-list.pdf", &config).await?;
//!     for (category, count) in result.category_counts() {
//!         println!("{category}: {count}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `causelist` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-causelist = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_bytes, analyze_document, analyze_sync, analyze_to_file, inspect,
    resolve_provider, write_result,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_CHUNK_SIZE};
pub use error::{CauseListError, PageError};
pub use model::{CaseCategory, Document, PageText, Record, UnknownCategory};
pub use output::{AnalysisResult, AnalysisStats, DocumentMetadata, RecordFilter};
pub use pipeline::chunked::{ChunkedPipeline, PageRecords, PageStream};
pub use pipeline::classify::{LlmClassifier, RecordClassifier};
pub use pipeline::extract::{PageExtractor, PdfiumExtractor};
pub use progress::{
    NoopProgressObserver, ProgressCallback, ProgressEvent, ProgressObserver, ProgressState, Stage,
};
pub use stream::{analyze_document_stream, analyze_stream};
