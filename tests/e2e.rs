//! End-to-end integration tests for edgequake-causelist.
//!
//! These tests read real cause-list PDFs from `./test_cases/` and make live
//! LLM API calls. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! Expected fixture: `test_cases/cause_list.pdf`, a multi-page court cause
//! list.

use edgequake_causelist::{
    analyze, analyze_stream, analyze_to_file, inspect, AnalysisConfig, AnalysisResult,
    CaseCategory, CauseListError, RecordFilter,
};
use futures::StreamExt;
use std::collections::HashSet;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Route library logs to the test output; `RUST_LOG` selects the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Invariants every successful result must satisfy, whatever the model said.
fn assert_result_sane(result: &AnalysisResult, context: &str) {
    let pages = result.stats.total_pages;
    assert!(pages > 0, "[{context}] no pages extracted");

    let ids: HashSet<&str> = result.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), result.records.len(), "[{context}] duplicate record ids");

    let mut last_page = 0;
    for r in &result.records {
        assert!(
            (1..=pages).contains(&r.page_index),
            "[{context}] page index {} out of 1..={pages}",
            r.page_index
        );
        assert!(r.page_index >= last_page, "[{context}] records out of page order");
        last_page = r.page_index;

        assert!(!r.case_number.is_empty(), "[{context}] empty case number");
        assert!(!r.title.is_empty(), "[{context}] empty title");
        assert!(!r.summary.is_empty(), "[{context}] empty summary");
    }

    let counted: usize = result.category_counts().iter().map(|(_, n)| n).sum();
    assert_eq!(counted, result.total(), "[{context}] counts do not add up");

    println!(
        "[{context}] ✓  {} records from {} pages in {}ms",
        result.total(),
        pages,
        result.stats.total_duration_ms
    );
}

// ── Inspect tests (no LLM) ───────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_cause_list() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("cause_list.pdf"));

    let meta = inspect(path.to_str().unwrap(), &AnalysisConfig::default())
        .await
        .expect("inspect() should succeed");

    assert!(meta.page_count > 0);
    assert_eq!(meta.name, "cause_list.pdf");
    println!("Metadata: {:?}", meta);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }

    let err = inspect("/definitely/not/a/real/file.pdf", &AnalysisConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CauseListError::FileNotFound { .. }));
}

// ── Analysis tests (need LLM API) ────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_cause_list() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("cause_list.pdf"));
    init_tracing();

    let config = AnalysisConfig::builder()
        .chunk_size(3)
        .build()
        .expect("valid config");

    let result = analyze(path.to_str().unwrap(), &config)
        .await
        .expect("analysis should succeed");

    assert_result_sane(&result, "cause_list");
    assert!(result.total() > 0, "a cause list should contain cases");

    for category in CaseCategory::ALL {
        let filter = RecordFilter {
            category: Some(category),
            date: None,
        };
        assert!(result.filter(&filter).all(|r| r.category == category));
    }
}

#[tokio::test]
async fn test_analyze_to_file_writes_json() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("cause_list.pdf"));
    let out_path = output_dir().join("cause_list.json");

    let result = analyze_to_file(path.to_str().unwrap(), &out_path, &AnalysisConfig::default())
        .await
        .expect("analysis should succeed");

    let text = std::fs::read_to_string(&out_path).expect("output file should exist");
    let back: AnalysisResult = serde_json::from_str(&text).expect("output should be valid JSON");
    assert_eq!(back.records.len(), result.records.len());
}

#[tokio::test]
async fn test_stream_matches_page_order() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("cause_list.pdf"));

    let mut stream = analyze_stream(path.to_str().unwrap(), &AnalysisConfig::default())
        .await
        .expect("stream should start");

    let mut pages = Vec::new();
    while let Some(batch) = stream.next().await {
        assert!(batch.records.iter().all(|r| r.page_index == batch.page_index));
        pages.push(batch.page_index);
    }

    let expected: Vec<usize> = (1..=pages.len()).collect();
    assert_eq!(pages, expected);
}
