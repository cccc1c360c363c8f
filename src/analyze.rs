//! Eager (full-document) analysis entry points.
//!
//! These wire the production stages together: input resolution, the pdfium
//! extractor, the LLM classifier and the [`ChunkedPipeline`]. Use
//! [`crate::stream::analyze_stream`] instead to receive records page by page.

use crate::config::AnalysisConfig;
use crate::error::CauseListError;
use crate::model::Document;
use crate::output::{AnalysisResult, DocumentMetadata};
use crate::pipeline::chunked::ChunkedPipeline;
use crate::pipeline::classify::LlmClassifier;
use crate::pipeline::extract::{self, PdfiumExtractor};
use crate::pipeline::input;
use crate::progress::NoopProgressObserver;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Model used when the provider is chosen without one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Analyze a cause-list PDF from a local path or HTTP/HTTPS URL.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(CauseListError)` only for fatal errors:
/// - File not found / permission denied / download failure
/// - Not a PDF, or a PDF that cannot be parsed
/// - No LLM provider could be configured
///
/// Pages whose classification fails contribute no records; the run still
/// succeeds.
pub async fn analyze(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, CauseListError> {
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);

    let document = input::resolve_input(input_str, config.download_timeout_secs).await?;
    analyze_document(&document, config).await
}

/// Analyze an already-loaded document.
pub async fn analyze_document(
    document: &Document,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, CauseListError> {
    let pipeline = build_pipeline(config)?;
    pipeline.run(document).await
}

/// Analyze PDF bytes held in memory.
///
/// # Example
/// ```rust,no_run
/// use edgequake_causelist::{analyze_bytes, AnalysisConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("cause-list.pdf")?;
/// let result = analyze_bytes("cause-list.pdf", bytes, &AnalysisConfig::default()).await?;
/// for (category, count) in result.category_counts() {
///     println!("{category}: {count}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze_bytes(
    name: impl Into<String>,
    bytes: impl Into<Vec<u8>>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, CauseListError> {
    let document = Document::new(name, bytes);
    input::ensure_pdf(document.name(), document.bytes())?;
    analyze_document(&document, config).await
}

/// Analyze a PDF and write the result as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, CauseListError> {
    let result = analyze(input_str, config).await?;
    write_result(&result, output_path.as_ref()).await?;
    Ok(result)
}

/// Serialize `result` to `path` via a sibling temp file.
pub async fn write_result(result: &AnalysisResult, path: &Path) -> Result<(), CauseListError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CauseListError::Internal(format!("Failed to serialize result: {}", e)))?;
    write_atomic(path, json.as_bytes()).await
}

pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CauseListError> {
    let write_err = |e| CauseListError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, CauseListError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CauseListError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input_str, config))
}

/// Read PDF metadata and page count without classifying anything.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<DocumentMetadata, CauseListError> {
    let document = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(&document, config.password.as_deref()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Build the production pipeline for `config`.
pub(crate) fn build_pipeline(config: &AnalysisConfig) -> Result<ChunkedPipeline, CauseListError> {
    let provider = resolve_provider(config)?;
    let extractor = Arc::new(PdfiumExtractor::with_password(config.password.clone()));
    let classifier = Arc::new(LlmClassifier::new(provider, config));
    let observer = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressObserver));

    Ok(ChunkedPipeline::new(extractor, classifier, config.chunk_size).with_observer(observer))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CauseListError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CauseListError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]; the factory reads the matching API key.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini** when `GEMINI_API_KEY` is set.
/// 5. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, CauseListError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Some(prov), Some(env_model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        return create_provider(&prov, &env_model);
    }

    if non_empty_env("GEMINI_API_KEY").is_some() {
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CauseListError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
