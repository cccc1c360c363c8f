//! Streaming analysis API: emit each page's records as its chunk completes.
//!
//! Unlike the eager [`crate::analyze::analyze`], which returns only after
//! every chunk finishes, [`analyze_stream`] yields [`PageRecords`] batches as
//! soon as their chunk is done. Batches always arrive in page order, and the
//! in-flight limit is the same `chunk_size` the eager path uses.

use crate::analyze::build_pipeline;
use crate::config::AnalysisConfig;
use crate::error::CauseListError;
use crate::model::Document;
use crate::pipeline::chunked::PageStream;
use crate::pipeline::input;
use std::sync::Arc;
use tracing::info;

/// Analyze a PDF, streaming per-page record batches.
///
/// # Returns
/// - `Ok(PageStream)`: one [`PageRecords`](crate::PageRecords) per page, in
///   page order. A page whose classification failed yields an empty batch.
/// - `Err(CauseListError)`: fatal error (file not found, not a PDF,
///   unparseable document, no provider). Raised before any batch is produced.
///
/// # Example
/// ```rust,no_run
/// use edgequake_causelist::{analyze_stream, AnalysisConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pages = analyze_stream("cause-list.pdf", &AnalysisConfig::default()).await?;
/// while let Some(page) = pages.next().await {
///     println!("Page {}: {} cases", page.page_index, page.records.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze_stream(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<PageStream, CauseListError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming analysis: {}", input_str);

    let document = input::resolve_input(input_str, config.download_timeout_secs).await?;
    analyze_document_stream(&document, config).await
}

/// Streaming equivalent of [`crate::analyze::analyze_document`].
pub async fn analyze_document_stream(
    document: &Document,
    config: &AnalysisConfig,
) -> Result<PageStream, CauseListError> {
    let pipeline = Arc::new(build_pipeline(config)?);
    pipeline.stream(document).await
}
