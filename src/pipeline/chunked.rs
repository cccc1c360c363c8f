//! The chunked orchestrator: extract every page, then classify pages in
//! fixed-size chunks.
//!
//! ## Concurrency
//!
//! Chunks run strictly one after another. Inside a chunk, one classification
//! call per page runs concurrently and the whole chunk is awaited before the
//! next one starts, so at most `chunk_size` calls are ever in flight. The
//! calls are futures joined on the caller's task, not spawned tasks.
//!
//! ## Ordering
//!
//! Every call is tagged with its page index and a chunk's results are merged
//! in page order, so the final record order is page order, then the order the
//! classifier returned, whichever call finished first.

use crate::error::CauseListError;
use crate::model::{Document, PageText, Record};
use crate::output::{AnalysisResult, AnalysisStats};
use crate::pipeline::assemble::assemble_result;
use crate::pipeline::classify::RecordClassifier;
use crate::pipeline::extract::PageExtractor;
use crate::progress::{NoopProgressObserver, ProgressCallback, ProgressEvent, ProgressTracker};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::{debug, error, info};

/// The records classified from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecords {
    pub page_index: usize,
    pub records: Vec<Record>,
}

/// A boxed stream of per-page record batches.
pub type PageStream = Pin<Box<dyn Stream<Item = PageRecords> + Send>>;

/// Records and page count carried from one chunk to the next.
#[derive(Debug, Default)]
struct RunAccumulator {
    records: Vec<Record>,
    pages_processed: usize,
}

/// Runs a document through a [`PageExtractor`] and a [`RecordClassifier`].
pub struct ChunkedPipeline {
    extractor: Arc<dyn PageExtractor>,
    classifier: Arc<dyn RecordClassifier>,
    chunk_size: usize,
    observer: ProgressCallback,
}

impl ChunkedPipeline {
    /// A chunk size of zero is treated as one.
    pub fn new(
        extractor: Arc<dyn PageExtractor>,
        classifier: Arc<dyn RecordClassifier>,
        chunk_size: usize,
    ) -> Self {
        Self {
            extractor,
            classifier,
            chunk_size: chunk_size.max(1),
            observer: Arc::new(NoopProgressObserver),
        }
    }

    /// Report progress snapshots to `observer`.
    pub fn with_observer(mut self, observer: ProgressCallback) -> Self {
        self.observer = observer;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Analyze one document.
    ///
    /// Fails only if extraction fails; the observer then sees the `Error`
    /// stage with the error's message. Classification problems on individual
    /// pages only reduce the number of records.
    pub async fn run(&self, document: &Document) -> Result<AnalysisResult, CauseListError> {
        let total_start = Instant::now();
        let mut tracker = ProgressTracker::new(Arc::clone(&self.observer));
        tracker.apply(ProgressEvent::RunStarted);
        tracker.apply(ProgressEvent::ExtractionStarted);
        info!("Analyzing {} (chunk size {})", document.name(), self.chunk_size);

        // ── Step 1: Extract ──────────────────────────────────────────────────
        let extract_start = Instant::now();
        let pages = self.extract_pages(document, &mut tracker).await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
        let total_pages = pages.len();
        tracker.apply(ProgressEvent::AnalysisStarted { total_pages });

        // ── Step 2: Classify chunk by chunk ──────────────────────────────────
        let analyze_start = Instant::now();
        let mut acc = RunAccumulator::default();
        for chunk in pages.chunks(self.chunk_size) {
            acc = self.process_chunk(acc, chunk).await;
            tracker.apply(ProgressEvent::ChunkCompleted {
                pages_processed: acc.pages_processed,
            });
        }
        let analyze_duration_ms = analyze_start.elapsed().as_millis() as u64;
        tracker.apply(ProgressEvent::RunFinished);

        // ── Step 3: Assemble ─────────────────────────────────────────────────
        let mut result = assemble_result(document.name(), acc.records);
        result.stats = AnalysisStats {
            total_pages,
            chunk_size: self.chunk_size,
            total_records: result.records.len(),
            extract_duration_ms,
            analyze_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Analysis complete: {} records from {} pages, {}ms total",
            result.stats.total_records, total_pages, result.stats.total_duration_ms
        );
        Ok(result)
    }

    /// Extract the document, then yield each page's records as its chunk
    /// completes.
    ///
    /// Batches arrive in page order with the same chunking and in-flight
    /// limit as [`run`](Self::run). Extraction errors are returned before any
    /// batch is produced.
    pub async fn stream(self: Arc<Self>, document: &Document) -> Result<PageStream, CauseListError> {
        let mut tracker = ProgressTracker::new(Arc::clone(&self.observer));
        tracker.apply(ProgressEvent::RunStarted);
        tracker.apply(ProgressEvent::ExtractionStarted);

        let pages = self.extract_pages(document, &mut tracker).await?;
        tracker.apply(ProgressEvent::AnalysisStarted {
            total_pages: pages.len(),
        });

        let chunks: Vec<Vec<PageText>> = pages.chunks(self.chunk_size).map(<[PageText]>::to_vec).collect();
        let state = StreamState {
            pipeline: self,
            chunks: chunks.into_iter(),
            tracker,
            pages_processed: 0,
        };

        let batches = stream::unfold(state, |mut st| async move {
            let Some(chunk) = st.chunks.next() else {
                st.tracker.apply(ProgressEvent::RunFinished);
                return None;
            };
            let batch = st.pipeline.classify_chunk(&chunk).await;
            st.pages_processed += chunk.len();
            st.tracker.apply(ProgressEvent::ChunkCompleted {
                pages_processed: st.pages_processed,
            });
            Some((batch, st))
        });

        Ok(Box::pin(batches.flat_map(stream::iter)))
    }

    async fn extract_pages(
        &self,
        document: &Document,
        tracker: &mut ProgressTracker,
    ) -> Result<Vec<PageText>, CauseListError> {
        let extracted = {
            let mut on_progress = |current: usize, total: usize| {
                tracker.apply(ProgressEvent::ExtractionProgress { current, total });
            };
            self.extractor.extract(document, &mut on_progress).await
        };

        match extracted {
            Ok(pages) => {
                debug!("Extracted {} pages from {}", pages.len(), document.name());
                Ok(pages)
            }
            Err(e) => {
                error!("Extraction failed for {}: {}", document.name(), e);
                tracker.apply(ProgressEvent::RunFailed {
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    async fn process_chunk(&self, mut acc: RunAccumulator, chunk: &[PageText]) -> RunAccumulator {
        for page in self.classify_chunk(chunk).await {
            acc.records.extend(page.records);
        }
        acc.pages_processed += chunk.len();
        acc
    }

    /// Classify every page of a chunk concurrently; results in page order.
    async fn classify_chunk(&self, chunk: &[PageText]) -> Vec<PageRecords> {
        let calls = chunk.iter().map(|page| {
            let classifier = Arc::clone(&self.classifier);
            async move {
                let records = classifier.classify(&page.text, page.index).await;
                PageRecords {
                    page_index: page.index,
                    records,
                }
            }
        });

        let mut results = join_all(calls).await;
        results.sort_by_key(|p| p.page_index);
        debug!(
            "Chunk of pages {:?} done: {} records",
            results.iter().map(|p| p.page_index).collect::<Vec<_>>(),
            results.iter().map(|p| p.records.len()).sum::<usize>()
        );
        results
    }
}

struct StreamState {
    pipeline: Arc<ChunkedPipeline>,
    chunks: std::vec::IntoIter<Vec<PageText>>,
    tracker: ProgressTracker,
    pages_processed: usize,
}
