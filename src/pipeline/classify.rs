//! Page classification: the [`RecordClassifier`] boundary and its LLM
//! implementation.
//!
//! Classification of a page never fails the run. [`LlmClassifier`] resolves
//! every outcome (transport error, timeout, unparseable output) to a list of
//! records, possibly empty, and logs what went wrong.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent when a
//! chunk's pages hit the provider together. Exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`) spaces the retries: with a 500 ms
//! base and 2 retries the waits are 500 ms then 1 s. A response that arrives
//! but cannot be parsed is not retried.

use crate::config::AnalysisConfig;
use crate::error::PageError;
use crate::model::Record;
use crate::pipeline::normalize::{normalize_items, RecordIdSequence};
use crate::pipeline::response::parse_items;
use crate::prompts::{page_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Turns one page's text into zero or more records.
///
/// Implementations must not fail: any problem yields an empty list. Every
/// returned record must carry `page_index` and a fresh id.
#[async_trait]
pub trait RecordClassifier: Send + Sync {
    async fn classify(&self, page_text: &str, page_index: usize) -> Vec<Record>;
}

/// Classifies pages by prompting an LLM for a JSON array of cases.
pub struct LlmClassifier {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
    ids: RecordIdSequence,
}

impl LlmClassifier {
    /// Build a classifier from the run configuration.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
            ids: RecordIdSequence::new(),
        }
    }

    /// Classify a page, reporting why it produced nothing if it failed.
    pub async fn try_classify(
        &self,
        page_text: &str,
        page_index: usize,
    ) -> Result<Vec<Record>, PageError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(page_prompt(page_text)),
        ];
        let call_timeout = Duration::from_secs(self.api_timeout_secs);

        let mut last_err: Option<PageError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "Page {}: retry {}/{} after {}ms",
                    page_index, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(call_timeout, self.provider.chat(&messages, Some(&self.options))).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Page {}: {} input tokens, {} output tokens, {:?}",
                        page_index,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return records_from_response(&response.content, page_index, &self.ids);
                }
                Ok(Err(e)) => {
                    warn!("Page {}: attempt {} failed: {}", page_index, attempt + 1, e);
                    last_err = Some(PageError::LlmFailed {
                        page: page_index,
                        retries: attempt,
                        detail: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        "Page {}: attempt {} timed out after {}s",
                        page_index,
                        attempt + 1,
                        self.api_timeout_secs
                    );
                    last_err = Some(PageError::Timeout {
                        page: page_index,
                        secs: self.api_timeout_secs,
                    });
                }
            }
        }

        Err(last_err.unwrap_or(PageError::LlmFailed {
            page: page_index,
            retries: self.max_retries,
            detail: "Unknown error".to_string(),
        }))
    }
}

#[async_trait]
impl RecordClassifier for LlmClassifier {
    async fn classify(&self, page_text: &str, page_index: usize) -> Vec<Record> {
        match self.try_classify(page_text, page_index).await {
            Ok(records) => {
                debug!("Page {}: {} records", page_index, records.len());
                records
            }
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }
}

/// Parse and normalize a model response for one page.
pub fn records_from_response(
    raw: &str,
    page_index: usize,
    ids: &RecordIdSequence,
) -> Result<Vec<Record>, PageError> {
    let items = parse_items(raw).map_err(|detail| PageError::MalformedResponse {
        page: page_index,
        detail,
    })?;
    Ok(normalize_items(&items, page_index, ids))
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
