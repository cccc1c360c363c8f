//! Error types for the edgequake-causelist library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CauseListError`]: **Fatal**: the run cannot proceed at all (missing
//!   file, unparseable PDF, provider not configured). Returned as
//!   `Err(CauseListError)` from the top-level `analyze*` functions, and the
//!   progress stage moves to [`crate::progress::Stage::Error`].
//!
//! * [`PageError`]: **Non-fatal**: classification of one page failed
//!   (transport error, timeout, unparseable model output). The LLM classifier
//!   logs it and contributes zero records for that page; every other page is
//!   unaffected and the run still completes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-causelist library.
#[derive(Debug, Error)]
pub enum CauseListError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The document could not be parsed into page text. Fatal to the run.
    #[error("Failed to parse '{name}': {detail}\nPlease ensure it is a valid PDF.")]
    DocumentParse { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium next to the binary or in the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CauseListError {
    /// Short, single-line message suitable for a progress display.
    ///
    /// The `Display` output carries hints on extra lines; observers showing
    /// the `error` stage only want the first one.
    pub fn user_message(&self) -> String {
        let full = self.to_string();
        full.lines().next().unwrap_or_default().to_string()
    }

    /// True for failures raised while turning the document into page text.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            CauseListError::DocumentParse { .. }
                | CauseListError::PasswordRequired { .. }
                | CauseListError::WrongPassword { .. }
                | CauseListError::PdfiumBindingFailed(_)
        )
    }
}

/// A non-fatal error for a single page's classification.
///
/// Never surfaced as a run failure: the classifier logs it and the page
/// contributes an empty record set.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// LLM call failed after retries.
    #[error("Page {page}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        page: usize,
        retries: u32,
        detail: String,
    },

    /// LLM call timed out.
    #[error("Page {page}: LLM call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },

    /// The model answered, but not with a usable JSON array.
    #[error("Page {page}: unparseable classifier response: {detail}")]
    MalformedResponse { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::LlmFailed { page, .. }
            | PageError::Timeout { page, .. }
            | PageError::MalformedResponse { page, .. } => *page,
        }
    }
}
