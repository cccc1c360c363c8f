//! Page text extraction: the [`PageExtractor`] boundary and its pdfium
//! implementation.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. Extraction runs on the blocking pool and reports each
//! finished page back over a channel, so the caller's progress callback still
//! fires once per page while the worker threads stay free.

use crate::error::CauseListError;
use crate::model::{Document, PageText};
use crate::output::DocumentMetadata;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, info};

/// Turns a document into ordered page texts.
///
/// Implementations must call `on_progress(page_index, total_pages)` exactly
/// once per page, with `page_index` running from 1 to `total_pages`, and must
/// return pages in document order. A document that cannot be parsed fails the
/// whole call; no partial page list is returned.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(
        &self,
        document: &Document,
        on_progress: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<Vec<PageText>, CauseListError>;
}

/// Extracts page text with pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(password: Option<String>) -> Self {
        Self { password }
    }
}

#[async_trait]
impl PageExtractor for PdfiumExtractor {
    async fn extract(
        &self,
        document: &Document,
        on_progress: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<Vec<PageText>, CauseListError> {
        let bytes = document.shared_bytes();
        let name = document.name().to_string();
        let password = self.password.clone();
        let (tx, mut rx) = unbounded_channel();

        let handle = tokio::task::spawn_blocking(move || {
            extract_pages_blocking(&name, &bytes, password.as_deref(), &tx)
        });

        // The sender lives in the blocking task; the loop ends when it returns.
        while let Some((current, total)) = rx.recv().await {
            on_progress(current, total);
        }

        handle
            .await
            .map_err(|e| CauseListError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// Blocking implementation of page extraction.
fn extract_pages_blocking(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
    progress: &UnboundedSender<(usize, usize)>,
) -> Result<Vec<PageText>, CauseListError> {
    let pdfium = load_pdfium().map_err(|e| CauseListError::PdfiumBindingFailed(format!("{:?}", e)))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| load_error(name, password, e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages", total);

    let mut out = Vec::with_capacity(total);
    for (i, page) in pages.iter().enumerate() {
        let index = i + 1;
        let text = page.text().map_err(|e| CauseListError::DocumentParse {
            name: name.to_string(),
            detail: format!("page {}: {:?}", index, e),
        })?;

        let page_text = page_from_raw_text(index, &text.all());
        debug!("Extracted page {} → {} chars", index, page_text.text.len());

        // The receiver only goes away if the caller stopped listening.
        let _ = progress.send((index, total));
        out.push(page_text);
    }

    Ok(out)
}

/// pdfium's raw text has one line per text run; trim and space-join them.
pub(crate) fn page_from_raw_text(index: usize, raw: &str) -> PageText {
    PageText::from_fragments(
        index,
        raw.lines().map(str::trim).filter(|line| !line.is_empty()),
    )
}

fn load_error(name: &str, password: Option<&str>, e: PdfiumError) -> CauseListError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            CauseListError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            CauseListError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        CauseListError::DocumentParse {
            name: name.to_string(),
            detail: err_str,
        }
    }
}

/// Bind pdfium: `PDFIUM_LIB_PATH` (file or directory) first, then the
/// working directory, then the system library.
fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(value) = std::env::var_os("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(value);
        let lib = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        return Pdfium::bind_to_library(lib).map(Pdfium::new);
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(primary_err) => match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(_) => Err(primary_err),
        },
    }
}

/// Read document metadata and page count without extracting text.
pub async fn extract_metadata(
    document: &Document,
    password: Option<&str>,
) -> Result<DocumentMetadata, CauseListError> {
    let bytes = document.shared_bytes();
    let name = document.name().to_string();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&name, &bytes, pwd.as_deref()))
        .await
        .map_err(|e| CauseListError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<DocumentMetadata, CauseListError> {
    let pdfium = load_pdfium().map_err(|e| CauseListError::PdfiumBindingFailed(format!("{:?}", e)))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| load_error(name, password, e))?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        name: name.to_string(),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
