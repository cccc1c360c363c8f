//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! pdfium can parse straight from a byte slice, so both local files and
//! downloads end up as in-memory bytes and nothing touches a temp directory.
//! The `%PDF` magic bytes are checked here so callers get a meaningful error
//! instead of a pdfium parse failure.

use crate::error::CauseListError;
use crate::model::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a loaded document.
///
/// URLs are downloaded with the given timeout; anything else is read as a
/// local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Document, CauseListError> {
    if input.trim().is_empty() {
        return Err(CauseListError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Reject byte buffers that do not start with `%PDF`.
pub fn ensure_pdf(name: &str, bytes: &[u8]) -> Result<(), CauseListError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(CauseListError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

async fn read_local(path: &Path) -> Result<Document, CauseListError> {
    let path_buf: PathBuf = path.to_path_buf();

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => CauseListError::PermissionDenied {
            path: path_buf.clone(),
        },
        _ => CauseListError::FileNotFound {
            path: path_buf.clone(),
        },
    })?;

    let name = display_name(path);
    ensure_pdf(&name, &bytes)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(Document::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, CauseListError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CauseListError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            CauseListError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            CauseListError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(CauseListError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CauseListError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = filename_from_url(url);
    ensure_pdf(&name, &bytes)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(Document::new(name, bytes.to_vec()))
}

/// File name component of a path, or the whole path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a reasonable file name from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
