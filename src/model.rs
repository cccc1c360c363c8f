//! Core data model: documents, page texts, and classified case records.
//!
//! Everything here is plain data. [`Record`] values are only ever built by
//! [`crate::pipeline::normalize`], which guarantees that every field is
//! populated and that the category is a member of [`CaseCategory`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A source document: raw bytes plus a display name.
///
/// Cloning is cheap (the bytes are shared), so the document can be handed to
/// a blocking extraction thread without copying.
#[derive(Clone)]
pub struct Document {
    name: String,
    bytes: Arc<[u8]>,
}

impl Document {
    /// Wrap in-memory bytes with a display name.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, for moving into `spawn_blocking`.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// The text of one physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number, matching the document's physical order.
    pub index: usize,
    pub text: String,
}

impl PageText {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Build a page from its text fragments, joined with single spaces.
    pub fn from_fragments<I, S>(index: usize, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = fragments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Self { index, text }
    }
}

/// Legal category of a case. `Other` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseCategory {
    Criminal,
    Service,
    Civil,
    Family,
    Election,
    Tax,
    Other,
}

impl CaseCategory {
    /// Every category, in declaration order.
    pub const ALL: [CaseCategory; 7] = [
        CaseCategory::Criminal,
        CaseCategory::Service,
        CaseCategory::Civil,
        CaseCategory::Family,
        CaseCategory::Election,
        CaseCategory::Tax,
        CaseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Criminal => "Criminal",
            CaseCategory::Service => "Service",
            CaseCategory::Civil => "Civil",
            CaseCategory::Family => "Family",
            CaseCategory::Election => "Election",
            CaseCategory::Tax => "Tax",
            CaseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a category name that is not an exact match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown case category '{0}'")]
pub struct UnknownCategory(pub String);

/// Exact, case-insensitive name lookup.
///
/// This is for user input such as `--category civil`. Classifier output goes
/// through the lenient keyword matcher in [`crate::pipeline::normalize`].
impl FromStr for CaseCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CaseCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// One case extracted from exactly one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within a run: `p{page}_c{position}_{sequence}`.
    pub id: String,
    pub case_number: String,
    pub title: String,
    pub category: CaseCategory,
    pub summary: String,
    pub lawyers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<String>,
    /// 1-indexed source page.
    pub page_index: usize,
}
