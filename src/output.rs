//! Output types: the assembled analysis result and its query helpers.

use crate::model::{CaseCategory, Record};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The final result of one successful run.
///
/// Built once by [`crate::pipeline::assemble::assemble_result`] and owned
/// by the caller from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Display name of the source document.
    pub source_name: String,
    pub completed_at: DateTime<Utc>,
    /// All records, in page order then classifier order.
    pub records: Vec<Record>,
    #[serde(default)]
    pub stats: AnalysisStats,
}

/// Timing and volume figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_pages: usize,
    pub chunk_size: usize,
    pub total_records: usize,
    pub extract_duration_ms: u64,
    pub analyze_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Selection criteria for [`AnalysisResult::filter`]. `None` matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub category: Option<CaseCategory>,
    pub date: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        self.category.is_none_or(|c| record.category == c)
            && self.date.is_none_or(|d| record.date == Some(d))
    }
}

impl AnalysisResult {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Per-category counts in category order, omitting empty categories.
    pub fn category_counts(&self) -> Vec<(CaseCategory, usize)> {
        CaseCategory::ALL
            .into_iter()
            .map(|c| (c, self.records.iter().filter(|r| r.category == c).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn filter<'a>(&'a self, filter: &'a RecordFilter) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| filter.matches(r))
    }

    /// Distinct record dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().filter_map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}

/// Document metadata reported by [`crate::analyze::inspect`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(page: usize, category: CaseCategory, date: Option<&str>) -> Record {
        Record {
            id: format!("p{page}_c0_{page}"),
            case_number: format!("CP-{page}"),
            title: "A v. B".into(),
            category,
            summary: "Bail".into(),
            lawyers: vec![],
            date: date.map(|d| d.parse().unwrap()),
            bench: None,
            page_index: page,
        }
    }

    fn result(records: Vec<Record>) -> AnalysisResult {
        AnalysisResult {
            source_name: "list.pdf".into(),
            completed_at: Utc::now(),
            records,
            stats: AnalysisStats::default(),
        }
    }

    #[test]
    fn counts_skip_empty_categories_and_keep_order() {
        let r = result(vec![
            record(1, CaseCategory::Tax, None),
            record(1, CaseCategory::Criminal, None),
            record(2, CaseCategory::Criminal, None),
        ]);
        assert_eq!(
            r.category_counts(),
            vec![(CaseCategory::Criminal, 2), (CaseCategory::Tax, 1)]
        );
        assert_eq!(r.total(), 3);
    }

    #[test]
    fn filter_by_category_and_date() {
        let r = result(vec![
            record(1, CaseCategory::Civil, Some("2024-03-01")),
            record(2, CaseCategory::Civil, Some("2024-03-02")),
            record(3, CaseCategory::Family, Some("2024-03-01")),
        ]);

        let by_cat = RecordFilter {
            category: Some(CaseCategory::Civil),
            date: None,
        };
        assert_eq!(r.filter(&by_cat).count(), 2);

        let both = RecordFilter {
            category: Some(CaseCategory::Civil),
            date: Some("2024-03-01".parse().unwrap()),
        };
        let hits: Vec<_> = r.filter(&both).map(|r| r.page_index).collect();
        assert_eq!(hits, vec![1]);

        assert_eq!(r.filter(&RecordFilter::default()).count(), 3);
    }

    #[test]
    fn dates_are_unique_and_sorted() {
        let r = result(vec![
            record(1, CaseCategory::Civil, Some("2024-03-02")),
            record(2, CaseCategory::Civil, None),
            record(3, CaseCategory::Civil, Some("2024-03-01")),
            record(4, CaseCategory::Civil, Some("2024-03-02")),
        ]);
        let dates: Vec<String> = r.dates().iter().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02"]);
    }
}
