//! Normalization of raw classifier items into [`Record`]s.
//!
//! The classifier's output is untrusted: fields may be missing, empty, of the
//! wrong JSON type, or carry a category outside the taxonomy. Nothing here
//! rejects a record. Each bad field gets an explicit placeholder and an
//! unknown category becomes [`CaseCategory::Other`].

use crate::model::{CaseCategory, Record};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const UNKNOWN_CASE_NUMBER: &str = "Unknown";
pub const UNKNOWN_TITLE: &str = "Unknown Parties";
pub const NO_SUMMARY: &str = "No summary available";

/// Keyword substrings per category, in match priority order.
///
/// The first category with a keyword contained in the lower-cased input wins,
/// so "criminal tax evasion" is `Criminal`.
const CATEGORY_KEYWORDS: &[(CaseCategory, &[&str])] = &[
    (CaseCategory::Criminal, &["crim"]),
    (CaseCategory::Service, &["service"]),
    (CaseCategory::Civil, &["civil"]),
    (CaseCategory::Family, &["family"]),
    (CaseCategory::Election, &["election"]),
    (CaseCategory::Tax, &["tax", "custom"]),
];

/// Date layouts accepted from the model, most expected first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Map a free-form category string onto the closed taxonomy.
pub fn map_category(raw: Option<&str>) -> CaseCategory {
    let Some(raw) = raw else {
        return CaseCategory::Other;
    };
    let lower = raw.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(CaseCategory::Other)
}

/// Parse a calendar date. A trailing time component is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// One item as the model returned it, before normalization.
///
/// Built leniently from a JSON value: wrong-typed fields read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub case_number: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub lawyers: Option<Vec<String>>,
    pub date: Option<String>,
    pub bench: Option<String>,
}

impl RawRecord {
    /// Read the known fields of a JSON object.
    ///
    /// A bare string (or number) item is a case the model wrote out as text;
    /// it becomes the title. `None` for items with nothing to read: `null`,
    /// booleans and nested arrays.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Some(obj) = value.as_object() else {
            return scalar_text(value).map(|title| Self {
                title: Some(title),
                ..Self::default()
            });
        };
        let text = |key: &str| obj.get(key).and_then(scalar_text);

        let lawyers = obj.get("lawyers").map(|v| match v {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            // A single name instead of a list.
            other => scalar_text(other).into_iter().collect(),
        });

        Some(Self {
            case_number: text("caseNumber"),
            title: text("title"),
            category: text("category"),
            summary: text("summary"),
            lawyers,
            date: text("date"),
            bench: text("bench"),
        })
    }
}

/// Strings and numbers become trimmed text; empties and other types do not.
fn scalar_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Source of record identifiers.
///
/// A monotonic counter shared by clones, so ids stay unique across every
/// concurrent call of a classifier and are deterministic in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordIdSequence {
    next: Arc<AtomicU64>,
}

impl RecordIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// `p{page}_c{position}_{seq}` with `seq` in base 36.
    pub fn next_id(&self, page_index: usize, position: usize) -> String {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        format!("p{page_index}_c{position}_{}", to_base36(seq))
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Turn one raw item into a complete [`Record`].
pub fn normalize_record(
    raw: RawRecord,
    page_index: usize,
    position: usize,
    ids: &RecordIdSequence,
) -> Record {
    Record {
        id: ids.next_id(page_index, position),
        case_number: raw
            .case_number
            .unwrap_or_else(|| UNKNOWN_CASE_NUMBER.to_string()),
        title: raw.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        category: map_category(raw.category.as_deref()),
        summary: raw.summary.unwrap_or_else(|| NO_SUMMARY.to_string()),
        lawyers: raw.lawyers.unwrap_or_default(),
        date: raw.date.as_deref().and_then(parse_date),
        bench: raw.bench,
        page_index,
    }
}

/// Normalize every item of a page, keeping their order.
///
/// Items [`RawRecord::from_value`] cannot read are skipped; positions count
/// only the kept items.
pub fn normalize_items(items: &[Value], page_index: usize, ids: &RecordIdSequence) -> Vec<Record> {
    items
        .iter()
        .filter_map(RawRecord::from_value)
        .enumerate()
        .map(|(position, raw)| normalize_record(raw, page_index, position, ids))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_category_names_map_to_themselves() {
        for c in CaseCategory::ALL {
            assert_eq!(map_category(Some(c.as_str())), c);
        }
    }

    #[test]
    fn category_matching_is_case_insensitive_substring() {
        assert_eq!(map_category(Some("CRIMINAL APPEAL")), CaseCategory::Criminal);
        assert_eq!(map_category(Some("Civil Revision")), CaseCategory::Civil);
        assert_eq!(map_category(Some("customs reference")), CaseCategory::Tax);
        assert_eq!(map_category(Some("Income TAX")), CaseCategory::Tax);
        assert_eq!(map_category(Some("civil service")), CaseCategory::Service);
    }

    #[test]
    fn unknown_or_missing_category_is_other() {
        assert_eq!(map_category(Some("Constitutional")), CaseCategory::Other);
        assert_eq!(map_category(Some("")), CaseCategory::Other);
        assert_eq!(map_category(None), CaseCategory::Other);
    }

    #[test]
    fn dates_in_several_layouts() {
        let want = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date("2024-03-07"), Some(want));
        assert_eq!(parse_date("07/03/2024"), Some(want));
        assert_eq!(parse_date("07.03.2024"), Some(want));
        assert_eq!(parse_date("2024-03-07T10:00:00Z"), Some(want));
        assert_eq!(parse_date("next Tuesday"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let ids = RecordIdSequence::new();
        let r = normalize_record(RawRecord::default(), 4, 0, &ids);
        assert_eq!(r.case_number, UNKNOWN_CASE_NUMBER);
        assert_eq!(r.title, UNKNOWN_TITLE);
        assert_eq!(r.summary, NO_SUMMARY);
        assert_eq!(r.category, CaseCategory::Other);
        assert!(r.lawyers.is_empty());
        assert_eq!(r.date, None);
        assert_eq!(r.page_index, 4);
    }

    #[test]
    fn wrong_typed_fields_are_salvaged_or_defaulted() {
        let raw = RawRecord::from_value(&json!({
            "caseNumber": 1234,
            "title": "   ",
            "category": ["Civil"],
            "lawyers": "Mr. Shah",
            "date": "2024-01-15",
            "bench": "Bench-II"
        }))
        .unwrap();
        assert_eq!(raw.case_number.as_deref(), Some("1234"));
        assert_eq!(raw.title, None);
        assert_eq!(raw.category, None);
        assert_eq!(raw.lawyers, Some(vec!["Mr. Shah".to_string()]));

        let r = normalize_record(raw, 1, 0, &RecordIdSequence::new());
        assert_eq!(r.title, UNKNOWN_TITLE);
        assert_eq!(r.bench.as_deref(), Some("Bench-II"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn lawyers_drop_non_text_entries() {
        let raw = RawRecord::from_value(&json!({"lawyers": ["A", null, "", {"x": 1}, "B"]})).unwrap();
        assert_eq!(raw.lawyers, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn items_keep_order_and_skip_empty_values() {
        let ids = RecordIdSequence::new();
        let items = vec![
            json!({"caseNumber": "A"}),
            json!(null),
            json!(true),
            json!([]),
            json!({"caseNumber": "B"}),
        ];
        let records = normalize_items(&items, 2, &ids);
        let numbers: Vec<&str> = records.iter().map(|r| r.case_number.as_str()).collect();
        assert_eq!(numbers, vec!["A", "B"]);
        assert!(records[1].id.starts_with("p2_c1_"));
    }

    #[test]
    fn text_items_become_titled_records() {
        let ids = RecordIdSequence::new();
        let items = vec![json!("C.P. 12/2024 Ali v. State"), json!({"caseNumber": "B"})];
        let records = normalize_items(&items, 1, &ids);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "C.P. 12/2024 Ali v. State");
        assert_eq!(records[0].case_number, UNKNOWN_CASE_NUMBER);
        assert_eq!(records[0].summary, NO_SUMMARY);
        assert_eq!(records[0].category, CaseCategory::Other);
        assert_eq!(records[1].case_number, "B");
    }

    #[test]
    fn ids_are_unique_across_clones() {
        let ids = RecordIdSequence::new();
        let other = ids.clone();
        let a = ids.next_id(1, 0);
        let b = other.next_id(1, 0);
        assert_ne!(a, b);
        assert_eq!(a, "p1_c0_0");
        assert_eq!(b, "p1_c0_1");
    }

    #[test]
    fn base36_suffix() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
