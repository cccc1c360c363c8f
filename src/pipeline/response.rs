//! Response cleanup: turn raw LLM output into a list of JSON items.
//!
//! Even when asked for a bare JSON array, models regularly:
//!
//! - wrap the array in ` ```json ... ``` ` fences,
//! - put a sentence of commentary before or after it,
//! - wrap it in an object such as `{"cases": [...]}`,
//! - leak a BOM or zero-width characters into the text.
//!
//! Each quirk gets its own small rule; [`parse_items`] applies them in order.
//! Fences go first so the bracket scan never sees the fence backticks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Extract the array items from a model response.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Strip invisible Unicode
/// 3. Parse as JSON; on failure retry on each `[ ... ]` slice in turn
/// 4. Accept a top-level array, a wrapper object around one, or a single
///    case object
///
/// An empty or whitespace-only response counts as "no cases".
pub fn parse_items(raw: &str) -> Result<Vec<Value>, String> {
    let s = strip_json_fences(raw);
    let s = remove_invisible_chars(&s);
    let s = s.trim();

    if s.is_empty() {
        return Ok(Vec::new());
    }

    let value = match serde_json::from_str::<Value>(s) {
        Ok(v) => v,
        Err(first_err) => embedded_array(s).ok_or_else(|| format!("not JSON: {first_err}"))?,
    };

    unwrap_items(value)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```\s*$").unwrap());

fn strip_json_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Locate the array inside surrounding commentary ──────────────────

/// Try every `[` as the array start, up to the last `]`, so brackets in
/// leading commentary ("found [2] cases:") are skipped.
fn embedded_array(input: &str) -> Option<Value> {
    let end = input.rfind(']')?;
    input[..end]
        .match_indices('[')
        .find_map(|(start, _)| serde_json::from_str::<Value>(&input[start..=end]).ok())
}

// ── Rule 4: Unwrap the item list ─────────────────────────────────────────────

/// Keys a model uses when it wraps the case list in an object.
const WRAPPER_KEYS: &[&str] = &["cases", "records", "items", "results", "data"];

/// Keys that mark an object as a case itself rather than a wrapper.
const RECORD_KEYS: &[&str] = &["caseNumber", "title", "category", "summary"];

fn unwrap_items(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) if RECORD_KEYS.iter().any(|k| map.contains_key(*k)) => {
            Ok(vec![Value::Object(map)])
        }
        Value::Object(mut map) => {
            if let Some(key) = WRAPPER_KEYS.iter().find(|k| map.get(**k).is_some_and(Value::is_array)) {
                if let Some(Value::Array(items)) = map.remove(*key) {
                    return Ok(items);
                }
            }
            match map.len() {
                1 => match map.into_iter().next() {
                    Some((_, Value::Array(items))) => Ok(items),
                    _ => Err("expected a JSON array, got an object without one".into()),
                },
                0 => Ok(Vec::new()),
                _ => Err("expected a JSON array, got an object with no case list".into()),
            }
        }
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a JSON array, got {}", type_name(&other))),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_array() {
        let items = parse_items(r#"[{"caseNumber":"1"},{"caseNumber":"2"}]"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn fenced_array() {
        let items = parse_items("```json\n[{\"title\":\"A v. B\"}]\n```").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn fence_without_language() {
        let items = parse_items("```\n[]\n```").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn commentary_around_array() {
        let raw = "Here are the cases:\n[{\"title\":\"A v. B\"}]\nLet me know if you need more.";
        assert_eq!(parse_items(raw).unwrap().len(), 1);
    }

    #[test]
    fn object_wrapping_one_array() {
        let items = parse_items(r#"{"cases":[{"title":"x"},{"title":"y"}]}"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn object_wrapping_one_array_under_any_single_key() {
        let items = parse_items(r#"{"hearings":[{"title":"x"}]}"#).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn single_case_object_is_one_item() {
        let raw = r#"{"caseNumber":"C.P. 1/2024","title":"A v. B","category":"Civil",
                     "lawyers":[{"name":"Mr. X"},{"name":"Mr. Y"}]}"#;
        let items = parse_items(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["caseNumber"], "C.P. 1/2024");
    }

    #[test]
    fn wrapper_key_wins_over_other_arrays() {
        let raw = r#"{"cases":[{"title":"x"}],"warnings":["page is faint"]}"#;
        let items = parse_items(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "x");
    }

    #[test]
    fn object_without_a_case_list_is_an_error() {
        assert!(parse_items(r#"{"note":"nothing", "pages":[1], "lines":[2]}"#).is_err());
        assert!(parse_items(r#"{"note":"nothing"}"#).is_err());
    }

    #[test]
    fn brackets_in_commentary_before_the_array() {
        let raw = "Cases found [page 1]:\n[{\"caseNumber\":\"C.P. 3/2024\"}]";
        let items = parse_items(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["caseNumber"], "C.P. 3/2024");
    }

    #[test]
    fn empty_response_is_no_cases() {
        assert!(parse_items("  \n").unwrap().is_empty());
        assert!(parse_items("null").unwrap().is_empty());
    }

    #[test]
    fn bom_is_ignored() {
        assert_eq!(parse_items("\u{FEFF}[{}]").unwrap().len(), 1);
    }

    #[test]
    fn garbage_is_an_error() {
        let err = parse_items("I could not find any cases, sorry.").unwrap_err();
        assert!(err.contains("not JSON"), "got: {err}");
    }

    #[test]
    fn scalar_is_an_error() {
        let err = parse_items("42").unwrap_err();
        assert!(err.contains("a number"), "got: {err}");
    }
}
