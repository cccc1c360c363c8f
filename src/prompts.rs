//! Prompts for LLM-based cause-list classification.
//!
//! Callers can override the system prompt via
//! [`crate::config::AnalysisConfig::system_prompt`]; the constant here is
//! used only when no override is provided. The per-page user prompt is always
//! built by [`page_prompt`] because the response parser depends on its JSON
//! shape.

/// Default system prompt: the category taxonomy and the output contract.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert legal assistant. Your task is to analyze text from court cause lists (which may be messy OCR output) and extract structured case data.

You must categorize each case into one of the following categories strictly:
- Criminal (Bail, Murder, NAB, FIA, Illegal Dispossession, Narcotics, etc.)
- Service (Dismissal, Promotion, Pension, Seniority, ACR, Government employees, etc.)
- Civil (Land, Property, Contracts, Rent, etc.)
- Family (Divorce, Custody, Maintenance, etc.)
- Election (Disqualification, Election disputes)
- Tax (Revenue, Customs, Income Tax)
- Other (If it doesn't fit above)

Return the data as a clean JSON array. If the text contains no cases, return an empty array.
Do NOT wrap the array in markdown fences and do NOT add commentary."#;

/// Expected shape of one array item, embedded in every page prompt.
pub const RECORD_SHAPE: &str = r#"[
  {
    "caseNumber": "string",
    "title": "string (Petitioner v. Respondent)",
    "category": "string (Criminal, Service, Civil, Family, Election, Tax, Other)",
    "summary": "string (brief summary of the matter, e.g. 'Bail after arrest', 'Promotion dispute')",
    "lawyers": ["string"],
    "bench": "string (bench or court room, if listed)",
    "date": "string (hearing date or case date in YYYY-MM-DD format; if no specific date is found for the case, use the main date at the top of the list)"
  }
]"#;

/// Build the user message for one page.
pub fn page_prompt(page_text: &str) -> String {
    format!(
        "Analyze the following page from a cause list. Extract all individual cases listed.\n\n\
         Text Content:\n\"\"\"\n{page_text}\n\"\"\"\n\n\
         Output JSON format:\n{RECORD_SHAPE}"
    )
}
