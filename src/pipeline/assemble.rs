//! Final assembly of a run's records into an [`AnalysisResult`].

use crate::model::Record;
use crate::output::{AnalysisResult, AnalysisStats};
use chrono::Utc;

/// Package the merged records with the source name and a completion time.
///
/// Stats start at their defaults except `total_records`; the orchestrator
/// fills in the timings it measured.
pub fn assemble_result(source_name: &str, records: Vec<Record>) -> AnalysisResult {
    let stats = AnalysisStats {
        total_records: records.len(),
        ..Default::default()
    };
    AnalysisResult {
        source_name: source_name.to_string(),
        completed_at: Utc::now(),
        records,
        stats,
    }
}
