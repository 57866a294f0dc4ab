use super::{InputFile, LoadFailure, SimulationReport};
use crate::formats::FormatError;
use crate::model::election::District;
use crate::scenario::Comparison;
use chrono::Utc;
use std::path::PathBuf;

/// Assemble the report for a finished comparison.
pub fn generate_report(
    comparison: &Comparison,
    districts: &[District],
    load_failures: &[(PathBuf, FormatError)],
) -> SimulationReport {
    let inputs = districts
        .iter()
        .filter_map(|d| {
            d.source.as_ref().map(|source| InputFile {
                district: d.id.clone(),
                path: source.path.clone(),
                sha1: source.sha1.clone(),
            })
        })
        .collect();

    let load_failures = load_failures
        .iter()
        .map(|(path, error)| LoadFailure {
            path: path.clone(),
            error: error.to_string(),
        })
        .collect();

    SimulationReport {
        generated_at: Utc::now(),
        merge: comparison.request.clone(),
        merged_code: comparison.request.label(),
        inputs,
        districts: comparison.outcomes.clone(),
        unaffected: comparison.unaffected.clone(),
        summary: comparison.summary(),
        load_failures,
    }
}
