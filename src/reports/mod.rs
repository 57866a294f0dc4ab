use crate::scenario::compare::{DistrictOutcome, SummaryRow};
use crate::scenario::merge::SkippedDistrict;
use crate::scenario::MergeRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

pub mod console;
pub mod generator;

/// Everything one `simulate` run produced, as written to the JSON report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub generated_at: DateTime<Utc>,
    pub merge: MergeRequest,
    pub merged_code: String,
    pub inputs: Vec<InputFile>,
    pub districts: Vec<DistrictOutcome>,
    pub unaffected: Vec<SkippedDistrict>,
    pub summary: Vec<SummaryRow>,
    pub load_failures: Vec<LoadFailure>,
}

impl SimulationReport {
    pub fn changed_count(&self) -> usize {
        self.districts
            .iter()
            .filter(|o| matches!(o, DistrictOutcome::Compared(diff) if diff.changed))
            .count()
    }
}

/// Workbook a district was read from.
#[derive(Debug, Serialize)]
pub struct InputFile {
    pub district: String,
    pub path: PathBuf,
    pub sha1: String,
}

#[derive(Debug, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Presentation switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Also print districts the merge leaves unchanged.
    pub print_all: bool,
}
