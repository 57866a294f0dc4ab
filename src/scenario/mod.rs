use serde::Serialize;
use std::collections::BTreeSet;

pub mod compare;
pub mod indifference;
pub mod merge;

pub use compare::{compare, Comparison, DistrictOutcome, ScenarioDiff};
pub use merge::{build_merged_scenario, MergedScenario};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("No district contains both pacts {requested}; never seen: {missing}")]
    UnknownPact { requested: String, missing: String },
    #[error("No selected district contains both pacts {requested}; {unselected} unselected districts do")]
    NotSelected { requested: String, unselected: usize },
    #[error("Invalid merge request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// The two pacts to merge, trimmed and ASCII upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRequest {
    pub pact_a: String,
    pub pact_b: String,
}

impl MergeRequest {
    pub fn new(pact_a: &str, pact_b: &str) -> Result<MergeRequest> {
        // ASCII-only, matching how pact codes are compared.
        let pact_a = pact_a.trim().to_ascii_uppercase();
        let pact_b = pact_b.trim().to_ascii_uppercase();

        if pact_a.is_empty() || pact_b.is_empty() {
            return Err(ScenarioError::InvalidRequest(
                "pact codes must not be empty".to_string(),
            ));
        }
        if pact_a == pact_b {
            return Err(ScenarioError::InvalidRequest(format!(
                "cannot merge pact {} with itself",
                pact_a
            )));
        }

        Ok(MergeRequest { pact_a, pact_b })
    }

    pub fn codes(&self) -> [&str; 2] {
        [self.pact_a.as_str(), self.pact_b.as_str()]
    }

    pub fn label(&self) -> String {
        format!("{} + {}", self.pact_a, self.pact_b)
    }

    pub fn involves(&self, code: &str) -> bool {
        self.codes().iter().any(|c| c.eq_ignore_ascii_case(code.trim()))
    }
}

/// Which districts to process; empty means all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistrictFilter {
    ids: BTreeSet<String>,
}

impl DistrictFilter {
    pub fn all() -> DistrictFilter {
        DistrictFilter::default()
    }

    pub fn only<I, S>(ids: I) -> DistrictFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DistrictFilter {
            ids: ids.into_iter().map(|id| id.into().trim().to_string()).collect(),
        }
    }

    pub fn accepts(&self, district_id: &str) -> bool {
        self.ids.is_empty() || self.ids.contains(district_id)
    }
}
