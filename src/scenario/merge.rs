use super::MergeRequest;
use crate::model::election::{District, Pact};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A district that cannot take part in the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDistrict {
    pub id: String,
    pub label: String,
    /// Requested codes absent from the district.
    pub missing: Vec<String>,
}

/// The alternative graph: every district holding both pacts, rebuilt with
/// the two fused into one.
#[derive(Debug, Clone, Serialize)]
pub struct MergedScenario {
    pub request: MergeRequest,
    pub districts: Vec<District>,
    pub skipped: Vec<SkippedDistrict>,
}

impl MergedScenario {
    pub fn district(&self, id: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }

    /// Requested codes that no district contains at all.
    pub fn never_seen(&self) -> Vec<String> {
        self.request
            .codes()
            .iter()
            .filter(|code| {
                self.districts.is_empty()
                    && self
                        .skipped
                        .iter()
                        .all(|s| s.missing.iter().any(|m| m == *code))
            })
            .map(|code| code.to_string())
            .collect()
    }
}

pub fn build_merged_scenario(districts: &[District], request: &MergeRequest) -> MergedScenario {
    let mut merged = Vec::new();
    let mut skipped = Vec::new();

    for district in districts {
        match merge_district(district, request) {
            Ok(alternative) => merged.push(alternative),
            Err(missing) => {
                debug!(district = %district.id, ?missing, "district skipped for merge");
                skipped.push(SkippedDistrict {
                    id: district.id.clone(),
                    label: district.label.clone(),
                    missing,
                });
            }
        }
    }

    MergedScenario {
        request: request.clone(),
        districts: merged,
        skipped,
    }
}

/// Rebuilds `district` with both requested pacts fused into one, or returns
/// the codes it lacks.
///
/// The fused pact sits where the first of the two stood and carries A's
/// lists followed by B's. Lists and candidacies are shared with the
/// baseline, never copied.
pub fn merge_district(
    district: &District,
    request: &MergeRequest,
) -> std::result::Result<District, Vec<String>> {
    let missing: Vec<String> = request
        .codes()
        .iter()
        .filter(|code| district.pact(code).is_none())
        .map(|code| code.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let (a, b) = match (district.pact(&request.pact_a), district.pact(&request.pact_b)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(request.codes().iter().map(|c| c.to_string()).collect()),
    };

    let fused = Pact {
        code: request.label(),
        name: format!("{} + {}", a.name, b.name),
        lists: a.lists.iter().chain(b.lists.iter()).map(Arc::clone).collect(),
        members: vec![a.code.clone(), b.code.clone()],
        declared_votes: None,
        declared_seats: None,
    };

    let mut pacts = Vec::with_capacity(district.pacts.len() - 1);
    let mut fused = Some(fused);
    for pact in &district.pacts {
        if request.involves(&pact.code) {
            if let Some(fused) = fused.take() {
                pacts.push(fused);
            }
        } else {
            pacts.push(pact.clone());
        }
    }

    Ok(District {
        id: district.id.clone(),
        label: district.label.clone(),
        seats: district.seats,
        pacts,
        source: district.source.clone(),
    })
}
