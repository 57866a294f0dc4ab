use super::indifference::{indifference_margin, IndifferenceMargin};
use super::merge::{MergedScenario, SkippedDistrict};
use super::{DistrictFilter, MergeRequest, ScenarioError};
use crate::model::allocation::{DistrictAllocation, ElectedCandidacy};
use crate::model::election::{District, Votes};
use crate::tabulator::{self, apportion_district, apportion_pacts, AllocationError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Pact as listed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PactSummary {
    pub code: String,
    pub name: String,
    pub votes: Votes,
    pub candidacies: usize,
    pub declared_seats: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// A pact outside the merge, compared directly.
    Unrelated,
    /// One of the merged pacts; scenario seats are those its lists won
    /// inside the fused pact.
    Member,
    /// Both merged pacts taken together.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PactDelta {
    pub code: String,
    pub kind: DeltaKind,
    pub baseline: u32,
    pub alternative: u32,
}

impl PactDelta {
    pub fn delta(&self) -> i64 {
        i64::from(self.alternative) - i64::from(self.baseline)
    }
}

/// Baseline against merged scenario for one district.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioDiff {
    pub district: String,
    pub label: String,
    pub seats: u32,
    pub pacts: Vec<PactSummary>,
    pub merged_code: String,
    pub baseline: DistrictAllocation,
    pub alternative: DistrictAllocation,
    /// Quotient that won the last pact-level seat in each scenario.
    pub baseline_cutoff: Option<f64>,
    pub alternative_cutoff: Option<f64>,
    pub deltas: Vec<PactDelta>,
    /// Elected only in the scenario.
    pub gained: Vec<ElectedCandidacy>,
    /// Elected only in the baseline.
    pub lost: Vec<ElectedCandidacy>,
    pub indifference: IndifferenceMargin,
    pub changed: bool,
}

impl ScenarioDiff {
    pub fn combined(&self) -> Option<&PactDelta> {
        self.deltas.iter().find(|d| d.kind == DeltaKind::Combined)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictFailure {
    pub district: String,
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DistrictOutcome {
    Compared(ScenarioDiff),
    Failed(DistrictFailure),
}

/// Seats per pact code summed over every compared district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub code: String,
    pub official: u32,
    pub scenario: u32,
}

impl SummaryRow {
    pub fn delta(&self) -> i64 {
        i64::from(self.scenario) - i64::from(self.official)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub request: MergeRequest,
    pub outcomes: Vec<DistrictOutcome>,
    /// Selected districts that lack one of the pacts.
    pub unaffected: Vec<SkippedDistrict>,
    /// Requested codes found in no district at all.
    pub never_seen: Vec<String>,
    /// Districts holding both pacts that the filter left out.
    pub unselected: usize,
}

impl Comparison {
    pub fn diffs(&self) -> impl Iterator<Item = &ScenarioDiff> {
        self.outcomes.iter().filter_map(|o| match o {
            DistrictOutcome::Compared(diff) => Some(diff),
            DistrictOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &DistrictFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            DistrictOutcome::Failed(failure) => Some(failure),
            DistrictOutcome::Compared(_) => None,
        })
    }

    /// Fails when the merge applied nowhere, so callers can say so instead
    /// of printing an empty report.
    pub fn ensure_comparable(&self) -> super::Result<()> {
        if !self.outcomes.is_empty() {
            return Ok(());
        }
        if self.unselected > 0 {
            return Err(ScenarioError::NotSelected {
                requested: self.request.label(),
                unselected: self.unselected,
            });
        }
        let missing = if self.never_seen.is_empty() {
            "none individually, but never together".to_string()
        } else {
            self.never_seen.join(", ")
        };
        Err(ScenarioError::UnknownPact {
            requested: self.request.label(),
            missing,
        })
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        let mut official: BTreeMap<String, u32> = BTreeMap::new();
        let mut scenario: BTreeMap<String, u32> = BTreeMap::new();

        for diff in self.diffs() {
            for pact in &diff.baseline.pacts {
                *official.entry(pact.code.clone()).or_insert(0) += pact.seats;
            }
            for pact in &diff.alternative.pacts {
                *scenario.entry(pact.code.clone()).or_insert(0) += pact.seats;
            }
        }

        let mut codes: Vec<String> = official.keys().chain(scenario.keys()).cloned().collect();
        codes.sort();
        codes.dedup();

        codes
            .into_iter()
            .map(|code| SummaryRow {
                official: official.get(&code).copied().unwrap_or(0),
                scenario: scenario.get(&code).copied().unwrap_or(0),
                code,
            })
            .collect()
    }
}

/// Apportions every selected district under both scenarios and diffs them.
///
/// A district with malformed data is recorded as failed and the others go
/// on; a broken seat invariant aborts the whole comparison.
pub fn compare(
    baseline: &[District],
    scenario: &MergedScenario,
    filter: &DistrictFilter,
) -> tabulator::Result<Comparison> {
    let mut pairs = Vec::new();
    let mut unaffected = Vec::new();

    for district in baseline.iter().filter(|d| filter.accepts(&d.id)) {
        match scenario.district(&district.id) {
            Some(alternative) => pairs.push((district, alternative)),
            None => {
                if let Some(skipped) = scenario.skipped.iter().find(|s| s.id == district.id) {
                    unaffected.push(skipped.clone());
                }
            }
        }
    }

    let outcomes = pairs
        .par_iter()
        .map(|(district, alternative)| {
            match diff_district(district, alternative, &scenario.request) {
                Ok(diff) => Ok(DistrictOutcome::Compared(diff)),
                Err(e) if !e.is_fatal() => {
                    warn!(district = %district.id, error = %e, "district could not be compared");
                    Ok(DistrictOutcome::Failed(DistrictFailure {
                        district: district.id.clone(),
                        label: district.label.clone(),
                        error: e.to_string(),
                    }))
                }
                Err(e) => Err(e),
            }
        })
        .collect::<tabulator::Result<Vec<_>>>()?;

    Ok(Comparison {
        request: scenario.request.clone(),
        outcomes,
        unaffected,
        never_seen: scenario.never_seen(),
        unselected: scenario
            .districts
            .iter()
            .filter(|d| !filter.accepts(&d.id))
            .count(),
    })
}

/// Diff of one district against its merged counterpart.
pub fn diff_district(
    baseline: &District,
    alternative: &District,
    request: &MergeRequest,
) -> Result<ScenarioDiff, AllocationError> {
    let started = Instant::now();
    let merged_code = request.label();

    let base = apportion_district(baseline)?;
    let alt = apportion_district(alternative)?;

    let mut deltas = Vec::with_capacity(baseline.pacts.len() + 1);
    let mut combined_baseline = 0;
    for pact in &baseline.pacts {
        let seats = base.seats_for(&pact.code);
        if request.involves(&pact.code) {
            combined_baseline += seats;
            deltas.push(PactDelta {
                code: pact.code.clone(),
                kind: DeltaKind::Member,
                baseline: seats,
                alternative: alt
                    .pact(&merged_code)
                    .map(|p| p.seats_for_member(&pact.code))
                    .unwrap_or(0),
            });
        } else {
            deltas.push(PactDelta {
                code: pact.code.clone(),
                kind: DeltaKind::Unrelated,
                baseline: seats,
                alternative: alt.seats_for(&pact.code),
            });
        }
    }
    deltas.push(PactDelta {
        code: merged_code.clone(),
        kind: DeltaKind::Combined,
        baseline: combined_baseline,
        alternative: alt.seats_for(&merged_code),
    });

    let base_keys = base.elected_keys();
    let alt_keys = alt.elected_keys();
    let gained: Vec<ElectedCandidacy> = alt
        .elected()
        .filter(|e| !base_keys.contains(&e.key()))
        .collect();
    let lost: Vec<ElectedCandidacy> = base
        .elected()
        .filter(|e| !alt_keys.contains(&e.key()))
        .collect();

    let changed = deltas.iter().any(|d| d.delta() != 0) || !gained.is_empty() || !lost.is_empty();
    let indifference = indifference_margin(alternative, &merged_code, combined_baseline)?;
    let baseline_cutoff = apportion_pacts(baseline)?.cutoff_quotient();
    let alternative_cutoff = apportion_pacts(alternative)?.cutoff_quotient();

    debug!(
        district = %baseline.id,
        changed,
        elapsed_us = started.elapsed().as_micros() as u64,
        "district compared"
    );

    Ok(ScenarioDiff {
        district: baseline.id.clone(),
        label: baseline.label.clone(),
        seats: baseline.seats,
        pacts: baseline
            .pacts
            .iter()
            .map(|p| PactSummary {
                code: p.code.clone(),
                name: p.name.clone(),
                votes: p.votes(),
                candidacies: p.candidacy_count(),
                declared_seats: p.declared_seats,
            })
            .collect(),
        merged_code,
        baseline: base,
        alternative: alt,
        baseline_cutoff,
        alternative_cutoff,
        deltas,
        gained,
        lost,
        indifference,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::election::{Candidacy, List, ListId, Pact};
    use crate::scenario::build_merged_scenario;

    fn pact(code: &str, votes: &[u64]) -> Pact {
        let candidacies = votes
            .iter()
            .enumerate()
            .map(|(i, v)| Candidacy::new(i as u32 + 1, &format!("{}{}", code, i + 1), None, *v))
            .collect();
        Pact::new(code, code, vec![List::new(ListId::new(code, code), code, candidacies)])
    }

    fn districts() -> Vec<District> {
        vec![
            District::new(
                "1",
                "Distrito 1",
                3,
                vec![pact("C", &[60, 40]), pact("J", &[50, 30]), pact("K", &[30])],
            ),
            District::new("2", "Distrito 2", 2, vec![pact("C", &[10, 5]), pact("K", &[20, 1])]),
        ]
    }

    #[test]
    fn test_merge_comparison() {
        let districts = districts();
        let request = MergeRequest::new("C", "J").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        let comparison = compare(&districts, &scenario, &DistrictFilter::all()).unwrap();

        assert_eq!(comparison.outcomes.len(), 1);
        assert_eq!(comparison.unaffected.len(), 1);
        assert_eq!(comparison.unaffected[0].id, "2");

        let diff = comparison.diffs().next().unwrap();
        let combined = diff.combined().unwrap();
        assert_eq!(combined.baseline, 3);
        assert_eq!(combined.alternative, 3);

        let fused = diff.alternative.pact("C + J").unwrap();
        let list_seats: u32 = fused.lists.iter().map(|l| l.seats).sum();
        assert_eq!(list_seats, fused.seats);
        assert!(fused.seats >= 2);
        assert!(comparison.ensure_comparable().is_ok());
    }

    fn compare_one(district: District) -> Comparison {
        let districts = vec![district];
        let request = MergeRequest::new("C", "J").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        compare(&districts, &scenario, &DistrictFilter::all()).unwrap()
    }

    #[test]
    fn test_unchanged_district() {
        let comparison = compare_one(District::new(
            "3",
            "Distrito 3",
            3,
            vec![pact("C", &[90, 10]), pact("J", &[41, 39]), pact("K", &[70])],
        ));
        let diff = comparison.diffs().next().unwrap();

        // Baseline: C 100, J 80, K 70 each take one seat.
        assert_eq!(diff.baseline.seats_for("K"), 1);
        // Fused 180 vs K 70: 180, 90, 70.
        assert_eq!(diff.alternative.seats_for("C + J"), 2);
        assert!(!diff.changed);
        assert!(diff.gained.is_empty() && diff.lost.is_empty());
    }

    #[test]
    fn test_summary_counts_per_code() {
        let comparison = compare_one(District::new(
            "4",
            "Distrito 4",
            3,
            vec![pact("C", &[60, 40]), pact("J", &[45, 40]), pact("K", &[90, 5])],
        ));
        let diff = comparison.diffs().next().unwrap();
        assert_eq!(diff.combined().unwrap().delta(), 0);

        let summary = comparison.summary();
        let k = summary.iter().find(|r| r.code == "K").unwrap();
        assert_eq!((k.official, k.scenario), (1, 1));
        let fused = summary.iter().find(|r| r.code == "C + J").unwrap();
        assert_eq!((fused.official, fused.scenario), (0, 2));
        let c = summary.iter().find(|r| r.code == "C").unwrap();
        assert_eq!((c.official, c.scenario), (1, 0));
    }

    #[test]
    fn test_tied_lists_fall_back_to_input_order() {
        let comparison = compare_one(District::new(
            "5",
            "Distrito 5",
            3,
            vec![pact("C", &[50, 10]), pact("J", &[55, 5]), pact("K", &[70, 60])],
        ));
        let diff = comparison.diffs().next().unwrap();

        // K 130, K 65, then C and J tie at 60; C is listed first.
        assert_eq!(diff.baseline.seats_for("K"), 2);
        assert_eq!(diff.baseline.seats_for("C"), 1);
        assert_eq!(diff.combined().unwrap().alternative, 1);

        let fused = diff.alternative.pact("C + J").unwrap();
        assert_eq!(fused.seats_for_member("C"), 1);
        assert!(!diff.changed);
        assert_eq!(diff.indifference.votes, 0);
    }

    #[test]
    fn test_merge_wins_a_seat() {
        let comparison = compare_one(District::new(
            "6",
            "Distrito 6",
            3,
            vec![pact("K", &[50, 30, 20]), pact("C", &[20, 10]), pact("J", &[25, 5])],
        ));
        let diff = comparison.diffs().next().unwrap();

        // Apart, C and J (30 each) lose every seat to K's 100, 50, 33.3.
        assert_eq!(diff.baseline.seats_for("K"), 3);
        let combined = diff.combined().unwrap();
        assert_eq!((combined.baseline, combined.alternative), (0, 1));
        assert!(diff.changed);

        let gained: Vec<&str> = diff.gained.iter().map(|e| e.candidacy.name.as_str()).collect();
        let lost: Vec<&str> = diff.lost.iter().map(|e| e.candidacy.name.as_str()).collect();
        assert_eq!(gained, vec!["C1"]);
        assert_eq!(lost, vec!["K3"]);

        let member_c = diff.deltas.iter().find(|d| d.code == "C").unwrap();
        assert_eq!(member_c.kind, DeltaKind::Member);
        assert_eq!(member_c.delta(), 1);

        // At 33 votes the fused pact falls below K's third quotient.
        assert_eq!(diff.indifference.votes, 27);
        // Baseline last seat: K's 100 / 3; scenario: K's 100 / 2.
        assert_eq!(diff.alternative_cutoff, Some(50.0));
    }

    #[test]
    fn test_filter_and_unknown_pact() {
        let districts = districts();
        let request = MergeRequest::new("C", "Z").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        let comparison = compare(&districts, &scenario, &DistrictFilter::only(vec!["1"])).unwrap();

        assert!(comparison.outcomes.is_empty());
        assert_eq!(comparison.unaffected.len(), 1);
        assert!(matches!(
            comparison.ensure_comparable(),
            Err(ScenarioError::UnknownPact { .. })
        ));
    }

    #[test]
    fn test_filter_excluding_every_merged_district() {
        let districts = districts();
        let request = MergeRequest::new("C", "J").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        // District 2 lacks J; district 1 holds both but is not selected.
        let comparison = compare(&districts, &scenario, &DistrictFilter::only(vec!["2"])).unwrap();

        assert!(comparison.outcomes.is_empty());
        assert_eq!(comparison.unselected, 1);
        match comparison.ensure_comparable() {
            Err(ScenarioError::NotSelected { requested, unselected }) => {
                assert_eq!(requested, "C + J");
                assert_eq!(unselected, 1);
            }
            other => panic!("expected NotSelected, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_district_does_not_stop_others() {
        let districts = vec![
            District::new("1", "Distrito 1", 2, vec![pact("C", &[60, 40]), pact("J", &[50])]),
            // Three seats, two candidacies in total.
            District::new("2", "Distrito 2", 3, vec![pact("C", &[10]), pact("J", &[5])]),
        ];
        let request = MergeRequest::new("C", "J").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        let comparison = compare(&districts, &scenario, &DistrictFilter::all()).unwrap();

        assert_eq!(comparison.diffs().count(), 1);
        let failure = comparison.failures().next().unwrap();
        assert_eq!(failure.district, "2");
    }
}
