use crate::model::election::{Candidacy, ListId, Votes};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Seats won by a list, with its elected candidacies in rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListAllocation {
    pub id: ListId,
    pub name: String,
    pub votes: Votes,
    pub seats: u32,
    pub elected: Vec<Arc<Candidacy>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PactAllocation {
    pub code: String,
    pub name: String,
    pub members: Vec<String>,
    pub votes: Votes,
    pub seats: u32,
    pub lists: Vec<ListAllocation>,
}

impl PactAllocation {
    /// Seats won through lists registered under the original pact `member`.
    pub fn seats_for_member(&self, member: &str) -> u32 {
        self.lists
            .iter()
            .filter(|l| l.id.pact.eq_ignore_ascii_case(member))
            .map(|l| l.seats)
            .sum()
    }
}

/// Full nested result for one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictAllocation {
    pub district: String,
    pub seats: u32,
    pub pacts: Vec<PactAllocation>,
}

impl DistrictAllocation {
    pub fn pact(&self, code: &str) -> Option<&PactAllocation> {
        self.pacts.iter().find(|p| p.code.eq_ignore_ascii_case(code))
    }

    pub fn seats_for(&self, code: &str) -> u32 {
        self.pact(code).map(|p| p.seats).unwrap_or(0)
    }

    /// Every elected candidacy, tagged with its list.
    pub fn elected(&self) -> impl Iterator<Item = ElectedCandidacy> + '_ {
        self.pacts.iter().flat_map(|pact| {
            pact.lists.iter().flat_map(move |list| {
                list.elected.iter().map(move |candidacy| ElectedCandidacy {
                    pact: pact.code.clone(),
                    list: list.id.clone(),
                    candidacy: Arc::clone(candidacy),
                })
            })
        })
    }

    pub fn elected_keys(&self) -> BTreeSet<CandidacyKey> {
        self.elected().map(|e| e.key()).collect()
    }
}

/// An elected candidacy as reported, with the pact that won the seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectedCandidacy {
    pub pact: String,
    pub list: ListId,
    pub candidacy: Arc<Candidacy>,
}

impl ElectedCandidacy {
    pub fn key(&self) -> CandidacyKey {
        CandidacyKey {
            list: self.list.clone(),
            number: self.candidacy.number,
            name: self.candidacy.name.clone(),
        }
    }
}

/// Identity of a candidacy across scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidacyKey {
    pub list: ListId,
    pub number: u32,
    pub name: String,
}
