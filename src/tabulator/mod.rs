use crate::model::allocation::{DistrictAllocation, ListAllocation, PactAllocation};
use crate::model::election::{District, Pact};
use tracing::trace;

pub mod dhondt;
pub mod ranking;

pub use dhondt::{allocate, allocate_bounded, Apportionment, Contender};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Malformed input in {context}: {reason}")]
    MalformedInput { context: String, reason: String },
    #[error("Allocation invariant violated in {context}: awarded {awarded} of {expected} seats")]
    InvariantViolated {
        context: String,
        expected: u32,
        awarded: u32,
    },
}

impl AllocationError {
    pub fn malformed(context: &str, reason: String) -> AllocationError {
        AllocationError::MalformedInput {
            context: context.to_string(),
            reason,
        }
    }

    /// Invariant violations mean the engine itself is wrong; nothing after
    /// one can be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AllocationError::InvariantViolated { .. })
    }

    fn in_context(self, context: &str) -> AllocationError {
        match self {
            AllocationError::MalformedInput { reason, .. } => AllocationError::MalformedInput {
                context: context.to_string(),
                reason,
            },
            AllocationError::InvariantViolated {
                expected, awarded, ..
            } => AllocationError::InvariantViolated {
                context: context.to_string(),
                expected,
                awarded,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;

/// Seats per pact for the whole district by plain d'Hondt.
///
/// A pact winning more seats than it fielded candidacies makes the district
/// malformed; the surplus is not handed on.
pub fn apportion_pacts(district: &District) -> Result<Apportionment<usize>> {
    if district.seats == 0 {
        return Err(AllocationError::malformed(
            &district.id,
            "district has no seats to allocate".to_string(),
        ));
    }

    let per_pact = allocate_bounded(&pact_contenders(district), district.seats)
        .map_err(|e| e.in_context(&district.id))?;

    for (idx, seats) in per_pact.iter() {
        let pact = &district.pacts[*idx];
        let fielded = pact.candidacy_count();
        if *seats as usize > fielded {
            return Err(AllocationError::malformed(
                &district.id,
                format!(
                    "pact {} won {} seats but fielded only {} candidacies",
                    pact.code, seats, fielded
                ),
            ));
        }
    }

    Ok(per_pact)
}

/// Pacts of `district` as uncapped contenders keyed by position.
pub fn pact_contenders(district: &District) -> Vec<Contender<usize>> {
    district
        .pacts
        .iter()
        .enumerate()
        .map(|(idx, pact)| Contender::new(idx, pact.votes()))
        .collect()
}

/// Splits a pact's seats among its lists and elects their candidacies.
pub fn apportion_pact(pact: &Pact, seats: u32) -> Result<PactAllocation> {
    let contenders: Vec<Contender<usize>> = pact
        .lists
        .iter()
        .enumerate()
        .map(|(idx, list)| Contender::bounded(idx, list.votes(), list.candidacies.len() as u32))
        .collect();

    let per_list = allocate_bounded(&contenders, seats).map_err(|e| e.in_context(&pact.code))?;

    let mut lists = Vec::with_capacity(pact.lists.len());
    for (idx, list_seats) in per_list.into_vec() {
        let list = &pact.lists[idx];
        let elected = ranking::elect(list, list_seats)?;
        lists.push(ListAllocation {
            id: list.id.clone(),
            name: list.name.clone(),
            votes: list.votes(),
            seats: list_seats,
            elected,
        });
    }

    let allocation = PactAllocation {
        code: pact.code.clone(),
        name: pact.name.clone(),
        members: pact.members.clone(),
        votes: pact.votes(),
        seats,
        lists,
    };
    check_pact(&allocation)?;
    Ok(allocation)
}

/// Nested d'Hondt for one district: pacts, then lists, then candidacies.
pub fn apportion_district(district: &District) -> Result<DistrictAllocation> {
    let per_pact = apportion_pacts(district)?;
    trace!(
        district = %district.id,
        order = ?per_pact.award_order().collect::<Vec<_>>(),
        "seat award order"
    );

    let mut pacts = Vec::with_capacity(district.pacts.len());
    for (idx, seats) in per_pact.into_vec() {
        let pact = &district.pacts[idx];
        trace!(district = %district.id, pact = %pact.code, seats, "pact apportioned");
        pacts.push(apportion_pact(pact, seats)?);
    }

    let allocation = DistrictAllocation {
        district: district.id.clone(),
        seats: district.seats,
        pacts,
    };
    check_district(&allocation)?;
    Ok(allocation)
}

fn check_pact(allocation: &PactAllocation) -> Result<()> {
    let list_seats: u32 = allocation.lists.iter().map(|l| l.seats).sum();
    if list_seats != allocation.seats {
        return Err(AllocationError::InvariantViolated {
            context: allocation.code.clone(),
            expected: allocation.seats,
            awarded: list_seats,
        });
    }

    for list in &allocation.lists {
        if list.elected.len() != list.seats as usize {
            return Err(AllocationError::InvariantViolated {
                context: list.id.to_string(),
                expected: list.seats,
                awarded: list.elected.len() as u32,
            });
        }
    }

    Ok(())
}

fn check_district(allocation: &DistrictAllocation) -> Result<()> {
    let awarded: u32 = allocation.pacts.iter().map(|p| p.seats).sum();
    if awarded != allocation.seats {
        return Err(AllocationError::InvariantViolated {
            context: allocation.district.clone(),
            expected: allocation.seats,
            awarded,
        });
    }
    Ok(())
}
