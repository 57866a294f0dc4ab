use super::{AllocationError, Result};
use crate::model::election::{Candidacy, List};
use itertools::Itertools;
use std::sync::Arc;

/// Candidacies by descending votes; equal votes keep ballot order.
pub fn rank_candidacies(candidacies: &[Arc<Candidacy>]) -> Vec<Arc<Candidacy>> {
    candidacies
        .iter()
        .cloned()
        .sorted_by(|a, b| b.votes.cmp(&a.votes))
        .collect()
}

/// The `seats` best-voted candidacies of `list`.
pub fn elect(list: &List, seats: u32) -> Result<Vec<Arc<Candidacy>>> {
    let seats = seats as usize;
    if seats > list.candidacies.len() {
        return Err(AllocationError::malformed(
            &list.id.to_string(),
            format!(
                "won {} seats but fielded only {} candidacies",
                seats,
                list.candidacies.len()
            ),
        ));
    }

    Ok(rank_candidacies(&list.candidacies)
        .into_iter()
        .take(seats)
        .collect())
}
