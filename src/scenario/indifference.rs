//! How many votes a merged pact could shed before the merger stops paying off.

use crate::model::election::{District, Votes};
use crate::tabulator::{self, allocate_bounded, Contender};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndifferenceMargin {
    /// Smallest vote loss that brings the merged pact back to its baseline seats.
    pub votes: Votes,
    /// `votes` as a fraction of the merged pact's total.
    pub share: f64,
}

impl IndifferenceMargin {
    pub fn zero() -> IndifferenceMargin {
        IndifferenceMargin {
            votes: 0,
            share: 0.0,
        }
    }
}

/// Margin for pact `merged_code` of the alternative `district`, given the
/// seats its members won together in the baseline.
///
/// Lost votes simply vanish; every other pact keeps its total. Seats are
/// monotone in votes under d'Hondt, so the threshold is found by bisection.
/// Pact seats here are plain d'Hondt, uncapped by candidacies. When no loss
/// brings the pact down far enough (every other pact has zero votes), the
/// whole vote total is reported.
pub fn indifference_margin(
    district: &District,
    merged_code: &str,
    baseline_seats: u32,
) -> tabulator::Result<IndifferenceMargin> {
    let idx = match district.pacts.iter().position(|p| p.matches(merged_code)) {
        Some(idx) => idx,
        None => return Ok(IndifferenceMargin::zero()),
    };

    let contenders = tabulator::pact_contenders(district);
    let merged_votes = contenders[idx].votes;

    let seats_after_loss = |loss: Votes| -> tabulator::Result<u32> {
        let mut trial: Vec<Contender<usize>> = contenders.clone();
        trial[idx].votes = merged_votes - loss;
        Ok(allocate_bounded(&trial, district.seats)?.get(&idx))
    };

    if seats_after_loss(0)? <= baseline_seats {
        return Ok(IndifferenceMargin::zero());
    }
    if seats_after_loss(merged_votes)? > baseline_seats {
        return Ok(IndifferenceMargin {
            votes: merged_votes,
            share: 1.0,
        });
    }

    // Invariant: seats(low) > baseline, seats(high) <= baseline.
    let (mut low, mut high) = (0, merged_votes);
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if seats_after_loss(mid)? > baseline_seats {
            low = mid;
        } else {
            high = mid;
        }
    }

    Ok(IndifferenceMargin {
        votes: high,
        share: high as f64 / merged_votes as f64,
    })
}
