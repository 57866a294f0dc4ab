//! d'Hondt apportionment by iterative max-pick.
//!
//! Each round hands the next seat to the contender whose `votes / (won + 1)`
//! is largest. Equal quotients go to the contender with more raw votes and,
//! failing that, to the one listed first. Quotients are compared by integer
//! cross-multiplication so no rounding can decide a seat.
use super::{AllocationError, Result};
use crate::model::election::Votes;
use std::cmp::Ordering;
use std::fmt::Debug;
use tracing::debug;

/// One competitor in an apportionment round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contender<K> {
    pub key: K,
    pub votes: Votes,
    /// Most seats this contender can take, usually its number of candidacies.
    pub capacity: Option<u32>,
}

impl<K> Contender<K> {
    pub fn new(key: K, votes: Votes) -> Contender<K> {
        Contender {
            key,
            votes,
            capacity: None,
        }
    }

    pub fn bounded(key: K, votes: Votes, capacity: u32) -> Contender<K> {
        Contender {
            key,
            votes,
            capacity: Some(capacity),
        }
    }
}

/// Seats won per contender, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apportionment<K> {
    entries: Vec<(K, u32)>,
    /// (contender index, divisor, votes) of every seat in award order.
    awards: Vec<(usize, u32, Votes)>,
}

impl<K: PartialEq> Apportionment<K> {
    pub fn get(&self, key: &K) -> u32 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, seats)| *seats)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, u32)> {
        self.entries.iter()
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, seats)| seats).sum()
    }

    /// Quotient that won the last seat (the "cifra repartidora").
    pub fn cutoff_quotient(&self) -> Option<f64> {
        self.awards
            .last()
            .map(|(_, divisor, votes)| *votes as f64 / *divisor as f64)
    }

    /// Contender keys in the order their seats were awarded.
    pub fn award_order(&self) -> impl Iterator<Item = &K> {
        self.awards.iter().map(move |(idx, _, _)| &self.entries[*idx].0)
    }

    pub fn into_vec(self) -> Vec<(K, u32)> {
        self.entries
    }
}

/// Apportion `seats` among `entities` with no per-entity cap.
pub fn allocate<K: Clone + Debug>(entities: &[(K, Votes)], seats: u32) -> Result<Apportionment<K>> {
    let contenders: Vec<Contender<K>> = entities
        .iter()
        .map(|(key, votes)| Contender::new(key.clone(), *votes))
        .collect();
    allocate_bounded(&contenders, seats)
}

/// Apportion `seats` among `contenders`; a contender that reaches its
/// capacity stops competing and later seats go to the rest.
pub fn allocate_bounded<K: Clone + Debug>(
    contenders: &[Contender<K>],
    seats: u32,
) -> Result<Apportionment<K>> {
    if seats > 0 && contenders.is_empty() {
        return Err(AllocationError::malformed(
            "apportionment",
            format!("{} seats to allocate but no contenders", seats),
        ));
    }

    if contenders.iter().all(|c| c.capacity.is_some()) {
        let capacity: u64 = contenders
            .iter()
            .filter_map(|c| c.capacity)
            .map(u64::from)
            .sum();
        if seats > 0 && capacity < u64::from(seats) {
            return Err(AllocationError::malformed(
                "apportionment",
                format!(
                    "{} seats to allocate but contenders field only {} candidacies",
                    seats, capacity
                ),
            ));
        }
    }

    let mut won = vec![0u32; contenders.len()];
    let mut awards = Vec::with_capacity(seats as usize);

    for seat in 1..=seats {
        let mut best: Option<usize> = None;
        for (idx, contender) in contenders.iter().enumerate() {
            if contender.capacity.map_or(false, |cap| won[idx] >= cap) {
                continue;
            }
            best = match best {
                Some(current) if rank(contender, won[idx], &contenders[current], won[current]) != Ordering::Greater => {
                    Some(current)
                }
                _ => Some(idx),
            };
        }

        let winner = best.ok_or_else(|| {
            AllocationError::malformed(
                "apportionment",
                format!("no contender left for seat {}", seat),
            )
        })?;
        won[winner] += 1;
        awards.push((winner, won[winner], contenders[winner].votes));

        if contenders[winner].capacity == Some(won[winner]) {
            debug!(key = ?contenders[winner].key, seat, "contender reached its capacity");
        }
    }

    let awarded: u32 = won.iter().sum();
    if awarded != seats {
        return Err(AllocationError::InvariantViolated {
            context: "apportionment".to_string(),
            expected: seats,
            awarded,
        });
    }

    Ok(Apportionment {
        entries: contenders
            .iter()
            .zip(won)
            .map(|(c, seats)| (c.key.clone(), seats))
            .collect(),
        awards,
    })
}

/// Orders two contenders by their next quotient, then by raw votes.
fn rank<K>(a: &Contender<K>, won_a: u32, b: &Contender<K>, won_b: u32) -> Ordering {
    let lhs = u128::from(a.votes) * (u128::from(won_b) + 1);
    let rhs = u128::from(b.votes) * (u128::from(won_a) + 1);
    lhs.cmp(&rhs).then(a.votes.cmp(&b.votes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(entities: &[(&'static str, Votes)], seats: u32) -> Vec<(&'static str, u32)> {
        allocate(entities, seats).unwrap().into_vec()
    }

    #[test]
    fn test_three_seats() {
        let result = seats(&[("C", 100), ("J", 80), ("K", 30)], 3);
        assert_eq!(result, vec![("C", 2), ("J", 1), ("K", 0)]);
    }

    #[test]
    fn test_four_seats() {
        let result = seats(&[("C", 100), ("J", 80), ("K", 30)], 4);
        assert_eq!(result, vec![("C", 2), ("J", 2), ("K", 0)]);
    }

    #[test]
    fn test_exact_tie_goes_to_first_listed() {
        assert_eq!(seats(&[("A", 50), ("B", 50)], 1), vec![("A", 1), ("B", 0)]);
        assert_eq!(seats(&[("B", 50), ("A", 50)], 1), vec![("B", 1), ("A", 0)]);
    }

    #[test]
    fn test_equal_quotient_goes_to_more_votes() {
        // 100/2 == 50/1 for the second seat; the larger list takes it.
        let result = seats(&[("B", 50), ("A", 100)], 2);
        assert_eq!(result, vec![("B", 0), ("A", 2)]);
    }

    #[test]
    fn test_zero_seats() {
        let result = allocate::<&str>(&[], 0).unwrap();
        assert_eq!(result.total(), 0);
        assert_eq!(seats(&[("A", 10)], 0), vec![("A", 0)]);
    }

    #[test]
    fn test_no_contenders_is_malformed() {
        let err = allocate::<&str>(&[], 2).unwrap_err();
        assert!(matches!(err, AllocationError::MalformedInput { .. }));
    }

    #[test]
    fn test_zero_votes_get_nothing_against_positive() {
        assert_eq!(seats(&[("Z", 0), ("A", 1)], 5), vec![("Z", 0), ("A", 5)]);
    }

    #[test]
    fn test_capacity_hands_surplus_to_others() {
        let contenders = vec![
            Contender::bounded("PS", 66166, 1),
            Contender::bounded("PDC", 30760, 1),
        ];
        let result = allocate_bounded(&contenders, 2).unwrap();
        assert_eq!(result.into_vec(), vec![("PS", 1), ("PDC", 1)]);
    }

    #[test]
    fn test_capacity_below_seats_is_malformed() {
        let contenders = vec![Contender::bounded("A", 10, 1), Contender::bounded("B", 5, 1)];
        assert!(matches!(
            allocate_bounded(&contenders, 3),
            Err(AllocationError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_cutoff_and_award_order() {
        let result = allocate(&[("C", 100), ("J", 80), ("K", 30)], 3).unwrap();
        assert_eq!(result.award_order().copied().collect::<Vec<_>>(), vec!["C", "J", "C"]);
        assert_eq!(result.cutoff_quotient(), Some(50.0));
        assert_eq!(result.get(&"K"), 0);
    }
}
