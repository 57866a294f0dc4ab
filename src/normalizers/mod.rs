//! Grouping of a pact's candidacies into subpacts by party label.

use crate::model::election::{Candidacy, List, ListId};
use lazy_static::lazy_static;
use regex::Regex;

/// Which list a candidacy counts toward inside its pact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subpact {
    Party(String),
    /// Independents outside any party compete on their own.
    Independent,
}

pub fn subpact_of(party: Option<&str>) -> Subpact {
    lazy_static! {
        static ref IND_WITH_PARTY: Regex = Regex::new(r"(?i)^IND\s*-\s*(.+)$").unwrap();
    }

    let party = match party.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => return Subpact::Independent,
    };

    if party.eq_ignore_ascii_case("IND") {
        return Subpact::Independent;
    }

    match IND_WITH_PARTY.captures(party) {
        Some(caps) => Subpact::Party(caps[1].trim().to_uppercase()),
        None => Subpact::Party(party.to_uppercase()),
    }
}

/// Builds the lists of pact `pact_code`, in order of first appearance.
pub fn group_into_lists(pact_code: &str, candidacies: Vec<Candidacy>) -> Vec<List> {
    let mut groups: Vec<(String, String, Vec<Candidacy>)> = Vec::new();

    for candidacy in candidacies {
        let (code, name) = match subpact_of(candidacy.party.as_deref()) {
            Subpact::Party(code) => (code.clone(), code),
            Subpact::Independent => (
                format!("IND:{}", candidacy.name),
                format!("Independiente ({})", candidacy.name),
            ),
        };

        match groups.iter_mut().find(|(c, _, _)| *c == code) {
            Some((_, _, members)) => members.push(candidacy),
            None => groups.push((code, name, vec![candidacy])),
        }
    }

    groups
        .into_iter()
        .map(|(code, name, members)| List::new(ListId::new(pact_code, &code), &name, members))
        .collect()
}
