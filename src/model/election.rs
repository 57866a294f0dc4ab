use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub type Votes = u64;

/// A single contestant, ranked by personal votes inside its list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidacy {
    /// Ballot number, 0 when the source did not print one.
    pub number: u32,
    pub name: String,
    pub party: Option<String>,
    pub votes: Votes,
    /// Marked as elected in the official results.
    #[serde(default)]
    pub officially_elected: bool,
}

impl Candidacy {
    pub fn new(number: u32, name: &str, party: Option<&str>, votes: Votes) -> Candidacy {
        Candidacy {
            number,
            name: name.to_string(),
            party: party.map(|p| p.to_string()),
            votes,
            officially_elected: false,
        }
    }
}

/// Identity of a list: the pact it was registered under plus its own code.
///
/// The pact half never changes, so a list keeps its identity when its pact
/// is merged into another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListId {
    pub pact: String,
    pub code: String,
}

impl ListId {
    pub fn new(pact: &str, code: &str) -> ListId {
        ListId {
            pact: pact.to_string(),
            code: code.to_string(),
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pact, self.code)
    }
}

/// A party or subpact inside a pact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub candidacies: Vec<Arc<Candidacy>>,
}

impl List {
    pub fn new(id: ListId, name: &str, candidacies: Vec<Candidacy>) -> List {
        List {
            id,
            name: name.to_string(),
            candidacies: candidacies.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn votes(&self) -> Votes {
        self.candidacies.iter().map(|c| c.votes).sum()
    }
}

/// An electoral alliance competing for the district's seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pact {
    pub code: String,
    pub name: String,
    pub lists: Vec<Arc<List>>,
    /// Original pact codes this pact stands for. A merged pact lists both.
    pub members: Vec<String>,
    /// Totals as printed in the source, for display only.
    pub declared_votes: Option<Votes>,
    pub declared_seats: Option<u32>,
}

impl Pact {
    pub fn new(code: &str, name: &str, lists: Vec<List>) -> Pact {
        Pact {
            code: code.to_string(),
            name: name.to_string(),
            lists: lists.into_iter().map(Arc::new).collect(),
            members: vec![code.to_string()],
            declared_votes: None,
            declared_seats: None,
        }
    }

    pub fn votes(&self) -> Votes {
        self.lists.iter().map(|l| l.votes()).sum()
    }

    pub fn candidacy_count(&self) -> usize {
        self.lists.iter().map(|l| l.candidacies.len()).sum()
    }

    pub fn is_merged(&self) -> bool {
        self.members.len() > 1
    }

    /// Whether `code` names this pact, ignoring case and surrounding blanks.
    pub fn matches(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// Where a district was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub sha1: String,
}

/// An electoral unit with a fixed number of seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct District {
    pub id: String,
    pub label: String,
    pub seats: u32,
    pub pacts: Vec<Pact>,
    pub source: Option<SourceFile>,
}

impl District {
    pub fn new(id: &str, label: &str, seats: u32, pacts: Vec<Pact>) -> District {
        District {
            id: id.to_string(),
            label: label.to_string(),
            seats,
            pacts,
            source: None,
        }
    }

    pub fn pact(&self, code: &str) -> Option<&Pact> {
        self.pacts.iter().find(|p| p.matches(code))
    }

    pub fn votes(&self) -> Votes {
        self.pacts.iter().map(|p| p.votes()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_roll_up() {
        let pact = Pact::new(
            "C",
            "Unidad",
            vec![
                List::new(
                    ListId::new("C", "PS"),
                    "PS",
                    vec![
                        Candidacy::new(1, "A", Some("PS"), 10),
                        Candidacy::new(2, "B", Some("PS"), 5),
                    ],
                ),
                List::new(
                    ListId::new("C", "PPD"),
                    "PPD",
                    vec![Candidacy::new(3, "C", Some("PPD"), 7)],
                ),
            ],
        );

        assert_eq!(pact.votes(), 22);
        assert_eq!(pact.candidacy_count(), 3);
        assert!(!pact.is_merged());
        assert!(pact.matches(" c "));
    }
}
