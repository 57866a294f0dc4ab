use super::{ReportOptions, SimulationReport};
use crate::model::allocation::{DistrictAllocation, ElectedCandidacy};
use crate::model::election::Votes;
use crate::scenario::compare::{DeltaKind, DistrictOutcome, ScenarioDiff, SummaryRow};
use colored::*;
use itertools::Itertools;

/// Prints the report to stdout.
pub fn print_report(report: &SimulationReport, options: &ReportOptions) {
    print!("{}", render_report(report, options));
}

/// Renders the report as colored terminal text.
pub fn render_report(report: &SimulationReport, options: &ReportOptions) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "🔀 Merging {} and {} into {}\n",
        report.merge.pact_a.bright_cyan(),
        report.merge.pact_b.bright_cyan(),
        report.merged_code.bright_cyan().bold()
    ));

    for failure in &report.load_failures {
        out.push_str(&format!(
            "⚠️  Skipped {}: {}\n",
            failure.path.display(),
            failure.error.yellow()
        ));
    }

    for outcome in &report.districts {
        match outcome {
            DistrictOutcome::Compared(diff) if diff.changed || options.print_all => {
                out.push_str(&render_diff(diff));
            }
            DistrictOutcome::Compared(_) => {}
            DistrictOutcome::Failed(failure) => {
                out.push_str(&format!(
                    "\n❌ {} ({}): {}\n",
                    failure.label.bold(),
                    failure.district,
                    failure.error.red()
                ));
            }
        }
    }

    if !report.unaffected.is_empty() {
        out.push_str(&format!(
            "\nℹ️  {} districts left out (one of the pacts is not running there):\n",
            report.unaffected.len().to_string().bright_yellow()
        ));
        for skipped in &report.unaffected {
            out.push_str(&format!(
                "   - {}: missing {}\n",
                skipped.label,
                skipped.missing.join(", ")
            ));
        }
    }

    let compared = report
        .districts
        .iter()
        .filter(|o| matches!(o, DistrictOutcome::Compared(_)))
        .count();
    out.push_str(&format!(
        "\n📋 {} districts compared, {} changed by the merge\n",
        compared.to_string().bright_yellow(),
        report.changed_count().to_string().bright_yellow()
    ));

    out.push_str(&render_summary(&report.summary));
    out
}

fn render_diff(diff: &ScenarioDiff) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} {} ({} seats)\n",
        "===".bright_blue(),
        diff.label.bold(),
        diff.seats
    ));

    out.push_str("Pacts:\n");
    for pact in &diff.pacts {
        out.push_str(&format!(
            "   {} {} - {} votes, {} candidacies\n",
            pact.code.bright_cyan(),
            pact.name,
            thousands(pact.votes),
            pact.candidacies
        ));
    }

    out.push_str(&format!("{}\n", "Official result:".bold()));
    out.push_str(&render_allocation(&diff.baseline));
    out.push_str(&format!("{} {}:\n", "Scenario".bold(), diff.merged_code.bold()));
    out.push_str(&render_allocation(&diff.alternative));

    if let Some(fused) = diff.alternative.pact(&diff.merged_code) {
        out.push_str(&format!("   Breakdown of {}:\n", diff.merged_code));
        for member in &fused.members {
            out.push_str(&format!(
                "      {}: {} seats\n",
                member,
                fused.seats_for_member(member)
            ));
        }
    }

    out.push_str("Seat changes:\n");
    for delta in &diff.deltas {
        let label = match delta.kind {
            DeltaKind::Combined => format!("{} (together)", delta.code),
            _ => delta.code.clone(),
        };
        out.push_str(&format!(
            "   {}: {} -> {} ({})\n",
            label,
            delta.baseline,
            delta.alternative,
            signed(delta.delta())
        ));
    }

    if !diff.gained.is_empty() {
        out.push_str(&format!("   {} {}\n", "Gained:".green(), candidacy_names(&diff.gained)));
    }
    if !diff.lost.is_empty() {
        out.push_str(&format!("   {} {}\n", "Lost:".red(), candidacy_names(&diff.lost)));
    }

    if let (Some(base), Some(alt)) = (diff.baseline_cutoff, diff.alternative_cutoff) {
        out.push_str(&format!("Last-seat quotient: {:.1} -> {:.1}\n", base, alt));
    }
    out.push_str(&format!(
        "Indifference margin: {} votes ({:.2} %)\n",
        thousands(diff.indifference.votes),
        diff.indifference.share * 100.0
    ));

    out
}

fn render_allocation(allocation: &DistrictAllocation) -> String {
    let mut out = String::new();
    for pact in allocation.pacts.iter().filter(|p| p.seats > 0) {
        out.push_str(&format!(
            "   {} -> {} seats ({} votes)\n",
            pact.code.bright_cyan(),
            pact.seats,
            thousands(pact.votes)
        ));
    }

    let elected = allocation
        .elected()
        .sorted_by(|a, b| b.candidacy.votes.cmp(&a.candidacy.votes));
    for e in elected {
        out.push_str(&format!(
            "      ✓ {} ({}, {}) {} votes\n",
            e.candidacy.name,
            e.pact,
            e.list.code,
            thousands(e.candidacy.votes)
        ));
    }
    out
}

fn render_summary(rows: &[SummaryRow]) -> String {
    let mut out = format!("\n{} {}\n", "===".bright_blue(), "Consolidated summary".bold());

    out.push_str("Official:\n");
    for row in rows
        .iter()
        .filter(|r| r.official > 0)
        .sorted_by(|a, b| b.official.cmp(&a.official).then_with(|| a.code.cmp(&b.code)))
    {
        out.push_str(&format!("   {}: {}\n", row.code, row.official));
    }

    out.push_str("Scenario:\n");
    for row in rows
        .iter()
        .filter(|r| r.scenario > 0)
        .sorted_by(|a, b| b.scenario.cmp(&a.scenario).then_with(|| a.code.cmp(&b.code)))
    {
        out.push_str(&format!("   {}: {}\n", row.code, row.scenario));
    }

    out.push_str("Variation:\n");
    for row in rows.iter().filter(|r| r.delta() != 0) {
        let delta = signed(row.delta());
        let delta = if row.delta() > 0 { delta.green() } else { delta.red() };
        out.push_str(&format!("   {}: {}\n", row.code, delta));
    }
    out
}

fn candidacy_names(elected: &[ElectedCandidacy]) -> String {
    elected
        .iter()
        .map(|e| format!("{} ({})", e.candidacy.name, e.list.code))
        .join(", ")
}

fn signed(delta: i64) -> String {
    format!("{:+}", delta)
}

/// `1234567` as `1.234.567`.
fn thousands(votes: Votes) -> String {
    let digits = votes.to_string();
    let head = digits.len() % 3;
    let mut groups = Vec::new();
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        (head..digits.len())
            .step_by(3)
            .map(|start| &digits[start..start + 3]),
    );
    groups.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::election::{Candidacy, District, List, ListId, Pact};
    use crate::reports::generator::generate_report;
    use crate::scenario::{build_merged_scenario, compare, DistrictFilter, MergeRequest};

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1.000");
        assert_eq!(thousands(1234567), "1.234.567");
    }

    fn pact(code: &str, votes: &[u64]) -> Pact {
        let candidacies = votes
            .iter()
            .enumerate()
            .map(|(i, v)| Candidacy::new(i as u32 + 1, &format!("{}{}", code, i + 1), None, *v))
            .collect();
        Pact::new(code, code, vec![List::new(ListId::new(code, code), code, candidacies)])
    }

    fn report() -> SimulationReport {
        let districts = vec![
            District::new(
                "6",
                "Distrito 6",
                3,
                vec![pact("K", &[50, 30, 20]), pact("C", &[20, 10]), pact("J", &[25, 5])],
            ),
            District::new(
                "3",
                "Distrito 3",
                3,
                vec![pact("C", &[90, 10]), pact("J", &[41, 39]), pact("K", &[70])],
            ),
        ];
        let request = MergeRequest::new("C", "J").unwrap();
        let scenario = build_merged_scenario(&districts, &request);
        let comparison = compare(&districts, &scenario, &DistrictFilter::all()).unwrap();
        generate_report(&comparison, &districts, &[])
    }

    #[test]
    fn test_only_changed_districts_by_default() {
        colored::control::set_override(false);
        let text = render_report(&report(), &ReportOptions::default());

        assert!(text.contains("Distrito 6 (3 seats)"));
        assert!(!text.contains("Distrito 3 (3 seats)"));
        assert!(text.contains("Gained: C1 (C)"));
        assert!(text.contains("Lost: K3 (K)"));
        assert!(text.contains("C + J (together): 0 -> 1 (+1)"));
        assert!(text.contains("2 districts compared, 1 changed"));
    }

    #[test]
    fn test_print_all() {
        colored::control::set_override(false);
        let text = render_report(&report(), &ReportOptions { print_all: true });
        assert!(text.contains("Distrito 3 (3 seats)"));
        assert!(text.contains("Consolidated summary"));
    }
}
