use super::Result;
use colored::Colorize;
use pact_merge::formats::load_districts;
use pact_merge::tabulator::ranking::rank_candidacies;
use std::path::Path;

/// Validate the workbooks in `inputs` and dump what was read from them.
pub fn info(inputs: &Path) -> Result<()> {
    println!("🔍 Reading workbooks from {}", inputs.display().to_string().cyan());

    let loaded = load_districts(inputs)?;

    for district in &loaded.districts {
        println!(
            "\n📁 {} ({}): {} seats, {} votes",
            district.label.bold(),
            district.id,
            district.seats.to_string().bright_yellow(),
            district.votes()
        );
        if let Some(source) = &district.source {
            println!("   {} sha1 {}", source.path.display(), source.sha1.dimmed());
        }

        for pact in &district.pacts {
            let declared = pact
                .declared_seats
                .map(|s| format!(", {} elected", s))
                .unwrap_or_default();
            println!(
                "   {} {} ({} votes{})",
                pact.code.bright_cyan(),
                pact.name,
                pact.votes(),
                declared
            );

            for list in &pact.lists {
                println!("      {} ({} votes)", list.name, list.votes());
                for candidacy in rank_candidacies(&list.candidacies) {
                    let mark = if candidacy.officially_elected { "✓" } else { " " };
                    println!(
                        "        {} {} {} {}",
                        mark.green(),
                        candidacy.number,
                        candidacy.name,
                        candidacy.votes
                    );
                }
            }
        }
    }

    for (path, error) in &loaded.failures {
        eprintln!("❌ {}: {}", path.display(), error);
    }

    println!(
        "\n✅ {} districts read, {} workbooks failed",
        loaded.districts.len().to_string().bright_green(),
        loaded.failures.len()
    );

    Ok(())
}
