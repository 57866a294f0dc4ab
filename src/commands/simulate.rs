use super::Result;
use colored::Colorize;
use pact_merge::config::SimulationConfig;
use pact_merge::formats::load_districts;
use pact_merge::reports::console::print_report;
use pact_merge::reports::generator::generate_report;
use pact_merge::reports::ReportOptions;
use pact_merge::scenario::{build_merged_scenario, compare};
use pact_merge::util::write_serialized;
use tracing::info;

/// Run the merge scenario described by `config` and report it.
pub fn simulate(config: &SimulationConfig) -> Result<()> {
    println!(
        "🚀 Simulating {} over {}",
        config.request.label().bright_cyan(),
        config.inputs.display().to_string().bright_cyan()
    );

    let loaded = load_districts(&config.inputs)?;
    info!(
        districts = loaded.districts.len(),
        failures = loaded.failures.len(),
        "workbooks loaded"
    );

    let scenario = build_merged_scenario(&loaded.districts, &config.request);
    let comparison = compare(&loaded.districts, &scenario, &config.filter)?;
    comparison.ensure_comparable()?;
    info!(
        compared = comparison.diffs().count(),
        failed = comparison.failures().count(),
        unaffected = comparison.unaffected.len(),
        "comparison finished"
    );

    let report = generate_report(&comparison, &loaded.districts, &loaded.failures);
    print_report(
        &report,
        &ReportOptions {
            print_all: config.print_all,
        },
    );

    if let Some(path) = &config.json {
        write_serialized(path, &report)?;
        println!(
            "✅ Report written to {}",
            path.display().to_string().bright_green()
        );
    }

    Ok(())
}
