//! Human readable output of generation reports, trace summaries and profiles.

use std::path::Path;

use kvtrace_generator::{GenerationReport, Profile, TraceSummary};
use yansi::Paint;

/// Prints the outcome of one generation run.
pub fn print_report(path: &Path, report: &GenerationReport) {
    let counts = &report.counts;

    println!();
    println!(
        "{} {} (seed: {})",
        "## Profile".bold(),
        report.name.bold().blue(),
        report.seed.bold()
    );
    println!(
        "  wrote {} operations to {}",
        report.operations.bold(),
        path.display()
    );
    println!(
        "{} {} (fresh: {}, updates: {})",
        "  INSERT:".bold().green(),
        (counts.fresh_inserts + counts.updates).bold(),
        counts.fresh_inserts,
        counts.updates
    );
    println!(
        "{} {} (hits: {}, misses: {})",
        "  LOOKUP:".bold().green(),
        (counts.hit_lookups + counts.miss_lookups).bold(),
        counts.hit_lookups,
        counts.miss_lookups
    );
    print!("  population: {} keys", report.population.bold());
    if counts.rejected_keys > 0 {
        print!(
            ", {}",
            format!("{} rejected key draws", counts.rejected_keys).yellow()
        );
    }
    println!();
}

/// Prints the replay counters of one trace file.
pub fn print_summary(path: &Path, summary: &TraceSummary) {
    println!();
    println!("{} {}", "## Trace".bold(), path.display().blue());
    println!("  total_ops: {}", summary.total_ops.bold());
    println!("  total_inserts: {}", summary.inserts);
    println!("  distinct_keys: {}", summary.distinct_keys);
    println!("  total_lookups: {}", summary.lookups);
    println!("  successful_lookups: {}", summary.successful_lookups);
    println!("  missed_lookups: {}", summary.missed_lookups);

    if summary.failed_matches > 0 {
        println!(
            "  failed_matches: {}",
            summary.failed_matches.bold().red()
        );
    } else {
        println!("  failed_matches: {}", 0.green());
    }
}

/// Prints a table of profiles.
pub fn print_profiles(profiles: &[Profile]) {
    println!(
        "{:<28} {:>10} {:>7} {:>7} {:>11} {:>7} {:>20}",
        "name".bold(),
        "num_ops".bold(),
        "insert".bold(),
        "add".bold(),
        "transition".bold(),
        "lookup".bold(),
        "seed".bold(),
    );

    for profile in profiles {
        let seed = match profile.seed {
            Some(seed) => seed.to_string(),
            None => "-".to_owned(),
        };
        println!(
            "{:<28} {:>10} {:>7} {:>7} {:>11} {:>7} {:>20}",
            profile.name,
            profile.num_ops,
            profile.insert_ratio,
            profile.add_ratio,
            profile.transition_to_updates_ratio,
            profile.correct_lookup_ratio,
            seed,
        );
    }
}
