//! Generate traces for several profiles concurrently and print their reports.

use std::path::Path;

use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use kvtrace_generator::{GenerationReport, Generator, GeneratorResult, Profile};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::report;

/// Generates a trace for every profile into the configured output directory.
///
/// Every profile is generated by its own blocking task, with its own random source and
/// population. Interrupting the process cancels all runs; cancelled or failed runs leave no trace
/// file behind. Returns an error if any profile failed.
pub async fn run(config: Config, profiles: Vec<Profile>) -> Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let bars = MultiProgress::new();
    let style = ProgressStyle::with_template("{msg:28} {wide_bar} {pos}/{len} {elapsed}")?;

    let total = profiles.len();
    let tasks: Vec<_> = profiles
        .into_iter()
        .map(|profile| {
            let path = config.output_dir.join(&profile.name);
            let bar = bars.add(
                ProgressBar::new(profile.num_ops)
                    .with_style(style.clone())
                    .with_message(profile.name.clone()),
            );
            let cancel = cancel.clone();
            let seed = config.seed;
            let max_key_attempts = config.max_key_attempts;

            tokio::task::spawn_blocking(move || {
                let name = profile.name.clone();
                let result = generate_profile(profile, seed, max_key_attempts, &path, &cancel, &bar);
                bar.finish_and_clear();
                (name, path, result)
            })
        })
        .collect();

    let finished_tasks = futures::future::join_all(tasks).await;

    let mut failures = 0;
    for task in finished_tasks {
        let (name, path, result) = task?;
        match result {
            Ok(report) => report::print_report(&path, &report),
            Err(error) => {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    profile = %name,
                    "failed to generate trace"
                );
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} profiles failed");
    }
    Ok(())
}

fn generate_profile(
    profile: Profile,
    seed: Option<u64>,
    max_key_attempts: u32,
    path: &Path,
    cancel: &CancellationToken,
    bar: &ProgressBar,
) -> GeneratorResult<GenerationReport> {
    let generator = Generator::from_profile(profile, seed)?.max_key_attempts(max_key_attempts);
    tracing::info!(
        profile = %generator.profile().name,
        seed = generator.seed(),
        path = %path.display(),
        "generating trace"
    );

    let report = generator.write_to(path, cancel, |done| bar.set_position(done))?;
    tracing::info!(
        profile = %report.name,
        operations = report.operations,
        population = report.population,
        "finished trace"
    );

    Ok(report)
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupted, cancelling generation");
        cancel.cancel();
    }
}
