use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use argh::FromArgs;
use kvtrace_generator::TraceSummary;

use crate::config::Config;
use crate::{generate, observability, report};

/// Generate synthetic operation traces for hash table benchmarks.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Generate(GenerateCommand),
    Profiles(ProfilesCommand),
    Inspect(InspectCommand),
    Version(VersionCommand),
}

/// generate a trace file for each configured profile
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "generate")]
struct GenerateCommand {
    /// only generate the profile with this name, may be repeated
    #[argh(option, short = 'p')]
    profile: Vec<String>,

    /// seed for every profile that does not set its own
    #[argh(option)]
    seed: Option<u64>,

    /// directory to write the traces into
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// list the configured profiles
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "profiles")]
struct ProfilesCommand {}

/// replay trace files against a model table and print their counters
///
/// Fails if a line is not a record or if a successful lookup reports a failed match.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "inspect")]
struct InspectCommand {
    /// trace files to inspect
    #[argh(positional)]
    paths: Vec<PathBuf>,
}

/// print the kvtrace version
#[derive(Default, Debug, FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCommand {}

/// Parse the command line and execute the command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    // Special switch to just print the version and exit.
    if let Command::Version(_) = args.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    observability::init_tracing(&config.logging);
    tracing::debug!(?config);

    match args.command {
        Command::Generate(command) => {
            if let Some(seed) = command.seed {
                config.seed = Some(seed);
            }
            if let Some(output_dir) = command.output_dir {
                config.output_dir = output_dir;
            }
            let profiles = config.select_profiles(&command.profile)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .thread_name("kvtrace-rt")
                .enable_all()
                .build()?;
            runtime.block_on(generate::run(config, profiles))
        }
        Command::Profiles(ProfilesCommand {}) => {
            report::print_profiles(&config.profiles);
            Ok(())
        }
        Command::Inspect(InspectCommand { paths }) => {
            let mut invalid = 0;
            for path in &paths {
                let summary = TraceSummary::from_path(path)
                    .with_context(|| format!("failed to inspect {}", path.display()))?;
                report::print_summary(path, &summary);
                if summary.failed_matches > 0 {
                    invalid += 1;
                }
            }

            if invalid > 0 {
                bail!("{invalid} of {} traces have failed matches", paths.len());
            }
            Ok(())
        }
        Command::Version(VersionCommand {}) => unreachable!(),
    }
}
