//! Generates synthetic insert/lookup traces for concurrent hash table benchmarks.
//!
//! See [`kvtrace_cli::cli`] for the available commands and [`kvtrace_cli::config`] for the
//! configuration file format.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    kvtrace_cli::cli::execute()
}
