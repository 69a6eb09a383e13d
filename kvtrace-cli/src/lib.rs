//! The `kvtrace` command line.
//!
//! This builds on top of [`kvtrace_generator`] and writes one trace file per configured profile,
//! ready to be replayed by a hash table benchmark harness. It also lists profiles and inspects
//! existing traces.

pub mod cli;
pub mod config;
pub mod generate;
pub mod observability;
pub mod report;
