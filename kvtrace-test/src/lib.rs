//! Test utilities for the kvtrace crates.
//!
//! This crate provides helpers shared by the unit and integration tests of the generator and the
//! command line. See the modules for all available utilities.

pub mod tracing;
