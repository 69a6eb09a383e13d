//! Synthetic operation traces for benchmarking concurrent key-value hash tables.
//!
//! A trace is a sequence of insert and lookup records, one per line, that a benchmark harness
//! replays against the table under test. The [`Generator`] models an evolving population of keys
//! so that it can emit:
//!
//! - *fresh inserts* of keys never seen before,
//! - *updates* overwriting the value of an existing key,
//! - *hit lookups* of existing keys, carrying their current value for verification,
//! - *miss lookups* of keys guaranteed to be absent.
//!
//! The mix of these operations is described by a [`Profile`]. The split between fresh inserts and
//! updates drifts over the course of a run. Runs are reproducible from their seed.
//!
//! ```
//! use kvtrace_generator::{Emitter, Generator, Profile, RandomSource};
//! use tokio_util::sync::CancellationToken;
//!
//! let profile = Profile::builder("example.txt").num_ops(100).build().unwrap();
//! let generator = Generator::new(profile, RandomSource::from_seed(7)).unwrap();
//!
//! let mut emitter = Emitter::new(Vec::new());
//! let report = generator
//!     .run(&mut emitter, &CancellationToken::new(), |_| ())
//!     .unwrap();
//! assert_eq!(report.operations, 100);
//! ```
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod emitter;
pub mod error;
pub mod generator;
pub mod inspect;
pub mod population;
pub mod profile;
pub mod random;
pub mod record;

pub use crate::emitter::{Emitter, TraceFile};
pub use crate::error::{GeneratorError, GeneratorResult};
pub use crate::generator::{GenerationReport, Generator, OperationCounts};
pub use crate::inspect::{InspectError, TraceSummary};
pub use crate::population::{Item, Population};
pub use crate::profile::{Profile, ProfileBuilder, ProfileError};
pub use crate::random::RandomSource;
pub use crate::record::{OpKind, Operation, Record, RecordParseError};
