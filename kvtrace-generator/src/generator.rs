//! The generation algorithm.
//!
//! A [`Generator`] owns all state of one run: the [`Profile`], the [`RandomSource`] and the
//! [`Population`] of inserted keys. Each step draws an operation class, consults or mutates the
//! population and yields one [`Operation`]:
//!
//! - With probability `insert_ratio` the step is insert-class. Once something has been inserted,
//!   it becomes an *update* of a random existing key with probability
//!   `add_ratio - p² × transition_to_updates_ratio` (where `p` is the completed fraction of the
//!   run), and a *fresh insert* otherwise.
//! - Otherwise the step is a lookup. Once something has been inserted, it becomes a *hit* on a
//!   random existing key with probability `correct_lookup_ratio`, and a *miss* on a key that was
//!   never inserted otherwise.
//!
//! Steps depend on the population left behind by all previous steps, so a run is strictly
//! sequential.

use std::io::Write;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::emitter::{Emitter, TraceFile};
use crate::error::{GeneratorError, GeneratorResult};
use crate::population::{Item, Population};
use crate::profile::Profile;
use crate::random::RandomSource;
use crate::record::Operation;

/// Default number of candidates drawn when searching for an unused key.
pub const DEFAULT_MAX_KEY_ATTEMPTS: u32 = 10_000;

/// Number of steps between two progress callbacks in [`Generator::run`].
const PROGRESS_INTERVAL: u64 = 1 << 12;

/// Number of operations generated per variant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OperationCounts {
    /// Inserts of previously unseen keys.
    pub fresh_inserts: u64,
    /// Value overwrites of existing keys.
    pub updates: u64,
    /// Lookups of existing keys.
    pub hit_lookups: u64,
    /// Lookups of keys that were never inserted.
    pub miss_lookups: u64,
    /// Candidate keys discarded because they had been inserted before.
    pub rejected_keys: u64,
}

impl OperationCounts {
    /// Total number of operations counted.
    pub fn total(&self) -> u64 {
        self.fresh_inserts + self.updates + self.hit_lookups + self.miss_lookups
    }

    fn record(&mut self, operation: &Operation) {
        let counter = match operation {
            Operation::FreshInsert(_) => &mut self.fresh_inserts,
            Operation::Update(_) => &mut self.updates,
            Operation::HitLookup(_) => &mut self.hit_lookups,
            Operation::MissLookup(_) => &mut self.miss_lookups,
        };
        *counter += 1;
    }
}

/// Summary of a completed generation run.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    /// Name of the profile that was generated.
    pub name: String,
    /// Seed of the random source, sufficient to reproduce the run.
    pub seed: u64,
    /// Number of operations emitted.
    pub operations: u64,
    /// Breakdown of the emitted operations.
    pub counts: OperationCounts,
    /// Number of distinct keys inserted over the run.
    pub population: usize,
}

/// The state of one generation run.
///
/// Yields exactly [`Profile::num_ops`] operations when used as an iterator. Iteration stops after
/// the first error.
#[derive(Debug)]
pub struct Generator {
    profile: Profile,
    rng: RandomSource,
    population: Population,
    max_key_attempts: u32,

    step: u64,
    counts: OperationCounts,
    failed: bool,
}

impl Generator {
    /// Creates a generator for `profile` drawing from `rng`.
    ///
    /// Fails with [`GeneratorError::InvalidConfig`] if the profile does not validate.
    pub fn new(profile: Profile, rng: RandomSource) -> GeneratorResult<Self> {
        profile.validate()?;

        Ok(Self {
            profile,
            rng,
            population: Population::new(),
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,

            step: 0,
            counts: OperationCounts::default(),
            failed: false,
        })
    }

    /// Creates a generator seeded from the profile's seed.
    ///
    /// Profiles without a seed of their own use `fallback_seed`, or a fresh seed if that is unset
    /// as well.
    pub fn from_profile(profile: Profile, fallback_seed: Option<u64>) -> GeneratorResult<Self> {
        let rng = match profile.seed.or(fallback_seed) {
            Some(seed) => RandomSource::from_seed(seed),
            None => RandomSource::from_entropy(),
        };
        Self::new(profile, rng)
    }

    /// Limits the number of candidates drawn when searching for an unused key.
    ///
    /// Exceeding the limit fails the run with [`GeneratorError::ExhaustedKeySpace`]. With a limit of
    /// zero, no key can ever be drawn.
    pub fn max_key_attempts(mut self, attempts: u32) -> Self {
        self.max_key_attempts = attempts;
        self
    }

    /// The profile being generated.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The seed of the random source.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// The population of keys inserted so far.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of operations generated so far.
    pub fn completed(&self) -> u64 {
        self.step
    }

    /// Breakdown of the operations generated so far.
    pub fn counts(&self) -> OperationCounts {
        self.counts
    }

    /// Generates the next operation, or `None` once all operations have been generated.
    pub fn next_operation(&mut self) -> GeneratorResult<Option<Operation>> {
        if self.failed || self.step >= self.profile.num_ops {
            return Ok(None);
        }

        let operation = if self.rng.probability() < self.profile.insert_ratio {
            self.insert_class()
        } else {
            self.lookup_class()
        };

        match operation {
            Ok(operation) => {
                self.counts.record(&operation);
                self.step += 1;
                Ok(Some(operation))
            }
            Err(error) => {
                self.failed = true;
                Err(error)
            }
        }
    }

    fn insert_class(&mut self) -> GeneratorResult<Operation> {
        let threshold = self.profile.update_threshold(self.step);
        if !self.population.is_empty() && self.rng.probability() < threshold {
            if let Some(item) = self.population.update_random(&mut self.rng) {
                return Ok(Operation::Update(item));
            }
        }

        let key = self.unused_key()?;
        let item = Item {
            key,
            value: self.rng.key_or_value(),
        };
        self.population.insert(item);
        Ok(Operation::FreshInsert(item))
    }

    fn lookup_class(&mut self) -> GeneratorResult<Operation> {
        let hit_ratio = self.profile.correct_lookup_ratio;
        if !self.population.is_empty() && self.rng.probability() < hit_ratio {
            if let Some(item) = self.population.sample(&mut self.rng) {
                return Ok(Operation::HitLookup(item));
            }
        }

        let key = self.unused_key()?;
        Ok(Operation::MissLookup(Item {
            key,
            value: self.rng.key_or_value(),
        }))
    }

    /// Draws keys until one is found that was never inserted.
    fn unused_key(&mut self) -> GeneratorResult<u64> {
        for _ in 0..self.max_key_attempts {
            let key = self.rng.key_or_value();
            if !self.population.contains(key) {
                return Ok(key);
            }

            self.counts.rejected_keys += 1;
            tracing::debug!(key, step = self.step, "rejected previously inserted key");
        }

        Err(GeneratorError::ExhaustedKeySpace {
            attempts: self.max_key_attempts,
        })
    }

    /// Generates all remaining operations and writes them to `emitter`.
    ///
    /// `cancel` is checked before every step that still has an operation to generate, so a run
    /// that already emitted its last operation completes. `progress` is called periodically, and
    /// once at the end, with the number of operations completed so far.
    pub fn run<W: Write>(
        mut self,
        emitter: &mut Emitter<W>,
        cancel: &CancellationToken,
        mut progress: impl FnMut(u64),
    ) -> GeneratorResult<GenerationReport> {
        tracing::debug!(
            profile = %self.profile.name,
            seed = self.seed(),
            num_ops = self.profile.num_ops,
            "generating trace"
        );

        loop {
            if self.step < self.profile.num_ops && cancel.is_cancelled() {
                tracing::debug!(completed = self.step, "generation cancelled");
                return Err(GeneratorError::Cancelled {
                    completed: self.step,
                });
            }

            let Some(operation) = self.next_operation()? else {
                break;
            };
            emitter.emit(&operation.record())?;

            if self.step % PROGRESS_INTERVAL == 0 {
                progress(self.step);
            }
        }
        progress(self.step);

        Ok(self.into_report())
    }

    /// Generates the trace into a file at `path`.
    ///
    /// The file only appears once the run completed successfully. On failure or cancellation no
    /// file is left behind, and an existing file at `path` is kept as it was.
    pub fn write_to(
        self,
        path: impl Into<PathBuf>,
        cancel: &CancellationToken,
        progress: impl FnMut(u64),
    ) -> GeneratorResult<GenerationReport> {
        let mut file = TraceFile::create(path)?;
        let report = self.run(file.emitter(), cancel, progress)?;
        file.commit()?;
        Ok(report)
    }

    /// Summarizes the run so far.
    pub fn into_report(self) -> GenerationReport {
        GenerationReport {
            name: self.profile.name,
            seed: self.rng.seed(),
            operations: self.step,
            counts: self.counts,
            population: self.population.len(),
        }
    }
}

impl Iterator for Generator {
    type Item = GeneratorResult<Operation>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_operation().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn generator(profile: Profile, seed: u64) -> Generator {
        Generator::new(profile, RandomSource::from_seed(seed)).unwrap()
    }

    #[test]
    fn yields_exactly_num_ops() {
        let profile = Profile::builder("count").num_ops(1234).build().unwrap();
        let operations: Vec<_> = generator(profile, 1).collect::<Result<_, _>>().unwrap();
        assert_eq!(operations.len(), 1234);
    }

    #[test]
    fn rejects_invalid_profiles() {
        let mut profile = Profile::builder("bad").build().unwrap();
        profile.insert_ratio = 2.0;

        let result = Generator::new(profile, RandomSource::from_seed(0));
        assert!(matches!(result, Err(GeneratorError::InvalidConfig(_))));
    }

    #[test]
    fn only_fresh_inserts_without_updates() {
        let profile = Profile::builder("fresh")
            .num_ops(2_000)
            .insert_ratio(1.0)
            .add_ratio(0.0)
            .build()
            .unwrap();

        let mut generator = generator(profile, 5);
        for operation in generator.by_ref() {
            assert!(matches!(operation.unwrap(), Operation::FreshInsert(_)));
        }
        assert_eq!(generator.population().len(), 2_000);
    }

    #[test]
    fn only_misses_without_inserts() {
        let profile = Profile::builder("misses")
            .num_ops(2_000)
            .insert_ratio(0.0)
            .build()
            .unwrap();

        let mut generator = generator(profile, 9);
        let operations: Vec<_> = generator.by_ref().collect::<Result<_, _>>().unwrap();

        assert!(
            operations
                .iter()
                .all(|op| matches!(op, Operation::MissLookup(_)))
        );
        assert!(generator.population().is_empty());
        assert_eq!(generator.counts().miss_lookups, 2_000);
    }

    #[test]
    fn hits_return_latest_value() {
        let profile = Profile::builder("hits")
            .num_ops(20_000)
            .insert_ratio(0.5)
            .add_ratio(0.7)
            .build()
            .unwrap();

        let mut model = HashMap::new();
        for operation in generator(profile, 11) {
            match operation.unwrap() {
                Operation::FreshInsert(item) => {
                    assert_eq!(model.insert(item.key, item.value), None);
                }
                Operation::Update(item) => {
                    assert!(model.insert(item.key, item.value).is_some());
                }
                Operation::HitLookup(item) => {
                    assert_eq!(model.get(&item.key), Some(&item.value));
                }
                Operation::MissLookup(item) => {
                    // Only possible while nothing has been inserted yet.
                    assert!(model.is_empty());
                    assert!(!model.contains_key(&item.key));
                }
            }
        }
    }

    #[test]
    fn misses_never_target_inserted_keys() {
        let profile = Profile::builder("mixed")
            .num_ops(20_000)
            .correct_lookup_ratio(0.5)
            .build()
            .unwrap();

        let mut generator = generator(profile, 13);
        let mut misses = 0;
        while let Some(operation) = generator.next_operation().unwrap() {
            if let Operation::MissLookup(item) = operation {
                assert!(!generator.population().contains(item.key));
                misses += 1;
            }
        }
        assert!(misses > 0);
    }

    #[test]
    fn drift_shifts_inserts_away_from_updates() {
        let profile = Profile::builder("drift")
            .num_ops(20_000)
            .insert_ratio(1.0)
            .add_ratio(0.8)
            .transition_to_updates_ratio(0.8)
            .build()
            .unwrap();

        let operations: Vec<_> = generator(profile, 17).collect::<Result<_, _>>().unwrap();
        let (early, late) = operations.split_at(10_000);
        let updates = |ops: &[Operation]| {
            ops.iter()
                .filter(|op| matches!(op, Operation::Update(_)))
                .count()
        };

        // Expected update rates are roughly 73% in the first and 33% in the second half.
        assert!(updates(early) > 6_500);
        assert!(updates(late) < 4_000);
    }

    #[test]
    fn exhausted_key_space_fails_the_run() {
        let profile = Profile::builder("exhausted")
            .num_ops(10)
            .insert_ratio(0.0)
            .build()
            .unwrap();

        let mut generator = generator(profile, 0).max_key_attempts(0);
        let error = generator.next().unwrap().unwrap_err();
        assert!(matches!(
            error,
            GeneratorError::ExhaustedKeySpace { attempts: 0 }
        ));

        // Iteration stops after the first error.
        assert!(generator.next().is_none());
        assert_eq!(generator.completed(), 0);
    }

    #[test]
    fn run_respects_cancellation() {
        let profile = Profile::builder("cancel").num_ops(100).build().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut emitter = Emitter::new(Vec::new());
        let result = generator(profile, 0).run(&mut emitter, &cancel, |_| ());

        assert!(matches!(
            result,
            Err(GeneratorError::Cancelled { completed: 0 })
        ));
        assert_eq!(emitter.written(), 0);
    }

    #[test]
    fn cancellation_after_last_operation_completes() {
        let profile = Profile::builder("late").num_ops(8_192).build().unwrap();
        let cancel = CancellationToken::new();

        let mut emitter = Emitter::new(Vec::new());
        let report = generator(profile, 4)
            .run(&mut emitter, &cancel, |done| {
                if done == 8_192 {
                    cancel.cancel();
                }
            })
            .unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(report.operations, 8_192);
        assert_eq!(emitter.written(), 8_192);
    }

    /// Accepts `remaining` lines, then fails every write.
    struct BrokenWriter {
        remaining: usize,
    }

    impl Write for BrokenWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::other("disk full"));
            }
            self.remaining -= buf.iter().filter(|&&b| b == b'\n').count();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_aborts_the_run() {
        let profile = Profile::builder("broken").num_ops(100).build().unwrap();

        let mut emitter = Emitter::new(BrokenWriter { remaining: 10 });
        let result = generator(profile, 8).run(&mut emitter, &CancellationToken::new(), |_| ());

        let Err(GeneratorError::Io(error)) = &result else {
            panic!("expected io error, got {result:?}");
        };
        assert_eq!(error.to_string(), "disk full");
        assert_eq!(emitter.written(), 10);
    }

    #[test]
    fn run_reports_counts() {
        kvtrace_test::tracing::init();

        let profile = Profile::builder("report")
            .num_ops(10_000)
            .correct_lookup_ratio(0.9)
            .build()
            .unwrap();

        let mut emitter = Emitter::new(Vec::new());
        let mut last_progress = 0;
        let report = generator(profile, 21)
            .run(&mut emitter, &CancellationToken::new(), |done| {
                last_progress = done
            })
            .unwrap();

        assert_eq!(last_progress, 10_000);
        assert_eq!(report.name, "report");
        assert_eq!(report.seed, 21);
        assert_eq!(report.operations, 10_000);
        assert_eq!(report.counts.total(), 10_000);
        assert_eq!(emitter.written(), 10_000);
        assert_eq!(report.population as u64, report.counts.fresh_inserts);
    }
}
