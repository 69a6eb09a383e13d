//! Workload profiles describing the statistical shape of one trace.
//!
//! A [`Profile`] is an immutable parameter set. It decides how often the generator picks an
//! insert-class over a lookup-class operation, how inserts split between fresh keys and updates,
//! how that split drifts over the run, and how lookups split between hits and misses.
//!
//! Profiles can be built in code with [`Profile::builder`] or deserialized, for example from the
//! YAML configuration of the command line:
//!
//! ```yaml
//! name: typical.txt
//! num_ops: 100000
//! insert_ratio: 0.5
//! add_ratio: 0.8
//! transition_to_updates_ratio: 0.8
//! correct_lookup_ratio: 1.0
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`Profile::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    /// The profile name is empty.
    #[error("profile name must not be empty")]
    EmptyName,

    /// The profile name cannot be used as a file name.
    #[error("profile name {0:?} is not a valid file name")]
    InvalidName(String),

    /// The profile requests no operations.
    #[error("profile {0:?} must request at least one operation")]
    NoOperations(String),

    /// A ratio lies outside of `[0, 1]` or is not a number.
    #[error("{field} of profile {profile:?} is {value}, expected a value in [0, 1]")]
    RatioOutOfRange {
        /// Name of the offending profile.
        profile: String,
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// A named workload configuration.
///
/// See the [module docs](self) for an overview.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Profile {
    /// Identifier of the profile, also used as the output file name.
    pub name: String,

    /// Total number of operations to emit.
    pub num_ops: u64,

    /// Probability that an operation is insert-class (fresh insert or update) rather than a
    /// lookup.
    pub insert_ratio: f64,

    /// Base probability that an insert-class operation updates an existing key instead of
    /// inserting a fresh one.
    ///
    /// Despite the name, this is the probability of an *update*. It is compared against a drawn
    /// value after subtracting the drift term, see [`transition_to_updates_ratio`].
    ///
    /// [`transition_to_updates_ratio`]: Profile::transition_to_updates_ratio
    pub add_ratio: f64,

    /// Scales the drift term `p² × transition_to_updates_ratio`, where `p` is the fraction of the
    /// run already completed.
    ///
    /// The drift term is *subtracted* from [`add_ratio`](Profile::add_ratio), so a positive value
    /// makes updates rarer and fresh inserts more common as the run progresses. The name suggests
    /// the opposite; the formula is kept as is.
    pub transition_to_updates_ratio: f64,

    /// Probability that a lookup targets a key known to exist.
    pub correct_lookup_ratio: f64,

    /// Seed for this profile's random source.
    ///
    /// When unset, the seed is taken from the caller (for instance the global configuration), or
    /// drawn fresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Profile {
    /// Constructs a new profile builder with the given name.
    ///
    /// The defaults match the `balanced.txt` preset: 100 000 operations, half inserts, half of
    /// those updates, no drift and only hit lookups.
    pub fn builder(name: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder {
            profile: Profile {
                name: name.into(),
                num_ops: 100_000,
                insert_ratio: 0.5,
                add_ratio: 0.5,
                transition_to_updates_ratio: 0.0,
                correct_lookup_ratio: 1.0,
                seed: None,
            },
        }
    }

    /// Returns the preset profiles used for the hash table benchmarks.
    pub fn presets() -> Vec<Profile> {
        let preset = |name: &str, num_ops, insert, add, transition, correct| Profile {
            name: name.to_owned(),
            num_ops,
            insert_ratio: insert,
            add_ratio: add,
            transition_to_updates_ratio: transition,
            correct_lookup_ratio: correct,
            seed: None,
        };

        vec![
            preset("balanced.txt", 100_000, 0.5, 0.5, 0.0, 1.0),
            preset("write_heavy.txt", 100_000, 0.9, 0.5, 0.0, 1.0),
            preset("read_heavy.txt", 100_000, 0.1, 0.5, 0.0, 1.0),
            preset("typical.txt", 100_000, 0.5, 0.8, 0.8, 1.0),
            preset("typical_with_misses.txt", 100_000, 0.5, 0.8, 0.8, 0.9),
            preset("large.txt", 1_000_000, 0.5, 0.8, 0.8, 0.9),
        ]
    }

    /// Checks that the profile describes a well-formed workload.
    ///
    /// Every ratio must lie within `[0, 1]`, at least one operation must be requested and the
    /// name must be usable as a file name.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if matches!(self.name.as_str(), "." | "..") || self.name.contains(['/', '\\']) {
            return Err(ProfileError::InvalidName(self.name.clone()));
        }
        if self.num_ops == 0 {
            return Err(ProfileError::NoOperations(self.name.clone()));
        }

        let ratios = [
            ("insert_ratio", self.insert_ratio),
            ("add_ratio", self.add_ratio),
            ("transition_to_updates_ratio", self.transition_to_updates_ratio),
            ("correct_lookup_ratio", self.correct_lookup_ratio),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::RatioOutOfRange {
                    profile: self.name.clone(),
                    field,
                    value,
                });
            }
        }

        Ok(())
    }

    /// Probability of choosing an update over a fresh insert at step `step`.
    ///
    /// This may be negative late in a run, in which case every insert-class operation becomes a
    /// fresh insert.
    pub(crate) fn update_threshold(&self, step: u64) -> f64 {
        let progress = step as f64 / self.num_ops as f64;
        self.add_ratio - progress.powi(2) * self.transition_to_updates_ratio
    }
}

/// A builder for creating a [`Profile`].
#[derive(Debug)]
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    /// Total number of operations to emit.
    pub fn num_ops(mut self, num_ops: u64) -> Self {
        self.profile.num_ops = num_ops;
        self
    }

    /// Probability of an insert-class operation.
    pub fn insert_ratio(mut self, ratio: f64) -> Self {
        self.profile.insert_ratio = ratio;
        self
    }

    /// Base probability of an update within the insert branch.
    pub fn add_ratio(mut self, ratio: f64) -> Self {
        self.profile.add_ratio = ratio;
        self
    }

    /// Drift applied to the update probability over the course of the run.
    pub fn transition_to_updates_ratio(mut self, ratio: f64) -> Self {
        self.profile.transition_to_updates_ratio = ratio;
        self
    }

    /// Probability of a hit lookup.
    pub fn correct_lookup_ratio(mut self, ratio: f64) -> Self {
        self.profile.correct_lookup_ratio = ratio;
        self
    }

    /// Fixes the seed of the random source.
    pub fn seed(mut self, seed: u64) -> Self {
        self.profile.seed = Some(seed);
        self
    }

    /// Validates and creates the profile.
    pub fn build(self) -> Result<Profile, ProfileError> {
        self.profile.validate()?;
        Ok(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        let presets = Profile::presets();
        assert_eq!(presets.len(), 6);

        for preset in &presets {
            preset.validate().unwrap();
        }

        let large = presets.iter().find(|p| p.name == "large.txt").unwrap();
        assert_eq!(large.num_ops, 1_000_000);
        assert_eq!(large.correct_lookup_ratio, 0.9);
    }

    #[test]
    fn rejects_out_of_range_ratios() {
        let err = Profile::builder("bad")
            .insert_ratio(1.5)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ProfileError::RatioOutOfRange {
                profile: "bad".into(),
                field: "insert_ratio",
                value: 1.5,
            }
        );

        let err = Profile::builder("bad")
            .correct_lookup_ratio(-0.1)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::RatioOutOfRange {
                field: "correct_lookup_ratio",
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan() {
        let err = Profile::builder("nan")
            .add_ratio(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::RatioOutOfRange {
                field: "add_ratio",
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_runs_and_bad_names() {
        assert_eq!(
            Profile::builder("empty").num_ops(0).build(),
            Err(ProfileError::NoOperations("empty".into()))
        );
        assert_eq!(Profile::builder("").build(), Err(ProfileError::EmptyName));
        assert_eq!(
            Profile::builder("../escape.txt").build(),
            Err(ProfileError::InvalidName("../escape.txt".into()))
        );
        for name in [".", ".."] {
            assert_eq!(
                Profile::builder(name).num_ops(10).build(),
                Err(ProfileError::InvalidName(name.into()))
            );
        }
    }

    #[test]
    fn update_threshold_drifts_down() {
        let profile = Profile::builder("drift")
            .num_ops(10)
            .add_ratio(0.8)
            .transition_to_updates_ratio(0.8)
            .build()
            .unwrap();

        assert_eq!(profile.update_threshold(0), 0.8);
        assert!((profile.update_threshold(5) - 0.6).abs() < 1e-12);
        assert!(profile.update_threshold(9) < profile.update_threshold(8));
    }

    #[test]
    fn deserializes_without_seed() {
        let yaml = r#"
            name: custom.txt
            num_ops: 10
            insert_ratio: 1
            add_ratio: 0
            transition_to_updates_ratio: 0
            correct_lookup_ratio: 1
        "#;

        let profile: Profile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.name, "custom.txt");
        assert_eq!(profile.insert_ratio, 1.0);
        assert_eq!(profile.seed, None);
    }
}
