//! Configuration for the `kvtrace` command line.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line flags of the subcommand
//! 2. Environment variables (prefixed with `KVT__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `KVT__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `KVT__OUTPUT_DIR=/tmp/datasets` sets the output directory
//! - `KVT__SEED=42` fixes the seed of every profile that has none
//! - `KVT__LOGGING__LEVEL=debug` sets the log level
//!
//! # YAML Configuration File
//!
//! Profiles replace the built-in presets when given in the file:
//!
//! ```yaml
//! output_dir: datasets
//! seed: 42
//!
//! profiles:
//!   - name: tiny.txt
//!     num_ops: 1000
//!     insert_ratio: 0.5
//!     add_ratio: 0.8
//!     transition_to_updates_ratio: 0.8
//!     correct_lookup_ratio: 0.9
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use kvtrace_generator::Profile;
use kvtrace_generator::generator::DEFAULT_MAX_KEY_ATTEMPTS;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "KVT__";

/// Log output format.
///
/// The format can be explicitly specified or auto-detected based on whether logs go to a TTY.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Compact plain text output without colors.
    Simplified,

    /// Dump out JSON lines.
    Json,
}

/// The logging format parse error.
#[derive(Clone, Debug)]
pub struct FormatParseError(String);

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as format: expected one of "auto", "pretty", "simplified", "json""#,
            self.0
        )
    }
}

impl std::error::Error for FormatParseError {}

impl std::str::FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let result = match s {
            "" => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("auto") => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            s if s.eq_ignore_ascii_case("simplified") => LogFormat::Simplified,
            s if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            s => return Err(FormatParseError(s.into())),
        };

        Ok(result)
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
///
/// Logs are always written to stderr, trace records never are.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// The `RUST_LOG` environment variable takes precedence and provides more granular control
    /// per module if needed.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `KVT__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `Auto` (pretty for TTY, simplified otherwise)
    ///
    /// # Environment Variable
    ///
    /// `KVT__LOGGING__FORMAT`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Main configuration struct for the `kvtrace` command line.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory that traces are written into, one file per profile named after the profile.
    ///
    /// Created if it does not exist.
    ///
    /// # Default
    ///
    /// `datasets` (relative to the working directory)
    ///
    /// # Environment Variable
    ///
    /// `KVT__OUTPUT_DIR`
    pub output_dir: PathBuf,

    /// Seed for every profile that does not specify its own.
    ///
    /// Without a seed, each run draws a fresh one and logs it, so that it can be reproduced.
    ///
    /// # Environment Variable
    ///
    /// `KVT__SEED`
    pub seed: Option<u64>,

    /// Number of candidate keys drawn before a run gives up finding an unused key.
    ///
    /// # Default
    ///
    /// [`DEFAULT_MAX_KEY_ATTEMPTS`]
    ///
    /// # Environment Variable
    ///
    /// `KVT__MAX_KEY_ATTEMPTS`
    pub max_key_attempts: u32,

    /// The workload profiles to generate.
    ///
    /// # Default
    ///
    /// The benchmark presets, see [`Profile::presets`].
    pub profiles: Vec<Profile>,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("datasets"),
            seed: None,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
            profiles: Profile::presets(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Loads configuration from an optional YAML file and the environment.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if provided)
    /// 3. Environment variables (prefixed with `KVT__`)
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file cannot be read or parsed, or if environment variables
    /// contain invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Returns the configured profiles with the given names, in the order they were requested.
    ///
    /// An empty selection returns all profiles.
    pub fn select_profiles(&self, names: &[String]) -> Result<Vec<Profile>> {
        if names.is_empty() {
            return Ok(self.profiles.clone());
        }

        names
            .iter()
            .map(|name| {
                self.profiles
                    .iter()
                    .find(|profile| &profile.name == name)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("unknown profile `{name}`"))
            })
            .collect()
    }
}
