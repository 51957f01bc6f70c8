use std::env;
use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use sdlcgen_core::policy::{DEFAULT_NON_MAIN_MERGE_DISCOUNT, DEFAULT_PR_CREATION_PROBABILITY};
use sdlcgen_core::{PullRequestPolicy, DEFAULT_SEED};

use crate::constants::{
    SDLC_CATALOG_PATH, SDLC_DATABASE_PATH, SDLC_NON_MAIN_MERGE_DISCOUNT, SDLC_OUTPUT_PATH,
    SDLC_PR_CREATION_PROBABILITY, SDLC_SEED,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid seed: {0}")]
    InvalidSeed(#[from] ParseIntError),
    #[error("Invalid value for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        #[source]
        source: ParseFloatError,
    },
    #[error("{name} must be a probability between 0 and 1, got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub seed: u64,
    pub catalog_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub pr_creation_probability: f64,
    pub non_main_merge_discount: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            catalog_path: None,
            database_path: None,
            output_path: None,
            pr_creation_probability: DEFAULT_PR_CREATION_PROBABILITY,
            non_main_merge_discount: DEFAULT_NON_MAIN_MERGE_DISCOUNT,
        }
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn probability_var(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|source| ConfigError::InvalidNumber { name, source })?;
    check_probability(name, value)
}

/// Reject anything outside `[0, 1]`, NaN included
pub fn check_probability(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = env::var(SDLC_SEED)
            .unwrap_or_else(|_| DEFAULT_SEED.to_string())
            .trim()
            .parse::<u64>()?;

        let settings = Settings {
            seed,
            catalog_path: path_var(SDLC_CATALOG_PATH),
            database_path: path_var(SDLC_DATABASE_PATH),
            output_path: path_var(SDLC_OUTPUT_PATH),
            pr_creation_probability: probability_var(
                SDLC_PR_CREATION_PROBABILITY,
                DEFAULT_PR_CREATION_PROBABILITY,
            )?,
            non_main_merge_discount: probability_var(
                SDLC_NON_MAIN_MERGE_DISCOUNT,
                DEFAULT_NON_MAIN_MERGE_DISCOUNT,
            )?,
        };
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// The pull request policy with any probability overrides applied
    pub fn pull_request_policy(&self) -> PullRequestPolicy {
        PullRequestPolicy {
            creation_probability: self.pr_creation_probability,
            non_main_merge_discount: self.non_main_merge_discount,
            ..PullRequestPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL: [&str; 6] = [
        SDLC_SEED,
        SDLC_CATALOG_PATH,
        SDLC_DATABASE_PATH,
        SDLC_OUTPUT_PATH,
        SDLC_PR_CREATION_PROBABILITY,
        SDLC_NON_MAIN_MERGE_DISCOUNT,
    ];

    fn clear() {
        for name in ALL {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.pull_request_policy(), PullRequestPolicy::default());
    }

    #[test]
    #[serial]
    fn test_overrides_from_env() {
        clear();
        env::set_var(SDLC_SEED, "7");
        env::set_var(SDLC_DATABASE_PATH, "out/sdlc.db");
        env::set_var(SDLC_OUTPUT_PATH, "  ");
        env::set_var(SDLC_NON_MAIN_MERGE_DISCOUNT, "0.5");

        let settings = Settings::from_env().unwrap();
        clear();

        assert_eq!(settings.seed, 7);
        assert_eq!(settings.database_path, Some(PathBuf::from("out/sdlc.db")));
        assert_eq!(settings.output_path, None);
        assert_eq!(settings.pull_request_policy().non_main_merge_discount, 0.5);
        assert_eq!(
            settings.pull_request_policy().creation_probability,
            DEFAULT_PR_CREATION_PROBABILITY
        );
    }

    #[test]
    #[serial]
    fn test_rejects_bad_values() {
        clear();
        env::set_var(SDLC_SEED, "forty-two");
        assert!(matches!(Settings::from_env(), Err(ConfigError::InvalidSeed(_))));

        clear();
        env::set_var(SDLC_PR_CREATION_PROBABILITY, "1.5");
        let err = Settings::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ProbabilityOutOfRange {
                name: SDLC_PR_CREATION_PROBABILITY,
                ..
            }
        ));

        clear();
        env::set_var(SDLC_NON_MAIN_MERGE_DISCOUNT, "high");
        assert!(matches!(
            Settings::from_env(),
            Err(ConfigError::InvalidNumber { .. })
        ));
        clear();
    }

    #[test]
    fn test_check_probability_rejects_nan() {
        assert!(check_probability("p", f64::NAN).is_err());
        assert_eq!(check_probability("p", 0.0).unwrap(), 0.0);
        assert_eq!(check_probability("p", 1.0).unwrap(), 1.0);
    }
}
