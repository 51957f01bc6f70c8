// ABOUTME: Error taxonomy for generation
// ABOUTME: Configuration errors and invariant violations are per-project and never abort a batch

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An unknown or malformed value reached the complexity model or a policy table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid complexity: {0}")]
    InvalidComplexity(String),

    #[error("Invalid project status: {0}")]
    InvalidProjectStatus(String),

    #[error("Invalid {kind} value: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// A timeline repair is impossible because a dependency carries no timestamp
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("{entity} {id} references missing {dependency}")]
    MissingDependency {
        entity: &'static str,
        id: String,
        dependency: String,
    },

    #[error("{entity} {id} has no {field} to anchor its dependents")]
    MissingTimestamp {
        entity: &'static str,
        id: String,
        field: &'static str,
    },
}

/// Pipeline stage in which a project failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Catalog,
    Design,
    WorkItems,
    Sprints,
    Commits,
    PullRequests,
    Cicd,
    Bugs,
    Enforcement,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStage::Catalog => "catalog",
            GenerationStage::Design => "design",
            GenerationStage::WorkItems => "work_items",
            GenerationStage::Sprints => "sprints",
            GenerationStage::Commits => "commits",
            GenerationStage::PullRequests => "pull_requests",
            GenerationStage::Cicd => "cicd",
            GenerationStage::Bugs => "bugs",
            GenerationStage::Enforcement => "enforcement",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("{stage}: {source}")]
    Configuration {
        stage: GenerationStage,
        #[source]
        source: ConfigurationError,
    },

    #[error("{stage}: {source}")]
    Invariant {
        stage: GenerationStage,
        #[source]
        source: InvariantViolation,
    },
}

impl GenerationError {
    pub fn configuration(stage: GenerationStage, source: ConfigurationError) -> Self {
        GenerationError::Configuration { stage, source }
    }

    pub fn invariant(stage: GenerationStage, source: InvariantViolation) -> Self {
        GenerationError::Invariant { stage, source }
    }

    pub fn stage(&self) -> GenerationStage {
        match self {
            GenerationError::Configuration { stage, .. } | GenerationError::Invariant { stage, .. } => {
                *stage
            }
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
