// ABOUTME: Core types, complexity model and policy tables for sdlcgen
// ABOUTME: Foundational package shared by the generator, validator, storage and CLI

pub mod cache;
pub mod catalog;
pub mod complexity;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod policy;
pub mod types;

// Re-export main types
pub use types::{
    Bug, BugStatus, BugType, BuildMode, BuildStatus, CicdEvent, CodeCommit, CommitType,
    Complexity, DesignEvent, DesignStage, DesignType, Environment, ImpactArea, JiraItem,
    JiraStatus, JiraType, PrComment, PrStatus, Project, ProjectStatus, PullRequest, Sprint,
};

pub use cache::{DateRange, DateRangeCache};
pub use catalog::{CatalogEntry, ProjectCatalog};
pub use complexity::{ComplexityModel, ComplexityProfile, Fanout};
pub use dataset::{Dataset, DatasetCounts};
pub use error::{
    ConfigurationError, GenerationError, GenerationResult, GenerationStage, InvariantViolation,
};
pub use policy::{PullRequestPolicy, QualityEnvelope};

// Re-export constants
pub use constants::{base_start_date, DEFAULT_SEED, SPRINT_LENGTH_DAYS};
