// ABOUTME: Synthetic SDLC dataset generator with cross-entity timeline enforcement
// ABOUTME: Pure function from (seed, project catalog) to causally ordered entity lists

pub mod bugs;
pub mod cicd;
pub mod commits;
pub mod design;
pub mod enforcer;
pub mod pipeline;
pub mod pull_requests;
pub mod sampling;
pub mod sprints;
pub mod work_items;

// Re-export main types
pub use bugs::{sample_resolution_hours, BugGenerator};
pub use cicd::{has_full_main_success_chain, CicdEventGenerator};
pub use commits::CommitGenerator;
pub use design::{DesignOutput, DesignPhaseGenerator, PhaseWindow};
pub use enforcer::{EnforcementReport, TimelineEnforcer};
pub use pipeline::{generate, GenerationIssue, GenerationOutput, GeneratorConfig, Pipeline};
pub use pull_requests::{PullRequestGenerator, PullRequestOutput};
pub use sampling::IdMint;
pub use sprints::{sprint_number, sprint_window_start, SprintAssigner, SprintAssignment};
pub use work_items::{cascade_completion, WorkItemGenerator};
