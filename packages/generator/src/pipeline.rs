// ABOUTME: Generation pipeline chaining every generator per project, then the enforcer
// ABOUTME: Failures are isolated per project and reported alongside the data

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sdlcgen_core::{
    ComplexityModel, Dataset, GenerationError, GenerationResult, GenerationStage,
    InvariantViolation, Project, ProjectCatalog, ProjectStatus, PullRequestPolicy, DEFAULT_SEED,
};

use crate::bugs::BugGenerator;
use crate::cicd::CicdEventGenerator;
use crate::commits::CommitGenerator;
use crate::design::DesignPhaseGenerator;
use crate::enforcer::{EnforcementReport, TimelineEnforcer};
use crate::pull_requests::PullRequestGenerator;
use crate::sampling::IdMint;
use crate::sprints::SprintAssigner;
use crate::work_items::WorkItemGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub pull_requests: PullRequestPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            pull_requests: PullRequestPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// A per-project warning returned with the generated data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationIssue {
    pub project_id: String,
    pub stage: GenerationStage,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub dataset: Dataset,
    pub issues: Vec<GenerationIssue>,
    pub enforcement: EnforcementReport,
}

impl GenerationOutput {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Generate the full dataset for a catalog from a single seeded RNG
pub fn generate(config: &GeneratorConfig, catalog: &ProjectCatalog) -> GenerationOutput {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut mint = IdMint::new();
    let pipeline = Pipeline::new(config);
    let mut output = GenerationOutput::default();

    info!(
        "Generating SDLC dataset for {} projects (seed {})",
        catalog.len(),
        config.seed
    );

    for entry in catalog.entries() {
        let project = match entry.resolve() {
            Ok(project) => project,
            Err(e) => {
                warn!("Skipping project {}: {}", entry.id, e);
                output.issues.push(GenerationIssue {
                    project_id: entry.id.clone(),
                    stage: GenerationStage::Catalog,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let (slice, report, failure) = pipeline.run_project(&mut rng, &mut mint, project);
        if let Some(e) = failure {
            warn!("Project {} truncated at {}: {}", entry.id, e.stage(), e);
            output.issues.push(GenerationIssue {
                project_id: entry.id.clone(),
                stage: e.stage(),
                message: e.to_string(),
            });
        }
        output.enforcement.sprints += report.sprints;
        output.enforcement.commits += report.commits;
        output.enforcement.pull_requests += report.pull_requests;
        output.enforcement.cicd_events += report.cicd_events;
        output.enforcement.bugs += report.bugs;
        output.dataset.extend(slice);
    }

    let counts = output.dataset.counts();
    info!(
        "Generated {} jira items, {} commits, {} pull requests, {} builds, {} bugs",
        counts.jira_items, counts.commits, counts.pull_requests, counts.cicd_events, counts.bugs
    );
    output
}

pub struct Pipeline {
    pull_requests: PullRequestGenerator,
}

impl Pipeline {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            pull_requests: PullRequestGenerator::new(config.pull_requests.clone()),
        }
    }

    /// Run every stage for one project. On failure the failing stage and everything
    /// downstream of it is dropped from the returned slice.
    pub fn run_project(
        &self,
        rng: &mut StdRng,
        mint: &mut IdMint,
        project: Project,
    ) -> (Dataset, EnforcementReport, Option<GenerationError>) {
        let mut slice = Dataset {
            projects: vec![project],
            ..Dataset::default()
        };

        match self.fill(rng, mint, &mut slice) {
            Ok(report) => (slice, report, None),
            Err(e) => {
                slice.clear_from(e.stage());
                (slice, EnforcementReport::default(), Some(e))
            }
        }
    }

    fn fill(
        &self,
        rng: &mut StdRng,
        mint: &mut IdMint,
        slice: &mut Dataset,
    ) -> GenerationResult<EnforcementReport> {
        let project = slice.projects[0].clone();
        let profile = ComplexityModel::profile(project.complexity);

        let design = DesignPhaseGenerator.generate(rng, &project, &profile);
        slice.design_events = design.events;
        slice.jira_items = design.jira_items;
        slice.projects[0].design_completed_at = design.completed_at;

        let Some(design_done) = design.completed_at else {
            if project.status == ProjectStatus::NotStarted {
                return Ok(EnforcementReport::default());
            }
            return Err(GenerationError::invariant(
                GenerationStage::WorkItems,
                InvariantViolation::MissingTimestamp {
                    entity: "project",
                    id: project.id.clone(),
                    field: "design_completed_at",
                },
            ));
        };
        let project = slice.projects[0].clone();

        let work_items = WorkItemGenerator.generate(rng, &project, &profile.fanout, design_done);
        let assignment = SprintAssigner.assign(&project, &work_items, design_done);
        slice.jira_items.extend(work_items);
        slice.sprints = assignment.sprints;
        slice.sprint_jira = assignment.sprint_jira;

        slice.commits = CommitGenerator.generate(rng, mint, &project, &slice.jira_items);

        let prs = self
            .pull_requests
            .generate(rng, mint, &project, &slice.commits);
        slice.pull_requests = prs.pull_requests;
        slice.pr_comments = prs.comments;

        slice.cicd_events = CicdEventGenerator.generate(rng, mint, &project, &slice.pull_requests);
        slice.bugs = BugGenerator.generate(rng, &project, &slice.cicd_events);

        TimelineEnforcer
            .enforce(slice)
            .map_err(|e| GenerationError::invariant(GenerationStage::Enforcement, e))
    }
}
