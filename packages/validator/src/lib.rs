// ABOUTME: Read-time audit of a generated SDLC dataset against its causal ordering rules
// ABOUTME: Reports violations per check and never repairs or fails

mod checks;
mod report;

use std::collections::BTreeMap;

use tracing::{debug, info};

use sdlcgen_core::{
    Bug, CicdEvent, CodeCommit, Dataset, DesignEvent, JiraItem, PrComment, Project, PullRequest,
    Sprint,
};

pub use report::ValidationReport;

// Check names
pub const DESIGN_SPRINT: &str = "design_sprint";
pub const SPRINT_JIRA: &str = "sprint_jira";
pub const COMMIT_JIRA: &str = "commit_jira";
pub const PR_COMMIT: &str = "pr_commit";
pub const CICD_PR: &str = "cicd_pr";
pub const BUG_BUILD: &str = "bug_build";
pub const JIRA_HIERARCHY: &str = "jira_hierarchy";
pub const JIRA_COMPLETION: &str = "jira_completion";

// Additional checks
pub const DESIGN_PHASE_ORDER: &str = "design_phase_order";
pub const CICD_CHAIN: &str = "cicd_chain";
pub const REFERENCES: &str = "references";

/// Every check the validator runs, in report order
pub const CHECKS: [&str; 11] = [
    DESIGN_SPRINT,
    SPRINT_JIRA,
    COMMIT_JIRA,
    PR_COMMIT,
    CICD_PR,
    BUG_BUILD,
    JIRA_HIERARCHY,
    JIRA_COMPLETION,
    DESIGN_PHASE_ORDER,
    CICD_CHAIN,
    REFERENCES,
];

/// Read access to a persisted or in-memory dataset
pub trait TimelineSource {
    fn projects(&self) -> &[Project];
    fn design_events(&self) -> &[DesignEvent];
    fn jira_items(&self) -> &[JiraItem];
    fn sprints(&self) -> &[Sprint];
    fn sprint_jira(&self) -> &BTreeMap<String, Vec<String>>;
    fn commits(&self) -> &[CodeCommit];
    fn pull_requests(&self) -> &[PullRequest];
    fn pr_comments(&self) -> &[PrComment];
    fn cicd_events(&self) -> &[CicdEvent];
    fn bugs(&self) -> &[Bug];
}

impl TimelineSource for Dataset {
    fn projects(&self) -> &[Project] {
        &self.projects
    }

    fn design_events(&self) -> &[DesignEvent] {
        &self.design_events
    }

    fn jira_items(&self) -> &[JiraItem] {
        &self.jira_items
    }

    fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    fn sprint_jira(&self) -> &BTreeMap<String, Vec<String>> {
        &self.sprint_jira
    }

    fn commits(&self) -> &[CodeCommit] {
        &self.commits
    }

    fn pull_requests(&self) -> &[PullRequest] {
        &self.pull_requests
    }

    fn pr_comments(&self) -> &[PrComment] {
        &self.pr_comments
    }

    fn cicd_events(&self) -> &[CicdEvent] {
        &self.cicd_events
    }

    fn bugs(&self) -> &[Bug] {
        &self.bugs
    }
}

/// Run every check. Each check name is always present; an empty list means the
/// invariant holds for the whole dataset.
pub fn validate<S: TimelineSource + ?Sized>(source: &S) -> ValidationReport {
    let mut report = ValidationReport::new();

    report.record(DESIGN_SPRINT, checks::design_sprint(source));
    report.record(SPRINT_JIRA, checks::sprint_jira(source));
    report.record(COMMIT_JIRA, checks::commit_jira(source));
    report.record(PR_COMMIT, checks::pr_commit(source));
    report.record(CICD_PR, checks::cicd_pr(source));
    report.record(BUG_BUILD, checks::bug_build(source));
    report.record(JIRA_HIERARCHY, checks::jira_hierarchy(source));
    report.record(JIRA_COMPLETION, checks::jira_completion(source));
    report.record(DESIGN_PHASE_ORDER, checks::design_phase_order(source));
    report.record(CICD_CHAIN, checks::cicd_chain(source));
    report.record(REFERENCES, checks::references(source));

    for (check, findings) in report.iter().filter(|(_, f)| !f.is_empty()) {
        debug!("{}: {} violations", check, findings.len());
    }
    info!(
        "Validated {} projects: {} violations",
        source.projects().len(),
        report.total()
    );
    report
}
