// ABOUTME: Status-driven policy tables: jira statuses, merge odds, build success rates, quality bands
// ABOUTME: All probabilities live here as named constants so callers can override them

use serde::{Deserialize, Serialize};

use crate::constants::MAIN_BRANCH;
use crate::types::{Environment, JiraStatus, ProjectStatus};

/// Which kind of jira item a status is being derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiraRole {
    Design,
    Epic,
    Story,
    Task,
}

/// Nominal status of a jira item, either fixed or drawn from weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusDraw {
    Fixed(JiraStatus),
    Weighted(&'static [(JiraStatus, f64)]),
}

/// Task mix for projects that are partway through implementation
pub const IN_PROGRESS_TASK_WEIGHTS: &[(JiraStatus, f64)] = &[
    (JiraStatus::Closed, 0.5),
    (JiraStatus::InProgress, 0.3),
    (JiraStatus::Open, 0.2),
];

pub fn jira_status_policy(status: ProjectStatus, role: JiraRole) -> StatusDraw {
    match (status, role) {
        (ProjectStatus::CodeComplete | ProjectStatus::Released | ProjectStatus::EndOfLife, _) => {
            StatusDraw::Fixed(JiraStatus::Closed)
        }
        (ProjectStatus::NotStarted, _) => StatusDraw::Fixed(JiraStatus::Open),
        (ProjectStatus::DesignPhaseComplete, JiraRole::Design) => {
            StatusDraw::Fixed(JiraStatus::Closed)
        }
        (ProjectStatus::DesignPhaseComplete, _) => StatusDraw::Fixed(JiraStatus::Open),
        // Design phases of an in-progress project have ended
        (ProjectStatus::InProgress, JiraRole::Design) => StatusDraw::Fixed(JiraStatus::Closed),
        (ProjectStatus::InProgress, JiraRole::Task) => StatusDraw::Weighted(IN_PROGRESS_TASK_WEIGHTS),
        (ProjectStatus::InProgress, _) => StatusDraw::Fixed(JiraStatus::InProgress),
    }
}

/// Base probability that a pull request merges, by project status
pub fn merge_probability(status: ProjectStatus) -> f64 {
    match status {
        ProjectStatus::EndOfLife => 1.0,
        ProjectStatus::Released => 0.9,
        ProjectStatus::CodeComplete => 0.8,
        ProjectStatus::DesignPhaseComplete => 0.6,
        ProjectStatus::InProgress => 0.4,
        ProjectStatus::NotStarted => 0.2,
    }
}

pub const DEFAULT_PR_CREATION_PROBABILITY: f64 = 0.6;

/// Extra discount applied to merges into any branch other than `main`
pub const DEFAULT_NON_MAIN_MERGE_DISCOUNT: f64 = 0.8;

pub const DEFAULT_TARGET_BRANCH_WEIGHTS: &[(&str, f64)] = &[
    ("main", 0.6),
    ("develop", 0.2),
    ("staging", 0.1),
    ("test", 0.1),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestPolicy {
    pub creation_probability: f64,
    pub non_main_merge_discount: f64,
    pub target_weights: Vec<(String, f64)>,
}

impl Default for PullRequestPolicy {
    fn default() -> Self {
        Self {
            creation_probability: DEFAULT_PR_CREATION_PROBABILITY,
            non_main_merge_discount: DEFAULT_NON_MAIN_MERGE_DISCOUNT,
            target_weights: DEFAULT_TARGET_BRANCH_WEIGHTS
                .iter()
                .map(|(branch, weight)| (branch.to_string(), *weight))
                .collect(),
        }
    }
}

impl PullRequestPolicy {
    /// Merge probability for a pull request targeting `branch_to`
    pub fn merge_probability(&self, status: ProjectStatus, branch_to: &str) -> f64 {
        let base = merge_probability(status);
        if branch_to == MAIN_BRANCH {
            base
        } else {
            base * self.non_main_merge_discount
        }
    }
}

/// Probability that an automatic build succeeds in an environment
pub fn build_success_rate(environment: Environment) -> f64 {
    match environment {
        Environment::Dev => 0.95,
        Environment::Qa => 0.90,
        Environment::Staging => 0.85,
        Environment::Production => 0.80,
    }
}

/// Commit quality band; tighter and higher the more complete the project
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityEnvelope {
    pub coverage: (f64, f64),
    pub lint_score: (f64, f64),
    pub review_minutes: (u32, u32),
}

pub fn quality_envelope(status: ProjectStatus) -> QualityEnvelope {
    match status {
        ProjectStatus::CodeComplete | ProjectStatus::Released | ProjectStatus::EndOfLife => {
            QualityEnvelope {
                coverage: (90.0, 98.0),
                lint_score: (95.0, 99.0),
                review_minutes: (10, 60),
            }
        }
        ProjectStatus::InProgress => QualityEnvelope {
            coverage: (85.0, 95.0),
            lint_score: (90.0, 98.0),
            review_minutes: (20, 90),
        },
        ProjectStatus::DesignPhaseComplete | ProjectStatus::NotStarted => QualityEnvelope {
            coverage: (75.0, 90.0),
            lint_score: (80.0, 95.0),
            review_minutes: (30, 120),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProjectStatus::Released, JiraRole::Task, StatusDraw::Fixed(JiraStatus::Closed))]
    #[case(ProjectStatus::EndOfLife, JiraRole::Epic, StatusDraw::Fixed(JiraStatus::Closed))]
    #[case(ProjectStatus::NotStarted, JiraRole::Design, StatusDraw::Fixed(JiraStatus::Open))]
    #[case(ProjectStatus::DesignPhaseComplete, JiraRole::Design, StatusDraw::Fixed(JiraStatus::Closed))]
    #[case(ProjectStatus::DesignPhaseComplete, JiraRole::Story, StatusDraw::Fixed(JiraStatus::Open))]
    #[case(ProjectStatus::InProgress, JiraRole::Epic, StatusDraw::Fixed(JiraStatus::InProgress))]
    #[case(ProjectStatus::InProgress, JiraRole::Task, StatusDraw::Weighted(IN_PROGRESS_TASK_WEIGHTS))]
    fn test_jira_status_policy(
        #[case] status: ProjectStatus,
        #[case] role: JiraRole,
        #[case] expected: StatusDraw,
    ) {
        assert_eq!(jira_status_policy(status, role), expected);
    }

    #[test]
    fn test_in_progress_weights_sum_to_one() {
        let total: f64 = IN_PROGRESS_TASK_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_main_discount() {
        let policy = PullRequestPolicy::default();
        let p = policy.merge_probability(ProjectStatus::InProgress, "develop");
        assert!((p - 0.32).abs() < 1e-9);
        assert_eq!(policy.merge_probability(ProjectStatus::InProgress, "main"), 0.4);

        let strict = PullRequestPolicy {
            non_main_merge_discount: 0.5,
            ..PullRequestPolicy::default()
        };
        assert_eq!(strict.merge_probability(ProjectStatus::EndOfLife, "staging"), 0.5);
    }

    #[test]
    fn test_success_rates_decrease_along_chain() {
        let rates: Vec<f64> = Environment::ALL.iter().map(|e| build_success_rate(*e)).collect();
        assert!(rates.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_quality_bands_tighten_with_completion() {
        let low = quality_envelope(ProjectStatus::NotStarted);
        let high = quality_envelope(ProjectStatus::Released);
        assert!(high.coverage.0 > low.coverage.0);
        assert!(high.review_minutes.1 < low.review_minutes.1);
    }
}
