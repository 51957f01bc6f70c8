// ABOUTME: Code commits anchored strictly after the completion of the jira they close
// ABOUTME: Volume and quality bands depend on how far along the project is

use rand::Rng;
use tracing::debug;

use sdlcgen_core::constants::MAIN_BRANCH;
use sdlcgen_core::policy::quality_envelope;
use sdlcgen_core::{CodeCommit, CommitType, JiraItem, Project, ProjectStatus};

use crate::sampling::{self, chance, weighted, IdMint};

pub const COMMIT_TYPE_WEIGHTS: &[(CommitType, f64)] = &[
    (CommitType::Feature, 0.4),
    (CommitType::Bugfix, 0.3),
    (CommitType::Refactor, 0.15),
    (CommitType::Docs, 0.1),
    (CommitType::Test, 0.05),
];

/// Share of commits pushed straight to main as hotfixes
pub const HOTFIX_PROBABILITY: f64 = 0.05;

pub const RESOLVED_COMMIT_COUNT: usize = 200;

pub fn commit_count<R: Rng + ?Sized>(rng: &mut R, status: ProjectStatus) -> usize {
    match status {
        ProjectStatus::NotStarted
        | ProjectStatus::CodeComplete
        | ProjectStatus::Released
        | ProjectStatus::EndOfLife => RESOLVED_COMMIT_COUNT,
        ProjectStatus::DesignPhaseComplete | ProjectStatus::InProgress => rng.gen_range(50..150),
    }
}

pub fn repository_name(project_id: &str) -> String {
    format!("{}-service", project_id.to_lowercase())
}

pub struct CommitGenerator;

impl CommitGenerator {
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mint: &mut IdMint,
        project: &Project,
        jira_items: &[JiraItem],
    ) -> Vec<CodeCommit> {
        let completed: Vec<&JiraItem> = jira_items
            .iter()
            .filter(|j| j.project_id == project.id && j.completed_date.is_some())
            .collect();

        if completed.is_empty() {
            debug!("{}: no completed jira items, skipping commits", project.id);
            return Vec::new();
        }

        let count = commit_count(rng, project.status);
        let envelope = quality_envelope(project.status);
        let repository = repository_name(&project.id);
        let mut commits = Vec::with_capacity(count);

        for _ in 0..count {
            let jira = completed[rng.gen_range(0..completed.len())];
            let Some(done) = jira.completed_date else {
                continue;
            };

            let branch = if chance(rng, HOTFIX_PROBABILITY) {
                MAIN_BRANCH.to_string()
            } else {
                format!("feature/{}", jira.id.to_lowercase())
            };

            commits.push(CodeCommit {
                id: mint.hex(rng, "commit_"),
                project_id: project.id.clone(),
                jira_id: jira.id.clone(),
                repository: repository.clone(),
                branch,
                author: sampling::author(rng),
                commit_hash: sampling::commit_hash(rng),
                commit_type: weighted(rng, COMMIT_TYPE_WEIGHTS)
                    .copied()
                    .unwrap_or(CommitType::Feature),
                timestamp: done + sampling::minutes(rng, 5, 60),
                files_changed: rng.gen_range(1..=20),
                lines_added: rng.gen_range(10..=500),
                lines_removed: rng.gen_range(5..=300),
                code_coverage: round2(rng.gen_range(envelope.coverage.0..envelope.coverage.1)),
                lint_score: round2(rng.gen_range(envelope.lint_score.0..envelope.lint_score.1)),
                review_time_minutes: rng
                    .gen_range(envelope.review_minutes.0..=envelope.review_minutes.1),
                comments_count: rng.gen_range(0..=10),
            });
        }

        debug!("{}: {} commits", project.id, commits.len());
        commits
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sdlcgen_core::constants::base_start_date;
    use sdlcgen_core::{JiraStatus, JiraType, ProjectCatalog};
    use std::collections::HashMap;

    fn project(status: &str) -> Project {
        let mut entry = ProjectCatalog::default_catalog().entries()[0].clone();
        entry.status = status.to_string();
        entry.resolve().unwrap()
    }

    fn jira(id: &str, done: Option<i64>) -> JiraItem {
        JiraItem {
            id: id.to_string(),
            project_id: "PRJ-001".to_string(),
            parent_id: None,
            item_type: JiraType::Task,
            title: id.to_string(),
            status: if done.is_some() { JiraStatus::Closed } else { JiraStatus::Open },
            created_date: base_start_date(),
            completed_date: done.map(|h| base_start_date() + Duration::hours(h)),
            story_points: 2,
            estimated_hours: None,
            actual_hours: None,
            assigned_developer: "dev1@example.com".to_string(),
            design_type: None,
        }
    }

    #[test]
    fn test_commits_follow_jira_completion() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut mint = IdMint::new();
        let items = vec![jira("PRJ-001-E1-S1-T1", Some(10)), jira("PRJ-001-E1-S1-T2", None)];
        let commits = CommitGenerator.generate(&mut rng, &mut mint, &project("RELEASED"), &items);

        assert_eq!(commits.len(), RESOLVED_COMMIT_COUNT);
        let by_id: HashMap<&str, &JiraItem> = items.iter().map(|j| (j.id.as_str(), j)).collect();
        for commit in &commits {
            let done = by_id[commit.jira_id.as_str()].completed_date.unwrap();
            assert!(commit.timestamp > done);
            assert!(commit.timestamp - done <= Duration::minutes(60));
            assert_eq!(commit.jira_id, "PRJ-001-E1-S1-T1");
            assert!(commit.code_coverage >= 90.0 && commit.code_coverage <= 98.0);
        }
    }

    #[test]
    fn test_no_completed_jiras_means_no_commits() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut mint = IdMint::new();
        let items = vec![jira("PRJ-001-E1", None)];
        let commits = CommitGenerator.generate(&mut rng, &mut mint, &project("IN_PROGRESS"), &items);
        assert!(commits.is_empty());
    }

    #[test]
    fn test_partial_projects_draw_between_50_and_150() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            let n = commit_count(&mut rng, ProjectStatus::InProgress);
            assert!((50..150).contains(&n));
        }
        assert_eq!(commit_count(&mut rng, ProjectStatus::EndOfLife), 200);
    }

    #[test]
    fn test_branches() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut mint = IdMint::new();
        let items = vec![jira("PRJ-001-E1-S1-T1", Some(1))];
        let commits = CommitGenerator.generate(&mut rng, &mut mint, &project("CODE_COMPLETE"), &items);
        assert!(commits
            .iter()
            .all(|c| c.branch == "main" || c.branch == "feature/prj-001-e1-s1-t1"));
        assert!(commits.iter().any(|c| c.branch != "main"));
    }
}
