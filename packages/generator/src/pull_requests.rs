// ABOUTME: Pull requests grouped from feature-branch commits, with review comments
// ABOUTME: Outcome odds come from the project status and the target branch

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use sdlcgen_core::constants::{is_protected_branch, MAIN_BRANCH};
use sdlcgen_core::{CodeCommit, PrComment, PrStatus, Project, ProjectStatus, PullRequest, PullRequestPolicy};

use crate::sampling::{self, chance, weighted, IdMint};

pub const COMMENT_TEMPLATES: &[&str] = &[
    "Please review the changes in file_{num}",
    "I've addressed the previous comments",
    "LGTM",
    "Can you add more tests?",
    "Consider refactoring this part",
    "The changes look good, but needs documentation",
    "This might impact performance",
    "Approved after addressing comments",
    "Need to fix the failing tests",
    "Should we add logging here?",
];

#[derive(Debug, Clone, Default)]
pub struct PullRequestOutput {
    pub pull_requests: Vec<PullRequest>,
    pub comments: Vec<PrComment>,
}

pub struct PullRequestGenerator {
    policy: PullRequestPolicy,
}

impl PullRequestGenerator {
    pub fn new(policy: PullRequestPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PullRequestPolicy {
        &self.policy
    }

    /// MERGED with the policy's merge probability, otherwise BLOCKED or OPEN evenly
    pub fn draw_status<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        project_status: ProjectStatus,
        branch_to: &str,
    ) -> PrStatus {
        if chance(rng, self.policy.merge_probability(project_status, branch_to)) {
            PrStatus::Merged
        } else if rng.gen_bool(0.5) {
            PrStatus::Blocked
        } else {
            PrStatus::Open
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mint: &mut IdMint,
        project: &Project,
        commits: &[CodeCommit],
    ) -> PullRequestOutput {
        let mut groups: BTreeMap<&str, Vec<&CodeCommit>> = BTreeMap::new();
        for commit in commits.iter().filter(|c| c.project_id == project.id) {
            if !is_protected_branch(&commit.branch) {
                groups.entry(commit.branch.as_str()).or_default().push(commit);
            }
        }

        let mut output = PullRequestOutput::default();

        for (branch, mut group) in groups {
            if !chance(rng, self.policy.creation_probability) {
                continue;
            }
            group.sort_by_key(|c| c.timestamp);
            let Some(last) = group.last() else {
                continue;
            };

            let branch_to = weighted(rng, &self.policy.target_weights)
                .cloned()
                .unwrap_or_else(|| MAIN_BRANCH.to_string());
            let status = self.draw_status(rng, project.status, &branch_to);

            let created_at = last.timestamp + sampling::minutes(rng, 5, 30);
            let review_started_at = created_at + sampling::hours(rng, 1, 24);
            let merged_at = (status == PrStatus::Merged)
                .then(|| review_started_at + sampling::hours(rng, 2, 48));

            let pr = PullRequest {
                id: mint.hex(rng, "PR-"),
                project_id: project.id.clone(),
                title: format!("{}: {}", group[0].commit_type, branch),
                branch_from: branch.to_string(),
                branch_to,
                author: group[0].author.clone(),
                status,
                created_at,
                review_started_at,
                merged_at,
                commit_ids: group.iter().map(|c| c.id.clone()).collect(),
                last_commit_at: last.timestamp,
            };

            let max_file = group.iter().map(|c| c.files_changed).max().unwrap_or(1).max(1);
            output
                .comments
                .extend(self.comments(rng, mint, &pr, max_file));
            output.pull_requests.push(pr);
        }

        debug!(
            "{}: {} pull requests, {} merged",
            project.id,
            output.pull_requests.len(),
            output
                .pull_requests
                .iter()
                .filter(|p| p.status == PrStatus::Merged)
                .count()
        );
        output
    }

    /// Review comments every 1–8 hours from review start, never past the merge
    fn comments<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mint: &mut IdMint,
        pr: &PullRequest,
        max_file: u32,
    ) -> Vec<PrComment> {
        let count = rng.gen_range(2..8);
        let mut at = pr.review_started_at;
        let mut comments = Vec::with_capacity(count);

        for _ in 0..count {
            at += sampling::hours(rng, 1, 8);
            if pr.merged_at.is_some_and(|merged| at > merged) {
                break;
            }

            let template = sampling::pick(rng, COMMENT_TEMPLATES)
                .copied()
                .unwrap_or(COMMENT_TEMPLATES[0]);
            let content = if template.contains("{num}") {
                template.replace("{num}", &rng.gen_range(1..=max_file).to_string())
            } else {
                template.to_string()
            };

            comments.push(PrComment {
                id: mint.hex(rng, "COM-"),
                pr_id: pr.id.clone(),
                author: sampling::reviewer(rng),
                content,
                created_at: at,
            });
        }
        comments
    }
}

impl Default for PullRequestGenerator {
    fn default() -> Self {
        Self::new(PullRequestPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sdlcgen_core::constants::base_start_date;
    use sdlcgen_core::{CommitType, ProjectCatalog};

    fn project(status: &str) -> Project {
        let mut entry = ProjectCatalog::default_catalog().entries()[0].clone();
        entry.status = status.to_string();
        entry.resolve().unwrap()
    }

    fn commit(id: &str, branch: &str, minutes: i64) -> CodeCommit {
        CodeCommit {
            id: id.to_string(),
            project_id: "PRJ-001".to_string(),
            jira_id: "PRJ-001-E1".to_string(),
            repository: "prj-001-service".to_string(),
            branch: branch.to_string(),
            author: "dev2@example.com".to_string(),
            commit_hash: "0".repeat(40),
            commit_type: CommitType::Feature,
            timestamp: base_start_date() + Duration::minutes(minutes),
            files_changed: 4,
            lines_added: 10,
            lines_removed: 5,
            code_coverage: 90.0,
            lint_score: 95.0,
            review_time_minutes: 30,
            comments_count: 0,
        }
    }

    #[test]
    fn test_scenario_develop_in_progress_merge_ratio() {
        let generator = PullRequestGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 10_000;
        let merged = (0..n)
            .filter(|_| generator.draw_status(&mut rng, ProjectStatus::InProgress, "develop") == PrStatus::Merged)
            .count();
        let ratio = merged as f64 / n as f64;
        assert!((ratio - 0.32).abs() < 0.02, "merge ratio {ratio}");
    }

    #[test]
    fn test_protected_branches_are_not_grouped() {
        let policy = PullRequestPolicy {
            creation_probability: 1.0,
            ..PullRequestPolicy::default()
        };
        let generator = PullRequestGenerator::new(policy);
        let commits = vec![
            commit("c1", "main", 10),
            commit("c2", "release/1.0", 20),
            commit("c3", "feature/a", 30),
            commit("c4", "feature/a", 90),
            commit("c5", "feature/b", 40),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let mut mint = IdMint::new();
        let out = generator.generate(&mut rng, &mut mint, &project("RELEASED"), &commits);

        assert_eq!(out.pull_requests.len(), 2);
        let a = out.pull_requests.iter().find(|p| p.branch_from == "feature/a").unwrap();
        assert_eq!(a.commit_ids, vec!["c3".to_string(), "c4".to_string()]);
        assert_eq!(a.last_commit_at, base_start_date() + Duration::minutes(90));
        assert!(a.created_at > a.last_commit_at);
    }

    #[test]
    fn test_pr_timeline_and_comments() {
        let policy = PullRequestPolicy {
            creation_probability: 1.0,
            ..PullRequestPolicy::default()
        };
        let generator = PullRequestGenerator::new(policy);
        let commits: Vec<CodeCommit> = (0..60)
            .map(|i| commit(&format!("c{i}"), &format!("feature/{}", i % 30), i * 7))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut mint = IdMint::new();
        let out = generator.generate(&mut rng, &mut mint, &project("END_OF_LIFE"), &commits);

        assert_eq!(out.pull_requests.len(), 30);
        for pr in &out.pull_requests {
            assert!(pr.review_started_at > pr.created_at);
            if pr.branch_to == "main" {
                // END_OF_LIFE merges everything into main
                assert_eq!(pr.status, PrStatus::Merged);
            }
            if let Some(merged) = pr.merged_at {
                assert!(merged > pr.created_at);
            }
            let comments: Vec<&PrComment> = out.comments.iter().filter(|c| c.pr_id == pr.id).collect();
            assert!(comments.len() < 8);
            for c in comments {
                assert!(c.created_at > pr.review_started_at);
                if let Some(merged) = pr.merged_at {
                    assert!(c.created_at <= merged);
                }
            }
        }
    }
}
