// ABOUTME: Timeline enforcement pass pulling lagging entities forward past their dependencies
// ABOUTME: Repairs sprints, commits, PRs, CI/CD chains and bugs; fails when a dependency has no timestamp

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use sdlcgen_core::{BuildMode, CicdEvent, Dataset, InvariantViolation};

/// Minimum gap kept between a repaired entity and its dependency
pub const ENFORCEMENT_GAP_MINUTES: i64 = 1;

fn gap() -> Duration {
    Duration::minutes(ENFORCEMENT_GAP_MINUTES)
}

/// How many records of each kind had to be moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnforcementReport {
    pub sprints: usize,
    pub commits: usize,
    pub pull_requests: usize,
    pub cicd_events: usize,
    pub bugs: usize,
}

impl EnforcementReport {
    pub fn total(&self) -> usize {
        self.sprints + self.commits + self.pull_requests + self.cicd_events + self.bugs
    }
}

pub struct TimelineEnforcer;

impl TimelineEnforcer {
    /// Enforce every dependency edge in place. Safe to re-run; a consistent
    /// dataset comes back unchanged with an all-zero report.
    pub fn enforce(&self, dataset: &mut Dataset) -> Result<EnforcementReport, InvariantViolation> {
        let mut report = EnforcementReport {
            sprints: self.enforce_sprints(dataset)?,
            ..EnforcementReport::default()
        };
        report.commits = self.enforce_commits(dataset)?;
        report.pull_requests = self.enforce_pull_requests(dataset)?;
        report.cicd_events = self.enforce_cicd(dataset)?;
        report.bugs = self.enforce_bugs(dataset)?;

        if report.total() > 0 {
            info!("Timeline enforcement moved {} records", report.total());
        } else {
            debug!("Timeline enforcement: dataset already consistent");
        }
        Ok(report)
    }

    /// Sprints start no earlier than design completion, and cover the creation
    /// and completion of every jira associated with them
    fn enforce_sprints(&self, dataset: &mut Dataset) -> Result<usize, InvariantViolation> {
        let design_done: HashMap<&str, Option<DateTime<Utc>>> = dataset
            .projects
            .iter()
            .map(|p| (p.id.as_str(), p.design_completed_at))
            .collect();
        let jiras: HashMap<&str, (DateTime<Utc>, Option<DateTime<Utc>>)> = dataset
            .jira_items
            .iter()
            .map(|j| (j.id.as_str(), (j.created_date, j.completed_date)))
            .collect();
        let sprint_index: HashMap<String, usize> = dataset
            .sprints
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let mut moved = vec![false; dataset.sprints.len()];

        for (i, sprint) in dataset.sprints.iter_mut().enumerate() {
            let done = design_done
                .get(sprint.project_id.as_str())
                .ok_or_else(|| InvariantViolation::MissingDependency {
                    entity: "sprint",
                    id: sprint.id.clone(),
                    dependency: format!("project {}", sprint.project_id),
                })?
                .ok_or_else(|| InvariantViolation::MissingTimestamp {
                    entity: "project",
                    id: sprint.project_id.clone(),
                    field: "design_completed_at",
                })?;
            if sprint.start_date < done {
                sprint.start_date = done;
                moved[i] = true;
            }
        }

        // Earliest and latest sprint of every associated jira
        let mut spans: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for (sprint_id, jira_ids) in &dataset.sprint_jira {
            let idx = *sprint_index.get(sprint_id).ok_or_else(|| InvariantViolation::MissingDependency {
                entity: "sprint association",
                id: sprint_id.clone(),
                dependency: format!("sprint {}", sprint_id),
            })?;
            for jira_id in jira_ids {
                if !jiras.contains_key(jira_id.as_str()) {
                    return Err(InvariantViolation::MissingDependency {
                        entity: "sprint association",
                        id: sprint_id.clone(),
                        dependency: format!("jira item {}", jira_id),
                    });
                }
                let sprints = &dataset.sprints;
                spans
                    .entry(jira_id.as_str())
                    .and_modify(|(first, last)| {
                        if sprints[idx].start_date < sprints[*first].start_date {
                            *first = idx;
                        }
                        if sprints[idx].end_date > sprints[*last].end_date {
                            *last = idx;
                        }
                    })
                    .or_insert((idx, idx));
            }
        }

        for (jira_id, (first, last)) in spans {
            let (created, completed) = jiras[jira_id];
            let floor = design_done
                .get(dataset.sprints[first].project_id.as_str())
                .copied()
                .flatten()
                .unwrap_or(created);
            let target = created.max(floor);
            let first_sprint = &mut dataset.sprints[first];
            if first_sprint.start_date > target {
                first_sprint.start_date = target;
                moved[first] = true;
            }
            if let Some(completed) = completed {
                let last_sprint = &mut dataset.sprints[last];
                if last_sprint.end_date < completed {
                    last_sprint.end_date = completed;
                    moved[last] = true;
                }
            }
        }

        Ok(moved.into_iter().filter(|m| *m).count())
    }

    fn enforce_commits(&self, dataset: &mut Dataset) -> Result<usize, InvariantViolation> {
        let completed: HashMap<&str, Option<DateTime<Utc>>> = dataset
            .jira_items
            .iter()
            .map(|j| (j.id.as_str(), j.completed_date))
            .collect();

        let mut moved = 0;
        for commit in &mut dataset.commits {
            let done = completed
                .get(commit.jira_id.as_str())
                .ok_or_else(|| InvariantViolation::MissingDependency {
                    entity: "commit",
                    id: commit.id.clone(),
                    dependency: format!("jira item {}", commit.jira_id),
                })?
                .ok_or_else(|| InvariantViolation::MissingTimestamp {
                    entity: "jira item",
                    id: commit.jira_id.clone(),
                    field: "completed_date",
                })?;
            if commit.timestamp <= done {
                commit.timestamp = done + gap();
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// PRs move as a whole: review start, merge and comments shift by the same delta
    fn enforce_pull_requests(&self, dataset: &mut Dataset) -> Result<usize, InvariantViolation> {
        let commit_times: HashMap<&str, DateTime<Utc>> = dataset
            .commits
            .iter()
            .map(|c| (c.id.as_str(), c.timestamp))
            .collect();

        let mut shifts: HashMap<String, Duration> = HashMap::new();
        let mut moved = 0;

        for pr in &mut dataset.pull_requests {
            let mut last: Option<DateTime<Utc>> = None;
            for commit_id in &pr.commit_ids {
                let ts = commit_times.get(commit_id.as_str()).ok_or_else(|| {
                    InvariantViolation::MissingDependency {
                        entity: "pull request",
                        id: pr.id.clone(),
                        dependency: format!("commit {}", commit_id),
                    }
                })?;
                last = Some(last.map_or(*ts, |l| l.max(*ts)));
            }
            let last = last.ok_or_else(|| InvariantViolation::MissingTimestamp {
                entity: "pull request",
                id: pr.id.clone(),
                field: "last_commit_at",
            })?;

            let mut changed = pr.last_commit_at != last;
            pr.last_commit_at = last;

            if pr.created_at <= last {
                let delta = (last + gap()) - pr.created_at;
                pr.created_at += delta;
                pr.review_started_at += delta;
                pr.merged_at = pr.merged_at.map(|m| m + delta);
                shifts.insert(pr.id.clone(), delta);
                changed = true;
            }
            if let Some(merged) = pr.merged_at {
                if merged <= pr.created_at {
                    pr.merged_at = Some(pr.created_at + gap());
                    changed = true;
                }
            }
            if changed {
                moved += 1;
            }
        }

        for comment in &mut dataset.pr_comments {
            if let Some(delta) = shifts.get(&comment.pr_id) {
                comment.created_at += *delta;
            }
        }
        Ok(moved)
    }

    /// Automatic chains are walked in environment order, each stage after the previous
    /// one; PR-driven chains start after the merge
    fn enforce_cicd(&self, dataset: &mut Dataset) -> Result<usize, InvariantViolation> {
        let merges: HashMap<&str, Option<DateTime<Utc>>> = dataset
            .pull_requests
            .iter()
            .map(|pr| (pr.id.as_str(), pr.merged_at))
            .collect();

        let mut chains: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut moved = 0;

        for (i, event) in dataset.cicd_events.iter().enumerate() {
            if event.mode != BuildMode::Automatic {
                continue;
            }
            match &event.chain_id {
                Some(chain) => chains.entry(chain.clone()).or_default().push(i),
                None => chains.entry(event.id.clone()).or_default().push(i),
            }
        }

        for indices in chains.values_mut() {
            let events = &dataset.cicd_events;
            indices.sort_by_key(|i| events[*i].environment.position());

            let mut previous = match &dataset.cicd_events[indices[0]].pr_id {
                Some(pr_id) => Some(pr_anchor(&merges, &dataset.cicd_events[indices[0]], pr_id)?),
                None => None,
            };

            for i in indices.iter() {
                let event = &mut dataset.cicd_events[*i];
                if let Some(prev) = previous {
                    if event.timestamp <= prev {
                        event.timestamp = prev + gap();
                        moved += 1;
                    }
                }
                previous = Some(event.timestamp);
            }
        }
        Ok(moved)
    }

    /// Bugs follow their build; resolution and closure shift by the same delta
    fn enforce_bugs(&self, dataset: &mut Dataset) -> Result<usize, InvariantViolation> {
        let builds: HashMap<&str, DateTime<Utc>> = dataset
            .cicd_events
            .iter()
            .map(|e| (e.build_id.as_str(), e.timestamp))
            .collect();

        let mut moved = 0;
        for bug in &mut dataset.bugs {
            let built = *builds.get(bug.build_id.as_str()).ok_or_else(|| {
                InvariantViolation::MissingDependency {
                    entity: "bug",
                    id: bug.id.clone(),
                    dependency: format!("build {}", bug.build_id),
                }
            })?;
            let mut changed = bug.build_timestamp != built;
            bug.build_timestamp = built;
            if bug.created_date <= built {
                let delta = (built + gap()) - bug.created_date;
                bug.created_date += delta;
                bug.resolved_date = bug.resolved_date.map(|d| d + delta);
                bug.close_date = bug.close_date.map(|d| d + delta);
                changed = true;
            }
            if changed {
                moved += 1;
            }
        }
        Ok(moved)
    }
}

fn pr_anchor(
    merges: &HashMap<&str, Option<DateTime<Utc>>>,
    event: &CicdEvent,
    pr_id: &str,
) -> Result<DateTime<Utc>, InvariantViolation> {
    merges
        .get(pr_id)
        .ok_or_else(|| InvariantViolation::MissingDependency {
            entity: "cicd event",
            id: event.id.clone(),
            dependency: format!("pull request {}", pr_id),
        })?
        .ok_or_else(|| InvariantViolation::MissingTimestamp {
            entity: "pull request",
            id: pr_id.to_string(),
            field: "merged_at",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{generate, GeneratorConfig};
    use sdlcgen_core::{ProjectCatalog, ProjectStatus};

    fn dataset() -> Dataset {
        generate(&GeneratorConfig::default(), &ProjectCatalog::default_catalog()).dataset
    }

    #[test]
    fn test_generated_dataset_needs_no_repair() {
        let mut data = dataset();
        let before = data.clone();
        let report = TimelineEnforcer.enforce(&mut data).unwrap();
        assert_eq!(report, EnforcementReport::default());
        assert_eq!(data, before);
    }

    #[test]
    fn test_pulls_commits_and_dependents_forward() {
        let mut data = dataset();
        let commit = data
            .commits
            .iter()
            .position(|c| data.pull_requests.iter().any(|p| p.commit_ids.contains(&c.id)))
            .unwrap();
        let done = data
            .jira_items
            .iter()
            .find(|j| j.id == data.commits[commit].jira_id)
            .and_then(|j| j.completed_date)
            .unwrap();
        data.commits[commit].timestamp = done - Duration::days(3);

        let report = TimelineEnforcer.enforce(&mut data).unwrap();
        assert!(report.commits >= 1);
        assert_eq!(data.commits[commit].timestamp, done + gap());

        // Second pass is a no-op
        assert_eq!(TimelineEnforcer.enforce(&mut data).unwrap().total(), 0);
    }

    #[test]
    fn test_pr_shift_moves_comments() {
        let mut data = dataset();
        let pr_index = data
            .pull_requests
            .iter()
            .position(|p| data.pr_comments.iter().any(|c| c.pr_id == p.id))
            .unwrap();
        let pr_id = data.pull_requests[pr_index].id.clone();
        let before: Vec<DateTime<Utc>> = data
            .pr_comments
            .iter()
            .filter(|c| c.pr_id == pr_id)
            .map(|c| c.created_at)
            .collect();

        let last = data.pull_requests[pr_index].last_commit_at;
        data.pull_requests[pr_index].created_at = last - Duration::hours(5);
        data.pull_requests[pr_index].review_started_at = last - Duration::hours(4);

        TimelineEnforcer.enforce(&mut data).unwrap();
        let delta = Duration::hours(5) + gap();
        let pr = &data.pull_requests[pr_index];
        assert_eq!(pr.created_at, last + gap());
        assert_eq!(pr.review_started_at, last + gap() + Duration::hours(1));

        let after: Vec<DateTime<Utc>> = data
            .pr_comments
            .iter()
            .filter(|c| c.pr_id == pr_id)
            .map(|c| c.created_at)
            .collect();
        let expected: Vec<DateTime<Utc>> = before.iter().map(|t| *t + delta).collect();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_missing_completion_is_an_invariant_violation() {
        let mut data = dataset();
        let jira_id = data.commits[0].jira_id.clone();
        for jira in data.jira_items.iter_mut().filter(|j| j.id == jira_id) {
            jira.completed_date = None;
        }
        let err = TimelineEnforcer.enforce(&mut data).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::MissingTimestamp {
                entity: "jira item",
                id: jira_id,
                field: "completed_date",
            }
        );
    }

    #[test]
    fn test_sprints_without_design_completion_fail() {
        let mut data = dataset();
        let project_id = data.sprints[0].project_id.clone();
        for project in data.projects.iter_mut().filter(|p| p.id == project_id) {
            project.design_completed_at = None;
            assert_ne!(project.status, ProjectStatus::NotStarted);
        }
        assert!(matches!(
            TimelineEnforcer.enforce(&mut data),
            Err(InvariantViolation::MissingTimestamp { field: "design_completed_at", .. })
        ));
    }
}
