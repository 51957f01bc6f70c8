// ABOUTME: P0 bugs spawned by successful builds
// ABOUTME: Resolution time is active work time, strictly inside 20-80% of elapsed time

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use sdlcgen_core::constants::{BUG_SEVERITY, MAIN_BRANCH};
use sdlcgen_core::{Bug, BugStatus, BugType, BuildStatus, CicdEvent, ImpactArea, Project};

use crate::sampling::{self, chance, pick};

pub const RESOLVE_PROBABILITY: f64 = 0.7;
pub const CLOSE_PROBABILITY: f64 = 0.8;

/// Bounds on resolution time as a fraction of elapsed time
pub const RESOLUTION_FRACTION: (f64, f64) = (0.2, 0.8);

pub const ROOT_CAUSES: &[&str] = &[
    "Code logic error",
    "Database deadlock",
    "Memory leak",
    "Race condition",
    "Configuration error",
    "Third-party API failure",
    "Network timeout",
    "Input validation",
    "Cache inconsistency",
    "Resource exhaustion",
    "Concurrency issue",
    "Environmental mismatch",
];

const UNRESOLVED_STATUSES: &[BugStatus] = &[BugStatus::Open, BugStatus::InProgress, BugStatus::Blocked];

/// Draw active work hours strictly between 20% and 80% of `elapsed_hours`
pub fn sample_resolution_hours<R: Rng + ?Sized>(rng: &mut R, elapsed_hours: f64) -> f64 {
    if !elapsed_hours.is_finite() || elapsed_hours <= 0.0 {
        return 0.0;
    }
    let low = elapsed_hours * RESOLUTION_FRACTION.0;
    let high = elapsed_hours * RESOLUTION_FRACTION.1;
    loop {
        let hours = rng.gen_range(low..high);
        if hours > low {
            return hours;
        }
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

pub struct BugGenerator;

impl BugGenerator {
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        project: &Project,
        builds: &[CicdEvent],
    ) -> Vec<Bug> {
        let mut bugs = Vec::new();

        for build in builds
            .iter()
            .filter(|b| b.project_id == project.id && b.status == BuildStatus::Success)
        {
            let count = if build.branch == MAIN_BRANCH {
                rng.gen_range(0..=2)
            } else {
                rng.gen_range(1..=4)
            };
            for _ in 0..count {
                let n = bugs.len() + 1;
                bugs.push(self.bug(rng, project, build, n));
            }
        }

        debug!("{}: {} P0 bugs", project.id, bugs.len());
        bugs
    }

    fn bug<R: Rng + ?Sized>(&self, rng: &mut R, project: &Project, build: &CicdEvent, n: usize) -> Bug {
        let created_date = build.timestamp + sampling::hours(rng, 1, 24);
        let bug_type = pick(rng, BugType::ALL).copied().unwrap_or(BugType::Functionality);
        let impact_area = pick(rng, ImpactArea::ALL).copied().unwrap_or(ImpactArea::Customer);

        let (status, resolved_date, close_date, resolution_time_hours, root_cause) =
            if chance(rng, RESOLVE_PROBABILITY) {
                let resolved = created_date + sampling::hours(rng, 24, 96);
                let worked = sample_resolution_hours(rng, hours_between(created_date, resolved));
                let cause = pick(rng, ROOT_CAUSES).map(|c| c.to_string());
                if chance(rng, CLOSE_PROBABILITY) {
                    let closed = resolved + sampling::hours(rng, 4, 24);
                    (BugStatus::Closed, Some(resolved), Some(closed), Some(worked), cause)
                } else {
                    (BugStatus::Fixed, Some(resolved), None, Some(worked), cause)
                }
            } else {
                let status = pick(rng, UNRESOLVED_STATUSES).copied().unwrap_or(BugStatus::Open);
                (status, None, None, None, None)
            };

        Bug {
            id: format!("{}-BUG-{}", project.id, n),
            project_id: project.id.clone(),
            build_id: build.build_id.clone(),
            build_timestamp: build.timestamp,
            severity: BUG_SEVERITY.to_string(),
            bug_type,
            impact_area,
            title: format!(
                "{} issue found in {}",
                bug_type.as_str().replace('_', "/").to_lowercase(),
                build.environment
            ),
            status,
            environment_found: build.environment,
            assigned_to: sampling::author(rng),
            created_date,
            resolved_date,
            close_date,
            resolution_time_hours,
            root_cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sdlcgen_core::constants::base_start_date;
    use sdlcgen_core::{BuildMode, Environment, ProjectCatalog};

    fn build(id: &str, branch: &str, status: BuildStatus) -> CicdEvent {
        CicdEvent {
            id: format!("cicd_{id}"),
            project_id: "PRJ-001".to_string(),
            pr_id: None,
            chain_id: None,
            environment: Environment::Qa,
            status,
            build_id: id.to_string(),
            branch: branch.to_string(),
            mode: BuildMode::Manual,
            timestamp: base_start_date() + Duration::days(50),
            duration_seconds: 300,
            release_version: None,
        }
    }

    #[test]
    fn test_scenario_resolution_window() {
        // Build at T, bug at T+10h, resolved 48h later
        let created = base_start_date() + Duration::hours(10);
        let resolved = created + Duration::hours(48);
        let elapsed = hours_between(created, resolved);
        assert_eq!(elapsed, 48.0);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let worked = sample_resolution_hours(&mut rng, elapsed);
            assert!(worked > 9.6 && worked < 38.4, "{worked}");
        }
    }

    #[test]
    fn test_only_successful_builds_spawn_bugs() {
        let project = ProjectCatalog::default_catalog().entries()[0].resolve().unwrap();
        let builds = vec![
            build("build_fail", "develop", BuildStatus::Failure),
            build("build_ok", "develop", BuildStatus::Success),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let bugs = BugGenerator.generate(&mut rng, &project, &builds);

        assert!((1..=4).contains(&bugs.len()));
        for bug in &bugs {
            assert_eq!(bug.build_id, "build_ok");
            assert_eq!(bug.severity, "P0");
            assert!(bug.created_date > bug.build_timestamp);
            assert_eq!(bug.environment_found, Environment::Qa);
        }
    }

    #[test]
    fn test_bug_lifecycle() {
        let project = ProjectCatalog::default_catalog().entries()[0].resolve().unwrap();
        let builds: Vec<CicdEvent> = (0..200)
            .map(|i| build(&format!("build_{i}"), "staging", BuildStatus::Success))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let bugs = BugGenerator.generate(&mut rng, &project, &builds);

        let resolved = bugs.iter().filter(|b| b.resolved_date.is_some()).count();
        let ratio = resolved as f64 / bugs.len() as f64;
        assert!((ratio - 0.7).abs() < 0.06, "resolved ratio {ratio}");

        for bug in &bugs {
            match (bug.resolved_date, bug.resolution_time_hours) {
                (Some(resolved), Some(worked)) => {
                    let elapsed = hours_between(bug.created_date, resolved);
                    assert!(worked > 0.0 && worked < elapsed);
                    assert!(matches!(bug.status, BugStatus::Closed | BugStatus::Fixed));
                    if bug.status == BugStatus::Closed {
                        assert!(bug.close_date.unwrap() > resolved);
                    } else {
                        assert!(bug.close_date.is_none());
                    }
                }
                (None, None) => {
                    assert!(UNRESOLVED_STATUSES.contains(&bug.status));
                }
                other => panic!("inconsistent resolution {other:?}"),
            }
        }
    }
}
