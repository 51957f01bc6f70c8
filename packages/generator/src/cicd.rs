// ABOUTME: CI/CD builds: one DEV→QA→STAGING→PRODUCTION chain per merged PR
// ABOUTME: Plus a backfilled all-success main chain where needed and unrelated manual builds

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use sdlcgen_core::constants::MAIN_BRANCH;
use sdlcgen_core::policy::{build_success_rate, DEFAULT_TARGET_BRANCH_WEIGHTS};
use sdlcgen_core::{
    BuildMode, BuildStatus, CicdEvent, Environment, PrStatus, Project, PullRequest,
};

use crate::sampling::{self, chance, pick, IdMint};

/// Window after project start in which a backfilled chain is placed
pub const BACKFILL_WINDOW_DAYS: i64 = 90;

/// One manual build per this many merged pull requests
pub const MERGED_PRS_PER_MANUAL_BUILD: usize = 4;

/// Whether the events contain a main-branch automatic chain that succeeded in every environment
pub fn has_full_main_success_chain(events: &[CicdEvent]) -> bool {
    let mut chains: BTreeMap<&str, BTreeSet<Environment>> = BTreeMap::new();
    for event in events.iter().filter(|e| {
        e.mode == BuildMode::Automatic && e.branch == MAIN_BRANCH && e.status == BuildStatus::Success
    }) {
        if let Some(chain) = event.chain_id.as_deref() {
            chains.entry(chain).or_default().insert(event.environment);
        }
    }
    chains.values().any(|envs| envs.len() == Environment::ALL.len())
}

/// Per-project release counter for successful production builds on main
#[derive(Debug, Default)]
struct ReleaseCounter {
    next: u32,
}

impl ReleaseCounter {
    fn tag(&mut self, environment: Environment, status: BuildStatus, branch: &str) -> Option<String> {
        if environment == Environment::Production && status == BuildStatus::Success && branch == MAIN_BRANCH {
            self.next += 1;
            Some(format!("v1.0.{}", self.next))
        } else {
            None
        }
    }
}

pub struct CicdEventGenerator;

impl CicdEventGenerator {
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mint: &mut IdMint,
        project: &Project,
        pull_requests: &[PullRequest],
    ) -> Vec<CicdEvent> {
        let mut events = Vec::new();
        let mut releases = ReleaseCounter::default();

        let merged: Vec<(&PullRequest, DateTime<Utc>)> = pull_requests
            .iter()
            .filter(|pr| pr.project_id == project.id && pr.status == PrStatus::Merged)
            .filter_map(|pr| pr.merged_at.map(|at| (pr, at)))
            .collect();

        for (pr, merged_at) in &merged {
            self.chain(
                rng,
                mint,
                &mut releases,
                &mut events,
                project,
                Some(pr.id.as_str()),
                &pr.branch_to,
                *merged_at,
                false,
            );
        }

        // Shipped projects always carry at least one full release on main
        let shipped = project.status.is_resolved() || !merged.is_empty();
        if shipped && !has_full_main_success_chain(&events) {
            let offset = rng.gen_range(0..BACKFILL_WINDOW_DAYS * 24 * 60);
            let anchor = project.start_date + Duration::minutes(offset);
            debug!("{}: backfilling a main release chain at {}", project.id, anchor);
            self.chain(
                rng,
                mint,
                &mut releases,
                &mut events,
                project,
                None,
                MAIN_BRANCH,
                anchor,
                true,
            );
        }

        let manual = merged.len() / MERGED_PRS_PER_MANUAL_BUILD;
        if manual > 0 {
            let latest = merged.iter().map(|(_, at)| *at).max().unwrap_or(project.start_date);
            let span = ((latest + Duration::days(14)) - project.start_date).num_minutes().max(1);
            for _ in 0..manual {
                let timestamp = project.start_date + Duration::minutes(rng.gen_range(0..span));
                let environment = pick(rng, Environment::ALL).copied().unwrap_or(Environment::Dev);
                let branch = pick(rng, DEFAULT_TARGET_BRANCH_WEIGHTS)
                    .map(|(b, _)| b.to_string())
                    .unwrap_or_else(|| MAIN_BRANCH.to_string());
                let status = if rng.gen_bool(0.5) {
                    BuildStatus::Success
                } else {
                    BuildStatus::Failure
                };
                events.push(CicdEvent {
                    id: mint.hex(rng, "cicd_"),
                    project_id: project.id.clone(),
                    pr_id: None,
                    chain_id: None,
                    environment,
                    status,
                    build_id: mint.hex(rng, "build_"),
                    branch,
                    mode: BuildMode::Manual,
                    timestamp,
                    duration_seconds: rng.gen_range(60..=1800),
                    release_version: None,
                });
            }
        }

        debug!(
            "{}: {} cicd events from {} merged pull requests",
            project.id,
            events.len(),
            merged.len()
        );
        events
    }

    /// Walk the environments in order, each 5–15 minutes after the previous stage,
    /// stopping after the first failure
    #[allow(clippy::too_many_arguments)]
    fn chain<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mint: &mut IdMint,
        releases: &mut ReleaseCounter,
        events: &mut Vec<CicdEvent>,
        project: &Project,
        pr_id: Option<&str>,
        branch: &str,
        anchor: DateTime<Utc>,
        guaranteed: bool,
    ) {
        let chain_id = mint.hex(rng, "chain_");
        let mut previous = anchor;
        let mut environment = Some(Environment::Dev);

        while let Some(env) = environment {
            let timestamp = previous + sampling::minutes(rng, 5, 15);
            let status = if guaranteed || chance(rng, build_success_rate(env)) {
                BuildStatus::Success
            } else {
                BuildStatus::Failure
            };

            events.push(CicdEvent {
                id: mint.hex(rng, "cicd_"),
                project_id: project.id.clone(),
                pr_id: pr_id.map(str::to_string),
                chain_id: Some(chain_id.clone()),
                environment: env,
                status,
                build_id: mint.hex(rng, "build_"),
                branch: branch.to_string(),
                mode: BuildMode::Automatic,
                timestamp,
                duration_seconds: rng.gen_range(120..=900),
                release_version: releases.tag(env, status, branch),
            });

            if status == BuildStatus::Failure {
                break;
            }
            previous = timestamp;
            environment = env.next();
        }
    }
}
