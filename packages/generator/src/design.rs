// ABOUTME: Design phase event stream per project
// ABOUTME: Requirements, then UX/Architecture, then DB/API, then Security Review, each after its predecessors end

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use sdlcgen_core::policy::{jira_status_policy, JiraRole};
use sdlcgen_core::{
    ComplexityProfile, DesignEvent, DesignStage, DesignType, JiraItem, JiraType, Project,
    ProjectStatus,
};

use crate::sampling::{self, chance, pick};
use crate::work_items::draw_status;

pub const STAKEHOLDER_GROUPS: &[&str] = &[
    "Product,Dev,QA",
    "Dev,Arch",
    "UX,Dev,Product",
    "Dev,Security",
    "Product,QA,Security",
    "Arch,Security,Dev",
];

/// Probability that a long enough phase is interrupted once
pub const BLOCKED_PROBABILITY: f64 = 0.3;

/// Phases shorter than this never get a BLOCKED/RESUME pair
pub const MIN_BLOCKABLE_DAYS: i64 = 4;

const HOURS_PER_DESIGN_DAY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct DesignOutput {
    pub events: Vec<DesignEvent>,
    pub jira_items: Vec<JiraItem>,
    pub windows: BTreeMap<DesignType, PhaseWindow>,
    /// End of the security review; `None` when the design never finished
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct DesignPhaseGenerator;

impl DesignPhaseGenerator {
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        project: &Project,
        profile: &ComplexityProfile,
    ) -> DesignOutput {
        let mut output = DesignOutput::default();

        if project.status == ProjectStatus::NotStarted {
            let phase = DesignType::Requirement;
            let jira = design_jira(rng, project, phase, project.start_date, None, 0);
            output.events.push(event(rng, project, phase, DesignStage::Start, project.start_date, &jira.id));
            output.windows.insert(
                phase,
                PhaseWindow {
                    start: project.start_date,
                    end: None,
                },
            );
            output.jira_items.push(jira);
            debug!("{}: not started, only requirements opened", project.id);
            return output;
        }

        let mut ends: BTreeMap<DesignType, DateTime<Utc>> = BTreeMap::new();

        // Declaration order is a topological order of the phase graph
        for phase in DesignType::ALL.iter().copied() {
            let start = phase
                .predecessors()
                .iter()
                .filter_map(|pred| ends.get(pred))
                .max()
                .map(|done| *done + Duration::days(1))
                .unwrap_or(project.start_date);

            let max_days = profile.phase_durations.get(&phase).copied().unwrap_or(1).max(1);
            let duration = rng.gen_range(1..=max_days as i64);
            let end = start + Duration::days(duration);

            let jira = design_jira(rng, project, phase, start, Some(end), duration);
            output.events.push(event(rng, project, phase, DesignStage::Start, start, &jira.id));

            let blockable = matches!(
                project.status,
                ProjectStatus::InProgress | ProjectStatus::DesignPhaseComplete
            );
            if blockable && duration >= MIN_BLOCKABLE_DAYS && chance(rng, BLOCKED_PROBABILITY) {
                let blocked = start
                    + Duration::days(rng.gen_range(1..=duration - 2))
                    + sampling::hours(rng, 0, 12);
                let resumed = blocked + Duration::days(1);
                output.events.push(event(rng, project, phase, DesignStage::Blocked, blocked, &jira.id));
                output.events.push(event(rng, project, phase, DesignStage::Resume, resumed, &jira.id));
            }

            output.events.push(event(rng, project, phase, DesignStage::End, end, &jira.id));
            output.jira_items.push(jira);
            output.windows.insert(phase, PhaseWindow { start, end: Some(end) });
            ends.insert(phase, end);
        }

        output.completed_at = ends.get(&DesignType::SecurityReview).copied();
        debug!(
            "{}: {} design events, design complete at {:?}",
            project.id,
            output.events.len(),
            output.completed_at
        );
        output
    }
}

fn event<R: Rng + ?Sized>(
    rng: &mut R,
    project: &Project,
    phase: DesignType,
    stage: DesignStage,
    timestamp: DateTime<Utc>,
    jira_id: &str,
) -> DesignEvent {
    DesignEvent {
        id: format!("{}-{}-{}", project.id, phase.code(), stage.as_str()),
        project_id: project.id.clone(),
        design_type: phase,
        stage,
        timestamp,
        author: sampling::author(rng),
        jira_id: Some(jira_id.to_string()),
        stakeholders: pick(rng, STAKEHOLDER_GROUPS)
            .copied()
            .unwrap_or(STAKEHOLDER_GROUPS[0])
            .to_string(),
    }
}

fn design_jira<R: Rng + ?Sized>(
    rng: &mut R,
    project: &Project,
    phase: DesignType,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    duration_days: i64,
) -> JiraItem {
    let status = draw_status(rng, jira_status_policy(project.status, JiraRole::Design));
    let completed_date = end.filter(|_| status.is_done());

    let estimated = (duration_days.max(1) as f64 * HOURS_PER_DESIGN_DAY).round();
    let actual = completed_date.map(|_| (estimated * rng.gen_range(0.8..1.3)).round());

    JiraItem {
        id: format!("{}-{}-1", project.id, phase.code()),
        project_id: project.id.clone(),
        parent_id: None,
        item_type: JiraType::Task,
        title: format!("{} for {}", phase.label(), project.title),
        status,
        created_date: start,
        completed_date,
        story_points: 3,
        estimated_hours: Some(estimated),
        actual_hours: actual,
        assigned_developer: sampling::author(rng),
        design_type: Some(phase),
    }
}
