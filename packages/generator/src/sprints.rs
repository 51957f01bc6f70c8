// ABOUTME: Fixed two-week sprint calendar and the sprint ↔ jira association
// ABOUTME: Items join every sprint between their creation and completion, inclusive

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use sdlcgen_core::constants::{base_start_date, SPRINT_LENGTH_DAYS};
use sdlcgen_core::{JiraItem, Project, Sprint};

/// 1-based sprint index: `ceil((days since base + 1) / 14)`
pub fn sprint_number(date: DateTime<Utc>) -> i64 {
    let days = (date - base_start_date()).num_seconds().div_euclid(86_400);
    days.div_euclid(SPRINT_LENGTH_DAYS) + 1
}

/// Midnight on the first day of sprint `number`
pub fn sprint_window_start(number: i64) -> DateTime<Utc> {
    base_start_date() + Duration::days((number - 1) * SPRINT_LENGTH_DAYS)
}

pub fn sprint_id(project_id: &str, number: i64) -> String {
    format!("{}-Sprint-{}", project_id, number)
}

#[derive(Debug, Clone, Default)]
pub struct SprintAssignment {
    pub sprints: Vec<Sprint>,
    pub sprint_jira: BTreeMap<String, Vec<String>>,
}

pub struct SprintAssigner;

impl SprintAssigner {
    /// Associate the project's work items with calendar sprints.
    ///
    /// Design jiras precede every sprint and are never associated. Sprint starts
    /// are clamped to the design completion.
    pub fn assign(
        &self,
        project: &Project,
        items: &[JiraItem],
        design_completed_at: DateTime<Utc>,
    ) -> SprintAssignment {
        let mut by_number: BTreeMap<i64, Vec<&JiraItem>> = BTreeMap::new();

        for item in items.iter().filter(|i| !i.is_design()) {
            let first = sprint_number(item.created_date);
            let last = item
                .completed_date
                .map(sprint_number)
                .unwrap_or(first)
                .max(first);
            for n in first..=last {
                by_number.entry(n).or_default().push(item);
            }
        }

        let mut assignment = SprintAssignment::default();
        for (number, members) in by_number {
            let window_start = sprint_window_start(number);
            let start_date = window_start.max(design_completed_at);
            let end_date = window_start + Duration::days(SPRINT_LENGTH_DAYS);

            let planned_story_points = members.iter().map(|i| i.story_points).sum();
            let completed_story_points = members
                .iter()
                .filter(|i| {
                    i.completed_date
                        .is_some_and(|done| done >= start_date && done < end_date)
                })
                .map(|i| i.story_points)
                .sum();

            let id = sprint_id(&project.id, number);
            assignment
                .sprint_jira
                .insert(id.clone(), members.iter().map(|i| i.id.clone()).collect());
            assignment.sprints.push(Sprint {
                id,
                project_id: project.id.clone(),
                sprint_number: number,
                start_date,
                end_date,
                planned_story_points,
                completed_story_points,
            });
        }

        debug!(
            "{}: {} sprints, {} associations",
            project.id,
            assignment.sprints.len(),
            assignment.sprint_jira.values().map(Vec::len).sum::<usize>()
        );
        assignment
    }
}
