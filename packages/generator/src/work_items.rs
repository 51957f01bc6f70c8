// ABOUTME: Epic → Story → Task hierarchy anchored to design completion
// ABOUTME: Completion dates propagate bottom-up; any incomplete descendant keeps its ancestors open

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use sdlcgen_core::constants::SPRINT_LENGTH_DAYS;
use sdlcgen_core::policy::{jira_status_policy, JiraRole, StatusDraw};
use sdlcgen_core::{Fanout, JiraItem, JiraStatus, JiraType, Project};

use crate::sampling::{self, weighted};

/// Resolve a policy entry into a concrete status
pub fn draw_status<R: Rng + ?Sized>(rng: &mut R, draw: StatusDraw) -> JiraStatus {
    match draw {
        StatusDraw::Fixed(status) => status,
        StatusDraw::Weighted(weights) => weighted(rng, weights).copied().unwrap_or(JiraStatus::Open),
    }
}

pub struct WorkItemGenerator;

impl WorkItemGenerator {
    /// Build the hierarchy for a project whose design finished at `design_completed_at`
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        project: &Project,
        fanout: &Fanout,
        design_completed_at: DateTime<Utc>,
    ) -> Vec<JiraItem> {
        let mut items = Vec::with_capacity(fanout.total_items() as usize);
        let first_epic_start = design_completed_at + Duration::days(1);

        for e in 1..=fanout.epics {
            let epic_start = first_epic_start + Duration::days(SPRINT_LENGTH_DAYS * (e as i64 - 1));
            let epic_id = format!("{}-E{}", project.id, e);
            items.push(self.item(
                rng,
                project,
                epic_id.clone(),
                None,
                JiraType::Epic,
                format!("Epic {}: {}", e, project.title),
                epic_start,
            ));

            for s in 1..=fanout.stories_per_epic {
                let story_start = epic_start + sampling::days(rng, 1, 3);
                let story_id = format!("{}-S{}", epic_id, s);
                items.push(self.item(
                    rng,
                    project,
                    story_id.clone(),
                    Some(epic_id.clone()),
                    JiraType::Story,
                    format!("Story {}.{}", e, s),
                    story_start,
                ));

                for t in 1..=fanout.tasks_per_story {
                    let task_start = story_start + sampling::days(rng, 0, 2);
                    items.push(self.item(
                        rng,
                        project,
                        format!("{}-T{}", story_id, t),
                        Some(story_id.clone()),
                        JiraType::Task,
                        format!("Task {}.{}.{}", e, s, t),
                        task_start,
                    ));
                }
            }
        }

        cascade_completion(&mut items, || sampling::hours(rng, 1, 4));

        debug!(
            "{}: {} work items, {} complete",
            project.id,
            items.len(),
            items.iter().filter(|i| i.completed_date.is_some()).count()
        );
        items
    }

    #[allow(clippy::too_many_arguments)]
    fn item<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        project: &Project,
        id: String,
        parent_id: Option<String>,
        item_type: JiraType,
        title: String,
        created_date: DateTime<Utc>,
    ) -> JiraItem {
        let role = match item_type {
            JiraType::Epic => JiraRole::Epic,
            JiraType::Story => JiraRole::Story,
            JiraType::Task => JiraRole::Task,
        };
        let status = draw_status(rng, jira_status_policy(project.status, role));

        let story_points = match item_type {
            JiraType::Epic => rng.gen_range(20..=40),
            JiraType::Story => rng.gen_range(5..=13),
            JiraType::Task => rng.gen_range(1..=5),
        };

        let (estimated_hours, actual_hours, completed_date) = if item_type == JiraType::Task {
            let estimated = rng.gen_range(4..=16) as f64;
            if status.is_done() {
                let completed =
                    created_date + sampling::days(rng, 2, 5) + sampling::hours(rng, 0, 8);
                let actual = (estimated * rng.gen_range(0.8..1.3) * 10.0).round() / 10.0;
                (Some(estimated), Some(actual), Some(completed))
            } else {
                (Some(estimated), None, None)
            }
        } else {
            // Parents get their completion from the cascade
            (None, None, None)
        };

        JiraItem {
            id,
            project_id: project.id.clone(),
            parent_id,
            item_type,
            title,
            status,
            created_date,
            completed_date,
            story_points,
            estimated_hours,
            actual_hours,
            assigned_developer: sampling::author(rng),
            design_type: None,
        }
    }
}

fn depth_rank(item_type: JiraType) -> u8 {
    match item_type {
        JiraType::Task => 0,
        JiraType::Story => 1,
        JiraType::Epic => 2,
    }
}

/// Bottom-up completion fold over the jira tree.
///
/// Pass one indexes children by parent. Pass two visits tasks, then stories, then
/// epics: a leaf keeps its completion only if its status is done; a parent is
/// complete exactly when every child is, at `max(child completion) + offset()`.
/// Completion promotes a parent to CLOSED (FIXED is kept); incompleteness clears
/// the date and demotes a nominally done parent to IN_PROGRESS.
pub fn cascade_completion<F>(items: &mut [JiraItem], mut offset: F)
where
    F: FnMut() -> Duration,
{
    let index: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id.clone(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    for (i, item) in items.iter().enumerate() {
        if let Some(parent) = item.parent_id.as_ref().and_then(|p| index.get(p)) {
            children[*parent].push(i);
        }
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|i| depth_rank(items[*i].item_type));

    for i in order {
        if children[i].is_empty() {
            if !items[i].status.is_done() {
                items[i].completed_date = None;
            }
            continue;
        }

        let mut latest: Option<DateTime<Utc>> = None;
        let mut all_complete = true;
        for child in &children[i] {
            match items[*child].completed_date {
                Some(done) => latest = Some(latest.map_or(done, |l| l.max(done))),
                None => all_complete = false,
            }
        }

        let item = &mut items[i];
        match latest.filter(|_| all_complete) {
            Some(latest) => {
                item.completed_date = Some(latest + offset());
                if item.status != JiraStatus::Fixed {
                    item.status = JiraStatus::Closed;
                }
            }
            None => {
                item.completed_date = None;
                if item.status.is_done() {
                    item.status = JiraStatus::InProgress;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sdlcgen_core::constants::base_start_date;
    use sdlcgen_core::{Complexity, ComplexityModel, ProjectCatalog};

    fn item(id: &str, parent: Option<&str>, item_type: JiraType, status: JiraStatus, done: Option<i64>) -> JiraItem {
        let created = base_start_date();
        JiraItem {
            id: id.to_string(),
            project_id: "P".to_string(),
            parent_id: parent.map(str::to_string),
            item_type,
            title: id.to_string(),
            status,
            created_date: created,
            completed_date: done.map(|h| created + Duration::hours(h)),
            story_points: 1,
            estimated_hours: None,
            actual_hours: None,
            assigned_developer: "dev1@example.com".to_string(),
            design_type: None,
        }
    }

    #[test]
    fn test_cascade_all_complete() {
        let mut items = vec![
            item("E", None, JiraType::Epic, JiraStatus::InProgress, None),
            item("S1", Some("E"), JiraType::Story, JiraStatus::Open, None),
            item("S2", Some("E"), JiraType::Story, JiraStatus::Open, None),
            item("T1", Some("S1"), JiraType::Task, JiraStatus::Closed, Some(10)),
            item("T2", Some("S1"), JiraType::Task, JiraStatus::Fixed, Some(30)),
            item("T3", Some("S2"), JiraType::Task, JiraStatus::Closed, Some(20)),
        ];
        cascade_completion(&mut items, || Duration::hours(1));

        let start = base_start_date();
        assert_eq!(items[1].completed_date, Some(start + Duration::hours(31)));
        assert_eq!(items[2].completed_date, Some(start + Duration::hours(21)));
        assert_eq!(items[0].completed_date, Some(start + Duration::hours(32)));
        assert_eq!(items[0].status, JiraStatus::Closed);
    }

    #[test]
    fn test_cascade_incomplete_propagates_up() {
        let mut items = vec![
            item("E", None, JiraType::Epic, JiraStatus::Closed, Some(100)),
            item("S1", Some("E"), JiraType::Story, JiraStatus::Closed, Some(90)),
            item("S2", Some("E"), JiraType::Story, JiraStatus::Closed, Some(90)),
            item("T1", Some("S1"), JiraType::Task, JiraStatus::Closed, Some(10)),
            item("T2", Some("S2"), JiraType::Task, JiraStatus::Open, Some(10)),
        ];
        cascade_completion(&mut items, || Duration::hours(1));

        // Open leaf loses its stray date
        assert!(items[4].completed_date.is_none());
        assert!(items[2].completed_date.is_none());
        assert_eq!(items[2].status, JiraStatus::InProgress);
        assert!(items[1].completed_date.is_some());
        assert!(items[0].completed_date.is_none());
        assert_eq!(items[0].status, JiraStatus::InProgress);
    }

    #[test]
    fn test_cascade_order_independent_of_input_order() {
        let mut items = vec![
            item("T1", Some("S1"), JiraType::Task, JiraStatus::Closed, Some(5)),
            item("E", None, JiraType::Epic, JiraStatus::Open, None),
            item("S1", Some("E"), JiraType::Story, JiraStatus::Open, None),
        ];
        cascade_completion(&mut items, || Duration::hours(2));
        assert_eq!(items[2].completed_date, Some(base_start_date() + Duration::hours(7)));
        assert_eq!(items[1].completed_date, Some(base_start_date() + Duration::hours(9)));
    }

    fn generate(status: &str, complexity: Complexity, seed: u64) -> (Project, Vec<JiraItem>) {
        let mut entry = ProjectCatalog::default_catalog().entries()[0].clone();
        entry.status = status.to_string();
        let project = entry.resolve().unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let fanout = ComplexityModel::fanout(complexity);
        let design_done = project.start_date + Duration::days(30);
        let items = WorkItemGenerator.generate(&mut rng, &project, &fanout, design_done);
        (project, items)
    }

    #[test]
    fn test_medium_released_fanout() {
        let (_, items) = generate("RELEASED", Complexity::Medium, 42);
        let count = |t: JiraType| items.iter().filter(|i| i.item_type == t).count();
        assert_eq!(count(JiraType::Epic), 2);
        assert_eq!(count(JiraType::Story), 8);
        assert_eq!(count(JiraType::Task), 32);
        assert!(items.iter().all(|i| i.status == JiraStatus::Closed && i.completed_date.is_some()));
    }

    #[test]
    fn test_epics_are_sprint_aligned() {
        let (project, items) = generate("CODE_COMPLETE", Complexity::VeryHigh, 1);
        let epics: Vec<&JiraItem> = items.iter().filter(|i| i.item_type == JiraType::Epic).collect();
        let first = project.start_date + Duration::days(31);
        for (n, epic) in epics.iter().enumerate() {
            assert_eq!(epic.created_date, first + Duration::days(14 * n as i64));
        }
    }

    #[test]
    fn test_in_progress_hierarchy_is_consistent() {
        for seed in 0..10 {
            let (_, items) = generate("IN_PROGRESS", Complexity::High, seed);
            let by_id: HashMap<&str, &JiraItem> = items.iter().map(|i| (i.id.as_str(), i)).collect();
            for child in items.iter().filter(|i| i.parent_id.is_some()) {
                let parent = by_id[child.parent_id.as_deref().unwrap()];
                assert!(parent.created_date <= child.created_date);
                if let (Some(p), Some(c)) = (parent.completed_date, child.completed_date) {
                    assert!(p > c);
                }
                if parent.completed_date.is_some() {
                    assert!(child.completed_date.is_some());
                }
            }
        }
    }

    #[test]
    fn test_design_phase_complete_leaves_work_open() {
        let (_, items) = generate("DESIGN_PHASE_COMPLETE", Complexity::Low, 3);
        assert!(items.iter().all(|i| i.status == JiraStatus::Open && i.completed_date.is_none()));
    }
}
