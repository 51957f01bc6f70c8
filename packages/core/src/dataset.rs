use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GenerationStage;
use crate::types::{
    Bug, CicdEvent, CodeCommit, DesignEvent, JiraItem, PrComment, Project, PullRequest, Sprint,
};

/// The eight entity lists plus the sprint→jira association map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub projects: Vec<Project>,
    pub design_events: Vec<DesignEvent>,
    pub jira_items: Vec<JiraItem>,
    pub sprints: Vec<Sprint>,
    /// Sprint id → associated jira ids
    pub sprint_jira: BTreeMap<String, Vec<String>>,
    pub commits: Vec<CodeCommit>,
    pub pull_requests: Vec<PullRequest>,
    #[serde(default)]
    pub pr_comments: Vec<PrComment>,
    pub cicd_events: Vec<CicdEvent>,
    pub bugs: Vec<Bug>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub projects: usize,
    pub design_events: usize,
    pub jira_items: usize,
    pub sprints: usize,
    pub sprint_associations: usize,
    pub commits: usize,
    pub pull_requests: usize,
    pub pr_comments: usize,
    pub cicd_events: usize,
    pub bugs: usize,
}

impl DatasetCounts {
    /// Label/count pairs in load order
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("Projects", self.projects),
            ("Design events", self.design_events),
            ("Jira items", self.jira_items),
            ("Sprints", self.sprints),
            ("Sprint associations", self.sprint_associations),
            ("Commits", self.commits),
            ("Pull requests", self.pull_requests),
            ("PR comments", self.pr_comments),
            ("CI/CD events", self.cicd_events),
            ("Bugs", self.bugs),
        ]
    }
}

impl Dataset {
    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            projects: self.projects.len(),
            design_events: self.design_events.len(),
            jira_items: self.jira_items.len(),
            sprints: self.sprints.len(),
            sprint_associations: self.sprint_jira.values().map(Vec::len).sum(),
            commits: self.commits.len(),
            pull_requests: self.pull_requests.len(),
            pr_comments: self.pr_comments.len(),
            cicd_events: self.cicd_events.len(),
            bugs: self.bugs.len(),
        }
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Append another dataset's records after this one's
    pub fn extend(&mut self, other: Dataset) {
        self.projects.extend(other.projects);
        self.design_events.extend(other.design_events);
        self.jira_items.extend(other.jira_items);
        self.sprints.extend(other.sprints);
        for (sprint_id, jira_ids) in other.sprint_jira {
            self.sprint_jira.entry(sprint_id).or_default().extend(jira_ids);
        }
        self.commits.extend(other.commits);
        self.pull_requests.extend(other.pull_requests);
        self.pr_comments.extend(other.pr_comments);
        self.cicd_events.extend(other.cicd_events);
        self.bugs.extend(other.bugs);
    }

    /// Drop everything produced by `stage` and every stage downstream of it.
    /// Projects themselves are always kept.
    pub fn clear_from(&mut self, stage: GenerationStage) {
        use GenerationStage::*;

        let order = [Design, WorkItems, Sprints, Commits, PullRequests, Cicd, Bugs];
        let from = match stage {
            Catalog | Design => 0,
            // Enforcement repairs everything after work items
            Enforcement => 2,
            other => order.iter().position(|s| *s == other).unwrap_or(0),
        };

        for s in &order[from..] {
            match s {
                Design => {
                    self.design_events.clear();
                    self.jira_items.retain(|j| !j.is_design());
                }
                WorkItems => self.jira_items.retain(|j| j.is_design()),
                Sprints => {
                    self.sprints.clear();
                    self.sprint_jira.clear();
                }
                Commits => self.commits.clear(),
                PullRequests => {
                    self.pull_requests.clear();
                    self.pr_comments.clear();
                }
                Cicd => self.cicd_events.clear(),
                Bugs => self.bugs.clear(),
                Catalog | Enforcement => {}
            }
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProjectCatalog;
    use crate::constants::base_start_date;
    use crate::types::{JiraStatus, JiraType};

    fn sample() -> Dataset {
        let project = ProjectCatalog::default_catalog().entries()[0].resolve().unwrap();
        let jira = JiraItem {
            id: format!("{}-E1", project.id),
            project_id: project.id.clone(),
            parent_id: None,
            item_type: JiraType::Epic,
            title: "Epic".to_string(),
            status: JiraStatus::Open,
            created_date: base_start_date(),
            completed_date: None,
            story_points: 20,
            estimated_hours: None,
            actual_hours: None,
            assigned_developer: "dev1@example.com".to_string(),
            design_type: None,
        };
        let mut dataset = Dataset {
            projects: vec![project],
            jira_items: vec![jira],
            ..Dataset::default()
        };
        dataset
            .sprint_jira
            .insert("PRJ-001-Sprint-3".to_string(), vec!["PRJ-001-E1".to_string()]);
        dataset
    }

    #[test]
    fn test_counts() {
        let counts = sample().counts();
        assert_eq!(counts.projects, 1);
        assert_eq!(counts.jira_items, 1);
        assert_eq!(counts.sprint_associations, 1);
        assert_eq!(counts.rows().len(), 10);
    }

    #[test]
    fn test_clear_from_keeps_upstream() {
        let mut dataset = sample();
        dataset.clear_from(GenerationStage::Sprints);
        assert_eq!(dataset.jira_items.len(), 1);
        assert!(dataset.sprint_jira.is_empty());

        dataset.clear_from(GenerationStage::WorkItems);
        assert!(dataset.jira_items.is_empty());
        assert_eq!(dataset.projects.len(), 1);

        let mut design_jira = sample().jira_items[0].clone();
        design_jira.design_type = Some(crate::types::DesignType::Requirement);
        dataset.jira_items.push(design_jira);
        dataset.clear_from(GenerationStage::Commits);
        assert_eq!(dataset.jira_items.len(), 1);
        dataset.clear_from(GenerationStage::WorkItems);
        assert_eq!(dataset.jira_items.len(), 1);
        dataset.clear_from(GenerationStage::Design);
        assert!(dataset.jira_items.is_empty());
    }

    #[test]
    fn test_extend_merges_associations() {
        let mut a = sample();
        let b = sample();
        a.extend(b);
        assert_eq!(a.projects.len(), 2);
        assert_eq!(a.sprint_jira["PRJ-001-Sprint-3"].len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let dataset = sample();
        let json = dataset.to_json_pretty().unwrap();
        assert_eq!(Dataset::from_json_str(&json).unwrap(), dataset);
    }
}
