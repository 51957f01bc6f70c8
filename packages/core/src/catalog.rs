// ABOUTME: Project catalog: the ordered seed list of projects fed to the generator
// ABOUTME: Entries keep raw complexity/status text so unknown values surface per project

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::base_start_day;
use crate::error::ConfigurationError;
use crate::types::{Complexity, Project, ProjectStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub complexity: String,
    pub status: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        complexity: impl Into<String>,
        status: impl Into<String>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            complexity: complexity.into(),
            status: status.into(),
            start_date,
            description: None,
            team_size: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_team_size(mut self, team_size: u32) -> Self {
        self.team_size = Some(team_size);
        self
    }

    /// Parse the entry into a typed project record
    pub fn resolve(&self) -> Result<Project, ConfigurationError> {
        let complexity = self.complexity.parse::<Complexity>()?;
        let status = self.status.parse::<ProjectStatus>()?;
        let start_date = self.start_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).ok_or_else(|| {
            ConfigurationError::InvalidCatalog(format!("{}: invalid start date", self.id))
        })?;

        Ok(Project {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| format!("{} project", self.title)),
            complexity,
            status,
            start_date,
            team_size: self.team_size.unwrap_or_else(|| default_team_size(complexity)),
            design_completed_at: None,
        })
    }
}

fn default_team_size(complexity: Complexity) -> u32 {
    match complexity {
        Complexity::Low => 3,
        Complexity::Medium => 5,
        Complexity::High => 8,
        Complexity::VeryHigh => 12,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectCatalog {
    entries: Vec<CatalogEntry>,
}

impl ProjectCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, ConfigurationError> {
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(ConfigurationError::InvalidCatalog(
                    "project id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigurationError::InvalidCatalog(format!(
                    "duplicate project id: {}",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in catalog: eight projects staggered 15 days apart from the base date,
    /// covering every complexity class and project status
    pub fn default_catalog() -> Self {
        let base = base_start_day();
        let seeds: [(&str, &str, &str, &str, &str); 8] = [
            (
                "PRJ-001",
                "Customer Portal Redesign",
                "HIGH",
                "DESIGN_PHASE_COMPLETE",
                "Modernize the customer self-service portal",
            ),
            (
                "PRJ-002",
                "Payment Gateway Integration",
                "MEDIUM",
                "IN_PROGRESS",
                "Integrate a second payment provider",
            ),
            (
                "PRJ-003",
                "Mobile App Analytics",
                "MEDIUM",
                "CODE_COMPLETE",
                "In-app analytics for the mobile clients",
            ),
            (
                "PRJ-004",
                "API Gateway Migration",
                "VERY_HIGH",
                "IN_PROGRESS",
                "Move public APIs behind the new gateway",
            ),
            (
                "PRJ-005",
                "Data Pipeline Optimization",
                "MEDIUM",
                "RELEASED",
                "Cut nightly pipeline latency",
            ),
            (
                "PRJ-006",
                "Search Service Upgrade",
                "HIGH",
                "END_OF_LIFE",
                "Replace the legacy search cluster",
            ),
            (
                "PRJ-007",
                "Internal Wiki Refresh",
                "LOW",
                "NOT_STARTED",
                "Refresh the internal knowledge base",
            ),
            (
                "PRJ-008",
                "Notification Service",
                "LOW",
                "RELEASED",
                "Unified email and push notifications",
            ),
        ];

        let entries = seeds
            .iter()
            .enumerate()
            .map(|(i, (id, title, complexity, status, description))| {
                CatalogEntry::new(
                    *id,
                    *title,
                    *complexity,
                    *status,
                    base + Duration::days(15 * i as i64),
                )
                .with_description(*description)
            })
            .collect();

        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidCatalog(e.to_string()))?;
        Self::new(entries)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        debug!("Loading project catalog from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigurationError::InvalidCatalog(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_catalog_covers_all_classes_and_statuses() {
        let catalog = ProjectCatalog::default_catalog();
        assert_eq!(catalog.len(), 8);

        let projects: Vec<Project> = catalog.entries().iter().map(|e| e.resolve().unwrap()).collect();
        for complexity in Complexity::ALL {
            assert!(projects.iter().any(|p| p.complexity == *complexity));
        }
        for status in ProjectStatus::ALL {
            assert!(projects.iter().any(|p| p.status == *status));
        }
        assert_eq!(projects[0].start_date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(projects[1].start_date.to_rfc3339(), "2024-01-16T00:00:00+00:00");
        assert!(projects.iter().all(|p| p.design_completed_at.is_none()));
    }

    #[test]
    fn test_resolve_reports_bad_values() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let entry = CatalogEntry::new("X-1", "Bad", "ENORMOUS", "RELEASED", day);
        assert_eq!(
            entry.resolve(),
            Err(ConfigurationError::InvalidComplexity("ENORMOUS".to_string()))
        );

        let entry = CatalogEntry::new("X-2", "Bad", "LOW", "ABANDONED", day);
        assert_eq!(
            entry.resolve(),
            Err(ConfigurationError::InvalidProjectStatus("ABANDONED".to_string()))
        );
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"[
            {"id": "A", "title": "Alpha", "complexity": "low", "status": "released", "start_date": "2024-03-01"},
            {"id": "B", "title": "Beta", "complexity": "HIGH", "status": "IN_PROGRESS", "start_date": "2024-03-15", "team_size": 9}
        ]"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let beta = catalog.entries()[1].resolve().unwrap();
        assert_eq!(beta.team_size, 9);
        assert_eq!(beta.complexity, Complexity::High);
        assert_eq!(beta.description, "Beta project");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "A", "title": "Alpha", "complexity": "LOW", "status": "RELEASED", "start_date": "2024-03-01"},
            {"id": "A", "title": "Again", "complexity": "LOW", "status": "RELEASED", "start_date": "2024-03-01"}
        ]"#;
        assert!(matches!(
            ProjectCatalog::from_json_str(json),
            Err(ConfigurationError::InvalidCatalog(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_from_path_round_trip() {
        let catalog = ProjectCatalog::default_catalog();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&catalog).unwrap()).unwrap();

        let loaded = ProjectCatalog::from_path(file.path()).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ProjectCatalog::from_path("/nonexistent/catalog.json");
        assert!(matches!(result, Err(ConfigurationError::InvalidCatalog(_))));
    }
}
