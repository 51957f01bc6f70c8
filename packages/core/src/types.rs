// ABOUTME: Entity records and enum domains of a generated SDLC dataset
// ABOUTME: Every enum round-trips through its SCREAMING_SNAKE_CASE text form

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

fn invalid_value(kind: &'static str, value: &str) -> ConfigurationError {
    match kind {
        "complexity" => ConfigurationError::InvalidComplexity(value.to_string()),
        "project status" => ConfigurationError::InvalidProjectStatus(value.to_string()),
        _ => ConfigurationError::InvalidEnumValue {
            kind,
            value: value.to_string(),
        },
    }
}

/// Declares a closed enum with a canonical text form, `Display` and a lenient `FromStr`
/// (case-insensitive, `-` and spaces read as `_`).
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
                $(
                    if normalized == $text.to_uppercase() {
                        return Ok($name::$variant);
                    }
                )+
                Err(invalid_value($kind, s))
            }
        }
    };
}

text_enum! {
    /// Ordinal project-size category driving durations and fan-out
    Complexity as "complexity" {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        VeryHigh => "VERY_HIGH",
    }
}

text_enum! {
    ProjectStatus as "project status" {
        NotStarted => "NOT_STARTED",
        DesignPhaseComplete => "DESIGN_PHASE_COMPLETE",
        InProgress => "IN_PROGRESS",
        CodeComplete => "CODE_COMPLETE",
        Released => "RELEASED",
        EndOfLife => "END_OF_LIFE",
    }
}

impl ProjectStatus {
    /// Statuses whose work is fully resolved
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            ProjectStatus::CodeComplete | ProjectStatus::Released | ProjectStatus::EndOfLife
        )
    }
}

text_enum! {
    /// One of the six fixed design stages, declared in dependency order
    DesignType as "design type" {
        Requirement => "REQUIREMENT",
        UxDesign => "UX_DESIGN",
        Architecture => "ARCHITECTURE",
        DatabaseDesign => "DATABASE_DESIGN",
        ApiDesign => "API_DESIGN",
        SecurityReview => "SECURITY_REVIEW",
    }
}

impl DesignType {
    /// Phases that must end before this one may start
    pub fn predecessors(&self) -> &'static [DesignType] {
        match self {
            DesignType::Requirement => &[],
            DesignType::UxDesign | DesignType::Architecture => &[DesignType::Requirement],
            DesignType::DatabaseDesign | DesignType::ApiDesign => {
                &[DesignType::UxDesign, DesignType::Architecture]
            }
            DesignType::SecurityReview => &[DesignType::DatabaseDesign, DesignType::ApiDesign],
        }
    }

    /// Short code used in identifiers
    pub fn code(&self) -> &'static str {
        match self {
            DesignType::Requirement => "REQ",
            DesignType::UxDesign => "UX",
            DesignType::Architecture => "ARCH",
            DesignType::DatabaseDesign => "DB",
            DesignType::ApiDesign => "API",
            DesignType::SecurityReview => "SEC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DesignType::Requirement => "Requirements",
            DesignType::UxDesign => "UX Design",
            DesignType::Architecture => "Architecture",
            DesignType::DatabaseDesign => "Database Design",
            DesignType::ApiDesign => "API Design",
            DesignType::SecurityReview => "Security Review",
        }
    }
}

text_enum! {
    DesignStage as "design stage" {
        Start => "START",
        Blocked => "BLOCKED",
        Resume => "RESUME",
        End => "END",
    }
}

text_enum! {
    JiraType as "jira type" {
        Epic => "EPIC",
        Story => "STORY",
        Task => "TASK",
    }
}

text_enum! {
    JiraStatus as "jira status" {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Closed => "CLOSED",
        Fixed => "FIXED",
    }
}

impl JiraStatus {
    /// Whether the status implies a completion date
    pub fn is_done(&self) -> bool {
        matches!(self, JiraStatus::Closed | JiraStatus::Fixed)
    }
}

text_enum! {
    CommitType as "commit type" {
        Feature => "feature",
        Bugfix => "bugfix",
        Refactor => "refactor",
        Docs => "docs",
        Test => "test",
    }
}

text_enum! {
    PrStatus as "pull request status" {
        Open => "OPEN",
        Blocked => "BLOCKED",
        Merged => "MERGED",
    }
}

text_enum! {
    /// Deployment environments in build-chain order
    Environment as "environment" {
        Dev => "DEV",
        Qa => "QA",
        Staging => "STAGING",
        Production => "PRODUCTION",
    }
}

impl Environment {
    pub fn next(&self) -> Option<Environment> {
        match self {
            Environment::Dev => Some(Environment::Qa),
            Environment::Qa => Some(Environment::Staging),
            Environment::Staging => Some(Environment::Production),
            Environment::Production => None,
        }
    }

    /// Position in the DEV→QA→STAGING→PRODUCTION chain
    pub fn position(&self) -> usize {
        match self {
            Environment::Dev => 0,
            Environment::Qa => 1,
            Environment::Staging => 2,
            Environment::Production => 3,
        }
    }
}

text_enum! {
    BuildStatus as "build status" {
        Success => "SUCCESS",
        Failure => "FAILURE",
    }
}

text_enum! {
    BuildMode as "build mode" {
        Automatic => "AUTOMATIC",
        Manual => "MANUAL",
    }
}

text_enum! {
    BugStatus as "bug status" {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Blocked => "BLOCKED",
        Fixed => "FIXED",
        Closed => "CLOSED",
    }
}

text_enum! {
    BugType as "bug type" {
        Security => "SECURITY",
        Performance => "PERFORMANCE",
        Functionality => "FUNCTIONALITY",
        Data => "DATA",
        UiUx => "UI_UX",
    }
}

text_enum! {
    ImpactArea as "impact area" {
        Customer => "CUSTOMER",
        Internal => "INTERNAL",
        Integration => "INTEGRATION",
        Infrastructure => "INFRASTRUCTURE",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub complexity: Complexity,
    pub status: ProjectStatus,
    pub start_date: DateTime<Utc>,
    pub team_size: u32,
    /// Unset until the last design phase ends; never set for NOT_STARTED projects
    pub design_completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignEvent {
    pub id: String,
    pub project_id: String,
    pub design_type: DesignType,
    pub stage: DesignStage,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub jira_id: Option<String>,
    pub stakeholders: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraItem {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: JiraType,
    pub title: String,
    pub status: JiraStatus,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub story_points: u32,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub assigned_developer: String,
    /// Set only on the synthetic jira recording a design phase
    pub design_type: Option<DesignType>,
}

impl JiraItem {
    pub fn is_design(&self) -> bool {
        self.design_type.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub project_id: String,
    pub sprint_number: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub planned_story_points: u32,
    pub completed_story_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCommit {
    pub id: String,
    pub project_id: String,
    pub jira_id: String,
    pub repository: String,
    pub branch: String,
    pub author: String,
    pub commit_hash: String,
    pub commit_type: CommitType,
    pub timestamp: DateTime<Utc>,
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_removed: u32,
    pub code_coverage: f64,
    pub lint_score: f64,
    pub review_time_minutes: u32,
    pub comments_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub branch_from: String,
    pub branch_to: String,
    pub author: String,
    pub status: PrStatus,
    pub created_at: DateTime<Utc>,
    pub review_started_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub commit_ids: Vec<String>,
    /// Timestamp of the latest constituent commit
    pub last_commit_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrComment {
    pub id: String,
    pub pr_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CicdEvent {
    pub id: String,
    pub project_id: String,
    pub pr_id: Option<String>,
    /// Shared by every event of one automatic chain
    pub chain_id: Option<String>,
    pub environment: Environment,
    pub status: BuildStatus,
    pub build_id: String,
    pub branch: String,
    pub mode: BuildMode,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u32,
    pub release_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bug {
    pub id: String,
    pub project_id: String,
    pub build_id: String,
    pub build_timestamp: DateTime<Utc>,
    pub severity: String,
    pub bug_type: BugType,
    pub impact_area: ImpactArea,
    pub title: String,
    pub status: BugStatus,
    pub environment_found: Environment,
    pub assigned_to: String,
    pub created_date: DateTime<Utc>,
    pub resolved_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
    pub resolution_time_hours: Option<f64>,
    pub root_cause: Option<String>,
}
