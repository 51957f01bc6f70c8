// ABOUTME: Row decoding for every persisted entity
// ABOUTME: Enum columns hold their canonical text; unknown text is reported as corruption

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use sdlcgen_core::{
    Bug, CicdEvent, CodeCommit, ConfigurationError, DesignEvent, JiraItem, PrComment, Project,
    PullRequest, Sprint,
};

use crate::{StorageError, StorageResult};

fn text_enum<T>(row: &SqliteRow, column: &str) -> StorageResult<T>
where
    T: FromStr<Err = ConfigurationError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: ConfigurationError| StorageError::Corrupt(format!("{column}: {e}")))
}

fn optional_text_enum<T>(row: &SqliteRow, column: &str) -> StorageResult<Option<T>>
where
    T: FromStr<Err = ConfigurationError>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        value
            .parse()
            .map_err(|e: ConfigurationError| StorageError::Corrupt(format!("{column}: {e}")))
    })
    .transpose()
}

pub(crate) fn project(row: &SqliteRow) -> StorageResult<Project> {
    Ok(Project {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        complexity: text_enum(row, "complexity")?,
        status: text_enum(row, "status")?,
        start_date: row.try_get("start_date")?,
        team_size: row.try_get("team_size")?,
        design_completed_at: row.try_get("design_completed_at")?,
    })
}

pub(crate) fn design_event(row: &SqliteRow) -> StorageResult<DesignEvent> {
    Ok(DesignEvent {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        design_type: text_enum(row, "design_type")?,
        stage: text_enum(row, "stage")?,
        timestamp: row.try_get("timestamp")?,
        author: row.try_get("author")?,
        jira_id: row.try_get("jira_id")?,
        stakeholders: row.try_get("stakeholders")?,
    })
}

pub(crate) fn jira_item(row: &SqliteRow) -> StorageResult<JiraItem> {
    Ok(JiraItem {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        parent_id: row.try_get("parent_id")?,
        item_type: text_enum(row, "type")?,
        title: row.try_get("title")?,
        status: text_enum(row, "status")?,
        created_date: row.try_get("created_date")?,
        completed_date: row.try_get("completed_date")?,
        story_points: row.try_get("story_points")?,
        estimated_hours: row.try_get("estimated_hours")?,
        actual_hours: row.try_get("actual_hours")?,
        assigned_developer: row.try_get("assigned_developer")?,
        design_type: optional_text_enum(row, "design_type")?,
    })
}

pub(crate) fn sprint(row: &SqliteRow) -> StorageResult<Sprint> {
    Ok(Sprint {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        sprint_number: row.try_get("sprint_number")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        planned_story_points: row.try_get("planned_story_points")?,
        completed_story_points: row.try_get("completed_story_points")?,
    })
}

pub(crate) fn commit(row: &SqliteRow) -> StorageResult<CodeCommit> {
    Ok(CodeCommit {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        jira_id: row.try_get("jira_id")?,
        repository: row.try_get("repository")?,
        branch: row.try_get("branch")?,
        author: row.try_get("author")?,
        commit_hash: row.try_get("commit_hash")?,
        commit_type: text_enum(row, "commit_type")?,
        timestamp: row.try_get("timestamp")?,
        files_changed: row.try_get("files_changed")?,
        lines_added: row.try_get("lines_added")?,
        lines_removed: row.try_get("lines_removed")?,
        code_coverage: row.try_get("code_coverage")?,
        lint_score: row.try_get("lint_score")?,
        review_time_minutes: row.try_get("review_time_minutes")?,
        comments_count: row.try_get("comments_count")?,
    })
}

/// Commit ids are filled in separately from `pr_commits`
pub(crate) fn pull_request(row: &SqliteRow) -> StorageResult<PullRequest> {
    Ok(PullRequest {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        title: row.try_get("title")?,
        branch_from: row.try_get("branch_from")?,
        branch_to: row.try_get("branch_to")?,
        author: row.try_get("author")?,
        status: text_enum(row, "status")?,
        created_at: row.try_get("created_at")?,
        review_started_at: row.try_get("review_started_at")?,
        merged_at: row.try_get("merged_at")?,
        commit_ids: Vec::new(),
        last_commit_at: row.try_get("last_commit_at")?,
    })
}

pub(crate) fn pr_comment(row: &SqliteRow) -> StorageResult<PrComment> {
    Ok(PrComment {
        id: row.try_get("id")?,
        pr_id: row.try_get("pr_id")?,
        author: row.try_get("author")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn cicd_event(row: &SqliteRow) -> StorageResult<CicdEvent> {
    Ok(CicdEvent {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        pr_id: row.try_get("pr_id")?,
        chain_id: row.try_get("chain_id")?,
        environment: text_enum(row, "environment")?,
        status: text_enum(row, "status")?,
        build_id: row.try_get("build_id")?,
        branch: row.try_get("branch")?,
        mode: text_enum(row, "mode")?,
        timestamp: row.try_get("timestamp")?,
        duration_seconds: row.try_get("duration_seconds")?,
        release_version: row.try_get("release_version")?,
    })
}

pub(crate) fn bug(row: &SqliteRow) -> StorageResult<Bug> {
    Ok(Bug {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        build_id: row.try_get("build_id")?,
        build_timestamp: row.try_get("build_timestamp")?,
        severity: row.try_get("severity")?,
        bug_type: text_enum(row, "bug_type")?,
        impact_area: text_enum(row, "impact_area")?,
        title: row.try_get("title")?,
        status: text_enum(row, "status")?,
        environment_found: text_enum(row, "environment_found")?,
        assigned_to: row.try_get("assigned_to")?,
        created_date: row.try_get("created_date")?,
        resolved_date: row.try_get("resolved_date")?,
        close_date: row.try_get("close_date")?,
        resolution_time_hours: row.try_get("resolution_time_hours")?,
        root_cause: row.try_get("root_cause")?,
    })
}
