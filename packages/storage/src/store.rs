use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::Row;
use tracing::{debug, info};

use sdlcgen_core::{
    Bug, CicdEvent, CodeCommit, Dataset, DatasetCounts, DateRange, DesignEvent, PullRequest,
};

use crate::rows;
use crate::StorageResult;

/// Tables in load order; deletes run in reverse
const TABLES: [&str; 11] = [
    "projects",
    "design_events",
    "jira_items",
    "sprints",
    "sprint_jira",
    "code_commits",
    "pull_requests",
    "pr_commits",
    "pr_comments",
    "cicd_events",
    "bugs",
];

/// Half-open UTC interval covering every day of `range`
fn bounds(range: &DateRange) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&range.start().and_time(NaiveTime::MIN));
    let end = Utc.from_utc_datetime(&range.end().and_time(NaiveTime::MIN)) + Duration::days(1);
    (start, end)
}

/// A store supporting bulk loads and filtered range queries by project and timestamp
#[derive(Clone)]
pub struct SdlcStore {
    pool: SqlitePool,
}

impl SdlcStore {
    /// Open (creating if needed) a database file and apply migrations
    pub async fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!("Opened database at {}", path.display());
        Self::from_pool(pool).await
    }

    /// A private in-memory database; a single connection keeps every query on it
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Replace the stored dataset in one transaction, writing tables in dependency order
    pub async fn bulk_load(&self, dataset: &Dataset) -> StorageResult<DatasetCounts> {
        let mut tx = self.pool.begin().await?;

        for table in TABLES.iter().rev() {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        insert_projects(&mut tx, dataset).await?;
        insert_design_events(&mut tx, dataset).await?;
        insert_jira_items(&mut tx, dataset).await?;
        insert_sprints(&mut tx, dataset).await?;
        insert_commits(&mut tx, dataset).await?;
        insert_pull_requests(&mut tx, dataset).await?;
        insert_cicd_events(&mut tx, dataset).await?;
        insert_bugs(&mut tx, dataset).await?;

        tx.commit().await?;

        let counts = dataset.counts();
        info!(
            "Loaded {} projects, {} jira items, {} commits, {} builds, {} bugs",
            counts.projects, counts.jira_items, counts.commits, counts.cicd_events, counts.bugs
        );
        Ok(counts)
    }

    /// Read the whole dataset back in insertion order
    pub async fn load_dataset(&self) -> StorageResult<Dataset> {
        let mut dataset = Dataset {
            projects: self.fetch_all("projects", rows::project).await?,
            design_events: self.fetch_all("design_events", rows::design_event).await?,
            jira_items: self.fetch_all("jira_items", rows::jira_item).await?,
            sprints: self.fetch_all("sprints", rows::sprint).await?,
            commits: self.fetch_all("code_commits", rows::commit).await?,
            pull_requests: self.fetch_all("pull_requests", rows::pull_request).await?,
            pr_comments: self.fetch_all("pr_comments", rows::pr_comment).await?,
            cicd_events: self.fetch_all("cicd_events", rows::cicd_event).await?,
            bugs: self.fetch_all("bugs", rows::bug).await?,
            ..Dataset::default()
        };

        let links =
            sqlx::query("SELECT sprint_id, jira_id FROM sprint_jira ORDER BY sprint_id, position")
                .fetch_all(&self.pool)
                .await?;
        for row in links {
            let sprint_id: String = row.try_get("sprint_id")?;
            let jira_id: String = row.try_get("jira_id")?;
            dataset.sprint_jira.entry(sprint_id).or_default().push(jira_id);
        }

        self.attach_commit_ids(&mut dataset.pull_requests).await?;

        debug!("Loaded snapshot with {} projects", dataset.projects.len());
        Ok(dataset)
    }

    pub async fn design_events_in(
        &self,
        project_id: Option<&str>,
        range: &DateRange,
    ) -> StorageResult<Vec<DesignEvent>> {
        self.fetch_range("design_events", "timestamp", project_id, range, rows::design_event)
            .await
    }

    pub async fn commits_in(
        &self,
        project_id: Option<&str>,
        range: &DateRange,
    ) -> StorageResult<Vec<CodeCommit>> {
        self.fetch_range("code_commits", "timestamp", project_id, range, rows::commit)
            .await
    }

    /// Pull requests created inside the range, with their commit ids
    pub async fn pull_requests_in(
        &self,
        project_id: Option<&str>,
        range: &DateRange,
    ) -> StorageResult<Vec<PullRequest>> {
        let mut prs = self
            .fetch_range("pull_requests", "created_at", project_id, range, rows::pull_request)
            .await?;
        self.attach_commit_ids(&mut prs).await?;
        Ok(prs)
    }

    pub async fn cicd_events_in(
        &self,
        project_id: Option<&str>,
        range: &DateRange,
    ) -> StorageResult<Vec<CicdEvent>> {
        self.fetch_range("cicd_events", "timestamp", project_id, range, rows::cicd_event)
            .await
    }

    /// Bugs created inside the range
    pub async fn bugs_in(&self, project_id: Option<&str>, range: &DateRange) -> StorageResult<Vec<Bug>> {
        self.fetch_range("bugs", "created_date", project_id, range, rows::bug)
            .await
    }

    async fn fetch_all<T>(
        &self,
        table: &'static str,
        decode: fn(&SqliteRow) -> StorageResult<T>,
    ) -> StorageResult<Vec<T>> {
        let rows = sqlx::query(&format!("SELECT * FROM {table} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn fetch_range<T>(
        &self,
        table: &'static str,
        column: &'static str,
        project_id: Option<&str>,
        range: &DateRange,
        decode: fn(&SqliteRow) -> StorageResult<T>,
    ) -> StorageResult<Vec<T>> {
        let (from, to) = bounds(range);
        let sql = format!(
            "SELECT * FROM {table} \
             WHERE (?1 IS NULL OR project_id = ?1) AND {column} >= ?2 AND {column} < ?3 \
             ORDER BY {column}, rowid"
        );
        let rows = sqlx::query(&sql)
            .bind(project_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn attach_commit_ids(&self, prs: &mut [PullRequest]) -> StorageResult<()> {
        if prs.is_empty() {
            return Ok(());
        }
        let links = sqlx::query("SELECT pr_id, commit_id FROM pr_commits ORDER BY pr_id, position")
            .fetch_all(&self.pool)
            .await?;

        let mut by_pr: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in links {
            let pr_id: String = row.try_get("pr_id")?;
            let commit_id: String = row.try_get("commit_id")?;
            by_pr.entry(pr_id).or_default().push(commit_id);
        }
        for pr in prs.iter_mut() {
            pr.commit_ids = by_pr.remove(&pr.id).unwrap_or_default();
        }
        Ok(())
    }
}

async fn insert_projects(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for p in &dataset.projects {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, title, description, complexity, status, start_date, team_size, design_completed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&p.id)
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.complexity.as_str())
        .bind(p.status.as_str())
        .bind(p.start_date)
        .bind(p.team_size)
        .bind(p.design_completed_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_design_events(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for e in &dataset.design_events {
        sqlx::query(
            r#"
            INSERT INTO design_events (
                id, project_id, design_type, stage, timestamp, author, jira_id, stakeholders
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&e.id)
        .bind(&e.project_id)
        .bind(e.design_type.as_str())
        .bind(e.stage.as_str())
        .bind(e.timestamp)
        .bind(&e.author)
        .bind(&e.jira_id)
        .bind(&e.stakeholders)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_jira_items(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for j in &dataset.jira_items {
        sqlx::query(
            r#"
            INSERT INTO jira_items (
                id, project_id, parent_id, type, title, status, created_date, completed_date,
                story_points, estimated_hours, actual_hours, assigned_developer, design_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&j.id)
        .bind(&j.project_id)
        .bind(&j.parent_id)
        .bind(j.item_type.as_str())
        .bind(&j.title)
        .bind(j.status.as_str())
        .bind(j.created_date)
        .bind(j.completed_date)
        .bind(j.story_points)
        .bind(j.estimated_hours)
        .bind(j.actual_hours)
        .bind(&j.assigned_developer)
        .bind(j.design_type.map(|d| d.as_str()))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_sprints(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for s in &dataset.sprints {
        sqlx::query(
            r#"
            INSERT INTO sprints (
                id, project_id, sprint_number, start_date, end_date,
                planned_story_points, completed_story_points
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&s.id)
        .bind(&s.project_id)
        .bind(s.sprint_number)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(s.planned_story_points)
        .bind(s.completed_story_points)
        .execute(&mut *conn)
        .await?;
    }

    for (sprint_id, jira_ids) in &dataset.sprint_jira {
        for (position, jira_id) in jira_ids.iter().enumerate() {
            sqlx::query("INSERT INTO sprint_jira (sprint_id, jira_id, position) VALUES (?, ?, ?)")
                .bind(sprint_id)
                .bind(jira_id)
                .bind(position as i64)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn insert_commits(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for c in &dataset.commits {
        sqlx::query(
            r#"
            INSERT INTO code_commits (
                id, project_id, jira_id, repository, branch, author, commit_hash, commit_type,
                timestamp, files_changed, lines_added, lines_removed, code_coverage, lint_score,
                review_time_minutes, comments_count
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&c.id)
        .bind(&c.project_id)
        .bind(&c.jira_id)
        .bind(&c.repository)
        .bind(&c.branch)
        .bind(&c.author)
        .bind(&c.commit_hash)
        .bind(c.commit_type.as_str())
        .bind(c.timestamp)
        .bind(c.files_changed)
        .bind(c.lines_added)
        .bind(c.lines_removed)
        .bind(c.code_coverage)
        .bind(c.lint_score)
        .bind(c.review_time_minutes)
        .bind(c.comments_count)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_pull_requests(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for pr in &dataset.pull_requests {
        sqlx::query(
            r#"
            INSERT INTO pull_requests (
                id, project_id, title, branch_from, branch_to, author, status,
                created_at, review_started_at, merged_at, last_commit_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.project_id)
        .bind(&pr.title)
        .bind(&pr.branch_from)
        .bind(&pr.branch_to)
        .bind(&pr.author)
        .bind(pr.status.as_str())
        .bind(pr.created_at)
        .bind(pr.review_started_at)
        .bind(pr.merged_at)
        .bind(pr.last_commit_at)
        .execute(&mut *conn)
        .await?;

        for (position, commit_id) in pr.commit_ids.iter().enumerate() {
            sqlx::query("INSERT INTO pr_commits (pr_id, commit_id, position) VALUES (?, ?, ?)")
                .bind(&pr.id)
                .bind(commit_id)
                .bind(position as i64)
                .execute(&mut *conn)
                .await?;
        }
    }

    for comment in &dataset.pr_comments {
        sqlx::query(
            "INSERT INTO pr_comments (id, pr_id, author, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.pr_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_cicd_events(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for e in &dataset.cicd_events {
        sqlx::query(
            r#"
            INSERT INTO cicd_events (
                id, project_id, pr_id, chain_id, environment, status, build_id, branch, mode,
                timestamp, duration_seconds, release_version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&e.id)
        .bind(&e.project_id)
        .bind(&e.pr_id)
        .bind(&e.chain_id)
        .bind(e.environment.as_str())
        .bind(e.status.as_str())
        .bind(&e.build_id)
        .bind(&e.branch)
        .bind(e.mode.as_str())
        .bind(e.timestamp)
        .bind(e.duration_seconds)
        .bind(&e.release_version)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_bugs(conn: &mut SqliteConnection, dataset: &Dataset) -> StorageResult<()> {
    for b in &dataset.bugs {
        sqlx::query(
            r#"
            INSERT INTO bugs (
                id, project_id, build_id, build_timestamp, severity, bug_type, impact_area, title,
                status, environment_found, assigned_to, created_date, resolved_date, close_date,
                resolution_time_hours, root_cause
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&b.id)
        .bind(&b.project_id)
        .bind(&b.build_id)
        .bind(b.build_timestamp)
        .bind(&b.severity)
        .bind(b.bug_type.as_str())
        .bind(b.impact_area.as_str())
        .bind(&b.title)
        .bind(b.status.as_str())
        .bind(b.environment_found.as_str())
        .bind(&b.assigned_to)
        .bind(b.created_date)
        .bind(b.resolved_date)
        .bind(b.close_date)
        .bind(b.resolution_time_hours)
        .bind(&b.root_cause)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
