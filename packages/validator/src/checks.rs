use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use sdlcgen_core::{BuildMode, BuildStatus, DesignStage, DesignType, JiraItem, PrStatus};

use crate::TimelineSource;

type Timestamp = DateTime<Utc>;

fn ts(t: Timestamp) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn hours_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

pub(crate) fn design_sprint<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let done: HashMap<&str, Option<Timestamp>> = source
        .projects()
        .iter()
        .map(|p| (p.id.as_str(), p.design_completed_at))
        .collect();

    let mut findings = Vec::new();
    for sprint in source.sprints() {
        match done.get(sprint.project_id.as_str()) {
            None => {}
            Some(None) => findings.push(format!(
                "Sprint {} exists but project {} has no design completion",
                sprint.id, sprint.project_id
            )),
            Some(Some(completed)) if sprint.start_date < *completed => findings.push(format!(
                "Sprint {} starts {} before design completion {} of project {}",
                sprint.id,
                ts(sprint.start_date),
                ts(*completed),
                sprint.project_id
            )),
            Some(Some(_)) => {}
        }
    }
    findings
}

/// The earliest associated sprint must start by the jira's creation and the
/// latest must end no earlier than its completion
pub(crate) fn sprint_jira<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let sprints: HashMap<&str, (Timestamp, Timestamp)> = source
        .sprints()
        .iter()
        .map(|s| (s.id.as_str(), (s.start_date, s.end_date)))
        .collect();
    let jiras: HashMap<&str, &JiraItem> = source.jira_items().iter().map(|j| (j.id.as_str(), j)).collect();

    let mut spans: BTreeMap<&str, (Timestamp, Timestamp)> = BTreeMap::new();
    for (sprint_id, jira_ids) in source.sprint_jira() {
        let Some((start, end)) = sprints.get(sprint_id.as_str()).copied() else {
            continue;
        };
        for jira_id in jira_ids {
            spans
                .entry(jira_id.as_str())
                .and_modify(|(first, last)| {
                    *first = (*first).min(start);
                    *last = (*last).max(end);
                })
                .or_insert((start, end));
        }
    }

    let mut findings = Vec::new();
    for (jira_id, (first, last)) in spans {
        let Some(jira) = jiras.get(jira_id) else {
            continue;
        };
        if first > jira.created_date {
            findings.push(format!(
                "Jira {} created {} before its first sprint starts {}",
                jira.id,
                ts(jira.created_date),
                ts(first)
            ));
        }
        if let Some(completed) = jira.completed_date {
            if completed > last {
                findings.push(format!(
                    "Jira {} completed {} after its last sprint ends {}",
                    jira.id,
                    ts(completed),
                    ts(last)
                ));
            }
        }
    }
    findings
}

pub(crate) fn commit_jira<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let completed: HashMap<&str, Option<Timestamp>> = source
        .jira_items()
        .iter()
        .map(|j| (j.id.as_str(), j.completed_date))
        .collect();

    let mut findings = Vec::new();
    for commit in source.commits() {
        match completed.get(commit.jira_id.as_str()) {
            None => {}
            Some(None) => findings.push(format!(
                "Commit {} references jira {} which has no completion date",
                commit.id, commit.jira_id
            )),
            Some(Some(done)) if commit.timestamp <= *done => findings.push(format!(
                "Commit {} at {} does not follow completion of jira {} at {}",
                commit.id,
                ts(commit.timestamp),
                commit.jira_id,
                ts(*done)
            )),
            Some(Some(_)) => {}
        }
    }
    findings
}

pub(crate) fn pr_commit<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let commits: HashMap<&str, Timestamp> = source
        .commits()
        .iter()
        .map(|c| (c.id.as_str(), c.timestamp))
        .collect();

    let mut findings = Vec::new();
    for pr in source.pull_requests() {
        let last = pr
            .commit_ids
            .iter()
            .filter_map(|id| commits.get(id.as_str()))
            .max()
            .copied()
            .unwrap_or(pr.last_commit_at)
            .max(pr.last_commit_at);

        if pr.created_at <= last {
            findings.push(format!(
                "Pull request {} created {} before its last commit at {}",
                pr.id,
                ts(pr.created_at),
                ts(last)
            ));
        }
        match (pr.status, pr.merged_at) {
            (PrStatus::Merged, None) => {
                findings.push(format!("Pull request {} is MERGED without a merge time", pr.id))
            }
            (PrStatus::Merged, Some(merged)) if merged <= pr.created_at => findings.push(format!(
                "Pull request {} merged {} before it was created {}",
                pr.id,
                ts(merged),
                ts(pr.created_at)
            )),
            (status, Some(_)) if status != PrStatus::Merged => findings.push(format!(
                "Pull request {} is {} but has a merge time",
                pr.id, status
            )),
            _ => {}
        }
    }
    findings
}

pub(crate) fn cicd_pr<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let merges: HashMap<&str, Option<Timestamp>> = source
        .pull_requests()
        .iter()
        .map(|pr| (pr.id.as_str(), pr.merged_at))
        .collect();

    let mut findings = Vec::new();
    for event in source.cicd_events() {
        let Some(pr_id) = event.pr_id.as_deref() else {
            continue;
        };
        match merges.get(pr_id) {
            None => {}
            Some(None) => findings.push(format!(
                "Build {} runs for pull request {} which was never merged",
                event.build_id, pr_id
            )),
            Some(Some(merged)) if event.timestamp <= *merged => findings.push(format!(
                "Build {} in {} at {} precedes merge of pull request {} at {}",
                event.build_id,
                event.environment,
                ts(event.timestamp),
                pr_id,
                ts(*merged)
            )),
            Some(Some(_)) => {}
        }
    }
    findings
}

pub(crate) fn bug_build<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let builds: HashMap<&str, Timestamp> = source
        .cicd_events()
        .iter()
        .map(|e| (e.build_id.as_str(), e.timestamp))
        .collect();

    let mut findings = Vec::new();
    for bug in source.bugs() {
        if let Some(built) = builds.get(bug.build_id.as_str()) {
            if bug.created_date <= *built {
                findings.push(format!(
                    "Bug {} created {} before build {} at {}",
                    bug.id,
                    ts(bug.created_date),
                    bug.build_id,
                    ts(*built)
                ));
            }
        }

        match (bug.resolved_date, bug.resolution_time_hours) {
            (Some(resolved), Some(worked)) => {
                let elapsed = hours_between(bug.created_date, resolved);
                if !(worked > 0.0 && worked < elapsed) {
                    findings.push(format!(
                        "Bug {} reports {:.2} resolution hours outside (0, {:.2})",
                        bug.id, worked, elapsed
                    ));
                }
            }
            (Some(_), None) => findings.push(format!(
                "Bug {} is resolved without a resolution time",
                bug.id
            )),
            (None, Some(_)) => findings.push(format!(
                "Bug {} has a resolution time but no resolved date",
                bug.id
            )),
            (None, None) => {}
        }

        if let Some(closed) = bug.close_date {
            match bug.resolved_date {
                Some(resolved) if closed >= resolved => {}
                Some(resolved) => findings.push(format!(
                    "Bug {} closed {} before it was resolved {}",
                    bug.id,
                    ts(closed),
                    ts(resolved)
                )),
                None => findings.push(format!("Bug {} is closed but was never resolved", bug.id)),
            }
        }
    }
    findings
}

/// Parents are created no later than their children and complete no earlier
pub(crate) fn jira_hierarchy<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let items: HashMap<&str, &JiraItem> = source.jira_items().iter().map(|j| (j.id.as_str(), j)).collect();

    let mut findings = Vec::new();
    for child in source.jira_items() {
        let Some(parent) = child.parent_id.as_deref().and_then(|id| items.get(id)) else {
            continue;
        };
        if parent.created_date > child.created_date {
            findings.push(format!(
                "{} {} created {} after its child {} {} created {}",
                parent.item_type,
                parent.id,
                ts(parent.created_date),
                child.item_type,
                child.id,
                ts(child.created_date)
            ));
        }
        if let (Some(parent_done), Some(child_done)) = (parent.completed_date, child.completed_date) {
            if parent_done < child_done {
                findings.push(format!(
                    "{} {} completed {} before its child {} completed {}",
                    parent.item_type,
                    parent.id,
                    ts(parent_done),
                    child.id,
                    ts(child_done)
                ));
            }
        }
    }
    findings
}

/// Completion dates follow creation, agree with status, and cascade: a parent
/// is complete exactly when all of its children are
pub(crate) fn jira_completion<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&JiraItem>> = HashMap::new();
    for item in source.jira_items() {
        if let Some(parent) = item.parent_id.as_deref() {
            children.entry(parent).or_default().push(item);
        }
    }

    let mut findings = Vec::new();
    for item in source.jira_items() {
        if let Some(done) = item.completed_date {
            if done < item.created_date {
                findings.push(format!(
                    "Jira {} completed {} before it was created {}",
                    item.id,
                    ts(done),
                    ts(item.created_date)
                ));
            }
        }
        if item.status.is_done() != item.completed_date.is_some() {
            findings.push(format!(
                "Jira {} is {} but completion date is {}",
                item.id,
                item.status,
                if item.completed_date.is_some() { "set" } else { "missing" }
            ));
        }
        if let Some(kids) = children.get(item.id.as_str()) {
            let all_done = kids.iter().all(|k| k.completed_date.is_some());
            if all_done != item.completed_date.is_some() {
                findings.push(format!(
                    "{} {} completion ({}) disagrees with its children (all complete: {})",
                    item.item_type,
                    item.id,
                    if item.completed_date.is_some() { "set" } else { "missing" },
                    all_done
                ));
            }
        }
    }
    findings
}

#[derive(Default)]
struct PhaseSpan {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
    interruptions: Vec<(DesignStage, Timestamp)>,
}

pub(crate) fn design_phase_order<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let mut phases: BTreeMap<(&str, DesignType), PhaseSpan> = BTreeMap::new();
    for event in source.design_events() {
        let span = phases
            .entry((event.project_id.as_str(), event.design_type))
            .or_default();
        match event.stage {
            DesignStage::Start => span.start = Some(event.timestamp),
            DesignStage::End => span.end = Some(event.timestamp),
            stage => span.interruptions.push((stage, event.timestamp)),
        }
    }

    let mut findings = Vec::new();
    for ((project_id, phase), span) in &phases {
        let Some(start) = span.start else {
            if span.end.is_some() {
                findings.push(format!("{} {} ends without starting", project_id, phase));
            }
            continue;
        };

        for pred in phase.predecessors() {
            match phases.get(&(*project_id, *pred)).and_then(|p| p.end) {
                None => findings.push(format!(
                    "{} {} starts {} before {} has ended",
                    project_id,
                    phase,
                    ts(start),
                    pred
                )),
                Some(pred_end) if start <= pred_end => findings.push(format!(
                    "{} {} starts {} before {} ends {}",
                    project_id,
                    phase,
                    ts(start),
                    pred,
                    ts(pred_end)
                )),
                Some(_) => {}
            }
        }

        if let Some(end) = span.end {
            if end <= start {
                findings.push(format!(
                    "{} {} ends {} before it starts {}",
                    project_id,
                    phase,
                    ts(end),
                    ts(start)
                ));
            }
        }
        for (stage, at) in &span.interruptions {
            let after_end = span.end.is_some_and(|end| *at > end);
            if *at < start || after_end {
                findings.push(format!(
                    "{} {} {} event at {} falls outside the phase",
                    project_id,
                    phase,
                    stage,
                    ts(*at)
                ));
            }
        }
    }
    findings
}

/// Automatic chains visit environments in order without gaps, strictly later
/// each step, and record nothing after a failure
pub(crate) fn cicd_chain<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let mut chains: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let events = source.cicd_events();
    for (i, event) in events.iter().enumerate() {
        if event.mode != BuildMode::Automatic {
            continue;
        }
        if let Some(chain) = event.chain_id.as_deref() {
            chains.entry(chain).or_default().push(i);
        }
    }

    let mut findings = Vec::new();
    for (chain, mut indices) in chains {
        indices.sort_by_key(|i| events[*i].environment.position());

        let mut failed = false;
        let mut previous: Option<Timestamp> = None;
        for (step, i) in indices.iter().enumerate() {
            let event = &events[*i];
            if event.environment.position() != step {
                findings.push(format!(
                    "Chain {} has {} at step {}",
                    chain,
                    event.environment,
                    step + 1
                ));
            }
            if failed {
                findings.push(format!(
                    "Chain {} records {} in {} after a failure",
                    chain, event.status, event.environment
                ));
            }
            if let Some(prev) = previous {
                if event.timestamp <= prev {
                    findings.push(format!(
                        "Chain {} reaches {} at {} no later than the previous stage at {}",
                        chain,
                        event.environment,
                        ts(event.timestamp),
                        ts(prev)
                    ));
                }
            }
            failed |= event.status == BuildStatus::Failure;
            previous = Some(event.timestamp);
        }
    }
    findings
}

/// Every foreign key resolves
pub(crate) fn references<S: TimelineSource + ?Sized>(source: &S) -> Vec<String> {
    let projects: HashSet<&str> = source.projects().iter().map(|p| p.id.as_str()).collect();
    let jiras: HashSet<&str> = source.jira_items().iter().map(|j| j.id.as_str()).collect();
    let sprints: HashSet<&str> = source.sprints().iter().map(|s| s.id.as_str()).collect();
    let commits: HashSet<&str> = source.commits().iter().map(|c| c.id.as_str()).collect();
    let prs: HashSet<&str> = source.pull_requests().iter().map(|p| p.id.as_str()).collect();
    let builds: HashSet<&str> = source.cicd_events().iter().map(|e| e.build_id.as_str()).collect();

    let mut findings = Vec::new();
    let mut dangling = |entity: &str, id: &str, target: &str, target_id: &str| {
        findings.push(format!("{} {} references missing {} {}", entity, id, target, target_id));
    };

    let owners = source
        .design_events()
        .iter()
        .map(|e| ("Design event", e.id.as_str(), e.project_id.as_str()))
        .chain(source.jira_items().iter().map(|j| ("Jira", j.id.as_str(), j.project_id.as_str())))
        .chain(source.sprints().iter().map(|s| ("Sprint", s.id.as_str(), s.project_id.as_str())))
        .chain(source.commits().iter().map(|c| ("Commit", c.id.as_str(), c.project_id.as_str())))
        .chain(
            source
                .pull_requests()
                .iter()
                .map(|p| ("Pull request", p.id.as_str(), p.project_id.as_str())),
        )
        .chain(
            source
                .cicd_events()
                .iter()
                .map(|e| ("Build", e.build_id.as_str(), e.project_id.as_str())),
        )
        .chain(source.bugs().iter().map(|b| ("Bug", b.id.as_str(), b.project_id.as_str())));
    for (entity, id, project_id) in owners {
        if !projects.contains(project_id) {
            dangling(entity, id, "project", project_id);
        }
    }

    for event in source.design_events() {
        if let Some(jira_id) = event.jira_id.as_deref() {
            if !jiras.contains(jira_id) {
                dangling("Design event", &event.id, "jira", jira_id);
            }
        }
    }
    for item in source.jira_items() {
        if let Some(parent) = item.parent_id.as_deref() {
            if !jiras.contains(parent) {
                dangling("Jira", &item.id, "parent", parent);
            }
        }
    }
    for (sprint_id, jira_ids) in source.sprint_jira() {
        if !sprints.contains(sprint_id.as_str()) {
            dangling("Sprint association", sprint_id, "sprint", sprint_id);
        }
        for jira_id in jira_ids {
            if !jiras.contains(jira_id.as_str()) {
                dangling("Sprint association", sprint_id, "jira", jira_id);
            }
        }
    }
    for commit in source.commits() {
        if !jiras.contains(commit.jira_id.as_str()) {
            dangling("Commit", &commit.id, "jira", &commit.jira_id);
        }
    }
    for pr in source.pull_requests() {
        for commit_id in &pr.commit_ids {
            if !commits.contains(commit_id.as_str()) {
                dangling("Pull request", &pr.id, "commit", commit_id);
            }
        }
    }
    for comment in source.pr_comments() {
        if !prs.contains(comment.pr_id.as_str()) {
            dangling("Comment", &comment.id, "pull request", &comment.pr_id);
        }
    }
    for event in source.cicd_events() {
        if let Some(pr_id) = event.pr_id.as_deref() {
            if !prs.contains(pr_id) {
                dangling("Build", &event.build_id, "pull request", pr_id);
            }
        }
    }
    for bug in source.bugs() {
        if !builds.contains(bug.build_id.as_str()) {
            dangling("Bug", &bug.id, "build", &bug.build_id);
        }
    }
    findings
}
