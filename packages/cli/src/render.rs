// ABOUTME: Table rendering for generation summaries, validation reports and catalogs
// ABOUTME: Returns comfy-table tables so callers decide where they are printed

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use sdlcgen_core::{ComplexityModel, DatasetCounts, ProjectCatalog};
use sdlcgen_generator::GenerationIssue;
use sdlcgen_validator::ValidationReport;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn summary_table(counts: &DatasetCounts) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entity", "Rows"]);
    for (label, count) in counts.rows() {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }
    table
}

pub fn issues_table(issues: &[GenerationIssue]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Project", "Stage", "Problem"]);
    for issue in issues {
        table.add_row(vec![
            issue.project_id.clone(),
            issue.stage.to_string(),
            issue.message.clone(),
        ]);
    }
    table
}

/// One row per check; checks with findings show the first one
pub fn report_table(report: &ValidationReport) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Check", "Findings", "First finding"]);
    for (check, findings) in report.iter() {
        let first = findings.first().map(String::as_str).unwrap_or("—");
        table.add_row(vec![
            check.to_string(),
            findings.len().to_string(),
            first.to_string(),
        ]);
    }
    table
}

/// The catalog with each project's complexity budget. Entries whose complexity
/// does not parse are listed with an empty budget; generation reports them.
pub fn catalog_table(catalog: &ProjectCatalog) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Title",
        "Complexity",
        "Status",
        "Start",
        "Weeks",
        "Epics / Stories / Tasks",
    ]);

    for entry in catalog.entries() {
        let (weeks, fanout) = match ComplexityModel::profile_for(&entry.complexity) {
            Ok(profile) => (
                profile.total_weeks.to_string(),
                format!(
                    "{} / {} / {}",
                    profile.fanout.epics,
                    profile.fanout.total_stories(),
                    profile.fanout.total_tasks()
                ),
            ),
            Err(_) => ("—".to_string(), "—".to_string()),
        };
        table.add_row(vec![
            entry.id.clone(),
            entry.title.clone(),
            entry.complexity.clone(),
            entry.status.clone(),
            entry.start_date.format("%Y-%m-%d").to_string(),
            weeks,
            fanout,
        ]);
    }
    table
}
