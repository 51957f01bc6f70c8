// ABOUTME: Calendar anchors and fixed domain constants
// ABOUTME: Shared by the generator, validator and storage packages

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Anchor of the sprint calendar and of the default catalog's start dates
pub const BASE_START_YEAR: i32 = 2024;
pub const BASE_START_MONTH: u32 = 1;
pub const BASE_START_DAY: u32 = 1;

/// Length of a sprint window in days
pub const SPRINT_LENGTH_DAYS: i64 = 14;

/// Working days per week used by the complexity budgets
pub const WORKING_DAYS_PER_WEEK: u32 = 5;

/// Default random seed when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Only P0 defects are modeled
pub const BUG_SEVERITY: &str = "P0";

pub const MAIN_BRANCH: &str = "main";

/// Branch names that never get their own pull request; `release` also matches as a prefix
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master", "release"];

/// Midnight UTC on the base start date
pub fn base_start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(BASE_START_YEAR, BASE_START_MONTH, BASE_START_DAY, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// The base start date as a calendar date
pub fn base_start_day() -> NaiveDate {
    base_start_date().date_naive()
}

/// Whether a branch is excluded from pull-request grouping
pub fn is_protected_branch(branch: &str) -> bool {
    PROTECTED_BRANCHES.contains(&branch) || branch.starts_with("release")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_start_date() {
        assert_eq!(base_start_date().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_protected_branches() {
        assert!(is_protected_branch("main"));
        assert!(is_protected_branch("master"));
        assert!(is_protected_branch("release"));
        assert!(is_protected_branch("release/1.2"));
        assert!(is_protected_branch("release-2024"));
        assert!(!is_protected_branch("feature/prj-001-e1"));
        assert!(!is_protected_branch("develop"));
        assert!(!is_protected_branch("maintenance"));
    }
}
