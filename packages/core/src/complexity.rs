// ABOUTME: Complexity model mapping a complexity class to durations and fan-out
// ABOUTME: Pure lookups; string inputs are parsed into InvalidComplexity errors

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::WORKING_DAYS_PER_WEEK;
use crate::error::ConfigurationError;
use crate::types::{Complexity, DesignType};

/// Epic → Story → Task fan-out for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fanout {
    pub epics: u32,
    pub stories_per_epic: u32,
    pub tasks_per_story: u32,
}

impl Fanout {
    pub fn total_stories(&self) -> u32 {
        self.epics * self.stories_per_epic
    }

    pub fn total_tasks(&self) -> u32 {
        self.total_stories() * self.tasks_per_story
    }

    pub fn total_items(&self) -> u32 {
        self.epics + self.total_stories() + self.total_tasks()
    }
}

/// Everything the generators need to know about one complexity class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityProfile {
    pub complexity: Complexity,
    pub total_weeks: u32,
    pub total_days: u32,
    pub phase_durations: BTreeMap<DesignType, u32>,
    pub fanout: Fanout,
}

pub struct ComplexityModel;

impl ComplexityModel {
    pub fn total_weeks(complexity: Complexity) -> u32 {
        match complexity {
            Complexity::Low => 4,
            Complexity::Medium => 12,
            Complexity::High => 24,
            Complexity::VeryHigh => 48,
        }
    }

    /// Total estimated duration in working days
    pub fn total_days(complexity: Complexity) -> u32 {
        Self::total_weeks(complexity) * WORKING_DAYS_PER_WEEK
    }

    /// Share of the total budget a single phase may take
    fn phase_share(phase: DesignType) -> f64 {
        match phase {
            DesignType::Requirement => 0.20,
            DesignType::UxDesign => 0.25,
            DesignType::Architecture => 0.30,
            DesignType::DatabaseDesign => 0.20,
            DesignType::ApiDesign => 0.25,
            DesignType::SecurityReview => 0.10,
        }
    }

    /// Maximum duration in days for every design phase, at least one day each
    pub fn phase_durations(complexity: Complexity) -> BTreeMap<DesignType, u32> {
        let total = Self::total_days(complexity) as f64;
        DesignType::ALL
            .iter()
            .map(|phase| {
                let days = (total * Self::phase_share(*phase)).round() as u32;
                (*phase, days.max(1))
            })
            .collect()
    }

    pub fn fanout(complexity: Complexity) -> Fanout {
        let (epics, stories_per_epic, tasks_per_story) = match complexity {
            Complexity::Low => (1, 3, 3),
            Complexity::Medium => (2, 4, 4),
            Complexity::High => (3, 5, 5),
            Complexity::VeryHigh => (4, 6, 6),
        };
        Fanout {
            epics,
            stories_per_epic,
            tasks_per_story,
        }
    }

    pub fn profile(complexity: Complexity) -> ComplexityProfile {
        ComplexityProfile {
            complexity,
            total_weeks: Self::total_weeks(complexity),
            total_days: Self::total_days(complexity),
            phase_durations: Self::phase_durations(complexity),
            fanout: Self::fanout(complexity),
        }
    }

    /// Resolve a raw complexity class, e.g. from a catalog file
    pub fn profile_for(raw: &str) -> Result<ComplexityProfile, ConfigurationError> {
        let complexity = raw.parse::<Complexity>()?;
        Ok(Self::profile(complexity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Complexity::Low, 20, (1, 3, 3))]
    #[case(Complexity::Medium, 60, (2, 4, 4))]
    #[case(Complexity::High, 120, (3, 5, 5))]
    #[case(Complexity::VeryHigh, 240, (4, 6, 6))]
    fn test_budgets_and_fanout(
        #[case] complexity: Complexity,
        #[case] days: u32,
        #[case] fanout: (u32, u32, u32),
    ) {
        assert_eq!(ComplexityModel::total_days(complexity), days);
        let f = ComplexityModel::fanout(complexity);
        assert_eq!((f.epics, f.stories_per_epic, f.tasks_per_story), fanout);
    }

    #[test]
    fn test_medium_fanout_counts() {
        let f = ComplexityModel::fanout(Complexity::Medium);
        assert_eq!(f.total_stories(), 8);
        assert_eq!(f.total_tasks(), 32);
        assert_eq!(f.total_items(), 42);
    }

    #[test]
    fn test_phase_durations_cover_every_phase() {
        for complexity in Complexity::ALL {
            let durations = ComplexityModel::phase_durations(*complexity);
            assert_eq!(durations.len(), DesignType::ALL.len());
            assert!(durations.values().all(|d| *d >= 1));
        }
        let low = ComplexityModel::phase_durations(Complexity::Low);
        assert_eq!(low[&DesignType::Requirement], 4);
        assert_eq!(low[&DesignType::SecurityReview], 2);
    }

    #[test]
    fn test_critical_path_stays_within_budget() {
        for complexity in Complexity::ALL {
            let d = ComplexityModel::phase_durations(*complexity);
            let critical = d[&DesignType::Requirement]
                + d[&DesignType::UxDesign].max(d[&DesignType::Architecture])
                + d[&DesignType::DatabaseDesign].max(d[&DesignType::ApiDesign])
                + d[&DesignType::SecurityReview];
            assert!(critical <= ComplexityModel::total_days(*complexity));
        }
    }

    #[test]
    fn test_durations_grow_with_complexity() {
        let mut previous = 0;
        for complexity in Complexity::ALL {
            let total: u32 = ComplexityModel::phase_durations(*complexity).values().sum();
            assert!(total > previous);
            previous = total;
        }
    }

    #[test]
    fn test_profile_for_rejects_unknown_class() {
        assert_eq!(
            ComplexityModel::profile_for("EXTREME"),
            Err(ConfigurationError::InvalidComplexity("EXTREME".to_string()))
        );
        let profile = ComplexityModel::profile_for("high").unwrap();
        assert_eq!(profile.total_weeks, 24);
        assert_eq!(profile.fanout.epics, 3);
    }
}
