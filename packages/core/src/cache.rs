// ABOUTME: Explicit date-range cache passed by reference instead of process-wide state
// ABOUTME: Supports exact lookups and subset checks against previously cached ranges

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Inclusive calendar range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigurationError> {
        if end < start {
            return Err(ConfigurationError::InvalidEnumValue {
                kind: "date range",
                value: format!("{start}..{end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `other` lies entirely within this range
    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct DateRangeCache<T> {
    entries: BTreeMap<DateRange, T>,
}

impl<T> Default for DateRangeCache<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> DateRangeCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store data fetched for `range`, returning what was cached for it before
    pub fn insert(&mut self, range: DateRange, data: T) -> Option<T> {
        self.entries.insert(range, data)
    }

    /// Exact-range lookup
    pub fn get(&self, range: &DateRange) -> Option<&T> {
        self.entries.get(range)
    }

    /// Whether some cached range fully contains `range`
    pub fn covers(&self, range: &DateRange) -> bool {
        self.covering(range).is_some()
    }

    /// The narrowest cached range containing `range`, with its data
    pub fn covering(&self, range: &DateRange) -> Option<(&DateRange, &T)> {
        self.entries
            .iter()
            .filter(|(cached, _)| cached.contains_range(range))
            .min_by_key(|(cached, _)| cached.days())
    }

    pub fn invalidate(&mut self, range: &DateRange) -> Option<T> {
        self.entries.remove(range)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
