use std::collections::BTreeMap;

use serde::Serialize;

use crate::CHECKS;

/// Check name → human-readable violation messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    checks: BTreeMap<String, Vec<String>>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// A report with every known check present and clean
    pub fn new() -> Self {
        Self {
            checks: CHECKS
                .iter()
                .map(|check| (check.to_string(), Vec::new()))
                .collect(),
        }
    }

    pub(crate) fn record(&mut self, check: &str, findings: Vec<String>) {
        self.checks.entry(check.to_string()).or_default().extend(findings);
    }

    pub fn findings(&self, check: &str) -> &[String] {
        self.checks.get(check).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.checks.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.checks.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.checks
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.checks
    }
}
