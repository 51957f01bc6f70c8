// ABOUTME: Commit range reader backed by an explicit date-range cache
// ABOUTME: Ranges inside an already fetched range are answered without touching the database

use chrono::NaiveDate;
use tracing::debug;

use sdlcgen_core::{CodeCommit, DateRange, DateRangeCache};

use crate::store::SdlcStore;
use crate::StorageResult;

pub struct CachedCommitReader<'a> {
    store: &'a SdlcStore,
    project_id: Option<String>,
    cache: DateRangeCache<Vec<CodeCommit>>,
}

impl<'a> CachedCommitReader<'a> {
    pub fn new(store: &'a SdlcStore, project_id: Option<&str>) -> Self {
        Self {
            store,
            project_id: project_id.map(str::to_string),
            cache: DateRangeCache::new(),
        }
    }

    /// Commits whose timestamp falls on a day inside `range`
    pub async fn commits(&mut self, range: DateRange) -> StorageResult<Vec<CodeCommit>> {
        if let Some((cached, commits)) = self.cache.covering(&range) {
            debug!("Serving {} from cached range {}", range, cached);
            return Ok(commits
                .iter()
                .filter(|c| range.contains(c.timestamp.date_naive()))
                .cloned()
                .collect());
        }

        let commits = self
            .store
            .commits_in(self.project_id.as_deref(), &range)
            .await?;
        self.cache.insert(range, commits.clone());
        Ok(commits)
    }

    /// Whether a later request for `range` would be answered from memory
    pub fn is_cached(&self, range: &DateRange) -> bool {
        self.cache.covers(range)
    }

    /// Forget every cached range, e.g. after the store was reloaded
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    pub fn cached_ranges(&self) -> usize {
        self.cache.len()
    }
}

/// Range covering `days` days starting at `start`
pub fn days_from(start: NaiveDate, days: u32) -> Option<DateRange> {
    let end = start + chrono::Duration::days(i64::from(days.max(1)) - 1);
    DateRange::new(start, end).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdlcgen_core::ProjectCatalog;
    use sdlcgen_generator::{generate, GeneratorConfig};

    #[tokio::test]
    async fn test_sub_range_served_from_cache() {
        let store = SdlcStore::in_memory().await.unwrap();
        let dataset =
            generate(&GeneratorConfig::with_seed(42), &ProjectCatalog::default_catalog()).dataset;
        store.bulk_load(&dataset).await.unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let quarter = days_from(start, 90).unwrap();
        let month = days_from(start + chrono::Duration::days(15), 30).unwrap();

        let mut reader = CachedCommitReader::new(&store, None);
        assert!(!reader.is_cached(&month));

        let all = reader.commits(quarter).await.unwrap();
        assert!(reader.is_cached(&month));

        // Wipe the store: a cached answer cannot come from the database
        store.bulk_load(&sdlcgen_core::Dataset::default()).await.unwrap();
        let from_cache = reader.commits(month).await.unwrap();
        assert_eq!(reader.cached_ranges(), 1);
        assert!(from_cache.len() <= all.len());
        assert!(from_cache
            .iter()
            .all(|c| month.contains(c.timestamp.date_naive())));

        reader.invalidate_all();
        assert!(reader.commits(month).await.unwrap().is_empty());
        assert_eq!(reader.cached_ranges(), 1);
    }
}
