// ABOUTME: JSON snapshots of a whole dataset on disk
// ABOUTME: Used to export generated data and to validate an exported file later

use std::path::Path;

use tracing::debug;

use sdlcgen_core::Dataset;

use crate::StorageResult;

pub async fn write_json_snapshot(path: &Path, dataset: &Dataset) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = dataset.to_json_pretty()?;
    tokio::fs::write(path, json).await?;
    debug!("Wrote snapshot to {}", path.display());
    Ok(())
}

pub async fn read_json_snapshot(path: &Path) -> StorageResult<Dataset> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(Dataset::from_json_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;
    use sdlcgen_core::ProjectCatalog;
    use sdlcgen_generator::{generate, GeneratorConfig};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("dataset.json");
        let dataset =
            generate(&GeneratorConfig::with_seed(1), &ProjectCatalog::default_catalog()).dataset;

        write_json_snapshot(&path, &dataset).await.unwrap();
        let loaded = read_json_snapshot(&path).await.unwrap();
        assert_eq!(loaded.counts(), dataset.counts());
        assert_eq!(loaded.sprint_jira, dataset.sprint_jira);
        let ids = |d: &Dataset| d.bugs.iter().map(|b| b.build_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&loaded), ids(&dataset));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = read_json_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_json_snapshot(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
