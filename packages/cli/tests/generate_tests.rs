use pretty_assertions::assert_eq;
use tempfile::TempDir;

use sdlcgen_cli::{generate_dataset, persist, Snapshot};
use sdlcgen_config::Settings;
use sdlcgen_validator::validate;

#[tokio::test]
async fn test_generated_dataset_survives_both_snapshot_formats() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        seed: 11,
        database_path: Some(dir.path().join("sdlc.db")),
        output_path: Some(dir.path().join("sdlc.json")),
        ..Settings::default()
    };

    let output = generate_dataset(&settings).unwrap();
    assert!(output.is_clean());
    let expected = output.dataset.counts();

    let loaded = persist(&settings, &output.dataset).await.unwrap();
    assert_eq!(loaded, Some(expected));

    for snapshot in [
        Snapshot::resolve(None, None, &settings).unwrap(),
        Snapshot::Json(dir.path().join("sdlc.json")),
    ] {
        let dataset = snapshot.load().await.unwrap();
        assert_eq!(dataset.counts(), expected);
        assert!(validate(&dataset).is_clean(), "{:?}", snapshot);
    }
}

#[tokio::test]
async fn test_persist_without_destinations_writes_nothing() {
    let output = generate_dataset(&Settings::default()).unwrap();
    assert_eq!(persist(&Settings::default(), &output.dataset).await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_snapshot_is_reported() {
    let dir = TempDir::new().unwrap();
    let snapshot = Snapshot::Database(dir.path().join("absent.db"));
    let err = snapshot.load().await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    assert!(!dir.path().join("absent.db").exists());
}

#[test]
fn test_custom_catalog_with_unknown_complexity_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(
        &path,
        r#"[
            {"id": "PRJ-200", "title": "Billing", "complexity": "LOW", "status": "RELEASED", "start_date": "2024-02-01"},
            {"id": "PRJ-201", "title": "Mystery", "complexity": "EXTREME", "status": "RELEASED", "start_date": "2024-02-01"}
        ]"#,
    )
    .unwrap();

    let settings = Settings {
        catalog_path: Some(path),
        ..Settings::default()
    };
    let output = generate_dataset(&settings).unwrap();

    assert_eq!(output.dataset.projects.len(), 1);
    assert_eq!(output.issues.len(), 1);
    assert_eq!(output.issues[0].project_id, "PRJ-201");
    assert!(validate(&output.dataset).is_clean());
}
