use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use sdlcgen_config::{check_probability, Settings};
use sdlcgen_core::{Dataset, DatasetCounts, ProjectCatalog};
use sdlcgen_generator::{generate, GenerationOutput, GeneratorConfig};
use sdlcgen_storage::{read_json_snapshot, write_json_snapshot, SdlcStore};

/// Flags accepted by `sdlcgen generate`. Anything left unset falls back to the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub seed: Option<u64>,
    pub catalog: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub pr_probability: Option<f64>,
    pub skip_validation: bool,
}

/// Layer command-line flags over environment settings
pub fn apply_overrides(mut settings: Settings, options: &GenerateOptions) -> Result<Settings> {
    if let Some(seed) = options.seed {
        settings.seed = seed;
    }
    if let Some(path) = &options.catalog {
        settings.catalog_path = Some(path.clone());
    }
    if let Some(path) = &options.json {
        settings.output_path = Some(path.clone());
    }
    if let Some(path) = &options.database {
        settings.database_path = Some(path.clone());
    }
    if let Some(probability) = options.pr_probability {
        settings.pr_creation_probability = check_probability("--pr-probability", probability)?;
    }
    Ok(settings)
}

/// The catalog at `path`, or the built-in eight-project catalog
pub fn load_catalog(path: Option<&Path>) -> Result<ProjectCatalog> {
    match path {
        Some(path) => ProjectCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => {
            debug!("Using the built-in project catalog");
            Ok(ProjectCatalog::default_catalog())
        }
    }
}

pub fn generate_dataset(settings: &Settings) -> Result<GenerationOutput> {
    let catalog = load_catalog(settings.catalog_path.as_deref())?;
    if catalog.is_empty() {
        bail!("The project catalog is empty");
    }
    let config = GeneratorConfig {
        seed: settings.seed,
        pull_requests: settings.pull_request_policy(),
    };
    Ok(generate(&config, &catalog))
}

/// Write the dataset to every configured destination. Returns the row counts loaded
/// into SQLite when a database path is set.
pub async fn persist(settings: &Settings, dataset: &Dataset) -> Result<Option<DatasetCounts>> {
    if let Some(path) = &settings.output_path {
        write_json_snapshot(path, dataset)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote JSON snapshot to {}", path.display());
    }

    let Some(path) = &settings.database_path else {
        return Ok(None);
    };
    let store = SdlcStore::open(path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    let counts = store.bulk_load(dataset).await?;
    info!("Loaded dataset into {}", path.display());
    Ok(Some(counts))
}

/// Where `sdlcgen validate` reads a dataset from
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Database(PathBuf),
    Json(PathBuf),
}

impl Snapshot {
    /// Explicit flags win; otherwise the configured database, then the configured JSON output
    pub fn resolve(
        database: Option<PathBuf>,
        json: Option<PathBuf>,
        settings: &Settings,
    ) -> Result<Self> {
        match (database, json) {
            (Some(_), Some(_)) => bail!("Pass either --database or --json, not both"),
            (Some(path), None) => Ok(Snapshot::Database(path)),
            (None, Some(path)) => Ok(Snapshot::Json(path)),
            (None, None) => {
                if let Some(path) = &settings.database_path {
                    Ok(Snapshot::Database(path.clone()))
                } else if let Some(path) = &settings.output_path {
                    Ok(Snapshot::Json(path.clone()))
                } else {
                    bail!("Nothing to validate: pass --database or --json")
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Snapshot::Database(path) | Snapshot::Json(path) => path,
        }
    }

    pub async fn load(&self) -> Result<Dataset> {
        let path = self.path();
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        let dataset = match self {
            Snapshot::Database(path) => SdlcStore::open(path).await?.load_dataset().await?,
            Snapshot::Json(path) => read_json_snapshot(path).await?,
        };
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdlcgen_config::constants::SDLC_SEED;
    use serial_test::serial;

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            seed: 1,
            database_path: Some(PathBuf::from("env.db")),
            ..Settings::default()
        };
        let options = GenerateOptions {
            seed: Some(99),
            json: Some(PathBuf::from("out.json")),
            pr_probability: Some(0.25),
            ..GenerateOptions::default()
        };

        let merged = apply_overrides(settings, &options).unwrap();
        assert_eq!(merged.seed, 99);
        assert_eq!(merged.output_path, Some(PathBuf::from("out.json")));
        assert_eq!(merged.database_path, Some(PathBuf::from("env.db")));
        assert_eq!(merged.pr_creation_probability, 0.25);
    }

    #[test]
    #[serial]
    fn test_seed_flag_beats_environment() {
        std::env::set_var(SDLC_SEED, "5");
        let from_env = Settings::from_env();
        std::env::remove_var(SDLC_SEED);

        let from_env = from_env.unwrap();
        assert_eq!(from_env.seed, 5);
        assert_eq!(
            apply_overrides(from_env.clone(), &GenerateOptions::default()).unwrap(),
            from_env
        );

        let options = GenerateOptions {
            seed: Some(8),
            ..GenerateOptions::default()
        };
        assert_eq!(apply_overrides(from_env, &options).unwrap().seed, 8);
    }

    #[test]
    fn test_out_of_range_probability_flag_is_rejected() {
        let options = GenerateOptions {
            pr_probability: Some(1.5),
            ..GenerateOptions::default()
        };
        assert!(apply_overrides(Settings::default(), &options).is_err());
    }

    #[test]
    fn test_snapshot_resolution() {
        let settings = Settings {
            database_path: Some(PathBuf::from("env.db")),
            output_path: Some(PathBuf::from("env.json")),
            ..Settings::default()
        };

        assert_eq!(
            Snapshot::resolve(None, Some(PathBuf::from("a.json")), &settings).unwrap(),
            Snapshot::Json(PathBuf::from("a.json"))
        );
        assert_eq!(
            Snapshot::resolve(None, None, &settings).unwrap(),
            Snapshot::Database(PathBuf::from("env.db"))
        );
        assert!(Snapshot::resolve(
            Some(PathBuf::from("a.db")),
            Some(PathBuf::from("a.json")),
            &settings
        )
        .is_err());
        assert!(Snapshot::resolve(None, None, &Settings::default()).is_err());
    }

    #[test]
    fn test_missing_catalog_file_is_an_error() {
        let err = load_catalog(Some(Path::new("/nonexistent/catalog.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load catalog"));
    }
}
