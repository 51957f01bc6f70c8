use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use sdlcgen_cli::render::{catalog_table, issues_table, report_table, summary_table};
use sdlcgen_cli::{
    apply_overrides, generate_dataset, load_catalog, persist, GenerateOptions, Snapshot,
};
use sdlcgen_config::constants::RUST_LOG;
use sdlcgen_config::Settings;
use sdlcgen_validator::{validate, ValidationReport};

#[derive(Parser)]
#[command(name = "sdlcgen")]
#[command(about = "Synthetic SDLC dataset generator and timeline validator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dataset for the project catalog
    Generate {
        /// RNG seed (overrides SDLC_SEED)
        #[arg(long)]
        seed: Option<u64>,
        /// JSON catalog file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Write the dataset as a JSON snapshot
        #[arg(long)]
        json: Option<PathBuf>,
        /// Bulk-load the dataset into a SQLite database
        #[arg(long)]
        database: Option<PathBuf>,
        /// Probability that a feature branch is grouped into a pull request
        #[arg(long)]
        pr_probability: Option<f64>,
        #[arg(long, help = "Skip validating the generated dataset")]
        skip_validation: bool,
    },
    /// Validate a stored dataset and report timeline violations
    Validate {
        #[arg(long, conflicts_with = "json")]
        database: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Show the project catalog with complexity budgets
    Catalog {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(RUST_LOG).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    match command {
        Commands::Generate {
            seed,
            catalog,
            json,
            database,
            pr_probability,
            skip_validation,
        } => {
            let options = GenerateOptions {
                seed,
                catalog,
                json,
                database,
                pr_probability,
                skip_validation,
            };
            generate_command(apply_overrides(settings, &options)?, options.skip_validation).await
        }
        Commands::Validate { database, json } => {
            validate_command(Snapshot::resolve(database, json, &settings)?).await
        }
        Commands::Catalog { catalog } => {
            let catalog = load_catalog(catalog.or(settings.catalog_path).as_deref())?;
            println!("{}", "Project catalog".blue().bold());
            println!();
            println!("{}", catalog_table(&catalog));
            Ok(())
        }
    }
}

async fn generate_command(settings: Settings, skip_validation: bool) -> anyhow::Result<()> {
    let output = generate_dataset(&settings)?;

    println!("{} (seed {})", "Generated dataset".blue().bold(), settings.seed);
    println!();
    println!("{}", summary_table(&output.dataset.counts()));

    if !output.issues.is_empty() {
        println!();
        println!(
            "{} {} project(s) were skipped or truncated",
            "Warning:".yellow().bold(),
            output.issues.len()
        );
        println!("{}", issues_table(&output.issues));
    }

    if output.enforcement.total() > 0 {
        println!(
            "{} timeline enforcer adjusted {} record(s)",
            "Note:".cyan(),
            output.enforcement.total()
        );
    }

    if !skip_validation {
        let report = validate(&output.dataset);
        print_report(&report);
    }

    if let Some(counts) = persist(&settings, &output.dataset).await? {
        if let Some(path) = &settings.database_path {
            println!(
                "{} {} projects loaded into {}",
                "✓".green(),
                counts.projects,
                path.display()
            );
        }
    }
    if let Some(path) = &settings.output_path {
        println!("{} JSON snapshot written to {}", "✓".green(), path.display());
    }
    Ok(())
}

async fn validate_command(snapshot: Snapshot) -> anyhow::Result<()> {
    let dataset = snapshot.load().await?;
    println!("{} {}", "Validating".blue().bold(), snapshot.path().display());
    println!();

    let report = validate(&dataset);
    print_report(&report);

    if report.is_clean() {
        Ok(())
    } else {
        anyhow::bail!("{} timeline violation(s) found", report.total())
    }
}

fn print_report(report: &ValidationReport) {
    println!();
    println!("{}", report_table(report));
    if report.is_clean() {
        println!("{}", "✓ All timeline checks passed".green());
        return;
    }

    for (check, findings) in report.iter().filter(|(_, f)| !f.is_empty()) {
        println!("{}", check.red().bold());
        for finding in findings {
            println!("  - {}", finding);
        }
    }
}
