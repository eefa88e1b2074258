//! orbitrisk - debris collision risk assessment
//!
//! Command line front end: loads a catalog, assesses one satellite against
//! every debris object in it, and writes the ranked report plus a scene
//! document for the map client.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use orbitrisk::analysis::{assemble, AssessmentCoordinator};
use orbitrisk::config::AssessmentConfig;
use orbitrisk::data::{
    as_satellite, load_gp_records, load_space_objects, DatabaseStats, ElementLookup,
    ObjectCatalog,
};
use orbitrisk::propagation::{instant_from_utc, now, Sgp4Provider};
use orbitrisk::scene::JsonSceneBuilder;

#[derive(Parser, Debug)]
#[command(name = "orbitrisk", version, about = "Debris collision risk assessment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank debris by closest approach to a satellite
    Assess(AssessArgs),
    /// Print catalog statistics
    Catalog(CatalogSource),
}

#[derive(Args, Debug, Clone)]
struct CatalogSource {
    /// Catalog file in space_objects.json layout (optionally .gz)
    #[arg(long, env = "ORBITRISK_CATALOG", default_value = "out/space_objects.json")]
    catalog: PathBuf,
    /// Read the catalog as a Space-Track GP JSON export instead
    #[arg(long)]
    gp: bool,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// NORAD catalog id of the satellite to assess
    #[arg(long)]
    satellite: String,
    #[command(flatten)]
    source: CatalogSource,
    /// TOML configuration file
    #[arg(long, env = "ORBITRISK_CONFIG")]
    config: Option<PathBuf>,
    /// Coarse propagation step in seconds
    #[arg(long)]
    step_seconds: Option<f64>,
    /// Number of scan worker threads
    #[arg(long, env = "ORBITRISK_WORKERS")]
    workers: Option<usize>,
    /// Time horizon in hours
    #[arg(long)]
    hours: Option<f64>,
    /// Window start as RFC 3339 (defaults to now)
    #[arg(long)]
    start: Option<String>,
    /// Re-scan the top results at the fine step
    #[arg(long)]
    refine: bool,
    /// Output JSON report path
    #[arg(long, default_value = "out/risk_assessment.json")]
    output: PathBuf,
    /// Output scene document path
    #[arg(long, default_value = "out/risk_scene.json")]
    scene_output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Assess(args) => run_assess(args),
        Command::Catalog(source) => run_catalog(&source),
    }
}

fn load_catalog(source: &CatalogSource) -> Result<ObjectCatalog> {
    let database = if source.gp {
        load_gp_records(&source.catalog)?
    } else {
        load_space_objects(&source.catalog)?
    };
    Ok(ObjectCatalog::new(database))
}

fn build_config(args: &AssessArgs) -> Result<AssessmentConfig> {
    let mut config = match &args.config {
        Some(path) => AssessmentConfig::from_toml_file(path)?,
        None => AssessmentConfig::default(),
    };

    if let Some(step) = args.step_seconds {
        config.coarse_step_seconds = step;
    }
    if let Some(workers) = args.workers {
        config.worker_limit = workers;
    }
    if let Some(hours) = args.hours {
        config.window_hours = hours;
    }

    config.validate()?;
    Ok(config)
}

fn window_start(start: Option<&str>) -> Result<satkit::Instant> {
    let instant = match start {
        Some(text) => {
            let time = DateTime::parse_from_rfc3339(text)
                .with_context(|| format!("Invalid --start timestamp: {}", text))?
                .with_timezone(&Utc);
            instant_from_utc(&time)
        }
        None => now(),
    };
    instant.ok_or_else(|| anyhow!("window start is outside the supported time range"))
}

fn run_assess(args: AssessArgs) -> Result<()> {
    let config = build_config(&args)?;
    let start = window_start(args.start.as_deref())?;

    log::info!("Loading catalog...");
    let catalog = load_catalog(&args.source)?;
    let plan = config.coarse_plan(start)?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template(
            "{elapsed_precise} {bar:40.cyan/blue} {pos}/{len} {percent}% ETA {eta_precise}",
        )?
        .progress_chars("##-"),
    );

    let coordinator =
        AssessmentCoordinator::new(Sgp4Provider::new(), &config)?.with_progress(progress.clone());
    let fine_step = args.refine.then_some(config.fine_step_seconds);

    let report = coordinator.assess_catalog(&catalog, &args.satellite, &plan, fine_step)?;
    progress.finish_and_clear();

    for (level, count) in report.severity_counts() {
        if count > 0 {
            log::info!("{}: {}", level, count);
        }
    }
    if !report.failures.is_empty() {
        log::warn!(
            "{} debris objects could not be propagated and were left out",
            report.failures.len()
        );
    }

    let satellite = as_satellite(catalog.get_elements(&args.satellite)?);
    let scene_builder = JsonSceneBuilder::new(satellite.display_name());
    let assembled = assemble(report, &satellite, &catalog, &scene_builder)?;

    create_parent(&args.output)?;
    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("Failed to create {:?}", args.output))?;
    serde_json::to_writer_pretty(file, &assembled)?;
    log::info!("Wrote risk assessment to {:?}", args.output);

    create_parent(&args.scene_output)?;
    std::fs::write(&args.scene_output, &assembled.scene)
        .with_context(|| format!("Failed to write {:?}", args.scene_output))?;
    log::info!("Wrote scene to {:?}", args.scene_output);

    Ok(())
}

fn run_catalog(source: &CatalogSource) -> Result<()> {
    let catalog = load_catalog(source)?;
    let stats = DatabaseStats::from_database(catalog.database());
    log::info!("Database stats: {:?}", stats);
    log::info!(
        "{} debris objects eligible for assessment",
        catalog.list_debris().len()
    );
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
