use clap::Args;
use leadgen::audit::{self, AuditOptions, AUDIT_SAMPLE_LIMIT};
use leadgen::config::AppConfig;
use leadgen::db::{self, Database};
use leadgen::error::AppError;
use leadgen::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct AuditSampleArgs {
    /// SQLite database to read (defaults to LEADGEN_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// File to overwrite with the sampled identifiers (defaults to LEADGEN_AUDIT_OUTPUT)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Maximum identifiers to sample (capped at 100)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Additional contractor identifier to skip; may be repeated
    #[arg(long = "exclude")]
    pub(crate) exclude: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DbInitArgs {
    /// SQLite database to create or migrate (defaults to LEADGEN_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Load the demo dataset after creating the tables
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) fn run_audit_sample(args: AuditSampleArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let AuditSampleArgs {
        database,
        output,
        limit,
        exclude,
    } = args;

    let database = Database::new(database.unwrap_or(config.database.path));
    let output = output.unwrap_or(config.audit.output_path);
    let options = AuditOptions {
        limit: limit.unwrap_or(AUDIT_SAMPLE_LIMIT),
        extra_exclusions: exclude,
    };

    let sample = audit::run_audit_sample(&database, &output, &options)?;
    println!(
        "Wrote {} unaudited contractor identifiers to {}",
        sample.identifiers.len(),
        sample.output_path.display()
    );
    Ok(())
}

pub(crate) fn run_db_init(args: DbInitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let database = Database::new(args.database.unwrap_or(config.database.path));
    let mut conn = database.open()?;
    db::migrate(&conn)?;
    info!(path = %database.path().display(), "database schema is up to date");

    if args.seed_demo {
        let summary = db::seed_demo(&mut conn)?;
        println!(
            "Seeded {} contractors, {} permits, {} properties, {} leads, {} scraper runs, {} neighborhood medians",
            summary.contractors,
            summary.permits,
            summary.properties,
            summary.leads,
            summary.scraper_runs,
            summary.neighborhood_medians
        );
    }

    println!("Database ready at {}", database.path().display());
    Ok(())
}
