//! `lingua-seed`: load course fixtures into the content store.
//!
//!   lingua-seed                          # upsert ./data/courses.json
//!   lingua-seed --mode reset             # wipe content and progress first
//!   lingua-seed --data-dir fixtures --database-url sqlite:dev.db?mode=rwc

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use lingua_backend::config::Settings;
use lingua_backend::seeds::{self, SeedMode};
use lingua_backend::{db, telemetry};

#[derive(Debug, Parser)]
#[command(name = "lingua-seed", version, about = "Seed courses, lessons and vocabulary from JSON fixtures")]
struct Cli {
    /// Directory containing courses.json.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SeedMode::Upsert)]
    mode: SeedMode,

    /// Overrides DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so LOG_LEVEL / LOG_FORMAT from it reach the subscriber.
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();
    let database_url = cli.database_url.unwrap_or_else(|| Settings::from_env().database_url);

    let fixtures = seeds::load_fixtures(&cli.data_dir).inspect_err(|e| {
        error!(target: "seed", error = %e, "Could not load fixtures");
    })?;

    let pool = db::connect(&database_url).await?;
    db::migrate(&pool).await?;
    let report = seeds::seed(&pool, &fixtures, cli.mode).await?;
    pool.close().await;

    info!(target: "seed", mode = ?cli.mode, courses = report.courses, lessons = report.lessons,
          vocabulary = report.vocabulary, "Done");
    println!(
        "Seeded {} courses, {} lessons, {} vocabulary entries ({:?})",
        report.courses, report.lessons, report.vocabulary, cli.mode
    );
    Ok(())
}
