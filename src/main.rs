//! dripline - operational entry point for the send-capacity scheduler
//!
//! Two maintenance commands against the local scheduler database:
//!
//! - `capacity` prints the current capacity snapshot as JSON
//! - `reset-daily` zeroes every sent-today counter (day-boundary job)

use dripline::config;
use dripline::services::{AccountFilter, AccountService};
use dripline::storage::{Database, SqliteAccountStore};
use dripline::CapacitySnapshot;

fn database_path() -> anyhow::Result<std::path::PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "dripline")
        .ok_or_else(|| anyhow::anyhow!("no data directory available on this platform"))?;
    std::fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().join("dripline.db"))
}

async fn run(command: &str) -> anyhow::Result<()> {
    let settings = config::load()?;
    let db = Database::open(database_path()?).await?;
    let registry = AccountService::with_schedule(
        SqliteAccountStore::new(db),
        settings.warmup.to_schedule(),
    );

    match command {
        "capacity" => {
            let accounts = registry.list(&AccountFilter::new().active_only()).await?;
            let snapshot = CapacitySnapshot::build(&accounts, chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "reset-daily" => {
            let touched = registry.reset_daily_counters().await?;
            println!("reset sent counters on {} account(s)", touched);
        }
        other => {
            anyhow::bail!("unknown command: {} (expected capacity | reset-daily)", other);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_default();
    if command.is_empty() {
        eprintln!("usage: dripline <capacity | reset-daily>");
        std::process::exit(2);
    }

    if let Err(e) = run(&command).await {
        tracing::error!("command failed: {}", e);
        std::process::exit(1);
    }
}
