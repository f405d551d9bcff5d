//! Export overrides as CSV
//!
//! Usage:
//!   cargo run --bin export-overrides                   # Write CSV to stdout
//!   cargo run --bin export-overrides -- overrides.csv  # Write CSV to a file
//!
//! Optional environment variables:
//! - DATABASE_URL (defaults to sqlite://resource_editor.db)
//! - LANGUAGES (defaults to en:English)

use anyhow::{Context, Result};
use resource_editor::config::Config;
use resource_editor::db::Database;
use resource_editor::overrides::{to_csv, OverrideService};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays valid CSV
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resource_editor=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let registry = Arc::new(config.language_registry()?);
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to open override database")?;
    let service = OverrideService::new(db, registry, config.override_cache_ttl());

    let rows = service.export().await?;
    let csv = to_csv(&rows);

    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, &csv).with_context(|| format!("Failed to write {}", path))?;
            info!("Exported {} overrides to {}", rows.len(), path);
        }
        None => {
            std::io::stdout()
                .write_all(csv.as_bytes())
                .context("Failed to write CSV to stdout")?;
            info!("Exported {} overrides", rows.len());
        }
    }

    Ok(())
}
