//! Import overrides from CSV
//!
//! Usage:
//!   cargo run --bin import-overrides -- overrides.csv
//!
//! Every row is upserted as a shared property override
//! (`/contenttypes/icontentdata/properties/<property>/<caption|help>`).
//! Importing the same file twice leaves the store unchanged.
//!
//! Optional environment variables:
//! - DATABASE_URL (defaults to sqlite://resource_editor.db)
//! - LANGUAGES (defaults to en:English)

use anyhow::{Context, Result};
use resource_editor::config::Config;
use resource_editor::db::Database;
use resource_editor::overrides::{parse_csv, OverrideService};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resource_editor=info".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("Usage: import-overrides <file.csv>")?;

    let config = Config::from_env()?;
    let registry = Arc::new(config.language_registry()?);

    let content = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let rows = parse_csv(&content).with_context(|| format!("Failed to parse {}", path))?;
    info!("Read {} rows from {}", rows.len(), path);

    let db = Database::new(&config.database_url)
        .await
        .context("Failed to open override database")?;
    let service = OverrideService::new(db, registry, config.override_cache_ttl());

    let imported = service.import(&rows).await?;
    info!("Imported {} overrides", imported);

    Ok(())
}
