use anyhow::{Context, Result};
use resource_editor::config::Config;
use resource_editor::db::Database;
use resource_editor::domains::{ContentTypeService, TabService, ViewService};
use resource_editor::migration::{MigrationEngine, MigrationProgress};
use resource_editor::overrides::OverrideService;
use resource_editor::resolution::{
    LocalizationChain, OverrideProvider, TreeFileProvider, OVERRIDE_PRIORITY, TREE_FILE_PRIORITY,
};
use resource_editor::schema::{SharedPropertyIndex, StaticSchema};
use resource_editor::status::{DefaultStatusEvaluator, StatusSummaryService};
use resource_editor::tree::TreeStore;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resource_editor=info".parse()?),
        )
        .init();

    info!("Starting resource editor startup job");

    // Load configuration from environment
    let config = Config::from_env()?;
    let registry = Arc::new(config.language_registry()?);
    let schema = Arc::new(match &config.schema_file {
        Some(path) => StaticSchema::from_json_file(path)?,
        None => StaticSchema::default(),
    });
    let store = TreeStore::new(&config.translation_folder).with_saving(config.enable_file_saving);

    info!(
        "Translation folder {} with {} languages",
        config.translation_folder.display(),
        registry.languages().len()
    );

    // Step 1: Split legacy translation files
    let engine = MigrationEngine::new(store.clone(), registry.clone());
    if engine.needs_migration() {
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel::<MigrationProgress>();
        let reporter = tokio::spawn(async move {
            while let Some(progress) = receiver.recv().await {
                info!("Migration {}/{}: {}", progress.completed, progress.total, progress.label);
            }
        });

        let result = engine.migrate(Some(&sender)).await;
        drop(sender);
        reporter.await.context("Migration progress reporter panicked")?;

        if result.success {
            info!("Migration created {} files", result.files_created);
        } else {
            for error in &result.errors {
                warn!("Migration error: {}", error);
            }
        }
    } else {
        info!("No migration needed");
    }

    // Step 2: Build the resolution chain
    let mut chain = LocalizationChain::new();
    chain.register(
        TREE_FILE_PRIORITY,
        "translation-files",
        Arc::new(TreeFileProvider::new(store.clone(), registry.clone())),
    );

    let overrides = if config.enable_overrides {
        let db = Database::new(&config.database_url)
            .await
            .context("Failed to open override database")?;
        let service = Arc::new(OverrideService::new(db, registry.clone(), config.override_cache_ttl()));
        chain.register(OVERRIDE_PRIORITY, "overrides", Arc::new(OverrideProvider::new(service.clone())));
        info!("Registered override provider with {} overrides", service.get_all().await?.len());
        Some(service)
    } else {
        info!("Overrides disabled");
        None
    };
    info!("Resolution chain: {}", chain.provider_names().join(" -> "));

    // Step 3: Report translation status
    let content_types = Arc::new(ContentTypeService::new(store.clone(), registry.clone(), schema.clone()));
    let tabs = Arc::new(TabService::new(store.clone(), registry.clone(), schema.clone()));
    let status = StatusSummaryService::new(
        registry.clone(),
        content_types,
        tabs,
        Arc::new(DefaultStatusEvaluator::new(config.status_thresholds())),
    );

    for summary in status.language_summaries()?.iter() {
        info!(
            "[{}] {}: content types {}/{}, properties {}/{}, tabs {}/{}",
            summary.language_id,
            summary.language_name,
            summary.content_types_complete,
            summary.content_types_total,
            summary.properties_complete,
            summary.properties_total,
            summary.tabs_complete,
            summary.tabs_total
        );
    }

    let shared = SharedPropertyIndex::new(schema);
    info!("{} properties shared by several content types", shared.shared_properties().len());

    let views = ViewService::new(store, registry, config.view_file_pattern.clone());
    info!("{} view files", views.list_view_files()?.len());

    if let Some(overrides) = overrides {
        let report = overrides.cache_report();
        info!(
            "Override cache: {} hits, {} misses ({:.1}% hit rate), {} reloads",
            report.hits, report.misses, report.hit_rate, report.reloads
        );
    }

    info!("Startup job finished");
    Ok(())
}
