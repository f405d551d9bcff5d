//! Integration tests for the resource editor
//!
//! These tests drive the public API end to end: legacy migration into the
//! per-language files, the domain services and status summaries on top of
//! them, and database overrides resolved through the provider chain.

use std::sync::Arc;
use tempfile::TempDir;

use resource_editor::db::Database;
use resource_editor::domains::{ContentTypeService, TabService, ViewService, DEFAULT_VIEW_FILE_PATTERN};
use resource_editor::i18n::{Culture, LanguageRegistry, TranslationKey};
use resource_editor::migration::MigrationEngine;
use resource_editor::overrides::{parse_csv, to_csv, OverrideService, DEFAULT_TTL};
use resource_editor::resolution::{
    LocalizationChain, OverrideProvider, TreeFileProvider, OVERRIDE_PRIORITY, TREE_FILE_PRIORITY,
};
use resource_editor::schema::{ContentTypeCategory, ContentTypeInfo, StaticSchema, TabInfo};
use resource_editor::status::{DefaultStatusEvaluator, StatusLevel, StatusSummaryService, TranslationStatusEvaluator};
use resource_editor::tree::TreeStore;

// ==================== Test Helpers ====================

fn create_test_registry() -> Arc<LanguageRegistry> {
    Arc::new(LanguageRegistry::parse("en:English,sv:Svenska").expect("valid languages"))
}

fn create_test_schema() -> Arc<StaticSchema> {
    Arc::new(StaticSchema {
        content_types: vec![
            ContentTypeInfo {
                id: 1,
                name: "StandardPage".to_string(),
                display_name: Some("Standard page".to_string()),
                description: None,
                category: ContentTypeCategory::Page,
                properties: vec!["MainBody".to_string(), "Heading".to_string()],
            },
            ContentTypeInfo {
                id: 2,
                name: "TeaserBlock".to_string(),
                display_name: None,
                description: None,
                category: ContentTypeCategory::Block,
                properties: vec![],
            },
        ],
        tabs: vec![TabInfo {
            id: 1,
            name: "SEO".to_string(),
            display_name: None,
        }],
    })
}

async fn create_test_overrides(registry: Arc<LanguageRegistry>) -> Arc<OverrideService> {
    let db = Database::in_memory().await.expect("Failed to create test database");
    Arc::new(OverrideService::new(db, registry, DEFAULT_TTL))
}

/// Legacy multi-language files as shipped before migration
fn write_legacy_files(temp_dir: &TempDir) {
    let dir = temp_dir.path();
    std::fs::write(
        dir.join("ContentTypeNames.xml"),
        r#"<?xml version="1.0" encoding="utf-8"?>
<languages>
  <language name="English" id="en">
    <contenttypes>
      <standardpage>
        <name>Standard page</name>
        <description>A regular page</description>
        <properties>
          <mainbody><caption>mainbody</caption><help>The page body</help></mainbody>
        </properties>
      </standardpage>
    </contenttypes>
  </language>
  <language name="Svenska" id="sv">
    <contenttypes>
      <standardpage>
        <name>Standardsida</name>
        <description>En vanlig sida</description>
        <properties>
          <mainbody><caption>Brödtext</caption><help>Sidans text</help></mainbody>
          <heading><caption>Rubrik</caption><help>Sidans rubrik</help></heading>
        </properties>
      </standardpage>
      <teaserblock><name>Puff</name><description>Liten puff</description></teaserblock>
    </contenttypes>
  </language>
</languages>"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("GroupNames.xml"),
        r#"<languages>
  <language id="sv"><headings><heading name="SEO"><description>Sökmotorer</description></heading></headings></language>
</languages>"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("EditorHints.xml"),
        r#"<languages>
  <language id="en"><preview><title>Preview</title></preview></language>
</languages>"#,
    )
    .unwrap();
}

// ==================== Migration Workflow Tests ====================

#[tokio::test]
async fn test_migration_then_domain_services_and_status() {
    let temp_dir = TempDir::new().unwrap();
    write_legacy_files(&temp_dir);

    let registry = create_test_registry();
    let schema = create_test_schema();
    let store = TreeStore::new(temp_dir.path());

    let engine = MigrationEngine::new(store.clone(), registry.clone());
    assert!(engine.needs_migration());
    let result = engine.migrate(None).await;
    assert!(result.success, "errors: {:?}", result.errors);
    assert!(!engine.needs_migration(), "migration flips exactly once");

    let content_types = Arc::new(ContentTypeService::new(store.clone(), registry.clone(), schema.clone()));
    let page = content_types
        .get_translations("StandardPage", ContentTypeCategory::Page)
        .unwrap();
    assert_eq!(page.name.get("sv"), "Standardsida");
    assert_eq!(page.property("heading").unwrap().label.get("sv"), "Rubrik");
    assert_eq!(page.property("mainbody").unwrap().label.get("en"), "mainbody");

    let evaluator = DefaultStatusEvaluator::default();
    let en_status = evaluator.evaluate_content_type(&page, "en");
    assert_eq!(en_status.content_type, StatusLevel::Complete);
    assert_eq!(en_status.property_items_complete, 0, "label equal to identifier is untranslated");

    let tabs = Arc::new(TabService::new(store.clone(), registry.clone(), schema));
    let status = StatusSummaryService::new(registry, content_types, tabs, Arc::new(evaluator));
    let summaries = status.language_summaries().unwrap();

    let sv = summaries.iter().find(|s| s.language_id == "sv").unwrap();
    assert_eq!(sv.content_types_total, 2);
    assert_eq!(sv.content_types_complete, 2);
    assert_eq!(sv.properties_total, 2);
    assert_eq!(sv.properties_complete, 2);
    assert_eq!(sv.tabs_complete, 1);

    let en = summaries.iter().find(|s| s.language_id == "en").unwrap();
    assert_eq!(en.content_types_complete, 1);
    assert_eq!(en.tabs_complete, 0);
}

#[tokio::test]
async fn test_zero_property_content_type_is_complete_for_properties() {
    let registry = create_test_registry();
    let temp_dir = TempDir::new().unwrap();
    let service = ContentTypeService::new(TreeStore::new(temp_dir.path()), registry, create_test_schema());

    let teaser = service
        .get_translations("TeaserBlock", ContentTypeCategory::Block)
        .unwrap();
    let status = DefaultStatusEvaluator::default().evaluate_content_type(&teaser, "en");

    assert_eq!(status.property_units_total, 0);
    assert_eq!(status.properties, StatusLevel::Complete);
}

// ==================== Resolution Tests ====================

async fn create_test_chain(temp_dir: &TempDir, overrides: Arc<OverrideService>) -> LocalizationChain {
    let registry = create_test_registry();
    let mut chain = LocalizationChain::new();
    chain.register(
        TREE_FILE_PRIORITY,
        "files",
        Arc::new(TreeFileProvider::new(TreeStore::new(temp_dir.path()), registry)),
    );
    chain.register(OVERRIDE_PRIORITY, "overrides", Arc::new(OverrideProvider::new(overrides)));
    chain
}

#[tokio::test]
async fn test_shared_fallback_override_resolves_for_region_culture() {
    let temp_dir = TempDir::new().unwrap();
    let overrides = create_test_overrides(create_test_registry()).await;
    overrides
        .save("/contenttypes/icontentdata/properties/mainbody/caption", "en", "Body", None)
        .await
        .unwrap();

    let chain = create_test_chain(&temp_dir, overrides).await;
    let value = chain
        .resolve(
            &TranslationKey::new("/contenttypes/standardpage/properties/mainbody/caption"),
            &Culture::parse("en-US").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(value.as_deref(), Some("Body"));
}

#[tokio::test]
async fn test_override_wins_over_migrated_file_and_save_is_visible() {
    let temp_dir = TempDir::new().unwrap();
    write_legacy_files(&temp_dir);
    let registry = create_test_registry();
    MigrationEngine::new(TreeStore::new(temp_dir.path()), registry.clone())
        .migrate(None)
        .await;

    let overrides = create_test_overrides(registry).await;
    let chain = create_test_chain(&temp_dir, overrides.clone()).await;
    let key = TranslationKey::new("/ContentTypes/StandardPage/Name");
    let sv = Culture::parse("sv").unwrap();

    assert_eq!(chain.resolve(&key, &sv).await.unwrap().as_deref(), Some("Standardsida"));

    overrides.save(key.as_str(), "sv", "Vanlig sida", None).await.unwrap();
    assert_eq!(chain.resolve(&key, &sv).await.unwrap().as_deref(), Some("Vanlig sida"));

    overrides.save(key.as_str(), "sv", "Sida", None).await.unwrap();
    assert_eq!(chain.resolve(&key, &sv).await.unwrap().as_deref(), Some("Sida"), "no stale read after save");

    assert!(overrides.delete(key.as_str(), "sv").await.unwrap());
    assert_eq!(chain.resolve(&key, &sv).await.unwrap().as_deref(), Some("Standardsida"));
}

// ==================== Override Exchange Tests ====================

#[tokio::test]
async fn test_csv_export_import_round_trip() {
    let registry = create_test_registry();
    let source = create_test_overrides(registry.clone()).await;
    let tricky = r#"Body, the "main" text"#;
    source
        .save(
            "/contenttypes/icontentdata/properties/mainbody/caption",
            "sv",
            tricky,
            Some("StandardPage"),
        )
        .await
        .unwrap();
    source
        .save("/contenttypes/icontentdata/properties/mainbody/help", "en", "Line one\nline two", None)
        .await
        .unwrap();

    let csv = to_csv(&source.export().await.unwrap());
    let rows = parse_csv(&csv).unwrap();
    assert_eq!(rows.len(), 2);

    let target = create_test_overrides(registry).await;
    assert_eq!(target.import(&rows).await.unwrap(), 2);
    assert_eq!(target.import(&rows).await.unwrap(), 2, "re-import upserts");

    assert_eq!(
        target
            .get("/contenttypes/icontentdata/properties/mainbody/caption", "sv")
            .await
            .unwrap()
            .as_deref(),
        Some(tricky)
    );
    assert_eq!(
        target
            .get("/contenttypes/icontentdata/properties/mainbody/help", "en")
            .await
            .unwrap()
            .as_deref(),
        Some("Line one\nline two")
    );
    assert_eq!(target.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_promoted_override_resolves_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry();
    let overrides = create_test_overrides(registry.clone()).await;
    let content_types = ContentTypeService::new(TreeStore::new(temp_dir.path()), registry, create_test_schema());

    overrides
        .save("/contenttypes/icontentdata/properties/heading/caption", "sv", "Rubrik", None)
        .await
        .unwrap();
    assert_eq!(overrides.promote_to_tree(&content_types, "heading", "sv").await.unwrap(), 1);
    assert!(overrides.get_all().await.unwrap().is_empty());

    let chain = create_test_chain(&temp_dir, overrides).await;
    let value = chain
        .resolve(
            &TranslationKey::new("/contenttypes/standardpage/properties/heading/caption"),
            &Culture::parse("sv-SE").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("Rubrik"));
}

// ==================== View Tests ====================

#[test]
fn test_view_files_edit_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("views_checkout.xml"),
        r#"<languages><language id="en"><cart><title>Cart</title></cart></language></languages>"#,
    )
    .unwrap();

    let service = ViewService::new(
        TreeStore::new(temp_dir.path()),
        create_test_registry(),
        DEFAULT_VIEW_FILE_PATTERN,
    );
    let files = service.list_view_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display_name, "Checkout");

    let mut view = service.get_translations("views_checkout.xml").unwrap();
    view.section_mut("cart").unwrap().entry_mut("title").unwrap().set("sv", "Varukorg");
    service.save_translations(&mut view).unwrap();

    let reloaded = service.get_translations("views_checkout.xml").unwrap();
    let title = reloaded.section("cart").unwrap().entry("title").unwrap();
    assert_eq!(title.get("en"), "Cart");
    assert_eq!(title.get("sv"), "Varukorg");
}
