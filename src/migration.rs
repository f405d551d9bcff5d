//! One-time migration from the legacy multi-language files to per-language
//! domain files.
//!
//! Legacy files (`ContentTypeNames.xml`, `PropertyNames.xml`,
//! `GroupNames.xml`, `Display.xml`, `EditorHints.xml`) hold one
//! `<language id>` sub-root per language. Each is split into
//! `<Prefix>_<language>.xml` files. Steps run in order and fail
//! independently; a failed step is recorded and the next one still runs.

use crate::error::Result;
use crate::i18n::{LanguageInfo, LanguageRegistry, SHARED_OWNER};
use crate::tree::{
    Domain, Element, TreeDocument, TreeStore, ALL_DOMAINS, CONTENT_TYPE_NAMES, DISPLAY_NAMES, EDITOR_HINT_NAMES,
    GROUP_NAMES, PROPERTY_NAMES,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

pub const LEGACY_CONTENT_TYPES_FILE: &str = "ContentTypeNames.xml";
pub const LEGACY_PROPERTIES_FILE: &str = "PropertyNames.xml";
pub const LEGACY_GROUP_NAMES_FILE: &str = "GroupNames.xml";
pub const LEGACY_DISPLAY_FILE: &str = "Display.xml";
pub const LEGACY_EDITOR_HINTS_FILE: &str = "EditorHints.xml";

pub const TOTAL_STEPS: usize = 5;

const CONTENT_TYPES_SECTION: &str = "contenttypes";
const PROPERTIES_SECTION: &str = "properties";

/// Reported after every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationProgress {
    pub label: String,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub success: bool,
    pub files_created: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ContentTypeNames,
    PropertyNames,
    GroupNames,
    Display,
    EditorHints,
}

impl Step {
    const ALL: [Step; TOTAL_STEPS] = [
        Step::ContentTypeNames,
        Step::PropertyNames,
        Step::GroupNames,
        Step::Display,
        Step::EditorHints,
    ];

    fn label(self) -> &'static str {
        match self {
            Step::ContentTypeNames => "Content type names",
            Step::PropertyNames => "Property names",
            Step::GroupNames => "Group names",
            Step::Display => "Display channel names",
            Step::EditorHints => "Editor hint names",
        }
    }
}

pub struct MigrationEngine {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
}

impl MigrationEngine {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>) -> Self {
        Self { store, registry }
    }

    /// True when the translation folder exists and holds no
    /// `<Prefix>_*.xml` file of any domain.
    ///
    /// A single domain file is taken as proof of a finished migration, so a
    /// partially migrated folder reads as migrated.
    pub fn needs_migration(&self) -> bool {
        let folder = self.store.folder();
        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(_) => return false,
        };

        !entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .any(|name| is_domain_file(&name))
    }

    /// Run every step for every enabled language.
    ///
    /// Callers run this only while [`MigrationEngine::needs_migration`] is
    /// true. Written files are kept even when a later step fails.
    ///
    /// # Arguments
    /// * `progress` - Optional channel receiving one update per finished step
    pub async fn migrate(&self, progress: Option<&UnboundedSender<MigrationProgress>>) -> MigrationResult {
        let mut files_created = 0;
        let mut errors = Vec::new();

        info!("Migrating legacy translation files in {}", self.store.folder().display());

        for (index, step) in Step::ALL.into_iter().enumerate() {
            let mut created = 0;
            let outcome = self.run_step(step, &mut created).await;
            files_created += created;
            match outcome {
                Ok(()) => info!("{}: {} files created", step.label(), created),
                Err(err) => {
                    error!("{} failed after {} files: {}", step.label(), created, err);
                    errors.push(format!("{}: {}", step.label(), err));
                }
            }

            if let Some(sender) = progress {
                let update = MigrationProgress {
                    label: step.label().to_string(),
                    completed: index + 1,
                    total: TOTAL_STEPS,
                };
                if sender.send(update).is_err() {
                    warn!("Migration progress receiver dropped");
                }
            }
        }

        info!(
            "Migration finished: {} files created, {} errors",
            files_created,
            errors.len()
        );
        MigrationResult {
            success: errors.is_empty(),
            files_created,
            errors,
        }
    }

    /// Runs one step, adding every file it writes to `created` as it goes.
    async fn run_step(&self, step: Step, created: &mut usize) -> Result<()> {
        match step {
            Step::ContentTypeNames => {
                self.split_legacy_file(LEGACY_CONTENT_TYPES_FILE, CONTENT_TYPE_NAMES, content_type_names, created)
                    .await
            }
            Step::PropertyNames => self.migrate_property_names(created).await,
            Step::GroupNames => {
                self.split_legacy_file(
                    LEGACY_GROUP_NAMES_FILE,
                    GROUP_NAMES,
                    |section| copy_sections(section, GROUP_NAMES),
                    created,
                )
                .await
            }
            Step::Display => {
                self.split_legacy_file(
                    LEGACY_DISPLAY_FILE,
                    DISPLAY_NAMES,
                    |section| copy_sections(section, DISPLAY_NAMES),
                    created,
                )
                .await
            }
            Step::EditorHints => {
                self.split_legacy_file(
                    LEGACY_EDITOR_HINTS_FILE,
                    EDITOR_HINT_NAMES,
                    |section| section.children.clone(),
                    created,
                )
                .await
            }
        }
    }

    async fn load_legacy(&self, file_name: &str) -> Result<Option<TreeDocument>> {
        self.store.load_file_async(&self.store.folder().join(file_name)).await
    }

    /// Write one domain file per language that has a sub-root in the legacy
    /// file, filled with whatever `extract` takes from that sub-root.
    async fn split_legacy_file<F>(
        &self,
        legacy_file: &str,
        domain: Domain,
        extract: F,
        created: &mut usize,
    ) -> Result<()>
    where
        F: Fn(&Element) -> Vec<Element>,
    {
        let Some(legacy) = self.load_legacy(legacy_file).await? else {
            info!("{} not found, skipping", legacy_file);
            return Ok(());
        };

        for language in self.registry.languages() {
            let Some(section) = legacy.language_section(&language.id) else {
                continue;
            };

            let mut document = TreeStore::create_skeleton(language);
            document.root.children.extend(extract(section));
            self.write(&document, domain, language).await?;
            *created += 1;
        }
        Ok(())
    }

    /// Union of the properties nested under content types in the legacy
    /// content-type file and in the legacy properties file, written under
    /// the shared `icontentdata` owner. The first occurrence of a property
    /// name wins. Every enabled language gets a file, empty when neither
    /// source has a section for it.
    async fn migrate_property_names(&self, created: &mut usize) -> Result<()> {
        let sources = [
            self.load_legacy(LEGACY_CONTENT_TYPES_FILE).await?,
            self.load_legacy(LEGACY_PROPERTIES_FILE).await?,
        ];
        if sources.iter().all(Option::is_none) {
            info!("No legacy property sources found, skipping");
            return Ok(());
        }

        for language in self.registry.languages() {
            let sections: Vec<&Element> = sources
                .iter()
                .flatten()
                .filter_map(|doc| doc.language_section(&language.id))
                .collect();

            let mut properties: Vec<Element> = Vec::new();
            for section in sections {
                for property in nested_properties(section) {
                    if !properties.iter().any(|p| p.name == property.name) {
                        properties.push(property.clone());
                    }
                }
            }

            let mut document = TreeStore::create_skeleton(language);
            if !properties.is_empty() {
                document
                    .root
                    .get_or_create(CONTENT_TYPES_SECTION)
                    .get_or_create(SHARED_OWNER)
                    .get_or_create(PROPERTIES_SECTION)
                    .children = properties;
            }
            self.write(&document, PROPERTY_NAMES, language).await?;
            *created += 1;
        }
        Ok(())
    }

    async fn write(&self, document: &TreeDocument, domain: Domain, language: &LanguageInfo) -> Result<()> {
        let path = self.store.file_path(domain.prefix, &language.id);
        self.store.save_document_async(document, &path).await?;
        info!("Created {}", path.display());
        Ok(())
    }
}

fn is_domain_file(file_name: &str) -> bool {
    file_name.ends_with(".xml")
        && ALL_DOMAINS
            .iter()
            .any(|domain| file_name.starts_with(&format!("{}_", domain.prefix)))
}

/// `contenttypes` with only the name and description of every content type.
fn content_type_names(section: &Element) -> Vec<Element> {
    let Some(content_types) = section.child(CONTENT_TYPES_SECTION) else {
        return Vec::new();
    };

    let mut names = Element::new(CONTENT_TYPES_SECTION);
    for content_type in &content_types.children {
        let mut copy = Element::new(content_type.name.as_str());
        for field in ["name", "description"] {
            if let Some(value) = content_type.child_value(field) {
                copy.push(Element::leaf(field, value));
            }
        }
        names.push(copy);
    }
    vec![names]
}

/// Verbatim copies of the domain's sections present in `section`.
fn copy_sections(section: &Element, domain: Domain) -> Vec<Element> {
    domain
        .sections
        .iter()
        .filter_map(|name| section.child(name).cloned())
        .collect()
}

/// `contenttypes/*/properties/*` of a legacy language sub-root.
fn nested_properties(section: &Element) -> impl Iterator<Item = &Element> {
    section
        .child(CONTENT_TYPES_SECTION)
        .into_iter()
        .flat_map(|content_types| content_types.children.iter())
        .filter_map(|content_type| content_type.child(PROPERTIES_SECTION))
        .flat_map(|properties| properties.children.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_engine() -> (MigrationEngine, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let registry = Arc::new(LanguageRegistry::new([("en", "English"), ("sv", "Svenska")]).unwrap());
        let engine = MigrationEngine::new(TreeStore::new(temp_dir.path()), registry);
        (engine, temp_dir)
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn read_root(dir: &Path, name: &str) -> Element {
        let content = std::fs::read_to_string(dir.join(name)).unwrap();
        TreeDocument::parse(&content).unwrap().root
    }

    const LEGACY_CONTENT_TYPES: &str = r#"<languages>
        <language name="English" id="EN">
            <contenttypes>
                <standardpage>
                    <name>Standard page</name>
                    <description>A page</description>
                    <properties>
                        <mainbody><caption>Body</caption><help>Main text</help></mainbody>
                    </properties>
                </standardpage>
            </contenttypes>
        </language>
        <language name="Svenska" id="sv">
            <contenttypes><standardpage><name>Standardsida</name></standardpage></contenttypes>
        </language>
    </languages>"#;

    // ==================== NeedsMigration Tests ====================

    #[test]
    fn test_needs_migration_missing_folder() {
        let registry = Arc::new(LanguageRegistry::parse("en").unwrap());
        let engine = MigrationEngine::new(TreeStore::new("/nonexistent/translations"), registry);
        assert!(!engine.needs_migration());
    }

    #[test]
    fn test_needs_migration_until_one_domain_file_exists() {
        let (engine, temp_dir) = create_test_engine();
        write(temp_dir.path(), LEGACY_CONTENT_TYPES_FILE, LEGACY_CONTENT_TYPES);
        write(temp_dir.path(), "views_start.xml", "<languages/>");
        assert!(engine.needs_migration());

        write(temp_dir.path(), "ReGroupNames_en.xml", r#"<language id="en"/>"#);
        assert!(!engine.needs_migration());
    }

    #[test]
    fn test_is_domain_file() {
        assert!(is_domain_file("ReContentTypeNames_sv.xml"));
        assert!(!is_domain_file("ContentTypeNames.xml"));
        assert!(!is_domain_file("ReGroupNames_en.xml.tmp"));
    }

    // ==================== Step Tests ====================

    #[tokio::test]
    async fn test_content_type_names_drop_properties() {
        let (engine, temp_dir) = create_test_engine();
        write(temp_dir.path(), LEGACY_CONTENT_TYPES_FILE, LEGACY_CONTENT_TYPES);

        let result = engine.migrate(None).await;
        assert!(result.success, "errors: {:?}", result.errors);

        let en = read_root(temp_dir.path(), "ReContentTypeNames_en.xml");
        assert_eq!(en.attribute("id"), Some("en"));
        let page = en.descend(&["contenttypes", "standardpage"]).unwrap();
        assert_eq!(page.child_value("name"), Some("Standard page"));
        assert_eq!(page.child_value("description"), Some("A page"));
        assert!(page.child("properties").is_none());

        let sv = read_root(temp_dir.path(), "ReContentTypeNames_sv.xml");
        let sv_page = sv.descend(&["contenttypes", "standardpage"]).unwrap();
        assert!(sv_page.child("description").is_none());
    }

    #[tokio::test]
    async fn test_property_names_union_first_wins() {
        let (engine, temp_dir) = create_test_engine();
        write(temp_dir.path(), LEGACY_CONTENT_TYPES_FILE, LEGACY_CONTENT_TYPES);
        write(
            temp_dir.path(),
            LEGACY_PROPERTIES_FILE,
            r#"<languages><language id="en"><contenttypes><icontentdata><properties>
                <mainbody><caption>Ignored</caption></mainbody>
                <heading><caption>Heading</caption></heading>
            </properties></icontentdata></contenttypes></language></languages>"#,
        );

        engine.migrate(None).await;

        let en = read_root(temp_dir.path(), "RePropertyNames_en.xml");
        let properties = en.descend(&["contenttypes", "icontentdata", "properties"]).unwrap();
        let names: Vec<_> = properties.children.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mainbody", "heading"]);
        assert_eq!(properties.child("mainbody").unwrap().child_value("caption"), Some("Body"));
        assert_eq!(properties.child("mainbody").unwrap().child_value("help"), Some("Main text"));

        let sv = read_root(temp_dir.path(), "RePropertyNames_sv.xml");
        assert!(sv.child("contenttypes").is_none(), "no properties for sv");
    }

    #[tokio::test]
    async fn test_verbatim_sections_and_progress() {
        let (engine, temp_dir) = create_test_engine();
        write(
            temp_dir.path(),
            LEGACY_GROUP_NAMES_FILE,
            r#"<languages><language id="en">
                <headings><heading name="SEO"><description>Search</description></heading></headings>
                <unrelated><x>1</x></unrelated>
            </language></languages>"#,
        );
        write(
            temp_dir.path(),
            LEGACY_DISPLAY_FILE,
            r#"<languages><language id="sv"><resolutions><full>Hel</full></resolutions></language></languages>"#,
        );
        write(
            temp_dir.path(),
            LEGACY_EDITOR_HINTS_FILE,
            r#"<languages><language id="en"><preview><title>Preview</title></preview><custom><a>b</a></custom></language></languages>"#,
        );

        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
        let result = engine.migrate(Some(&sender)).await;
        drop(sender);

        assert!(result.success);
        assert_eq!(result.files_created, 3);

        let groups = read_root(temp_dir.path(), "ReGroupNames_en.xml");
        assert!(groups.child("headings").is_some());
        assert!(groups.child("unrelated").is_none());
        assert!(!temp_dir.path().join("ReGroupNames_sv.xml").exists());

        let display = read_root(temp_dir.path(), "ReDisplayChannelNames_sv.xml");
        assert_eq!(display.descend(&["resolutions", "full"]).unwrap().value(), "Hel");

        let hints = read_root(temp_dir.path(), "ReEditorHintNames_en.xml");
        assert!(hints.child("custom").is_some());

        let mut updates = Vec::new();
        while let Some(update) = receiver.recv().await {
            updates.push(update);
        }
        assert_eq!(updates.len(), TOTAL_STEPS);
        assert_eq!(updates[0].label, "Content type names");
        assert_eq!(updates[4].completed, 5);
        assert!(updates.iter().all(|u| u.total == 5));
        assert!(!engine.needs_migration());
    }

    #[tokio::test]
    async fn test_failed_step_does_not_block_others() {
        let (engine, temp_dir) = create_test_engine();
        write(temp_dir.path(), LEGACY_GROUP_NAMES_FILE, "<languages><language id=\"en\">");
        write(
            temp_dir.path(),
            LEGACY_DISPLAY_FILE,
            r#"<languages><language id="en"><displayoptions><a>A</a></displayoptions></language></languages>"#,
        );

        let result = engine.migrate(None).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Group names"));
        assert_eq!(result.files_created, 1);
        assert!(temp_dir.path().join("ReDisplayChannelNames_en.xml").exists());
    }

    #[tokio::test]
    async fn test_partial_step_counts_written_files() {
        let (engine, temp_dir) = create_test_engine();
        write(temp_dir.path(), LEGACY_CONTENT_TYPES_FILE, LEGACY_CONTENT_TYPES);
        // A directory in place of the sv file makes the second write fail
        let blocked = temp_dir.path().join("ReContentTypeNames_sv.xml");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();

        let result = engine.migrate(None).await;

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Content type names"));
        assert!(temp_dir.path().join("ReContentTypeNames_en.xml").exists());
        // en content type names plus en and sv property names
        assert_eq!(result.files_created, 3);
    }

    #[tokio::test]
    async fn test_property_names_written_for_language_without_legacy_data() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let registry = Arc::new(LanguageRegistry::new([("en", "English"), ("de", "Deutsch")]).unwrap());
        let engine = MigrationEngine::new(TreeStore::new(temp_dir.path()), registry);
        write(
            temp_dir.path(),
            LEGACY_PROPERTIES_FILE,
            r#"<languages><language id="en"><contenttypes><icontentdata><properties>
                <heading><caption>Heading</caption></heading>
            </properties></icontentdata></contenttypes></language></languages>"#,
        );

        let result = engine.migrate(None).await;

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.files_created, 2);
        let de = read_root(temp_dir.path(), "RePropertyNames_de.xml");
        assert_eq!(de.attribute("id"), Some("de"));
        assert!(de.children.is_empty());
    }

    #[tokio::test]
    async fn test_no_legacy_files() {
        let (engine, _temp_dir) = create_test_engine();
        let result = engine.migrate(None).await;
        assert!(result.success);
        assert_eq!(result.files_created, 0);
    }
}
