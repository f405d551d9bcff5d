//! Resolution chain.
//!
//! A host asks the chain for a string by key and culture. Providers are tried
//! in priority order (lower first); the first value wins. The override
//! provider sits at the front so database overrides beat the shipped
//! translation files without touching them.

use crate::error::Result;
use crate::i18n::{Culture, LanguageRegistry, TranslationKey};
use crate::overrides::OverrideService;
use crate::tree::{Element, TreeStore, ALL_DOMAINS};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tracing::debug;

/// Priority the override provider registers with.
pub const OVERRIDE_PRIORITY: i32 = 0;

/// Priority of the translation-file provider.
pub const TREE_FILE_PRIORITY: i32 = 100;

/// One link of the chain. `Ok(None)` defers to the next provider.
pub trait LocalizationProvider: Send + Sync {
    fn get_string<'a>(&'a self, key: &'a TranslationKey, culture: &'a Culture) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Resolves keys against the override store.
///
/// Lookup order:
/// 1. exact culture (`en-us`)
/// 2. two-letter code (`en`) when the culture has a region
/// 3. both again for the shared-fallback key of a property key
pub struct OverrideProvider {
    overrides: Arc<OverrideService>,
}

impl OverrideProvider {
    pub fn new(overrides: Arc<OverrideService>) -> Self {
        Self { overrides }
    }

    async fn lookup(&self, key: &TranslationKey, culture: &Culture) -> Result<Option<String>> {
        for language in culture.lookup_candidates() {
            if let Some(value) = self.overrides.get(key.as_str(), language).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl LocalizationProvider for OverrideProvider {
    fn get_string<'a>(&'a self, key: &'a TranslationKey, culture: &'a Culture) -> BoxFuture<'a, Result<Option<String>>> {
        async move {
            if let Some(value) = self.lookup(key, culture).await? {
                return Ok(Some(value));
            }

            let Some(fallback) = key.shared_fallback() else {
                return Ok(None);
            };
            let value = self.lookup(&fallback, culture).await?;
            if value.is_some() {
                debug!("Resolved {} [{}] through shared fallback {}", key, culture, fallback);
            }
            Ok(value)
        }
        .boxed()
    }
}

/// Resolves keys against the per-language translation files.
///
/// The key path is followed from the root of every domain file of the
/// language; the first non-empty leaf wins. Property keys fall back to the
/// shared `icontentdata` section like the content-type service does.
pub struct TreeFileProvider {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
}

impl TreeFileProvider {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>) -> Self {
        Self { store, registry }
    }

    async fn lookup(&self, key: &TranslationKey, language_id: &str) -> Result<Option<String>> {
        let segments = key.segments();
        for domain in ALL_DOMAINS {
            let path = self.store.file_path(domain.prefix, language_id);
            let Some(document) = self.store.load_file_async(&path).await? else {
                continue;
            };
            if let Some(value) = leaf_at(&document.root, &segments) {
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }
}

impl LocalizationProvider for TreeFileProvider {
    fn get_string<'a>(&'a self, key: &'a TranslationKey, culture: &'a Culture) -> BoxFuture<'a, Result<Option<String>>> {
        async move {
            let fallback = key.shared_fallback();
            let keys = std::iter::once(key).chain(fallback.as_ref());

            for key in keys {
                for candidate in culture.lookup_candidates() {
                    let Some(language) = self.registry.find(candidate) else {
                        continue;
                    };
                    if let Some(value) = self.lookup(key, &language.id).await? {
                        return Ok(Some(value));
                    }
                }
            }
            Ok(None)
        }
        .boxed()
    }
}

/// Non-empty leaf reached by following `segments` (case-insensitive).
fn leaf_at<'a>(root: &'a Element, segments: &[&str]) -> Option<&'a str> {
    let node = segments.iter().try_fold(root, |node, segment| {
        node.children
            .iter()
            .find(|child| child.name.eq_ignore_ascii_case(segment))
    })?;
    Some(node.value()).filter(|value| !node.has_children() && !value.is_empty())
}

struct Registration {
    priority: i32,
    name: String,
    provider: Arc<dyn LocalizationProvider>,
}

/// Providers ordered by priority.
#[derive(Default)]
pub struct LocalizationChain {
    providers: Vec<Registration>,
}

impl LocalizationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. A provider registered under the same name is replaced.
    /// Providers with equal priority keep registration order.
    pub fn register(&mut self, priority: i32, name: impl Into<String>, provider: Arc<dyn LocalizationProvider>) {
        let name = name.into();
        self.unregister(&name);
        debug!("Registered localization provider '{}' at priority {}", name, priority);

        let index = self
            .providers
            .iter()
            .position(|existing| existing.priority > priority)
            .unwrap_or(self.providers.len());
        self.providers.insert(index, Registration { priority, name, provider });
    }

    /// Returns true if a provider was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.providers.len();
        self.providers.retain(|registration| registration.name != name);
        self.providers.len() != before
    }

    /// Provider names in lookup order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|r| r.name.as_str()).collect()
    }

    /// First value any provider returns for `key` in `culture`.
    pub async fn resolve(&self, key: &TranslationKey, culture: &Culture) -> Result<Option<String>> {
        for registration in &self.providers {
            if let Some(value) = registration.provider.get_string(key, culture).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::overrides::DEFAULT_TTL;
    use tempfile::TempDir;

    struct FixedProvider(Option<&'static str>);

    impl LocalizationProvider for FixedProvider {
        fn get_string<'a>(&'a self, _key: &'a TranslationKey, _culture: &'a Culture) -> BoxFuture<'a, Result<Option<String>>> {
            async move { Ok(self.0.map(str::to_string)) }.boxed()
        }
    }

    fn registry() -> Arc<LanguageRegistry> {
        Arc::new(LanguageRegistry::new([("en", "English"), ("sv", "Svenska")]).unwrap())
    }

    async fn create_test_overrides() -> Arc<OverrideService> {
        let db = Database::in_memory().await.expect("Failed to create test database");
        Arc::new(OverrideService::new(db, registry(), DEFAULT_TTL))
    }

    fn key(raw: &str) -> TranslationKey {
        TranslationKey::new(raw)
    }

    fn culture(name: &str) -> Culture {
        Culture::parse(name).unwrap()
    }

    // ==================== Chain Tests ====================

    #[tokio::test]
    async fn test_chain_orders_by_priority() {
        let mut chain = LocalizationChain::new();
        chain.register(10, "late", Arc::new(FixedProvider(Some("late"))));
        chain.register(1, "early", Arc::new(FixedProvider(Some("early"))));

        assert_eq!(chain.provider_names(), vec!["early", "late"]);
        assert_eq!(chain.resolve(&key("/a"), &culture("en")).await.unwrap().as_deref(), Some("early"));
    }

    #[tokio::test]
    async fn test_chain_defers_to_next_provider() {
        let mut chain = LocalizationChain::new();
        chain.register(0, "empty", Arc::new(FixedProvider(None)));
        chain.register(5, "files", Arc::new(FixedProvider(Some("from file"))));

        assert_eq!(chain.resolve(&key("/a"), &culture("en")).await.unwrap().as_deref(), Some("from file"));
    }

    #[tokio::test]
    async fn test_register_same_name_replaces() {
        let mut chain = LocalizationChain::new();
        chain.register(0, "overrides", Arc::new(FixedProvider(Some("old"))));
        chain.register(0, "overrides", Arc::new(FixedProvider(Some("new"))));

        assert_eq!(chain.provider_names().len(), 1);
        assert_eq!(chain.resolve(&key("/a"), &culture("en")).await.unwrap().as_deref(), Some("new"));
        assert!(chain.unregister("overrides"));
        assert!(!chain.unregister("overrides"));
        assert!(chain.resolve(&key("/a"), &culture("en")).await.unwrap().is_none());
    }

    // ==================== Override Provider Tests ====================

    #[tokio::test]
    async fn test_override_exact_culture_first() {
        let overrides = create_test_overrides().await;
        overrides.save("/contenttypes/x/name", "en", "Generic", None).await.unwrap();
        overrides.save("/contenttypes/x/name", "en-us", "American", None).await.unwrap();

        let provider = OverrideProvider::new(overrides);
        let value = provider.get_string(&key("/contenttypes/x/name"), &culture("en-US")).await.unwrap();
        assert_eq!(value.as_deref(), Some("American"));
    }

    #[tokio::test]
    async fn test_override_two_letter_code() {
        let overrides = create_test_overrides().await;
        overrides.save("/contenttypes/x/name", "sv", "Svensk", None).await.unwrap();

        let provider = OverrideProvider::new(overrides);
        let value = provider.get_string(&key("/contenttypes/x/name"), &culture("sv-FI")).await.unwrap();
        assert_eq!(value.as_deref(), Some("Svensk"));
    }

    #[tokio::test]
    async fn test_override_shared_fallback() {
        let overrides = create_test_overrides().await;
        overrides
            .save("/contenttypes/icontentdata/properties/mainbody/caption", "en", "Body", None)
            .await
            .unwrap();

        let provider = OverrideProvider::new(overrides);
        let value = provider
            .get_string(&key("/contenttypes/standardpage/properties/mainbody/caption"), &culture("en-US"))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("Body"));
    }

    #[tokio::test]
    async fn test_type_specific_override_beats_shared() {
        let overrides = create_test_overrides().await;
        overrides
            .save("/contenttypes/icontentdata/properties/mainbody/caption", "en", "Body", None)
            .await
            .unwrap();
        overrides
            .save("/contenttypes/standardpage/properties/mainbody/caption", "en", "Page body", None)
            .await
            .unwrap();

        let provider = OverrideProvider::new(overrides);
        let value = provider
            .get_string(&key("/contenttypes/standardpage/properties/mainbody/caption"), &culture("en"))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("Page body"));
    }

    #[tokio::test]
    async fn test_non_property_key_has_no_fallback() {
        let overrides = create_test_overrides().await;
        overrides.save("/contenttypes/icontentdata/name", "en", "Shared", None).await.unwrap();

        let provider = OverrideProvider::new(overrides);
        let value = provider.get_string(&key("/contenttypes/startpage/name"), &culture("en")).await.unwrap();
        assert!(value.is_none());
    }

    // ==================== Tree File Provider Tests ====================

    fn create_test_tree_provider() -> (TreeFileProvider, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            temp_dir.path().join("RePropertyNames_en.xml"),
            r#"<language name="English" id="en"><contenttypes><icontentdata><properties>
                <mainbody><caption>Main body</caption><help></help></mainbody>
            </properties></icontentdata></contenttypes></language>"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("ReContentTypeNames_en.xml"),
            r#"<language name="English" id="en"><contenttypes>
                <StandardPage><name>Standard page</name></StandardPage>
            </contenttypes></language>"#,
        )
        .unwrap();
        let provider = TreeFileProvider::new(TreeStore::new(temp_dir.path()), registry());
        (provider, temp_dir)
    }

    #[tokio::test]
    async fn test_tree_provider_reads_leaf() {
        let (provider, _temp_dir) = create_test_tree_provider();
        let value = provider
            .get_string(&key("/contenttypes/standardpage/name"), &culture("en-GB"))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("Standard page"));
    }

    #[tokio::test]
    async fn test_tree_provider_shared_fallback_and_empty_leaf() {
        let (provider, _temp_dir) = create_test_tree_provider();
        let caption = provider
            .get_string(&key("/contenttypes/articlepage/properties/mainbody/caption"), &culture("en"))
            .await
            .unwrap();
        assert_eq!(caption.as_deref(), Some("Main body"));

        let help = provider
            .get_string(&key("/contenttypes/articlepage/properties/mainbody/help"), &culture("en"))
            .await
            .unwrap();
        assert!(help.is_none(), "empty leaves defer");
    }

    #[tokio::test]
    async fn test_tree_provider_unknown_language() {
        let (provider, _temp_dir) = create_test_tree_provider();
        let value = provider
            .get_string(&key("/contenttypes/standardpage/name"), &culture("de"))
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_override_wins_over_tree_file() {
        let (tree, _temp_dir) = create_test_tree_provider();
        let overrides = create_test_overrides().await;
        overrides.save("/contenttypes/standardpage/name", "en", "Overridden", None).await.unwrap();

        let mut chain = LocalizationChain::new();
        chain.register(TREE_FILE_PRIORITY, "files", Arc::new(tree));
        chain.register(OVERRIDE_PRIORITY, "overrides", Arc::new(OverrideProvider::new(overrides)));

        let value = chain.resolve(&key("/contenttypes/standardpage/name"), &culture("en")).await.unwrap();
        assert_eq!(value.as_deref(), Some("Overridden"));
    }
}
