//! Content-type names, descriptions and property captions.
//!
//! Names and descriptions live in `ReContentTypeNames_<lang>.xml` under
//! `contenttypes/<type>/{name,description}`. Property captions and help texts
//! live in `RePropertyNames_<lang>.xml`, either under the type's own
//! `contenttypes/<type>/properties/<property>` node or under the shared
//! `contenttypes/icontentdata/properties/<property>` node. The type-specific
//! value wins; the shared one fills the gaps. Saves always go to the shared
//! node.

use super::any_value;
use crate::error::Result;
use crate::i18n::{LanguageInfo, LanguageRegistry, TranslationEntry, SHARED_OWNER};
use crate::schema::{ContentTypeCategory, ContentTypeInfo, ContentTypeSchema};
use crate::tree::{discover_keys, Element, LanguageDocument, TreeStore, CONTENT_TYPE_NAMES, PROPERTY_NAMES};
use std::sync::Arc;
use tracing::info;

const CONTENT_TYPES_SECTION: &str = "contenttypes";
const PROPERTIES_SECTION: &str = "properties";

/// Caption and help text of one property across languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTranslation {
    pub property_name: String,
    pub label: TranslationEntry,
    pub description: TranslationEntry,
}

impl PropertyTranslation {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            label: TranslationEntry::new("caption", "Label"),
            description: TranslationEntry::new("help", "Description"),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.label.is_dirty() || self.description.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.label.mark_clean();
        self.description.mark_clean();
    }
}

/// Everything translatable about one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeTranslation {
    pub content_type_name: String,
    pub category: ContentTypeCategory,
    pub name: TranslationEntry,
    pub description: TranslationEntry,
    pub properties: Vec<PropertyTranslation>,
}

impl ContentTypeTranslation {
    pub fn new(content_type_name: impl Into<String>, category: ContentTypeCategory) -> Self {
        Self {
            content_type_name: content_type_name.into(),
            category,
            name: TranslationEntry::new("name", "Name"),
            description: TranslationEntry::new("description", "Description"),
            properties: Vec::new(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.name.is_dirty()
            || self.description.is_dirty()
            || self.properties.iter().any(PropertyTranslation::has_changes)
    }

    pub fn mark_clean(&mut self) {
        self.name.mark_clean();
        self.description.mark_clean();
        for property in &mut self.properties {
            property.mark_clean();
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyTranslation> {
        self.properties
            .iter()
            .find(|p| p.property_name.eq_ignore_ascii_case(name))
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyTranslation> {
        self.properties
            .iter_mut()
            .find(|p| p.property_name.eq_ignore_ascii_case(name))
    }
}

/// Reads and writes content-type translations.
pub struct ContentTypeService {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
    schema: Arc<dyn ContentTypeSchema>,
}

impl ContentTypeService {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>, schema: Arc<dyn ContentTypeSchema>) -> Self {
        Self { store, registry, schema }
    }

    /// Content types of a category (all when `None`), ordered by display name.
    pub fn list_content_types(&self, category: Option<ContentTypeCategory>) -> Vec<ContentTypeInfo> {
        let mut types: Vec<ContentTypeInfo> = self
            .schema
            .content_types()
            .into_iter()
            .filter(|ct| category.map_or(true, |c| ct.category == c))
            .collect();
        types.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        types
    }

    /// Load every language's name, description and property texts.
    ///
    /// The property list comes from the schema when it knows the type;
    /// otherwise it is discovered from the type-specific properties sections
    /// of all language files.
    pub fn get_translations(&self, content_type_name: &str, category: ContentTypeCategory) -> Result<ContentTypeTranslation> {
        let languages = self.registry.languages();
        let type_key = content_type_name.to_lowercase();

        let name_docs = self.store.load_languages(CONTENT_TYPE_NAMES.prefix, languages)?;
        let property_docs = self.store.load_languages(PROPERTY_NAMES.prefix, languages)?;

        let mut translation = ContentTypeTranslation::new(content_type_name, category);

        let mut property_names = match self.schema.find_content_type(content_type_name) {
            Some(info) => info.properties,
            None => discover_properties(&property_docs, &type_key),
        };
        property_names.sort_by_key(|name| name.to_lowercase());
        property_names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        translation.properties = property_names.into_iter().map(PropertyTranslation::new).collect();

        for doc in &name_docs {
            let type_node = doc
                .root()
                .and_then(|root| root.descend(&[CONTENT_TYPES_SECTION, type_key.as_str()]));
            let lang = &doc.language.id;
            translation.name.set(lang, leaf_text(type_node, "name"));
            translation.description.set(lang, leaf_text(type_node, "description"));
        }

        for doc in &property_docs {
            let lang = &doc.language.id;
            let specific = properties_node(doc.root(), &type_key);
            let shared = properties_node(doc.root(), SHARED_OWNER);

            for property in &mut translation.properties {
                let key = property.property_name.to_lowercase();
                let specific_node = specific.and_then(|node| node.child(&key));
                let shared_node = shared.and_then(|node| node.child(&key));

                property
                    .label
                    .set(lang, first_non_empty(specific_node, shared_node, "caption"));
                property
                    .description
                    .set(lang, first_non_empty(specific_node, shared_node, "help"));
            }
        }

        translation.mark_clean();
        Ok(translation)
    }

    /// Persist an edited aggregate and mark it clean.
    ///
    /// # Returns
    /// The number of files written.
    pub fn save_translations(&self, translation: &mut ContentTypeTranslation) -> Result<usize> {
        let languages = self.registry.languages();
        let type_key = translation.content_type_name.to_lowercase();

        let mut written = self.store.save_per_language(
            CONTENT_TYPE_NAMES.prefix,
            languages,
            |lang| any_value([&translation.name, &translation.description], &lang.id),
            |root, lang| {
                let type_node = root.get_or_create(CONTENT_TYPES_SECTION).get_or_create(&type_key);
                type_node.set_leaf("name", translation.name.get(&lang.id));
                type_node.set_leaf("description", translation.description.get(&lang.id));
            },
        )?;

        if !translation.properties.is_empty() {
            written += self.store.save_per_language(
                PROPERTY_NAMES.prefix,
                languages,
                |lang| {
                    translation
                        .properties
                        .iter()
                        .any(|p| any_value([&p.label, &p.description], &lang.id))
                },
                |root, lang| {
                    let properties = shared_properties_mut(root);
                    for property in &translation.properties {
                        let node = properties.get_or_create(&property.property_name.to_lowercase());
                        node.set_leaf("caption", property.label.get(&lang.id));
                        node.set_leaf("help", property.description.get(&lang.id));
                    }
                },
            )?;
        }

        translation.mark_clean();
        info!(
            "Saved translations for content type '{}' ({} files)",
            translation.content_type_name, written
        );
        Ok(written)
    }

    /// Write one property's shared caption and help text for a language.
    ///
    /// Only non-empty values are written; an existing value is kept when the
    /// corresponding argument is `None` or empty.
    ///
    /// # Errors
    /// `UnknownLanguage` when `language` is not enabled.
    pub fn save_property(&self, property_name: &str, language: &str, caption: Option<&str>, help: Option<&str>) -> Result<()> {
        let lang: LanguageInfo = self.registry.require(language)?.clone();

        let mut document = self
            .store
            .load_document(PROPERTY_NAMES.prefix, &lang.id)?
            .unwrap_or_else(|| TreeStore::create_skeleton(&lang));

        let node = shared_properties_mut(&mut document.root).get_or_create(&property_name.to_lowercase());
        if let Some(caption) = caption.filter(|v| !v.is_empty()) {
            node.set_leaf("caption", caption);
        }
        if let Some(help) = help.filter(|v| !v.is_empty()) {
            node.set_leaf("help", help);
        }

        self.store
            .save_document(&document, &self.store.file_path(PROPERTY_NAMES.prefix, &lang.id))
    }

    /// Translations for every content type the schema lists.
    pub fn get_all_translations(&self) -> Result<Vec<ContentTypeTranslation>> {
        self.list_content_types(None)
            .iter()
            .map(|ct| self.get_translations(&ct.name, ct.category))
            .collect()
    }
}

fn leaf_text(node: Option<&Element>, name: &str) -> String {
    node.and_then(|n| n.child_value(name)).unwrap_or_default().to_string()
}

fn first_non_empty(primary: Option<&Element>, fallback: Option<&Element>, field: &str) -> String {
    let primary_value = leaf_text(primary, field);
    if primary_value.is_empty() {
        leaf_text(fallback, field)
    } else {
        primary_value
    }
}

fn properties_node<'a>(root: Option<&'a Element>, owner: &str) -> Option<&'a Element> {
    root.and_then(|r| r.descend(&[CONTENT_TYPES_SECTION, owner, PROPERTIES_SECTION]))
}

fn shared_properties_mut(root: &mut Element) -> &mut Element {
    root.get_or_create(CONTENT_TYPES_SECTION)
        .get_or_create(SHARED_OWNER)
        .get_or_create(PROPERTIES_SECTION)
}

fn discover_properties(documents: &[LanguageDocument], type_key: &str) -> Vec<String> {
    discover_keys(documents, |root| {
        properties_node(Some(root), type_key)
            .map(|node| node.children.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    })
}
