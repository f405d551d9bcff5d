//! Editor hint texts, stored in `ReEditorHintNames_<lang>.xml`.
//!
//! Each root child is a section. A section holds either direct leaves
//! (`preview/heading`) or one level of grouping
//! (`blocks/buttonblockcontrol/buttondefaulttext`).

use super::any_value;
use crate::error::Result;
use crate::i18n::{LanguageRegistry, TranslationEntry};
use crate::tree::{discover_keys, Element, LanguageDocument, TreeStore, EDITOR_HINT_NAMES};
use std::sync::Arc;
use tracing::info;

/// Sections with a known display name, listed before any other section.
const KNOWN_SECTIONS: [(&str, &str); 3] = [
    ("blocks", "Blocks"),
    ("preview", "Preview"),
    ("renderingerror", "Rendering Errors"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorHintEntry {
    /// Grouping element, `None` for a direct leaf of the section
    pub parent_key: Option<String>,
    pub key: String,
    pub value: TranslationEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorHintSection {
    pub name: String,
    pub display_name: String,
    pub entries: Vec<EditorHintEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorHintTranslation {
    pub sections: Vec<EditorHintSection>,
}

impl EditorHintTranslation {
    fn values(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.sections
            .iter()
            .flat_map(|section| section.entries.iter().map(|entry| &entry.value))
    }

    pub fn has_changes(&self) -> bool {
        self.values().any(TranslationEntry::is_dirty)
    }

    pub fn mark_clean(&mut self) {
        for section in &mut self.sections {
            for entry in &mut section.entries {
                entry.value.mark_clean();
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&EditorHintSection> {
        self.sections.iter().find(|section| section.name == name)
    }
}

pub struct EditorHintService {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
}

impl EditorHintService {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn get_translations(&self) -> Result<EditorHintTranslation> {
        let docs = self.store.load_languages(EDITOR_HINT_NAMES.prefix, self.registry.languages())?;

        let mut translation = EditorHintTranslation::default();
        for name in discover_sections(&docs) {
            let pairs = discover_keys(&docs, |root| root.child(&name).map(entry_keys).unwrap_or_default());

            let entries = pairs
                .into_iter()
                .map(|(parent_key, key)| {
                    let mut value = TranslationEntry::new(key.clone(), key.clone());
                    for doc in &docs {
                        let text = doc
                            .root()
                            .and_then(|root| root.child(&name))
                            .and_then(|section| match &parent_key {
                                Some(parent) => section.child(parent).and_then(|p| p.child_value(&key)),
                                None => section.child_value(&key),
                            })
                            .unwrap_or_default();
                        value.set(doc.language.id.as_str(), text);
                    }
                    EditorHintEntry { parent_key, key, value }
                })
                .collect();

            translation.sections.push(EditorHintSection {
                display_name: section_display_name(&name),
                name,
                entries,
            });
        }

        translation.mark_clean();
        Ok(translation)
    }

    pub fn save_translations(&self, translation: &mut EditorHintTranslation) -> Result<usize> {
        let written = self.store.save_per_language(
            EDITOR_HINT_NAMES.prefix,
            self.registry.languages(),
            |lang| any_value(translation.values(), &lang.id),
            |root, lang| {
                for section in &translation.sections {
                    let section_node = root.get_or_create(&section.name);
                    for entry in &section.entries {
                        let value = entry.value.get(&lang.id);
                        match &entry.parent_key {
                            Some(parent) => section_node.get_or_create(parent).set_leaf(&entry.key, value),
                            None => section_node.set_leaf(&entry.key, value),
                        }
                    }
                }
            },
        )?;

        translation.mark_clean();
        info!("Saved editor hint translations ({} files)", written);
        Ok(written)
    }
}

fn section_display_name(name: &str) -> String {
    KNOWN_SECTIONS
        .iter()
        .find(|(known, _)| *known == name)
        .map_or_else(|| name.to_string(), |(_, display)| display.to_string())
}

/// Known sections present in any language, then every other root child in
/// first-seen order.
fn discover_sections(docs: &[LanguageDocument]) -> Vec<String> {
    let present = discover_keys(docs, |root| root.children.iter().map(|c| c.name.clone()).collect());

    let mut sections: Vec<String> = KNOWN_SECTIONS
        .iter()
        .map(|(name, _)| name.to_string())
        .filter(|name| present.contains(name))
        .collect();
    sections.extend(
        present
            .into_iter()
            .filter(|name| !KNOWN_SECTIONS.iter().any(|(known, _)| known == name)),
    );
    sections
}

/// `(parent, key)` pairs of one section: grandchildren of children that have
/// elements, otherwise the child itself.
fn entry_keys(section: &Element) -> Vec<(Option<String>, String)> {
    section
        .children
        .iter()
        .flat_map(|child| {
            if child.has_children() {
                child
                    .children
                    .iter()
                    .map(|grandchild| (Some(child.name.clone()), grandchild.name.clone()))
                    .collect::<Vec<_>>()
            } else {
                vec![(None, child.name.clone())]
            }
        })
        .collect()
}
