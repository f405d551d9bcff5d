//! Free-form view texts.
//!
//! Unlike the other domains, a view is one multi-language file matching the
//! view file pattern (default `views_*.xml`):
//! `<languages><language id="en"><section><key>..</key></section></language></languages>`.
//! Sections and keys can be added and removed, so the aggregate also tracks
//! structural changes.

use super::capitalize;
use crate::error::{LocalizationError, Result};
use crate::i18n::{LanguageRegistry, TranslationEntry};
use crate::tree::{discover_keys, Element, LanguageDocument, TreeDocument, TreeStore, LANGUAGE_ELEMENT};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_VIEW_FILE_PATTERN: &str = "views_*.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFile {
    pub file_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSection {
    pub name: String,
    pub display_name: String,
    pub entries: Vec<TranslationEntry>,
}

impl ViewSection {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: capitalize(&name),
            name,
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, key: &str) -> Option<&TranslationEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entry_mut(&mut self, key: &str) -> Option<&mut TranslationEntry> {
        self.entries.iter_mut().find(|entry| entry.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewTranslation {
    pub file_name: String,
    pub display_name: String,
    pub sections: Vec<ViewSection>,
    /// A section or key was added or removed since the last load or save
    pub structure_changed: bool,
}

impl ViewTranslation {
    pub fn has_changes(&self) -> bool {
        self.structure_changed
            || self
                .sections
                .iter()
                .any(|section| section.entries.iter().any(TranslationEntry::is_dirty))
    }

    pub fn mark_clean(&mut self) {
        self.structure_changed = false;
        for section in &mut self.sections {
            for entry in &mut section.entries {
                entry.mark_clean();
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&ViewSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut ViewSection> {
        self.sections.iter_mut().find(|section| section.name == name)
    }

    /// Add an empty section. Returns false when it already exists.
    pub fn add_section(&mut self, name: &str) -> bool {
        if self.section(name).is_some() {
            return false;
        }
        self.sections.push(ViewSection::new(name));
        self.structure_changed = true;
        true
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|section| section.name != name);
        let removed = self.sections.len() != before;
        self.structure_changed |= removed;
        removed
    }

    /// Add an empty key to an existing section.
    pub fn add_key(&mut self, section: &str, key: &str) -> bool {
        let Some(section) = self.section_mut(section) else {
            return false;
        };
        if section.entry(key).is_some() {
            return false;
        }
        section.entries.push(TranslationEntry::new(key, key));
        self.structure_changed = true;
        true
    }

    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(section) = self.section_mut(section) else {
            return false;
        };
        let before = section.entries.len();
        section.entries.retain(|entry| entry.key != key);
        let removed = section.entries.len() != before;
        self.structure_changed |= removed;
        removed
    }
}

pub struct ViewService {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
    pattern: String,
}

impl ViewService {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>, pattern: impl Into<String>) -> Self {
        Self {
            store,
            registry,
            pattern: pattern.into(),
        }
    }

    /// View files in the translation folder, ordered by file name.
    pub fn list_view_files(&self) -> Result<Vec<ViewFile>> {
        let folder = glob::Pattern::escape(&self.store.folder().to_string_lossy());
        let full_pattern = format!("{}/{}", folder, self.pattern);

        let paths = glob::glob(&full_pattern).map_err(|e| {
            LocalizationError::InvalidArgument(format!("invalid view file pattern '{}': {}", self.pattern, e))
        })?;

        let mut files = Vec::new();
        for path in paths {
            let path = path.map_err(|e| LocalizationError::io(e.path().to_path_buf(), e.into_error()))?;
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(ViewFile {
                    display_name: self.display_name(file_name),
                    file_name: file_name.to_string(),
                });
            }
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// `views_contact.xml` → `Contact`: the text before `*` in the pattern
    /// and the `.xml` suffix are stripped (case-insensitively).
    pub fn display_name(&self, file_name: &str) -> String {
        let prefix = self.pattern.split('*').next().filter(|_| self.pattern.contains('*')).unwrap_or("");

        let mut name = file_name;
        if name.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix)) {
            name = &name[prefix.len()..];
        }
        if let Some(stem_len) = name.len().checked_sub(4) {
            if name.get(stem_len..).is_some_and(|ext| ext.eq_ignore_ascii_case(".xml")) {
                name = &name[..stem_len];
            }
        }
        capitalize(name)
    }

    /// `file_name` must be a plain file name inside the translation folder.
    fn file_path(&self, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.contains("..") {
            return Err(LocalizationError::InvalidArgument(format!(
                "view file name '{}' must not contain path separators",
                file_name
            )));
        }
        Ok(self.store.folder().join(file_name))
    }

    /// Load a view file. A missing file yields an empty translation.
    pub fn get_translations(&self, file_name: &str) -> Result<ViewTranslation> {
        let mut translation = ViewTranslation {
            file_name: file_name.to_string(),
            display_name: self.display_name(file_name),
            ..ViewTranslation::default()
        };

        let Some(document) = self.store.load_file(&self.file_path(file_name)?)? else {
            return Ok(translation);
        };

        let docs: Vec<LanguageDocument> = self
            .registry
            .languages()
            .iter()
            .map(|language| LanguageDocument {
                language: language.clone(),
                document: document
                    .language_section(&language.id)
                    .map(|section| TreeDocument::new(section.clone())),
            })
            .collect();

        let section_names = discover_keys(&docs, |root| root.children.iter().map(|c| c.name.clone()).collect());
        for name in section_names {
            let keys = discover_keys(&docs, |root| {
                root.child(&name)
                    .map(|section| section.children.iter().map(|c| c.name.clone()).collect())
                    .unwrap_or_default()
            });

            let mut section = ViewSection::new(name.as_str());
            for key in keys {
                let mut entry = TranslationEntry::new(key.as_str(), key.as_str());
                for doc in &docs {
                    let value = doc
                        .root()
                        .and_then(|root| root.descend(&[name.as_str(), key.as_str()]))
                        .map(Element::value)
                        .unwrap_or_default();
                    entry.set(doc.language.id.as_str(), value);
                }
                section.entries.push(entry);
            }
            translation.sections.push(section);
        }

        translation.mark_clean();
        Ok(translation)
    }

    /// Write the aggregate back into its file.
    ///
    /// A missing file starts as an empty `<languages>` document. A language
    /// sub-root is only added when that language has content. Sections and
    /// keys absent from the aggregate are removed from every language present
    /// in the file.
    pub fn save_translations(&self, translation: &mut ViewTranslation) -> Result<()> {
        let path = self.file_path(&translation.file_name)?;
        let mut document = self
            .store
            .load_file(&path)?
            .unwrap_or_else(TreeDocument::multi_language);

        for lang in self.registry.languages() {
            let has_content = translation
                .sections
                .iter()
                .flat_map(|section| &section.entries)
                .any(|entry| entry.has_value(&lang.id));

            if document.language_section(&lang.id).is_none() {
                if !has_content {
                    debug!("Skipping view language '{}' in {}: no content", lang.id, translation.file_name);
                    continue;
                }
                document.root.push(
                    Element::new(LANGUAGE_ELEMENT)
                        .with_attribute("name", lang.name.as_str())
                        .with_attribute("id", lang.id.as_str()),
                );
            }

            let Some(language_root) = document.language_section_mut(&lang.id) else {
                continue;
            };
            apply_view(language_root, translation, &lang.id);
        }

        self.store.save_document(&document, &path)?;
        translation.mark_clean();
        info!("Saved view translations for {}", translation.file_name);
        Ok(())
    }
}

fn apply_view(language_root: &mut Element, translation: &ViewTranslation, lang: &str) {
    for section in &translation.sections {
        let section_node = language_root.get_or_create(&section.name);
        for entry in &section.entries {
            section_node.set_leaf(&entry.key, entry.get(lang));
        }
        section_node
            .children
            .retain(|child| section.entry(&child.name).is_some());
    }

    language_root
        .children
        .retain(|child| translation.section(&child.name).is_some());
}
