//! File access for tree documents.
//!
//! One file per (domain prefix, language) pair in a single translation folder.
//! Reading never creates files. Saving replaces the whole file through a
//! temporary sibling and a rename, so a reader sees either the old or the new
//! document.

use super::{file_name, Element, TreeDocument};
use crate::error::{LocalizationError, Result};
use crate::i18n::LanguageInfo;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A language together with its document for one domain, if the file exists.
#[derive(Debug, Clone)]
pub struct LanguageDocument {
    pub language: LanguageInfo,
    pub document: Option<TreeDocument>,
}

impl LanguageDocument {
    /// Root element of the document, if the file exists.
    pub fn root(&self) -> Option<&Element> {
        self.document.as_ref().map(|doc| &doc.root)
    }
}

/// Loads and saves tree documents inside one translation folder.
#[derive(Debug, Clone)]
pub struct TreeStore {
    folder: PathBuf,
    saving_enabled: bool,
}

impl TreeStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            saving_enabled: true,
        }
    }

    /// Enable or disable writes. A disabled store fails every save with
    /// `FileSavingDisabled`.
    pub fn with_saving(mut self, enabled: bool) -> Self {
        self.saving_enabled = enabled;
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn saving_enabled(&self) -> bool {
        self.saving_enabled
    }

    /// `<folder>/<prefix>_<language>.xml`
    pub fn file_path(&self, prefix: &str, language_id: &str) -> PathBuf {
        self.folder.join(file_name(prefix, language_id))
    }

    /// Load one domain file for a language. `None` when the file is absent.
    pub fn load_document(&self, prefix: &str, language_id: &str) -> Result<Option<TreeDocument>> {
        self.load_file(&self.file_path(prefix, language_id))
    }

    /// Load any tree file. `None` when the file is absent.
    pub fn load_file(&self, path: &Path) -> Result<Option<TreeDocument>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LocalizationError::io(path, err)),
        };
        TreeDocument::parse(&content)
            .map(Some)
            .map_err(|message| LocalizationError::xml(path, message))
    }

    /// Empty document for a language, used only right before writing.
    pub fn create_skeleton(language: &LanguageInfo) -> TreeDocument {
        TreeDocument::for_language(language)
    }

    /// Serialize `document` and replace the file at `path`.
    pub fn save_document(&self, document: &TreeDocument, path: &Path) -> Result<()> {
        if !self.saving_enabled {
            return Err(LocalizationError::FileSavingDisabled);
        }

        let xml = document
            .to_xml()
            .map_err(|message| LocalizationError::xml(path, message))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LocalizationError::io(parent, e))?;
        }

        let staging = staging_path(path);
        std::fs::write(&staging, xml).map_err(|e| LocalizationError::io(&staging, e))?;
        std::fs::rename(&staging, path).map_err(|e| LocalizationError::io(path, e))?;

        debug!("Saved translation file {}", path.display());
        Ok(())
    }

    /// Async variant of [`TreeStore::save_document`] for the migration task.
    pub async fn save_document_async(&self, document: &TreeDocument, path: &Path) -> Result<()> {
        if !self.saving_enabled {
            return Err(LocalizationError::FileSavingDisabled);
        }

        let xml = document
            .to_xml()
            .map_err(|message| LocalizationError::xml(path, message))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LocalizationError::io(parent, e))?;
        }

        let staging = staging_path(path);
        tokio::fs::write(&staging, xml)
            .await
            .map_err(|e| LocalizationError::io(&staging, e))?;
        tokio::fs::rename(&staging, path)
            .await
            .map_err(|e| LocalizationError::io(path, e))?;

        debug!("Saved translation file {}", path.display());
        Ok(())
    }

    /// Async load of any tree file. `None` when the file is absent.
    pub async fn load_file_async(&self, path: &Path) -> Result<Option<TreeDocument>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LocalizationError::io(path, err)),
        };
        TreeDocument::parse(&content)
            .map(Some)
            .map_err(|message| LocalizationError::xml(path, message))
    }

    /// Load one domain's file for every language (pass 1 input of discovery).
    pub fn load_languages(&self, prefix: &str, languages: &[LanguageInfo]) -> Result<Vec<LanguageDocument>> {
        languages
            .iter()
            .map(|language| {
                Ok(LanguageDocument {
                    language: language.clone(),
                    document: self.load_document(prefix, &language.id)?,
                })
            })
            .collect()
    }

    /// Save policy shared by every domain service.
    ///
    /// For each language: skip when no file exists and `has_content` is false
    /// for that language; otherwise load or create the document, let `apply`
    /// write the leaves into its root and persist it. Languages are written
    /// one after another; an error stops the loop and leaves earlier
    /// languages saved.
    ///
    /// # Returns
    /// The number of files written.
    pub fn save_per_language<H, F>(
        &self,
        prefix: &str,
        languages: &[LanguageInfo],
        has_content: H,
        mut apply: F,
    ) -> Result<usize>
    where
        H: Fn(&LanguageInfo) -> bool,
        F: FnMut(&mut Element, &LanguageInfo),
    {
        let mut written = 0;

        for language in languages {
            let existing = self.load_document(prefix, &language.id)?;
            if existing.is_none() && !has_content(language) {
                debug!(
                    "Skipping {} for '{}': no file and nothing to write",
                    prefix, language.id
                );
                continue;
            }

            let mut document = existing.unwrap_or_else(|| Self::create_skeleton(language));
            apply(&mut document.root, language);
            self.save_document(&document, &self.file_path(prefix, &language.id))?;
            written += 1;
        }

        Ok(written)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Union of the keys found in every language's document, in first-seen order.
///
/// `collect` lists the keys present in one root; a language without a file
/// contributes nothing. Values are filled in a second pass by the caller.
pub fn discover_keys<K, F>(documents: &[LanguageDocument], collect: F) -> Vec<K>
where
    K: PartialEq,
    F: Fn(&Element) -> Vec<K>,
{
    let mut keys: Vec<K> = Vec::new();
    for root in documents.iter().filter_map(LanguageDocument::root) {
        for key in collect(root) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}
