//! Domain services over the per-language tree store.
//!
//! Each service reads one domain's files for every enabled language into an
//! aggregate of [`TranslationEntry`] values, and writes an edited aggregate
//! back with the shared save policy of [`TreeStore::save_per_language`].
//! Key sets are discovered across all languages first, then values are
//! filled per language with empty strings for missing entries.
//!
//! [`TranslationEntry`]: crate::i18n::TranslationEntry
//! [`TreeStore::save_per_language`]: crate::tree::TreeStore::save_per_language

pub mod content_types;
pub mod display;
pub mod editor_hints;
pub mod tabs;
pub mod views;

pub use content_types::{ContentTypeService, ContentTypeTranslation, PropertyTranslation};
pub use display::{DisplayService, DisplayTranslation};
pub use editor_hints::{EditorHintEntry, EditorHintSection, EditorHintService, EditorHintTranslation};
pub use tabs::{TabService, TabTranslation};
pub use views::{ViewFile, ViewSection, ViewService, ViewTranslation, DEFAULT_VIEW_FILE_PATTERN};

use crate::i18n::TranslationEntry;

/// Whether any entry has a non-empty value for the language.
pub(crate) fn any_value<'a, I>(entries: I, language_id: &str) -> bool
where
    I: IntoIterator<Item = &'a TranslationEntry>,
{
    entries.into_iter().any(|entry| entry.has_value(language_id))
}

/// Upper-case the first character.
pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
