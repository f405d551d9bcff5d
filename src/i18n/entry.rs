//! Dirty-tracked translation values.

use std::collections::HashMap;

/// One localizable field: language id → current value, plus the values as
/// they were last loaded or persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationEntry {
    /// Element name of the field inside its tree node (e.g. "caption")
    pub key: String,

    /// Human readable label for editing surfaces
    pub display_name: String,

    values: HashMap<String, String>,
    original: HashMap<String, String>,
}

impl TranslationEntry {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Current value for a language, empty when unset.
    pub fn get(&self, language_id: &str) -> &str {
        self.values.get(language_id).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, language_id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(language_id.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Whether the value for a language is non-empty.
    pub fn has_value(&self, language_id: &str) -> bool {
        !self.get(language_id).is_empty()
    }

    /// Current mapping differs from the snapshot in any key or value.
    pub fn is_dirty(&self) -> bool {
        self.values != self.original
    }

    /// Replace the snapshot with the current mapping.
    pub fn mark_clean(&mut self) {
        self.original = self.values.clone();
    }
}
