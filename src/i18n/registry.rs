//! Language registry: the enabled languages of the host.
//!
//! The registry is an injected, read-only view of the host's language
//! branches. One language is designated the default: `en` when it is enabled,
//! otherwise the first configured language.

use crate::error::{LocalizationError, Result};
use crate::i18n::LanguageInfo;

/// Fallback default language id.
const PREFERRED_DEFAULT: &str = "en";

/// Enabled languages with a designated default.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageInfo>,
}

impl LanguageRegistry {
    /// Build a registry from `(id, name)` pairs.
    ///
    /// # Arguments
    /// * `entries` - Enabled languages in configuration order
    ///
    /// # Returns
    /// * `Ok(LanguageRegistry)` ordered default first, then by name
    /// * `Err(InvalidArgument)` if `entries` is empty or an id is blank
    pub fn new<I, S, N>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<String>,
    {
        let mut languages: Vec<LanguageInfo> = Vec::new();
        for (id, name) in entries {
            let id: String = id.into();
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(LocalizationError::InvalidArgument(
                    "language id must not be empty".to_string(),
                ));
            }
            if languages.iter().any(|lang| lang.matches(&id)) {
                continue;
            }
            languages.push(LanguageInfo::new(id, name, false));
        }

        if languages.is_empty() {
            return Err(LocalizationError::InvalidArgument(
                "at least one language must be enabled".to_string(),
            ));
        }

        let default_index = languages
            .iter()
            .position(|lang| lang.matches(PREFERRED_DEFAULT))
            .unwrap_or(0);
        languages[default_index].is_default = true;

        languages.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.name.cmp(&b.name)));

        Ok(Self { languages })
    }

    /// Parse a `LANGUAGES` style list: `en:English,sv:Svenska`.
    ///
    /// A missing name falls back to the id.
    pub fn parse(spec: &str) -> Result<Self> {
        let entries = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((id, name)) => (id.trim().to_string(), name.trim().to_string()),
                None => (entry.to_string(), entry.to_string()),
            })
            .collect::<Vec<_>>();
        Self::new(entries)
    }

    /// All enabled languages, default first.
    pub fn languages(&self) -> &[LanguageInfo] {
        &self.languages
    }

    /// The default language.
    pub fn default_language(&self) -> &LanguageInfo {
        // The constructor guarantees exactly one default.
        self.languages
            .iter()
            .find(|lang| lang.is_default)
            .unwrap_or(&self.languages[0])
    }

    /// Find a language by id (case-insensitive).
    pub fn find(&self, id: &str) -> Option<&LanguageInfo> {
        self.languages.iter().find(|lang| lang.matches(id))
    }

    /// Find a language by id, failing with `UnknownLanguage`.
    pub fn require(&self, id: &str) -> Result<&LanguageInfo> {
        self.find(id)
            .ok_or_else(|| LocalizationError::UnknownLanguage(id.to_string()))
    }

    /// Whether `code` names an enabled language, either exactly or through its
    /// two-letter part (`en-us` is accepted when `en` is enabled).
    pub fn accepts(&self, code: &str) -> bool {
        let code = code.trim();
        if self.find(code).is_some() {
            return true;
        }
        code.split(['-', '_'])
            .next()
            .map(|two_letter| self.find(two_letter).is_some())
            .unwrap_or(false)
    }
}
