//! Language and culture types.
//!
//! `LanguageInfo` describes one enabled language branch of the host. `Culture`
//! is the culture a caller asks a string for (e.g. `en-US`), which may be more
//! specific than any language id the translation files know about.

use crate::error::{LocalizationError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static CULTURE_REGEX: OnceLock<Regex> = OnceLock::new();

/// An enabled language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Language id as used in file names and override records (e.g. "en", "sv")
    pub id: String,

    /// Display name written into new tree documents (e.g. "English")
    pub name: String,

    /// Whether this is the default (master) language
    pub is_default: bool,
}

impl LanguageInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default,
        }
    }

    /// Case-insensitive id comparison.
    pub fn matches(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

/// A requested culture such as `en-US` or `sv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
}

impl Culture {
    /// Parse a culture name.
    ///
    /// Accepts a two or three letter language code optionally followed by
    /// `-`-separated subtags. Underscores are read as separators.
    ///
    /// # Returns
    /// * `Ok(Culture)` for a well-formed name
    /// * `Err(InvalidArgument)` otherwise
    pub fn parse(name: &str) -> Result<Self> {
        let regex = CULTURE_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").expect("culture pattern is valid")
        });

        let candidate = name.trim().replace('_', "-");
        if !regex.is_match(&candidate) {
            return Err(LocalizationError::InvalidArgument(format!(
                "'{}' is not a culture name",
                name
            )));
        }

        Ok(Self { name: candidate })
    }

    /// Full culture name as given (e.g. "en-US").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Two-letter language part (e.g. "en" for "en-US").
    pub fn two_letter_code(&self) -> &str {
        self.name.split('-').next().unwrap_or(&self.name)
    }

    /// Whether the name carries a region or other subtag.
    pub fn has_region(&self) -> bool {
        self.name.contains('-')
    }

    /// Language ids to try in order: the full name, then the two-letter code
    /// when the name has a region.
    pub fn lookup_candidates(&self) -> Vec<&str> {
        if self.has_region() {
            vec![self.name(), self.two_letter_code()]
        } else {
            vec![self.name()]
        }
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== LanguageInfo Tests ====================

    #[test]
    fn test_language_matches_case_insensitive() {
        let lang = LanguageInfo::new("sv", "Svenska", false);
        assert!(lang.matches("SV"));
        assert!(!lang.matches("en"));
    }

    // ==================== Culture Tests ====================

    #[test]
    fn test_parse_with_region() {
        let culture = Culture::parse("en-US").expect("Should parse");
        assert_eq!(culture.name(), "en-US");
        assert_eq!(culture.two_letter_code(), "en");
        assert!(culture.has_region());
    }

    #[test]
    fn test_parse_without_region() {
        let culture = Culture::parse("sv").expect("Should parse");
        assert_eq!(culture.two_letter_code(), "sv");
        assert!(!culture.has_region());
        assert_eq!(culture.lookup_candidates(), vec!["sv"]);
    }

    #[test]
    fn test_parse_underscore_separator() {
        let culture = Culture::parse("pt_BR").expect("Should parse");
        assert_eq!(culture.name(), "pt-BR");
    }

    #[test]
    fn test_lookup_candidates_with_region() {
        let culture = Culture::parse("nb-NO").unwrap();
        assert_eq!(culture.lookup_candidates(), vec!["nb-NO", "nb"]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Culture::parse("").is_err());
        assert!(Culture::parse("e").is_err());
        assert!(Culture::parse("en-").is_err());
        assert!(Culture::parse("../en").is_err());
    }

    #[test]
    fn test_culture_display() {
        let culture = Culture::parse("de-CH").unwrap();
        assert_eq!(culture.to_string(), "de-CH");
    }
}
