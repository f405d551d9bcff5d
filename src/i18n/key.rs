//! Translation keys: slash-delimited paths such as
//! `/contenttypes/standardpage/properties/mainbody/caption`.
//!
//! A normalized key is lowercase, starts with exactly one `/` and has no
//! trailing `/`. Property keys can be rewritten to their shared-fallback form,
//! where the content-type segment is replaced by `icontentdata` so that one
//! property translation applies to every content type.

use std::fmt;

/// Owner segment used for property translations shared by all content types.
pub const SHARED_OWNER: &str = "icontentdata";

/// Segment that marks a property key.
const PROPERTIES_SEGMENT: &str = "properties";

/// A normalized translation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranslationKey {
    normalized: String,
}

impl TranslationKey {
    /// Parse and normalize a raw key.
    pub fn new(raw: &str) -> Self {
        Self {
            normalized: normalize(raw),
        }
    }

    /// Build a key from already split segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(&joined)
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Path segments without the leading empty segment.
    pub fn segments(&self) -> Vec<&str> {
        self.normalized
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    pub fn is_property_key(&self) -> bool {
        is_property_key(&self.segments())
    }

    /// The shared-fallback key, or `None` when this is not a property key.
    pub fn shared_fallback(&self) -> Option<TranslationKey> {
        let segments = self.segments();
        if !is_property_key(&segments) {
            return None;
        }
        Some(Self::from_segments(&derive_shared_fallback_key(&segments)))
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl From<&str> for TranslationKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Lowercase, single leading slash, no trailing slash.
///
/// Idempotent: `normalize(&normalize(k)) == normalize(k)`.
pub fn normalize(key: &str) -> String {
    let trimmed = key.trim_matches(|c: char| c == '/' || c.is_whitespace());
    format!("/{}", trimmed.to_lowercase())
}

/// True for keys with at least five segments whose third segment is
/// `properties`, e.g. `contenttypes/{type}/properties/{name}/caption`.
pub fn is_property_key<S: AsRef<str>>(segments: &[S]) -> bool {
    segments.len() >= 5 && segments[2].as_ref().eq_ignore_ascii_case(PROPERTIES_SEGMENT)
}

/// Copy of `segments` with the content-type segment replaced by
/// [`SHARED_OWNER`].
///
/// Callers must check [`is_property_key`] first; for anything shorter than
/// two segments the input is returned unchanged.
pub fn derive_shared_fallback_key<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    let mut derived: Vec<String> = segments.iter().map(|s| s.as_ref().to_string()).collect();
    if derived.len() > 1 {
        derived[1] = SHARED_OWNER.to_string();
    }
    derived
}

/// Key of a shared property field (`caption` or `help`).
pub fn shared_property_key(property: &str, field: &str) -> TranslationKey {
    TranslationKey::new(&format!(
        "/contenttypes/{}/properties/{}/{}",
        SHARED_OWNER,
        property.to_lowercase(),
        field
    ))
}
