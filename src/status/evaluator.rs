//! Completeness scoring of loaded translation aggregates. No I/O.

use crate::domains::{ContentTypeTranslation, PropertyTranslation, TabTranslation};
use serde::{Deserialize, Serialize};

/// Traffic-light status. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Complete,
    Partial,
    Incomplete,
}

impl StatusLevel {
    pub fn worse(self, other: StatusLevel) -> StatusLevel {
        self.max(other)
    }
}

/// Ratio cutoffs: `ratio >= green` is complete, `ratio >= yellow` partial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub green: f64,
    pub yellow: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self { green: 1.0, yellow: 0.5 }
    }
}

impl StatusThresholds {
    /// Level for `translated` out of `total` units. Zero units is complete.
    pub fn level(&self, total: usize, translated: usize) -> StatusLevel {
        if total == 0 {
            return StatusLevel::Complete;
        }

        let ratio = translated as f64 / total as f64;
        if ratio >= self.green {
            StatusLevel::Complete
        } else if ratio >= self.yellow {
            StatusLevel::Partial
        } else {
            StatusLevel::Incomplete
        }
    }
}

/// Scores of one content type in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentTypeStatus {
    /// Name and description
    pub content_type: StatusLevel,
    /// Label and help units over all properties
    pub property_units_total: usize,
    pub property_units_translated: usize,
    pub properties: StatusLevel,
    /// Worse of the two levels above
    pub overall: StatusLevel,
    /// Properties (items, not units)
    pub property_items_total: usize,
    /// Properties with both label and help translated
    pub property_items_complete: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabStatus {
    pub level: StatusLevel,
}

pub trait TranslationStatusEvaluator: Send + Sync {
    fn evaluate_content_type(&self, translation: &ContentTypeTranslation, language_id: &str) -> ContentTypeStatus;
    fn evaluate_tab(&self, translation: &TabTranslation, language_id: &str) -> TabStatus;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultStatusEvaluator {
    thresholds: StatusThresholds,
}

impl DefaultStatusEvaluator {
    pub fn new(thresholds: StatusThresholds) -> Self {
        Self { thresholds }
    }
}

impl TranslationStatusEvaluator for DefaultStatusEvaluator {
    fn evaluate_content_type(&self, translation: &ContentTypeTranslation, language_id: &str) -> ContentTypeStatus {
        let mut translated = 0;
        if is_translated_name(translation.name.get(language_id), &translation.content_type_name) {
            translated += 1;
        }
        if is_translated_description(translation.description.get(language_id)) {
            translated += 1;
        }
        let content_type = self.thresholds.level(2, translated);

        let mut units_translated = 0;
        let mut items_complete = 0;
        for property in &translation.properties {
            let (label_ok, help_ok) = property_units(property, language_id);
            units_translated += usize::from(label_ok) + usize::from(help_ok);
            if label_ok && help_ok {
                items_complete += 1;
            }
        }

        let units_total = translation.properties.len() * 2;
        let properties = self.thresholds.level(units_total, units_translated);

        ContentTypeStatus {
            content_type,
            property_units_total: units_total,
            property_units_translated: units_translated,
            properties,
            overall: content_type.worse(properties),
            property_items_total: translation.properties.len(),
            property_items_complete: items_complete,
        }
    }

    fn evaluate_tab(&self, translation: &TabTranslation, language_id: &str) -> TabStatus {
        let translated = is_translated_name(translation.display_name.get(language_id), &translation.tab_name);
        TabStatus {
            level: if translated {
                StatusLevel::Complete
            } else {
                StatusLevel::Incomplete
            },
        }
    }
}

/// Status of one property over several languages, two units per language,
/// with fixed 1.0 / 0.5 cutoffs.
pub fn property_status(property: &PropertyTranslation, language_ids: &[&str]) -> StatusLevel {
    let translated: usize = language_ids
        .iter()
        .map(|lang| {
            let (label_ok, help_ok) = property_units(property, lang);
            usize::from(label_ok) + usize::from(help_ok)
        })
        .sum();
    StatusThresholds::default().level(language_ids.len() * 2, translated)
}

fn property_units(property: &PropertyTranslation, language_id: &str) -> (bool, bool) {
    (
        is_translated_name(property.label.get(language_id), &property.property_name),
        is_translated_description(property.description.get(language_id)),
    )
}

/// Non-blank and not the identifier itself (case-insensitive). A correct
/// translation that equals the identifier still counts as untranslated.
pub fn is_translated_name(value: &str, identifier: &str) -> bool {
    !value.trim().is_empty() && value.to_lowercase() != identifier.to_lowercase()
}

pub fn is_translated_description(value: &str) -> bool {
    !value.trim().is_empty()
}
