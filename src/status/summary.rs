//! Per-language translation coverage, cached until invalidated.

use super::evaluator::{StatusLevel, TranslationStatusEvaluator};
use crate::domains::{ContentTypeService, ContentTypeTranslation, TabService, TabTranslation};
use crate::error::Result;
use crate::i18n::{LanguageInfo, LanguageRegistry};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Coverage of one language over the whole schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageStatusSummary {
    pub language_id: String,
    pub language_name: String,
    pub is_default: bool,
    pub content_types_total: usize,
    pub content_types_complete: usize,
    pub properties_total: usize,
    pub properties_complete: usize,
    pub tabs_total: usize,
    pub tabs_complete: usize,
}

/// Per-language summaries, computed once and kept until [`invalidate`].
///
/// [`invalidate`]: StatusSummaryService::invalidate
pub struct StatusSummaryService {
    registry: Arc<LanguageRegistry>,
    content_types: Arc<ContentTypeService>,
    tabs: Arc<TabService>,
    evaluator: Arc<dyn TranslationStatusEvaluator>,
    cache: Mutex<Option<Arc<Vec<LanguageStatusSummary>>>>,
}

impl StatusSummaryService {
    pub fn new(
        registry: Arc<LanguageRegistry>,
        content_types: Arc<ContentTypeService>,
        tabs: Arc<TabService>,
        evaluator: Arc<dyn TranslationStatusEvaluator>,
    ) -> Self {
        Self {
            registry,
            content_types,
            tabs,
            evaluator,
            cache: Mutex::new(None),
        }
    }

    pub fn language_summaries(&self) -> Result<Arc<Vec<LanguageStatusSummary>>> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(summaries) = cache.as_ref() {
            return Ok(Arc::clone(summaries));
        }

        let summaries = Arc::new(self.compute()?);
        *cache = Some(Arc::clone(&summaries));
        Ok(summaries)
    }

    /// Drop the cached summaries, e.g. after a save.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn compute(&self) -> Result<Vec<LanguageStatusSummary>> {
        let content_types = self.content_types.get_all_translations()?;
        let tabs = self.tabs.get_all_translations()?;
        debug!(
            "Computing status for {} content types and {} tabs",
            content_types.len(),
            tabs.len()
        );

        Ok(self
            .registry
            .languages()
            .iter()
            .map(|language| self.summarize(language, &content_types, &tabs))
            .collect())
    }

    fn summarize(
        &self,
        language: &LanguageInfo,
        content_types: &[ContentTypeTranslation],
        tabs: &[TabTranslation],
    ) -> LanguageStatusSummary {
        let mut summary = LanguageStatusSummary {
            language_id: language.id.clone(),
            language_name: language.name.clone(),
            is_default: language.is_default,
            content_types_total: content_types.len(),
            content_types_complete: 0,
            properties_total: 0,
            properties_complete: 0,
            tabs_total: tabs.len(),
            tabs_complete: 0,
        };

        for translation in content_types {
            let status = self.evaluator.evaluate_content_type(translation, &language.id);
            // Name and description only; properties are counted separately.
            if status.content_type == StatusLevel::Complete {
                summary.content_types_complete += 1;
            }
            summary.properties_total += status.property_items_total;
            summary.properties_complete += status.property_items_complete;
        }

        summary.tabs_complete = tabs
            .iter()
            .filter(|tab| self.evaluator.evaluate_tab(tab, &language.id).level == StatusLevel::Complete)
            .count();

        summary
    }
}
