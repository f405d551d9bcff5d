//! Translation completeness.
//!
//! - `evaluator`: per content type / tab / property scoring with threshold
//!   levels
//! - `summary`: per-language totals over the whole schema

mod evaluator;
mod summary;

pub use evaluator::{
    is_translated_description, is_translated_name, property_status, ContentTypeStatus, DefaultStatusEvaluator,
    StatusLevel, StatusThresholds, TabStatus, TranslationStatusEvaluator,
};
pub use summary::{LanguageStatusSummary, StatusSummaryService};
