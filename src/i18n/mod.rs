//! Core localization vocabulary.
//!
//! # Architecture
//!
//! - `key`: Translation key normalization and shared-fallback derivation
//! - `language`: Enabled languages and requested cultures
//! - `registry`: The injected list of enabled languages with a default
//! - `entry`: Dirty-tracked per-language values owned by translation aggregates
//! - `metrics`: Hit/miss/reload counters for the override cache
//!
//! # Example
//!
//! ```rust,ignore
//! use resource_editor::i18n::{Culture, LanguageRegistry, TranslationKey};
//!
//! let registry = LanguageRegistry::parse("en:English,sv:Svenska")?;
//! let key = TranslationKey::new("/ContentTypes/StandardPage/Properties/MainBody/Caption");
//! let fallback = key.shared_fallback();
//! let culture = Culture::parse("en-US")?;
//! ```

mod entry;
pub mod key;
mod language;
mod metrics;
mod registry;

pub use entry::TranslationEntry;
pub use key::{TranslationKey, SHARED_OWNER};
pub use language::{Culture, LanguageInfo};
pub use metrics::{CacheMetrics, CacheReport};
pub use registry::LanguageRegistry;
