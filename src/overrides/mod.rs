//! Override store.
//!
//! Overrides are flat `(key, language) -> value` records kept in the database.
//! They take precedence over anything in the translation files. Reads go
//! through a process-wide snapshot cache; every write invalidates it after the
//! write has committed.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = OverrideService::new(db, registry, DEFAULT_TTL);
//! service.save("/contenttypes/icontentdata/properties/mainbody/caption", "en", "Body", None).await?;
//! assert_eq!(
//!     service.get("/ContentTypes/IContentData/Properties/MainBody/Caption", "EN").await?,
//!     Some("Body".to_string())
//! );
//! ```

pub mod cache;
pub mod csv;

pub use cache::{cache_key, OverrideCache, OverrideMap, DEFAULT_TTL};
pub use csv::{parse_csv, to_csv, OverrideRow, CSV_HEADER};

use crate::db::{Database, OverrideRecord};
use crate::domains::ContentTypeService;
use crate::error::{LocalizationError, Result};
use crate::i18n::key::{normalize, shared_property_key};
use crate::i18n::{CacheReport, LanguageRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// `modified_by` of overrides saved without an explicit editor.
pub const DEFAULT_MODIFIED_BY: &str = "System";

pub const CAPTION_TYPE: &str = "Caption";
pub const HELP_TEXT_TYPE: &str = "HelpText";
pub const UNKNOWN_TYPE: &str = "Unknown";

pub struct OverrideService {
    db: Database,
    registry: Arc<LanguageRegistry>,
    cache: OverrideCache,
}

impl OverrideService {
    pub fn new(db: Database, registry: Arc<LanguageRegistry>, cache_ttl: Duration) -> Self {
        Self {
            db,
            registry,
            cache: OverrideCache::new(cache_ttl),
        }
    }

    /// Cached lookup of one override value.
    pub async fn get(&self, key: &str, language: &str) -> Result<Option<String>> {
        let lookup = cache_key(&normalize(key), &normalize_language(language));
        let values = self.cache.get_or_load(|| self.load_all_values()).await?;
        Ok(values.get(&lookup).cloned())
    }

    async fn load_all_values(&self) -> Result<OverrideMap> {
        let rows = self.db.load_override_values().await?;
        info!("Reloaded override cache with {} records", rows.len());
        Ok(rows
            .into_iter()
            .map(|(key, language, value)| (cache_key(&key, &language), value))
            .collect())
    }

    /// Every override, straight from the database.
    pub async fn get_all(&self) -> Result<Vec<OverrideRecord>> {
        self.db.get_all_overrides().await
    }

    pub async fn get_by_language(&self, language: &str) -> Result<Vec<OverrideRecord>> {
        self.db
            .get_overrides_by_language(&normalize_language(language))
            .await
    }

    /// Upsert an override as [`DEFAULT_MODIFIED_BY`].
    pub async fn save(&self, key: &str, language: &str, value: &str, content_type: Option<&str>) -> Result<()> {
        self.save_as(key, language, value, content_type, DEFAULT_MODIFIED_BY)
            .await
    }

    /// Upsert an override by `(normalized key, normalized language)`.
    ///
    /// # Errors
    /// * `InvalidArgument` for an empty key or language
    /// * `UnknownLanguage` when the language (or its two-letter part) is not
    ///   enabled
    ///
    /// Both are raised before anything is written.
    pub async fn save_as(
        &self,
        key: &str,
        language: &str,
        value: &str,
        content_type: Option<&str>,
        modified_by: &str,
    ) -> Result<()> {
        let (key, language) = self.validate(key, language)?;
        let content_type = content_type.map(str::trim).filter(|ct| !ct.is_empty());

        self.db
            .upsert_override(&key, &language, value, content_type, modified_by)
            .await?;
        self.cache.invalidate();

        info!("Saved override {} [{}] by {}", key, language, modified_by);
        Ok(())
    }

    fn validate(&self, key: &str, language: &str) -> Result<(String, String)> {
        let key = normalize(key);
        if key == "/" {
            return Err(LocalizationError::InvalidArgument(
                "override key must not be empty".to_string(),
            ));
        }

        let language = normalize_language(language);
        if language.is_empty() {
            return Err(LocalizationError::InvalidArgument(
                "override language must not be empty".to_string(),
            ));
        }
        if !self.registry.accepts(&language) {
            return Err(LocalizationError::UnknownLanguage(language));
        }

        Ok((key, language))
    }

    pub async fn delete(&self, key: &str, language: &str) -> Result<bool> {
        let key = normalize(key);
        let language = normalize_language(language);

        let deleted = self.db.delete_override(&key, &language).await?;
        if deleted {
            self.cache.invalidate();
            info!("Deleted override {} [{}]", key, language);
        }
        Ok(deleted)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let deleted = self.db.delete_override_by_id(id).await?;
        if deleted {
            self.cache.invalidate();
            info!("Deleted override #{}", id);
        }
        Ok(deleted)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let count = self.db.delete_all_overrides().await?;
        if count > 0 {
            self.cache.invalidate();
        }
        info!("Deleted all overrides ({} records)", count);
        Ok(count)
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    pub fn cache_report(&self) -> CacheReport {
        self.cache.report()
    }

    /// Flatten every override into exchange rows.
    pub async fn export(&self) -> Result<Vec<OverrideRow>> {
        let records = self.db.get_all_overrides().await?;
        Ok(records.iter().map(export_row).collect())
    }

    /// Upsert every row as a shared property override.
    ///
    /// All rows are validated before the first write.
    ///
    /// # Returns
    /// The number of rows saved.
    pub async fn import(&self, rows: &[OverrideRow]) -> Result<usize> {
        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            if row.property.trim().is_empty() {
                return Err(LocalizationError::InvalidArgument(format!(
                    "row for '{}' [{}] has no property",
                    row.content_type, row.language
                )));
            }
            let key = import_key(&row.property, &row.override_type);
            let (key, language) = self.validate(key.as_str(), &row.language)?;
            pending.push((key, language, row));
        }

        for (key, language, row) in &pending {
            let content_type = Some(row.content_type.trim()).filter(|ct| !ct.is_empty());
            self.db
                .upsert_override(key, language, &row.value, content_type, DEFAULT_MODIFIED_BY)
                .await?;
        }
        if !pending.is_empty() {
            self.cache.invalidate();
        }

        info!("Imported {} overrides", pending.len());
        Ok(pending.len())
    }

    /// Move a property's shared caption and help overrides into the
    /// property translation file, then delete them.
    ///
    /// # Returns
    /// The number of overrides moved (0, 1 or 2).
    pub async fn promote_to_tree(&self, content_types: &ContentTypeService, property: &str, language: &str) -> Result<usize> {
        let language = normalize_language(language);
        let caption_key = shared_property_key(property, "caption");
        let help_key = shared_property_key(property, "help");

        let caption = self.db.get_override(caption_key.as_str(), &language).await?;
        let help = self.db.get_override(help_key.as_str(), &language).await?;
        if caption.is_none() && help.is_none() {
            debug!("No overrides to promote for {} [{}]", property, language);
            return Ok(0);
        }

        content_types.save_property(
            property,
            &language,
            caption.as_ref().map(|record| record.value.as_str()),
            help.as_ref().map(|record| record.value.as_str()),
        )?;

        let mut moved = 0;
        for record in caption.iter().chain(help.iter()) {
            if self.db.delete_override_by_id(record.id).await? {
                moved += 1;
            }
        }
        self.cache.invalidate();

        info!("Promoted {} overrides for {} [{}] to translation files", moved, property, language);
        Ok(moved)
    }
}

/// Lowercased, trimmed language or culture code with `_` read as `-`.
pub fn normalize_language(language: &str) -> String {
    language.trim().replace('_', "-").to_lowercase()
}

/// `Caption` for `.../caption`, `HelpText` for `.../help`, otherwise `Unknown`.
pub fn override_type(key: &str) -> &'static str {
    match key.rsplit('/').next() {
        Some("caption") => CAPTION_TYPE,
        Some("help") => HELP_TEXT_TYPE,
        _ => UNKNOWN_TYPE,
    }
}

/// Second-to-last segment of a `.../<property>/caption|help` key with at
/// least five `/`-separated parts, otherwise the raw key.
pub fn property_name(key: &str) -> String {
    let parts: Vec<&str> = key.split('/').collect();
    match parts.as_slice() {
        [.., property, "caption" | "help"] if parts.len() >= 5 => property.to_string(),
        _ => key.to_string(),
    }
}

fn export_row(record: &OverrideRecord) -> OverrideRow {
    OverrideRow {
        content_type: record.content_type_name.clone().unwrap_or_default(),
        property: property_name(&record.key),
        override_type: override_type(&record.key).to_string(),
        language: record.language.clone(),
        value: record.value.clone(),
    }
}

fn import_key(property: &str, override_type: &str) -> String {
    let field = if override_type.trim().eq_ignore_ascii_case(CAPTION_TYPE) {
        "caption"
    } else {
        "help"
    };
    shared_property_key(property.trim(), field).as_str().to_string()
}
