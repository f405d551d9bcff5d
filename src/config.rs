use crate::domains::DEFAULT_VIEW_FILE_PATTERN;
use crate::i18n::LanguageRegistry;
use crate::status::StatusThresholds;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Translation files
    pub translation_folder: PathBuf,
    pub view_file_pattern: String,
    pub enable_file_saving: bool,

    // Languages (`id:Name` comma list)
    pub languages: String,

    // Overrides
    pub database_url: String,
    pub enable_overrides: bool,
    pub override_cache_ttl_hours: u64,

    // Status
    pub status_green_threshold: f64,
    pub status_yellow_threshold: f64,

    // Schema
    pub schema_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            translation_folder: std::env::var("TRANSLATION_FOLDER")
                .unwrap_or_else(|_| "Resources/Translations".to_string())
                .into(),
            view_file_pattern: std::env::var("VIEW_FILE_PATTERN")
                .unwrap_or_else(|_| DEFAULT_VIEW_FILE_PATTERN.to_string()),
            enable_file_saving: parse_bool("ENABLE_FILE_SAVING", true)?,

            languages: std::env::var("LANGUAGES").unwrap_or_else(|_| "en:English".to_string()),

            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://resource_editor.db".to_string()),
            enable_overrides: parse_bool("ENABLE_OVERRIDES", true)?,
            override_cache_ttl_hours: std::env::var("OVERRIDE_CACHE_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),

            status_green_threshold: std::env::var("STATUS_GREEN_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            status_yellow_threshold: std::env::var("STATUS_YELLOW_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),

            schema_file: std::env::var("SCHEMA_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };

        if config.status_yellow_threshold > config.status_green_threshold {
            bail!(
                "STATUS_YELLOW_THRESHOLD ({}) must not exceed STATUS_GREEN_THRESHOLD ({})",
                config.status_yellow_threshold,
                config.status_green_threshold
            );
        }

        Ok(config)
    }

    pub fn language_registry(&self) -> Result<LanguageRegistry> {
        LanguageRegistry::parse(&self.languages)
            .with_context(|| format!("Invalid LANGUAGES value '{}'", self.languages))
    }

    pub fn override_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.override_cache_ttl_hours.saturating_mul(60 * 60))
    }

    pub fn status_thresholds(&self) -> StatusThresholds {
        StatusThresholds {
            green: self.status_green_threshold,
            yellow: self.status_yellow_threshold,
        }
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => bail!("{} must be true or false, got '{}'", name, other),
        },
        Err(_) => Ok(default),
    }
}
