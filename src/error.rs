//! Error taxonomy for the localization layer.
//!
//! Absence of a key, language or file is never an error here: lookups return
//! `Option` and callers fall through. Everything below aborts the operation
//! it was raised from.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalizationError {
    /// An argument was rejected before any write happened.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A language id that is not among the enabled languages.
    #[error("Language '{0}' not found")]
    UnknownLanguage(String),

    /// Tree files are read-only in this environment.
    #[error("saving translation files is disabled")]
    FileSavingDisabled,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LocalizationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocalizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_message() {
        let err = LocalizationError::UnknownLanguage("xx".to_string());
        assert_eq!(err.to_string(), "Language 'xx' not found");
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = LocalizationError::io(
            "/tmp/ReGroupNames_en.xml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("ReGroupNames_en.xml"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_xml_error_mentions_path() {
        let err = LocalizationError::xml("Display.xml", "unexpected end");
        assert!(err.to_string().contains("Display.xml"));
        assert!(err.to_string().contains("unexpected end"));
    }
}
