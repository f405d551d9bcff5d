//! Localization resolution and persistence for content-type metadata,
//! tabs, display settings, editor hints and view text.
//!
//! - `tree`: per-language translation files
//! - `domains`: the five domain services built on the tree store
//! - `overrides`: database overrides with a read-through cache and CSV exchange
//! - `resolution`: the provider chain that puts overrides in front of files
//! - `migration`: one-time split of the legacy multi-language files
//! - `status`: translation completeness per language

pub mod config;
pub mod db;
pub mod domains;
pub mod error;
pub mod i18n;
pub mod migration;
pub mod overrides;
pub mod resolution;
pub mod schema;
pub mod status;
pub mod tree;

pub use error::{LocalizationError, Result};
