//! Read-only schema collaborators.
//!
//! The host enumerates content types (with their property names) and tabs.
//! This crate only consumes those lists; `StaticSchema` is a plain in-memory
//! implementation that can be loaded from JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentTypeCategory {
    Page,
    Block,
    Media,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub category: ContentTypeCategory,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl ContentTypeInfo {
    /// Localized display name, or the identifier when none is known.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl TabInfo {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Enumerates content types and their property names.
pub trait ContentTypeSchema: Send + Sync {
    fn content_types(&self) -> Vec<ContentTypeInfo>;

    /// Case-insensitive lookup by identifier.
    fn find_content_type(&self, name: &str) -> Option<ContentTypeInfo> {
        self.content_types()
            .into_iter()
            .find(|ct| ct.name.eq_ignore_ascii_case(name))
    }
}

/// Enumerates property group tabs.
pub trait TabSchema: Send + Sync {
    fn tabs(&self) -> Vec<TabInfo>;
}

/// In-memory schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSchema {
    #[serde(default)]
    pub content_types: Vec<ContentTypeInfo>,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
}

impl StaticSchema {
    /// Load a schema description from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse schema file {}", path.display()))
    }
}

impl ContentTypeSchema for StaticSchema {
    fn content_types(&self) -> Vec<ContentTypeInfo> {
        self.content_types.clone()
    }
}

impl TabSchema for StaticSchema {
    fn tabs(&self) -> Vec<TabInfo> {
        self.tabs.clone()
    }
}

type SharedProperties = BTreeMap<String, Vec<String>>;

/// Properties that appear on two or more content types.
///
/// Built from the schema on first use and kept until [`invalidate`] is called.
/// Property names are compared case-insensitively and stored lowercase;
/// content-type lists are sorted.
///
/// [`invalidate`]: SharedPropertyIndex::invalidate
pub struct SharedPropertyIndex {
    schema: Arc<dyn ContentTypeSchema>,
    cache: Mutex<Option<Arc<SharedProperties>>>,
}

impl SharedPropertyIndex {
    pub fn new(schema: Arc<dyn ContentTypeSchema>) -> Self {
        Self {
            schema,
            cache: Mutex::new(None),
        }
    }

    /// property name → content types defining it (2+ only).
    pub fn shared_properties(&self) -> Arc<SharedProperties> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = cache.as_ref() {
            return Arc::clone(index);
        }

        let index = Arc::new(build_index(&self.schema.content_types()));
        debug!("Built shared property index with {} entries", index.len());
        *cache = Some(Arc::clone(&index));
        index
    }

    pub fn is_shared(&self, property: &str) -> bool {
        self.shared_properties().contains_key(&property.to_lowercase())
    }

    /// Content types sharing `property`, empty when it is not shared.
    pub fn content_types_for_property(&self, property: &str) -> Vec<String> {
        self.shared_properties()
            .get(&property.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

fn build_index(content_types: &[ContentTypeInfo]) -> SharedProperties {
    let mut property_to_types: SharedProperties = BTreeMap::new();

    for content_type in content_types {
        for property in &content_type.properties {
            let types = property_to_types.entry(property.to_lowercase()).or_default();
            if !types.contains(&content_type.name) {
                types.push(content_type.name.clone());
            }
        }
    }

    property_to_types.retain(|_, types| types.len() > 1);
    for types in property_to_types.values_mut() {
        types.sort();
    }
    property_to_types
}
