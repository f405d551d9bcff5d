//! Tab (property group) names, stored in `ReGroupNames_<lang>.xml`.

use crate::error::Result;
use crate::i18n::{LanguageRegistry, TranslationEntry};
use crate::schema::{TabInfo, TabSchema};
use crate::tree::{Element, TreeStore, GROUP_NAMES};
use std::sync::Arc;
use tracing::info;

const HEADINGS_SECTION: &str = "headings";
const HEADING_ELEMENT: &str = "heading";
const GROUP_SETTINGS_SECTION: &str = "propertygroupsettings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabTranslation {
    pub tab_id: i64,
    pub tab_name: String,
    pub display_name: TranslationEntry,
}

impl TabTranslation {
    pub fn new(tab_id: i64, tab_name: impl Into<String>) -> Self {
        Self {
            tab_id,
            tab_name: tab_name.into(),
            display_name: TranslationEntry::new("description", "Display name"),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.display_name.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.display_name.mark_clean();
    }
}

pub struct TabService {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
    schema: Arc<dyn TabSchema>,
}

impl TabService {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>, schema: Arc<dyn TabSchema>) -> Self {
        Self { store, registry, schema }
    }

    /// Tabs ordered by display name.
    pub fn list_tabs(&self) -> Vec<TabInfo> {
        let mut tabs = self.schema.tabs();
        tabs.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        tabs
    }

    pub fn get_translations(&self, tab_name: &str) -> Result<TabTranslation> {
        let tab_id = self
            .schema
            .tabs()
            .into_iter()
            .find(|tab| tab.name == tab_name)
            .map_or(0, |tab| tab.id);
        let mut translation = TabTranslation::new(tab_id, tab_name);

        for doc in self.store.load_languages(GROUP_NAMES.prefix, self.registry.languages())? {
            let value = doc.root().map(|root| tab_value(root, tab_name)).unwrap_or_default();
            translation.display_name.set(doc.language.id.as_str(), value);
        }

        translation.mark_clean();
        Ok(translation)
    }

    pub fn get_all_translations(&self) -> Result<Vec<TabTranslation>> {
        self.list_tabs()
            .iter()
            .map(|tab| self.get_translations(&tab.name))
            .collect()
    }

    /// Write `headings/heading[@name]/description` for every language with
    /// content or an existing file, then mark the aggregate clean.
    pub fn save_translations(&self, translation: &mut TabTranslation) -> Result<usize> {
        let tab_name = translation.tab_name.clone();
        let written = self.store.save_per_language(
            GROUP_NAMES.prefix,
            self.registry.languages(),
            |lang| translation.display_name.has_value(&lang.id),
            |root, lang| {
                let headings = root.get_or_create(HEADINGS_SECTION);
                let existing = headings.children.iter().position(|child| {
                    child.name == HEADING_ELEMENT
                        && child.attribute("name").is_some_and(|n| n.eq_ignore_ascii_case(&tab_name))
                });
                let index = match existing {
                    Some(index) => index,
                    None => {
                        headings.push(Element::new(HEADING_ELEMENT).with_attribute("name", tab_name.as_str()));
                        headings.children.len() - 1
                    }
                };
                headings.children[index].set_leaf("description", translation.display_name.get(&lang.id));
            },
        )?;

        translation.mark_clean();
        info!("Saved translations for tab '{}' ({} files)", translation.tab_name, written);
        Ok(written)
    }
}

/// `headings/heading[@name]` (its `description` child, else its own text),
/// falling back to `propertygroupsettings/<name without spaces>/caption`.
fn tab_value(root: &Element, tab_name: &str) -> String {
    let heading = root
        .child(HEADINGS_SECTION)
        .and_then(|headings| headings.find_child(HEADING_ELEMENT, "name", |n| n.eq_ignore_ascii_case(tab_name)));

    if let Some(heading) = heading {
        return heading
            .child_value("description")
            .unwrap_or_else(|| heading.value())
            .to_string();
    }

    let group_key = tab_name.to_lowercase().replace(' ', "");
    root.descend(&[GROUP_SETTINGS_SECTION, group_key.as_str(), "caption"])
        .map(|caption| caption.value().to_string())
        .unwrap_or_default()
}
