//! Display channel, display option and resolution names, stored in
//! `ReDisplayChannelNames_<lang>.xml`.

use super::any_value;
use crate::error::Result;
use crate::i18n::{LanguageRegistry, TranslationEntry};
use crate::tree::{discover_keys, Element, TreeStore, DISPLAY_NAMES};
use std::sync::Arc;
use tracing::info;

const CHANNELS_SECTION: &str = "displaychannels";
const CHANNEL_ELEMENT: &str = "displaychannel";
const OPTIONS_SECTION: &str = "displayoptions";
const RESOLUTIONS_SECTION: &str = "resolutions";

/// All display texts. Each entry's `key` is the channel name or the element
/// name of the option/resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayTranslation {
    pub channels: Vec<TranslationEntry>,
    pub options: Vec<TranslationEntry>,
    pub resolutions: Vec<TranslationEntry>,
}

impl DisplayTranslation {
    fn entries(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.channels.iter().chain(&self.options).chain(&self.resolutions)
    }

    pub fn has_changes(&self) -> bool {
        self.entries().any(TranslationEntry::is_dirty)
    }

    pub fn mark_clean(&mut self) {
        for entry in self
            .channels
            .iter_mut()
            .chain(&mut self.options)
            .chain(&mut self.resolutions)
        {
            entry.mark_clean();
        }
    }
}

pub struct DisplayService {
    store: TreeStore,
    registry: Arc<LanguageRegistry>,
}

impl DisplayService {
    pub fn new(store: TreeStore, registry: Arc<LanguageRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn get_translations(&self) -> Result<DisplayTranslation> {
        let docs = self.store.load_languages(DISPLAY_NAMES.prefix, self.registry.languages())?;

        let mut translation = DisplayTranslation {
            channels: sorted_entries(discover_keys(&docs, channel_names)),
            options: sorted_entries(discover_keys(&docs, |root| element_names(root, OPTIONS_SECTION))),
            resolutions: sorted_entries(discover_keys(&docs, |root| element_names(root, RESOLUTIONS_SECTION))),
        };

        for doc in &docs {
            let lang = doc.language.id.as_str();
            let root = doc.root();

            for channel in &mut translation.channels {
                let value = root
                    .and_then(|r| r.child(CHANNELS_SECTION))
                    .and_then(|section| section.find_child(CHANNEL_ELEMENT, "name", |n| n == channel.key))
                    .and_then(|el| el.child_value("name"))
                    .unwrap_or_default()
                    .to_string();
                channel.set(lang, value);
            }
            fill_section(&mut translation.options, root, OPTIONS_SECTION, lang);
            fill_section(&mut translation.resolutions, root, RESOLUTIONS_SECTION, lang);
        }

        translation.mark_clean();
        Ok(translation)
    }

    pub fn save_translations(&self, translation: &mut DisplayTranslation) -> Result<usize> {
        let written = self.store.save_per_language(
            DISPLAY_NAMES.prefix,
            self.registry.languages(),
            |lang| any_value(translation.entries(), &lang.id),
            |root, lang| {
                let channels = root.get_or_create(CHANNELS_SECTION);
                for channel in &translation.channels {
                    let existing = channels.children.iter().position(|el| {
                        el.name == CHANNEL_ELEMENT && el.attribute("name") == Some(channel.key.as_str())
                    });
                    let index = match existing {
                        Some(index) => index,
                        None => {
                            channels.push(Element::new(CHANNEL_ELEMENT).with_attribute("name", channel.key.as_str()));
                            channels.children.len() - 1
                        }
                    };
                    channels.children[index].set_leaf("name", channel.get(&lang.id));
                }

                let options = root.get_or_create(OPTIONS_SECTION);
                for option in &translation.options {
                    options.set_leaf(&option.key, option.get(&lang.id));
                }

                let resolutions = root.get_or_create(RESOLUTIONS_SECTION);
                for resolution in &translation.resolutions {
                    resolutions.set_leaf(&resolution.key, resolution.get(&lang.id));
                }
            },
        )?;

        translation.mark_clean();
        info!("Saved display translations ({} files)", written);
        Ok(written)
    }
}

fn channel_names(root: &Element) -> Vec<String> {
    root.child(CHANNELS_SECTION)
        .map(|section| {
            section
                .children_named(CHANNEL_ELEMENT)
                .filter_map(|el| el.attribute("name").map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn element_names(root: &Element, section: &str) -> Vec<String> {
    root.child(section)
        .map(|s| s.children.iter().map(|el| el.name.clone()).collect())
        .unwrap_or_default()
}

fn sorted_entries(mut keys: Vec<String>) -> Vec<TranslationEntry> {
    keys.sort();
    keys.into_iter()
        .map(|key| TranslationEntry::new(key.clone(), key))
        .collect()
}

fn fill_section(entries: &mut [TranslationEntry], root: Option<&Element>, section: &str, lang: &str) {
    let section = root.and_then(|r| r.child(section));
    for entry in entries {
        let value = section
            .and_then(|s| s.child_value(&entry.key))
            .unwrap_or_default()
            .to_string();
        entry.set(lang, value);
    }
}
