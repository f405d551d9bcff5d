//! Per-language tree documents.
//!
//! A translation file is a tree of named nodes. Leaves carry a string value,
//! containers carry children. Per-language files have a single
//! `<language name=".." id="..">` root whose children are domain sections;
//! legacy and view files have a `<languages>` root with one `<language id>`
//! sub-root per language.

mod store;
mod xml;

pub use store::{discover_keys, LanguageDocument, TreeStore};

use crate::i18n::LanguageInfo;

/// Element name of a language root or sub-root.
pub const LANGUAGE_ELEMENT: &str = "language";

/// Root element of multi-language files.
pub const LANGUAGES_ELEMENT: &str = "languages";

/// One translation domain: its file prefix and the sections it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub prefix: &'static str,
    pub sections: &'static [&'static str],
}

pub const CONTENT_TYPE_NAMES: Domain = Domain {
    prefix: "ReContentTypeNames",
    sections: &["contenttypes"],
};

pub const PROPERTY_NAMES: Domain = Domain {
    prefix: "RePropertyNames",
    sections: &["contenttypes"],
};

pub const GROUP_NAMES: Domain = Domain {
    prefix: "ReGroupNames",
    sections: &["headings", "propertygroupsettings"],
};

pub const DISPLAY_NAMES: Domain = Domain {
    prefix: "ReDisplayChannelNames",
    sections: &["displaychannels", "displayoptions", "resolutions"],
};

pub const EDITOR_HINT_NAMES: Domain = Domain {
    prefix: "ReEditorHintNames",
    sections: &["blocks", "preview", "renderingerror"],
};

/// Every per-language domain, in migration order.
pub const ALL_DOMAINS: [Domain; 5] = [
    CONTENT_TYPE_NAMES,
    PROPERTY_NAMES,
    GROUP_NAMES,
    DISPLAY_NAMES,
    EDITOR_HINT_NAMES,
];

/// File name for a domain and language: `<prefix>_<language>.xml`.
pub fn file_name(prefix: &str, language_id: &str) -> String {
    format!("{}_{}.xml", prefix, language_id)
}

/// A node of a tree document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Leaf value. Ignored when the element has children.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: value.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Text of a leaf; empty for containers.
    pub fn value(&self) -> &str {
        if self.has_children() {
            ""
        } else {
            &self.text
        }
    }

    /// Replace the node's content with a text value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.children.clear();
        self.text = value.into();
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Value of a direct child leaf.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::value)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First child called `name` whose `attribute` satisfies `matches`.
    pub fn find_child<F>(&self, name: &str, attribute: &str, matches: F) -> Option<&Element>
    where
        F: Fn(&str) -> bool,
    {
        self.children
            .iter()
            .find(|child| child.name == name && child.attribute(attribute).is_some_and(&matches))
    }

    pub fn find_child_mut<F>(&mut self, name: &str, attribute: &str, matches: F) -> Option<&mut Element>
    where
        F: Fn(&str) -> bool,
    {
        self.children
            .iter_mut()
            .find(|child| child.name == name && child.attribute(attribute).is_some_and(&matches))
    }

    /// Descend through direct children by name.
    pub fn descend(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Existing child called `name`, or a new empty container appended to
    /// this node.
    pub fn get_or_create(&mut self, name: &str) -> &mut Element {
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Upsert a leaf child's text.
    pub fn set_leaf(&mut self, name: &str, value: impl Into<String>) {
        match self.child_mut(name) {
            Some(child) => child.set_value(value),
            None => self.push(Element::leaf(name, value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.text.clear();
        self.children.push(child);
    }
}

/// A parsed translation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDocument {
    pub root: Element,
}

impl TreeDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Empty per-language document tagged with the language's name and id.
    pub fn for_language(language: &LanguageInfo) -> Self {
        Self::new(
            Element::new(LANGUAGE_ELEMENT)
                .with_attribute("name", language.name.as_str())
                .with_attribute("id", language.id.as_str()),
        )
    }

    /// Empty multi-language document (`<languages/>`).
    pub fn multi_language() -> Self {
        Self::new(Element::new(LANGUAGES_ELEMENT))
    }

    pub fn parse(xml: &str) -> Result<Self, String> {
        xml::parse(xml).map(Self::new)
    }

    pub fn to_xml(&self) -> Result<String, String> {
        xml::write(&self.root)
    }

    /// The `id` attribute of a per-language root.
    pub fn language_id(&self) -> Option<&str> {
        self.root.attribute("id")
    }

    /// The `<language id>` sub-root of a multi-language document
    /// (case-insensitive id match).
    pub fn language_section(&self, language_id: &str) -> Option<&Element> {
        self.root
            .find_child(LANGUAGE_ELEMENT, "id", |id| id.eq_ignore_ascii_case(language_id))
    }

    pub fn language_section_mut(&mut self, language_id: &str) -> Option<&mut Element> {
        self.root
            .find_child_mut(LANGUAGE_ELEMENT, "id", |id| id.eq_ignore_ascii_case(language_id))
    }
}
