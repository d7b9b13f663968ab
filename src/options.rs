//! Loader configuration.
//!
//! Everything here deserializes from the JSON options object a host passes in,
//! using the same camelCase keys a bundler config would use.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::matcher::{Category, PatternRule, LIBRARY_COMPONENTS, LIBRARY_DIRECTIVES};

pub const DEFAULT_SENTINEL: &str = "/* hot reload */";
pub const DEFAULT_MARKER: &str = "/* vuetify-loader */";

/// A single value or a list of values. A scalar is treated as a one-element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(vs) => vs,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(vs) => vs,
        }
    }
}

/// Settings of the built-in matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    pub tag_prefix: String,
    pub components_module: String,
    pub directives_module: String,
    pub icon_prefix: String,
    pub icons_module: String,
    /// Only prefixed tags naming a known component match. When false, any
    /// prefixed tag matches.
    pub check_components: bool,
    /// Component catalog; the stock catalog when unset.
    pub components: Option<Vec<String>>,
    /// Directive catalog; the stock catalog when unset.
    pub directives: Option<Vec<String>>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            tag_prefix: "v-".to_string(),
            components_module: "vuetify/lib".to_string(),
            directives_module: "vuetify/lib/directives".to_string(),
            icon_prefix: "mdi-".to_string(),
            icons_module: "@mdi/js".to_string(),
            check_components: true,
            components: None,
            directives: None,
        }
    }
}

impl LibraryConfig {
    pub fn known_components(&self) -> Option<HashSet<String>> {
        if !self.check_components {
            return None;
        }
        Some(match &self.components {
            Some(list) => list.iter().cloned().collect(),
            None => LIBRARY_COMPONENTS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn known_directives(&self) -> HashSet<String> {
        match &self.directives {
            Some(list) => list.iter().cloned().collect(),
            None => LIBRARY_DIRECTIVES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Import paths of the runtime merge helpers, one per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimePaths {
    pub install_components: String,
    pub install_directives: String,
    pub install_icons: String,
}

impl Default for RuntimePaths {
    fn default() -> Self {
        RuntimePaths {
            install_components: "vuetify-loader/lib/runtime/installComponents".to_string(),
            install_directives: "vuetify-loader/lib/runtime/installDirectives".to_string(),
            install_icons: "vuetify-loader/lib/runtime/installIcons".to_string(),
        }
    }
}

impl RuntimePaths {
    pub fn for_category(&self, category: Category) -> &str {
        match category {
            Category::Tag => &self.install_components,
            Category::Attr => &self.install_directives,
            Category::Icon => &self.install_icons,
        }
    }
}

/// Options supplied once per loader invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// User matcher rules for tags, tried before the built-in one.
    #[serde(rename = "match")]
    pub tag_match: OneOrMany<PatternRule>,
    pub attrs_match: OneOrMany<PatternRule>,
    pub icons_match: OneOrMany<PatternRule>,
    pub library: LibraryConfig,
    pub runtime: RuntimePaths,
    /// Text that precedes hot-reload instrumentation in the host module.
    pub sentinel: String,
    /// Comment line opening every generated block.
    pub marker: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            tag_match: OneOrMany::default(),
            attrs_match: OneOrMany::default(),
            icons_match: OneOrMany::default(),
            library: LibraryConfig::default(),
            runtime: RuntimePaths::default(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl LoaderOptions {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rules(&self, category: Category) -> &[PatternRule] {
        match category {
            Category::Tag => self.tag_match.as_slice(),
            Category::Attr => self.attrs_match.as_slice(),
            Category::Icon => self.icons_match.as_slice(),
        }
    }
}
