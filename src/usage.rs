//! Template usage extraction.
//!
//! Loads a component's template (inline, external, or pre-rendered from an
//! alternate language), parses it, and walks every element once to collect the
//! raw tag names, directive names and icon identifiers it references.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::error::Error as StdError;
use std::path::Path;

use crate::ast::ElementNode;
use crate::error::Result;
use crate::host::{LoaderHost, Request};
use crate::matcher::Category;
use crate::parse::parse_template;
use crate::sfc::SfcDescriptor;
use crate::visitor::{walk_element, TemplateVisitor};

pub const ICON_ACCESSOR: &str = "$getIcon";

lazy_static! {
    /// Quoted literal between `$getIcon(` and the last closing quote.
    static ref ICON_LITERAL_RE: Regex =
        Regex::new(r#"^\$getIcon\(["'](.*)(?:"|'\))"#).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// USAGE SETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Distinct names in the order the walk first met them.
pub type UsageSet = IndexSet<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateUsage {
    pub tags: UsageSet,
    pub directives: UsageSet,
    pub icons: UsageSet,
}

impl TemplateUsage {
    pub fn get(&self, category: Category) -> &UsageSet {
        match category {
            Category::Tag => &self.tags,
            Category::Attr => &self.directives,
            Category::Icon => &self.icons,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.directives.is_empty() && self.icons.is_empty()
    }
}

/// Sorted view, for reports and snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedUsage {
    pub tags: BTreeSet<String>,
    pub directives: BTreeSet<String>,
    pub icons: BTreeSet<String>,
}

impl From<&TemplateUsage> for SortedUsage {
    fn from(usage: &TemplateUsage) -> Self {
        SortedUsage {
            tags: usage.tags.iter().cloned().collect(),
            directives: usage.directives.iter().cloned().collect(),
            icons: usage.icons.iter().cloned().collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Extract the icon identifier from an attribute value such as
/// `$getIcon('mdi-home')`. Anything without a quoted literal yields `None`.
pub fn extract_icon(value: &str) -> Option<&str> {
    if !value.starts_with(ICON_ACCESSOR) {
        return None;
    }
    ICON_LITERAL_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|literal| !literal.is_empty())
}

#[derive(Debug, Default)]
pub struct UsageCollector {
    usage: TemplateUsage,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> TemplateUsage {
        self.usage
    }
}

impl TemplateVisitor for UsageCollector {
    fn visit_element(&mut self, element: &ElementNode) {
        self.usage.tags.insert(element.tag.clone());

        for directive in &element.directives {
            self.usage.directives.insert(directive.name.clone());
        }

        for value in element.attr_values() {
            if let Some(icon) = extract_icon(value) {
                self.usage.icons.insert(icon.to_string());
            }
        }

        walk_element(self, element);
    }
}

/// Parse template markup and collect its usages.
pub fn collect_usages(template: &str, file_path: &str) -> Result<TemplateUsage> {
    let ir = parse_template(template, file_path)?;
    let mut collector = UsageCollector::new();
    collector.visit_root(&ir);
    Ok(collector.finish())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE LOADING
// ═══════════════════════════════════════════════════════════════════════════════

pub type RenderError = Box<dyn StdError + Send + Sync>;

/// Converts a template written in an alternate language (pug, ...) to HTML.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, source: &str, filename: &Path) -> std::result::Result<String, RenderError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &Path) -> std::result::Result<String, RenderError> + Send + Sync,
{
    fn render(&self, source: &str, filename: &Path) -> std::result::Result<String, RenderError> {
        self(source, filename)
    }
}

pub type RendererRegistry = HashMap<String, Box<dyn TemplateRenderer>>;

/// Final markup of the component's template block, or `None` without one.
///
/// External templates are resolved and read through the host; failures there
/// abort the file. Renderer failures leave the original content in place.
pub fn load_template(
    descriptor: &SfcDescriptor,
    host: &dyn LoaderHost,
    request: &Request,
    renderers: &RendererRegistry,
) -> Result<Option<String>> {
    let Some(block) = &descriptor.template else {
        return Ok(None);
    };

    let mut content = block.content.clone();

    if let Some(src) = &block.src {
        let path = host.resolve(request.context_dir(), src)?;
        host.add_dependency(&path);
        content = host.read_file(&path)?;
    }

    if let Some(lang) = &block.lang {
        match renderers.get(lang) {
            Some(renderer) => match renderer.render(&content, &request.resource_path) {
                Ok(rendered) => content = rendered,
                Err(e) => {
                    tracing::debug!(
                        file = %request.resource_path.display(),
                        lang = %lang,
                        error = %e,
                        "template renderer failed, keeping source"
                    );
                }
            },
            None => {
                tracing::trace!(lang = %lang, "no renderer registered");
            }
        }
    }

    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FsHost;
    use crate::sfc::parse_component;
    use std::fs;

    #[test]
    fn test_extract_icon() {
        assert_eq!(extract_icon(r#"$getIcon("mdi-home")"#), Some("mdi-home"));
        assert_eq!(extract_icon("$getIcon('mdi-account')"), Some("mdi-account"));
        assert_eq!(extract_icon("$getIcon(iconName)"), None);
        assert_eq!(extract_icon("$getIcon("), None);
        assert_eq!(extract_icon("$getIcon('')"), None);
        assert_eq!(extract_icon("  $getIcon('mdi-home')"), None);
        assert_eq!(extract_icon("mdi-home"), None);
    }

    #[test]
    fn test_collect_all_categories() {
        let usage = collect_usages(
            r#"<div>
                <v-btn v-ripple :prepend-icon="$getIcon('mdi-plus')">Add</v-btn>
                <v-card v-click-outside="close" v-if="open">
                    <v-icon>{{ $getIcon("mdi-close") }}</v-icon>
                </v-card>
            </div>"#,
            "a.vue",
        )
        .unwrap();

        assert_eq!(
            SortedUsage::from(&usage).tags.into_iter().collect::<Vec<_>>(),
            vec!["div", "v-btn", "v-card", "v-icon"]
        );
        assert!(usage.directives.contains("ripple"));
        assert!(usage.directives.contains("click-outside"));
        assert!(!usage.directives.contains("if"));
        // Interpolations are text, not attribute values
        assert_eq!(usage.icons.len(), 1);
        assert!(usage.icons.contains("mdi-plus"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let usage = collect_usages(
            r#"<div><v-btn :icon="$getIcon('mdi-a')"/><v-btn :icon="$getIcon('mdi-a')"/></div>"#,
            "a.vue",
        )
        .unwrap();
        assert_eq!(usage.tags.len(), 2);
        assert_eq!(usage.icons.len(), 1);
    }

    #[test]
    fn test_empty_template() {
        let usage = collect_usages("", "a.vue").unwrap();
        assert!(usage.is_empty());
    }

    #[test]
    fn test_load_without_template() {
        let descriptor = parse_component("<script>export default {}</script>");
        let loaded = load_template(
            &descriptor,
            &FsHost::new(),
            &Request::new("/x/a.vue", "/x"),
            &RendererRegistry::new(),
        )
        .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_external_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<v-btn></v-btn>").unwrap();
        let component = dir.path().join("a.vue");

        let descriptor = parse_component(r#"<template src="./a.html"></template>"#);
        let host = FsHost::new();
        let loaded = load_template(
            &descriptor,
            &host,
            &Request::new(&component, dir.path()),
            &RendererRegistry::new(),
        )
        .unwrap();

        assert_eq!(loaded.as_deref(), Some("<v-btn></v-btn>"));
        assert_eq!(host.dependencies().len(), 1);
    }

    #[test]
    fn test_renderer_applied_by_lang() {
        let descriptor = parse_component(r#"<template lang="pug">v-btn Go</template>"#);
        let mut renderers = RendererRegistry::new();
        renderers.insert(
            "pug".to_string(),
            Box::new(|_src: &str, _file: &Path| -> std::result::Result<String, RenderError> {
                Ok("<v-btn>Go</v-btn>".to_string())
            }),
        );

        let loaded = load_template(
            &descriptor,
            &FsHost::new(),
            &Request::new("/x/a.vue", "/x"),
            &renderers,
        )
        .unwrap();
        assert_eq!(loaded.as_deref(), Some("<v-btn>Go</v-btn>"));
    }

    #[test]
    fn test_renderer_failure_keeps_source() {
        let descriptor = parse_component(r#"<template lang="pug">v-btn(</template>"#);
        let mut renderers = RendererRegistry::new();
        renderers.insert(
            "pug".to_string(),
            Box::new(|_src: &str, _file: &Path| -> std::result::Result<String, RenderError> {
                Err("unexpected end of input".into())
            }),
        );

        let loaded = load_template(
            &descriptor,
            &FsHost::new(),
            &Request::new("/x/a.vue", "/x"),
            &renderers,
        )
        .unwrap();
        assert_eq!(loaded.as_deref(), Some("v-btn("));
    }
}
