//! Parse Module
//!
//! Turns a template block into the [`TemplateIR`] tree the usage walker visits.
//! html5ever does the actual HTML5 parsing; the pre-passes below undo the parts
//! of HTML5 semantics that do not hold for component templates.

use html5ever::parse_document;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tendril::TendrilSink;

use crate::ast::{AttributeIR, DirectiveIR, ElementNode, TemplateIR, TemplateNode, TextNode};
use crate::error::{LoaderError, Result};

const ORIG_NAME_ATTR: &str = "data-usage-orig-name";
const ORIG_ATTRS_ATTR: &str = "data-usage-orig-attrs";

lazy_static! {
    /// HTML void elements, which html5ever already closes on its own.
    static ref VOID_TAGS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect();

    static ref SELF_CLOSING_RE: Regex =
        Regex::new(r"<([A-Za-z][\w.:-]*)((?:\s[^<>]*?)?)\s*/>").unwrap();

    static ref TAG_OPEN_RE: Regex = Regex::new(r"<([A-Z][a-zA-Z0-9.]*)(\s|>)").unwrap();

    /// Any start tag with its attribute text, quoted values included.
    static ref START_TAG_RE: Regex =
        Regex::new(r#"<([A-Za-z][\w.:-]*)((?:\s(?:[^<>"']|"[^"]*"|'[^']*')*)?)>"#).unwrap();

    static ref ATTR_NAME_RE: Regex =
        Regex::new(r#"\s([^\s"'<>/=]+)(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>]+))?"#).unwrap();

    static ref SELECT_RE: Regex = Regex::new(r"<(/?)select([\s/>])").unwrap();

    static ref DIR_RE: Regex = Regex::new(r"^(?:v-|@|:|#)").unwrap();
    static ref BIND_RE: Regex = Regex::new(r"^(?::|\.|v-bind:)").unwrap();
    static ref ON_RE: Regex = Regex::new(r"^(?:@|v-on:)").unwrap();
    static ref SLOT_RE: Regex = Regex::new(r"^(?:v-slot(?::|$)|#)").unwrap();
}

/// Attributes the template compiler consumes structurally before it collects
/// directives. They never show up in an element's directive list.
const STRUCTURAL_ATTRS: &[&str] = &["v-pre", "v-for", "v-if", "v-else-if", "v-else", "v-once"];

// ═══════════════════════════════════════════════════════════════════════════════
// PRE-PASSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Expand `<v-icon />` into `<v-icon></v-icon>`.
/// html5ever ignores the self-closing flag on non-void elements, which would
/// nest every following sibling inside the component.
fn convert_self_closing_tags(html: &str) -> String {
    SELF_CLOSING_RE
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            if VOID_TAGS.contains(name.to_ascii_lowercase().as_str()) {
                return caps[0].to_string();
            }
            format!("<{}{}></{}>", name, caps[2].trim_end(), name)
        })
        .to_string()
}

/// html5ever lowercases tag names; record the original casing of PascalCase
/// tags in an attribute so it can be restored after parsing.
fn mark_component_tags(html: &str) -> String {
    TAG_OPEN_RE
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            let sep = &caps[2];
            format!("<{} {}=\"{}\"{}", name, ORIG_NAME_ATTR, name, sep)
        })
        .to_string()
}

/// html5ever also lowercases attribute names, while component templates keep
/// them (`v-clickOutside`). Mixed-case names are listed in a marker attribute.
fn mark_attribute_case(html: &str) -> String {
    START_TAG_RE
        .replace_all(html, |caps: &regex::Captures| {
            let attrs = &caps[2];
            let mixed: Vec<&str> = ATTR_NAME_RE
                .captures_iter(attrs)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .filter(|name| name.chars().any(|c| c.is_ascii_uppercase()))
                .collect();
            if mixed.is_empty() {
                return caps[0].to_string();
            }
            format!("<{} {}=\"{}\"{}>", &caps[1], ORIG_ATTRS_ATTR, mixed.join(" "), attrs)
        })
        .to_string()
}

/// Inside `<select>` the tree builder drops every start tag it does not know,
/// components included. Parse it as a plain element and restore the name.
fn neutralize_select(html: &str) -> String {
    SELECT_RE
        .replace_all(html, |caps: &regex::Captures| {
            if caps[1].is_empty() {
                format!("<usage-select {}=\"select\"{}", ORIG_NAME_ATTR, &caps[2])
            } else {
                format!("</usage-select{}", &caps[2])
            }
        })
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVES
// ═══════════════════════════════════════════════════════════════════════════════

fn is_structural(name: &str) -> bool {
    STRUCTURAL_ATTRS.contains(&name) || SLOT_RE.is_match(name)
}

/// Split `name` into the part before its modifiers and the modifiers.
/// Dots inside a dynamic argument (`v-on:[a.b]`) are not modifiers.
fn split_modifiers(name: &str) -> (&str, Vec<String>) {
    let base_end = name.rfind(']').map(|i| i + 1).unwrap_or(0);
    match name[base_end..].find('.') {
        Some(dot) => {
            let split_at = base_end + dot;
            let modifiers = name[split_at + 1..]
                .split('.')
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            (&name[..split_at], modifiers)
        }
        None => (name, Vec::new()),
    }
}

/// Parse one attribute into a directive the way the template compiler does,
/// or `None` for plain attributes, bindings, listeners and structural ones.
pub fn parse_directive(raw_name: &str, value: &str) -> Option<DirectiveIR> {
    if !DIR_RE.is_match(raw_name) || is_structural(raw_name) {
        return None;
    }

    let (without_modifiers, modifiers) = split_modifiers(raw_name);
    if BIND_RE.is_match(without_modifiers) || ON_RE.is_match(without_modifiers) {
        return None;
    }

    let stripped = DIR_RE.replace(without_modifiers, "");
    let (name, arg) = match stripped.find(':') {
        Some(colon) => (
            stripped[..colon].to_string(),
            Some(stripped[colon + 1..].to_string()),
        ),
        None => (stripped.to_string(), None),
    };

    if name.is_empty() {
        return None;
    }

    Some(DirectiveIR {
        name,
        raw_name: raw_name.to_string(),
        arg,
        modifiers,
        value: value.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

fn convert_children(handle: &Handle, keep_wrappers: bool) -> Vec<TemplateNode> {
    let mut nodes = Vec::new();
    for child in handle.children.borrow().iter() {
        collect_nodes(child, &mut nodes, keep_wrappers);
    }
    nodes
}

fn collect_nodes(handle: &Handle, nodes: &mut Vec<TemplateNode>, keep_wrappers: bool) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                collect_nodes(child, nodes, keep_wrappers);
            }
        }

        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let mut tag = name.local.to_string();

            // html/head/body are synthesized by the HTML5 tree builder unless
            // the template spelled them out.
            let is_wrapper = matches!(tag.as_str(), "html" | "head" | "body");
            if is_wrapper && !keep_wrappers {
                for child in handle.children.borrow().iter() {
                    collect_nodes(child, nodes, keep_wrappers);
                }
                return;
            }

            let attrs = attrs.borrow();
            let original_case: HashMap<String, &str> = attrs
                .iter()
                .filter(|a| &*a.name.local == ORIG_ATTRS_ATTR)
                .flat_map(|a| a.value.split_whitespace())
                .map(|name| (name.to_ascii_lowercase(), name))
                .collect();

            let mut attributes = Vec::new();
            for attr in attrs.iter() {
                let attr_name = attr.name.local.to_string();
                if attr_name == ORIG_NAME_ATTR {
                    tag = attr.value.to_string();
                    continue;
                }
                if attr_name == ORIG_ATTRS_ATTR {
                    continue;
                }
                let name = original_case
                    .get(&attr_name)
                    .map(|n| n.to_string())
                    .unwrap_or(attr_name);
                attributes.push(AttributeIR {
                    name,
                    value: attr.value.to_string(),
                });
            }

            let directives = attributes
                .iter()
                .filter_map(|a| parse_directive(&a.name, &a.value))
                .collect();

            let mut children = convert_children(handle, keep_wrappers);
            if let Some(contents) = template_contents.borrow().as_ref() {
                children.extend(convert_children(contents, keep_wrappers));
            }

            nodes.push(TemplateNode::Element(ElementNode {
                tag,
                attrs: attributes,
                directives,
                children,
            }));
        }

        NodeData::Text { contents } => {
            let value = contents.borrow().to_string();
            if !value.trim().is_empty() {
                nodes.push(TemplateNode::Text(TextNode { value }));
            }
        }

        NodeData::Doctype { .. } | NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse template markup into a node tree.
pub fn parse_template(html: &str, file_path: &str) -> Result<TemplateIR> {
    let expanded = convert_self_closing_tags(html);
    let marked = mark_attribute_case(&mark_component_tags(&neutralize_select(&expanded)));

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut marked.as_bytes())
        .map_err(|e| LoaderError::TemplateParse {
            file: file_path.to_string(),
            reason: e.to_string(),
        })?;

    let lower = html.to_lowercase();
    let keep_wrappers = lower.contains("<html") || lower.contains("<body");

    let mut nodes = Vec::new();
    collect_nodes(&dom.document, &mut nodes, keep_wrappers);

    Ok(TemplateIR {
        raw: html.to_string(),
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn first_element(ir: &TemplateIR) -> &ElementNode {
        match &ir.nodes[0] {
            TemplateNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    fn all_tags(nodes: &[TemplateNode], out: &mut Vec<String>) {
        for node in nodes {
            if let TemplateNode::Element(el) = node {
                out.push(el.tag.clone());
                all_tags(&el.children, out);
            }
        }
    }

    #[test]
    fn test_convert_self_closing() {
        assert_eq!(convert_self_closing_tags("<v-icon />"), "<v-icon></v-icon>");
        assert_eq!(
            convert_self_closing_tags(r#"<VBtn color="red"/>"#),
            r#"<VBtn color="red"></VBtn>"#
        );
        assert_eq!(convert_self_closing_tags("<br/>"), "<br/>");
    }

    #[test]
    fn test_restores_component_casing() {
        let ir = parse_template("<VCard><VBtn /><v-icon/></VCard>", "a.vue").unwrap();
        let card = first_element(&ir);
        assert_eq!(card.tag, "VCard");
        assert!(card.attr(ORIG_NAME_ATTR).is_none());

        let mut tags = Vec::new();
        all_tags(&ir.nodes, &mut tags);
        assert_eq!(tags, vec!["VCard", "VBtn", "v-icon"]);
    }

    #[test]
    fn test_self_closing_siblings_stay_siblings() {
        let ir = parse_template("<div><v-icon /><span>x</span></div>", "a.vue").unwrap();
        let div = first_element(&ir);
        assert_eq!(div.children.len(), 2);
    }

    #[test]
    fn test_descends_into_template_contents() {
        let ir = parse_template(
            r#"<v-list><template v-slot:item><v-list-item /></template></v-list>"#,
            "a.vue",
        )
        .unwrap();
        let mut tags = Vec::new();
        all_tags(&ir.nodes, &mut tags);
        assert!(tags.contains(&"template".to_string()));
        assert!(tags.contains(&"v-list-item".to_string()));
    }

    #[test]
    fn test_wrappers_dropped() {
        let ir = parse_template("<div></div>", "a.vue").unwrap();
        assert_eq!(ir.nodes.len(), 1);
        assert_eq!(first_element(&ir).tag, "div");
    }

    #[test]
    fn test_attributes_kept_raw() {
        let ir = parse_template(
            r#"<v-btn :icon="$getIcon('mdi-home')" @click="go" v-ripple.center></v-btn>"#,
            "a.vue",
        )
        .unwrap();
        let btn = first_element(&ir);
        assert_eq!(btn.attr(":icon"), Some("$getIcon('mdi-home')"));
        assert_eq!(btn.directives.len(), 1);
        assert_eq!(btn.directives[0].name, "ripple");
        assert_eq!(btn.directives[0].modifiers, vec!["center".to_string()]);
    }

    #[test]
    fn test_attribute_casing_restored() {
        let ir = parse_template(
            r#"<div v-clickOutside="close" :prependIcon="a > b" class="x"></div>"#,
            "a.vue",
        )
        .unwrap();
        let div = first_element(&ir);
        let names: Vec<_> = div.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["v-clickOutside", ":prependIcon", "class"]);
        assert_eq!(div.attr(":prependIcon"), Some("a > b"));
        assert_eq!(div.directives.len(), 1);
        assert_eq!(div.directives[0].name, "clickOutside");
    }

    #[test]
    fn test_mark_attribute_case_leaves_lowercase_tags_alone() {
        let html = r#"<v-btn color="Red" v-ripple></v-btn>"#;
        assert_eq!(mark_attribute_case(html), html);
    }

    #[test]
    fn test_components_inside_select_kept() {
        let ir = parse_template(
            r#"<div><select v-model="x"><v-icon /><option>a</option></select><v-chip /></div>"#,
            "a.vue",
        )
        .unwrap();
        let mut tags = Vec::new();
        all_tags(&ir.nodes, &mut tags);
        assert_eq!(tags, vec!["div", "select", "v-icon", "option", "v-chip"]);
    }

    #[rstest]
    #[case("v-ripple", Some("ripple"))]
    #[case("v-ripple.center", Some("ripple"))]
    #[case("v-click-outside", Some("click-outside"))]
    #[case("v-model.trim", Some("model"))]
    #[case("v-show", Some("show"))]
    #[case("v-mutate:attr.child", Some("mutate"))]
    #[case("v-bind", Some("bind"))]
    #[case("v-on", Some("on"))]
    #[case(":items", None)]
    #[case("v-bind:items", None)]
    #[case(".prop", None)]
    #[case("@click.stop", None)]
    #[case("v-on:click", None)]
    #[case("v-if", None)]
    #[case("v-else", None)]
    #[case("v-for", None)]
    #[case("v-slot:item", None)]
    #[case("#default", None)]
    #[case("class", None)]
    fn test_parse_directive(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_directive(raw, "").map(|d| d.name),
            expected.map(str::to_string)
        );
    }

    #[test]
    fn test_directive_argument() {
        let dir = parse_directive("v-intersect:once.quiet", "onIntersect").unwrap();
        assert_eq!(dir.name, "intersect");
        assert_eq!(dir.arg.as_deref(), Some("once"));
        assert_eq!(dir.modifiers, vec!["quiet".to_string()]);
        assert_eq!(dir.value, "onIntersect");
    }
}
