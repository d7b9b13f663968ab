use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE AST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TemplateNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    /// Every attribute as written, in source order.
    pub attrs: Vec<AttributeIR>,
    /// Directives bound on this element, in source order.
    pub directives: Vec<DirectiveIR>,
    pub children: Vec<TemplateNode>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute values only, the view icon extraction works on.
    pub fn attr_values(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeIR {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveIR {
    /// Directive name without prefix, argument or modifiers (`ripple`).
    pub name: String,
    /// Attribute name as written (`v-ripple.center`).
    pub raw_name: String,
    pub arg: Option<String>,
    pub modifiers: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateIR {
    pub raw: String,
    pub nodes: Vec<TemplateNode>,
}
