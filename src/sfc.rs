//! Single-file component descriptor parser.
//!
//! Splits a `.vue` source into its top-level blocks. Only the template block is
//! inspected further by the usage engine; script, style and custom blocks are
//! carried through untouched.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    /// Opening tag of a top-level block, anchored at the cursor.
    static ref BLOCK_OPEN_RE: Regex = Regex::new(r"^<([A-Za-z][\w-]*)(\s[^>]*)?>").unwrap();

    /// Nested template open/close tags, used to find the matching `</template>`.
    /// Comments match as a whole so tags inside them are not counted.
    static ref TEMPLATE_TAG_RE: Regex =
        Regex::new(r"<!--[\s\S]*?-->|<(/?)template\b([^>]*)>").unwrap();

    /// Attribute regex for block attributes
    static ref ATTR_REGEX: Regex = Regex::new(r#"(?i)([a-z0-9-]+)(?:=(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#).unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcBlock {
    pub tag: String,
    pub content: String,
    pub attrs: HashMap<String, String>,
    pub lang: Option<String>,
    pub src: Option<String>,
}

impl SfcBlock {
    fn new(tag: &str, attr_string: &str, content: &str) -> Self {
        let attrs = parse_attrs(attr_string);
        SfcBlock {
            tag: tag.to_string(),
            content: content.to_string(),
            lang: attrs.get("lang").cloned(),
            src: attrs.get("src").cloned(),
            attrs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcDescriptor {
    pub template: Option<SfcBlock>,
    pub script: Option<SfcBlock>,
    pub script_setup: Option<SfcBlock>,
    pub styles: Vec<SfcBlock>,
    pub custom_blocks: Vec<SfcBlock>,
}

fn parse_attrs(attr_string: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(attr_string) {
        if let Some(name) = caps.get(1) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            attributes.insert(name.as_str().to_string(), value);
        }
    }
    attributes
}

/// Returns `(content_end, close_end)` for the block opened just before `from`.
fn find_block_end(source: &str, from: usize, tag: &str) -> Option<(usize, usize)> {
    if tag == "template" {
        let mut depth = 1usize;
        for caps in TEMPLATE_TAG_RE.captures_iter(&source[from..]) {
            let m = caps.get(0)?;
            let Some(slash) = caps.get(1) else {
                continue;
            };
            let closing = !slash.as_str().is_empty();
            let self_closing = caps
                .get(2)
                .is_some_and(|a| a.as_str().trim_end().ends_with('/'));

            if closing {
                depth -= 1;
                if depth == 0 {
                    return Some((from + m.start(), from + m.end()));
                }
            } else if !self_closing {
                depth += 1;
            }
        }
        return None;
    }

    let close = format!("</{}", tag);
    let rel = source[from..].find(&close)?;
    let content_end = from + rel;
    let close_end = source[content_end..]
        .find('>')
        .map(|i| content_end + i + 1)?;
    Some((content_end, close_end))
}

/// Parse the top-level blocks of a single-file component.
pub fn parse_component(source: &str) -> SfcDescriptor {
    let mut descriptor = SfcDescriptor::default();
    let mut cursor = 0;

    while let Some(rel) = source[cursor..].find('<') {
        let start = cursor + rel;
        let rest = &source[start..];

        if rest.starts_with("<!--") {
            cursor = rest
                .find("-->")
                .map(|end| start + end + 3)
                .unwrap_or(source.len());
            continue;
        }

        let Some(caps) = BLOCK_OPEN_RE.captures(rest) else {
            cursor = start + 1;
            continue;
        };

        let tag = caps[1].to_string();
        let attr_string = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let open_end = start + caps[0].len();

        let block = if attr_string.trim_end().ends_with('/') {
            cursor = open_end;
            SfcBlock::new(&tag, attr_string, "")
        } else {
            match find_block_end(source, open_end, &tag) {
                Some((content_end, close_end)) => {
                    cursor = close_end;
                    SfcBlock::new(&tag, attr_string, &source[open_end..content_end])
                }
                None => {
                    // Unterminated block, nothing after it can be top-level
                    break;
                }
            }
        };

        match tag.as_str() {
            "template" => {
                if descriptor.template.is_none() {
                    descriptor.template = Some(block);
                }
            }
            "script" if block.attrs.contains_key("setup") => descriptor.script_setup = Some(block),
            "script" => descriptor.script = Some(block),
            "style" => descriptor.styles.push(block),
            _ => descriptor.custom_blocks.push(block),
        }
    }

    descriptor
}
