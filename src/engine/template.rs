//! Render-template analysis.
//!
//! Parses `html` tagged-template content to find `<slot>` elements and
//! `part` attribute values, together with their YAML documentation from the
//! immediately preceding HTML comment(s). Two comment forms exist:
//!
//! ```html
//! <!-- summary: icon area -->
//! <slot name="icon"></slot>
//!
//! <!-- slot:
//!        summary: icon area
//!      part:
//!        summary: icon wrapper -->
//! <slot name="icon" part="icon"></slot>
//! ```
//!
//! The inline form documents the one thing the element introduces; the
//! grouped form documents the slot and part attached to the same element.

use serde::Deserialize;
use tree_sitter::{Node, QueryCursor, StreamingIterator};

use crate::engine::query_pool::{LanguageKind, QueryPool};
use crate::manifest::types::{CssPart, Deprecated, Slot};

/// Slots and parts found in one template.
#[derive(Debug, Default, PartialEq)]
pub struct TemplateDocs {
    pub slots: Vec<Slot>,
    pub parts: Vec<CssPart>,
}

/// Documentation payload carried by a YAML comment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
struct YamlDoc {
    summary: Option<String>,
    description: Option<String>,
    deprecated: Option<YamlDeprecated>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum YamlDeprecated {
    Flag(bool),
    Reason(String),
}

impl From<YamlDeprecated> for Deprecated {
    fn from(value: YamlDeprecated) -> Self {
        match value {
            YamlDeprecated::Flag(flag) => Deprecated::Flag(flag),
            YamlDeprecated::Reason(reason) => Deprecated::Reason(reason),
        }
    }
}

/// Grouped comment form with explicit `slot:` / `part:` keys.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
struct GroupedDoc {
    slot: Option<YamlDoc>,
    part: Option<YamlDoc>,
}

/// Analyze one HTML template.
pub fn analyze_template(pool: &QueryPool, html: &str) -> TemplateDocs {
    let set = pool.queries(LanguageKind::Html);
    let mut parser = pool.acquire(LanguageKind::Html);

    let Some(tree) = parser.parse(html, None) else {
        return TemplateDocs::default();
    };

    let bytes = html.as_bytes();
    let element_index = set.capture("element");

    let mut docs = TemplateDocs::default();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&set.query, tree.root_node(), bytes);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if Some(capture.index) != element_index {
                continue;
            }
            collect_element(capture.node, bytes, &mut docs);
        }
    }

    docs
}

fn collect_element(element: Node<'_>, bytes: &[u8], docs: &mut TemplateDocs) {
    let Some(tag) = element.child(0) else {
        return;
    };
    if !matches!(tag.kind(), "start_tag" | "self_closing_tag") {
        return;
    }

    let tag_name = tag
        .named_children(&mut tag.walk())
        .find(|c| c.kind() == "tag_name")
        .and_then(|c| c.utf8_text(bytes).ok())
        .unwrap_or("");

    let slot_name = (tag_name == "slot").then(|| attribute_value(tag, "name", bytes).unwrap_or_default());
    let part_names: Vec<String> = attribute_value(tag, "part", bytes)
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    if slot_name.is_none() && part_names.is_empty() {
        return;
    }

    let (slot_doc, part_doc) = preceding_docs(element, bytes, slot_name.is_some());

    if let Some(name) = slot_name {
        let doc = slot_doc.unwrap_or_default();
        docs.slots.push(Slot {
            name,
            summary: doc.summary,
            description: doc.description,
            deprecated: doc.deprecated.map(Into::into),
            ..Default::default()
        });
    }

    for name in part_names {
        let doc = part_doc.clone().unwrap_or_default();
        docs.parts.push(CssPart {
            name,
            summary: doc.summary,
            description: doc.description,
            deprecated: doc.deprecated.map(Into::into),
            ..Default::default()
        });
    }
}

/// Attribute value on a start tag, unquoted.
fn attribute_value(tag: Node<'_>, name: &str, bytes: &[u8]) -> Option<String> {
    let mut cursor = tag.walk();
    for child in tag.named_children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let mut attr_cursor = child.walk();
        let mut attr_name = None;
        let mut attr_value = None;
        for part in child.named_children(&mut attr_cursor) {
            match part.kind() {
                "attribute_name" => attr_name = part.utf8_text(bytes).ok(),
                "quoted_attribute_value" => {
                    attr_value = part
                        .named_children(&mut part.walk())
                        .find(|v| v.kind() == "attribute_value")
                        .and_then(|v| v.utf8_text(bytes).ok());
                }
                "attribute_value" => attr_value = part.utf8_text(bytes).ok(),
                _ => {}
            }
        }
        if attr_name == Some(name) {
            return Some(attr_value.unwrap_or("").to_string());
        }
    }
    None
}

/// Parse the YAML comment(s) immediately preceding an element.
///
/// Returns docs for the slot and the part the element introduces. For the
/// inline form, `element_is_slot` decides which of the two the payload
/// describes.
fn preceding_docs(
    element: Node<'_>,
    bytes: &[u8],
    element_is_slot: bool,
) -> (Option<YamlDoc>, Option<YamlDoc>) {
    let mut slot_doc = None;
    let mut part_doc = None;

    let mut sibling = element.prev_named_sibling();
    while let Some(node) = sibling {
        if node.kind() != "comment" {
            break;
        }

        let text = node.utf8_text(bytes).unwrap_or("");
        let yaml = text
            .trim()
            .trim_start_matches("<!--")
            .trim_end_matches("-->")
            .trim();

        if let Ok(grouped) = serde_yaml::from_str::<GroupedDoc>(yaml)
            && (grouped.slot.is_some() || grouped.part.is_some())
        {
            if slot_doc.is_none() {
                slot_doc = grouped.slot;
            }
            if part_doc.is_none() {
                part_doc = grouped.part;
            }
        } else if let Ok(inline) = serde_yaml::from_str::<YamlDoc>(yaml)
            && inline != YamlDoc::default()
        {
            if element_is_slot {
                if slot_doc.is_none() {
                    slot_doc = Some(inline);
                }
            } else if part_doc.is_none() {
                part_doc = Some(inline);
            }
        }

        sibling = node.prev_named_sibling();
    }

    (slot_doc, part_doc)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pool() -> QueryPool {
        QueryPool::new(1).unwrap()
    }

    #[test]
    fn test_default_slot_with_inline_doc() {
        let docs = analyze_template(&pool(), "<!-- summary: main --><slot></slot>");

        assert_eq!(docs.slots.len(), 1);
        assert_eq!(docs.slots[0].name, "");
        assert_eq!(docs.slots[0].summary.as_deref(), Some("main"));
    }

    #[test]
    fn test_named_slot_without_doc() {
        let docs = analyze_template(&pool(), "<div><slot name=\"footer\"></slot></div>");

        assert_eq!(docs.slots.len(), 1);
        assert_eq!(docs.slots[0].name, "footer");
        assert_eq!(docs.slots[0].summary, None);
    }

    #[test]
    fn test_part_attribute() {
        let docs = analyze_template(
            &pool(),
            "<!-- summary: native control --><button part=\"button\">go</button>",
        );

        assert!(docs.slots.is_empty());
        assert_eq!(docs.parts.len(), 1);
        assert_eq!(docs.parts[0].name, "button");
        assert_eq!(docs.parts[0].summary.as_deref(), Some("native control"));
    }

    #[test]
    fn test_multiple_parts_in_one_attribute() {
        let docs = analyze_template(&pool(), "<div part=\"label icon\"></div>");
        let names: Vec<_> = docs.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["label", "icon"]);
    }

    #[test]
    fn test_grouped_form_documents_both() {
        let html = "<!-- slot:\n  summary: icon area\npart:\n  summary: icon wrapper -->\n<slot name=\"icon\" part=\"icon\"></slot>";
        let docs = analyze_template(&pool(), html);

        assert_eq!(docs.slots[0].name, "icon");
        assert_eq!(docs.slots[0].summary.as_deref(), Some("icon area"));
        assert_eq!(docs.parts[0].name, "icon");
        assert_eq!(docs.parts[0].summary.as_deref(), Some("icon wrapper"));
    }

    #[test]
    fn test_unrelated_comment_ignored() {
        let docs = analyze_template(&pool(), "<!-- TODO: rework --><slot></slot>");

        assert_eq!(docs.slots.len(), 1);
        assert_eq!(docs.slots[0].summary, None);
        assert_eq!(docs.slots[0].description, None);
    }

    #[test]
    fn test_deprecated_slot() {
        let docs = analyze_template(
            &pool(),
            "<!-- deprecated: use the icon slot --><slot name=\"legacy\"></slot>",
        );

        assert_eq!(
            docs.slots[0].deprecated,
            Some(Deprecated::Reason("use the icon slot".to_string()))
        );
    }
}
