//! JSDoc block parsing and tag merging.
//!
//! Blocks are parsed with the JSDoc grammar; tag payloads follow the
//! `[{type}] [name] [- description]` shape, with `[name=default]` marking a
//! default value. Applying a block to a declaration is idempotent: extracted
//! data wins, JSDoc fills the gaps.

use crate::engine::query_pool::{LanguageKind, QueryPool};
use crate::manifest::types::{
    Attribute, ClassDeclaration, CssCustomProperty, CssCustomState, CssPart, Demo, Deprecated,
    Event, Slot, Type,
};

use tree_sitter::{Node, StreamingIterator};

/// One parsed `@tag payload` pair. The tag is stored without the `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    pub tag: String,
    pub payload: String,
}

/// A parsed documentation block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsDocBlock {
    pub description: Option<String>,
    pub tags: Vec<JsDocTag>,
}

impl JsDocBlock {
    /// First payload for a tag name, if the block carries it.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag == name)
            .map(|t| t.payload.as_str())
    }
}

/// True for `/** … */` documentation comments (not `//` or plain `/* … */`).
pub fn is_jsdoc(text: &str) -> bool {
    text.starts_with("/**") && text.ends_with("*/")
}

/// Parse one `/** … */` block.
pub fn parse_block(pool: &QueryPool, text: &str) -> JsDocBlock {
    let set = pool.queries(LanguageKind::JsDoc);
    let mut parser = pool.acquire(LanguageKind::JsDoc);

    let Some(tree) = parser.parse(text, None) else {
        return JsDocBlock::default();
    };

    let bytes = text.as_bytes();
    let mut block = JsDocBlock::default();

    let description_index = set.capture("doc.description");
    let tag_index = set.capture("tag");

    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(&set.query, tree.root_node(), bytes);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let index = Some(capture.index);
            if index == description_index {
                let cleaned = clean_text(node_text(capture.node, bytes));
                if !cleaned.is_empty() {
                    block.description = Some(cleaned);
                }
            } else if index == tag_index {
                if let Some(tag) = parse_tag(capture.node, bytes) {
                    block.tags.push(tag);
                }
            }
        }
    }

    block
}

fn parse_tag(node: Node<'_>, bytes: &[u8]) -> Option<JsDocTag> {
    let mut tag_name = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "tag_name" {
            tag_name = Some(child);
            break;
        }
    }
    let tag_name = tag_name?;

    let name = node_text(tag_name, bytes)
        .trim_start_matches('@')
        .to_string();
    let payload_start = tag_name.end_byte() - node.start_byte();
    let payload = clean_text(&node_text(node, bytes)[payload_start..]);

    Some(JsDocTag { tag: name, payload })
}

fn node_text<'a>(node: Node<'_>, bytes: &'a [u8]) -> &'a str {
    node.utf8_text(bytes).unwrap_or("")
}

/// Strip comment decoration: per-line leading `*`, the closing delimiter,
/// surrounding whitespace. Line structure within the text is preserved.
/// Also used for `/** … */` doc comments inside CSS.
pub(crate) fn clean_text(text: &str) -> String {
    let text = text.strip_suffix("*/").unwrap_or(text);
    text.lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ============================================================
// Tag payloads
// ============================================================

/// Structured form of a tag payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPayload {
    pub type_text: Option<String>,
    pub name: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// Parse `[{type}] [name] [- description]`.
///
/// `[name=default]` yields both a name and a default. A payload without
/// ` - ` and without a plausible name is all description.
pub fn parse_payload(payload: &str) -> TagPayload {
    let mut rest = payload.trim();
    let mut parsed = TagPayload::default();

    if rest.starts_with('{')
        && let Some(end) = rest.find('}')
    {
        parsed.type_text = Some(rest[1..end].trim().to_string());
        rest = rest[end + 1..].trim_start();
    }

    // A payload opening with "- " is pure description (e.g. the default
    // slot: "@slot - default content"). CSS property names also start with
    // a dash, so only a lone dash counts.
    if rest == "-" {
        return parsed;
    }
    if let Some(stripped) = rest.strip_prefix("- ") {
        let description = stripped.trim();
        if !description.is_empty() {
            parsed.description = Some(description.to_string());
        }
        return parsed;
    }

    let (name_part, description) = match rest.split_once(" - ") {
        Some((name_part, description)) => (name_part.trim(), Some(description.trim())),
        None => (rest, None),
    };

    if let Some(bracketed) = name_part
        .strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
    {
        match bracketed.split_once('=') {
            Some((name, default)) => {
                parsed.name = Some(name.trim().to_string());
                parsed.default = Some(default.trim().to_string());
            }
            None => parsed.name = Some(bracketed.trim().to_string()),
        }
    } else if let Some((name, trailing)) = name_part.split_once(char::is_whitespace) {
        // No " - " separator; treat the remainder as description anyway.
        parsed.name = Some(name.to_string());
        if description.is_none() && !trailing.trim().is_empty() {
            parsed.description = Some(trailing.trim().to_string());
        }
    } else if !name_part.is_empty() {
        parsed.name = Some(name_part.to_string());
    }

    if let Some(description) = description
        && !description.is_empty()
    {
        parsed.description = Some(description.to_string());
    }

    parsed
}

// ============================================================
// Merging into declarations
// ============================================================

/// Merge a class-level JSDoc block into the declaration.
///
/// Extracted data wins; JSDoc fills missing fields. Idempotent: re-applying
/// the same block changes nothing.
pub fn apply_class_tags(class: &mut ClassDeclaration, block: &JsDocBlock) {
    if class.description.is_none() {
        class.description = block.description.clone();
    }

    for tag in &block.tags {
        let payload = parse_payload(&tag.payload);
        match tag.tag.as_str() {
            "summary" => {
                if class.summary.is_none() && !tag.payload.is_empty() {
                    class.summary = Some(tag.payload.clone());
                }
            }
            "deprecated" => {
                if class.deprecated.is_none() {
                    class.deprecated = Some(if tag.payload.is_empty() {
                        Deprecated::Flag(true)
                    } else {
                        Deprecated::Reason(tag.payload.clone())
                    });
                }
            }
            "attr" | "attribute" => {
                if let Some(name) = payload.name.clone() {
                    merge_named(&mut class.attributes, name.clone(), Attribute::fill_from, || {
                        Attribute {
                            name,
                            type_: payload.type_text.clone().map(Type::new),
                            default: payload.default.clone(),
                            description: payload.description.clone(),
                            ..Default::default()
                        }
                    });
                }
            }
            "cssprop" | "cssproperty" => {
                if let Some(name) = payload.name.clone() {
                    merge_named(
                        &mut class.css_properties,
                        name.clone(),
                        CssCustomProperty::fill_from,
                        || CssCustomProperty {
                            name,
                            syntax: payload.type_text.clone(),
                            default: payload.default.clone(),
                            description: payload.description.clone(),
                            ..Default::default()
                        },
                    );
                }
            }
            "csspart" => {
                if let Some(name) = payload.name.clone() {
                    merge_named(&mut class.css_parts, name.clone(), CssPart::fill_from, || {
                        CssPart {
                            name,
                            description: payload.description.clone(),
                            ..Default::default()
                        }
                    });
                }
            }
            "cssstate" => {
                if let Some(name) = payload.name.clone() {
                    merge_named(
                        &mut class.css_states,
                        name.clone(),
                        CssCustomState::fill_from,
                        || CssCustomState {
                            name,
                            description: payload.description.clone(),
                            ..Default::default()
                        },
                    );
                }
            }
            "slot" => {
                // "@slot - default content" documents the default slot.
                let name = payload.name.clone().unwrap_or_default();
                merge_named(&mut class.slots, name.clone(), Slot::fill_from, || Slot {
                    name,
                    description: payload.description.clone(),
                    ..Default::default()
                });
            }
            "event" | "fires" => {
                if let Some(name) = payload.name.clone() {
                    merge_named(&mut class.events, name.clone(), Event::fill_from, || Event {
                        name,
                        type_: payload.type_text.clone().map(Type::new),
                        description: payload.description.clone(),
                        ..Default::default()
                    });
                }
            }
            "demo" => {
                if let Some(url) = payload.name.clone()
                    && !class.demos.iter().any(|d| d.url == url)
                {
                    class.demos.push(Demo {
                        url,
                        description: payload.description.clone(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn merge_named<T>(
    items: &mut Vec<T>,
    name: String,
    fill: impl Fn(&mut T, T),
    build: impl FnOnce() -> T,
) where
    T: NamedRecord,
{
    match items.iter_mut().find(|item| item.record_name() == name) {
        Some(existing) => fill(existing, build()),
        None => items.push(build()),
    }
}

trait NamedRecord {
    fn record_name(&self) -> &str;
}

macro_rules! named_record {
    ($($ty:ty),+) => {
        $(impl NamedRecord for $ty {
            fn record_name(&self) -> &str {
                &self.name
            }
        })+
    };
}

named_record!(Attribute, Slot, Event, CssCustomProperty, CssPart, CssCustomState);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pool() -> QueryPool {
        QueryPool::new(1).unwrap()
    }

    #[test]
    fn test_parse_block_description_and_tags() {
        let block = parse_block(
            &pool(),
            "/**\n * A toggle button.\n *\n * @slot - default content\n * @csspart button - the native button\n */",
        );
        assert_eq!(block.description.as_deref(), Some("A toggle button."));
        assert_eq!(block.tags.len(), 2);
        assert_eq!(block.tags[0].tag, "slot");
        assert_eq!(block.tags[1].tag, "csspart");
        assert_eq!(block.tags[1].payload, "button - the native button");
    }

    #[test]
    fn test_parse_payload_forms() {
        let parsed = parse_payload("{boolean} open - Whether the panel is open");
        assert_eq!(parsed.type_text.as_deref(), Some("boolean"));
        assert_eq!(parsed.name.as_deref(), Some("open"));
        assert_eq!(
            parsed.description.as_deref(),
            Some("Whether the panel is open")
        );

        let parsed = parse_payload("[--color=red] - accent color");
        assert_eq!(parsed.name.as_deref(), Some("--color"));
        assert_eq!(parsed.default.as_deref(), Some("red"));
        assert_eq!(parsed.description.as_deref(), Some("accent color"));

        let parsed = parse_payload("- default content");
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.description.as_deref(), Some("default content"));

        let parsed = parse_payload("header");
        assert_eq!(parsed.name.as_deref(), Some("header"));
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn test_payload_without_dash_separator() {
        let parsed = parse_payload("change fired when the value changes");
        assert_eq!(parsed.name.as_deref(), Some("change"));
        assert_eq!(
            parsed.description.as_deref(),
            Some("fired when the value changes")
        );
    }

    #[test]
    fn test_apply_fills_but_never_overwrites() {
        let block = parse_block(
            &pool(),
            "/**\n * @attr {string} kind - the kind attribute\n */",
        );

        let mut class = ClassDeclaration {
            name: "A".to_string(),
            attributes: vec![Attribute {
                name: "kind".to_string(),
                type_: Some(Type::new("'a' | 'b'")),
                ..Default::default()
            }],
            ..Default::default()
        };

        apply_class_tags(&mut class, &block);

        // Extracted type wins; JSDoc supplies the missing description.
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.attributes[0].type_.as_ref().unwrap().text, "'a' | 'b'");
        assert_eq!(
            class.attributes[0].description.as_deref(),
            Some("the kind attribute")
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        let block = parse_block(
            &pool(),
            "/**\n * Panel.\n * @slot header - top area\n * @cssprop [--gap=8px] - spacing\n * @deprecated use x-panel\n */",
        );

        let mut class = ClassDeclaration {
            name: "Panel".to_string(),
            ..Default::default()
        };

        apply_class_tags(&mut class, &block);
        let once = class.clone();
        apply_class_tags(&mut class, &block);

        assert_eq!(class, once);
        assert_eq!(class.slots.len(), 1);
        assert_eq!(class.css_properties[0].default.as_deref(), Some("8px"));
        assert_eq!(
            class.deprecated,
            Some(Deprecated::Reason("use x-panel".to_string()))
        );
    }

    #[test]
    fn test_default_slot_tag() {
        let block = parse_block(&pool(), "/** @slot - default content */");
        let mut class = ClassDeclaration::default();
        apply_class_tags(&mut class, &block);

        assert_eq!(class.slots.len(), 1);
        assert_eq!(class.slots[0].name, "");
        assert_eq!(class.slots[0].description.as_deref(), Some("default content"));
    }

    #[test]
    fn test_is_jsdoc() {
        assert!(is_jsdoc("/** doc */"));
        assert!(!is_jsdoc("/* plain */"));
        assert!(!is_jsdoc("// line"));
    }
}
