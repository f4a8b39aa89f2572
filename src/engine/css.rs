//! CSS custom-property extraction.
//!
//! Finds `var(--name[, fallback])` usages, attaches the `/** … */` doc
//! comment that immediately precedes the occurrence (inline or on the
//! enclosing declaration), and enriches matches from the design-tokens
//! document. Parse results are cached by content hash so an unchanged CSS
//! file never re-acquires a parser.

use std::sync::Arc;

use dashmap::DashMap;
use tree_sitter::{Node, QueryCursor, StreamingIterator};

use crate::design_tokens::DesignTokens;
use crate::engine::jsdoc::clean_text;
use crate::engine::query_pool::{LanguageKind, QueryPool};
use crate::manifest::types::CssCustomProperty;
use crate::utils::content_hash;

/// Properties with this prefix are implementation details, not public API.
const PRIVATE_PREFIX: &str = "--_";

/// Content-hash-keyed CSS analyzer.
///
/// Concurrent inserts for the same hash race benignly: both writers computed
/// identical values, so last-writer-wins is correct.
#[derive(Default)]
pub struct CssAnalyzer {
    cache: DashMap<String, Arc<Vec<CssCustomProperty>>>,
}

impl CssAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract custom properties from a stylesheet (file contents or a
    /// tagged-template pseudo-file). Cache hits skip parsing entirely.
    pub fn analyze(
        &self,
        pool: &QueryPool,
        source: &str,
        tokens: Option<&DesignTokens>,
    ) -> Arc<Vec<CssCustomProperty>> {
        let key = content_hash(source.as_bytes());
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(&hit);
        }

        let properties = Arc::new(extract_properties(pool, source, tokens));
        self.cache.insert(key, Arc::clone(&properties));
        properties
    }

    /// Drop a cached entry (used when a CSS file is deleted).
    pub fn evict(&self, source_hash: &str) {
        self.cache.remove(source_hash);
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Uncached single parse; public surface for forced-reparse comparisons.
pub fn extract_properties(
    pool: &QueryPool,
    source: &str,
    tokens: Option<&DesignTokens>,
) -> Vec<CssCustomProperty> {
    let set = pool.queries(LanguageKind::Css);
    let mut parser = pool.acquire(LanguageKind::Css);

    let Some(tree) = parser.parse(source, None) else {
        return Vec::new();
    };

    let bytes = source.as_bytes();
    let fn_index = set.capture("call.fn");
    let args_index = set.capture("call.args");
    let call_index = set.capture("call");
    let comment_index = set.capture("comment");

    // (start, end) spans of doc comments, in document order.
    let mut doc_comments: Vec<(usize, usize)> = Vec::new();
    // (call node span, args text span) for each var() occurrence.
    let mut var_calls: Vec<VarCall> = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&set.query, tree.root_node(), bytes);
    while let Some(m) = matches.next() {
        let mut fn_name = None;
        let mut args = None;
        let mut call = None;
        for capture in m.captures {
            let index = Some(capture.index);
            if index == fn_index {
                fn_name = capture.node.utf8_text(bytes).ok();
            } else if index == args_index {
                args = Some(capture.node);
            } else if index == call_index {
                call = Some(capture.node);
            } else if index == comment_index {
                let text = capture.node.utf8_text(bytes).unwrap_or("");
                if text.starts_with("/**") {
                    doc_comments.push((capture.node.start_byte(), capture.node.end_byte()));
                }
            }
        }

        if let (Some("var"), Some(args), Some(call)) = (fn_name, args, call)
            && let Some((name, fallback)) = parse_var_arguments(args, bytes)
        {
            var_calls.push(VarCall {
                start: call.start_byte(),
                declaration_start: enclosing_declaration_start(call),
                name,
                fallback,
            });
        }
    }

    doc_comments.sort_unstable();

    let mut properties: Vec<CssCustomProperty> = Vec::new();
    for call in var_calls {
        if call.name.starts_with(PRIVATE_PREFIX) {
            continue;
        }

        let description = attached_doc(&doc_comments, source, &call);
        let mut property = CssCustomProperty {
            name: call.name,
            default: call.fallback,
            description,
            ..Default::default()
        };

        if let Some(info) = tokens.and_then(|t| t.lookup(&property.name)) {
            if property.syntax.is_none() {
                property.syntax = info.syntax.clone();
            }
            if property.default.is_none() {
                property.default = info.default.clone();
            }
            if property.description.is_none() {
                property.description = info.description.clone();
            }
        }

        match properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.fill_from(property),
            None => properties.push(property),
        }
    }

    properties
}

struct VarCall {
    start: usize,
    declaration_start: Option<usize>,
    name: String,
    fallback: Option<String>,
}

/// Split `( --name [, fallback] )` into name and fallback text.
fn parse_var_arguments(args: Node<'_>, bytes: &[u8]) -> Option<(String, Option<String>)> {
    let text = args.utf8_text(bytes).ok()?;
    let inner = text
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim();

    match inner.split_once(',') {
        Some((name, fallback)) => {
            let fallback = fallback.trim();
            Some((
                name.trim().to_string(),
                (!fallback.is_empty()).then(|| fallback.to_string()),
            ))
        }
        None => Some((inner.to_string(), None)),
    }
}

fn enclosing_declaration_start(mut node: Node<'_>) -> Option<usize> {
    while let Some(parent) = node.parent() {
        if parent.kind() == "declaration" {
            return Some(parent.start_byte());
        }
        node = parent;
    }
    None
}

/// The doc comment attached to a var() occurrence: the closest `/** … */`
/// separated from the enclosing declaration (or the call itself) by
/// whitespace only.
fn attached_doc(doc_comments: &[(usize, usize)], source: &str, call: &VarCall) -> Option<String> {
    let candidate = doc_comments
        .iter()
        .rev()
        .find(|(_, end)| *end <= call.start)?;
    let (start, end) = *candidate;

    let touches_call = source[end..call.start].trim().is_empty();
    let touches_declaration = call
        .declaration_start
        .is_some_and(|decl| end <= decl && source[end..decl].trim().is_empty());

    if touches_call || touches_declaration {
        let cleaned = clean_text(source[start..end].trim_start_matches("/**"));
        (!cleaned.is_empty()).then_some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn pool() -> QueryPool {
        QueryPool::new(1).unwrap()
    }

    #[test]
    fn test_extracts_var_with_fallback() {
        let css = "a { color: var(--text-color, black); }";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name, "--text-color");
        assert_eq!(properties[0].default.as_deref(), Some("black"));
    }

    #[test]
    fn test_private_properties_omitted() {
        let css = "a { color: var(--_internal); border: var(--visible); }";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name, "--visible");
    }

    #[test]
    fn test_doc_comment_before_declaration() {
        let css = "a {\n  /** The text color */\n  color: var(--text-color);\n}";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties.len(), 1);
        assert_eq!(
            properties[0].description.as_deref(),
            Some("The text color")
        );
    }

    #[test]
    fn test_inline_doc_comment() {
        let css = "a { color: /** Accent */ var(--accent); }";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties[0].description.as_deref(), Some("Accent"));
    }

    #[test]
    fn test_distant_comment_not_attached() {
        let css = "/** Header styles */\nb { margin: 0; }\na { color: var(--x); }";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties[0].description, None);
    }

    #[test]
    fn test_duplicate_usages_unified() {
        let css = "a { color: var(--c, red); }\nb { border-color: var(--c); }";
        let properties = extract_properties(&pool(), css, None);

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].default.as_deref(), Some("red"));
    }

    #[test]
    fn test_token_enrichment_fills_gaps() {
        let tokens = crate::design_tokens::DesignTokens::from_value(
            &json!({
                "text": { "color": {
                    "$type": "color",
                    "$value": "#111111",
                    "$description": "Body text color"
                } }
            }),
            None,
        );

        let css = "a { color: var(--text-color); }";
        let properties = extract_properties(&pool(), css, Some(&tokens));

        assert_eq!(properties[0].syntax.as_deref(), Some("<color>"));
        assert_eq!(properties[0].default.as_deref(), Some("#111111"));
        assert_eq!(
            properties[0].description.as_deref(),
            Some("Body text color")
        );
    }

    #[test]
    fn test_cache_hit_matches_forced_reparse() {
        let analyzer = CssAnalyzer::new();
        let pool = pool();
        let css = "a { /** Gap */ gap: var(--gap, 8px); }";

        let first = analyzer.analyze(&pool, css, None);
        let second = analyzer.analyze(&pool, css, None);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.cached_len(), 1);

        let reparsed = extract_properties(&pool, css, None);
        assert_eq!(*first, reparsed);
    }
}
