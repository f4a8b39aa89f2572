//! Read-only design-tokens lookup.
//!
//! Loads a DTCG-style JSON document (nested groups, `$value`/`$type`/
//! `$description` leaves) and answers CSS custom-property lookups. The
//! document is flattened once at load time and never mutated.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Metadata a token contributes to a CSS custom property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub syntax: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// Flattened token document. Token paths join with `-`, so the token
/// `color.primary` answers for `--color-primary` (or
/// `--<prefix>-color-primary` when a prefix is configured).
#[derive(Debug, Default)]
pub struct DesignTokens {
    tokens: HashMap<String, TokenInfo>,
    prefix: Option<String>,
}

impl DesignTokens {
    pub fn load(path: &Path, prefix: Option<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read design tokens: {}", path.display()))?;
        let document: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse design tokens: {}", path.display()))?;
        Ok(Self::from_value(&document, prefix))
    }

    pub fn from_value(document: &Value, prefix: Option<String>) -> Self {
        let mut tokens = HashMap::new();
        flatten(document, &mut Vec::new(), &mut tokens);
        Self { tokens, prefix }
    }

    /// Find the token matching a CSS custom property name, honoring the
    /// configured prefix restriction.
    pub fn lookup(&self, property_name: &str) -> Option<&TokenInfo> {
        let bare = match &self.prefix {
            Some(prefix) => property_name
                .strip_prefix(prefix.as_str())?
                .strip_prefix('-')?,
            None => property_name.strip_prefix("--")?,
        };
        self.tokens.get(bare)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn flatten(value: &Value, path: &mut Vec<String>, out: &mut HashMap<String, TokenInfo>) {
    let Value::Object(map) = value else {
        return;
    };

    if map.contains_key("$value") {
        let info = TokenInfo {
            syntax: map
                .get("$type")
                .and_then(Value::as_str)
                .and_then(css_syntax_for_type),
            default: map.get("$value").map(value_text),
            description: map
                .get("$description")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        out.insert(path.join("-"), info);
        return;
    }

    for (key, child) in map {
        if key.starts_with('$') {
            continue;
        }
        path.push(key.clone());
        flatten(child, path, out);
        path.pop();
    }
}

/// Map DTCG `$type` values onto CSS syntax strings where one exists.
fn css_syntax_for_type(token_type: &str) -> Option<String> {
    let syntax = match token_type {
        "color" => "<color>",
        "dimension" => "<length>",
        "number" => "<number>",
        "duration" => "<time>",
        "fontFamily" => "<custom-ident>",
        _ => return None,
    };
    Some(syntax.to_string())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
