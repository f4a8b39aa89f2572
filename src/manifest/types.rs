//! Custom Elements Manifest records.
//!
//! These types serialize to the CEM schema verbatim: camelCase keys, `kind`
//! tags, empty collections omitted. Unknown fields encountered when reading
//! an existing manifest are kept in flattened maps so they survive a
//! round-trip. Struct field order fixes the JSON key order, which keeps
//! serialization byte-deterministic.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Emitted manifest schema version.
pub const SCHEMA_VERSION: &str = "2.1.0";

/// Unknown-field bag; `preserve_order` keeps round-trips stable.
pub type ExtraFields = Map<String, Value>;

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================
// Package and modules
// ============================================================

/// Top-level manifest record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    #[serde(default)]
    pub modules: Vec<Module>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Package {
    pub fn new(modules: Vec<Module>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            readme: None,
            modules,
            extra: ExtraFields::new(),
        }
    }

    /// Serialize to the canonical pretty JSON form (trailing newline).
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModuleKind {
    #[default]
    #[serde(rename = "javascript-module")]
    JavaScriptModule,
}

/// One analyzed source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub kind: ModuleKind,

    /// Canonical workspace-relative module path; the manifest's primary key.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<Declaration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<Export>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Find a declaration by name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }
}

// ============================================================
// Declarations
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(FunctionDeclaration),
    Variable(VariableDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Class(c) => &c.name,
            Declaration::Function(f) => &f.name,
            Declaration::Variable(v) => &v.name,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match self {
            Declaration::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassDeclaration> {
        match self {
            Declaration::Class(c) => Some(c),
            _ => None,
        }
    }
}

/// A class, plain or custom element. Custom elements carry
/// `customElement: true` plus the element-specific collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub custom_element: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_properties: Vec<CssCustomProperty>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_parts: Vec<CssPart>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_states: Vec<CssCustomState>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub demos: Vec<Demo>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ClassDeclaration {
    /// Find a field member by name (attribute `fieldName` binding target).
    pub fn field(&self, name: &str) -> Option<&ClassField> {
        self.members.iter().find_map(|m| match m {
            Member::Field(f) if f.name == name => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ============================================================
// Class members
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Member {
    Field(ClassField),
    Method(ClassMethod),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::Method(m) => &m.name,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassField {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,

    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub static_: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassMethod {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,

    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub static_: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnType {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================
// Documentation-bearing sub-records
// ============================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Name of the field member this attribute reflects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The default slot has the empty name, omitted from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CssCustomProperty {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CssPart {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CssCustomState {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Demo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub url: String,
}

// ============================================================
// Types, references, exports
// ============================================================

/// A type annotation with optional workspace-local back-references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<TypeReference>,
}

impl Type {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// A reference to a declaration, local (`module`) or external (`package`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub href: String,
}

// ============================================================
// Gap-filling merges
// ============================================================

// Unify-by-name semantics shared by the assembler and the JSDoc merge pass:
// the existing record wins, the incoming one fills fields left empty. Spelled
// out per type so a new field cannot silently be dropped from the merge.

macro_rules! fill {
    ($target:expr, $source:expr) => {
        if $target.is_none() {
            $target = $source;
        }
    };
}

impl Attribute {
    pub fn fill_from(&mut self, other: Attribute) {
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.type_, other.type_);
        fill!(self.default, other.default);
        fill!(self.field_name, other.field_name);
        fill!(self.deprecated, other.deprecated);
    }
}

impl Slot {
    pub fn fill_from(&mut self, other: Slot) {
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.deprecated, other.deprecated);
    }
}

impl Event {
    pub fn fill_from(&mut self, other: Event) {
        fill!(self.type_, other.type_);
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.deprecated, other.deprecated);
    }
}

impl CssCustomProperty {
    pub fn fill_from(&mut self, other: CssCustomProperty) {
        fill!(self.syntax, other.syntax);
        fill!(self.default, other.default);
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.deprecated, other.deprecated);
    }
}

impl CssPart {
    pub fn fill_from(&mut self, other: CssPart) {
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.deprecated, other.deprecated);
    }
}

impl CssCustomState {
    pub fn fill_from(&mut self, other: CssCustomState) {
        fill!(self.summary, other.summary);
        fill!(self.description, other.description);
        fill!(self.deprecated, other.deprecated);
    }
}

/// Deprecation marker: plain flag or a reason string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Deprecated {
    Flag(bool),
    Reason(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Export {
    #[serde(rename = "js")]
    Js {
        name: String,
        declaration: Reference,
        #[serde(flatten)]
        extra: ExtraFields,
    },
    #[serde(rename = "custom-element-definition")]
    CustomElementDefinition {
        name: String,
        declaration: Reference,
        #[serde(flatten)]
        extra: ExtraFields,
    },
}

impl Export {
    pub fn name(&self) -> &str {
        match self {
            Export::Js { name, .. } | Export::CustomElementDefinition { name, .. } => name,
        }
    }

    pub fn declaration(&self) -> &Reference {
        match self {
            Export::Js { declaration, .. }
            | Export::CustomElementDefinition { declaration, .. } => declaration,
        }
    }

    /// The serialized `kind` value; also the sort key prefix.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Export::Js { .. } => "js",
            Export::CustomElementDefinition { .. } => "custom-element-definition",
        }
    }

    pub fn js(name: impl Into<String>, declaration: Reference) -> Self {
        Export::Js {
            name: name.into(),
            declaration,
            extra: ExtraFields::new(),
        }
    }

    pub fn definition(tag_name: impl Into<String>, declaration: Reference) -> Self {
        Export::CustomElementDefinition {
            name: tag_name.into(),
            declaration,
            extra: ExtraFields::new(),
        }
    }
}
