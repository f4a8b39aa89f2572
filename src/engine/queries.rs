//! Embedded tree-sitter query sources.
//!
//! One query per language holds every pattern the processor needs; captures
//! are addressed by name. The TypeScript and JavaScript sources differ only
//! where the grammars do (class names parse as `type_identifier` vs
//! `identifier`, and JavaScript has no type aliases or enums).

/// Shared pattern block for the TypeScript-family grammar.
pub const TYPESCRIPT_QUERY: &str = r#"
; Imports and re-exports: module dependency edges
(import_statement source: (string (string_fragment) @import.source))
(export_statement source: (string (string_fragment) @import.source))

; Classes, including abstract element base classes
(class_declaration name: (type_identifier) @class.name) @class
(abstract_class_declaration name: (type_identifier) @class.name) @class

; customElements.define("tag", Class)
(call_expression
  function: (member_expression
    object: (identifier) @define.receiver
    property: (property_identifier) @define.method)
  arguments: (arguments
    (string (string_fragment) @define.tag)
    (identifier) @define.class)) @define

; Type aliases and enums: the type-resolution symbol table
(type_alias_declaration
  name: (type_identifier) @alias.name
  value: (_) @alias.value)
(enum_declaration name: (identifier) @enum.name) @enum

; Tagged templates: css`...` styles and html`...` render output
(call_expression
  function: (identifier) @template.tag
  arguments: (template_string) @template.body) @template

; Events dispatched as new CustomEvent("name")
(new_expression
  constructor: (identifier) @event.ctor
  arguments: (arguments . (string (string_fragment) @event.name))) @event
"#;

pub const JAVASCRIPT_QUERY: &str = r#"
; Imports and re-exports: module dependency edges
(import_statement source: (string (string_fragment) @import.source))
(export_statement source: (string (string_fragment) @import.source))

(class_declaration name: (identifier) @class.name) @class

; customElements.define("tag", Class)
(call_expression
  function: (member_expression
    object: (identifier) @define.receiver
    property: (property_identifier) @define.method)
  arguments: (arguments
    (string (string_fragment) @define.tag)
    (identifier) @define.class)) @define

; Tagged templates: css`...` styles and html`...` render output
(call_expression
  function: (identifier) @template.tag
  arguments: (template_string) @template.body) @template

; Events dispatched as new CustomEvent("name")
(new_expression
  constructor: (identifier) @event.ctor
  arguments: (arguments . (string (string_fragment) @event.name))) @event
"#;

pub const CSS_QUERY: &str = r#"
; var() usages and the doc comments that document them
(call_expression (function_name) @call.fn (arguments) @call.args) @call
(comment) @comment
"#;

pub const HTML_QUERY: &str = r#"
(element) @element
(comment) @comment
"#;

pub const JSDOC_QUERY: &str = r#"
(document (description) @doc.description)
(tag) @tag
"#;
