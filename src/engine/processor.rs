//! Per-file module processing.
//!
//! Turns one source file into a partial [`Module`] plus its outgoing
//! dependency sets and local type symbols. Processing is pure over
//! `(bytes, query set)`: the same source always yields the same result, which
//! keeps it isolated for testing and safe to run on any worker.
//!
//! The compiled query finds the coarse constructs (imports, classes, defines,
//! aliases, templates, events); the detail inside each construct is read by
//! walking the captured nodes.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tree_sitter::{Node, QueryCursor, StreamingIterator};

use crate::engine::diagnostics::SourceDiagnostic;
use crate::engine::jsdoc::{self, JsDocBlock};
use crate::engine::query_pool::{LanguageKind, QueryPool, QuerySet};
use crate::engine::template;
use crate::manifest::types::{
    Attribute, ClassDeclaration, ClassField, ClassMethod, Declaration, Deprecated, Event, Export,
    FunctionDeclaration, Member, Module, Parameter, Privacy, Reference, ReturnType, Type,
    VariableDeclaration,
};
use crate::workspace::module_path::{self, is_css_specifier, resolve_import_path};

/// A `css` tagged template found in the module, keyed by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineStyle {
    pub offset: usize,
    pub text: String,
}

/// A type alias or enum usable by the type resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub name: String,
    pub module: String,
    /// Pipe-joined literal form for finite string/number literal unions.
    pub expansion: Option<String>,
}

/// Everything one source file contributes to a generation run.
#[derive(Debug, Default)]
pub struct ProcessedModule {
    pub module: Module,
    /// Local source files this module imports (absolute paths).
    pub dependencies: BTreeSet<PathBuf>,
    /// Imported stylesheets (absolute paths).
    pub css_dependencies: BTreeSet<PathBuf>,
    pub inline_styles: Vec<InlineStyle>,
    pub symbols: Vec<TypeSymbol>,
    pub diagnostics: Vec<SourceDiagnostic>,
}

/// Process one source file into a partial module.
///
/// Syntax errors produce a partial module plus a non-fatal diagnostic, never
/// a failure. Declaration-only files (`.d.ts` family) contribute dependency
/// edges but no declarations.
pub fn process_module(
    pool: &QueryPool,
    root: &Path,
    path: &Path,
    source: &str,
) -> ProcessedModule {
    let canonical = module_path::module_path(root, path);
    let mut result = ProcessedModule {
        module: Module::new(canonical.clone()),
        ..Default::default()
    };

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("ts");
    let kind = LanguageKind::for_source_file(extension);
    let set = pool.queries(kind);

    let tree = {
        let mut parser = pool.acquire(kind);
        match parser.parse(source, None) {
            Some(tree) => tree,
            None => {
                result
                    .diagnostics
                    .push(SourceDiagnostic::syntax_error(path, "parse returned no tree"));
                return result;
            }
        }
    };

    if tree.root_node().has_error() {
        result.diagnostics.push(SourceDiagnostic::syntax_error(
            path,
            "syntax errors; module content is partial",
        ));
    }

    let extractor = Extractor {
        pool,
        set,
        root,
        path,
        bytes: source.as_bytes(),
        module_path: canonical,
        declaration_file: is_declaration_file(path),
    };

    extractor.run(tree.root_node(), &mut result);
    result
}

fn is_declaration_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
}

/// How a local name was imported.
#[derive(Debug, Clone)]
struct ImportBinding {
    specifier: String,
}

struct Extractor<'a> {
    pool: &'a QueryPool,
    set: &'a QuerySet,
    root: &'a Path,
    path: &'a Path,
    bytes: &'a [u8],
    module_path: String,
    declaration_file: bool,
}

/// Raw query captures grouped per construct.
#[derive(Default)]
struct RawCaptures<'t> {
    import_sources: Vec<Node<'t>>,
    classes: Vec<(Node<'t>, Node<'t>)>,
    defines: Vec<(String, String)>,
    aliases: Vec<(Node<'t>, Node<'t>)>,
    enums: Vec<(Node<'t>, Node<'t>)>,
    templates: Vec<(Node<'t>, Node<'t>)>,
    events: Vec<(Node<'t>, Node<'t>)>,
}

impl<'a> Extractor<'a> {
    fn run(&self, program: Node<'a>, result: &mut ProcessedModule) {
        let captures = self.collect_captures(program);

        // Dependency edges come first: a declaration file keeps them even
        // though it contributes nothing else.
        let imports = self.collect_imports(&captures, result);
        if self.declaration_file {
            return;
        }

        for (alias_node, value_node) in &captures.aliases {
            result.symbols.push(TypeSymbol {
                name: self.text(*alias_node).to_string(),
                module: self.module_path.clone(),
                expansion: self.union_expansion(*value_node),
            });
        }
        for (name_node, enum_node) in &captures.enums {
            result.symbols.push(TypeSymbol {
                name: self.text(*name_node).to_string(),
                module: self.module_path.clone(),
                expansion: self.enum_expansion(*enum_node),
            });
        }

        for (tag_node, body_node) in &captures.templates {
            if self.text(*tag_node) == "css" {
                result.inline_styles.push(InlineStyle {
                    offset: body_node.start_byte(),
                    text: self.template_text(*body_node),
                });
            }
        }

        self.extract_module_docs(program, result);

        let mut classes: Vec<(Node<'a>, ClassDeclaration)> = Vec::new();
        for (class_node, name_node) in &captures.classes {
            let class = self.extract_class(*class_node, *name_node, &imports, &captures);
            classes.push((*class_node, class));
        }

        // customElements.define upgrades the named class and yields the
        // definition export.
        for (tag, class_name) in &captures.defines {
            if let Some((_, class)) = classes.iter_mut().find(|(_, c)| c.name == *class_name) {
                class.custom_element = true;
                if class.tag_name.is_none() {
                    class.tag_name = Some(tag.clone());
                }
            }
        }

        self.validate_attribute_bindings(&mut classes, result);

        for (class_node, class) in classes {
            if let Some(tag) = class.tag_name.clone() {
                result.module.exports.push(Export::definition(
                    tag,
                    Reference {
                        name: class.name.clone(),
                        module: Some(self.module_path.clone()),
                        ..Default::default()
                    },
                ));
            }
            if let Some(export_name) = self.exported_name(class_node, &class.name) {
                result.module.exports.push(Export::js(
                    export_name,
                    Reference {
                        name: class.name.clone(),
                        module: Some(self.module_path.clone()),
                        ..Default::default()
                    },
                ));
            }
            result.module.declarations.push(Declaration::Class(class));
        }

        self.extract_module_exports(program, result);
    }

    /// Module-level documentation from a leading `@module` /
    /// `@packageDocumentation` JSDoc block.
    fn extract_module_docs(&self, program: Node<'a>, result: &mut ProcessedModule) {
        let Some(first) = program.named_child(0) else {
            return;
        };
        if first.kind() != "comment" {
            return;
        }
        let text = self.text(first);
        if !jsdoc::is_jsdoc(text) {
            return;
        }

        let block = jsdoc::parse_block(self.pool, text);
        let is_module_doc = block
            .tags
            .iter()
            .any(|t| matches!(t.tag.as_str(), "module" | "packageDocumentation"));
        if !is_module_doc {
            return;
        }

        result.module.description = block.description.clone();
        if let Some(summary) = block.tag("summary")
            && !summary.is_empty()
        {
            result.module.summary = Some(summary.to_string());
        }
        result.module.deprecated = deprecated_from_block(&block);
    }

    fn collect_captures(&self, program: Node<'a>) -> RawCaptures<'a> {
        let mut captures = RawCaptures::default();

        let import_source = self.set.capture("import.source");
        let class = self.set.capture("class");
        let class_name = self.set.capture("class.name");
        let define_receiver = self.set.capture("define.receiver");
        let define_method = self.set.capture("define.method");
        let define_tag = self.set.capture("define.tag");
        let define_class = self.set.capture("define.class");
        let alias_name = self.set.capture("alias.name");
        let alias_value = self.set.capture("alias.value");
        let enum_name = self.set.capture("enum.name");
        let enum_node = self.set.capture("enum");
        let template_tag = self.set.capture("template.tag");
        let template_body = self.set.capture("template.body");
        let event_ctor = self.set.capture("event.ctor");
        let event_name = self.set.capture("event.name");

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.set.query, program, self.bytes);
        while let Some(m) = matches.next() {
            let node_for = |index: Option<u32>| {
                m.captures
                    .iter()
                    .find(|c| Some(c.index) == index)
                    .map(|c| c.node)
            };

            if let Some(node) = node_for(import_source) {
                captures.import_sources.push(node);
            }
            if let (Some(class_node), Some(name_node)) = (node_for(class), node_for(class_name)) {
                captures.classes.push((class_node, name_node));
            }
            if let (Some(receiver), Some(method), Some(tag), Some(target)) = (
                node_for(define_receiver),
                node_for(define_method),
                node_for(define_tag),
                node_for(define_class),
            ) && self.text(receiver) == "customElements"
                && self.text(method) == "define"
            {
                captures
                    .defines
                    .push((self.text(tag).to_string(), self.text(target).to_string()));
            }
            if let (Some(name), Some(value)) = (node_for(alias_name), node_for(alias_value)) {
                captures.aliases.push((name, value));
            }
            if let (Some(name), Some(node)) = (node_for(enum_name), node_for(enum_node)) {
                captures.enums.push((name, node));
            }
            if let (Some(tag), Some(body)) = (node_for(template_tag), node_for(template_body)) {
                captures.templates.push((tag, body));
            }
            if let (Some(ctor), Some(name)) = (node_for(event_ctor), node_for(event_name)) {
                captures.events.push((ctor, name));
            }
        }

        captures
    }

    // ============================================================
    // Imports and dependency edges
    // ============================================================

    /// Record dependency edges and build the local-name → specifier map used
    /// for superclass package attribution.
    fn collect_imports(
        &self,
        captures: &RawCaptures<'a>,
        result: &mut ProcessedModule,
    ) -> HashMap<String, ImportBinding> {
        let mut bindings = HashMap::new();

        for source_node in &captures.import_sources {
            let specifier = self.text(*source_node).to_string();

            if is_css_specifier(&specifier) {
                if let Some(resolved) = resolve_import_path(self.path, &specifier) {
                    result.css_dependencies.insert(resolved);
                }
            } else if let Some(resolved) = resolve_import_path(self.path, &specifier) {
                result.dependencies.insert(resolved);
            }

            // The statement is the grandparent: string_fragment → string →
            // import_statement / export_statement.
            let Some(statement) = source_node.parent().and_then(|s| s.parent()) else {
                continue;
            };
            if statement.kind() != "import_statement" {
                continue;
            }
            for local in self.import_locals(statement) {
                bindings.insert(
                    local,
                    ImportBinding {
                        specifier: specifier.clone(),
                    },
                );
            }
        }

        bindings
    }

    /// Local names bound by one import statement (default, named, namespace).
    fn import_locals(&self, statement: Node<'a>) -> Vec<String> {
        let mut locals = Vec::new();
        let mut cursor = statement.walk();
        for child in statement.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for binding in child.named_children(&mut clause_cursor) {
                match binding.kind() {
                    "identifier" => locals.push(self.text(binding).to_string()),
                    "namespace_import" => {
                        if let Some(name) = binding
                            .named_children(&mut binding.walk())
                            .find(|n| n.kind() == "identifier")
                        {
                            locals.push(self.text(name).to_string());
                        }
                    }
                    "named_imports" => {
                        let mut specifier_cursor = binding.walk();
                        for specifier in binding.named_children(&mut specifier_cursor) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let local = specifier
                                .child_by_field_name("alias")
                                .or_else(|| specifier.child_by_field_name("name"));
                            if let Some(local) = local {
                                locals.push(self.text(local).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        locals
    }

    // ============================================================
    // Classes
    // ============================================================

    fn extract_class(
        &self,
        class_node: Node<'a>,
        name_node: Node<'a>,
        imports: &HashMap<String, ImportBinding>,
        captures: &RawCaptures<'a>,
    ) -> ClassDeclaration {
        let mut class = ClassDeclaration {
            name: self.text(name_node).to_string(),
            ..Default::default()
        };

        class.superclass = self.superclass(class_node, imports);

        if let Some(tag) = self.custom_element_decorator(class_node) {
            class.custom_element = true;
            class.tag_name = Some(tag);
        }

        if let Some(body) = class_node.child_by_field_name("body") {
            self.extract_members(body, &mut class);
        }

        // Events dispatched inside this class body.
        for (ctor, name) in &captures.events {
            if matches!(self.text(*ctor), "CustomEvent" | "Event")
                && self.enclosing_class(*ctor) == Some(class_node.id())
            {
                let event_name = self.text(*name).to_string();
                if !class.events.iter().any(|e| e.name == event_name) {
                    class.events.push(Event {
                        name: event_name,
                        type_: Some(Type::new(self.text(*ctor))),
                        ..Default::default()
                    });
                }
            }
        }

        // Render-template slots and parts.
        for (tag, body) in &captures.templates {
            if self.text(*tag) == "html" && self.enclosing_class(*tag) == Some(class_node.id()) {
                let docs = template::analyze_template(self.pool, &self.template_text(*body));
                class.slots.extend(docs.slots);
                class.css_parts.extend(docs.parts);
            }
        }

        // JSDoc last: extracted data wins, the block fills the gaps.
        if let Some(block) = self.jsdoc_for_class(class_node) {
            jsdoc::apply_class_tags(&mut class, &block);
        }

        bind_declared_attributes(&mut class);

        class
    }

    fn superclass(
        &self,
        class_node: Node<'a>,
        imports: &HashMap<String, ImportBinding>,
    ) -> Option<Reference> {
        let heritage = class_node
            .named_children(&mut class_node.walk())
            .find(|c| c.kind() == "class_heritage")?;

        // TS wraps the superclass in an extends_clause; JS puts the
        // expression directly under class_heritage.
        let value = heritage
            .named_children(&mut heritage.walk())
            .find(|c| c.kind() == "extends_clause")
            .and_then(|clause| clause.child_by_field_name("value"))
            .or_else(|| {
                heritage
                    .named_children(&mut heritage.walk())
                    .find(|c| matches!(c.kind(), "identifier" | "member_expression"))
            })?;

        let name = self.text(value).to_string();
        if name.is_empty() {
            return None;
        }

        let binding = imports.get(&name);
        Some(Reference {
            name,
            package: binding.and_then(|b| {
                (!b.specifier.starts_with('.')).then(|| b.specifier.clone())
            }),
            module: None,
        })
    }

    /// Tag name from a `@customElement('tag')` decorator on the class or its
    /// wrapping export statement.
    fn custom_element_decorator(&self, class_node: Node<'a>) -> Option<String> {
        let decorated_nodes = [Some(class_node), class_node.parent()];
        for node in decorated_nodes.into_iter().flatten() {
            if node.kind() != "export_statement"
                && node.id() != class_node.id()
            {
                continue;
            }
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "decorator" {
                    continue;
                }
                if let Some((name, arguments)) = self.decorator_call(child)
                    && name == "customElement"
                    && let Some(tag) = self.first_string_argument(arguments)
                {
                    return Some(tag);
                }
            }
        }
        None
    }

    /// `(decorator (call_expression ...))` → (function name, arguments node).
    fn decorator_call(&self, decorator: Node<'a>) -> Option<(String, Node<'a>)> {
        let call = decorator
            .named_children(&mut decorator.walk())
            .find(|c| c.kind() == "call_expression")?;
        let function = call.child_by_field_name("function")?;
        let arguments = call.child_by_field_name("arguments")?;
        Some((self.text(function).to_string(), arguments))
    }

    fn first_string_argument(&self, arguments: Node<'a>) -> Option<String> {
        let string = arguments
            .named_children(&mut arguments.walk())
            .find(|c| c.kind() == "string")?;
        let fragment = string
            .named_children(&mut string.walk())
            .find(|c| c.kind() == "string_fragment")?;
        Some(self.text(fragment).to_string())
    }

    // ============================================================
    // Members
    // ============================================================

    fn extract_members(&self, body: Node<'a>, class: &mut ClassDeclaration) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                // TS names it public_field_definition, JS field_definition.
                "public_field_definition" | "field_definition" => {
                    self.extract_field(member, class);
                }
                "method_definition" => self.extract_method(member, class),
                _ => {}
            }
        }
    }

    fn extract_field(&self, node: Node<'a>, class: &mut ClassDeclaration) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();

        let mut field = ClassField {
            name: name.clone(),
            type_: self.annotation_type(node),
            default: node
                .child_by_field_name("value")
                .map(|v| self.text(v).to_string()),
            privacy: self.member_privacy(node, name_node),
            static_: self.has_marker(node, "static"),
            ..Default::default()
        };

        let block = self.jsdoc_for_member(node);
        if let Some(block) = &block {
            apply_member_docs(&mut field.description, &mut field.summary, block);
            if field.deprecated.is_none() {
                field.deprecated = deprecated_from_block(block);
            }
            if field.privacy.is_none() && (block.tag("internal").is_some() || block.tag("private").is_some()) {
                field.privacy = Some(Privacy::Private);
            }
        }

        let attribute = self.attribute_for_field(node, &field, block.as_ref());

        if class.field(&name).is_none() {
            class.members.push(Member::Field(field));
        }
        if let Some(attribute) = attribute {
            class.attributes.push(attribute);
        }
    }

    /// Derive the attribute for a field carrying a `@property` decorator or a
    /// JSDoc `@attr`. The decorator wins; JSDoc fills gaps.
    fn attribute_for_field(
        &self,
        node: Node<'a>,
        field: &ClassField,
        block: Option<&JsDocBlock>,
    ) -> Option<Attribute> {
        let mut from_decorator = None;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            let Some((decorator_name, arguments)) = self.decorator_call(child) else {
                // Bare `@property` without a call still maps the attribute.
                let text = self.text(child);
                if text == "@property" {
                    from_decorator = Some(PropertyOptions::default());
                }
                continue;
            };
            match decorator_name.as_str() {
                "property" => {
                    from_decorator = Some(self.property_options(arguments));
                }
                // Internal reactive state never reflects to an attribute.
                "state" => return None,
                _ => {}
            }
        }

        let jsdoc_attr = block.and_then(|b| b.tag("attr").or_else(|| b.tag("attribute")));

        let options = match (&from_decorator, jsdoc_attr) {
            (None, None) => return None,
            (Some(options), _) if options.attribute_disabled => return None,
            (Some(options), _) => options.clone(),
            (None, Some(_)) => PropertyOptions::default(),
        };

        let boolean = options.boolean_type
            || field
                .type_
                .as_ref()
                .is_some_and(|t| t.text.eq_ignore_ascii_case("boolean"));

        let mut attribute = Attribute {
            name: options
                .attribute_name
                .clone()
                .unwrap_or_else(|| field.name.to_lowercase()),
            type_: if boolean {
                Some(Type::new("boolean"))
            } else {
                field.type_.clone()
            },
            default: field.default.clone(),
            field_name: Some(field.name.clone()),
            ..Default::default()
        };

        // JSDoc @attr fills whatever the decorator and the field left open.
        if let Some(payload) = jsdoc_attr {
            let parsed = jsdoc::parse_payload(payload);
            // Without a decorator, the tag may name the attribute itself.
            if from_decorator.is_none()
                && let Some(name) = parsed.name
            {
                attribute.name = name;
            }
            if attribute.description.is_none() {
                attribute.description = parsed.description;
            }
            if attribute.default.is_none() {
                attribute.default = parsed.default;
            }
            if attribute.type_.is_none() {
                attribute.type_ = parsed.type_text.map(Type::new);
            }
        }

        Some(attribute)
    }

    /// Options of a `@property({...})` decorator.
    fn property_options(&self, arguments: Node<'a>) -> PropertyOptions {
        let mut options = PropertyOptions::default();

        let Some(object) = arguments
            .named_children(&mut arguments.walk())
            .find(|c| c.kind() == "object")
        else {
            return options;
        };

        let mut cursor = object.walk();
        for pair in object.named_children(&mut cursor) {
            if pair.kind() != "pair" {
                continue;
            }
            let (Some(key), Some(value)) = (
                pair.child_by_field_name("key"),
                pair.child_by_field_name("value"),
            ) else {
                continue;
            };
            match self.text(key) {
                "attribute" => match value.kind() {
                    "false" => options.attribute_disabled = true,
                    "string" => {
                        options.attribute_name = value
                            .named_children(&mut value.walk())
                            .find(|c| c.kind() == "string_fragment")
                            .map(|f| self.text(f).to_string());
                    }
                    _ => {}
                },
                "type" => {
                    if self.text(value) == "Boolean" {
                        options.boolean_type = true;
                    }
                }
                "state" => {
                    if value.kind() == "true" {
                        options.attribute_disabled = true;
                    }
                }
                _ => {}
            }
        }

        options
    }

    fn extract_method(&self, node: Node<'a>, class: &mut ClassDeclaration) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();
        if name == "constructor" {
            return;
        }

        let privacy = self.member_privacy(node, name_node);
        let static_ = self.has_marker(node, "static");
        let block = self.jsdoc_for_member(node);

        // The undecorated `extends HTMLElement` style declares attributes
        // through a static observedAttributes getter.
        if static_ && name == "observedAttributes" && self.has_marker(node, "get") {
            for attribute in self.observed_attributes(node) {
                if !class.attributes.iter().any(|a| a.name == attribute) {
                    class.attributes.push(Attribute {
                        name: attribute,
                        ..Default::default()
                    });
                }
            }
            return;
        }

        // Accessor pairs surface as a single field.
        if self.has_marker(node, "get") || self.has_marker(node, "set") {
            if class.field(&name).is_some() {
                return;
            }
            let type_ = self
                .annotation_type(node)
                .or_else(|| self.first_parameter_type(node));
            let mut field = ClassField {
                name,
                type_,
                privacy,
                static_,
                ..Default::default()
            };
            if let Some(block) = &block {
                apply_member_docs(&mut field.description, &mut field.summary, block);
                field.deprecated = deprecated_from_block(block);
            }
            class.members.push(Member::Field(field));
            return;
        }

        let mut method = ClassMethod {
            name,
            privacy,
            static_,
            parameters: self.parameters(node),
            return_type: self.annotation_type(node).map(|type_| ReturnType {
                type_: Some(type_),
                description: None,
            }),
            ..Default::default()
        };
        if let Some(block) = &block {
            apply_member_docs(&mut method.description, &mut method.summary, block);
            method.deprecated = deprecated_from_block(block);
        }

        if !class.members.iter().any(|m| m.name() == method.name) {
            class.members.push(Member::Method(method));
        }
    }

    /// String literals returned by `static get observedAttributes()`.
    fn observed_attributes(&self, method: Node<'a>) -> Vec<String> {
        let Some(body) = method.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut names = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            if node.kind() == "array" {
                let mut cursor = node.walk();
                for element in node.named_children(&mut cursor) {
                    if element.kind() == "string"
                        && let Some(fragment) = element
                            .named_children(&mut element.walk())
                            .find(|c| c.kind() == "string_fragment")
                    {
                        names.push(self.text(fragment).to_string());
                    }
                }
                continue;
            }
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                stack.push(child);
            }
        }
        names
    }

    fn member_privacy(&self, node: Node<'a>, name_node: Node<'a>) -> Option<Privacy> {
        if name_node.kind() == "private_property_identifier" {
            return Some(Privacy::Private);
        }
        let modifier = node
            .named_children(&mut node.walk())
            .find(|c| c.kind() == "accessibility_modifier")?;
        match self.text(modifier) {
            "private" => Some(Privacy::Private),
            "protected" => Some(Privacy::Protected),
            _ => None,
        }
    }

    fn has_marker(&self, node: Node<'a>, marker: &str) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() && self.text(child) == marker {
                return true;
            }
        }
        false
    }

    /// The `: T` annotation on a field, method return, or parameter.
    fn annotation_type(&self, node: Node<'a>) -> Option<Type> {
        let annotation = node
            .child_by_field_name("type")
            .or_else(|| node.child_by_field_name("return_type"))?;
        let text = self
            .text(annotation)
            .trim_start_matches(':')
            .trim()
            .to_string();
        (!text.is_empty()).then(|| Type::new(text))
    }

    fn first_parameter_type(&self, node: Node<'a>) -> Option<Type> {
        let parameters = node.child_by_field_name("parameters")?;
        let first = parameters
            .named_children(&mut parameters.walk())
            .find(|c| matches!(c.kind(), "required_parameter" | "optional_parameter"));
        self.annotation_type(first?)
    }

    fn parameters(&self, node: Node<'a>) -> Vec<Parameter> {
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "required_parameter" | "optional_parameter" => {
                    let Some(pattern) = child.child_by_field_name("pattern") else {
                        continue;
                    };
                    parameters.push(Parameter {
                        name: self.text(pattern).to_string(),
                        type_: self.annotation_type(child),
                        default: child
                            .child_by_field_name("value")
                            .map(|v| self.text(v).to_string()),
                        optional: child.kind() == "optional_parameter",
                        ..Default::default()
                    });
                }
                "identifier" => parameters.push(Parameter {
                    name: self.text(child).to_string(),
                    ..Default::default()
                }),
                "assignment_pattern" => {
                    let Some(left) = child.child_by_field_name("left") else {
                        continue;
                    };
                    parameters.push(Parameter {
                        name: self.text(left).to_string(),
                        default: child
                            .child_by_field_name("right")
                            .map(|v| self.text(v).to_string()),
                        ..Default::default()
                    });
                }
                _ => {}
            }
        }
        parameters
    }

    // ============================================================
    // Module-level exports, functions, variables
    // ============================================================

    fn extract_module_exports(&self, program: Node<'a>, result: &mut ProcessedModule) {
        let mut cursor = program.walk();
        for statement in program.named_children(&mut cursor) {
            if statement.kind() != "export_statement" {
                continue;
            }

            // Re-export edges were already collected via the query; the
            // export entries themselves point into the source module.
            let source_module = statement
                .child_by_field_name("source")
                .and_then(|s| {
                    s.named_children(&mut s.walk())
                        .find(|c| c.kind() == "string_fragment")
                })
                .and_then(|fragment| {
                    resolve_import_path(self.path, self.text(fragment))
                        .map(|p| module_path::module_path(self.root, &p))
                });

            // export { A, B as C } [from './x']
            let mut clause_cursor = statement.walk();
            for child in statement.named_children(&mut clause_cursor) {
                if child.kind() != "export_clause" {
                    continue;
                }
                let mut specifier_cursor = child.walk();
                for specifier in child.named_children(&mut specifier_cursor) {
                    if specifier.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(name) = specifier.child_by_field_name("name") else {
                        continue;
                    };
                    let exported = specifier
                        .child_by_field_name("alias")
                        .unwrap_or(name);
                    result.module.exports.push(Export::js(
                        self.text(exported),
                        Reference {
                            name: self.text(name).to_string(),
                            module: Some(
                                source_module
                                    .clone()
                                    .unwrap_or_else(|| self.module_path.clone()),
                            ),
                            ..Default::default()
                        },
                    ));
                }
            }

            // export function f() {} / export const x = ...
            let Some(declaration) = statement.child_by_field_name("declaration") else {
                continue;
            };
            match declaration.kind() {
                "function_declaration" => {
                    if let Some(function) = self.extract_function(declaration) {
                        result.module.exports.push(Export::js(
                            function.name.clone(),
                            Reference {
                                name: function.name.clone(),
                                module: Some(self.module_path.clone()),
                                ..Default::default()
                            },
                        ));
                        result
                            .module
                            .declarations
                            .push(Declaration::Function(function));
                    }
                }
                "lexical_declaration" | "variable_declaration" => {
                    for variable in self.extract_variables(declaration) {
                        result.module.exports.push(Export::js(
                            variable.name.clone(),
                            Reference {
                                name: variable.name.clone(),
                                module: Some(self.module_path.clone()),
                                ..Default::default()
                            },
                        ));
                        result
                            .module
                            .declarations
                            .push(Declaration::Variable(variable));
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_function(&self, node: Node<'a>) -> Option<FunctionDeclaration> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let mut function = FunctionDeclaration {
            name,
            parameters: self.parameters(node),
            return_type: self.annotation_type(node).map(|type_| ReturnType {
                type_: Some(type_),
                description: None,
            }),
            ..Default::default()
        };
        if let Some(block) = self.jsdoc_for_member(node).or_else(|| {
            node.parent()
                .filter(|p| p.kind() == "export_statement")
                .and_then(|p| self.jsdoc_for_member(p))
        }) {
            function.description = block.description.clone();
            function.deprecated = deprecated_from_block(&block);
        }
        Some(function)
    }

    fn extract_variables(&self, node: Node<'a>) -> Vec<VariableDeclaration> {
        let mut variables = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "identifier" {
                continue;
            }
            variables.push(VariableDeclaration {
                name: self.text(name).to_string(),
                type_: self.annotation_type(declarator),
                default: declarator
                    .child_by_field_name("value")
                    .map(|v| self.text(v).to_string()),
                ..Default::default()
            });
        }
        variables
    }

    /// The exported name of a class, if it is exported: its own name, or
    /// `default` for default exports.
    fn exported_name(&self, class_node: Node<'a>, class_name: &str) -> Option<String> {
        let parent = class_node.parent()?;
        if parent.kind() != "export_statement" {
            return None;
        }
        let is_default = parent
            .children(&mut parent.walk())
            .any(|c| !c.is_named() && self.text(c) == "default");
        Some(if is_default {
            "default".to_string()
        } else {
            class_name.to_string()
        })
    }

    // ============================================================
    // Type symbols
    // ============================================================

    /// `'a' | 'b' | 'c'` for a finite string/number literal union.
    fn union_expansion(&self, value: Node<'a>) -> Option<String> {
        if value.kind() != "union_type" {
            return None;
        }
        let mut literals = Vec::new();
        if self.collect_union_literals(value, &mut literals) {
            Some(literals.join(" | "))
        } else {
            None
        }
    }

    fn collect_union_literals(&self, node: Node<'a>, out: &mut Vec<String>) -> bool {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "union_type" => {
                    if !self.collect_union_literals(child, out) {
                        return false;
                    }
                }
                "literal_type" => {
                    let Some(literal) = child.named_children(&mut child.walk()).next() else {
                        return false;
                    };
                    if !matches!(literal.kind(), "string" | "number") {
                        return false;
                    }
                    out.push(self.text(literal).to_string());
                }
                _ => return false,
            }
        }
        true
    }

    /// Literal form for enums whose members all carry string or number
    /// initializers.
    fn enum_expansion(&self, enum_node: Node<'a>) -> Option<String> {
        let body = enum_node.child_by_field_name("body")?;
        let mut literals = Vec::new();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != "enum_assignment" {
                return None;
            }
            let value = member.child_by_field_name("value")?;
            if !matches!(value.kind(), "string" | "number") {
                return None;
            }
            literals.push(self.text(value).to_string());
        }
        (!literals.is_empty()).then(|| literals.join(" | "))
    }

    // ============================================================
    // Shared helpers
    // ============================================================

    fn text(&self, node: Node<'a>) -> &'a str {
        node.utf8_text(self.bytes).unwrap_or("")
    }

    /// Template content without the enclosing backticks.
    fn template_text(&self, body: Node<'a>) -> String {
        self.text(body)
            .trim_start_matches('`')
            .trim_end_matches('`')
            .to_string()
    }

    /// Nearest enclosing class node id, for associating templates and events.
    fn enclosing_class(&self, node: Node<'a>) -> Option<usize> {
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if matches!(
                ancestor.kind(),
                "class_declaration" | "abstract_class_declaration" | "class"
            ) {
                return Some(ancestor.id());
            }
            current = ancestor.parent();
        }
        None
    }

    /// JSDoc block for a class: the comment right before the class node, or
    /// before its wrapping export statement.
    fn jsdoc_for_class(&self, class_node: Node<'a>) -> Option<JsDocBlock> {
        self.jsdoc_for_member(class_node).or_else(|| {
            class_node
                .parent()
                .filter(|p| p.kind() == "export_statement")
                .and_then(|p| self.jsdoc_for_member(p))
        })
    }

    /// JSDoc block attached directly before a node. Module-level blocks
    /// (`@module`, `@packageDocumentation`) document the file, never the
    /// declaration that happens to follow them.
    fn jsdoc_for_member(&self, node: Node<'a>) -> Option<JsDocBlock> {
        let sibling = node.prev_named_sibling()?;
        if sibling.kind() != "comment" {
            return None;
        }
        let text = self.text(sibling);
        if !jsdoc::is_jsdoc(text) {
            return None;
        }
        let block = jsdoc::parse_block(self.pool, text);
        let module_doc = block
            .tags
            .iter()
            .any(|t| matches!(t.tag.as_str(), "module" | "packageDocumentation"));
        if module_doc {
            return None;
        }
        Some(block)
    }

    /// Attribute/field binding invariant: an attribute's `fieldName` must
    /// name an existing field member.
    fn validate_attribute_bindings(
        &self,
        classes: &mut Vec<(Node<'a>, ClassDeclaration)>,
        result: &mut ProcessedModule,
    ) {
        for (_, class) in classes {
            let mut broken = Vec::new();
            for attribute in &class.attributes {
                if let Some(field_name) = &attribute.field_name
                    && class.field(field_name).is_none()
                {
                    broken.push(attribute.name.clone());
                }
            }
            for name in broken {
                result.diagnostics.push(SourceDiagnostic::inconsistency(
                    self.path,
                    format!(
                        "attribute '{}' on '{}' names a missing field; binding dropped",
                        name, class.name
                    ),
                ));
                if let Some(attribute) =
                    class.attributes.iter_mut().find(|a| a.name == name)
                {
                    attribute.field_name = None;
                }
            }
        }
    }
}

/// `@property({...})` decorator options that matter for attributes.
#[derive(Debug, Clone, Default)]
struct PropertyOptions {
    attribute_name: Option<String>,
    attribute_disabled: bool,
    boolean_type: bool,
}

fn apply_member_docs(
    description: &mut Option<String>,
    summary: &mut Option<String>,
    block: &JsDocBlock,
) {
    if description.is_none() {
        *description = block.description.clone();
    }
    if summary.is_none()
        && let Some(text) = block.tag("summary")
        && !text.is_empty()
    {
        *summary = Some(text.to_string());
    }
}

/// Bind JSDoc-declared attributes to same-named fields (exact match first,
/// then the lowercased reflection Lit uses).
fn bind_declared_attributes(class: &mut ClassDeclaration) {
    let field_names: Vec<String> = class
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Field(f) => Some(f.name.clone()),
            _ => None,
        })
        .collect();

    for attribute in &mut class.attributes {
        if attribute.field_name.is_some() {
            continue;
        }
        attribute.field_name = field_names
            .iter()
            .find(|f| **f == attribute.name || f.to_lowercase() == attribute.name)
            .cloned();
    }
}

fn deprecated_from_block(block: &JsDocBlock) -> Option<Deprecated> {
    let payload = block.tag("deprecated")?;
    Some(if payload.is_empty() {
        Deprecated::Flag(true)
    } else {
        Deprecated::Reason(payload.to_string())
    })
}
