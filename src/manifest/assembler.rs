//! Canonical manifest assembly.
//!
//! Produces the published ordering: modules by path, declarations by name,
//! exports by `(kind, name)`, attributes/events/CSS collections by name, and
//! slots with the default slot first. Duplicate names within a collection are
//! unified: the first occurrence wins and later ones fill its gaps. Given the
//! same inputs the output is byte-identical.

use std::collections::HashMap;

use crate::manifest::types::{
    Attribute, ClassDeclaration, CssCustomProperty, CssCustomState, CssPart, Event, Module,
    Package, Slot,
};

/// Position lookup: module path → index in `Package::modules`.
#[derive(Debug, Default, Clone)]
pub struct ModuleIndex {
    positions: HashMap<String, usize>,
}

impl ModuleIndex {
    pub fn build(package: &Package) -> Self {
        let positions = package
            .modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.path.clone(), i))
            .collect();
        Self { positions }
    }

    pub fn get<'a>(&self, package: &'a Package, path: &str) -> Option<&'a Module> {
        self.positions.get(path).map(|&i| &package.modules[i])
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.positions.get(path).copied()
    }
}

/// Assemble modules into a canonical package plus its index.
pub fn assemble(mut modules: Vec<Module>) -> (Package, ModuleIndex) {
    for module in &mut modules {
        canonicalize_module(module);
    }
    modules.sort_by(|a, b| a.path.cmp(&b.path));
    modules.dedup_by(|a, b| a.path == b.path);

    let package = Package::new(modules);
    let index = ModuleIndex::build(&package);
    (package, index)
}

fn canonicalize_module(module: &mut Module) {
    module.declarations.sort_by(|a, b| a.name().cmp(b.name()));
    module
        .declarations
        .dedup_by(|a, b| a.name() == b.name());

    for declaration in &mut module.declarations {
        if let Some(class) = declaration.as_class_mut() {
            canonicalize_class(class);
        }
    }

    module
        .exports
        .sort_by(|a, b| (a.kind_str(), a.name()).cmp(&(b.kind_str(), b.name())));
    module
        .exports
        .dedup_by(|a, b| a.kind_str() == b.kind_str() && a.name() == b.name());
}

fn canonicalize_class(class: &mut ClassDeclaration) {
    class.attributes = unify_by_name(
        std::mem::take(&mut class.attributes),
        |a: &Attribute| a.name.clone(),
        Attribute::fill_from,
    );
    class.attributes.sort_by(|a, b| a.name.cmp(&b.name));

    class.slots = unify_by_name(
        std::mem::take(&mut class.slots),
        |s: &Slot| s.name.clone(),
        Slot::fill_from,
    );
    // Default slot (empty name) first, then by name.
    class.slots.sort_by(|a, b| a.name.cmp(&b.name));

    class.events = unify_by_name(
        std::mem::take(&mut class.events),
        |e: &Event| e.name.clone(),
        Event::fill_from,
    );
    class.events.sort_by(|a, b| a.name.cmp(&b.name));

    class.css_properties = unify_by_name(
        std::mem::take(&mut class.css_properties),
        |p: &CssCustomProperty| p.name.clone(),
        CssCustomProperty::fill_from,
    );
    class.css_properties.sort_by(|a, b| a.name.cmp(&b.name));

    class.css_parts = unify_by_name(
        std::mem::take(&mut class.css_parts),
        |p: &CssPart| p.name.clone(),
        CssPart::fill_from,
    );
    class.css_parts.sort_by(|a, b| a.name.cmp(&b.name));

    class.css_states = unify_by_name(
        std::mem::take(&mut class.css_states),
        |s: &CssCustomState| s.name.clone(),
        CssCustomState::fill_from,
    );
    class.css_states.sort_by(|a, b| a.name.cmp(&b.name));

    class.demos.sort_by(|a, b| a.url.cmp(&b.url));
    class.demos.dedup_by(|a, b| a.url == b.url);
}

/// Unify a collection by name: the first occurrence wins, later duplicates
/// fill the fields the first left empty (via the type's `fill_from`).
fn unify_by_name<T>(
    items: Vec<T>,
    name: impl Fn(&T) -> String,
    fill: impl Fn(&mut T, T),
) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let key = name(&item);
        match out.iter().position(|existing| name(existing) == key) {
            Some(i) => fill(&mut out[i], item),
            None => out.push(item),
        }
    }
    out
}
