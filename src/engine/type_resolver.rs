//! Workspace-local type resolution.
//!
//! A single fixed-point pass over every type annotation in the collected
//! modules. A type whose text exactly matches a declared alias or enum gets a
//! back-reference `{name, module}`, and finite string/number literal unions
//! expand to their pipe-joined literal form. Unresolvable names are left
//! untouched; resolution never recurses through type parameters.

use std::collections::HashMap;

use crate::engine::processor::TypeSymbol;
use crate::manifest::types::{Declaration, Member, Module, Type, TypeReference};

/// Resolve type references across all modules in place.
///
/// Idempotent: an already-expanded type no longer matches any symbol name,
/// and existing references are never re-attached.
pub fn resolve_types(modules: &mut [Module], symbols: &[TypeSymbol]) {
    let mut table: HashMap<&str, &TypeSymbol> = HashMap::new();
    for symbol in symbols {
        // First declaration wins; symbols arrive in deterministic module
        // order, so duplicates resolve stably.
        table.entry(symbol.name.as_str()).or_insert(symbol);
    }

    if table.is_empty() {
        return;
    }

    for module in modules {
        for_each_type(module, |type_| {
            if !type_.references.is_empty() {
                return;
            }
            let Some(symbol) = table.get(type_.text.as_str()) else {
                return;
            };
            type_.references.push(TypeReference {
                name: symbol.name.clone(),
                module: Some(symbol.module.clone()),
                package: None,
            });
            if let Some(expansion) = &symbol.expansion {
                type_.text = expansion.clone();
            }
        });
    }
}

/// Visit every type slot in a module.
fn for_each_type(module: &mut Module, mut visit: impl FnMut(&mut Type)) {
    for declaration in &mut module.declarations {
        match declaration {
            Declaration::Class(class) => {
                for member in &mut class.members {
                    match member {
                        Member::Field(field) => {
                            if let Some(type_) = &mut field.type_ {
                                visit(type_);
                            }
                        }
                        Member::Method(method) => {
                            for parameter in &mut method.parameters {
                                if let Some(type_) = &mut parameter.type_ {
                                    visit(type_);
                                }
                            }
                            if let Some(return_type) = &mut method.return_type
                                && let Some(type_) = &mut return_type.type_
                            {
                                visit(type_);
                            }
                        }
                    }
                }
                for attribute in &mut class.attributes {
                    if let Some(type_) = &mut attribute.type_ {
                        visit(type_);
                    }
                }
                for event in &mut class.events {
                    if let Some(type_) = &mut event.type_ {
                        visit(type_);
                    }
                }
            }
            Declaration::Function(function) => {
                for parameter in &mut function.parameters {
                    if let Some(type_) = &mut parameter.type_ {
                        visit(type_);
                    }
                }
                if let Some(return_type) = &mut function.return_type
                    && let Some(type_) = &mut return_type.type_
                {
                    visit(type_);
                }
            }
            Declaration::Variable(variable) => {
                if let Some(type_) = &mut variable.type_ {
                    visit(type_);
                }
            }
        }
    }
}
