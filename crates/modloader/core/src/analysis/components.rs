// Modloader
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Component reflection.
//!
//! Component declarations are read from parsed sources once per init. Link
//! fields are resolved against the names each module binds, so a reference
//! only survives when it lands on a component owned by a known module.

use std::collections::{HashMap, HashSet};

use super::imports::resolve_module_path;
use crate::component::{ComponentDeclaration, ComponentId, ComponentReference, LinkKind};
use crate::source::{ComponentDef, FieldKind, ImportKind, Item, SourceFile};

/// Upper bound on re-export chains followed while resolving a type.
const MAX_REEXPORT_HOPS: usize = 8;

/// Names bound at module level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScope {
    /// Components declared by the module, in source order
    pub components: Vec<String>,
    /// `from` import bindings: local name to absolute dotted path
    pub bindings: HashMap<String, String>,
    /// `import` bindings: alias or first path segment to module path
    pub aliases: HashMap<String, String>,
}

impl ModuleScope {
    pub fn collect(module: &str, is_package: bool, file: &SourceFile) -> Self {
        let mut scope = Self::default();
        scope.visit(module, is_package, &file.items);
        scope
    }

    pub fn declares(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }

    fn visit(&mut self, module: &str, is_package: bool, items: &[Item]) {
        for item in items {
            match item {
                Item::Component(component) => {
                    if !self.declares(&component.name) {
                        self.components.push(component.name.clone());
                    }
                }
                Item::Import(import) => match &import.kind {
                    ImportKind::Modules(modules) => {
                        for imported in modules {
                            match &imported.alias {
                                Some(alias) => {
                                    self.aliases.insert(alias.clone(), imported.path.join("."));
                                }
                                None => {
                                    if let Some(head) = imported.path.first() {
                                        self.aliases.entry(head.clone()).or_insert_with(|| head.clone());
                                    }
                                }
                            }
                        }
                    }
                    ImportKind::From { path, names } => {
                        if let Some(base) = resolve_module_path(module, is_package, path) {
                            for name in names.iter().filter(|n| n.name != "*") {
                                self.bindings.insert(name.binding().to_string(), format!("{}.{}", base, name.name));
                            }
                        }
                    }
                },
                Item::Conditional { then_branch, else_branch, .. } => {
                    self.visit(module, is_package, then_branch);
                    self.visit(module, is_package, else_branch);
                }
                Item::Block(items) => self.visit(module, is_package, items),
                // function locals never reach module scope
                Item::Function { .. } | Item::Statement { .. } => {}
            }
        }
    }
}

/// Resolves link field types to component identities.
pub struct TypeResolver<'a> {
    scopes: &'a HashMap<String, ModuleScope>,
    known: &'a HashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(scopes: &'a HashMap<String, ModuleScope>, known: &'a HashSet<String>) -> Self {
        Self { scopes, known }
    }

    /// Resolves `path` as written inside `module`.
    ///
    /// Tries a component declared in the same module, then a `from` import
    /// binding, then a dotted path whose prefix is a module or an import
    /// alias. Returns `None` for host and external types.
    pub fn resolve(&self, module: &str, path: &[String]) -> Option<ComponentId> {
        let scope = self.scopes.get(module)?;

        let qualified = match path {
            [] => return None,
            [name] => {
                if scope.declares(name) {
                    return Some(ComponentId::new(module, name.as_str()));
                }
                scope.bindings.get(name)?.clone()
            }
            [head, rest @ ..] => {
                let head = scope.aliases.get(head).or_else(|| scope.bindings.get(head)).unwrap_or(head);
                format!("{}.{}", head, rest.join("."))
            }
        };

        self.component_at(&qualified).map(|id| self.canonicalize(id))
    }

    fn component_at(&self, qualified: &str) -> Option<ComponentId> {
        let (owner, name) = qualified.rsplit_once('.')?;
        if !self.known.contains(owner) || self.known.contains(qualified) {
            return None;
        }
        Some(ComponentId::new(owner, name))
    }

    /// Follows re-exports until reaching the module that declares the
    /// component.
    fn canonicalize(&self, mut id: ComponentId) -> ComponentId {
        for _ in 0..MAX_REEXPORT_HOPS {
            let Some(scope) = self.scopes.get(&id.module) else {
                break;
            };
            if scope.declares(&id.name) {
                break;
            }
            match scope.bindings.get(&id.name).and_then(|target| self.component_at(target)) {
                Some(next) => id = next,
                None => break,
            }
        }
        id
    }
}

/// Component declarations of one module with resolved references.
pub fn collect_declarations(module: &str, file: &SourceFile, resolver: &TypeResolver<'_>) -> Vec<ComponentDeclaration> {
    let mut declarations = Vec::new();
    visit_components(&file.items, &mut |component: &ComponentDef| {
        if declarations.iter().any(|d: &ComponentDeclaration| d.id.name == component.name) {
            return;
        }
        declarations.push(declaration(module, component, resolver));
    });
    declarations
}

fn declaration(module: &str, component: &ComponentDef, resolver: &TypeResolver<'_>) -> ComponentDeclaration {
    let references = component
        .fields
        .iter()
        .filter_map(|field| {
            let kind = match field.kind {
                FieldKind::Pointer(_) => LinkKind::Pointer,
                FieldKind::Collection(_) => LinkKind::Collection,
                FieldKind::Value(_) => return None,
            };
            let target = resolver.resolve(module, field.kind.link_target()?)?;
            Some(ComponentReference {
                field: field.name.clone(),
                target,
                kind,
            })
        })
        .collect();

    ComponentDeclaration {
        id: ComponentId::new(module, component.name.as_str()),
        references,
    }
}

fn visit_components(items: &[Item], f: &mut dyn FnMut(&ComponentDef)) {
    for item in items {
        match item {
            Item::Component(component) => f(component),
            Item::Conditional { then_branch, else_branch, .. } => {
                visit_components(then_branch, f);
                visit_components(else_branch, f);
            }
            Item::Block(items) => visit_components(items, f),
            Item::Import(_) | Item::Function { .. } | Item::Statement { .. } => {}
        }
    }
}
