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

//! Import extraction.

use serde::Serialize;
use std::collections::HashSet;

use crate::source::{Guard, Import, ImportKind, Item, ModulePath, SourceFile};

/// Why an import does not constrain load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deferral {
    /// Inside an `if type_checking` block
    TypeChecking,
    /// Inside a function body
    FunctionBody,
}

/// An import of another known module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRef {
    pub target: String,
    pub line: usize,
    pub deferral: Option<Deferral>,
}

impl ImportRef {
    pub fn constrains_load_order(&self) -> bool {
        self.deferral.is_none()
    }
}

/// Resolves a possibly relative module path from inside `module`.
///
/// A plain module anchors relative imports on its parent package, a package
/// module on itself. Each dot past the first climbs one more level. Returns
/// `None` when the climb leaves the root package.
pub fn resolve_module_path(module: &str, is_package: bool, path: &ModulePath) -> Option<String> {
    if !path.is_relative() {
        return (!path.segments.is_empty()).then(|| path.segments.join("."));
    }

    let mut base: Vec<&str> = module.split('.').collect();
    if !is_package {
        base.pop();
    }
    for _ in 1..path.level {
        base.pop();
    }
    if base.is_empty() {
        return None;
    }

    let mut resolved: Vec<&str> = base;
    resolved.extend(path.segments.iter().map(String::as_str));
    Some(resolved.join("."))
}

/// Walks a parsed module and collects imports that resolve to known modules.
pub struct ImportScanner<'a> {
    module: &'a str,
    is_package: bool,
    known: &'a HashSet<String>,
    in_type_checking: bool,
    in_function: bool,
    imports: Vec<ImportRef>,
}

impl<'a> ImportScanner<'a> {
    pub fn new(module: &'a str, is_package: bool, known: &'a HashSet<String>) -> Self {
        Self {
            module,
            is_package,
            known,
            in_type_checking: false,
            in_function: false,
            imports: Vec::new(),
        }
    }

    pub fn scan(mut self, file: &SourceFile) -> Vec<ImportRef> {
        self.visit_items(&file.items);
        self.imports
    }

    fn visit_items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Import(import) => self.visit_import(import),
                Item::Conditional { guard, then_branch, else_branch } => {
                    let saved = self.in_type_checking;
                    if *guard == Guard::TypeChecking {
                        self.in_type_checking = true;
                    }
                    self.visit_items(then_branch);
                    self.in_type_checking = saved;
                    self.visit_items(else_branch);
                }
                Item::Function { body, .. } => {
                    let saved = self.in_function;
                    self.in_function = true;
                    self.visit_items(body);
                    self.in_function = saved;
                }
                Item::Block(items) => self.visit_items(items),
                Item::Component(_) | Item::Statement { .. } => {}
            }
        }
    }

    fn visit_import(&mut self, import: &Import) {
        match &import.kind {
            ImportKind::Modules(modules) => {
                for module in modules {
                    self.record(module.path.join("."), import.line);
                }
            }
            ImportKind::From { path, names } => {
                let Some(base) = resolve_module_path(self.module, self.is_package, path) else {
                    return;
                };
                for name in names.iter().filter(|n| n.name != "*") {
                    self.record(format!("{}.{}", base, name.name), import.line);
                }
                self.record(base, import.line);
            }
        }
    }

    fn deferral(&self) -> Option<Deferral> {
        if self.in_function {
            Some(Deferral::FunctionBody)
        } else if self.in_type_checking {
            Some(Deferral::TypeChecking)
        } else {
            None
        }
    }

    fn record(&mut self, target: String, line: usize) {
        if target == self.module || !self.known.contains(&target) {
            return;
        }
        let deferral = self.deferral();
        if self.imports.iter().any(|i| i.target == target && i.deferral == deferral) {
            return;
        }
        self.imports.push(ImportRef { target, line, deferral });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_source;

    fn known(modules: &[&str]) -> HashSet<String> {
        modules.iter().map(|m| m.to_string()).collect()
    }

    fn scan(module: &str, is_package: bool, source: &str, modules: &[&str]) -> Vec<ImportRef> {
        let known = known(modules);
        let file = parse_source(source).unwrap();
        ImportScanner::new(module, is_package, &known).scan(&file)
    }

    fn path(level: usize, segments: &str) -> ModulePath {
        ModulePath {
            level,
            segments: segments.split('.').filter(|s| !s.is_empty()).map(str::to_string).collect(),
        }
    }

    #[test]
    fn test_relative_resolution_for_plain_module() {
        assert_eq!(resolve_module_path("pkg.core.b", false, &path(1, "a")), Some("pkg.core.a".to_string()));
        assert_eq!(resolve_module_path("pkg.core.b", false, &path(2, "ui.c")), Some("pkg.ui.c".to_string()));
        assert_eq!(resolve_module_path("pkg.core.b", false, &path(1, "")), Some("pkg.core".to_string()));
        assert_eq!(resolve_module_path("pkg.core.b", false, &path(3, "x")), None);
    }

    #[test]
    fn test_relative_resolution_for_package() {
        assert_eq!(resolve_module_path("pkg.core", true, &path(1, "a")), Some("pkg.core.a".to_string()));
        assert_eq!(resolve_module_path("pkg.core", true, &path(2, "ui")), Some("pkg.ui".to_string()));
    }

    #[test]
    fn test_top_level_imports_count() {
        let imports = scan("pkg.x", false, "import pkg.y;\nfrom .z import Thing;", &["pkg.x", "pkg.y", "pkg.z"]);

        assert_eq!(
            imports,
            vec![
                ImportRef { target: "pkg.y".to_string(), line: 1, deferral: None },
                ImportRef { target: "pkg.z".to_string(), line: 2, deferral: None },
            ]
        );
    }

    #[test]
    fn test_deferred_imports_are_tagged() {
        let source = r#"
            if type_checking { import pkg.y; } else { import pkg.w; }
            fn later() { if ready { import pkg.v; } }
        "#;
        let imports = scan("pkg.z", false, source, &["pkg.y", "pkg.w", "pkg.v"]);

        let deferrals: Vec<_> = imports.iter().map(|i| (i.target.as_str(), i.deferral)).collect();
        assert_eq!(
            deferrals,
            vec![("pkg.y", Some(Deferral::TypeChecking)), ("pkg.w", None), ("pkg.v", Some(Deferral::FunctionBody))]
        );
        assert!(!imports[0].constrains_load_order());
    }

    #[test]
    fn test_ordinary_conditionals_and_blocks_count() {
        let imports = scan("pkg.z", false, "if debug { import pkg.y; }\nwhile x { import pkg.w; }", &["pkg.y", "pkg.w"]);

        assert!(imports.iter().all(ImportRef::constrains_load_order));
        assert_eq!(imports.len(), 2);
    }

    #[test]
    fn test_from_package_import_submodule() {
        let imports = scan("pkg.ui.c", false, "from pkg.infra import log, helpers;", &["pkg.infra.log", "pkg.ui.c"]);

        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].target, "pkg.infra.log");
    }

    #[test]
    fn test_external_and_self_imports_are_ignored() {
        let imports = scan("pkg.a", false, "import os.path;\nfrom . import a;\nimport pkg.a;", &["pkg.a"]);

        assert!(imports.is_empty());
    }

    #[test]
    fn test_climbing_above_root_is_ignored() {
        let imports = scan("pkg.a", false, "from ...x import y;", &["pkg.a", "x"]);

        assert!(imports.is_empty());
    }
}
