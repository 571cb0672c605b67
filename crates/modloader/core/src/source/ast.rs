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

//! Syntax tree of a module script.
//!
//! Only the constructs that matter for load ordering are modelled precisely:
//! imports, the blocks that can hide them, and component declarations.
//! Everything else is kept as an opaque [`Item::Statement`].

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(Import),
    Conditional {
        guard: Guard,
        then_branch: Vec<Item>,
        else_branch: Vec<Item>,
    },
    Function {
        name: String,
        body: Vec<Item>,
    },
    Component(ComponentDef),
    Block(Vec<Item>),
    Statement {
        line: usize,
    },
}

/// Condition of an `if` block, as far as the analyzers care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// `if type_checking { .. }`: only evaluated by static tooling
    TypeChecking,
    Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub line: usize,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    /// `import a.b [as c], d;`
    Modules(Vec<ModuleImport>),
    /// `from ..a.b import X [as Y], Z;`
    From { path: ModulePath, names: Vec<ImportedName> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleImport {
    pub path: Vec<String>,
    pub alias: Option<String>,
}

/// A possibly relative dotted path. `level` counts the leading dots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModulePath {
    pub level: usize,
    pub segments: Vec<String>,
}

impl ModulePath {
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// The name this import binds in the importing module.
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// `pointer<T>`: one-to-one ownership link
    Pointer(Vec<String>),
    /// `collection<T>`: one-to-many ownership link
    Collection(Vec<String>),
    /// Any other type; never a link
    Value(Vec<String>),
}

impl FieldKind {
    /// Target type path when the field is an ownership link.
    pub fn link_target(&self) -> Option<&[String]> {
        match self {
            FieldKind::Pointer(path) | FieldKind::Collection(path) => Some(path),
            FieldKind::Value(_) => None,
        }
    }
}
