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

//! Module script front end.
//!
//! Module scripts are the static description of a module: which sibling
//! modules it imports, under which guards, and which host components it
//! declares. The analyzers never evaluate a script; they only walk the tree
//! produced here.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{ComponentDef, FieldDef, FieldKind, Guard, Import, ImportKind, ImportedName, Item, ModuleImport, ModulePath, SourceFile};
pub use error::ParseError;
pub use parser::parse_source;
