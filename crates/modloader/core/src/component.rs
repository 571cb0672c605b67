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

//! Host-registrable component declarations and their registration order.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Identity of a component: owning module plus declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentId {
    pub module: String,
    pub name: String,
}

impl ComponentId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Kind of ownership link a field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    /// One-to-one
    Pointer,
    /// One-to-many
    Collection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentReference {
    pub field: String,
    pub target: ComponentId,
    pub kind: LinkKind,
}

/// One registrable unit owned by a module.
///
/// `references` only ever names components inside the loader scope. Links to
/// host or external types are dropped when the declaration is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDeclaration {
    pub id: ComponentId,
    pub references: Vec<ComponentReference>,
}

impl ComponentDeclaration {
    pub fn new(id: ComponentId) -> Self {
        Self { id, references: Vec::new() }
    }

    pub fn with_reference(mut self, field: impl Into<String>, target: ComponentId, kind: LinkKind) -> Self {
        self.references.push(ComponentReference {
            field: field.into(),
            target,
            kind,
        });
        self
    }

    pub fn module(&self) -> &str {
        &self.id.module
    }

    /// Modules other than the owner that this component links to.
    pub fn foreign_modules(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.target.module.as_str()).filter(move |m| *m != self.id.module)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular component dependency: {}", format_chain(.chain))]
pub struct ComponentCycleError {
    /// Starts and ends with the same component
    pub chain: Vec<ComponentId>,
}

fn format_chain(chain: &[ComponentId]) -> String {
    chain.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Components ordered so that every link target precedes the component
/// holding the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationOrder {
    components: Vec<ComponentDeclaration>,
}

impl RegistrationOrder {
    /// Orders `declarations` depth-first, following references before the
    /// referencing component. Duplicate ids keep their first declaration.
    /// References to components outside `declarations` are ignored.
    pub fn build(declarations: &[ComponentDeclaration]) -> Result<Self, ComponentCycleError> {
        let mut unique: Vec<&ComponentDeclaration> = Vec::with_capacity(declarations.len());
        let mut index: HashMap<&ComponentId, usize> = HashMap::new();
        for declaration in declarations {
            if !index.contains_key(&declaration.id) {
                index.insert(&declaration.id, unique.len());
                unique.push(declaration);
            }
        }

        let mut marks: Vec<Option<Mark>> = vec![None; unique.len()];
        let mut ordered: Vec<usize> = Vec::with_capacity(unique.len());

        for start in 0..unique.len() {
            visit(start, &unique, &index, &mut marks, &mut ordered)?;
        }

        Ok(Self {
            components: ordered.into_iter().map(|i| unique[i].clone()).collect(),
        })
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ComponentDeclaration> {
        self.components.iter()
    }

    pub fn ids(&self) -> Vec<&ComponentId> {
        self.components.iter().map(|c| &c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Iterative depth-first walk from `start`; `path` holds each open component
/// with the index of its next reference.
fn visit(
    start: usize,
    declarations: &[&ComponentDeclaration],
    index: &HashMap<&ComponentId, usize>,
    marks: &mut [Option<Mark>],
    ordered: &mut Vec<usize>,
) -> Result<(), ComponentCycleError> {
    if marks[start].is_some() {
        return Ok(());
    }
    marks[start] = Some(Mark::InProgress);
    let mut path: Vec<(usize, usize)> = vec![(start, 0)];

    while let Some(frame) = path.last_mut() {
        let node = frame.0;
        let reference = declarations[node].references.get(frame.1);
        frame.1 += 1;

        let Some(reference) = reference else {
            path.pop();
            marks[node] = Some(Mark::Done);
            ordered.push(node);
            continue;
        };
        let Some(&target) = index.get(&reference.target) else {
            continue;
        };

        match marks[target] {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                let first = path.iter().position(|&(i, _)| i == target).unwrap_or(0);
                let mut chain: Vec<ComponentId> = path[first..].iter().map(|&(i, _)| declarations[i].id.clone()).collect();
                chain.push(declarations[target].id.clone());
                return Err(ComponentCycleError { chain });
            }
            None => {
                marks[target] = Some(Mark::InProgress);
                path.push((target, 0));
            }
        }
    }
    Ok(())
}
