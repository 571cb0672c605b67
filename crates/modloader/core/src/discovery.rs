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

//! Module discovery.
//!
//! Walks the package tree one directory level at a time. Entries whose name
//! starts with `_` or `.` are private and skipped together with everything
//! below them. A directory is a package module when it holds a `mod.<ext>`
//! entry file; it is emitted after its own submodules.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ModulePatterns;

/// File stem of a package's own module body.
pub const PACKAGE_ENTRY_STEM: &str = "mod";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleState {
    Pending,
    Imported,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    /// Dotted name, prefixed with the package id
    pub name: String,
    /// Source file used for static analysis
    pub path: PathBuf,
    pub is_package: bool,
    pub state: ModuleState,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, is_package: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_package,
            state: ModuleState::Pending,
        }
    }

    pub fn is_imported(&self) -> bool {
        self.state == ModuleState::Imported
    }
}

pub struct ModuleDiscoverer<'a> {
    root: &'a Path,
    patterns: &'a ModulePatterns,
    extension: &'a str,
}

impl<'a> ModuleDiscoverer<'a> {
    pub fn new(root: &'a Path, patterns: &'a ModulePatterns, extension: &'a str) -> Self {
        Self { root, patterns, extension }
    }

    /// Every module under the root whose dotted name matches a pattern.
    pub fn discover(&self) -> Vec<ModuleDescriptor> {
        let mut found = Vec::new();
        self.scan(self.root, self.patterns.package_id(), &mut found);
        found
    }

    fn scan(&self, dir: &Path, package: &str, found: &mut Vec<ModuleDescriptor>) {
        let entries = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(category = "discover", "Skipping unreadable entry under {}: {}", dir.display(), err);
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy();
            if file_name.starts_with('_') || file_name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            if entry.file_type().is_dir() {
                if !is_module_segment(&file_name) {
                    continue;
                }
                let name = format!("{}.{}", package, file_name);
                self.scan(path, &name, found);

                let entry_file = path.join(format!("{}.{}", PACKAGE_ENTRY_STEM, self.extension));
                if entry_file.is_file() && self.patterns.is_match(&name) {
                    found.push(ModuleDescriptor::new(name, entry_file, true));
                }
            } else if path.extension().is_some_and(|ext| ext == self.extension) {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if stem == PACKAGE_ENTRY_STEM || !is_module_segment(stem) {
                    continue;
                }
                let name = format!("{}.{}", package, stem);
                if self.patterns.is_match(&name) {
                    found.push(ModuleDescriptor::new(name, path, false));
                }
            }
        }
    }
}

fn is_module_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('.') && !segment.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn discover(root: &Path, patterns: &[&str]) -> Vec<ModuleDescriptor> {
        let patterns = ModulePatterns::new("pkg", &patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>()).unwrap();
        ModuleDiscoverer::new(root, &patterns, "plug").discover()
    }

    fn names(found: &[ModuleDescriptor]) -> Vec<&str> {
        found.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_discovers_matching_modules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "core/a.plug");
        touch(dir.path(), "core/b.plug");
        touch(dir.path(), "ui/c.plug");
        touch(dir.path(), "infra/log.plug");

        let found = discover(dir.path(), &["core.*", "ui.*"]);

        assert_eq!(names(&found), vec!["pkg.core.a", "pkg.core.b", "pkg.ui.c"]);
        assert!(found.iter().all(|d| d.state == ModuleState::Pending && !d.is_package));
    }

    #[test]
    fn test_private_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "core/_private.plug");
        touch(dir.path(), "core/_hidden/x.plug");
        touch(dir.path(), "core/.cache/y.plug");
        touch(dir.path(), "core/visible.plug");

        assert_eq!(names(&discover(dir.path(), &["core.*"])), vec!["pkg.core.visible"]);
    }

    #[test]
    fn test_packages_follow_their_submodules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "core/mod.plug");
        touch(dir.path(), "core/sub/mod.plug");
        touch(dir.path(), "core/sub/leaf.plug");
        touch(dir.path(), "core/z.plug");

        let found = discover(dir.path(), &["core", "core.*"]);

        assert_eq!(names(&found), vec!["pkg.core.sub.leaf", "pkg.core.sub", "pkg.core.z", "pkg.core"]);
        assert!(found[1].is_package);
        assert!(found[1].path.ends_with("core/sub/mod.plug"));
    }

    #[test]
    fn test_other_extensions_and_dotted_stems_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "core/a.txt");
        touch(dir.path(), "core/a.b.plug");
        touch(dir.path(), "core/ok.plug");

        assert_eq!(names(&discover(dir.path(), &["core.*"])), vec!["pkg.core.ok"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();

        assert!(discover(&dir.path().join("missing"), &["*"]).is_empty());
    }
}
