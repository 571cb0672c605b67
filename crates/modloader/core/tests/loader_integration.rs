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

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use modloader_core::{
    ComponentDeclaration, ComponentHost, ComponentId, HeadlessHost, HookError, HostError, ImportError, ImportRequest, Loader, LoaderConfig, LoaderError, LoaderState, Module,
    ModuleCatalog, ModuleImporter, ReloadError, Stage,
};

type Log = Rc<RefCell<Vec<String>>>;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Package root named `addon`, so module names start with `addon.`.
fn package(files: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("addon");
    fs::create_dir(&root).unwrap();
    for (relative, text) in files {
        write(&root, relative, text);
    }
    (dir, root)
}

fn loader(root: &Path, patterns: &[&str]) -> Loader {
    Loader::new(LoaderConfig::new(root).with_patterns(patterns.iter().copied()))
}

#[derive(Default)]
struct RecordingHost {
    events: Vec<String>,
    reject: Vec<String>,
    fail_unregister: bool,
}

impl ComponentHost for RecordingHost {
    fn register_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError> {
        if self.reject.contains(&component.id.name) {
            return Err(HostError::new(format!("{} rejected", component.id.name)));
        }
        self.events.push(format!("+{}", component.id.name));
        Ok(())
    }

    fn unregister_component(&mut self, component: &ComponentDeclaration) -> Result<(), HostError> {
        if self.fail_unregister {
            return Err(HostError::new(format!("{} still in use", component.id.name)));
        }
        self.events.push(format!("-{}", component.id.name));
        Ok(())
    }
}

struct HookModule {
    name: String,
    log: Log,
    components: Vec<ComponentDeclaration>,
}

impl Module for HookModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_register(&self) -> bool {
        true
    }

    fn has_unregister(&self) -> bool {
        true
    }

    fn register(&mut self) -> Result<(), HookError> {
        self.log.borrow_mut().push(format!("register {}", self.name));
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), HookError> {
        self.log.borrow_mut().push(format!("unregister {}", self.name));
        Ok(())
    }

    fn components(&self) -> Vec<ComponentDeclaration> {
        self.components.clone()
    }
}

fn hook_catalog(modules: &[&str], log: &Log) -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    for module in modules {
        let log = log.clone();
        catalog.provide(*module, move |request: &ImportRequest<'_>| {
            Ok(Box::new(HookModule {
                name: request.name().to_string(),
                log: log.clone(),
                components: request.source.map(|s| s.components.clone()).unwrap_or_default(),
            }) as Box<dyn Module>)
        });
    }
    catalog
}

/// Counts imports and reloads, delegating to a script catalog.
#[derive(Default)]
struct CountingImporter {
    catalog: ModuleCatalog,
    imports: Vec<String>,
    reloads: Vec<String>,
}

impl ModuleImporter for CountingImporter {
    fn import(&mut self, request: &ImportRequest<'_>) -> Result<Box<dyn Module>, ImportError> {
        self.imports.push(request.name().to_string());
        self.catalog.import(request)
    }

    fn reload(&mut self, request: &ImportRequest<'_>, previous: Box<dyn Module>) -> Result<Box<dyn Module>, ReloadError> {
        self.reloads.push(previous.name().to_string());
        self.catalog.reload(request, previous)
    }
}

#[test]
fn test_end_to_end_load_order() {
    let (_dir, root) = package(&[
        ("ui/c.plug", "import addon.core.b;"),
        ("core/b.plug", "from .a import Base;"),
        ("core/a.plug", "component Base { }"),
        ("infra/log.plug", ""),
    ]);
    let mut loader = loader(&root, &["core.*", "ui.*"]);

    let report = loader.init(&mut ModuleCatalog::new()).unwrap();

    assert_eq!(report.package_id, "addon");
    assert_eq!(report.order, vec!["addon.core.a", "addon.core.b", "addon.ui.c"]);
    assert_eq!(report.modules_found, 3);
    assert!(!report.used_fallback());
    assert_eq!(loader.loaded_modules(), report.order.as_slice());
    assert!(loader.descriptors().iter().all(|d| d.is_imported()));
}

#[test]
fn test_deferred_imports_create_no_edges() {
    let (_dir, root) = package(&[
        ("x.plug", "import addon.y;"),
        ("y.plug", ""),
        ("z.plug", "fn f() { import addon.y; }\nif type_checking { import addon.x; }"),
    ]);
    let mut loader = loader(&root, &["*"]);

    loader.init(&mut ModuleCatalog::new()).unwrap();

    assert_eq!(loader.graph().dependencies("addon.x"), vec!["addon.y"]);
    assert!(loader.graph().dependencies("addon.z").is_empty());
    assert_eq!(loader.graph().edge_count(), 1);
}

#[test]
fn test_failing_module_does_not_abort_init() {
    let (_dir, root) = package(&[("a.plug", ""), ("b.plug", "import addon.a;"), ("c.plug", "import addon.b;")]);
    let mut catalog = ModuleCatalog::new();
    catalog.provide("addon.b", |request: &ImportRequest<'_>| {
        Err(ImportError::Initialization {
            module: request.name().to_string(),
            reason: "raised during import".to_string(),
        })
    });
    let mut loader = loader(&root, &["*"]);

    let report = loader.init(&mut catalog).unwrap();

    assert_eq!(report.load.loaded, vec!["addon.a", "addon.c"]);
    assert_eq!(report.load.failed(), 1);
    assert_eq!(report.load.failures[0].subject, "addon.b");
    assert_eq!(report.load.failures[0].stage, Stage::Import);
    assert_eq!(loader.state(), LoaderState::Ready);
}

#[test]
fn test_unparsable_module_is_a_leaf_and_fails_to_import() {
    let (_dir, root) = package(&[("a.plug", "import addon.b"), ("b.plug", "")]);
    let mut loader = loader(&root, &["*"]);

    let report = loader.init(&mut ModuleCatalog::new()).unwrap();

    assert_eq!(report.parse_failures.len(), 1);
    assert_eq!(report.parse_failures[0].subject, "addon.a");
    assert_eq!(report.edges.len(), 0);
    assert_eq!(report.load.loaded, vec!["addon.b"]);
    assert_eq!(report.load.failures[0].subject, "addon.a");
}

#[test]
fn test_teardown_runs_in_reverse_order() {
    let (_dir, root) = package(&[
        ("a.plug", "component A { }"),
        ("b.plug", "import addon.a;\ncomponent B { a: pointer<addon.a.A>; }"),
        ("c.plug", "import addon.b;\ncomponent C { }"),
    ]);
    let log = Log::default();
    let mut catalog = hook_catalog(&["addon.a", "addon.b", "addon.c"], &log);
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);

    loader.init(&mut catalog).unwrap();
    let registered = loader.register(&mut host).unwrap();
    let unregistered = loader.teardown(&mut host);

    assert_eq!(registered.components, 3);
    assert_eq!(registered.hooks, 3);
    assert_eq!(unregistered.hooks, 3);
    assert_eq!(
        *log.borrow(),
        vec!["register addon.a", "register addon.b", "register addon.c", "unregister addon.c", "unregister addon.b", "unregister addon.a"]
    );
    assert_eq!(host.events, vec!["+A", "+B", "+C", "-C", "-B", "-A"]);
    assert_eq!(loader.state(), LoaderState::Uninitialized);
    assert!(loader.loaded_modules().is_empty());
}

#[test]
fn test_init_is_idempotent() {
    let (_dir, root) = package(&[("a.plug", ""), ("b.plug", "import addon.a;")]);
    let mut importer = CountingImporter::default();
    let mut loader = loader(&root, &["*"]);

    let first = loader.init(&mut importer).unwrap();
    write(&root, "c.plug", "");
    let second = loader.init(&mut importer).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.order, vec!["addon.a", "addon.b"]);
    assert_eq!(importer.imports, vec!["addon.a", "addon.b"]);
}

#[test]
fn test_module_cycle_falls_back_to_tiers() {
    let (_dir, root) = package(&[
        ("ui/panel.plug", "import addon.core.state;"),
        ("core/state.plug", "import addon.ui.panel;"),
        ("menus/main.plug", ""),
    ]);
    let mut loader = loader(&root, &["*"]);

    let report = loader.init(&mut ModuleCatalog::new()).unwrap();

    assert!(report.used_fallback());
    let cycle = report.cycle.as_ref().unwrap();
    assert_eq!(cycle.cycles.len(), 1);
    assert!(cycle.cycles[0].contains(&"addon.core.state".to_string()));
    assert!(cycle.cycles[0].contains(&"addon.ui.panel".to_string()));
    assert_eq!(report.order, vec!["addon.core.state", "addon.menus.main", "addon.ui.panel"]);
    assert_eq!(report.load.succeeded(), 3);
}

#[test]
fn test_component_cycle_stops_registration() {
    let (_dir, root) = package(&[
        ("a.plug", "component A { b: pointer<addon.b.B>; }"),
        ("b.plug", "from .a import A;\ncomponent B { a: collection<A>; }"),
    ]);
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut ModuleCatalog::new()).unwrap();

    let err = loader.register(&mut host).unwrap_err();

    match err {
        LoaderError::CircularDependency(cycle) => {
            assert_eq!(cycle.chain.first(), cycle.chain.last());
            assert_eq!(cycle.chain.len(), 3);
        }
        other => panic!("expected a component cycle, got {other}"),
    }
    assert!(host.events.is_empty());
    assert_eq!(loader.state(), LoaderState::Ready);
}

#[test]
fn test_rejected_component_is_isolated() {
    let (_dir, root) = package(&[("a.plug", "component A { }\ncomponent Bad { }\ncomponent Z { }")]);
    let mut host = RecordingHost {
        reject: vec!["Bad".to_string()],
        ..RecordingHost::default()
    };
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut ModuleCatalog::new()).unwrap();

    let report = loader.register(&mut host).unwrap();
    assert_eq!(report.components, 2);
    assert_eq!(report.failures[0].stage, Stage::RegisterComponent);

    loader.unregister(&mut host);
    assert_eq!(host.events, vec!["+A", "+Z", "-Z", "-A"]);
}

#[test]
fn test_components_are_registered_once() {
    let (_dir, root) = package(&[("a.plug", "component Shared { }"), ("b.plug", "")]);
    let shared = ComponentDeclaration::new(ComponentId::new("addon.a", "Shared"));
    let mut catalog = ModuleCatalog::new();
    catalog.provide("addon.b", move |request: &ImportRequest<'_>| {
        Ok(Box::new(HookModule {
            name: request.name().to_string(),
            log: Log::default(),
            components: vec![shared.clone()],
        }) as Box<dyn Module>)
    });
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut catalog).unwrap();

    loader.register(&mut host).unwrap();

    assert_eq!(host.events, vec!["+Shared"]);
}

#[test]
fn test_reload_replaces_registrations() {
    let (_dir, root) = package(&[("a.plug", "component A { }"), ("b.plug", "")]);
    let mut importer = CountingImporter::default();
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut importer).unwrap();
    loader.register(&mut host).unwrap();

    write(&root, "b.plug", "component B { }");
    let report = loader.reload(&mut importer, &mut host).unwrap();

    assert_eq!(report.init.load.reloaded, vec!["addon.a", "addon.b"]);
    assert_eq!(importer.reloads, vec!["addon.a", "addon.b"]);
    assert_eq!(report.unregistered.as_ref().map(|r| r.components), Some(1));
    assert_eq!(report.registered.as_ref().map(|r| r.components), Some(2));
    assert_eq!(report.failed(), 0);
    assert_eq!(host.events, vec!["+A", "-A", "+A", "+B"]);
    assert_eq!(loader.state(), LoaderState::Registered);
}

#[test]
fn test_reload_reports_host_failures() {
    let (_dir, root) = package(&[("a.plug", "component A { }
component C { }")]);
    let mut importer = CountingImporter::default();
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut importer).unwrap();
    loader.register(&mut host).unwrap();

    write(&root, "a.plug", "component A { }\ncomponent B { }");
    host.reject = vec!["B".to_string()];
    host.fail_unregister = true;
    let report = loader.reload(&mut importer, &mut host).unwrap();

    let unregistered = report.unregistered.as_ref().unwrap();
    assert_eq!(unregistered.failures.len(), 2);
    assert!(unregistered.failures.iter().all(|f| f.stage == Stage::UnregisterComponent));
    let registered = report.registered.as_ref().unwrap();
    assert_eq!(registered.components, 1);
    assert_eq!(registered.failures[0].subject, "addon.a.B");
    assert_eq!(report.failed(), 3);
}

#[test]
fn test_reload_without_registration_reports_no_host_calls() {
    let (_dir, root) = package(&[("a.plug", "component A { }")]);
    let mut importer = CountingImporter::default();
    let mut host = RecordingHost::default();
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut importer).unwrap();

    let report = loader.reload(&mut importer, &mut host).unwrap();

    assert!(report.unregistered.is_none() && report.registered.is_none());
    assert!(host.events.is_empty());
    assert_eq!(loader.state(), LoaderState::Ready);
}

#[test]
fn test_headless_host_is_never_called() {
    let (_dir, root) = package(&[("a.plug", "component A { }")]);
    let mut loader = loader(&root, &["*"]);
    loader.init(&mut ModuleCatalog::new()).unwrap();

    let report = loader.register(&mut HeadlessHost).unwrap();

    assert!(report.skipped_headless);
    assert_eq!(report.components, 0);
    assert!(loader.registered_components().is_empty());
}
