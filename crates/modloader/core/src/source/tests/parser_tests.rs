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

use crate::source::parser::MAX_NESTING;
use crate::source::{FieldDef, FieldKind, Guard, Import, ImportKind, ImportedName, Item, ModuleImport, ModulePath, ParseError, parse_source};

fn segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

#[test]
fn test_parse_plain_import_with_alias() {
    let file = parse_source("import pkg.core.a as a, pkg.core.b;").unwrap();

    assert_eq!(
        file.items,
        vec![Item::Import(Import {
            line: 1,
            kind: ImportKind::Modules(vec![
                ModuleImport {
                    path: segments("pkg.core.a"),
                    alias: Some("a".to_string()),
                },
                ModuleImport {
                    path: segments("pkg.core.b"),
                    alias: None,
                },
            ]),
        })]
    );
}

#[test]
fn test_parse_relative_from_import() {
    let file = parse_source("from ..infra.log import get, Logger as L;").unwrap();

    match &file.items[0] {
        Item::Import(Import {
            kind: ImportKind::From { path, names },
            ..
        }) => {
            assert_eq!(
                *path,
                ModulePath {
                    level: 2,
                    segments: segments("infra.log"),
                }
            );
            assert_eq!(names[1], ImportedName { name: "Logger".to_string(), alias: Some("L".to_string()) });
            assert_eq!(names[1].binding(), "L");
        }
        other => panic!("expected from-import, got {:?}", other),
    }
}

#[test]
fn test_parse_bare_relative_import() {
    let file = parse_source("from . import (a, b,);").unwrap();

    match &file.items[0] {
        Item::Import(Import {
            kind: ImportKind::From { path, names },
            ..
        }) => {
            assert_eq!(path.level, 1);
            assert!(path.segments.is_empty());
            assert_eq!(names.len(), 2);
        }
        other => panic!("expected from-import, got {:?}", other),
    }
}

#[test]
fn test_parse_type_checking_guard() {
    let file = parse_source("if type_checking { import pkg.ui.c; } else { import pkg.ui.d; }").unwrap();

    match &file.items[0] {
        Item::Conditional {
            guard,
            then_branch,
            else_branch,
        } => {
            assert_eq!(*guard, Guard::TypeChecking);
            assert_eq!(then_branch.len(), 1);
            assert_eq!(else_branch.len(), 1);
        }
        other => panic!("expected conditional, got {:?}", other),
    }
}

#[test]
fn test_parse_ordinary_guard() {
    let file = parse_source("if (debug && TYPE_CHECKING) { import x.y; }").unwrap();

    assert!(matches!(file.items[0], Item::Conditional { guard: Guard::Expression, .. }));
}

#[test]
fn test_parse_function_body_keeps_imports() {
    let file = parse_source("fn setup(ctx, (a, b)) -> Result { import pkg.infra.log; log(\"ready\"); }").unwrap();

    match &file.items[0] {
        Item::Function { name, body } => {
            assert_eq!(name, "setup");
            assert!(matches!(body[0], Item::Import(_)));
            assert!(matches!(body[1], Item::Statement { .. }));
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn test_parse_component_fields() {
    let source = r#"
        component Settings : PropertyGroup {
            theme: pointer<Theme>;
            items: collection<pkg.core.b.Item>,
            label: string;
            tags: map<string, list<string>>;
        }
    "#;
    let file = parse_source(source).unwrap();

    match &file.items[0] {
        Item::Component(component) => {
            assert_eq!(component.name, "Settings");
            assert_eq!(component.line, 2);
            assert_eq!(
                component.fields,
                vec![
                    FieldDef {
                        name: "theme".to_string(),
                        kind: FieldKind::Pointer(segments("Theme")),
                    },
                    FieldDef {
                        name: "items".to_string(),
                        kind: FieldKind::Collection(segments("pkg.core.b.Item")),
                    },
                    FieldDef {
                        name: "label".to_string(),
                        kind: FieldKind::Value(segments("string")),
                    },
                    FieldDef {
                        name: "tags".to_string(),
                        kind: FieldKind::Value(segments("map")),
                    },
                ]
            );
        }
        other => panic!("expected component, got {:?}", other),
    }
}

#[test]
fn test_opaque_statements_expose_nested_blocks() {
    let file = parse_source("let x = 5;\nwhile ready { import pkg.core.a; }").unwrap();

    assert_eq!(file.items[0], Item::Statement { line: 1 });
    match &file.items[1] {
        Item::Block(items) => assert!(matches!(items[0], Item::Import(_))),
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn test_missing_semicolon_is_an_error() {
    let err = parse_source("import pkg.core.a\nimport pkg.core.b;").unwrap_err();

    assert!(matches!(err, ParseError::UnexpectedToken { expected: "';'", line: 2, .. }));
}

#[test]
fn test_unclosed_block_is_an_error() {
    let err = parse_source("fn f() { import a;").unwrap_err();

    assert_eq!(err, ParseError::UnexpectedEndOfInput { expected: "'}'" });
}

#[test]
fn test_stray_closing_brace_is_an_error() {
    let err = parse_source("import a;\n}").unwrap_err();

    assert_eq!(err, ParseError::UnmatchedBrace { line: 2, column: 1 });
}

#[test]
fn test_nesting_limit() {
    let at_limit = format!("{}{}", "{".repeat(MAX_NESTING), "}".repeat(MAX_NESTING));
    assert!(parse_source(&at_limit).is_ok());

    let too_deep = "{".repeat(MAX_NESTING + 1);
    let err = parse_source(&too_deep).unwrap_err();
    assert_eq!(err, ParseError::NestingTooDeep { line: 1, column: MAX_NESTING + 1 });
}

#[test]
fn test_long_else_if_chain_counts_as_nesting() {
    let chain = format!("if a {{ }}{}", " else if a { }".repeat(MAX_NESTING + 1));

    assert!(matches!(parse_source(&chain), Err(ParseError::NestingTooDeep { .. })));
}
