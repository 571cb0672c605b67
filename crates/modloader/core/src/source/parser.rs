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

//! Recursive-descent parser for module scripts.

use super::ast::{ComponentDef, FieldDef, FieldKind, Guard, Import, ImportKind, ImportedName, Item, ModuleImport, ModulePath, SourceFile};
use super::error::ParseError;
use super::lexer::{Spanned, Token, tokenize};

/// Deepest block nesting accepted, counting `else if` links as one level.
pub const MAX_NESTING: usize = 256;

/// Tokenizes and parses a whole module script.
pub fn parse_source(input: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(input)?;
    parse(&tokens)
}

pub fn parse(tokens: &[Spanned]) -> Result<SourceFile, ParseError> {
    let mut current = 0;
    let mut items = Vec::new();
    loop {
        match peek(tokens, current) {
            Token::EOF => break,
            Token::RightBrace => {
                let (line, column) = position(tokens, current);
                return Err(ParseError::UnmatchedBrace { line, column });
            }
            _ => items.push(parse_item(tokens, &mut current, 0)?),
        }
    }
    Ok(SourceFile { items })
}

/// `depth` is the number of blocks enclosing the item.
fn parse_item(tokens: &[Spanned], current: &mut usize, depth: usize) -> Result<Item, ParseError> {
    match peek(tokens, *current) {
        Token::Import => parse_import(tokens, current),
        Token::From => parse_from_import(tokens, current),
        Token::If => parse_conditional(tokens, current, depth),
        Token::Fn => parse_function(tokens, current, depth),
        Token::Component => parse_component(tokens, current),
        Token::LeftBrace => {
            *current += 1;
            Ok(Item::Block(parse_block(tokens, current, depth + 1)?))
        }
        _ => parse_statement(tokens, current, depth),
    }
}

/// Parses items up to and including the closing brace. The opening brace
/// must already be consumed; `depth` counts it.
fn parse_block(tokens: &[Spanned], current: &mut usize, depth: usize) -> Result<Vec<Item>, ParseError> {
    if depth > MAX_NESTING {
        let (line, column) = position(tokens, current.saturating_sub(1));
        return Err(ParseError::NestingTooDeep { line, column });
    }
    let mut items = Vec::new();
    loop {
        match peek(tokens, *current) {
            Token::RightBrace => {
                *current += 1;
                return Ok(items);
            }
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "'}'" }),
            _ => items.push(parse_item(tokens, current, depth)?),
        }
    }
}

fn parse_import(tokens: &[Spanned], current: &mut usize) -> Result<Item, ParseError> {
    let (line, _) = position(tokens, *current);
    *current += 1;

    let mut modules = Vec::new();
    loop {
        let path = parse_dotted(tokens, current, "module path")?;
        let alias = parse_alias(tokens, current)?;
        modules.push(ModuleImport { path, alias });
        if *peek(tokens, *current) == Token::Comma {
            *current += 1;
            continue;
        }
        break;
    }
    expect(tokens, current, &Token::Semicolon, "';'")?;

    Ok(Item::Import(Import {
        line,
        kind: ImportKind::Modules(modules),
    }))
}

fn parse_from_import(tokens: &[Spanned], current: &mut usize) -> Result<Item, ParseError> {
    let (line, _) = position(tokens, *current);
    *current += 1;

    let mut level = 0;
    while *peek(tokens, *current) == Token::Dot {
        level += 1;
        *current += 1;
    }
    // `from . import x` has no segments after the dots
    let segments = if level > 0 && *peek(tokens, *current) == Token::Import {
        Vec::new()
    } else {
        parse_dotted(tokens, current, "module path")?
    };
    expect(tokens, current, &Token::Import, "'import'")?;

    let mut names = Vec::new();
    if *peek(tokens, *current) == Token::Star {
        *current += 1;
        names.push(ImportedName { name: "*".to_string(), alias: None });
    } else {
        let parenthesized = *peek(tokens, *current) == Token::LeftParen;
        if parenthesized {
            *current += 1;
        }
        loop {
            let name = expect_identifier(tokens, current, "imported name")?;
            let alias = parse_alias(tokens, current)?;
            names.push(ImportedName { name, alias });
            if *peek(tokens, *current) == Token::Comma {
                *current += 1;
                if parenthesized && *peek(tokens, *current) == Token::RightParen {
                    break;
                }
                continue;
            }
            break;
        }
        if parenthesized {
            expect(tokens, current, &Token::RightParen, "')'")?;
        }
    }
    expect(tokens, current, &Token::Semicolon, "';'")?;

    Ok(Item::Import(Import {
        line,
        kind: ImportKind::From {
            path: ModulePath { level, segments },
            names,
        },
    }))
}

fn parse_conditional(tokens: &[Spanned], current: &mut usize, depth: usize) -> Result<Item, ParseError> {
    *current += 1;

    let start = *current;
    let mut depth = 0usize;
    loop {
        match peek(tokens, *current) {
            Token::LeftBrace if depth == 0 => break,
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "'{'" }),
            Token::Semicolon | Token::RightBrace if depth == 0 => return Err(unexpected(tokens, *current, "'{'")),
            _ => {}
        }
        *current += 1;
    }

    let guard = match &tokens[start..*current] {
        [] => return Err(unexpected(tokens, *current, "condition")),
        [Spanned { token: Token::Identifier(name), .. }] if is_type_checking_flag(name) => Guard::TypeChecking,
        _ => Guard::Expression,
    };

    *current += 1;
    let then_branch = parse_block(tokens, current, depth + 1)?;

    let else_branch = if *peek(tokens, *current) == Token::Else {
        *current += 1;
        match peek(tokens, *current) {
            Token::If => vec![parse_conditional(tokens, current, depth + 1)?],
            Token::LeftBrace => {
                *current += 1;
                parse_block(tokens, current, depth + 1)?
            }
            _ => return Err(unexpected(tokens, *current, "'{' or 'if'")),
        }
    } else {
        Vec::new()
    };

    Ok(Item::Conditional {
        guard,
        then_branch,
        else_branch,
    })
}

fn is_type_checking_flag(name: &str) -> bool {
    name == "type_checking" || name == "TYPE_CHECKING"
}

fn parse_function(tokens: &[Spanned], current: &mut usize, depth: usize) -> Result<Item, ParseError> {
    *current += 1;
    let name = expect_identifier(tokens, current, "function name")?;
    expect(tokens, current, &Token::LeftParen, "'('")?;
    skip_parameters(tokens, current)?;

    // Return type annotations are skipped up to the body.
    loop {
        match peek(tokens, *current) {
            Token::LeftBrace => break,
            Token::Semicolon => {
                *current += 1;
                return Ok(Item::Function { name, body: Vec::new() });
            }
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "function body" }),
            Token::RightBrace => return Err(unexpected(tokens, *current, "function body")),
            _ => *current += 1,
        }
    }
    *current += 1;
    let body = parse_block(tokens, current, depth + 1)?;

    Ok(Item::Function { name, body })
}

fn skip_parameters(tokens: &[Spanned], current: &mut usize) -> Result<(), ParseError> {
    let mut depth = 1usize;
    loop {
        match peek(tokens, *current) {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    *current += 1;
                    return Ok(());
                }
            }
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "')'" }),
            _ => {}
        }
        *current += 1;
    }
}

fn parse_component(tokens: &[Spanned], current: &mut usize) -> Result<Item, ParseError> {
    let (line, _) = position(tokens, *current);
    *current += 1;
    let name = expect_identifier(tokens, current, "component name")?;

    // The host base type is informational only.
    if *peek(tokens, *current) == Token::Colon {
        *current += 1;
        parse_dotted(tokens, current, "base type")?;
    }
    expect(tokens, current, &Token::LeftBrace, "'{'")?;

    let mut fields = Vec::new();
    loop {
        match peek(tokens, *current) {
            Token::RightBrace => {
                *current += 1;
                break;
            }
            Token::Semicolon | Token::Comma => *current += 1,
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "'}'" }),
            _ => fields.push(parse_field(tokens, current)?),
        }
    }

    Ok(Item::Component(ComponentDef { name, fields, line }))
}

fn parse_field(tokens: &[Spanned], current: &mut usize) -> Result<FieldDef, ParseError> {
    let name = expect_identifier(tokens, current, "field name")?;
    expect(tokens, current, &Token::Colon, "':'")?;
    let path = parse_dotted(tokens, current, "field type")?;

    if *peek(tokens, *current) != Token::LeftAngle {
        return Ok(FieldDef { name, kind: FieldKind::Value(path) });
    }
    *current += 1;

    let is_pointer = match path.as_slice() {
        [kind] if kind == "pointer" => Some(true),
        [kind] if kind == "collection" => Some(false),
        _ => None,
    };
    let kind = match is_pointer {
        Some(pointer) => {
            let target = parse_dotted(tokens, current, "component type")?;
            expect(tokens, current, &Token::RightAngle, "'>'")?;
            if pointer { FieldKind::Pointer(target) } else { FieldKind::Collection(target) }
        }
        None => {
            skip_type_arguments(tokens, current)?;
            FieldKind::Value(path)
        }
    };

    Ok(FieldDef { name, kind })
}

fn skip_type_arguments(tokens: &[Spanned], current: &mut usize) -> Result<(), ParseError> {
    let mut depth = 1usize;
    loop {
        match peek(tokens, *current) {
            Token::LeftAngle => depth += 1,
            Token::RightAngle => {
                depth -= 1;
                if depth == 0 {
                    *current += 1;
                    return Ok(());
                }
            }
            Token::EOF => return Err(ParseError::UnexpectedEndOfInput { expected: "'>'" }),
            _ => {}
        }
        *current += 1;
    }
}

/// Consumes an opaque statement. A brace block inside it is parsed as items
/// so that imports nested in loops or plain blocks stay visible.
fn parse_statement(tokens: &[Spanned], current: &mut usize, depth: usize) -> Result<Item, ParseError> {
    let (line, _) = position(tokens, *current);
    loop {
        match peek(tokens, *current) {
            Token::Semicolon => {
                *current += 1;
                return Ok(Item::Statement { line });
            }
            Token::LeftBrace => {
                *current += 1;
                let items = parse_block(tokens, current, depth + 1)?;
                if *peek(tokens, *current) == Token::Semicolon {
                    *current += 1;
                }
                return Ok(Item::Block(items));
            }
            Token::RightBrace | Token::EOF => return Ok(Item::Statement { line }),
            _ => *current += 1,
        }
    }
}

fn parse_dotted(tokens: &[Spanned], current: &mut usize, expected: &'static str) -> Result<Vec<String>, ParseError> {
    let mut segments = vec![expect_identifier(tokens, current, expected)?];
    while *peek(tokens, *current) == Token::Dot {
        *current += 1;
        segments.push(expect_identifier(tokens, current, expected)?);
    }
    Ok(segments)
}

fn parse_alias(tokens: &[Spanned], current: &mut usize) -> Result<Option<String>, ParseError> {
    if *peek(tokens, *current) == Token::As {
        *current += 1;
        Ok(Some(expect_identifier(tokens, current, "alias")?))
    } else {
        Ok(None)
    }
}

fn peek(tokens: &[Spanned], current: usize) -> &Token {
    tokens.get(current).map(|s| &s.token).unwrap_or(&Token::EOF)
}

fn position(tokens: &[Spanned], current: usize) -> (usize, usize) {
    tokens.get(current).or_else(|| tokens.last()).map(|s| (s.line, s.column)).unwrap_or((1, 1))
}

fn expect(tokens: &[Spanned], current: &mut usize, token: &Token, expected: &'static str) -> Result<(), ParseError> {
    if peek(tokens, *current) == token {
        *current += 1;
        Ok(())
    } else {
        Err(unexpected(tokens, *current, expected))
    }
}

fn expect_identifier(tokens: &[Spanned], current: &mut usize, expected: &'static str) -> Result<String, ParseError> {
    match peek(tokens, *current) {
        Token::Identifier(name) => {
            *current += 1;
            Ok(name.clone())
        }
        _ => Err(unexpected(tokens, *current, expected)),
    }
}

fn unexpected(tokens: &[Spanned], current: usize, expected: &'static str) -> ParseError {
    match peek(tokens, current) {
        Token::EOF => ParseError::UnexpectedEndOfInput { expected },
        token => {
            let (line, column) = position(tokens, current);
            ParseError::UnexpectedToken {
                expected,
                found: format!("{:?}", token),
                line,
                column,
            }
        }
    }
}
