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

//! Tokenizer for module scripts.

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Import,
    From,
    As,
    If,
    Else,
    Fn,
    Component,
    Identifier(String),
    Number(String),
    Str(String),
    Dot,
    Comma,
    Semicolon,
    Colon,
    Star,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftAngle,
    RightAngle,
    /// Any other punctuation; only meaningful inside opaque statements
    Symbol(char),
    EOF,
}

/// A token together with the position it started at (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::new(input);

    while let Some(ch) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.column);
        let token = match ch {
            ' ' | '\t' | '\n' | '\r' => {
                cursor.bump();
                continue;
            }
            '/' => {
                cursor.bump();
                if cursor.peek() == Some('/') {
                    while let Some(c) = cursor.peek() {
                        if c == '\n' {
                            break;
                        }
                        cursor.bump();
                    }
                    continue;
                }
                Token::Symbol('/')
            }
            '"' => {
                cursor.bump();
                Token::Str(read_string(&mut cursor, line, column)?)
            }
            '0'..='9' => {
                let mut number = String::new();
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        number.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                Token::Number(number)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut identifier = String::new();
                while let Some(c) = cursor.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        identifier.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                keyword_or_identifier(identifier)
            }
            _ => {
                cursor.bump();
                match ch {
                    '.' => Token::Dot,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    ':' => Token::Colon,
                    '*' => Token::Star,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '{' => Token::LeftBrace,
                    '}' => Token::RightBrace,
                    '<' => Token::LeftAngle,
                    '>' => Token::RightAngle,
                    other => Token::Symbol(other),
                }
            }
        };
        tokens.push(Spanned { token, line, column });
    }

    tokens.push(Spanned {
        token: Token::EOF,
        line: cursor.line,
        column: cursor.column,
    });
    Ok(tokens)
}

fn keyword_or_identifier(identifier: String) -> Token {
    match identifier.as_str() {
        "import" => Token::Import,
        "from" => Token::From,
        "as" => Token::As,
        "if" => Token::If,
        "else" => Token::Else,
        "fn" => Token::Fn,
        "component" => Token::Component,
        _ => Token::Identifier(identifier),
    }
}

fn read_string(cursor: &mut Cursor<'_>, line: usize, column: usize) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match cursor.bump() {
            Some('"') => return Ok(value),
            Some('\\') => match cursor.bump() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => break,
            },
            Some(c) => value.push(c),
            None => break,
        }
    }
    Err(ParseError::UnterminatedString { line, column })
}
