//! Lexer for description files.
//!
//! Produces one token per `lex()` call until [`TokenKind::Eof`]. The lexer
//! keeps a byte cursor over the whole source buffer and a 1-based line
//! counter so every token and error can name its exact origin.

use std::sync::Arc;

use thiserror::Error;

use crate::dsl::token::{SourceInfo, Token, TokenKind};

/// A lexical error. Always fatal; carries file and line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("{file}:{line}: unrecognized character '{ch}'")]
    UnexpectedChar { ch: char, file: String, line: u32 },

    #[error("{file}:{line}: string literal has no closing quote")]
    UnterminatedString { file: String, line: u32 },

    #[error("{file}:{line}: unknown escape sequence '\\{ch}' in string literal")]
    InvalidEscape { ch: char, file: String, line: u32 },

    #[error(
        "{file}:{line}: raw line break or control whitespace inside string literal; \
         use an escape sequence such as \\n or \\t"
    )]
    WhitespaceInString { file: String, line: u32 },
}

pub struct Lexer {
    file: Arc<str>,
    src: String,
    i: usize,
    line: u32,
}

impl Lexer {
    pub fn new(file: impl AsRef<str>, src: impl Into<String>) -> Self {
        Lexer {
            file: Arc::from(file.as_ref()),
            src: src.into(),
            i: 0,
            line: 1,
        }
    }

    pub fn is_done(&self) -> bool {
        self.i >= self.src.len()
    }

    /// Lex the next token from the current position.
    pub fn lex(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();

        let start = self.i;
        let line = self.line;
        if self.is_done() {
            return Ok(Token::new("", TokenKind::Eof, self.src_info(line, start)));
        }

        let c = self.peek_char();
        if c == '"' {
            return self.collect_string();
        }
        if c.is_ascii_alphabetic() {
            return Ok(self.collect_identifier());
        }

        self.bump_char();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '=' => TokenKind::Equal,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '?' => TokenKind::Question,
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    file: self.file.to_string(),
                    line,
                });
            }
        };

        Ok(Token::new(
            c.to_string(),
            kind,
            self.src_info(line, start),
        ))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.is_done() {
                let c = self.peek_char();
                if !c.is_whitespace() {
                    break;
                }
                if c == '\n' {
                    self.line += 1;
                }
                self.bump_char();
            }

            // '#' begins a line comment; consecutive comment lines chain.
            if !self.is_done() && self.peek_char() == '#' {
                while !self.is_done() && self.peek_char() != '\n' {
                    self.bump_char();
                }
                continue;
            }

            break;
        }
    }

    fn collect_identifier(&mut self) -> Token {
        let start = self.i;
        let line = self.line;
        while !self.is_done() {
            let c = self.peek_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump_char();
            } else {
                break;
            }
        }
        Token::new(
            self.src[start..self.i].to_string(),
            TokenKind::Identifier,
            self.src_info(line, start),
        )
    }

    fn collect_string(&mut self) -> Result<Token, LexError> {
        let start = self.i;
        let line = self.line;
        self.bump_char(); // opening quote

        let mut value = String::new();
        loop {
            if self.is_done() {
                return Err(LexError::UnterminatedString {
                    file: self.file.to_string(),
                    line,
                });
            }
            let c = self.peek_char();
            match c {
                '"' => {
                    self.bump_char();
                    break;
                }
                '\\' => {
                    self.bump_char();
                    if self.is_done() {
                        return Err(LexError::UnterminatedString {
                            file: self.file.to_string(),
                            line,
                        });
                    }
                    let esc = self.peek_char();
                    self.bump_char();
                    value.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        'v' => '\x0b',
                        'b' => '\x08',
                        'r' => '\r',
                        'f' => '\x0c',
                        'a' => '\x07',
                        '\\' => '\\',
                        '\'' => '\'',
                        '"' => '"',
                        other => {
                            return Err(LexError::InvalidEscape {
                                ch: other,
                                file: self.file.to_string(),
                                line,
                            });
                        }
                    });
                }
                // Spaces are legal inside string literals; anything else that
                // counts as whitespace must be written as an escape.
                '\n' | '\r' | '\t' | '\x0b' | '\x0c' => {
                    return Err(LexError::WhitespaceInString {
                        file: self.file.to_string(),
                        line,
                    });
                }
                other => {
                    value.push(other);
                    self.bump_char();
                }
            }
        }

        Ok(Token::new(
            value,
            TokenKind::String,
            self.src_info(line, start),
        ))
    }

    fn src_info(&self, line: u32, start: usize) -> SourceInfo {
        SourceInfo::new(Arc::clone(&self.file), line, start, self.i)
    }

    fn peek_char(&self) -> char {
        self.src[self.i..].chars().next().unwrap_or('\0')
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.src[self.i..].chars().next() {
            self.i += c.len_utf8();
        }
    }
}
