//! Recursive descent parser for description files.
//!
//! One token of lookahead plus the previously consumed token; assignment
//! operators are only recognized after the field identifier has been eaten.
//! Any unexpected token fails the whole parse immediately; there is no error
//! recovery and no partial AST.

use thiserror::Error;

use crate::dsl::ast::{ArrayNode, DirectiveNode, Expr, FieldWrite, Program, Stmt, StringNode};
use crate::dsl::lexer::{LexError, Lexer};
use crate::dsl::token::{SourceInfo, Token, TokenKind};

/// A syntactic error. Always fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{src}: expected {expected} but found {found_kind} '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        found_kind: TokenKind,
        src: SourceInfo,
    },
}

impl ParseError {
    /// Byte span of the offending source, for diagnostic rendering.
    pub fn span(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Lex(_) => None,
            ParseError::UnexpectedToken { src, .. } => Some((src.start, src.end)),
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    token: Token,
    prev: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let first = lexer.lex()?;
        Ok(Parser {
            lexer,
            prev: first.clone(),
            token: first,
        })
    }

    /// Parse a whole file body: `Statement (';' Statement)*`.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let program = self.parse_statements(&[TokenKind::Eof])?;
        // Anything left over after the last statement is an error, not
        // silently ignored trailing input.
        self.eat(TokenKind::Eof)?;
        Ok(program)
    }

    fn parse_statements(&mut self, terminators: &[TokenKind]) -> Result<Program, ParseError> {
        let mut program = vec![self.parse_statement(terminators)?];
        while self.token.is(TokenKind::Semicolon) {
            self.eat(TokenKind::Semicolon)?;
            program.push(self.parse_statement(terminators)?);
        }
        Ok(program)
    }

    fn parse_statement(&mut self, terminators: &[TokenKind]) -> Result<Stmt, ParseError> {
        match self.token.kind {
            TokenKind::Tilde => self.parse_unassignment(),
            TokenKind::Identifier => self.parse_identifier_statement(),
            kind if terminators.contains(&kind) => Ok(Stmt::Noop),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_identifier_statement(&mut self) -> Result<Stmt, ParseError> {
        self.eat(TokenKind::Identifier)?;

        match self.token.kind {
            TokenKind::LParen => self.parse_directive(),
            TokenKind::Equal => self.parse_assignment(),
            TokenKind::Plus => self.parse_appendment(),
            TokenKind::Minus => self.parse_erasure(),
            TokenKind::Question => self.parse_dubious_assignment(),
            _ => Err(self.unexpected("'(' or an assignment operator")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.token.kind {
            TokenKind::String => Ok(Expr::String(self.parse_string()?)),
            TokenKind::LBracket => Ok(Expr::Array(self.parse_array()?)),
            _ => Err(self.unexpected("a string literal or an array")),
        }
    }

    fn parse_string(&mut self) -> Result<StringNode, ParseError> {
        let node = StringNode::new(self.token.value.clone(), self.token.src.clone());
        self.eat(TokenKind::String)?;
        Ok(node)
    }

    fn parse_array(&mut self) -> Result<ArrayNode, ParseError> {
        let src = self.token.src.clone();
        self.eat(TokenKind::LBracket)?;

        let mut items = Vec::new();
        if !self.token.is(TokenKind::RBracket) {
            // Arrays hold string literals only; nothing else is an element.
            items.push(self.parse_string()?);
            while self.token.is(TokenKind::Comma) {
                self.eat(TokenKind::Comma)?;
                items.push(self.parse_string()?);
            }
        }

        self.eat(TokenKind::RBracket)?;
        Ok(ArrayNode { items, src })
    }

    fn parse_directive(&mut self) -> Result<Stmt, ParseError> {
        let name = self.prev.value.clone();
        let src = self.prev.src.clone();

        self.eat(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.token.is(TokenKind::RParen) {
            params.push(self.parse_expr()?);
            while self.token.is(TokenKind::Comma) {
                self.eat(TokenKind::Comma)?;
                params.push(self.parse_expr()?);
            }
        }
        self.eat(TokenKind::RParen)?;

        // A trailing brace opens the directive's body. Whether a body is
        // permitted is a property of the directive's registration, which the
        // grammar does not know; the execution engine enforces it.
        let body = if self.token.is(TokenKind::LBrace) {
            self.eat(TokenKind::LBrace)?;
            let body = self.parse_statements(&[TokenKind::RBrace])?;
            self.eat(TokenKind::RBrace)?;
            Some(body)
        } else {
            None
        };

        Ok(Stmt::Directive(DirectiveNode {
            name,
            params,
            body,
            src,
        }))
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let field = self.prev.value.clone();
        let src = self.prev.src.clone();
        self.eat(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign(FieldWrite { field, value, src }))
    }

    fn parse_appendment(&mut self) -> Result<Stmt, ParseError> {
        let field = self.prev.value.clone();
        let src = self.prev.src.clone();
        self.eat(TokenKind::Plus)?;
        self.eat(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Append(FieldWrite { field, value, src }))
    }

    fn parse_erasure(&mut self) -> Result<Stmt, ParseError> {
        let field = self.prev.value.clone();
        let src = self.prev.src.clone();
        self.eat(TokenKind::Minus)?;
        self.eat(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Erase(FieldWrite { field, value, src }))
    }

    fn parse_dubious_assignment(&mut self) -> Result<Stmt, ParseError> {
        let field = self.prev.value.clone();
        let src = self.prev.src.clone();
        self.eat(TokenKind::Question)?;
        self.eat(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        Ok(Stmt::DubiousAssign(FieldWrite { field, value, src }))
    }

    fn parse_unassignment(&mut self) -> Result<Stmt, ParseError> {
        self.eat(TokenKind::Tilde)?;
        let field = self.token.value.clone();
        let src = self.token.src.clone();
        self.eat(TokenKind::Identifier)?;
        Ok(Stmt::Unassign { field, src })
    }

    fn eat(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.token.is(kind) {
            self.prev = std::mem::replace(&mut self.token, self.lexer.lex()?);
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.token.value.clone(),
            found_kind: self.token.kind,
            src: self.token.src.clone(),
        }
    }
}

/// Parse description-file text into a program.
pub fn parse(file: impl AsRef<str>, text: impl Into<String>) -> Result<Program, ParseError> {
    Parser::new(Lexer::new(file, text))?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ast::{emit, ExprShape};

    #[test]
    fn test_parse_assignment_forms() {
        let program = parse(
            "t.mqroot",
            r#"OutputName = "App"; SourceFiles += ["a.cpp", "b.cpp"]; Definitions -= "OLD"; ~OutputPath"#,
        )
        .unwrap();

        assert!(matches!(&program[0], Stmt::Assign(w) if w.field == "OutputName"));
        assert!(matches!(&program[1], Stmt::Append(w) if w.value.shape() == ExprShape::Array));
        assert!(matches!(&program[2], Stmt::Erase(w) if w.field == "Definitions"));
        assert!(matches!(&program[3], Stmt::Unassign { field, .. } if field == "OutputPath"));
    }

    #[test]
    fn test_parse_dubious_assignment() {
        let program = parse("t.mqroot", r#"Optimization ?= "Full""#).unwrap();
        assert!(matches!(&program[0], Stmt::DubiousAssign(w) if w.field == "Optimization"));
    }

    #[test]
    fn test_parse_directive_without_body() {
        let program = parse("t.mqroot", r#"DeclVersion("1.1")"#).unwrap();
        match &program[0] {
            Stmt::Directive(d) => {
                assert_eq!(d.name, "DeclVersion");
                assert_eq!(d.params.len(), 1);
                assert!(d.body.is_none());
            }
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_directive_with_body() {
        let program = parse(
            "t.mqroot",
            r#"DeclRoot("App") { Modules = ["Core"]; Configurations += "Shipping"; }"#,
        )
        .unwrap();
        match &program[0] {
            Stmt::Directive(d) => {
                let body = d.body.as_ref().unwrap();
                assert!(matches!(&body[0], Stmt::Assign(_)));
                assert!(matches!(&body[1], Stmt::Append(_)));
                // The trailing semicolon inside the body produces a Noop.
                assert!(matches!(body.last().unwrap(), Stmt::Noop));
            }
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_array() {
        let program = parse("t.mqroot", "Libraries = []").unwrap();
        match &program[0] {
            Stmt::Assign(w) => match &w.value {
                Expr::Array(a) => assert!(a.items.is_empty()),
                other => panic!("expected array, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_fail_fast_on_unexpected_token() {
        let err = parse("t.mqroot", "Modules = =").unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                expected,
                found_kind,
                ..
            } => {
                assert!(expected.contains("string literal"));
                assert_eq!(found_kind, TokenKind::Equal);
            }
            other => panic!("expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_directive_arguments_cannot_nest_directives() {
        assert!(parse("t.mqroot", "Include(Nested())").is_err());
    }

    #[test]
    fn test_unclosed_body_fails() {
        assert!(parse("t.mqroot", r#"DeclRoot("App") { Modules = ["Core"]"#).is_err());
    }

    #[test]
    fn test_trailing_input_without_separator_fails() {
        assert!(parse("t.mqroot", r#"DeclVersion("1.1") DeclRoot("App") { }"#).is_err());
    }

    #[test]
    fn test_emit_reparse_round_trip() {
        let source = r#"DeclVersion("1.1");
Include("shared");
DeclSchema("Common")
{
    Optimization = "Balanced";
    Defer()
    {
        IfPatternMatch("%Architecture%", "x64")
        {
            Definitions ?= ["TARGET_X64"];
        };
        bDebugSymbols ?= "Yes";
    };
};
DeclRoot("App")
{
    Modules = ["Core", "Game"];
    Configurations -= "Release";
    ~Platforms;
};
DeclModule("Core", "Common")
{
    RootSourcePaths = ["Source"];
    ProtectField("Optimization");
};"#;

        let first = parse("t.mqroot", source).unwrap();
        let emitted = emit(&first);
        let second = parse("t.mqroot", emitted.clone()).unwrap();
        // Re-emitting the reparsed tree must reproduce the same text: the
        // emitter output is a fixed point, so the two trees are isomorphic.
        assert_eq!(emitted, emit(&second));
    }
}
