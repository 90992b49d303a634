//! Language front end: lexer, parser, AST, and language versioning.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod version;

pub use ast::{ArrayNode, DirectiveNode, Expr, ExprShape, FieldWrite, Program, Stmt, StringNode};
pub use lexer::{LexError, Lexer};
pub use parser::{parse, ParseError, Parser};
pub use token::{SourceInfo, Token, TokenKind};
pub use version::LanguageVersion;
